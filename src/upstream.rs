//! Upstream API Client
//!
//! HTTP client for the auth backend that issues dashboard tokens.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::Config;

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("cannot reach auth backend at {url}: {source}")]
    Unreachable {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Backend answered with an error; `message` is its `{message}` body
    #[error("{message}")]
    Rejected { status: u16, message: String },

    #[error("unexpected response from auth backend: {0}")]
    Parse(String),

    #[error("http client setup failed: {0}")]
    Client(#[from] reqwest::Error),
}

impl UpstreamError {
    /// Text suitable for showing on the login / register forms
    pub fn user_message(&self) -> String {
        match self {
            Self::Unreachable { url, .. } => format!(
                "Cannot connect to server. Please ensure the backend is running on {}",
                url
            ),
            Self::Rejected { message, .. } => message.clone(),
            Self::Parse(_) | Self::Client(_) => "An error occurred. Please try again".to_string(),
        }
    }
}

// Request/Response types

#[derive(Debug, Serialize)]
pub struct Credentials<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    message: Option<String>,
}

/// Result of the reachability probe shown on the welcome page
#[derive(Debug, Clone, Serialize)]
pub struct BackendHealth {
    pub url: String,
    pub reachable: bool,
    pub status: Option<u16>,
}

/// Auth backend client
#[derive(Clone)]
pub struct UpstreamClient {
    base_url: String,
    http_client: reqwest::Client,
}

impl UpstreamClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, UpstreamError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http_client,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, UpstreamError> {
        Self::new(
            config.auth_backend_url.clone(),
            Duration::from_secs(config.upstream_timeout_secs),
        )
    }

    /// `POST /api/users/login` -> token
    pub async fn login(&self, credentials: &Credentials<'_>) -> Result<String, UpstreamError> {
        let url = format!("{}/api/users/login", self.base_url);

        tracing::info!("Login attempt for {} via {}", credentials.username, self.base_url);

        let response = self.http_client
            .post(&url)
            .json(credentials)
            .send()
            .await
            .map_err(|source| self.unreachable(source))?;

        if !response.status().is_success() {
            return Err(rejected(response, "Login failed").await);
        }

        let body: LoginResponse = response.json().await
            .map_err(|e| UpstreamError::Parse(e.to_string()))?;

        body.token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| UpstreamError::Rejected {
                status: 200,
                message: "No authentication token received".to_string(),
            })
    }

    /// `POST /api/users/register`, expects `201`
    pub async fn register(&self, credentials: &Credentials<'_>) -> Result<(), UpstreamError> {
        let url = format!("{}/api/users/register", self.base_url);

        tracing::info!("Registration attempt for {}", credentials.username);

        let response = self.http_client
            .post(&url)
            .json(credentials)
            .send()
            .await
            .map_err(|source| self.unreachable(source))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(rejected(response, "Registration failed").await)
        }
    }

    /// `GET /` on the backend; never errors
    pub async fn health(&self) -> BackendHealth {
        let url = format!("{}/", self.base_url);

        match self.http_client.get(&url).timeout(Duration::from_secs(3)).send().await {
            Ok(response) => BackendHealth {
                url: self.base_url.clone(),
                reachable: true,
                status: Some(response.status().as_u16()),
            },
            Err(e) => {
                tracing::debug!("Backend health check failed: {}", e);
                BackendHealth {
                    url: self.base_url.clone(),
                    reachable: false,
                    status: None,
                }
            }
        }
    }

    fn unreachable(&self, source: reqwest::Error) -> UpstreamError {
        tracing::error!("Auth backend unreachable: {}", source);
        UpstreamError::Unreachable {
            url: self.base_url.clone(),
            source,
        }
    }
}

async fn rejected(response: reqwest::Response, fallback: &str) -> UpstreamError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    tracing::warn!("Auth backend rejected request ({}): {}", status, body);

    let message = serde_json::from_str::<ErrorResponse>(&body)
        .ok()
        .and_then(|e| e.message)
        .unwrap_or_else(|| fallback.to_string());

    UpstreamError::Rejected { status, message }
}
