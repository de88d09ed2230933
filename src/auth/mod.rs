//! Authentication - verification of tokens issued by the upstream backend

pub mod claims;
pub mod session;
pub mod validator;

use serde::Serialize;
use thiserror::Error;

pub use claims::Claims;
pub use session::{extract_token, session_cookie, clear_session_cookie, TokenOrigin};
#[cfg(test)]
pub use session::SESSION_COOKIE;
pub use validator::{JwtValidator, TokenValidator};

/// Display name used when a token carries no username
pub const DEFAULT_DISPLAY_NAME: &str = "User";

/// Caller identity established from a verified token
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub user_id: String,
    pub display_name: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("no token provided")]
    Missing,

    #[error("token has expired")]
    Expired,

    #[error("invalid token: {0}")]
    Invalid(String),
}

impl AuthError {
    /// Message shown on the login prompt
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Missing => "Please login to access the Dashboard",
            Self::Expired => "Your session has expired. Please login again",
            Self::Invalid(_) => "Your session is not valid. Please login again",
        }
    }
}
