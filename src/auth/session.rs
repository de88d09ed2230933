//! Where a request's token comes from
//!
//! The React shell embeds the dashboard with `?token=...`; after the first
//! hit the token rides in an HttpOnly cookie so links inside the dashboard
//! do not need to carry it.

use axum::extract::Query;
use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::{HeaderMap, Uri};
use serde::Deserialize;

pub const SESSION_COOKIE: &str = "ug_session";

/// Session cookie lifetime, matching the backend's token expiry
const SESSION_MAX_AGE_SECS: u64 = 3600;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenOrigin {
    Header,
    Query,
    Cookie,
}

#[derive(Debug, Deserialize)]
struct TokenParams {
    token: Option<String>,
}

/// Bearer header, then `token` query parameter, then session cookie
pub fn extract_token(headers: &HeaderMap, uri: &Uri) -> Option<(String, TokenOrigin)> {
    if let Some(token) = bearer_token(headers) {
        return Some((token, TokenOrigin::Header));
    }

    if let Ok(Query(params)) = Query::<TokenParams>::try_from_uri(uri) {
        if let Some(token) = params.token.filter(|t| !t.trim().is_empty()) {
            return Some((token, TokenOrigin::Query));
        }
    }

    cookie_value(headers, SESSION_COOKIE).map(|token| (token, TokenOrigin::Cookie))
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let header = headers.get(AUTHORIZATION)?.to_str().ok()?;
    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
        .filter(|value| !value.is_empty())
}

/// `Set-Cookie` value that stores `token` for the session
pub fn session_cookie(token: &str, secure: bool) -> String {
    let mut cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        SESSION_COOKIE, token, SESSION_MAX_AGE_SECS
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// `Set-Cookie` value that expires the session
pub fn clear_session_cookie() -> String {
    format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", SESSION_COOKIE)
}
