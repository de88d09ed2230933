//! Login, registration and logout
//!
//! Credentials are forwarded to the upstream backend; this service never
//! stores them. A successful login lands in the session cookie.

use axum::{
    extract::{Query, State},
    http::{header::SET_COOKIE, HeaderMap, StatusCode, Uri},
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use serde::Deserialize;
use validator::{Validate, ValidationErrors};

use crate::auth::{clear_session_cookie, session_cookie};
use crate::middleware::auth::{authenticate, redirect_to_dashboard};
use crate::render::pages;
use crate::upstream::{Credentials, UpstreamError};
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct LoginForm {
    #[validate(length(min = 1, message = "Please enter both username and password"))]
    pub username: String,
    #[validate(length(min = 1, message = "Please enter both username and password"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterForm {
    #[validate(length(min = 1, message = "Please enter both username and password"))]
    pub username: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters long"))]
    pub password: String,
    #[validate(must_match(other = "password", message = "Passwords do not match"))]
    pub confirm_password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginParams {
    pub registered: Option<String>,
}

pub async fn login_page(
    State(state): State<AppState>,
    headers: HeaderMap,
    uri: Uri,
    Query(params): Query<LoginParams>,
) -> Response {
    if let Ok((user, token)) = authenticate(&state, &headers, &uri) {
        return redirect_to_dashboard(&state, &user, &token);
    }

    let notice = params
        .registered
        .map(|_| "Registration successful! Please login with your new account.");
    Html(pages::login_form(None, notice, "")).into_response()
}

pub async fn login(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> Response {
    let username = form.username.trim();

    if let Err(errors) = form.validate() {
        let message = first_message(&errors, &["username", "password"]);
        return (StatusCode::BAD_REQUEST, Html(pages::login_form(Some(&message), None, username)))
            .into_response();
    }

    let credentials = Credentials { username, password: &form.password };
    let token = match state.upstream.login(&credentials).await {
        Ok(token) => token,
        Err(e) => {
            let page = pages::login_form(Some(&e.user_message()), None, username);
            return (upstream_status(&e), Html(page)).into_response();
        }
    };

    // a token we cannot verify would bounce straight back to the login prompt
    if let Err(e) = state.validator.validate(&token) {
        tracing::error!("Backend issued a token that fails verification: {}", e);
        let page = pages::login_form(
            Some("Login succeeded but the session could not be verified. Please contact an administrator"),
            None,
            username,
        );
        return (StatusCode::BAD_GATEWAY, Html(page)).into_response();
    }

    tracing::info!("User {} logged in", username);
    (
        [(SET_COOKIE, session_cookie(&token, state.config.is_production()))],
        Redirect::to("/dashboard"),
    )
        .into_response()
}

pub async fn register_page(
    State(state): State<AppState>,
    headers: HeaderMap,
    uri: Uri,
) -> Response {
    if let Ok((user, token)) = authenticate(&state, &headers, &uri) {
        return redirect_to_dashboard(&state, &user, &token);
    }
    Html(pages::register_form(None, "")).into_response()
}

pub async fn register(
    State(state): State<AppState>,
    Form(form): Form<RegisterForm>,
) -> Response {
    let username = form.username.trim();

    if let Err(errors) = form.validate() {
        let message = first_message(&errors, &["username", "password", "confirm_password"]);
        return (StatusCode::BAD_REQUEST, Html(pages::register_form(Some(&message), username)))
            .into_response();
    }

    let credentials = Credentials { username, password: &form.password };
    match state.upstream.register(&credentials).await {
        Ok(()) => {
            tracing::info!("New account registered: {}", username);
            Redirect::to("/login?registered=1").into_response()
        }
        Err(e) => {
            let page = pages::register_form(Some(&e.user_message()), username);
            (upstream_status(&e), Html(page)).into_response()
        }
    }
}

pub async fn logout() -> Response {
    ([(SET_COOKIE, clear_session_cookie())], Redirect::to("/")).into_response()
}

/// First message in field order, so the form reports problems predictably
fn first_message(errors: &ValidationErrors, order: &[&str]) -> String {
    let fields = errors.field_errors();
    order
        .iter()
        .filter_map(|field| fields.get(*field))
        .flat_map(|errs| errs.iter())
        .find_map(|e| e.message.as_ref().map(|m| m.to_string()))
        .unwrap_or_else(|| "Please check the form and try again".to_string())
}

/// Client errors from the backend are passed through, anything else is a gateway problem
fn upstream_status(err: &UpstreamError) -> StatusCode {
    match err {
        UpstreamError::Rejected { status, .. } => StatusCode::from_u16(*status)
            .ok()
            .filter(StatusCode::is_client_error)
            .unwrap_or(StatusCode::BAD_GATEWAY),
        _ => StatusCode::BAD_GATEWAY,
    }
}
