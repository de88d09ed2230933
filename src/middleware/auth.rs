//! Authentication middleware

use axum::{
    extract::{Request, State},
    http::{header::SET_COOKIE, HeaderMap, HeaderValue, StatusCode, Uri},
    middleware::Next,
    response::{Html, IntoResponse, Redirect, Response},
};
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::auth::{self, AuthError, Identity, TokenOrigin};
use crate::render::pages;
use crate::{AppError, AppState};

/// User context extracted from a verified token
#[derive(Debug, Clone)]
pub struct UserContext {
    pub identity: Identity,
    pub origin: TokenOrigin,
}

impl UserContext {
    pub fn display_name(&self) -> &str {
        &self.identity.display_name
    }
}

/// Why a request could not be authenticated, and where the rejected token came from
#[derive(Debug)]
pub struct AuthRejection {
    pub error: AuthError,
    pub origin: Option<TokenOrigin>,
}

/// Find and verify the request's token. Returns the raw token too so a
/// query-supplied token can be kept in the session cookie.
pub fn authenticate(
    state: &AppState,
    headers: &HeaderMap,
    uri: &Uri,
) -> Result<(UserContext, String), AuthRejection> {
    let (token, origin) = auth::extract_token(headers, uri).ok_or(AuthRejection {
        error: AuthError::Missing,
        origin: None,
    })?;
    let identity = state
        .validator
        .validate(&token)
        .map_err(|error| AuthRejection { error, origin: Some(origin) })?;
    Ok((UserContext { identity, origin }, token))
}

/// Middleware: require a valid token on JSON API routes
pub async fn require_user_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let (user, token) = authenticate(&state, req.headers(), req.uri()).map_err(|rejection| {
        tracing::debug!("API request rejected: {}", rejection.error);
        AppError::from(rejection.error)
    })?;

    let origin = user.origin;
    req.extensions_mut().insert(user);

    let mut response = next.run(req).await;
    if origin == TokenOrigin::Query {
        remember_session(&state, &token, &mut response);
    }

    Ok(response)
}

/// Middleware: require a valid token on HTML pages, otherwise show a login prompt
pub async fn require_page_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let (user, token) = match authenticate(&state, req.headers(), req.uri()) {
        Ok(found) => found,
        Err(rejection) => {
            tracing::info!("Page {} requires login: {}", req.uri().path(), rejection.error);
            let mut response = (
                StatusCode::UNAUTHORIZED,
                Html(pages::login_prompt(rejection.error.user_message())),
            )
                .into_response();
            // a bad link or header token leaves the cookie alone
            if rejection.origin == Some(TokenOrigin::Cookie) {
                set_cookie(&mut response, &auth::clear_session_cookie());
            }
            return response;
        }
    };

    let origin = user.origin;
    req.extensions_mut().insert(user);

    let mut response = next.run(req).await;
    if origin == TokenOrigin::Query {
        remember_session(&state, &token, &mut response);
    }

    response
}

/// Send an already signed-in visitor to the dashboard, keeping a `?token=`
pub fn redirect_to_dashboard(state: &AppState, user: &UserContext, token: &str) -> Response {
    let mut response = Redirect::to("/dashboard").into_response();
    if user.origin == TokenOrigin::Query {
        remember_session(state, token, &mut response);
    }
    response
}

/// Keep a token that arrived as `?token=` for follow-up requests
pub fn remember_session(state: &AppState, token: &str, response: &mut Response) {
    let cookie = auth::session_cookie(token, state.config.is_production());
    set_cookie(response, &cookie);
}

fn set_cookie(response: &mut Response, cookie: &str) {
    match HeaderValue::from_str(cookie) {
        Ok(value) => {
            response.headers_mut().append(SET_COOKIE, value);
        }
        Err(e) => tracing::warn!("Cannot set session cookie: {}", e),
    }
}

// Implement FromRequestParts for UserContext
#[axum::async_trait]
impl<S> FromRequestParts<S> for UserContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions
            .get::<UserContext>()
            .cloned()
            .ok_or(AppError::Unauthorized)
    }
}
