//! Urban Growth Dashboard
//!
//! Web dashboard for an urban-growth segmentation model. Visitors sign in
//! against the upstream auth backend; the dashboard then shows aggregate
//! segmentation metrics, per-sample heatmaps and the projected growth trend.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                  URBAN GROWTH DASHBOARD                  │
//! ├──────────────────────────────────────────────────────────┤
//! │  ┌───────────┐  ┌────────────┐  ┌─────────────────────┐  │
//! │  │  Pages &  │  │  Auth      │  │  Predictor          │  │
//! │  │  JSON API │  │  (JWT +    │  │  (npz bundle or     │  │
//! │  │  (Axum)   │  │  upstream) │  │  placeholder data)  │  │
//! │  └─────┬─────┘  └─────┬──────┘  └──────────┬──────────┘  │
//! │        └──────────────┼────────────────────┘             │
//! │                       ▼                                  │
//! │               ┌───────────────┐                          │
//! │               │ Auth backend  │                          │
//! │               └───────────────┘                          │
//! └──────────────────────────────────────────────────────────┘
//! ```

mod auth;
mod config;
mod error;
mod handlers;
mod middleware;
mod predictor;
mod render;
mod upstream;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::auth::{JwtValidator, TokenValidator};
use crate::predictor::{Predictor, SharedPredictor};
use crate::upstream::UpstreamClient;

pub use error::{AppError, AppResult};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    dotenvy::dotenv().ok();
    let config = config::Config::from_env();

    // Initialize logging
    let json = config.log_format.eq_ignore_ascii_case("json");
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "urban_dashboard=debug,tower_http=debug".into()))
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(|| tracing_subscriber::fmt::layer()))
        .init();

    tracing::info!("Urban Growth Dashboard starting...");
    tracing::info!("Auth backend: {}", config.auth_backend_url);

    // Load predictor artifacts (falls back to placeholder data)
    let predictor_config = config.predictor.clone();
    let predictor = tokio::task::spawn_blocking(move || Predictor::load(&predictor_config))
        .await
        .context("Predictor initialisation panicked")?;

    if predictor.data_source().is_placeholder() {
        tracing::warn!("Serving placeholder data, dashboard runs in demonstration mode");
    }

    let upstream = UpstreamClient::from_config(&config)
        .context("Failed to build auth backend client")?;

    // Build application state
    let state = AppState {
        config: config.clone(),
        predictor: SharedPredictor::new(predictor),
        validator: Arc::new(JwtValidator::new(&config.jwt_secret)),
        upstream,
    };

    // Build router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("🚀 Dashboard listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: config::Config,
    pub predictor: SharedPredictor,
    pub validator: Arc<dyn TokenValidator>,
    pub upstream: UpstreamClient,
}

/// Create the main router with all routes
pub(crate) fn create_router(state: AppState) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/health", get(handlers::health::check))
        .route("/", get(handlers::pages::welcome))
        .route("/login", get(handlers::session::login_page).post(handlers::session::login))
        .route("/register", get(handlers::session::register_page).post(handlers::session::register))
        .route("/logout", post(handlers::session::logout));

    // Dashboard pages (login prompt when unauthenticated)
    let page_routes = Router::new()
        .route("/dashboard", get(handlers::pages::dashboard))
        .route("/dashboard/refresh", post(handlers::pages::refresh))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_page_auth
        ));

    // JSON API (user JWT auth)
    let api_routes = Router::new()
        .route("/api/v1/me", get(handlers::api::me))
        .route("/api/v1/status", get(handlers::status::status))

        // Metrics & samples
        .route("/api/v1/metrics", get(handlers::api::metrics))
        .route("/api/v1/samples/:index", get(handlers::api::sample))
        .route("/api/v1/samples/:index/:layer", get(handlers::api::sample_heatmap))
        .route("/api/v1/trend", get(handlers::api::trend))

        // Model artifacts
        .route("/api/v1/model", get(handlers::api::model))
        .route("/api/v1/predictor/reload", post(handlers::api::reload))

        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_user_auth
        ));

    // Combine all routes
    Router::new()
        .merge(public_routes)
        .merge(page_routes)
        .merge(api_routes)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        )
        .with_state(state)
}
