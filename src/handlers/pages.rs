//! HTML page handlers

use axum::{
    extract::{Query, State},
    http::{HeaderMap, Uri},
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;

use crate::handlers::status::SystemStatus;
use crate::handlers::{reload_predictor, sample_index};
use crate::middleware::auth::{authenticate, redirect_to_dashboard, UserContext};
use crate::render::{chart, heatmap, pages};
use crate::{AppResult, AppState};

#[derive(Debug, Deserialize)]
pub struct DashboardParams {
    pub sample: Option<String>,
}

/// Landing page; signed-in visitors go straight to the dashboard
pub async fn welcome(
    State(state): State<AppState>,
    headers: HeaderMap,
    uri: Uri,
) -> Response {
    if let Ok((user, token)) = authenticate(&state, &headers, &uri) {
        return redirect_to_dashboard(&state, &user, &token);
    }

    let status = SystemStatus::collect(&state).await;
    Html(pages::welcome(&status)).into_response()
}

pub async fn dashboard(
    State(state): State<AppState>,
    user: UserContext,
    Query(params): Query<DashboardParams>,
) -> AppResult<Html<String>> {
    let predictor = state.predictor.current();
    let sample = predictor.sample(sample_index(params.sample.as_deref()));

    let mut heatmaps = Vec::with_capacity(heatmap::Layer::ALL.len());
    for layer in heatmap::Layer::ALL {
        let png = heatmap::render_png(layer.select(&sample), layer.colormap(), heatmap::DEFAULT_SCALE)?;
        heatmaps.push((layer, heatmap::png_data_uri(&png)));
    }

    tracing::debug!(
        user = %user.identity.user_id,
        sample = sample.index,
        "Rendering dashboard"
    );

    let view = pages::DashboardView {
        identity: &user.identity,
        predictor: &predictor,
        sample: &sample,
        heatmaps,
        trend_svg: chart::trend_svg(&predictor.growth_trend()),
    };

    Ok(Html(pages::dashboard(&view)))
}

/// "Refresh Dashboard": reload artifacts from disk
pub async fn refresh(
    State(state): State<AppState>,
    user: UserContext,
) -> AppResult<Redirect> {
    tracing::info!("Dashboard refresh requested by {}", user.display_name());
    reload_predictor(&state).await?;
    Ok(Redirect::to("/dashboard"))
}
