//! JSON API handlers

use axum::{
    extract::{Path, State},
    http::header::{CACHE_CONTROL, CONTENT_TYPE},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::auth::Identity;
use crate::handlers::{reload_predictor, sample_index};
use crate::middleware::auth::UserContext;
use crate::predictor::{
    ConfusionCounts, DataSource, GrowthTrend, ModelStatus, Predictor, SegmentationMetrics,
};
use crate::render::heatmap::{self, Layer};
use crate::{AppError, AppResult, AppState};

#[derive(Debug, Serialize)]
pub struct MetricsResponse {
    pub metrics: SegmentationMetrics,
    pub counts: ConfusionCounts,
    pub threshold: f32,
    pub samples: usize,
    pub shape: [usize; 4],
    pub data_source: DataSource,
}

#[derive(Debug, Serialize)]
pub struct SampleResponse {
    pub index: usize,
    pub requested: String,
    pub height: usize,
    pub width: usize,
    pub ground_truth: Vec<Vec<f32>>,
    pub prediction: Vec<Vec<f32>>,
    pub difference: Vec<Vec<f32>>,
    pub metrics: SegmentationMetrics,
}

#[derive(Debug, Serialize)]
pub struct ModelResponse {
    pub model: ModelStatus,
    pub data_source: DataSource,
    pub samples: usize,
    pub loaded_at: DateTime<Utc>,
}

impl ModelResponse {
    fn from_predictor(predictor: &Predictor) -> Self {
        Self {
            model: predictor.model_status().clone(),
            data_source: predictor.data_source().clone(),
            samples: predictor.sample_count(),
            loaded_at: predictor.loaded_at(),
        }
    }
}

pub async fn me(user: UserContext) -> Json<Identity> {
    Json(user.identity)
}

pub async fn metrics(
    State(state): State<AppState>,
    _user: UserContext,
) -> Json<MetricsResponse> {
    let predictor = state.predictor.current();

    Json(MetricsResponse {
        metrics: *predictor.metrics(),
        counts: *predictor.counts(),
        threshold: predictor.threshold(),
        samples: predictor.sample_count(),
        shape: predictor.shape(),
        data_source: predictor.data_source().clone(),
    })
}

pub async fn sample(
    State(state): State<AppState>,
    _user: UserContext,
    Path(index): Path<String>,
) -> Json<SampleResponse> {
    let predictor = state.predictor.current();
    let view = predictor.sample(sample_index(Some(&index)));
    let (height, width) = view.ground_truth.dim();

    let rows = |map: &ndarray::Array2<f32>| -> Vec<Vec<f32>> {
        map.rows().into_iter().map(|row| row.to_vec()).collect()
    };

    Json(SampleResponse {
        index: view.index,
        requested: index,
        height,
        width,
        ground_truth: rows(&view.ground_truth),
        prediction: rows(&view.prediction),
        difference: rows(&view.difference),
        metrics: view.metrics,
    })
}

/// `GET /api/v1/samples/:index/:layer` where layer is e.g. `prediction.png`
pub async fn sample_heatmap(
    State(state): State<AppState>,
    _user: UserContext,
    Path((index, layer)): Path<(String, String)>,
) -> AppResult<Response> {
    let layer = Layer::parse(&layer)
        .ok_or_else(|| AppError::NotFound(format!("Unknown layer '{}'", layer)))?;

    let predictor = state.predictor.current();
    let view = predictor.sample(sample_index(Some(&index)));
    let png = heatmap::render_png(layer.select(&view), layer.colormap(), heatmap::DEFAULT_SCALE)?;

    Ok((
        [(CONTENT_TYPE, "image/png"), (CACHE_CONTROL, "private, max-age=60")],
        png,
    )
        .into_response())
}

pub async fn trend(
    State(state): State<AppState>,
    _user: UserContext,
) -> Json<GrowthTrend> {
    Json(state.predictor.current().growth_trend())
}

pub async fn model(
    State(state): State<AppState>,
    _user: UserContext,
) -> Json<ModelResponse> {
    Json(ModelResponse::from_predictor(&state.predictor.current()))
}

pub async fn reload(
    State(state): State<AppState>,
    user: UserContext,
) -> AppResult<Json<ModelResponse>> {
    tracing::info!("Predictor reload requested by {}", user.display_name());
    let predictor = reload_predictor(&state).await?;
    Ok(Json(ModelResponse::from_predictor(&predictor)))
}
