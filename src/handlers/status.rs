//! System status: backend reachability and artifact presence

use std::path::PathBuf;

use axum::{extract::State, Json};
use serde::Serialize;

use crate::middleware::auth::UserContext;
use crate::upstream::BackendHealth;
use crate::AppState;

#[derive(Debug, Clone, Serialize)]
pub struct SystemStatus {
    pub backend: BackendHealth,
    pub model_present: bool,
    pub model_path: PathBuf,
    pub data_present: bool,
    pub data_path: PathBuf,
}

impl SystemStatus {
    pub async fn collect(state: &AppState) -> Self {
        let predictor = &state.config.predictor;

        Self {
            backend: state.upstream.health().await,
            model_present: predictor.model_path.is_file(),
            model_path: predictor.model_path.clone(),
            data_present: predictor.predictions_path.is_file(),
            data_path: predictor.predictions_path.clone(),
        }
    }
}

pub async fn status(
    State(state): State<AppState>,
    _user: UserContext,
) -> Json<SystemStatus> {
    Json(SystemStatus::collect(&state).await)
}
