//! HTTP handlers

pub mod health;
pub mod status;
pub mod pages;
pub mod session;
pub mod api;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use crate::predictor::Predictor;
use crate::{AppResult, AppState};

/// Rebuild the predictor from disk and swap it in
pub async fn reload_predictor(state: &AppState) -> AppResult<Arc<Predictor>> {
    let config = state.config.predictor.clone();
    let predictor = tokio::task::spawn_blocking(move || Predictor::load(&config)).await?;

    state.predictor.replace(predictor);
    Ok(state.predictor.current())
}

/// Lenient sample index parsing: blanks, negatives and junk all mean the
/// first sample, same as any other out-of-range request
pub fn sample_index(raw: Option<&str>) -> usize {
    raw.and_then(|s| s.trim().parse().ok()).unwrap_or(0)
}
