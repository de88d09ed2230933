//! Predictor Module - cached segmentation outputs and their metrics
//!
//! Loads the prediction bundle once, falls back to placeholder data when
//! it is missing or unreadable, and computes metrics up front so page
//! renders only read.

pub mod bundle;
pub mod placeholder;
pub mod metrics;
pub mod model;
pub mod trend;


use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use ndarray::{Array2, Zip};
use parking_lot::RwLock;
use serde::Serialize;

use crate::config::PredictorConfig;

pub use bundle::PredictionBundle;
pub use metrics::{ConfusionCounts, SegmentationMetrics};
pub use model::ModelStatus;
pub use trend::GrowthTrend;
#[cfg(test)]
pub use trend::TrendPoint;

/// Where the arrays on display came from
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DataSource {
    Cache { path: PathBuf },
    Placeholder { reason: String },
}

impl DataSource {
    pub fn is_placeholder(&self) -> bool {
        matches!(self, Self::Placeholder { .. })
    }
}

/// One sample's maps, ready for rendering
#[derive(Debug, Clone)]
pub struct SampleView {
    /// Index actually served (after wrapping an out-of-range request)
    pub index: usize,
    pub ground_truth: Array2<f32>,
    pub prediction: Array2<f32>,
    pub difference: Array2<f32>,
    pub metrics: SegmentationMetrics,
}

#[derive(Debug)]
pub struct Predictor {
    bundle: PredictionBundle,
    source: DataSource,
    model: ModelStatus,
    metrics: SegmentationMetrics,
    counts: ConfusionCounts,
    threshold: f32,
    loaded_at: DateTime<Utc>,
}

impl Predictor {
    /// Never fails: a missing or broken bundle degrades to placeholder data
    pub fn load(config: &PredictorConfig) -> Self {
        tracing::info!("Looking for model at: {}", config.model_path.display());
        tracing::info!("Looking for data at: {}", config.predictions_path.display());

        let model = ModelStatus::probe(&config.model_path);

        let (bundle, source) = match PredictionBundle::load_npz(&config.predictions_path) {
            Ok(bundle) => {
                tracing::info!(
                    "Prediction data loaded successfully. Shape: {:?}",
                    bundle.shape()
                );
                let source = DataSource::Cache { path: config.predictions_path.clone() };
                (bundle, source)
            }
            Err(e) => {
                tracing::warn!("Prediction data unavailable ({}), generating placeholder data", e);
                let source = DataSource::Placeholder { reason: e.to_string() };
                (placeholder::generate(config.placeholder_seed), source)
            }
        };

        Self::from_bundle(bundle, source, model, config.mask_threshold)
    }

    pub fn from_bundle(
        bundle: PredictionBundle,
        source: DataSource,
        model: ModelStatus,
        threshold: f32,
    ) -> Self {
        let counts = ConfusionCounts::from_maps(bundle.ground_truth(), bundle.predictions(), threshold);
        let metrics = SegmentationMetrics::from_counts(&counts);

        tracing::info!(
            accuracy = metrics.accuracy,
            f1 = metrics.f1_score,
            iou = metrics.iou,
            "Metrics calculated"
        );

        Self {
            bundle,
            source,
            model,
            metrics,
            counts,
            threshold,
            loaded_at: Utc::now(),
        }
    }

    pub fn metrics(&self) -> &SegmentationMetrics {
        &self.metrics
    }

    pub fn counts(&self) -> &ConfusionCounts {
        &self.counts
    }

    pub fn sample_count(&self) -> usize {
        self.bundle.len()
    }

    pub fn shape(&self) -> [usize; 4] {
        self.bundle.shape()
    }

    pub fn data_source(&self) -> &DataSource {
        &self.source
    }

    pub fn model_status(&self) -> &ModelStatus {
        &self.model
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    /// Index that `sample(index)` will serve
    pub fn resolve_index(&self, index: usize) -> usize {
        if index < self.sample_count() { index } else { 0 }
    }

    /// Maps for sample `index`; out-of-range indices wrap to the first sample
    pub fn sample(&self, index: usize) -> SampleView {
        let resolved = self.resolve_index(index);
        if resolved != index {
            tracing::debug!("Sample index {} out of range, showing sample 0", index);
        }

        let (gt, pred) = self.bundle.sample_views(resolved);
        let difference = Zip::from(&gt).and(&pred).map_collect(|&g, &p| (g - p).abs());
        let metrics = SegmentationMetrics::compute(&gt, &pred, self.threshold);

        SampleView {
            index: resolved,
            ground_truth: gt.to_owned(),
            prediction: pred.to_owned(),
            difference,
            metrics,
        }
    }

    pub fn growth_trend(&self) -> GrowthTrend {
        GrowthTrend::projection()
    }
}

/// Predictor shared between handlers; reload swaps the inner `Arc`
#[derive(Clone)]
pub struct SharedPredictor {
    inner: Arc<RwLock<Arc<Predictor>>>,
}

impl SharedPredictor {
    pub fn new(predictor: Predictor) -> Self {
        Self { inner: Arc::new(RwLock::new(Arc::new(predictor))) }
    }

    /// Snapshot for the duration of one request
    pub fn current(&self) -> Arc<Predictor> {
        self.inner.read().clone()
    }

    pub fn replace(&self, predictor: Predictor) {
        *self.inner.write() = Arc::new(predictor);
    }
}
