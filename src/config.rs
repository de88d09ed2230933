//! Configuration module

use std::env;
use std::path::PathBuf;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,

    /// Shared secret the upstream backend signs tokens with
    pub jwt_secret: String,

    /// Base URL of the upstream auth backend
    pub auth_backend_url: String,

    /// Upstream request timeout in seconds
    pub upstream_timeout_secs: u64,

    /// Predictor settings
    pub predictor: PredictorConfig,

    /// Environment (development, production)
    pub environment: String,

    /// Log output format ("pretty" or "json")
    pub log_format: String,
}

/// Where the predictor looks for its artifacts and how it scores them
#[derive(Debug, Clone)]
pub struct PredictorConfig {
    /// Trained segmentation model checkpoint
    pub model_path: PathBuf,

    /// Cached `.npz` bundle with `predictions` and `ground_truth`
    pub predictions_path: PathBuf,

    /// Values strictly above this are treated as positive
    pub mask_threshold: f32,

    /// Seed for placeholder data when the bundle is unavailable
    pub placeholder_seed: u64,
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("data/models/urban_growth_unet.h5"),
            predictions_path: PathBuf::from("data/predictions/test_predictions.npz"),
            mask_threshold: 0.5,
            placeholder_seed: 42,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = PredictorConfig::default();

        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8501),

            jwt_secret: env::var("JWT_SECRET")
                .unwrap_or_else(|_| "urban-growth-dev-secret-change-in-production".to_string()),

            auth_backend_url: env::var("AUTH_BACKEND_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| "http://localhost:5000".to_string()),

            upstream_timeout_secs: env::var("UPSTREAM_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),

            predictor: PredictorConfig {
                model_path: env::var("MODEL_PATH")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.model_path),
                predictions_path: env::var("PREDICTIONS_PATH")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.predictions_path),
                mask_threshold: env::var("MASK_THRESHOLD")
                    .ok()
                    .and_then(|t| t.parse().ok())
                    .filter(|t: &f32| (0.0..1.0).contains(t))
                    .unwrap_or(defaults.mask_threshold),
                placeholder_seed: env::var("PLACEHOLDER_SEED")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(defaults.placeholder_seed),
            },

            environment: env::var("ENVIRONMENT")
                .unwrap_or_else(|_| "development".to_string()),

            log_format: env::var("LOG_FORMAT")
                .unwrap_or_else(|_| "pretty".to_string()),
        }
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Configuration used by tests: no upstream, artifacts under `dir`
    #[cfg(test)]
    pub fn for_tests(dir: &std::path::Path) -> Self {
        Self {
            port: 0,
            jwt_secret: "test-secret".to_string(),
            auth_backend_url: "http://127.0.0.1:9".to_string(),
            upstream_timeout_secs: 1,
            predictor: PredictorConfig {
                model_path: dir.join("model.h5"),
                predictions_path: dir.join("predictions.npz"),
                ..Default::default()
            },
            environment: "test".to_string(),
            log_format: "pretty".to_string(),
        }
    }
}
