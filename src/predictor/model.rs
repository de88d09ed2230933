//! Model artifact probe
//!
//! The dashboard only reports on cached predictions, so the trained
//! checkpoint is never executed here. Its presence is still surfaced in
//! the status panel.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Result of looking for the model checkpoint
#[derive(Debug, Clone, Serialize)]
pub struct ModelStatus {
    pub path: PathBuf,
    pub available: bool,
    pub size_bytes: Option<u64>,
    pub checked_at: DateTime<Utc>,
}

impl ModelStatus {
    /// Single existence check; absence is reported, never raised
    pub fn probe(path: &Path) -> Self {
        let size_bytes = std::fs::metadata(path)
            .ok()
            .filter(|meta| meta.is_file())
            .map(|meta| meta.len());

        match size_bytes {
            Some(size) => tracing::info!("Model file found at {} ({} bytes)", path.display(), size),
            None => tracing::warn!("Model file not found at {}", path.display()),
        }

        Self {
            path: path.to_path_buf(),
            available: size_bytes.is_some(),
            size_bytes,
            checked_at: Utc::now(),
        }
    }
}
