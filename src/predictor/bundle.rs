//! Prediction bundle - paired prediction / ground-truth masks
//!
//! Reads the cached `.npz` archive written by the evaluation notebook.
//! Both arrays are `[N, H, W, 1]` with values in `[0, 1]`.

use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;

use ndarray::{Array4, ArrayView2, Axis, Ix4, OwnedRepr};
use ndarray_npy::{NpzReader, ReadNpzError};
use thiserror::Error;

pub const PREDICTIONS_KEY: &str = "predictions";
pub const GROUND_TRUTH_KEY: &str = "ground_truth";

#[derive(Debug, Error)]
pub enum BundleError {
    #[error("cannot open bundle: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot decode array '{name}': {source}")]
    Npz {
        name: &'static str,
        #[source]
        source: ReadNpzError,
    },

    #[error("shape mismatch: predictions {predictions:?} vs ground truth {ground_truth:?}")]
    ShapeMismatch {
        predictions: Vec<usize>,
        ground_truth: Vec<usize>,
    },

    #[error("bundle contains no samples")]
    Empty,

    #[error("expected a single channel, found {0}")]
    BadChannels(usize),
}

/// Predicted confidence maps and ground-truth masks of identical shape
#[derive(Debug, Clone)]
pub struct PredictionBundle {
    predictions: Array4<f32>,
    ground_truth: Array4<f32>,
}

impl PredictionBundle {
    pub fn new(predictions: Array4<f32>, ground_truth: Array4<f32>) -> Result<Self, BundleError> {
        if predictions.shape() != ground_truth.shape() {
            return Err(BundleError::ShapeMismatch {
                predictions: predictions.shape().to_vec(),
                ground_truth: ground_truth.shape().to_vec(),
            });
        }

        let (n, h, w, c) = predictions.dim();
        if n == 0 || h == 0 || w == 0 {
            return Err(BundleError::Empty);
        }
        if c != 1 {
            return Err(BundleError::BadChannels(c));
        }

        Ok(Self { predictions, ground_truth })
    }

    /// Load from an `.npz` archive on disk
    pub fn load_npz(path: &Path) -> Result<Self, BundleError> {
        let file = File::open(path)?;
        let mut npz = NpzReader::new(file).map_err(|source| BundleError::Npz {
            name: "archive",
            source,
        })?;

        let predictions = read_array(&mut npz, PREDICTIONS_KEY)?;
        let ground_truth = read_array(&mut npz, GROUND_TRUTH_KEY)?;

        Self::new(predictions, ground_truth)
    }

    pub fn predictions(&self) -> &Array4<f32> {
        &self.predictions
    }

    pub fn ground_truth(&self) -> &Array4<f32> {
        &self.ground_truth
    }

    pub fn len(&self) -> usize {
        self.predictions.len_of(Axis(0))
    }

    /// `[N, H, W, 1]`
    pub fn shape(&self) -> [usize; 4] {
        let (n, h, w, c) = self.predictions.dim();
        [n, h, w, c]
    }

    /// 2-D views of sample `index`; caller guarantees `index < len()`
    pub fn sample_views(&self, index: usize) -> (ArrayView2<'_, f32>, ArrayView2<'_, f32>) {
        let gt = self.ground_truth.index_axis(Axis(0), index).index_axis_move(Axis(2), 0);
        let pred = self.predictions.index_axis(Axis(0), index).index_axis_move(Axis(2), 0);
        (gt, pred)
    }
}

/// numpy stores arrays as `<name>.npy`; accept both spellings and both float widths
fn read_array<R: Read + Seek>(
    npz: &mut NpzReader<R>,
    name: &'static str,
) -> Result<Array4<f32>, BundleError> {
    let npz_err = |source| BundleError::Npz { name, source };

    let numpy_name = format!("{name}.npy");
    let entry = if npz.names().map_err(npz_err)?.contains(&numpy_name) {
        numpy_name
    } else {
        name.to_string()
    };

    match npz.by_name::<OwnedRepr<f32>, Ix4>(&entry) {
        Ok(array) => Ok(array),
        Err(_) => npz
            .by_name::<OwnedRepr<f64>, Ix4>(&entry)
            .map(|array| array.mapv(|v| v as f32))
            .map_err(npz_err),
    }
}
