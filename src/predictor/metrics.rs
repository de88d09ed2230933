//! Binary segmentation metrics
//!
//! Both maps are thresholded (`value > threshold`) and compared
//! element-wise. Ratios with an empty denominator report `0.0`.

use ndarray::{ArrayBase, Data, Dimension, Zip};
use serde::{Deserialize, Serialize};

/// Confusion counts over every compared element
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionCounts {
    pub true_positive: u64,
    pub false_positive: u64,
    pub true_negative: u64,
    pub false_negative: u64,
}

impl ConfusionCounts {
    /// Count agreements between `truth` and `predicted` after thresholding.
    /// Shapes must match; callers compare arrays from the same bundle.
    pub fn from_maps<S1, S2, D>(
        truth: &ArrayBase<S1, D>,
        predicted: &ArrayBase<S2, D>,
        threshold: f32,
    ) -> Self
    where
        S1: Data<Elem = f32>,
        S2: Data<Elem = f32>,
        D: Dimension,
    {
        let mut counts = Self::default();

        Zip::from(truth).and(predicted).for_each(|&t, &p| {
            match (t > threshold, p > threshold) {
                (true, true) => counts.true_positive += 1,
                (false, true) => counts.false_positive += 1,
                (false, false) => counts.true_negative += 1,
                (true, false) => counts.false_negative += 1,
            }
        });

        counts
    }

    pub fn total(&self) -> u64 {
        self.true_positive + self.false_positive + self.true_negative + self.false_negative
    }
}

/// Model performance metrics, each in `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SegmentationMetrics {
    pub accuracy: f64,
    pub f1_score: f64,
    pub iou: f64,
    pub precision: f64,
    pub recall: f64,
}

impl SegmentationMetrics {
    pub fn from_counts(c: &ConfusionCounts) -> Self {
        let tp = c.true_positive as f64;
        let fp = c.false_positive as f64;
        let fn_ = c.false_negative as f64;

        Self {
            accuracy: ratio((c.true_positive + c.true_negative) as f64, c.total() as f64),
            f1_score: ratio(2.0 * tp, 2.0 * tp + fp + fn_),
            iou: ratio(tp, tp + fp + fn_),
            precision: ratio(tp, tp + fp),
            recall: ratio(tp, tp + fn_),
        }
    }

    pub fn compute<S1, S2, D>(
        truth: &ArrayBase<S1, D>,
        predicted: &ArrayBase<S2, D>,
        threshold: f32,
    ) -> Self
    where
        S1: Data<Elem = f32>,
        S2: Data<Elem = f32>,
        D: Dimension,
    {
        Self::from_counts(&ConfusionCounts::from_maps(truth, predicted, threshold))
    }

    /// `(label, value)` pairs in display order
    pub fn labelled(&self) -> [(&'static str, f64); 5] {
        [
            ("Accuracy", self.accuracy),
            ("F1-Score", self.f1_score),
            ("IoU", self.iou),
            ("Precision", self.precision),
            ("Recall", self.recall),
        ]
    }
}

fn ratio(num: f64, den: f64) -> f64 {
    if den > 0.0 {
        (num / den).clamp(0.0, 1.0)
    } else {
        0.0
    }
}
