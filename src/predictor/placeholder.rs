//! Placeholder data used when the cached bundle is unavailable
//!
//! Each sample is a square "urban area" mask plus a prediction that is
//! offset, resized and noisy, so metrics land in a plausible range
//! instead of a perfect score.

use ndarray::{s, Array4};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::bundle::PredictionBundle;

pub const PLACEHOLDER_SAMPLES: usize = 10;
pub const PLACEHOLDER_SIZE: usize = 64;

const PREDICTED_CONFIDENCE: f32 = 0.8;
const NOISE_STD: f64 = 0.15;

/// Deterministic `[10, 64, 64, 1]` bundle for `seed`
pub fn generate(seed: u64) -> PredictionBundle {
    let mut rng = StdRng::seed_from_u64(seed);
    let n = PLACEHOLDER_SAMPLES;
    let side = PLACEHOLDER_SIZE as i64;

    let mut ground_truth = Array4::<f32>::zeros((n, PLACEHOLDER_SIZE, PLACEHOLDER_SIZE, 1));
    let mut predictions = Array4::<f32>::zeros((n, PLACEHOLDER_SIZE, PLACEHOLDER_SIZE, 1));

    for i in 0..n {
        let cx: i64 = rng.gen_range(20..44);
        let cy: i64 = rng.gen_range(20..44);
        let size: i64 = rng.gen_range(15..25);

        let (x0, x1) = clip_span(cx - size, cx + size, side);
        let (y0, y1) = clip_span(cy - size, cy + size, side);
        ground_truth.slice_mut(s![i, x0..x1, y0..y1, 0]).fill(1.0);

        let offset_x: i64 = rng.gen_range(-3..4);
        let offset_y: i64 = rng.gen_range(-3..4);
        let pred_size = size + rng.gen_range(-2..3);

        let (px0, px1) = clip_span(cx + offset_x - pred_size, cx + offset_x + pred_size, side);
        let (py0, py1) = clip_span(cy + offset_y - pred_size, cy + offset_y + pred_size, side);

        let mut pred = predictions.slice_mut(s![i, .., .., 0]);
        if px0 < px1 && py0 < py1 {
            pred.slice_mut(s![px0..px1, py0..py1]).fill(PREDICTED_CONFIDENCE);
        }

        for v in pred.iter_mut() {
            let noisy = *v as f64 + gaussian(&mut rng) * NOISE_STD;
            *v = noisy.clamp(0.0, 1.0) as f32;
        }
    }

    tracing::debug!(seed, samples = n, "Generated placeholder prediction data");

    PredictionBundle::new(predictions, ground_truth)
        .unwrap_or_else(|e| unreachable!("placeholder bundle is well-formed: {e}"))
}

fn clip_span(start: i64, end: i64, side: i64) -> (usize, usize) {
    (start.clamp(0, side) as usize, end.clamp(0, side) as usize)
}

/// Standard normal sample (Box-Muller)
fn gaussian<R: Rng>(rng: &mut R) -> f64 {
    let u1: f64 = rng.gen_range(f64::EPSILON..1.0);
    let u2: f64 = rng.gen();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}
