//! Heatmap PNGs for ground truth, prediction and difference maps

use std::io::Cursor;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use image::{DynamicImage, ImageOutputFormat, Rgb, RgbImage};
use ndarray::ArrayView2;
use serde::{Deserialize, Serialize};

use crate::predictor::SampleView;

use super::{Colormap, RenderError};

/// Default nearest-neighbour upscale for 64x64 masks
pub const DEFAULT_SCALE: u32 = 4;

/// The three panels shown per sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layer {
    GroundTruth,
    Prediction,
    Difference,
}

impl Layer {
    pub const ALL: [Layer; 3] = [Layer::GroundTruth, Layer::Prediction, Layer::Difference];

    pub fn colormap(self) -> Colormap {
        match self {
            Self::GroundTruth => Colormap::Viridis,
            Self::Prediction => Colormap::Plasma,
            Self::Difference => Colormap::Coolwarm,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::GroundTruth => "Ground Truth",
            Self::Prediction => "Model Prediction",
            Self::Difference => "Difference Map",
        }
    }

    pub fn slug(self) -> &'static str {
        match self {
            Self::GroundTruth => "ground_truth",
            Self::Prediction => "prediction",
            Self::Difference => "difference",
        }
    }

    /// The map this layer shows for `sample`
    pub fn select(self, sample: &SampleView) -> ArrayView2<'_, f32> {
        match self {
            Self::GroundTruth => sample.ground_truth.view(),
            Self::Prediction => sample.prediction.view(),
            Self::Difference => sample.difference.view(),
        }
    }

    /// Accepts `prediction` as well as `prediction.png`
    pub fn parse(raw: &str) -> Option<Self> {
        let slug = raw.strip_suffix(".png").unwrap_or(raw);
        Self::ALL.into_iter().find(|layer| layer.slug() == slug)
    }
}

/// Encode `map` (rows x cols, values in `[0, 1]`) as a PNG
pub fn render_png(map: ArrayView2<'_, f32>, colormap: Colormap, scale: u32) -> Result<Vec<u8>, RenderError> {
    let (rows, cols) = map.dim();
    if rows == 0 || cols == 0 {
        return Err(RenderError::EmptyMap);
    }

    let scale = scale.max(1);
    let img = RgbImage::from_fn(cols as u32 * scale, rows as u32 * scale, |x, y| {
        let value = map[[(y / scale) as usize, (x / scale) as usize]];
        Rgb(colormap.rgb(value))
    });

    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(img).write_to(&mut Cursor::new(&mut bytes), ImageOutputFormat::Png)?;
    Ok(bytes)
}

/// `data:` URI for inlining a PNG into a page
pub fn png_data_uri(png: &[u8]) -> String {
    format!("data:image/png;base64,{}", BASE64.encode(png))
}
