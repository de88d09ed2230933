//! Dashboard rendering - heatmaps, trend chart and HTML pages

pub mod chart;
pub mod colormap;
pub mod heatmap;
pub mod pages;

use thiserror::Error;

pub use colormap::Colormap;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("cannot render an empty map")]
    EmptyMap,

    #[error("image encoding failed: {0}")]
    Image(#[from] image::ImageError),
}

/// Escape text for HTML element and attribute content
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
