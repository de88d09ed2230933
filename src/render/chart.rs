//! SVG line chart for the urban growth projection

use crate::predictor::GrowthTrend;

const WIDTH: f64 = 960.0;
const HEIGHT: f64 = 420.0;
const MARGIN_LEFT: f64 = 70.0;
const MARGIN_RIGHT: f64 = 30.0;
const MARGIN_TOP: f64 = 50.0;
const MARGIN_BOTTOM: f64 = 60.0;

const LINE_COLOR: &str = "#2563eb";

pub fn trend_svg(trend: &GrowthTrend) -> String {
    let mut svg = String::new();
    svg.push_str(&format!(
        r##"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {w} {h}" class="trend-chart" role="img" aria-label="Predicted urban growth trend">"##,
        w = WIDTH,
        h = HEIGHT,
    ));
    svg.push_str(&format!(
        r##"<rect x="{x}" y="{y}" width="{pw}" height="{ph}" fill="#f8fafc"/>"##,
        x = MARGIN_LEFT,
        y = MARGIN_TOP,
        pw = plot_width(),
        ph = plot_height(),
    ));

    if trend.points.is_empty() {
        svg.push_str("</svg>");
        return svg;
    }

    let x_min = trend.points.iter().map(|p| p.year).min().unwrap_or(0) as f64;
    let x_max = trend.points.iter().map(|p| p.year).max().unwrap_or(0) as f64;
    let x_span = (x_max - x_min).max(1.0);

    let sx = |year: f64| MARGIN_LEFT + (year - x_min) / x_span * plot_width();
    let sy = |pct: f64| MARGIN_TOP + (1.0 - pct / 100.0) * plot_height();

    // horizontal grid + y labels
    for pct in (0..=100).step_by(20) {
        let y = sy(pct as f64);
        svg.push_str(&format!(
            r##"<line x1="{x1}" y1="{y:.1}" x2="{x2}" y2="{y:.1}" stroke="#cbd5e1" stroke-opacity="0.6"/><text x="{tx}" y="{ty:.1}" font-size="12" text-anchor="end">{pct}</text>"##,
            x1 = MARGIN_LEFT,
            x2 = MARGIN_LEFT + plot_width(),
            tx = MARGIN_LEFT - 8.0,
            ty = y + 4.0,
        ));
    }

    // x labels
    for p in &trend.points {
        svg.push_str(&format!(
            r##"<text x="{x:.1}" y="{y:.1}" font-size="12" text-anchor="middle">{year}</text>"##,
            x = sx(p.year as f64),
            y = MARGIN_TOP + plot_height() + 20.0,
            year = p.year,
        ));
    }

    let line: Vec<String> = trend
        .points
        .iter()
        .map(|p| format!("{:.1},{:.1}", sx(p.year as f64), sy(p.growth_pct as f64)))
        .collect();

    let base = sy(0.0);
    svg.push_str(&format!(
        r##"<polygon points="{x0:.1},{base:.1} {pts} {x1:.1},{base:.1}" fill="{c}" fill-opacity="0.3"/>"##,
        x0 = sx(x_min),
        x1 = sx(x_max),
        pts = line.join(" "),
        c = LINE_COLOR,
    ));
    svg.push_str(&format!(
        r##"<polyline points="{pts}" fill="none" stroke="{c}" stroke-width="2.5"/>"##,
        pts = line.join(" "),
        c = LINE_COLOR,
    ));

    for (i, p) in trend.points.iter().enumerate() {
        let (x, y) = (sx(p.year as f64), sy(p.growth_pct as f64));
        svg.push_str(&format!(r##"<circle cx="{x:.1}" cy="{y:.1}" r="5" fill="{LINE_COLOR}"/>"##));
        if i % 2 == 0 {
            svg.push_str(&format!(
                r##"<text x="{x:.1}" y="{ty:.1}" font-size="11" font-weight="bold" text-anchor="middle">{pct}%</text>"##,
                ty = y - 10.0,
                pct = p.growth_pct,
            ));
        }
    }

    let current = trend.current_year as f64;
    if (x_min..=x_max).contains(&current) {
        let x = sx(current);
        svg.push_str(&format!(
            r##"<line x1="{x:.1}" y1="{y0}" x2="{x:.1}" y2="{y1:.1}" stroke="red" stroke-dasharray="6 4" stroke-opacity="0.5"/><text x="{tx:.1}" y="{ty}" font-size="11" fill="red">Current Year</text>"##,
            y0 = MARGIN_TOP,
            y1 = MARGIN_TOP + plot_height(),
            tx = x + 4.0,
            ty = MARGIN_TOP + 14.0,
        ));
    }

    svg.push_str(&format!(
        r##"<text x="{cx:.1}" y="28" font-size="16" font-weight="bold" text-anchor="middle">Predicted Urban Growth Trend ({a}-{b})</text><text x="{cx:.1}" y="{by}" font-size="13" font-weight="bold" text-anchor="middle">Year</text><text x="18" y="{my:.1}" font-size="13" font-weight="bold" text-anchor="middle" transform="rotate(-90 18 {my:.1})">Urban Growth (%)</text>"##,
        cx = MARGIN_LEFT + plot_width() / 2.0,
        a = x_min,
        b = x_max,
        by = HEIGHT - 12.0,
        my = MARGIN_TOP + plot_height() / 2.0,
    ));

    svg.push_str("</svg>");
    svg
}

fn plot_width() -> f64 {
    WIDTH - MARGIN_LEFT - MARGIN_RIGHT
}

fn plot_height() -> f64 {
    HEIGHT - MARGIN_TOP - MARGIN_BOTTOM
}
