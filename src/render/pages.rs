//! Server-rendered pages
//!
//! Each page is a full HTML document built with `format!`. Anything that
//! originates from a request or a token goes through [`escape_html`].

use crate::auth::Identity;
use crate::handlers::status::SystemStatus;
use crate::predictor::{DataSource, Predictor, SampleView, SegmentationMetrics};

use super::escape_html;
use super::heatmap::Layer;

const STYLE: &str = r#"
*{box-sizing:border-box}
body{margin:0;font-family:-apple-system,BlinkMacSystemFont,'Segoe UI',sans-serif;background:#f1f5f9;color:#0f172a}
header{background:#1e293b;color:#f8fafc;padding:14px 24px;display:flex;align-items:center;justify-content:space-between}
header a,header button{color:#f8fafc}
main{max-width:1200px;margin:0 auto;padding:24px}
.layout{display:grid;grid-template-columns:240px 1fr;gap:24px}
aside{background:#fff;border-radius:8px;padding:16px;height:fit-content}
section{background:#fff;border-radius:8px;padding:16px 20px;margin-bottom:20px}
.tiles{display:grid;grid-template-columns:repeat(5,1fr);gap:12px}
.tile{border:1px solid #e2e8f0;border-radius:8px;padding:12px}
.tile .label{font-size:12px;color:#64748b;text-transform:uppercase;letter-spacing:.05em}
.tile .value{font-size:26px;font-weight:700}
.maps{display:grid;grid-template-columns:repeat(3,1fr);gap:16px}
.maps figure{margin:0;text-align:center}
.maps img{width:100%;image-rendering:pixelated;border-radius:4px}
.maps figcaption{font-weight:700;margin-top:6px}
.trend-chart{width:100%;height:auto}
.warn{background:#fef3c7;border:1px solid #f59e0b;padding:10px 14px;border-radius:6px;margin-bottom:16px}
.error{background:#fee2e2;border:1px solid #ef4444;padding:10px 14px;border-radius:6px;margin-bottom:16px}
.ok{background:#dcfce7;border:1px solid #22c55e;padding:10px 14px;border-radius:6px;margin-bottom:16px}
.card{max-width:420px;margin:48px auto;background:#fff;border-radius:8px;padding:28px}
label{display:block;margin:12px 0 4px;font-weight:600}
input{width:100%;padding:8px 10px;border:1px solid #cbd5e1;border-radius:6px}
button,.button{display:inline-block;margin-top:16px;padding:9px 16px;border:0;border-radius:6px;background:#2563eb;color:#fff;cursor:pointer;text-decoration:none}
.inline{display:inline}
.muted{color:#64748b;font-size:13px}
footer{text-align:center;color:#64748b;font-size:12px;padding:24px}
"#;

fn layout(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width,initial-scale=1">
<title>{title}</title>
<style>{STYLE}</style>
</head>
<body>
{body}
<footer>Urban Growth Analytics Dashboard v{version}</footer>
</body>
</html>"#,
        title = escape_html(title),
        version = env!("CARGO_PKG_VERSION"),
    )
}

fn banner(class: &str, message: &str) -> String {
    format!(r#"<div class="{class}">{}</div>"#, escape_html(message))
}

/// Shown instead of protected content when no valid token is present
pub fn login_prompt(message: &str) -> String {
    let body = format!(
        r#"<div class="card">
<h1>Urban Growth Dashboard</h1>
{}
<a class="button" href="/login">Login</a>
<p class="muted">No account yet? <a href="/register">Create one</a>.</p>
</div>"#,
        banner("error", message),
    );
    layout("Login required", &body)
}

pub fn login_form(error: Option<&str>, notice: Option<&str>, username: &str) -> String {
    let body = format!(
        r#"<div class="card">
<h1>Login to Urban Growth Dashboard</h1>
{notice}{error}
<form method="post" action="/login">
<label for="username">Username</label>
<input id="username" name="username" value="{username}" placeholder="Enter your username" autocomplete="username">
<label for="password">Password</label>
<input id="password" name="password" type="password" placeholder="Enter your password" autocomplete="current-password">
<button type="submit">Login</button>
</form>
<p class="muted">Don't have an account? <a href="/register">Register here</a>.</p>
</div>"#,
        notice = notice.map(|n| banner("ok", n)).unwrap_or_default(),
        error = error.map(|e| banner("error", e)).unwrap_or_default(),
        username = escape_html(username),
    );
    layout("Login", &body)
}

pub fn register_form(error: Option<&str>, username: &str) -> String {
    let body = format!(
        r#"<div class="card">
<h1>Create Dashboard Account</h1>
{error}
<form method="post" action="/register">
<label for="username">Choose Username</label>
<input id="username" name="username" value="{username}" placeholder="Enter a username" autocomplete="username">
<label for="password">Create Password</label>
<input id="password" name="password" type="password" placeholder="Enter a password (min. 6 characters)" autocomplete="new-password">
<label for="confirm_password">Confirm Password</label>
<input id="confirm_password" name="confirm_password" type="password" placeholder="Re-enter your password" autocomplete="new-password">
<button type="submit">Create Account</button>
</form>
<p class="muted">Already registered? <a href="/login">Login here</a>.</p>
</div>"#,
        error = error.map(|e| banner("error", e)).unwrap_or_default(),
        username = escape_html(username),
    );
    layout("Register", &body)
}

/// Landing page for visitors without a session
pub fn welcome(status: &SystemStatus) -> String {
    let backend = if status.backend.reachable {
        banner("ok", "Backend server is running")
    } else {
        banner("error", "Backend server is not reachable")
    };

    let artifacts = match (status.model_present, status.data_present) {
        (true, true) => banner("ok", "Model & prediction files found"),
        (model, data) => {
            let mut missing = Vec::new();
            if !model {
                missing.push("Model file");
            }
            if !data {
                missing.push("Prediction data");
            }
            banner("warn", &format!("Missing: {}", missing.join(", ")))
        }
    };

    let body = format!(
        r#"<main>
<section>
<h1>Welcome to Urban Growth Analytics</h1>
<h3>Monitor and Predict Urban Development with Advanced Analytics</h3>
<ul>
<li><b>Urban Growth Prediction</b> using a U-Net segmentation model</li>
<li><b>Satellite Image Analysis</b> for urban expansion patterns</li>
<li>Compare predictions against ground truth</li>
<li>Track Accuracy, F1-Score and IoU</li>
</ul>
<a class="button" href="/login">Login to Dashboard</a>
<a class="button" href="/register">Create Account</a>
</section>
<section>
<h2>System Status</h2>
{backend}
{artifacts}
</section>
</main>"#
    );
    layout("Urban Growth Analytics", &body)
}

/// Everything the dashboard page needs, resolved by the handler
pub struct DashboardView<'a> {
    pub identity: &'a Identity,
    pub predictor: &'a Predictor,
    pub sample: &'a SampleView,
    /// `(layer, data URI)` in display order
    pub heatmaps: Vec<(Layer, String)>,
    pub trend_svg: String,
}

pub fn dashboard(view: &DashboardView<'_>) -> String {
    let name = escape_html(&view.identity.display_name);
    let predictor = view.predictor;
    let count = predictor.sample_count();

    let mut body = String::new();
    body.push_str(&format!(
        r#"<header><strong>Urban Growth Prediction Dashboard</strong>
<form class="inline" method="post" action="/logout"><button type="submit">Logout</button></form></header>
<main><div class="layout">
<aside>
<h3>User Info</h3>
<p><b>Username:</b> {name}</p>
<h3>Data</h3>
<p class="muted">{samples} samples, {h}x{w} px</p>
<p class="muted">Loaded {loaded}</p>
<form method="post" action="/dashboard/refresh"><button type="submit">Refresh Dashboard</button></form>
</aside>
<div>
<section><h1>Welcome, {name}!</h1>
<p>Visualize predicted urban expansion over time with pattern recognition from a U-Net segmentation model.</p></section>
"#,
        samples = count,
        h = predictor.shape()[1],
        w = predictor.shape()[2],
        loaded = predictor.loaded_at().format("%Y-%m-%d %H:%M:%S UTC"),
    ));

    if let DataSource::Placeholder { reason } = predictor.data_source() {
        body.push_str(&banner(
            "warn",
            &format!("Running in demonstration mode with sample data ({})", reason),
        ));
    }

    body.push_str(&format!(
        "<section><h2>Model Performance Metrics</h2>{}</section>",
        metric_tiles(predictor.metrics())
    ));

    let prev = view.sample.index.checked_sub(1).unwrap_or(count - 1);
    let next = (view.sample.index + 1) % count;
    body.push_str(&format!(
        r#"<section><h2>Urban Growth Prediction Visualization</h2>
<form method="get" action="/dashboard">
<label for="sample">Select Sample Index (0 - {max})</label>
<input id="sample" name="sample" type="number" min="0" max="{max}" value="{index}">
<button type="submit">Show</button>
<a class="button" href="/dashboard?sample={prev}">Previous</a>
<a class="button" href="/dashboard?sample={next}">Next</a>
</form>
<div class="maps">"#,
        max = count - 1,
        index = view.sample.index,
    ));
    for (layer, uri) in &view.heatmaps {
        body.push_str(&format!(
            r#"<figure><img src="{uri}" alt="{title}"><figcaption>{title}</figcaption></figure>"#,
            title = layer.title(),
        ));
    }
    body.push_str(&format!(
        "</div><h3>Sample {} metrics</h3>{}</section>",
        view.sample.index,
        metric_tiles(&view.sample.metrics)
    ));

    body.push_str(&format!(
        "<section><h2>Urban Growth Projection Over Time</h2>{}</section>",
        view.trend_svg
    ));

    body.push_str(&model_information(predictor));
    body.push_str("</div></div></main>");

    layout("Urban Growth Prediction Dashboard", &body)
}

fn metric_tiles(m: &SegmentationMetrics) -> String {
    let mut out = String::from(r#"<div class="tiles">"#);
    for (label, value) in m.labelled() {
        out.push_str(&format!(
            r#"<div class="tile"><div class="label">{label}</div><div class="value">{value:.4}</div></div>"#
        ));
    }
    out.push_str("</div>");
    out
}

fn model_information(predictor: &Predictor) -> String {
    let model = predictor.model_status();
    let model_line = if model.available {
        format!(
            "Checkpoint found at <code>{}</code> ({} bytes)",
            escape_html(&model.path.display().to_string()),
            model.size_bytes.unwrap_or(0)
        )
    } else {
        format!(
            "Checkpoint not found at <code>{}</code>",
            escape_html(&model.path.display().to_string())
        )
    };

    let source_line = match predictor.data_source() {
        DataSource::Cache { path } => format!(
            "Cached predictions from <code>{}</code>",
            escape_html(&path.display().to_string())
        ),
        DataSource::Placeholder { .. } => "Synthetic placeholder predictions".to_string(),
    };

    format!(
        r#"<section><h2>Model Information</h2>
<p>{model_line}</p>
<p>{source_line}, threshold {threshold}</p>
<ul>
<li><b>Architecture:</b> U-Net CNN</li>
<li><b>Input:</b> 64x64 multi-spectral patches</li>
<li><b>Output:</b> urban growth probability maps</li>
<li><b>Loss:</b> binary cross-entropy</li>
</ul>
<details><summary>Data Sources &amp; References</summary>
<ul>
<li><b>Satellite Imagery:</b> Landsat 8/9 Collection 2 Level-2</li>
<li><b>Population Data:</b> WorldPop &amp; GPWv4</li>
<li><b>Road Networks:</b> OpenStreetMap</li>
<li><b>Urban Boundaries:</b> Municipal GIS Data</li>
</ul>
<p class="muted">All data resampled to 30m resolution, UTM Zone 43N</p>
</details></section>"#,
        threshold = predictor.threshold(),
    )
}
