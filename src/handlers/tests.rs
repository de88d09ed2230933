use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use axum::{
    body::{to_bytes, Body, Bytes},
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE},
        HeaderMap, Method, Request, StatusCode,
    },
    Router,
};
use ndarray::Array4;
use ndarray_npy::NpzWriter;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use crate::auth::validator::tests::{issue, SECRET};
use crate::auth::{JwtValidator, SESSION_COOKIE};
use crate::config::Config;
use crate::predictor::{Predictor, SharedPredictor};
use crate::upstream::tests::spawn_stub_backend;
use crate::upstream::UpstreamClient;
use crate::AppState;

struct TestApp {
    router: Router,
    config: Config,
    // keeps the artifact directory alive for the test's duration
    _dir: TempDir,
}

struct TestResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl TestResponse {
    fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap()
    }

    fn header(&self, name: impl axum::http::header::AsHeaderName) -> &str {
        self.headers.get(name).unwrap().to_str().unwrap()
    }
}

async fn test_app() -> TestApp {
    test_app_with_backend(spawn_stub_backend().await)
}

/// App whose auth backend lives at `backend_url`
fn test_app_with_backend(backend_url: String) -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let mut config = Config::for_tests(dir.path());
    config.auth_backend_url = backend_url;

    let state = AppState {
        predictor: SharedPredictor::new(Predictor::load(&config.predictor)),
        validator: Arc::new(JwtValidator::new(SECRET)),
        upstream: UpstreamClient::from_config(&config).unwrap(),
        config: config.clone(),
    };

    TestApp { router: crate::create_router(state), config, _dir: dir }
}

impl TestApp {
    async fn send(&self, req: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        TestResponse { status, headers, body }
    }

    async fn get(&self, uri: &str) -> TestResponse {
        self.send(Request::get(uri).body(Body::empty()).unwrap()).await
    }

    async fn get_with_token(&self, uri: &str, token: &str) -> TestResponse {
        let req = Request::get(uri)
            .header(AUTHORIZATION, format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap();
        self.send(req).await
    }

    async fn post_form(&self, uri: &str, form: &str) -> TestResponse {
        let req = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(form.to_string()))
            .unwrap();
        self.send(req).await
    }
}

fn token() -> String {
    issue(SECRET, "priya", 3600)
}

// Pages

#[tokio::test]
async fn test_dashboard_requires_login() {
    let app = test_app().await;
    let res = app.get("/dashboard").await;

    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert!(res.text().contains("Please login to access the Dashboard"));
    assert!(res.headers.get(SET_COOKIE).is_none());
}

#[tokio::test]
async fn test_dashboard_with_query_token_sets_session_cookie() {
    let app = test_app().await;
    let res = app.get(&format!("/dashboard?token={}", token())).await;

    assert_eq!(res.status, StatusCode::OK);
    let html = res.text();
    assert!(html.contains("Welcome, priya!"));
    assert!(html.contains("Running in demonstration mode"));
    assert!(html.contains("data:image/png;base64,"));
    assert!(html.contains("Predicted Urban Growth Trend"));
    assert!(res.header(SET_COOKIE).starts_with(&format!("{}=", SESSION_COOKIE)));
}

#[tokio::test]
async fn test_dashboard_with_session_cookie() {
    let app = test_app().await;
    let req = Request::get("/dashboard?sample=3")
        .header(COOKIE, format!("theme=dark; {}={}", SESSION_COOKIE, token()))
        .body(Body::empty())
        .unwrap();
    let res = app.send(req).await;

    assert_eq!(res.status, StatusCode::OK);
    assert!(res.text().contains(r#"value="3""#));
    // cookie-borne tokens are not re-issued
    assert!(res.headers.get(SET_COOKIE).is_none());
}

#[tokio::test]
async fn test_dashboard_out_of_range_sample_shows_first() {
    let app = test_app().await;

    for query in ["sample=999", "sample=-4", "sample=abc", "sample="] {
        let res = app.get_with_token(&format!("/dashboard?{}", query), &token()).await;
        assert_eq!(res.status, StatusCode::OK, "{}", query);
        assert!(res.text().contains(r#"value="0""#), "{}", query);
    }
}

#[tokio::test]
async fn test_expired_cookie_is_cleared() {
    let app = test_app().await;
    let req = Request::get("/dashboard")
        .header(COOKIE, format!("{}={}", SESSION_COOKIE, issue(SECRET, "priya", -3600)))
        .body(Body::empty())
        .unwrap();
    let res = app.send(req).await;

    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert!(res.text().contains("Your session has expired"));
    assert!(res.header(SET_COOKIE).contains("Max-Age=0"));
}

#[tokio::test]
async fn test_expired_header_token_leaves_cookie_alone() {
    let app = test_app().await;
    let res = app.get_with_token("/dashboard", &issue(SECRET, "priya", -3600)).await;

    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert!(res.text().contains("Your session has expired"));
    assert!(res.headers.get(SET_COOKIE).is_none());
}

#[tokio::test]
async fn test_stale_link_token_keeps_session_cookie() {
    let app = test_app().await;
    let expired = issue(SECRET, "priya", -3600);
    let req = Request::get(format!("/dashboard?token={}", expired))
        .header(COOKIE, format!("{}={}", SESSION_COOKIE, token()))
        .body(Body::empty())
        .unwrap();
    let res = app.send(req).await;

    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert!(res.headers.get(SET_COOKIE).is_none());

    // the cookie still works once the link token is gone
    let req = Request::get("/dashboard")
        .header(COOKIE, format!("{}={}", SESSION_COOKIE, token()))
        .body(Body::empty())
        .unwrap();
    assert_eq!(app.send(req).await.status, StatusCode::OK);
}

#[tokio::test]
async fn test_refresh_dashboard_reloads_bundle() {
    let app = test_app().await;
    write_bundle(&app.config.predictor.predictions_path, 3);

    let req = Request::post("/dashboard/refresh")
        .header(AUTHORIZATION, format!("Bearer {}", token()))
        .body(Body::empty())
        .unwrap();
    let res = app.send(req).await;

    assert_eq!(res.status, StatusCode::SEE_OTHER);
    assert_eq!(res.header(LOCATION), "/dashboard");

    let model = app.get_with_token("/api/v1/model", &token()).await.json();
    assert_eq!(model["data_source"]["kind"], "cache");
    assert_eq!(model["samples"], 3);
}

#[tokio::test]
async fn test_refresh_requires_login() {
    let app = test_app().await;
    let res = app.post_form("/dashboard/refresh", "").await;

    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert!(res.text().contains("Please login to access the Dashboard"));
}

#[tokio::test]
async fn test_welcome_page_reports_status() {
    let app = test_app().await;
    let res = app.get("/").await;

    assert_eq!(res.status, StatusCode::OK);
    let html = res.text();
    assert!(html.contains("Backend server is running"));
    assert!(html.contains("Missing: Model file, Prediction data"));
}

#[tokio::test]
async fn test_welcome_redirects_signed_in_visitor() {
    let app = test_app().await;
    let res = app.get(&format!("/?token={}", token())).await;

    assert_eq!(res.status, StatusCode::SEE_OTHER);
    assert_eq!(res.header(LOCATION), "/dashboard");
    assert!(res.headers.get(SET_COOKIE).is_some());
}

#[tokio::test]
async fn test_health() {
    let app = test_app().await;
    let res = app.get("/health").await;

    assert_eq!(res.status, StatusCode::OK);
    let body = res.json();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["placeholder_data"], true);
}

// Session

#[tokio::test]
async fn test_login_success_sets_cookie() {
    let app = test_app().await;
    let res = app.post_form("/login", "username=priya&password=secret").await;

    assert_eq!(res.status, StatusCode::SEE_OTHER);
    assert_eq!(res.header(LOCATION), "/dashboard");

    let cookie = res.header(SET_COOKIE);
    assert!(cookie.starts_with(&format!("{}=", SESSION_COOKIE)));
    assert!(cookie.contains("HttpOnly"));
}

#[tokio::test]
async fn test_login_wrong_password() {
    let app = test_app().await;
    let res = app.post_form("/login", "username=priya&password=nope").await;

    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    let html = res.text();
    assert!(html.contains("Invalid credentials"));
    assert!(html.contains(r#"value="priya""#));
    assert!(res.headers.get(SET_COOKIE).is_none());
}

#[tokio::test]
async fn test_login_empty_fields() {
    let app = test_app().await;
    let res = app.post_form("/login", "username=&password=").await;

    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert!(res.text().contains("Please enter both username and password"));
}

#[tokio::test]
async fn test_login_backend_failure_is_bad_gateway() {
    let app = test_app().await;
    let res = app.post_form("/login", "username=crash&password=secret").await;

    assert_eq!(res.status, StatusCode::BAD_GATEWAY);
    assert!(res.text().contains("Database unavailable"));
    assert!(res.headers.get(SET_COOKIE).is_none());
}

#[tokio::test]
async fn test_login_unreachable_backend_is_bad_gateway() {
    // bind then drop to get a port nobody listens on
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let app = test_app_with_backend(url);
    let res = app.post_form("/login", "username=priya&password=secret").await;
    assert_eq!(res.status, StatusCode::BAD_GATEWAY);
    assert!(res.text().contains("Cannot connect to server"));

    let res = app
        .post_form("/register", "username=newcomer&password=secret1&confirm_password=secret1")
        .await;
    assert_eq!(res.status, StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_login_with_unverifiable_token_is_bad_gateway() {
    let app = test_app().await;
    let res = app.post_form("/login", "username=mallory&password=secret").await;

    assert_eq!(res.status, StatusCode::BAD_GATEWAY);
    assert!(res.text().contains("session could not be verified"));
    assert!(res.headers.get(SET_COOKIE).is_none());
}

#[tokio::test]
async fn test_login_and_register_pages_keep_query_token() {
    let app = test_app().await;

    for page in ["/login", "/register"] {
        let res = app.get(&format!("{}?token={}", page, token())).await;
        assert_eq!(res.status, StatusCode::SEE_OTHER, "{}", page);
        assert_eq!(res.header(LOCATION), "/dashboard");
        assert!(res.header(SET_COOKIE).starts_with(&format!("{}=", SESSION_COOKIE)), "{}", page);
    }
}

#[tokio::test]
async fn test_login_page_with_cookie_does_not_reissue_it() {
    let app = test_app().await;
    let req = Request::get("/login")
        .header(COOKIE, format!("{}={}", SESSION_COOKIE, token()))
        .body(Body::empty())
        .unwrap();
    let res = app.send(req).await;

    assert_eq!(res.status, StatusCode::SEE_OTHER);
    assert!(res.headers.get(SET_COOKIE).is_none());
}

#[tokio::test]
async fn test_login_page_shows_registration_notice() {
    let app = test_app().await;
    let res = app.get("/login?registered=1").await;

    assert_eq!(res.status, StatusCode::OK);
    assert!(res.text().contains("Registration successful!"));
}

#[tokio::test]
async fn test_register_password_mismatch() {
    let app = test_app().await;
    let res = app
        .post_form("/register", "username=newcomer&password=secret1&confirm_password=secret2")
        .await;

    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert!(res.text().contains("Passwords do not match"));
}

#[tokio::test]
async fn test_register_short_password() {
    let app = test_app().await;
    let res = app
        .post_form("/register", "username=newcomer&password=abc&confirm_password=abc")
        .await;

    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert!(res.text().contains("Password must be at least 6 characters long"));
}

#[tokio::test]
async fn test_register_success_redirects_to_login() {
    let app = test_app().await;
    let res = app
        .post_form("/register", "username=newcomer&password=secret1&confirm_password=secret1")
        .await;

    assert_eq!(res.status, StatusCode::SEE_OTHER);
    assert_eq!(res.header(LOCATION), "/login?registered=1");
}

#[tokio::test]
async fn test_register_taken_username() {
    let app = test_app().await;
    let res = app
        .post_form("/register", "username=taken&password=secret1&confirm_password=secret1")
        .await;

    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert!(res.text().contains("Username already exists"));
}

#[tokio::test]
async fn test_logout_clears_cookie() {
    let app = test_app().await;
    let res = app.post_form("/logout", "").await;

    assert_eq!(res.status, StatusCode::SEE_OTHER);
    assert_eq!(res.header(LOCATION), "/");
    assert!(res.header(SET_COOKIE).contains("Max-Age=0"));
}

// API

#[tokio::test]
async fn test_api_requires_token() {
    let app = test_app().await;
    let res = app.get("/api/v1/metrics").await;

    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.json()["error"], "Authentication required");
}

#[tokio::test]
async fn test_api_rejects_expired_and_forged_tokens() {
    let app = test_app().await;

    let res = app.get_with_token("/api/v1/me", &issue(SECRET, "priya", -3600)).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.json()["error"], "Token has expired");

    let res = app.get_with_token("/api/v1/me", &issue("other-secret", "priya", 3600)).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.json()["error"], "Invalid token");
}

#[tokio::test]
async fn test_api_me() {
    let app = test_app().await;
    let res = app.get_with_token("/api/v1/me", &token()).await;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json()["display_name"], "priya");
}

#[tokio::test]
async fn test_api_metrics_placeholder() {
    let app = test_app().await;
    let res = app.get_with_token("/api/v1/metrics", &token()).await;

    assert_eq!(res.status, StatusCode::OK);
    let body = res.json();
    assert_eq!(body["data_source"]["kind"], "placeholder");
    assert_eq!(body["samples"], 10);
    assert_eq!(body["shape"], serde_json::json!([10, 64, 64, 1]));

    let accuracy = body["metrics"]["accuracy"].as_f64().unwrap();
    assert!((0.0..=1.0).contains(&accuracy));
}

#[tokio::test]
async fn test_api_sample_wraps_out_of_range() {
    let app = test_app().await;
    let res = app.get_with_token("/api/v1/samples/42", &token()).await;

    assert_eq!(res.status, StatusCode::OK);
    let body = res.json();
    assert_eq!(body["index"], 0);
    assert_eq!(body["requested"], "42");
    assert_eq!(body["ground_truth"].as_array().unwrap().len(), 64);
    assert_eq!(body["difference"][0].as_array().unwrap().len(), 64);
}

#[tokio::test]
async fn test_api_sample_heatmap_png() {
    let app = test_app().await;
    let res = app.get_with_token("/api/v1/samples/3/prediction.png", &token()).await;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.header(CONTENT_TYPE), "image/png");
    assert_eq!(&res.body[..4], &[0x89, b'P', b'N', b'G']);
}

#[tokio::test]
async fn test_api_unknown_layer() {
    let app = test_app().await;
    let res = app.get_with_token("/api/v1/samples/3/overlay.png", &token()).await;

    assert_eq!(res.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_api_trend() {
    let app = test_app().await;
    let res = app.get_with_token("/api/v1/trend", &token()).await;

    assert_eq!(res.status, StatusCode::OK);
    let body = res.json();
    assert_eq!(body["points"].as_array().unwrap().len(), 9);
    assert_eq!(body["current_year"], 2024);
}

#[tokio::test]
async fn test_api_reload_picks_up_new_bundle() {
    let app = test_app().await;
    write_bundle(&app.config.predictor.predictions_path, 3);

    let req = Request::post("/api/v1/predictor/reload")
        .header(AUTHORIZATION, format!("Bearer {}", token()))
        .body(Body::empty())
        .unwrap();
    let res = app.send(req).await;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json()["data_source"]["kind"], "cache");

    let metrics = app.get_with_token("/api/v1/metrics", &token()).await.json();
    assert_eq!(metrics["samples"], 3);
    assert_eq!(metrics["metrics"]["iou"], 1.0);
}

#[tokio::test]
async fn test_api_model() {
    let app = test_app().await;
    let res = app.get_with_token("/api/v1/model", &token()).await;

    assert_eq!(res.status, StatusCode::OK);
    let body = res.json();
    assert_eq!(body["model"]["available"], false);
    assert_eq!(body["data_source"]["kind"], "placeholder");
    assert_eq!(body["samples"], 10);
    assert!(body["loaded_at"].is_string());
}

#[tokio::test]
async fn test_api_status() {
    let app = test_app().await;
    let res = app.get_with_token("/api/v1/status", &token()).await;

    assert_eq!(res.status, StatusCode::OK);
    let body = res.json();
    assert_eq!(body["backend"]["reachable"], true);
    assert_eq!(body["model_present"], false);
}

/// Bundle whose predictions match the ground truth exactly
fn write_bundle(path: &Path, samples: usize) {
    let gt = Array4::<f32>::from_shape_fn((samples, 8, 8, 1), |(_, r, c, _)| {
        if r < 4 && c < 4 { 1.0 } else { 0.0 }
    });

    let mut npz = NpzWriter::new(File::create(path).unwrap());
    npz.add_array("predictions.npy", &gt).unwrap();
    npz.add_array("ground_truth.npy", &gt).unwrap();
    npz.finish().unwrap();
}
