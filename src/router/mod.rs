//! HTTP routing for the relay.
//!
//! | Method | Path                          | Behavior                            |
//! |--------|-------------------------------|-------------------------------------|
//! | GET    | `/heart-rate-endpoint`, `/hr` | current value as a plain integer    |
//! | GET    | `/metrics`                    | Prometheus text exposition          |
//! | POST   | `/heart-rate-endpoint`, `/hr` | JSON update, see [`payload`]        |
//!
//! Everything else, including a wrong method on a known path, is a `404`
//! with an empty body. That covers `HEAD` and CORS preflight `OPTIONS`;
//! browser overlays poll with plain GETs and only need the
//! `Access-Control-Allow-Origin` response header.

pub mod format;
pub mod payload;

use crate::metrics::MetricsRegistry;
use crate::store::ReadingStore;
use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, MethodRouter},
    Router,
};
use std::sync::Arc;
use tower_http::{set_header::SetResponseHeaderLayer, trace::TraceLayer};

/// Paths accepting heart-rate reads and writes.
pub const HEART_RATE_PATHS: [&str; 2] = ["/heart-rate-endpoint", "/hr"];

/// Path of the Prometheus endpoint.
pub const METRICS_PATH: &str = "/metrics";

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    /// The current reading.
    pub store: Arc<ReadingStore>,
    /// Exporter for `/metrics`.
    pub metrics: Arc<MetricsRegistry>,
}

impl AppState {
    /// Bundles the store and metrics registry.
    pub fn new(store: Arc<ReadingStore>, metrics: Arc<MetricsRegistry>) -> Self {
        Self { store, metrics }
    }
}

/// Builds the relay router.
pub fn build_router(state: AppState) -> Router {
    let heart_rate: MethodRouter<AppState> = get(get_heart_rate)
        .head(not_found)
        .post(post_heart_rate)
        .fallback(not_found);

    let mut router = Router::new();
    for path in HEART_RATE_PATHS {
        router = router.route(path, heart_rate.clone());
    }

    router
        .route(
            METRICS_PATH,
            get(get_metrics).head(not_found).fallback(not_found),
        )
        .fallback(not_found)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(SetResponseHeaderLayer::if_not_present(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ))
}

/// Handler for `GET /hr`.
async fn get_heart_rate(State(state): State<AppState>) -> impl IntoResponse {
    let reading = state.store.get();
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/plain"),
            (HeaderName::from_static("refresh"), format::REFRESH_SECONDS),
        ],
        format::bpm_text(&reading),
    )
}

/// Handler for `POST /hr`.
async fn post_heart_rate(State(state): State<AppState>, body: Bytes) -> Response {
    match payload::parse(&body) {
        Ok(update) => {
            state.store.set(update.value, update.timestamp);
            tracing::info!(payload = %String::from_utf8_lossy(&body), "Heart rate updated");
            StatusCode::OK.into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "Rejected heart rate payload");
            (StatusCode::BAD_REQUEST, e.to_string()).into_response()
        }
    }
}

/// Handler for the /metrics endpoint.
async fn get_metrics(State(state): State<AppState>) -> Response {
    let reading = state.store.get();

    match state.metrics.render(&reading) {
        Ok(output) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            output,
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            format!("Failed to encode metrics: {}", e),
        )
            .into_response(),
    }
}

async fn not_found() -> StatusCode {
    StatusCode::NOT_FOUND
}
