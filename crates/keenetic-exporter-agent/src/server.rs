//! Scrape endpoint.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Router,
};
use keenetic_exporter_core::{render, DeviceStateStore, CONTENT_TYPE};
use std::sync::Arc;

/// Build the router: `GET /metrics` renders the store, every other path is 404.
pub fn build_router(store: Arc<DeviceStateStore>) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .fallback(not_found)
        .with_state(store)
}

/// Render a fresh snapshot; never touches the network.
async fn metrics_handler(State(store): State<Arc<DeviceStateStore>>) -> impl IntoResponse {
    let body = render(&store.snapshot());
    ([(header::CONTENT_TYPE, CONTENT_TYPE)], body)
}

async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        [(header::CONTENT_TYPE, "text/plain")],
        "Not Found",
    )
}
