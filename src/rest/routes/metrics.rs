use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
};
use std::sync::Arc;

use crate::AppContext;

/// `GET /metrics` — Prometheus text exposition.
pub async fn metrics(State(ctx): State<Arc<AppContext>>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        ctx.metrics.render_prometheus(),
    )
}
