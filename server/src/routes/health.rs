use std::sync::LazyLock;
use std::time::Instant;

use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

static SERVER_START: LazyLock<Instant> = LazyLock::new(Instant::now);

/// Liveness probe.
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "service": "visitlog-server",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "uptime_seconds": SERVER_START.elapsed().as_secs(),
    }))
}
