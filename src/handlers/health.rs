use axum::{Json, http::StatusCode};
use chrono::Utc;
use serde_json::{Value, json};

pub async fn root() -> &'static str {
    "pmp-session-api is running"
}

/// Liveness probe; never touches session state
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "ok": true,
            "time": Utc::now().to_rfc3339(),
            "service": "pmp-session-api",
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}
