use crate::state::AppState;
use axum::{extract::State, Json};
use serde_json::{json, Value};

pub async fn health(State(state): State<AppState>) -> Json<Value> {
    let audit = state.recorder.health();
    let status = if audit.is_healthy() && state.recorder.is_open() {
        "ok"
    } else {
        "degraded"
    };

    Json(json!({
        "status": status,
        "version": env!("CARGO_PKG_VERSION"),
        "audit": audit,
        "auditQueueUsage": state.recorder.buffer_usage(),
    }))
}
