use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /health
/// Returns service status, version and whether the LaTeX engine can be run.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    let compiler = state.service.compiler_status().await;
    Json(json!({
        "status": if compiler.available { "ok" } else { "degraded" },
        "version": env!("CARGO_PKG_VERSION"),
        "service": "cvforge-api",
        "compiler": compiler,
    }))
}
