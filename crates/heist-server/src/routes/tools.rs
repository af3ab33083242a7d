//! Tool routes — catalogue listing and serialized tool invocation.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::state::AppState;
use crate::tools;

// ---------------------------------------------------------------
// Route builder
// ---------------------------------------------------------------

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/tools", get(list_tools))
        .route("/tools/{name}", post(call_tool))
}

// ---------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------

async fn list_tools() -> Json<Value> {
    Json(json!({ "tools": tools::catalogue() }))
}

async fn call_tool(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    body: Bytes,
) -> Json<Value> {
    let args: Value = if body.is_empty() {
        json!({})
    } else {
        match serde_json::from_slice(&body) {
            Ok(v) => v,
            Err(e) => return Json(json!({ "error": format!("Invalid arguments: {}", e) })),
        }
    };

    let _guard = state.tool_lock.lock().await;
    info!("Dispatching {}", name);

    let worker = state.clone();
    match tokio::task::spawn_blocking(move || {
        tools::call(&name, args, worker.bridge.as_ref(), &worker.config)
    })
    .await
    {
        Ok(value) => Json(value),
        Err(e) => {
            warn!("Tool task aborted: {}", e);
            Json(json!({ "error": format!("Tool task failed: {}", e) }))
        }
    }
}
