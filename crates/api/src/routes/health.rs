use axum::{extract::State, routing::get, Json, Router};
use serde_json::{json, Value};

use crate::AppState;

pub fn health_router() -> Router<AppState> {
    Router::new().route("/healthz", get(healthz))
}

/// Liveness plus the poller state and data source.
async fn healthz(State(state): State<AppState>) -> Json<Value> {
    let poller = *state.poller_state.read().await;
    Json(json!({
        "status": "ok",
        "poller": poller.to_string(),
        "mode": state.data_mode.to_string(),
    }))
}
