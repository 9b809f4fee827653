use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::state::ApiState;

pub async fn health_check(State(state): State<ApiState>) -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "service": "gitsync",
        "repositories": state.coordinator.registry().statuses(),
    }))
}
