//! Health check handler.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::json;

use crate::state::AppState;

/// `GET /health` — database reachability plus embedding provider status.
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<serde_json::Value>) {
    let db_ok = sqlx::query("SELECT 1")
        .execute(state.db.pool())
        .await
        .is_ok();
    let embedder_ok = state.embedder.health_check().await.unwrap_or(false);

    let status = if db_ok {
        // A down provider degrades search but the service still serves
        // stored data.
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(json!({
            "database": db_ok,
            "embedding_provider": embedder_ok,
            "model": state.embedder.model_name(),
        })),
    )
}
