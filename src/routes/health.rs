use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};

use crate::AppState;

/// Liveness probe covering both stores the API depends on. Redis failures
/// are reported but booking sessions are the only thing they take down, so
/// the status stays degraded rather than down when only Redis is out.
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let db = match sqlx::query("SELECT 1").execute(&state.db).await {
        Ok(_) => "connected".to_string(),
        Err(e) => {
            return (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "error", "db": e.to_string() })),
            )
        }
    };

    let mut redis = state.redis.clone();
    let redis_status = match redis::cmd("PING")
        .query_async::<String>(&mut redis)
        .await
    {
        Ok(_) => "connected".to_string(),
        Err(e) => e.to_string(),
    };

    let degraded = redis_status != "connected";
    (
        StatusCode::OK,
        Json(json!({
            "status": if degraded { "degraded" } else { "ok" },
            "db": db,
            "redis": redis_status,
        })),
    )
}
