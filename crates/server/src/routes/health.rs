use axum::{Extension, Json};
use serde_json::{json, Value as JsonValue};
use sqlx::PgPool;

/// GET /health
pub async fn health_check(Extension(pool): Extension<PgPool>) -> Json<JsonValue> {
    let database = match sqlx::query("SELECT 1").execute(&pool).await {
        Ok(_) => "ok",
        Err(e) => {
            tracing::warn!("Health check database ping failed: {e}");
            "unavailable"
        }
    };
    Json(json!({ "status": "ok", "database": database }))
}
