use chess_core::ViewSession;
use sqlx::PgPool;

use crate::error::AppError;

#[derive(sqlx::FromRow)]
struct SessionRow {
    tracked_game_id: Option<i64>,
    ply: i32,
    cached_raw_text: Option<String>,
}

/// A session id never seen before loads as a fresh session.
pub async fn load(pool: &PgPool, session_id: &str) -> Result<ViewSession, AppError> {
    let row = sqlx::query_as::<_, SessionRow>(
        "SELECT tracked_game_id, ply, cached_raw_text FROM view_sessions WHERE session_id = $1",
    )
    .bind(session_id)
    .fetch_optional(pool)
    .await
    .map_err(AppError::Sqlx)?;

    Ok(row
        .map(|r| ViewSession {
            tracked_game_id: r.tracked_game_id,
            ply: r.ply.max(0) as u32,
            cached_raw_text: r.cached_raw_text,
        })
        .unwrap_or_default())
}

/// Last write wins.
pub async fn save(pool: &PgPool, session_id: &str, session: &ViewSession) -> Result<(), AppError> {
    sqlx::query(
        r#"INSERT INTO view_sessions (session_id, tracked_game_id, ply, cached_raw_text, updated_at)
           VALUES ($1, $2, $3, $4, NOW())
           ON CONFLICT (session_id) DO UPDATE SET
               tracked_game_id = EXCLUDED.tracked_game_id,
               ply = EXCLUDED.ply,
               cached_raw_text = EXCLUDED.cached_raw_text,
               updated_at = NOW()"#,
    )
    .bind(session_id)
    .bind(session.tracked_game_id)
    .bind(i32::try_from(session.ply).unwrap_or(i32::MAX))
    .bind(session.cached_raw_text.as_deref())
    .execute(pool)
    .await
    .map_err(AppError::Sqlx)?;
    Ok(())
}

/// Deletes sessions not written for `ttl_hours`. Returns the number removed.
pub async fn purge_expired(pool: &PgPool, ttl_hours: i32) -> Result<u64, AppError> {
    let result = sqlx::query(
        "DELETE FROM view_sessions WHERE updated_at < NOW() - make_interval(hours => $1)",
    )
    .bind(ttl_hours)
    .execute(pool)
    .await
    .map_err(AppError::Sqlx)?;
    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::pool;

    async fn test_pool() -> PgPool {
        dotenvy::dotenv().ok();
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let pool = pool::create_pool(&url).await.unwrap();
        pool::run_migrations(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    #[ignore = "requires Postgres at DATABASE_URL"]
    async fn test_purge_removes_only_idle_sessions() {
        let pool = test_pool().await;
        let stamp = chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default();
        let idle = format!("{stamp:032x}");
        let fresh = format!("{:032x}", stamp + 1);
        let session = ViewSession {
            tracked_game_id: Some(1),
            ply: 3,
            cached_raw_text: Some("1. e4 e5 *".to_string()),
        };
        save(&pool, &idle, &session).await.unwrap();
        save(&pool, &fresh, &session).await.unwrap();
        sqlx::query("UPDATE view_sessions SET updated_at = NOW() - INTERVAL '3 hours' WHERE session_id = $1")
            .bind(&idle)
            .execute(&pool)
            .await
            .unwrap();

        assert!(purge_expired(&pool, 2).await.unwrap() >= 1);
        assert_eq!(load(&pool, &idle).await.unwrap(), ViewSession::default());
        assert_eq!(load(&pool, &fresh).await.unwrap(), session);
    }
}
