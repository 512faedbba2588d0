use sqlx::PgPool;

use crate::config::Config;
use crate::error::AppError;

pub const REGISTRATION_ENABLED: &str = "registration_enabled";
pub const CREATE_FIRST_USER_AS_ADMIN: &str = "create_first_user_as_admin";

/// Insert configured defaults; values already stored win.
pub async fn seed_defaults(pool: &PgPool, config: &Config) -> Result<(), AppError> {
    for (key, enabled) in [
        (REGISTRATION_ENABLED, config.registration_enabled),
        (CREATE_FIRST_USER_AS_ADMIN, config.create_first_user_as_admin),
    ] {
        sqlx::query(
            "INSERT INTO app_settings (key, enabled) VALUES ($1, $2) ON CONFLICT (key) DO NOTHING",
        )
        .bind(key)
        .bind(enabled)
        .execute(pool)
        .await
        .map_err(AppError::Sqlx)?;
    }
    Ok(())
}

/// Missing keys read as off.
pub async fn get_flag(pool: &PgPool, key: &str) -> Result<bool, AppError> {
    let row: Option<(bool,)> = sqlx::query_as("SELECT enabled FROM app_settings WHERE key = $1")
        .bind(key)
        .fetch_optional(pool)
        .await
        .map_err(AppError::Sqlx)?;
    Ok(row.map(|r| r.0).unwrap_or(false))
}

pub async fn set_flag(pool: &PgPool, key: &str, enabled: bool) -> Result<(), AppError> {
    sqlx::query(
        r#"INSERT INTO app_settings (key, enabled) VALUES ($1, $2)
           ON CONFLICT (key) DO UPDATE SET enabled = EXCLUDED.enabled"#,
    )
    .bind(key)
    .bind(enabled)
    .execute(pool)
    .await
    .map_err(AppError::Sqlx)?;
    Ok(())
}

/// Atomically turns `key` off. True only for the one caller that saw it on.
pub async fn take_flag(pool: &PgPool, key: &str) -> Result<bool, AppError> {
    let row: Option<(String,)> = sqlx::query_as(
        "UPDATE app_settings SET enabled = FALSE WHERE key = $1 AND enabled RETURNING key",
    )
    .bind(key)
    .fetch_optional(pool)
    .await
    .map_err(AppError::Sqlx)?;
    Ok(row.is_some())
}
