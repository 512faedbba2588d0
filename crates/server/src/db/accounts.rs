use sqlx::PgPool;

use crate::auth::roles::Role;
use crate::error::AppError;

#[derive(Debug, Clone, sqlx::FromRow, serde::Serialize)]
pub struct Account {
    pub id: i64,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: i32,
    pub active: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

const ACCOUNT_COLUMNS: &str = "id, username, password_hash, role, active, created_at";

/// Insert a new account. A taken username is a `Conflict`.
pub async fn create_account(
    pool: &PgPool,
    username: &str,
    password_hash: &str,
    role: Role,
) -> Result<i64, AppError> {
    let result: Result<(i64,), sqlx::Error> = sqlx::query_as(
        r#"INSERT INTO accounts (username, password_hash, role)
           VALUES ($1, $2, $3)
           RETURNING id"#,
    )
    .bind(username)
    .bind(password_hash)
    .bind(role.as_i32())
    .fetch_one(pool)
    .await;

    match result {
        Ok(row) => Ok(row.0),
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(AppError::Conflict(
            format!("User {username} is already registered"),
        )),
        Err(e) => Err(AppError::Sqlx(e)),
    }
}

pub async fn count_accounts(pool: &PgPool) -> Result<i64, AppError> {
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM accounts")
        .fetch_one(pool)
        .await
        .map_err(AppError::Sqlx)?;
    Ok(row.0)
}

pub async fn get_account_by_id(pool: &PgPool, id: i64) -> Result<Option<Account>, AppError> {
    sqlx::query_as::<_, Account>(&format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(AppError::Sqlx)
}

pub async fn get_account_by_username(pool: &PgPool, username: &str) -> Result<Option<Account>, AppError> {
    sqlx::query_as::<_, Account>(&format!(
        "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE username = $1"
    ))
    .bind(username)
    .fetch_optional(pool)
    .await
    .map_err(AppError::Sqlx)
}

pub async fn list_accounts(pool: &PgPool) -> Result<Vec<Account>, AppError> {
    sqlx::query_as::<_, Account>(&format!("SELECT {ACCOUNT_COLUMNS} FROM accounts ORDER BY id"))
        .fetch_all(pool)
        .await
        .map_err(AppError::Sqlx)
}

/// Change role and/or active flag; `None` keeps the current value.
pub async fn update_account(
    pool: &PgPool,
    account_id: i64,
    role: Option<Role>,
    active: Option<bool>,
) -> Result<Option<Account>, AppError> {
    sqlx::query_as::<_, Account>(&format!(
        r#"UPDATE accounts SET
            role = COALESCE($2, role),
            active = COALESCE($3, active)
        WHERE id = $1
        RETURNING {ACCOUNT_COLUMNS}"#
    ))
    .bind(account_id)
    .bind(role.map(Role::as_i32))
    .bind(active)
    .fetch_optional(pool)
    .await
    .map_err(AppError::Sqlx)
}
