use axum::{extract::Path, Extension, Json};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::auth::{middleware::AdminUser, roles::Role};
use crate::db::{accounts, settings};
use crate::error::AppError;
use crate::routes::auth::UserResponse;

#[derive(Serialize)]
pub struct ConfigResponse {
    pub registration_enabled: bool,
    pub create_first_user_as_admin: bool,
}

#[derive(Deserialize)]
pub struct ConfigUpdate {
    pub registration_enabled: bool,
}

#[derive(Deserialize)]
pub struct AccountUpdate {
    pub role: Option<Role>,
    pub active: Option<bool>,
}

async fn current_config(pool: &PgPool) -> Result<ConfigResponse, AppError> {
    Ok(ConfigResponse {
        registration_enabled: settings::get_flag(pool, settings::REGISTRATION_ENABLED).await?,
        create_first_user_as_admin: settings::get_flag(pool, settings::CREATE_FIRST_USER_AS_ADMIN)
            .await?,
    })
}

/// GET /api/admin/config
pub async fn get_config(
    Extension(pool): Extension<PgPool>,
    _admin: AdminUser,
) -> Result<Json<ConfigResponse>, AppError> {
    Ok(Json(current_config(&pool).await?))
}

/// PUT /api/admin/config
pub async fn update_config(
    Extension(pool): Extension<PgPool>,
    AdminUser(admin): AdminUser,
    Json(req): Json<ConfigUpdate>,
) -> Result<Json<ConfigResponse>, AppError> {
    settings::set_flag(&pool, settings::REGISTRATION_ENABLED, req.registration_enabled).await?;
    tracing::info!(
        admin = admin.id,
        registration_enabled = req.registration_enabled,
        "Updated app settings"
    );
    Ok(Json(current_config(&pool).await?))
}

/// GET /api/admin/accounts
pub async fn list_accounts(
    Extension(pool): Extension<PgPool>,
    _admin: AdminUser,
) -> Result<Json<Vec<UserResponse>>, AppError> {
    let list = accounts::list_accounts(&pool).await?;
    Ok(Json(list.iter().map(UserResponse::from).collect()))
}

/// PUT /api/admin/accounts/{id}
pub async fn update_account(
    Extension(pool): Extension<PgPool>,
    AdminUser(admin): AdminUser,
    Path(account_id): Path<i64>,
    Json(req): Json<AccountUpdate>,
) -> Result<Json<UserResponse>, AppError> {
    if account_id == admin.id && (req.active == Some(false) || req.role.is_some_and(|r| r != Role::Admin)) {
        return Err(AppError::BadRequest("Admins cannot demote or deactivate themselves".into()));
    }

    let account = accounts::update_account(&pool, account_id, req.role, req.active)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Account id {account_id} does not exist")))?;

    tracing::info!(admin = admin.id, account = account_id, "Updated account");
    Ok(Json(UserResponse::from(&account)))
}
