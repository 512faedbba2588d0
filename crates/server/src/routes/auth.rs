use axum::{http::StatusCode, Extension, Json};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::auth::{jwt, middleware::AuthUser, password, roles::Role};
use crate::config::Config;
use crate::db::{accounts, settings};
use crate::error::AppError;

#[derive(Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub role: Role,
    pub active: bool,
    pub created_at: String,
}

#[derive(Serialize)]
pub struct AuthResponse {
    pub user: UserResponse,
    pub token: String,
}

impl From<&accounts::Account> for UserResponse {
    fn from(a: &accounts::Account) -> Self {
        UserResponse {
            id: a.id,
            username: a.username.clone(),
            role: Role::from_i32(a.role).unwrap_or(Role::None),
            active: a.active,
            created_at: a.created_at.to_rfc3339(),
        }
    }
}

fn issue_token(account: &accounts::Account, config: &Config) -> Result<String, AppError> {
    jwt::create_token(account.id, &account.username, &config.jwt_secret, config.jwt_expire_hours)
        .map_err(|e| AppError::Internal(format!("Token creation error: {e}")))
}

/// Claims the first-admin slot. The setting is cleared atomically, so of two
/// concurrent first registrations only one becomes admin.
async fn claim_first_admin(pool: &PgPool) -> Result<bool, AppError> {
    if !settings::take_flag(pool, settings::CREATE_FIRST_USER_AS_ADMIN).await? {
        return Ok(false);
    }
    Ok(accounts::count_accounts(pool).await? == 0)
}

/// POST /api/auth/register
pub async fn register(
    Extension(pool): Extension<PgPool>,
    Extension(config): Extension<Config>,
    Json(req): Json<Credentials>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let registration_enabled = settings::get_flag(&pool, settings::REGISTRATION_ENABLED).await?;
    if !registration_enabled
        && !settings::get_flag(&pool, settings::CREATE_FIRST_USER_AS_ADMIN).await?
    {
        return Err(AppError::Forbidden("Registration is currently disabled".into()));
    }

    if req.username.is_empty() {
        return Err(AppError::BadRequest("Username is required".into()));
    }
    if req.password.is_empty() {
        return Err(AppError::BadRequest("Password is required".into()));
    }

    let as_admin = claim_first_admin(&pool).await?;
    if !as_admin && !registration_enabled {
        return Err(AppError::Forbidden("Registration is currently disabled".into()));
    }

    let hash = password::hash_password(&req.password)
        .map_err(|e| AppError::Internal(format!("Password hash error: {e}")))?;

    let role = if as_admin { Role::Admin } else { Role::User };
    let account_id = match accounts::create_account(&pool, &req.username, &hash, role).await {
        Ok(id) => id,
        Err(e) => {
            if as_admin {
                settings::set_flag(&pool, settings::CREATE_FIRST_USER_AS_ADMIN, true).await?;
            }
            return Err(e);
        }
    };

    if as_admin {
        tracing::info!(account = account_id, "Registered first account as admin");
    } else {
        tracing::info!(account = account_id, "Registered account");
    }

    let account = accounts::get_account_by_id(&pool, account_id)
        .await?
        .ok_or_else(|| AppError::Internal("Failed to retrieve created account".into()))?;

    let token = issue_token(&account, &config)?;
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            user: UserResponse::from(&account),
            token,
        }),
    ))
}

/// POST /api/auth/login
pub async fn login(
    Extension(pool): Extension<PgPool>,
    Extension(config): Extension<Config>,
    Json(req): Json<Credentials>,
) -> Result<Json<AuthResponse>, AppError> {
    let account = accounts::get_account_by_username(&pool, &req.username)
        .await?
        .ok_or(AppError::BadRequest("Invalid username".into()))?;

    let valid = password::verify_password(&req.password, &account.password_hash)
        .map_err(|e| AppError::Internal(format!("Password verify error: {e}")))?;
    if !valid {
        return Err(AppError::BadRequest("Invalid password".into()));
    }

    if !account.active {
        return Err(AppError::Forbidden("Deactivated account".into()));
    }

    let token = issue_token(&account, &config)?;
    Ok(Json(AuthResponse {
        user: UserResponse::from(&account),
        token,
    }))
}

/// GET /api/auth/me
pub async fn me(user: AuthUser) -> Json<UserResponse> {
    Json(UserResponse {
        id: user.id,
        username: user.username.clone(),
        role: user.role(),
        active: user.active,
        created_at: user.created_at.to_rfc3339(),
    })
}
