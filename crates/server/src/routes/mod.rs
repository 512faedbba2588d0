pub mod admin;
pub mod auth;
pub mod games;
pub mod health;
pub mod posts;

use crate::error::AppError;

/// Fallback for unmatched paths, e.g. `/api/games/` without an id.
pub async fn not_found() -> AppError {
    AppError::NotFound("Not Found".into())
}
