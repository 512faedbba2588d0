use sqlx::{PgConnection, PgPool};

use crate::error::AppError;

/// Raw text of the stored game record with this id.
pub async fn get_file_text(pool: &PgPool, game_id: i64) -> Result<Option<String>, AppError> {
    let row: Option<(String,)> = sqlx::query_as("SELECT file_contents FROM files WHERE id = $1")
        .bind(game_id)
        .fetch_optional(pool)
        .await
        .map_err(AppError::Sqlx)?;
    Ok(row.map(|r| r.0))
}

pub async fn insert_file(
    conn: &mut PgConnection,
    uploader_id: i64,
    post_id: i64,
    file_name: &str,
    file_contents: &str,
) -> Result<i64, AppError> {
    let row: (i64,) = sqlx::query_as(
        r#"INSERT INTO files (uploader_id, post_id, file_name, file_contents)
           VALUES ($1, $2, $3, $4)
           RETURNING id"#,
    )
    .bind(uploader_id)
    .bind(post_id)
    .bind(file_name)
    .bind(file_contents)
    .fetch_one(&mut *conn)
    .await
    .map_err(AppError::Sqlx)?;

    Ok(row.0)
}
