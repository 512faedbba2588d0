use sqlx::PgPool;

use crate::db::files;
use crate::error::AppError;

/// A post joined with its author and its first attached game record, if any.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PostRow {
    pub id: i64,
    pub title: String,
    pub body: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub author_id: i64,
    pub author_username: String,
    pub file_id: Option<i64>,
    pub file_name: Option<String>,
    pub file_contents: Option<String>,
}

/// A game record to store alongside a new post.
pub struct NewFile<'a> {
    pub file_name: &'a str,
    pub contents: &'a str,
}

const POST_QUERY: &str = r#"SELECT
    p.id,
    p.title,
    p.body,
    p.created_at,
    a.id AS author_id,
    a.username AS author_username,
    f.id AS file_id,
    f.file_name,
    f.file_contents
FROM posts p
JOIN accounts a ON p.author_id = a.id
LEFT JOIN LATERAL (
    SELECT id, file_name, file_contents FROM files
    WHERE post_id = p.id ORDER BY id LIMIT 1
) f ON TRUE"#;

pub async fn list_posts(pool: &PgPool) -> Result<Vec<PostRow>, AppError> {
    let query = format!("{POST_QUERY} ORDER BY p.created_at DESC, p.id DESC");
    sqlx::query_as::<_, PostRow>(&query)
        .fetch_all(pool)
        .await
        .map_err(AppError::Sqlx)
}

pub async fn get_post(pool: &PgPool, post_id: i64) -> Result<Option<PostRow>, AppError> {
    let query = format!("{POST_QUERY} WHERE p.id = $1");
    sqlx::query_as::<_, PostRow>(&query)
        .bind(post_id)
        .fetch_optional(pool)
        .await
        .map_err(AppError::Sqlx)
}

/// Insert the post and its file together; neither is written if either fails.
pub async fn create_post(
    pool: &PgPool,
    author_id: i64,
    title: &str,
    body: &str,
    file: Option<NewFile<'_>>,
) -> Result<(i64, Option<i64>), AppError> {
    let mut tx = pool.begin().await.map_err(AppError::Sqlx)?;

    let row: (i64,) = sqlx::query_as(
        r#"INSERT INTO posts (author_id, title, body)
           VALUES ($1, $2, $3)
           RETURNING id"#,
    )
    .bind(author_id)
    .bind(title)
    .bind(body)
    .fetch_one(&mut *tx)
    .await
    .map_err(AppError::Sqlx)?;
    let post_id = row.0;

    let file_id = match file {
        Some(file) => {
            Some(files::insert_file(&mut *tx, author_id, post_id, file.file_name, file.contents).await?)
        }
        None => None,
    };

    tx.commit().await.map_err(AppError::Sqlx)?;
    Ok((post_id, file_id))
}

pub async fn update_post(pool: &PgPool, post_id: i64, title: &str, body: &str) -> Result<(), AppError> {
    sqlx::query("UPDATE posts SET title = $2, body = $3 WHERE id = $1")
        .bind(post_id)
        .bind(title)
        .bind(body)
        .execute(pool)
        .await
        .map_err(AppError::Sqlx)?;
    Ok(())
}

/// Attached files go with the post (ON DELETE CASCADE).
pub async fn delete_post(pool: &PgPool, post_id: i64) -> Result<(), AppError> {
    sqlx::query("DELETE FROM posts WHERE id = $1")
        .bind(post_id)
        .execute(pool)
        .await
        .map_err(AppError::Sqlx)?;
    Ok(())
}
