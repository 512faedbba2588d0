use std::sync::OnceLock;

use axum::{
    extract::{Multipart, Path},
    http::StatusCode,
    Extension, Json,
};
use chess_core::{export, pgn, render, validate_upload, PlyMove};
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::auth::middleware::{AuthUser, MaybeAuthUser};
use crate::config::Config;
use crate::db::posts::{self, NewFile, PostRow};
use crate::error::AppError;

/// Movetext column width in post listings.
const MOVETEXT_COLUMNS: usize = 40;

#[derive(Deserialize)]
pub struct UpdatePostRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: String,
}

#[derive(Serialize)]
pub struct Author {
    pub id: i64,
    pub username: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachedGame {
    pub file_id: i64,
    pub file_name: String,
    pub white: Option<String>,
    pub black: Option<String>,
    pub result: Option<String>,
    /// Final position of the main line; absent when the record no longer parses.
    pub svg: Option<String>,
    pub movetext: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostResponse {
    pub id: i64,
    pub title: String,
    pub body: String,
    pub created_at: String,
    pub author: Author,
    pub is_author: bool,
    pub game: Option<AttachedGame>,
}

fn attached_game(row: &PostRow, board_size: u32) -> Option<AttachedGame> {
    let file_id = row.file_id?;
    let mut game = AttachedGame {
        file_id,
        file_name: row.file_name.clone().unwrap_or_default(),
        white: None,
        black: None,
        result: None,
        svg: None,
        movetext: None,
    };

    match pgn::parse(row.file_contents.as_deref().unwrap_or_default()) {
        Ok(tree) => {
            let end = tree.main_line_end();
            let last_move = match end.ply_move() {
                Some(PlyMove::Played { mv, .. }) => Some(mv),
                _ => None,
            };
            game.white = Some(tree.headers().white().to_string());
            game.black = Some(tree.headers().black().to_string());
            game.result = Some(tree.headers().result().to_string());
            game.svg = Some(render::board_svg_with_last_move(end.position(), last_move, board_size));
            game.movetext = Some(export::main_line_movetext(&tree, MOVETEXT_COLUMNS));
        }
        Err(e) => tracing::warn!(file_id, "Stored game record no longer parses: {e}"),
    }

    Some(game)
}

fn to_response(row: &PostRow, viewer: Option<&AuthUser>, board_size: u32) -> PostResponse {
    PostResponse {
        id: row.id,
        title: row.title.clone(),
        body: row.body.clone(),
        created_at: row.created_at.to_rfc3339(),
        author: Author {
            id: row.author_id,
            username: row.author_username.clone(),
        },
        is_author: viewer.is_some_and(|u| u.id == row.author_id),
        game: attached_game(row, board_size),
    }
}

/// Reduce an uploaded file name to a safe ASCII form: path separators and
/// whitespace become `_`, other characters outside `[A-Za-z0-9_.-]` are
/// dropped, and leading/trailing `.`/`_` are trimmed.
pub fn secure_filename(name: &str) -> String {
    static UNSAFE: OnceLock<Regex> = OnceLock::new();
    let unsafe_chars = UNSAFE.get_or_init(|| Regex::new(r"[^A-Za-z0-9_.-]").unwrap());

    let spaced = name.replace(['/', '\\'], " ");
    let joined = spaced.split_whitespace().collect::<Vec<_>>().join("_");
    let cleaned = unsafe_chars.replace_all(&joined, "");
    cleaned.trim_matches(|c| c == '.' || c == '_').to_string()
}

/// Load a post and require `user` to be its author.
async fn owned_post(pool: &PgPool, post_id: i64, user: &AuthUser) -> Result<PostRow, AppError> {
    let post = posts::get_post(pool, post_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Post id {post_id} does not exist")))?;
    if post.author_id != user.id {
        return Err(AppError::Forbidden("Forbidden".into()));
    }
    Ok(post)
}

/// GET /api/posts
pub async fn list_posts(
    Extension(pool): Extension<PgPool>,
    Extension(config): Extension<Config>,
    MaybeAuthUser(viewer): MaybeAuthUser,
) -> Result<Json<Vec<PostResponse>>, AppError> {
    let rows = posts::list_posts(&pool).await?;
    Ok(Json(
        rows.iter()
            .map(|row| to_response(row, viewer.as_ref(), config.board_size))
            .collect(),
    ))
}

/// GET /api/posts/{id}
pub async fn get_post(
    Extension(pool): Extension<PgPool>,
    Extension(config): Extension<Config>,
    MaybeAuthUser(viewer): MaybeAuthUser,
    Path(post_id): Path<i64>,
) -> Result<Json<PostResponse>, AppError> {
    let row = posts::get_post(&pool, post_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Post id {post_id} does not exist")))?;
    Ok(Json(to_response(&row, viewer.as_ref(), config.board_size)))
}

/// POST /api/posts (multipart: title, body, optional pgn_file)
pub async fn create_post(
    Extension(pool): Extension<PgPool>,
    Extension(config): Extension<Config>,
    user: AuthUser,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<PostResponse>), AppError> {
    let mut title = String::new();
    let mut body = String::new();
    let mut upload: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("title") => title = field.text().await?,
            Some("body") => body = field.text().await?,
            Some("pgn_file") => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await?;
                // An empty file input still submits a part, with no file name.
                if !file_name.is_empty() {
                    upload = Some((file_name, bytes.to_vec()));
                }
            }
            _ => {}
        }
    }

    if title.is_empty() {
        return Err(AppError::BadRequest("Title is required".into()));
    }

    let policy = config.upload_policy();
    let validated = match &upload {
        Some((file_name, bytes)) => {
            let accepted = validate_upload(file_name, bytes, &policy).map_err(|rejection| {
                tracing::info!(account = user.id, %file_name, "Rejected upload: {rejection}");
                rejection
            })?;
            Some((secure_filename(file_name), accepted.text))
        }
        None => None,
    };

    let new_file = validated.as_ref().map(|(file_name, text)| NewFile {
        file_name,
        contents: text,
    });
    let (post_id, file_id) = posts::create_post(&pool, user.id, &title, &body, new_file).await?;
    tracing::info!(account = user.id, post_id, ?file_id, "Created post");

    let row = posts::get_post(&pool, post_id)
        .await?
        .ok_or_else(|| AppError::Internal("Failed to retrieve created post".into()))?;

    Ok((
        StatusCode::CREATED,
        Json(to_response(&row, Some(&user), config.board_size)),
    ))
}

/// PUT /api/posts/{id}
pub async fn update_post(
    Extension(pool): Extension<PgPool>,
    Extension(config): Extension<Config>,
    user: AuthUser,
    Path(post_id): Path<i64>,
    Json(req): Json<UpdatePostRequest>,
) -> Result<Json<PostResponse>, AppError> {
    owned_post(&pool, post_id, &user).await?;
    if req.title.is_empty() {
        return Err(AppError::BadRequest("Title is required".into()));
    }

    posts::update_post(&pool, post_id, &req.title, &req.body).await?;

    let row = posts::get_post(&pool, post_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Post id {post_id} does not exist")))?;
    Ok(Json(to_response(&row, Some(&user), config.board_size)))
}

/// DELETE /api/posts/{id}
pub async fn delete_post(
    Extension(pool): Extension<PgPool>,
    user: AuthUser,
    Path(post_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    owned_post(&pool, post_id, &user).await?;
    posts::delete_post(&pool, post_id).await?;
    tracing::info!(account = user.id, post_id, "Deleted post");
    Ok(StatusCode::NO_CONTENT)
}
