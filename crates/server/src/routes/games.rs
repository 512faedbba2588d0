use axum::{
    body::Bytes,
    extract::{Path, Query},
    http::{HeaderName, HeaderValue},
    Extension, Json,
};
use chess_core::{render, GameNavigator, GameView, NavCommand, PlyMove};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::config::Config;
use crate::db::{files, sessions};
use crate::error::AppError;
use crate::session::{ViewSessionId, SESSION_HEADER};

#[derive(Deserialize, Default)]
pub struct ViewRequest {
    pub command: Option<String>,
}

#[derive(Serialize)]
pub struct HeaderTag {
    pub name: String,
    pub value: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameViewResponse {
    pub session_id: String,
    pub game_id: i64,
    pub ply: u32,
    pub total_plies: u32,
    pub fen: String,
    pub svg: String,
    pub last_move: Option<String>,
    pub moves: Vec<String>,
    pub headers: Vec<HeaderTag>,
    pub at_start: bool,
    pub at_end: bool,
}

impl GameViewResponse {
    fn new(session_id: &str, view: &GameView, board_size: u32) -> Self {
        let last_mv = match view.last_move() {
            Some(PlyMove::Played { mv, .. }) => Some(mv),
            _ => None,
        };
        GameViewResponse {
            session_id: session_id.to_string(),
            game_id: view.game_id(),
            ply: view.ply(),
            total_plies: view.total_plies(),
            fen: view.fen(),
            svg: render::board_svg_with_last_move(view.position(), last_mv, board_size),
            last_move: view.last_move().map(|m| m.san().to_string()),
            moves: view.tree().main_line_sans(),
            headers: view
                .tree()
                .headers()
                .iter()
                .map(|(name, value)| HeaderTag {
                    name: name.to_string(),
                    value: value.to_string(),
                })
                .collect(),
            at_start: view.is_start(),
            at_end: view.is_end(),
        }
    }
}

/// The body command wins over the query string. Unknown commands are no-ops.
fn resolve_command(query: ViewRequest, body: &[u8]) -> Result<Option<NavCommand>, AppError> {
    let from_body = if body.iter().all(u8::is_ascii_whitespace) {
        None
    } else {
        serde_json::from_slice::<ViewRequest>(body)
            .map_err(|e| AppError::BadRequest(format!("Invalid request body: {e}")))?
            .command
    };

    let Some(raw) = from_body.or(query.command) else {
        return Ok(None);
    };
    let command = NavCommand::parse(&raw);
    if command.is_none() {
        tracing::debug!(command = %raw, "Ignoring unknown navigation command");
    }
    Ok(command)
}

/// GET|POST /api/games/{game_id}/view
pub async fn view_game(
    Extension(pool): Extension<PgPool>,
    Extension(config): Extension<Config>,
    session_id: ViewSessionId,
    Path(game_id): Path<i64>,
    Query(query): Query<ViewRequest>,
    body: Bytes,
) -> Result<([(HeaderName, HeaderValue); 1], Json<GameViewResponse>), AppError> {
    let command = resolve_command(query, &body)?;
    if session_id.is_new() {
        tracing::debug!(session = session_id.as_str(), "Minted view session");
    }

    let mut session = sessions::load(&pool, session_id.as_str()).await?;
    let mut navigator = GameNavigator::new(&mut session);
    if !navigator.tracks(game_id) {
        let text = files::get_file_text(&pool, game_id).await?;
        navigator.load(game_id, text)?;
        tracing::debug!(game_id, session = session_id.as_str(), "Viewing game");
    }
    let view = navigator.navigate(command)?;
    sessions::save(&pool, session_id.as_str(), &session).await?;

    let header = HeaderValue::from_str(session_id.as_str())
        .map_err(|e| AppError::Internal(format!("Invalid session header: {e}")))?;
    Ok((
        [(HeaderName::from_static(SESSION_HEADER), header)],
        Json(GameViewResponse::new(session_id.as_str(), &view, config.board_size)),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(command: Option<&str>) -> ViewRequest {
        ViewRequest {
            command: command.map(str::to_string),
        }
    }

    #[test]
    fn test_resolve_command_sources() {
        assert_eq!(resolve_command(query(None), b"").unwrap(), None);
        assert_eq!(
            resolve_command(query(Some("next")), b"").unwrap(),
            Some(NavCommand::Next)
        );
        assert_eq!(
            resolve_command(query(Some("next")), br#"{"command":"lastMove"}"#).unwrap(),
            Some(NavCommand::Last)
        );
        assert_eq!(
            resolve_command(query(None), br#"{"command":"nonExistentMove"}"#).unwrap(),
            None
        );
        assert!(resolve_command(query(None), b"not json").is_err());
    }
}
