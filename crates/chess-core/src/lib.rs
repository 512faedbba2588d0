//! Game-record core: PGN parsing into a move tree, upload validation,
//! main-line navigation and board rendering.

pub mod error;
pub mod export;
pub mod game_data;
pub mod move_tree;
pub mod navigator;
pub mod pgn;
pub mod render;
pub mod validate;

pub use error::{NavigationError, PgnError, UploadRejection};
pub use game_data::GameHeaders;
pub use move_tree::{MoveTree, NodeId, PlyMove};
pub use navigator::{GameNavigator, GameView, NavCommand, ViewSession};
pub use validate::{validate_upload, UploadPolicy, ValidatedUpload};
