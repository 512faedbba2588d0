//! Main-line movetext export for game listings.

use shakmaty::Position;

use crate::move_tree::{MoveTree, PlyMove};

/// Movetext of the main line, wrapped at `columns`. Headers and variations are
/// left out; comments are kept. Ends with the result.
pub fn main_line_movetext(tree: &MoveTree, columns: usize) -> String {
    let mut words: Vec<String> = Vec::new();

    for comment in tree.root().comments() {
        words.push(format!("{{ {comment} }}"));
    }

    let mut pending_number = true;
    for id in tree.main_line().into_iter().skip(1) {
        let node = tree.node(id);
        let Some(ply_move) = node.ply_move() else {
            continue;
        };
        let parent_pos = match node.parent() {
            Some(parent) => tree.node(parent).position(),
            None => tree.start_position(),
        };

        let white_to_move = parent_pos.turn().is_white();
        let move_number = parent_pos.fullmoves().get();
        if white_to_move {
            words.push(format!("{move_number}."));
        } else if pending_number {
            words.push(format!("{move_number}..."));
        }

        words.push(match ply_move {
            PlyMove::Played { san, .. } => san.clone(),
            PlyMove::Null => "--".to_string(),
        });
        for nag in node.nags() {
            words.push(format!("${nag}"));
        }
        for comment in node.comments() {
            words.push(format!("{{ {comment} }}"));
        }
        pending_number = !node.comments().is_empty();
    }

    words.push(result_marker(tree).to_string());
    wrap(&words, columns)
}

fn result_marker(tree: &MoveTree) -> &str {
    match tree.headers().get("Result") {
        Some(result @ ("1-0" | "0-1" | "1/2-1/2" | "*")) => result,
        _ => tree.termination().unwrap_or("*"),
    }
}

fn wrap(words: &[String], columns: usize) -> String {
    let mut output = String::new();
    let mut line_len = 0;
    for word in words {
        if line_len > 0 && line_len + 1 + word.len() > columns {
            output.push('\n');
            line_len = 0;
        } else if line_len > 0 {
            output.push(' ');
            line_len += 1;
        }
        output.push_str(word);
        line_len += word.len();
    }
    output
}
