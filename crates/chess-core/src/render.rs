//! SVG board diagrams.

use std::fmt::Write;

use shakmaty::{Chess, Color, File, Move, Piece, Position, Rank, Role, Square};

const LIGHT: &str = "#f0d9b5";
const DARK: &str = "#b58863";
const HIGHLIGHT: &str = "#cdd26a";

fn glyph(piece: Piece) -> char {
    match (piece.color, piece.role) {
        (Color::White, Role::King) => '\u{2654}',
        (Color::White, Role::Queen) => '\u{2655}',
        (Color::White, Role::Rook) => '\u{2656}',
        (Color::White, Role::Bishop) => '\u{2657}',
        (Color::White, Role::Knight) => '\u{2658}',
        (Color::White, Role::Pawn) => '\u{2659}',
        (Color::Black, Role::King) => '\u{265A}',
        (Color::Black, Role::Queen) => '\u{265B}',
        (Color::Black, Role::Rook) => '\u{265C}',
        (Color::Black, Role::Bishop) => '\u{265D}',
        (Color::Black, Role::Knight) => '\u{265E}',
        (Color::Black, Role::Pawn) => '\u{265F}',
    }
}

/// Render `pos` from White's side as a `size` x `size` SVG.
pub fn board_svg(pos: &Chess, size: u32) -> String {
    board_svg_with_last_move(pos, None, size)
}

/// Like [`board_svg`], with the from/to squares of `last_move` tinted.
pub fn board_svg_with_last_move(pos: &Chess, last_move: Option<&Move>, size: u32) -> String {
    let cell = size.max(8) as f32 / 8.0;
    let highlighted: Vec<Square> = match last_move {
        Some(mv) => mv.from().into_iter().chain(Some(mv.to())).collect(),
        None => Vec::new(),
    };

    let mut output = String::new();
    let _ = write!(
        output,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"0 0 {size} {size}\" width=\"{size}\" height=\"{size}\">"
    );

    for rank in (0..8u32).rev() {
        for file in 0..8u32 {
            let sq = Square::from_coords(File::new(file), Rank::new(rank));
            let x = file as f32 * cell;
            let y = (7 - rank) as f32 * cell;
            let fill = if highlighted.contains(&sq) {
                HIGHLIGHT
            } else if (file + rank) % 2 == 0 {
                DARK
            } else {
                LIGHT
            };
            let _ = write!(
                output,
                "<rect class=\"square {sq}\" x=\"{x}\" y=\"{y}\" width=\"{cell}\" height=\"{cell}\" fill=\"{fill}\"/>"
            );
            if let Some(piece) = pos.board().piece_at(sq) {
                let _ = write!(
                    output,
                    "<text class=\"piece\" x=\"{}\" y=\"{}\" font-size=\"{}\" text-anchor=\"middle\" dominant-baseline=\"central\">{}</text>",
                    x + cell / 2.0,
                    y + cell / 2.0,
                    cell * 0.8,
                    glyph(piece)
                );
            }
        }
    }

    output.push_str("</svg>");
    output
}
