//! Lenient PGN reader for a single game.
//!
//! Movetext is walked by `pgn_reader` into a [`MoveTree`]. Before that, a
//! prescan rewrites spellings the SAN reader does not take (`0-0`, `bxa8Q`,
//! `e8=q`, `Z0`, long annotation runs) and drops words that are not moves,
//! recording them in [`MoveTree::skipped`].
//!
//! Illegal moves, malformed tags and unterminated comments are structural
//! errors: they are recorded in [`MoveTree::errors`] and, for moves, the rest
//! of the offending line is skipped. Only empty input fails outright.

use std::ops::ControlFlow;
use std::sync::OnceLock;

use pgn_reader::{Nag, RawComment, RawTag, Reader, SanPlus, Skip, Visitor};
use regex::Regex;
use shakmaty::{
    fen::Fen,
    san::{San, SanError},
    CastlingMode, Chess, Outcome, Position,
};

use crate::error::PgnError;
use crate::game_data::GameHeaders;
use crate::move_tree::{fen, MoveTree, NodeId, PlyMove};

fn tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"^\[[ \t]*[A-Za-z0-9_]+[ \t]*"(?:[^"\\\n]|\\.)*"[ \t]*\]"#).unwrap())
}

fn word_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^\s()]+").unwrap())
}

fn move_number_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d+)(\.*)(.*)$").unwrap())
}

fn promotion_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([a-h](?:[1-8]?x[a-h])?[18])=?([nbrqNBRQ])$").unwrap())
}

fn is_result(word: &str) -> bool {
    matches!(word, "1-0" | "0-1" | "1/2-1/2" | "*")
}

fn suffix_nag(suffix: &str) -> Option<u8> {
    match suffix {
        "!" => Some(1),
        "?" => Some(2),
        "!!" => Some(3),
        "??" => Some(4),
        "!?" => Some(5),
        "?!" => Some(6),
        _ => None,
    }
}

/// Rewrites one SAN body into the form `SanPlus` parses.
fn lenient_san(body: &str) -> String {
    if matches!(body, "Z0" | "0000" | "@@@@") {
        return "--".to_string();
    }
    let bare = body.trim_end_matches(['+', '#']);
    let check = &body[bare.len()..];
    match bare {
        "0-0" => return format!("O-O{check}"),
        "0-0-0" => return format!("O-O-O{check}"),
        _ => {}
    }
    match promotion_re().captures(bare) {
        Some(caps) => format!("{}={}{check}", &caps[1], caps[2].to_ascii_uppercase()),
        None => body.to_string(),
    }
}

/// Movetext ready for `pgn_reader`, plus what the prescan found on the way.
#[derive(Debug, Default)]
struct Prescan {
    text: String,
    errors: Vec<String>,
    skipped: Vec<String>,
}

impl Prescan {
    fn run(raw: &str) -> Self {
        let mut scan = Prescan {
            text: String::with_capacity(raw.len()),
            ..Prescan::default()
        };
        let bytes = raw.as_bytes();
        let line_end = |from: usize| raw[from..].find('\n').map_or(raw.len(), |n| from + n);

        let mut plain_start = 0;
        let mut i = 0;
        while i < bytes.len() {
            let at_line_start = i == 0 || bytes[i - 1] == b'\n';
            let (end, keep) = match bytes[i] {
                b'{' => match raw[i..].find('}') {
                    Some(close) => (i + close + 1, true),
                    None => {
                        scan.errors.push("unterminated comment".to_string());
                        (raw.len(), false)
                    }
                },
                b'[' => match tag_re().find(&raw[i..]) {
                    Some(tag) => (i + tag.end(), true),
                    None => {
                        let end = match raw[i..].find([']', '\n']) {
                            Some(n) if bytes[i + n] == b']' => i + n + 1,
                            Some(n) => i + n,
                            None => raw.len(),
                        };
                        scan.errors.push(format!("malformed tag: {}", raw[i..end].trim()));
                        (end, false)
                    }
                },
                b';' => (line_end(i), false),
                b'%' if at_line_start => (line_end(i), false),
                _ => {
                    i += 1;
                    continue;
                }
            };
            scan.plain(&raw[plain_start..i]);
            if keep {
                scan.text.push_str(&raw[i..end]);
            } else {
                scan.text.push(' ');
            }
            i = end;
            plain_start = end;
        }
        scan.plain(&raw[plain_start..]);
        scan
    }

    fn plain(&mut self, segment: &str) {
        let mut last = 0;
        for word in word_re().find_iter(segment) {
            self.text.push_str(&segment[last..word.start()]);
            let rewritten = self.rewrite(word.as_str());
            self.text.push_str(&rewritten);
            last = word.end();
        }
        self.text.push_str(&segment[last..]);
    }

    fn rewrite(&mut self, word: &str) -> String {
        if is_result(word) {
            return word.to_string();
        }

        let mut parts = Vec::new();
        let mut rest = word;
        if let Some(caps) = move_number_re().captures(word) {
            let dots = caps.get(2).map_or("", |m| m.as_str());
            let tail = caps.get(3).map_or("", |m| m.as_str());
            // "0-0" castling also starts with a digit
            if !dots.is_empty() || tail.is_empty() {
                parts.push(format!("{}{dots}", &caps[1]));
                rest = tail;
            }
        }

        if let Some(digits) = rest.strip_prefix('$') {
            if digits.parse::<u8>().is_ok() {
                parts.push(rest.to_string());
            } else {
                self.skipped.push(word.to_string());
            }
            return parts.join(" ");
        }

        let body = rest.trim_end_matches(['!', '?']);
        let suffix = &rest[body.len()..];
        if !body.is_empty() {
            let san = lenient_san(body);
            if SanPlus::from_ascii(san.as_bytes()).is_err() {
                self.skipped.push(word.to_string());
                return parts.join(" ");
            }
            parts.push(san);
        }
        if let Some(nag) = suffix_nag(suffix) {
            parts.push(format!("${nag}"));
        }
        parts.join(" ")
    }
}

fn start_position(headers: &GameHeaders) -> Result<Chess, String> {
    if let Some(variant) = headers.get("Variant") {
        let standard = matches!(
            variant.to_ascii_lowercase().as_str(),
            "standard" | "chess" | "normal" | "from position"
        );
        if !standard {
            return Err(format!("unsupported variant: {variant}"));
        }
    }

    let Some(fen_text) = headers.get("FEN") else {
        return Ok(Chess::default());
    };
    let parsed: Fen = fen_text
        .parse()
        .map_err(|e| format!("invalid fen header: '{fen_text}' ({e})"))?;
    parsed
        .into_position(CastlingMode::Standard)
        .map_err(|e| format!("invalid fen header: '{fen_text}' ({e})"))
}

fn play_san(pos: &Chess, san_plus: &SanPlus) -> Result<(PlyMove, Chess), String> {
    let mv = san_plus.san.to_move(pos).map_err(|e| match e {
        SanError::AmbiguousSan => format!("ambiguous san: '{san_plus}' in {}", fen(pos)),
        _ => format!("illegal san: '{san_plus}' in {}", fen(pos)),
    })?;

    let mut next = pos.clone();
    let san = SanPlus::from_move_and_play_unchecked(&mut next, mv).to_string();
    Ok((PlyMove::Played { mv, san }, next))
}

fn play_null(pos: &Chess) -> Result<(PlyMove, Chess), String> {
    if pos.is_check() {
        return Err(format!("null move while in check: {}", fen(pos)));
    }
    let next = pos
        .clone()
        .swap_turn()
        .map_err(|_| "null move leads to an invalid position".to_string())?;
    Ok((PlyMove::Null, next))
}

/// Cursor state while walking movetext.
struct GameState {
    tree: MoveTree,
    current: NodeId,
    /// Nodes to return to when the enclosing variations close.
    stack: Vec<NodeId>,
    /// Set after an error until the current line ends.
    skipping: bool,
    /// Set once the main line has read its result.
    finished: bool,
}

impl GameState {
    fn idle(&self) -> bool {
        self.skipping || self.finished
    }
}

/// Visitor that builds a [`MoveTree`] for the first game it is given.
struct MoveTreeBuilder {
    /// Errors found before movetext, moved into the tree when it is created.
    pending_errors: Vec<String>,
}

impl Visitor for MoveTreeBuilder {
    type Tags = GameHeaders;
    type Movetext = GameState;
    type Output = MoveTree;

    fn begin_tags(&mut self) -> ControlFlow<MoveTree, GameHeaders> {
        ControlFlow::Continue(GameHeaders::default())
    }

    fn tag(&mut self, headers: &mut GameHeaders, name: &[u8], value: RawTag<'_>) -> ControlFlow<MoveTree> {
        headers.insert(&String::from_utf8_lossy(name), &value.decode_utf8_lossy());
        ControlFlow::Continue(())
    }

    fn begin_movetext(&mut self, headers: GameHeaders) -> ControlFlow<MoveTree, GameState> {
        let mut errors = std::mem::take(&mut self.pending_errors);
        let start = start_position(&headers).unwrap_or_else(|e| {
            errors.push(e);
            Chess::default()
        });

        let mut tree = MoveTree::new(start, headers);
        for error in errors {
            tree.push_error(error);
        }
        ControlFlow::Continue(GameState {
            tree,
            current: NodeId::ROOT,
            stack: Vec::new(),
            skipping: false,
            finished: false,
        })
    }

    fn san(&mut self, game: &mut GameState, san_plus: SanPlus) -> ControlFlow<MoveTree> {
        if game.idle() {
            return ControlFlow::Continue(());
        }
        let pos = game.tree.node(game.current).position();
        let played = match san_plus.san {
            San::Null => play_null(pos),
            _ => play_san(pos, &san_plus),
        };
        match played {
            Ok((ply_move, next)) => game.current = game.tree.add_child(game.current, ply_move, next),
            Err(e) => {
                game.tree.push_error(e);
                game.skipping = true;
            }
        }
        ControlFlow::Continue(())
    }

    fn nag(&mut self, game: &mut GameState, nag: Nag) -> ControlFlow<MoveTree> {
        if !game.idle() {
            game.tree.push_nag(game.current, nag.0);
        }
        ControlFlow::Continue(())
    }

    fn comment(&mut self, game: &mut GameState, comment: RawComment<'_>) -> ControlFlow<MoveTree> {
        let text = String::from_utf8_lossy(comment.as_bytes()).trim().to_string();
        if !game.idle() && !text.is_empty() {
            game.tree.push_comment(game.current, text);
        }
        ControlFlow::Continue(())
    }

    fn begin_variation(&mut self, game: &mut GameState) -> ControlFlow<MoveTree, Skip> {
        if game.idle() {
            return ControlFlow::Continue(Skip(true));
        }
        match game.tree.node(game.current).parent() {
            Some(parent) => {
                game.stack.push(game.current);
                game.current = parent;
                ControlFlow::Continue(Skip(false))
            }
            None => {
                game.tree.push_error("variation before first move".to_string());
                ControlFlow::Continue(Skip(true))
            }
        }
    }

    fn end_variation(&mut self, game: &mut GameState) -> ControlFlow<MoveTree> {
        if let Some(node) = game.stack.pop() {
            game.current = node;
            game.skipping = false;
        }
        ControlFlow::Continue(())
    }

    fn outcome(&mut self, game: &mut GameState, outcome: Outcome) -> ControlFlow<MoveTree> {
        if game.stack.is_empty() && !game.finished {
            game.tree.set_termination(outcome.to_string());
            game.finished = true;
        }
        ControlFlow::Continue(())
    }

    fn end_game(&mut self, game: GameState) -> MoveTree {
        game.tree
    }
}

/// Parse a single game. Tags that appear after movetext has started belong to
/// a following game and are not read.
pub fn parse(raw_text: &str) -> Result<MoveTree, PgnError> {
    if raw_text.trim().is_empty() {
        return Err(PgnError::EmptyInput);
    }

    let prescan = Prescan::run(raw_text);
    let mut builder = MoveTreeBuilder {
        pending_errors: prescan.errors,
    };
    let mut reader = Reader::new(prescan.text.as_bytes());
    let read = reader
        .read_game(&mut builder)
        .map_err(|e| PgnError::Unreadable(e.to_string()))?;

    let mut tree = match read {
        Some(tree) => tree,
        None => {
            let mut tree = MoveTree::new(Chess::default(), GameHeaders::default());
            for error in std::mem::take(&mut builder.pending_errors) {
                tree.push_error(error);
            }
            tree
        }
    };
    for word in prescan.skipped {
        tree.push_skipped(word);
    }
    Ok(tree)
}
