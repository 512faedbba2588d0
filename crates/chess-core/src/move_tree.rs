//! Arena-backed move tree for a single game.
//!
//! Nodes live in one `Vec` and refer to each other by index. The first child
//! of a node is its main-line continuation; later children are variations.

use shakmaty::{fen::Fen, Chess, EnPassantMode, Move, Position};

use crate::game_data::GameHeaders;

/// FEN of a position, used for display and for comparing positions.
pub fn fen(pos: &Chess) -> String {
    Fen::from_position(pos, EnPassantMode::Legal).to_string()
}

/// Index of a node inside a [`MoveTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

impl NodeId {
    pub const ROOT: NodeId = NodeId(0);

    pub fn index(self) -> usize {
        self.0
    }
}

/// The move that leads into a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlyMove {
    Played { mv: Move, san: String },
    /// `--` in movetext: the side to move passes.
    Null,
}

impl PlyMove {
    pub fn is_null(&self) -> bool {
        matches!(self, PlyMove::Null)
    }

    pub fn san(&self) -> &str {
        match self {
            PlyMove::Played { san, .. } => san,
            PlyMove::Null => "--",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    ply_move: Option<PlyMove>,
    position: Chess,
    ply: u32,
    comments: Vec<String>,
    nags: Vec<u8>,
}

impl Node {
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// `None` only for the root.
    pub fn ply_move(&self) -> Option<&PlyMove> {
        self.ply_move.as_ref()
    }

    pub fn position(&self) -> &Chess {
        &self.position
    }

    /// Number of half-moves from the start of the game.
    pub fn ply(&self) -> u32 {
        self.ply
    }

    pub fn comments(&self) -> &[String] {
        &self.comments
    }

    pub fn nags(&self) -> &[u8] {
        &self.nags
    }
}

#[derive(Debug, Clone)]
pub struct MoveTree {
    nodes: Vec<Node>,
    headers: GameHeaders,
    termination: Option<String>,
    errors: Vec<String>,
    skipped: Vec<String>,
}

impl MoveTree {
    pub fn new(start: Chess, headers: GameHeaders) -> Self {
        let root = Node {
            parent: None,
            children: Vec::new(),
            ply_move: None,
            position: start,
            ply: 0,
            comments: Vec::new(),
            nags: Vec::new(),
        };
        Self {
            nodes: vec![root],
            headers,
            termination: None,
            errors: Vec::new(),
            skipped: Vec::new(),
        }
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn root(&self) -> &Node {
        &self.nodes[0]
    }

    pub fn start_position(&self) -> &Chess {
        &self.nodes[0].position
    }

    pub fn headers(&self) -> &GameHeaders {
        &self.headers
    }

    /// Structural errors reported while parsing (illegal moves, bad tags).
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// Tokens that were not recognised and were dropped without error.
    pub fn skipped(&self) -> &[String] {
        &self.skipped
    }

    /// Result token that closed the movetext, if one was read.
    pub fn termination(&self) -> Option<&str> {
        self.termination.as_deref()
    }

    /// Appends `ply_move` as the newest child of `parent`. The first child
    /// added to a node becomes its main-line continuation.
    pub fn add_child(&mut self, parent: NodeId, ply_move: PlyMove, position: Chess) -> NodeId {
        let id = NodeId(self.nodes.len());
        let ply = self.nodes[parent.0].ply + 1;
        self.nodes.push(Node {
            parent: Some(parent),
            children: Vec::new(),
            ply_move: Some(ply_move),
            position,
            ply,
            comments: Vec::new(),
            nags: Vec::new(),
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    pub fn push_comment(&mut self, id: NodeId, comment: String) {
        self.nodes[id.0].comments.push(comment);
    }

    pub fn push_nag(&mut self, id: NodeId, nag: u8) {
        self.nodes[id.0].nags.push(nag);
    }

    pub(crate) fn push_error(&mut self, error: String) {
        self.errors.push(error);
    }

    pub(crate) fn push_skipped(&mut self, token: String) {
        self.skipped.push(token);
    }

    pub(crate) fn set_termination(&mut self, result: String) {
        self.termination = Some(result);
    }

    /// Node ids along the main line, root first.
    pub fn main_line(&self) -> Vec<NodeId> {
        let mut line = vec![NodeId::ROOT];
        let mut current = NodeId::ROOT;
        while let Some(&next) = self.nodes[current.0].children.first() {
            line.push(next);
            current = next;
        }
        line
    }

    /// Number of plies on the main line.
    pub fn main_line_len(&self) -> u32 {
        (self.main_line().len() - 1) as u32
    }

    /// Main-line node at `ply`, or `None` past the end.
    pub fn main_line_node(&self, ply: u32) -> Option<NodeId> {
        let mut current = NodeId::ROOT;
        for _ in 0..ply {
            current = *self.nodes[current.0].children.first()?;
        }
        Some(current)
    }

    /// Last node of the main line; the root for a game without moves.
    pub fn main_line_end(&self) -> &Node {
        let mut current = NodeId::ROOT;
        while let Some(&next) = self.nodes[current.0].children.first() {
            current = next;
        }
        &self.nodes[current.0]
    }

    pub fn first_move(&self) -> Option<&PlyMove> {
        let first = self.nodes[0].children.first()?;
        self.nodes[first.0].ply_move.as_ref()
    }

    pub fn main_line_sans(&self) -> Vec<String> {
        self.main_line()
            .into_iter()
            .skip(1)
            .filter_map(|id| self.nodes[id.0].ply_move.as_ref())
            .map(|m| m.san().to_string())
            .collect()
    }

    /// Recomputes the position at `ply` by playing the stored main-line moves
    /// from the start position, ignoring the cached per-node positions.
    pub fn replay_main_line(&self, ply: u32) -> Option<Chess> {
        let mut pos = self.start_position().clone();
        for id in self.main_line().into_iter().skip(1).take(ply as usize) {
            match self.nodes[id.0].ply_move.as_ref()? {
                PlyMove::Played { mv, .. } => pos.play_unchecked(*mv),
                PlyMove::Null => pos = pos.swap_turn().ok()?,
            }
        }
        if self.main_line_len() < ply {
            return None;
        }
        Some(pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shakmaty::san::San;

    fn play(tree: &mut MoveTree, parent: NodeId, san: &str) -> NodeId {
        let mut pos = tree.node(parent).position().clone();
        let mv = san.parse::<San>().unwrap().to_move(&pos).unwrap();
        pos.play_unchecked(mv);
        tree.add_child(
            parent,
            PlyMove::Played { mv, san: san.to_string() },
            pos,
        )
    }

    #[test]
    fn test_main_line_follows_first_child() {
        let mut tree = MoveTree::new(Chess::default(), GameHeaders::default());
        let e4 = play(&mut tree, NodeId::ROOT, "e4");
        let _d4 = play(&mut tree, NodeId::ROOT, "d4");
        let e5 = play(&mut tree, e4, "e5");

        assert_eq!(tree.main_line(), vec![NodeId::ROOT, e4, e5]);
        assert_eq!(tree.main_line_len(), 2);
        assert_eq!(tree.node(e5).parent(), Some(e4));
        assert_eq!(tree.node(e5).ply(), 2);
        assert_eq!(tree.main_line_sans(), vec!["e4", "e5"]);
        assert_eq!(tree.main_line_end().ply(), 2);
    }

    #[test]
    fn test_replay_matches_cached_positions() {
        let mut tree = MoveTree::new(Chess::default(), GameHeaders::default());
        let a = play(&mut tree, NodeId::ROOT, "Nf3");
        let b = play(&mut tree, a, "d5");
        let c = play(&mut tree, b, "g3");

        for (ply, id) in [NodeId::ROOT, a, b, c].into_iter().enumerate() {
            let replayed = tree.replay_main_line(ply as u32).unwrap();
            assert_eq!(fen(&replayed), fen(tree.node(id).position()));
        }
        assert!(tree.replay_main_line(4).is_none());
    }

    #[test]
    fn test_main_line_node_past_end() {
        let tree = MoveTree::new(Chess::default(), GameHeaders::default());
        assert_eq!(tree.main_line_node(0), Some(NodeId::ROOT));
        assert_eq!(tree.main_line_node(1), None);
        assert!(tree.first_move().is_none());
        assert_eq!(tree.main_line_end().ply(), 0);
    }
}
