//! Cursor navigation over the main line of a stored game.
//!
//! The cursor lives in a [`ViewSession`] owned by the caller (one per viewer
//! session). The stored text is re-parsed on every step; only the game id, the
//! ply and the raw text are kept between requests.

use serde::{Deserialize, Serialize};
use shakmaty::Chess;

use crate::error::NavigationError;
use crate::move_tree::{fen, MoveTree, NodeId, PlyMove};
use crate::pgn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NavCommand {
    Next,
    Prev,
    First,
    Last,
}

impl NavCommand {
    /// Accepts `next`/`nextMove`, `prev`/`prevMove`, `first`/`firstMove` and
    /// `last`/`lastMove`, ignoring case. Anything else is `None`.
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_ascii_lowercase().as_str() {
            "next" | "nextmove" => Some(NavCommand::Next),
            "prev" | "prevmove" | "previous" => Some(NavCommand::Prev),
            "first" | "firstmove" => Some(NavCommand::First),
            "last" | "lastmove" => Some(NavCommand::Last),
            _ => None,
        }
    }

    /// The ply after applying this command at `ply` in a line of `total` plies.
    pub fn apply(self, ply: u32, total: u32) -> u32 {
        match self {
            NavCommand::Next if ply < total => ply + 1,
            NavCommand::Prev if ply > 0 => ply - 1,
            NavCommand::First => 0,
            NavCommand::Last => total,
            _ => ply,
        }
    }
}

/// Per-session navigation state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewSession {
    pub tracked_game_id: Option<i64>,
    pub ply: u32,
    pub cached_raw_text: Option<String>,
}

pub struct GameNavigator<'s> {
    session: &'s mut ViewSession,
}

impl<'s> GameNavigator<'s> {
    pub fn new(session: &'s mut ViewSession) -> Self {
        Self { session }
    }

    /// True when `game_id` is the game this session is already viewing. When
    /// it is not, the caller fetches the record and hands it to [`Self::load`].
    pub fn tracks(&self, game_id: i64) -> bool {
        self.session.tracked_game_id == Some(game_id) && self.session.cached_raw_text.is_some()
    }

    /// Start viewing `game_id` from ply 0. `raw_text` is what storage returned
    /// for it; `None` leaves the session untouched and fails with `NotFound`.
    pub fn load(&mut self, game_id: i64, raw_text: Option<String>) -> Result<(), NavigationError> {
        let text = raw_text.ok_or(NavigationError::NotFound(game_id))?;
        *self.session = ViewSession {
            tracked_game_id: Some(game_id),
            ply: 0,
            cached_raw_text: Some(text),
        };
        Ok(())
    }

    /// Apply `command` (if any) to the tracked game and return the resulting view.
    pub fn navigate(&mut self, command: Option<NavCommand>) -> Result<GameView, NavigationError> {
        let game_id = self
            .session
            .tracked_game_id
            .ok_or(NavigationError::NotViewing)?;
        let text = self
            .session
            .cached_raw_text
            .as_deref()
            .ok_or(NavigationError::NotFound(game_id))?;
        let tree = pgn::parse(text).map_err(|_| NavigationError::EmptyRecord)?;

        let total = tree.main_line_len();
        let current = self.session.ply.min(total);
        let ply = command.map_or(current, |c| c.apply(current, total));
        self.session.ply = ply;

        Ok(GameView::new(game_id, ply, tree))
    }
}

/// What a viewer sees at the cursor.
#[derive(Debug, Clone)]
pub struct GameView {
    game_id: i64,
    ply: u32,
    total_plies: u32,
    node: NodeId,
    tree: MoveTree,
}

impl GameView {
    fn new(game_id: i64, ply: u32, tree: MoveTree) -> Self {
        let total_plies = tree.main_line_len();
        let node = tree.main_line_node(ply).unwrap_or(NodeId::ROOT);
        Self {
            game_id,
            ply,
            total_plies,
            node,
            tree,
        }
    }

    pub fn game_id(&self) -> i64 {
        self.game_id
    }

    pub fn ply(&self) -> u32 {
        self.ply
    }

    pub fn total_plies(&self) -> u32 {
        self.total_plies
    }

    pub fn position(&self) -> &Chess {
        self.tree.node(self.node).position()
    }

    pub fn fen(&self) -> String {
        fen(self.position())
    }

    /// The move that produced the current position; `None` at the start.
    pub fn last_move(&self) -> Option<&PlyMove> {
        self.tree.node(self.node).ply_move()
    }

    pub fn is_start(&self) -> bool {
        self.ply == 0
    }

    pub fn is_end(&self) -> bool {
        self.ply == self.total_plies
    }

    pub fn tree(&self) -> &MoveTree {
        &self.tree
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GAME: &str = "[Event \"e\"]\n\n1. e4 e5 2. d4 Nf6 3. Nc3 Nc6 *";

    fn session_on(game_id: i64, text: &str) -> ViewSession {
        let mut session = ViewSession::default();
        GameNavigator::new(&mut session)
            .load(game_id, Some(text.to_string()))
            .unwrap();
        session
    }

    #[test]
    fn test_command_parsing() {
        assert_eq!(NavCommand::parse("nextMove"), Some(NavCommand::Next));
        assert_eq!(NavCommand::parse(" PREV "), Some(NavCommand::Prev));
        assert_eq!(NavCommand::parse("firstMove"), Some(NavCommand::First));
        assert_eq!(NavCommand::parse("last"), Some(NavCommand::Last));
        assert_eq!(NavCommand::parse("nonExistentMove"), None);
    }

    #[test]
    fn test_session_serializes_for_storage() {
        let session = session_on(7, GAME);
        let json = serde_json::to_value(&session).unwrap();
        assert_eq!(json["tracked_game_id"], 7);
        assert_eq!(json["ply"], 0);
        let back: ViewSession = serde_json::from_value(json).unwrap();
        assert_eq!(back, session);
    }

    #[test]
    fn test_transitions_at_boundaries() {
        assert_eq!(NavCommand::Next.apply(6, 6), 6);
        assert_eq!(NavCommand::Prev.apply(0, 6), 0);
        assert_eq!(NavCommand::First.apply(0, 6), 0);
        assert_eq!(NavCommand::Last.apply(6, 6), 6);
        assert_eq!(NavCommand::Next.apply(2, 6), 3);
        assert_eq!(NavCommand::Prev.apply(2, 6), 1);
        assert_eq!(NavCommand::First.apply(4, 6), 0);
        assert_eq!(NavCommand::Last.apply(1, 6), 6);
    }

    #[test]
    fn test_navigate_walks_main_line() {
        let mut session = session_on(1, GAME);
        let mut nav = GameNavigator::new(&mut session);

        let view = nav.navigate(None).unwrap();
        assert_eq!(view.ply(), 0);
        assert!(view.is_start());
        assert!(view.last_move().is_none());

        let view = nav.navigate(Some(NavCommand::Next)).unwrap();
        assert_eq!(view.ply(), 1);
        assert_eq!(view.last_move().unwrap().san(), "e4");

        let view = nav.navigate(Some(NavCommand::Last)).unwrap();
        assert_eq!(view.ply(), 6);
        assert!(view.is_end());
        assert_eq!(view.last_move().unwrap().san(), "Nc6");

        let view = nav.navigate(Some(NavCommand::Next)).unwrap();
        assert_eq!(view.ply(), 6);

        let view = nav.navigate(Some(NavCommand::First)).unwrap();
        assert_eq!(view.ply(), 0);
        let view = nav.navigate(Some(NavCommand::Prev)).unwrap();
        assert_eq!(view.ply(), 0);
        assert_eq!(session.ply, 0);
    }

    #[test]
    fn test_load_resets_on_game_switch() {
        let mut session = session_on(1, GAME);
        session.ply = 5;

        let mut nav = GameNavigator::new(&mut session);
        assert!(nav.tracks(1));
        assert_eq!(nav.navigate(None).unwrap().ply(), 5);

        assert!(!nav.tracks(2));
        nav.load(2, Some("1. d4 d5 *".to_string())).unwrap();
        let view = nav.navigate(None).unwrap();
        assert_eq!(view.game_id(), 2);
        assert_eq!(view.ply(), 0);
        assert_eq!(view.total_plies(), 2);
    }

    #[test]
    fn test_missing_record_is_not_found_and_keeps_session() {
        let mut session = session_on(1, GAME);
        session.ply = 3;
        let before = session.clone();

        let err = GameNavigator::new(&mut session).load(9, None).unwrap_err();
        assert_eq!(err, NavigationError::NotFound(9));
        assert_eq!(err.to_string(), "File with game id 9 does not exist");
        assert_eq!(session, before);
    }

    #[test]
    fn test_stale_ply_is_clamped() {
        let mut session = session_on(1, GAME);
        session.ply = 40;
        let view = GameNavigator::new(&mut session).navigate(None).unwrap();
        assert_eq!(view.ply(), 6);
        assert_eq!(session.ply, 6);
    }

    #[test]
    fn test_navigate_without_game() {
        let mut session = ViewSession::default();
        let err = GameNavigator::new(&mut session).navigate(None).unwrap_err();
        assert_eq!(err, NavigationError::NotViewing);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;
        use shakmaty::{san::SanPlus, Position};

        /// Plays `choices` as indices into the legal move list and writes the
        /// result as numbered movetext.
        fn random_game(choices: &[u16]) -> (String, usize) {
            let mut pos = Chess::default();
            let mut words = Vec::new();
            let mut plies = 0;
            for choice in choices {
                let legal = pos.legal_moves();
                if legal.is_empty() {
                    break;
                }
                let mv = legal[*choice as usize % legal.len()];
                if plies % 2 == 0 {
                    words.push(format!("{}.", plies / 2 + 1));
                }
                words.push(SanPlus::from_move_and_play_unchecked(&mut pos, mv).to_string());
                plies += 1;
            }
            words.push("*".to_string());
            (words.join(" "), plies)
        }

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(64))]

            #[test]
            fn prop_random_games_parse_completely(choices in prop::collection::vec(any::<u16>(), 0..80)) {
                let (text, plies) = random_game(&choices);
                let tree = pgn::parse(&text).unwrap();
                prop_assert!(tree.errors().is_empty(), "{:?}", tree.errors());
                prop_assert!(tree.skipped().is_empty(), "{:?}", tree.skipped());
                prop_assert_eq!(tree.main_line_len() as usize, plies);
            }

            #[test]
            fn prop_stepping_to_the_end_equals_last(choices in prop::collection::vec(any::<u16>(), 0..80)) {
                let (text, _) = random_game(&choices);
                let mut stepped = session_on(1, &text);
                let mut nav = GameNavigator::new(&mut stepped);
                let mut view = nav.navigate(None).unwrap();
                for _ in 0..view.total_plies() {
                    view = nav.navigate(Some(NavCommand::Next)).unwrap();
                }

                let mut jumped = session_on(1, &text);
                let last = GameNavigator::new(&mut jumped)
                    .navigate(Some(NavCommand::Last))
                    .unwrap();
                prop_assert_eq!(view.ply(), last.ply());
                prop_assert_eq!(view.fen(), last.fen());
                prop_assert!(view.is_end());
            }

            #[test]
            fn prop_first_then_steps_matches_replay(
                choices in prop::collection::vec(any::<u16>(), 0..80),
                target in any::<prop::sample::Index>(),
            ) {
                let (text, plies) = random_game(&choices);
                let tree = pgn::parse(&text).unwrap();
                let p = target.index(plies + 1) as u32;

                let mut session = session_on(1, &text);
                session.ply = tree.main_line_len();
                let mut nav = GameNavigator::new(&mut session);
                let mut view = nav.navigate(Some(NavCommand::First)).unwrap();
                for _ in 0..p {
                    view = nav.navigate(Some(NavCommand::Next)).unwrap();
                }
                prop_assert_eq!(view.ply(), p);
                prop_assert_eq!(view.fen(), fen(&tree.replay_main_line(p).unwrap()));
            }

            #[test]
            fn prop_reparse_is_deterministic(choices in prop::collection::vec(any::<u16>(), 0..80)) {
                let (text, _) = random_game(&choices);
                let a = pgn::parse(&text).unwrap();
                let b = pgn::parse(&text).unwrap();
                prop_assert_eq!(a.main_line_sans(), b.main_line_sans());
                for ply in 0..=a.main_line_len() {
                    prop_assert_eq!(
                        fen(&a.replay_main_line(ply).unwrap()),
                        fen(&b.replay_main_line(ply).unwrap())
                    );
                }
            }
        }
    }
}
