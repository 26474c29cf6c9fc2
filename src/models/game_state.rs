use chess::Square;

use crate::game::clock::ClockState;
use crate::game::outcome::GameOver;
use crate::game::rules::Position;

/// Everything one match owns. Reset as a unit, never piecemeal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MatchState {
    /// Bumped on every "play again" so late analysis results can be dropped.
    pub session_id: u64,
    pub position: Position,
    pub clock: ClockState,
    pub outcome: Option<GameOver>,
    pub selected: Option<Square>,
    pub highlights: Vec<Square>,
}

impl MatchState {
    pub fn new(position: Position, base_minutes: u32, session_id: u64) -> Self {
        MatchState {
            session_id,
            position,
            clock: ClockState::new(base_minutes),
            outcome: None,
            selected: None,
            highlights: Vec::new(),
        }
    }

    pub fn is_game_over(&self) -> bool {
        self.outcome.is_some()
    }

    pub fn clear_highlights(&mut self) {
        self.selected = None;
        self.highlights.clear();
    }
}
