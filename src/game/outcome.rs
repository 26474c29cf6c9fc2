use chess::Color;
use serde::Serialize;

use crate::game::rules::{Position, RulesEngine};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeKind {
    Checkmate,
    Stalemate,
    Draw,
    Timeout,
}

impl OutcomeKind {
    pub fn reason(self) -> &'static str {
        match self {
            OutcomeKind::Checkmate => "Checkmate",
            OutcomeKind::Stalemate => "Stalemate",
            OutcomeKind::Draw => "Draw",
            OutcomeKind::Timeout => "Time Out",
        }
    }
}

/// The terminal result of a match. Only checkmate and timeout carry a winner.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GameOver {
    kind: OutcomeKind,
    winner: Option<Color>,
}

impl GameOver {
    pub fn checkmate(winner: Color) -> Self {
        GameOver {
            kind: OutcomeKind::Checkmate,
            winner: Some(winner),
        }
    }

    pub fn stalemate() -> Self {
        GameOver {
            kind: OutcomeKind::Stalemate,
            winner: None,
        }
    }

    pub fn draw() -> Self {
        GameOver {
            kind: OutcomeKind::Draw,
            winner: None,
        }
    }

    /// `flagged` ran out of time; the other side wins.
    pub fn timeout(flagged: Color) -> Self {
        GameOver {
            kind: OutcomeKind::Timeout,
            winner: Some(!flagged),
        }
    }

    pub fn kind(&self) -> OutcomeKind {
        self.kind
    }

    pub fn winner(&self) -> Option<Color> {
        self.winner
    }

    pub fn reason(&self) -> &'static str {
        self.kind.reason()
    }

    pub fn is_drawn(&self) -> bool {
        self.winner.is_none()
    }
}

/// Derive the terminal outcome for `position`, if any.
///
/// Board conditions win over a pending timeout: checkmate, then stalemate,
/// then any other draw the engine reports, and only then `timed_out`.
pub fn classify<R: RulesEngine>(
    engine: &R,
    position: &Position,
    timed_out: Option<Color>,
) -> Option<GameOver> {
    if engine.is_checkmate(position) {
        // The side to move is mated, so the side that just moved wins.
        Some(GameOver::checkmate(!engine.side_to_move(position)))
    } else if engine.is_stalemate(position) {
        Some(GameOver::stalemate())
    } else if engine.is_draw(position) {
        Some(GameOver::draw())
    } else {
        timed_out.map(GameOver::timeout)
    }
}

/// Store `outcome` unless one is already recorded. Returns whether it was stored.
pub fn record(slot: &mut Option<GameOver>, outcome: GameOver) -> bool {
    if slot.is_some() {
        return false;
    }
    *slot = Some(outcome);
    true
}
