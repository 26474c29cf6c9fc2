//! Move validation and application.
//!
//! A move attempt is checked for shape (squares, promotion piece), handed to
//! the rules engine, and only on success written back into the match state
//! together with the ply count and the clock hand-off.

use chess::{Color, Piece, Rank, Square};
use log::{debug, warn};
use std::str::FromStr;
use std::time::Instant;

use crate::error::MoveError;
use crate::game::rules::{MoveResult, Position, RulesEngine};
use crate::game::utils::color_to_string;
use crate::models::MatchState;

/// A move the engine accepted and the state now reflects.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AppliedMove {
    pub from: Square,
    pub to: Square,
    pub promotion: Option<Piece>,
    pub mover: Color,
    pub next_to_move: Color,
}

pub fn parse_square(name: &str) -> Result<Square, MoveError> {
    Square::from_str(&name.trim().to_lowercase())
        .map_err(|_| MoveError::InvalidSquare(name.to_string()))
}

/// Normalise a promotion choice such as `"q"`, `"wQ"`, `"bn"` or `"rook"`.
pub fn parse_promotion_piece(choice: &str) -> Result<Piece, MoveError> {
    let lowered = choice.trim().to_lowercase();
    let code = match lowered.as_str() {
        "queen" => "q",
        "rook" => "r",
        "bishop" => "b",
        "knight" => "n",
        other => other
            .strip_prefix('w')
            .filter(|rest| rest.len() == 1)
            .or_else(|| other.strip_prefix('b').filter(|rest| rest.len() == 1))
            .unwrap_or(other),
    };
    match code {
        "q" => Ok(Piece::Queen),
        "r" => Ok(Piece::Rook),
        "b" => Ok(Piece::Bishop),
        "n" => Ok(Piece::Knight),
        _ => Err(MoveError::InvalidPromotion(choice.to_string())),
    }
}

/// True when the piece on `from` is a pawn stepping onto its last rank,
/// straight or diagonally. Wider jumps are left for the engine to reject.
pub fn needs_promotion<R: RulesEngine>(
    engine: &R,
    position: &Position,
    from: Square,
    to: Square,
) -> bool {
    let last_rank = match engine.piece_at(position, from) {
        Some((Color::White, Piece::Pawn)) => Rank::Eighth,
        Some((Color::Black, Piece::Pawn)) => Rank::First,
        _ => return false,
    };
    let file_delta = from.get_file().to_index().abs_diff(to.get_file().to_index());
    to.get_rank() == last_rank && file_delta <= 1
}

/// Square-name form of [`needs_promotion`] for the renderer's promotion check.
pub fn is_promotion_move<R: RulesEngine>(
    engine: &R,
    position: &Position,
    from: &str,
    to: &str,
) -> bool {
    match (parse_square(from), parse_square(to)) {
        (Ok(from), Ok(to)) => needs_promotion(engine, position, from, to),
        _ => false,
    }
}

/// Promotion piece for a dropped piece. No hint, or a hint naming the pawn
/// itself, means queen.
fn promotion_from_hint(piece_hint: Option<&str>) -> Result<Piece, MoveError> {
    match piece_hint.map(str::trim) {
        None | Some("") => Ok(Piece::Queen),
        Some(hint) if matches!(hint.to_lowercase().as_str(), "p" | "wp" | "bp" | "pawn") => {
            Ok(Piece::Queen)
        }
        Some(hint) => parse_promotion_piece(hint),
    }
}

/// Handle a drag-and-drop move attempt.
pub fn attempt_move<R: RulesEngine>(
    engine: &R,
    state: &mut MatchState,
    from: &str,
    to: &str,
    piece_hint: Option<&str>,
    now: Instant,
) -> Result<AppliedMove, MoveError> {
    if state.is_game_over() {
        return Err(MoveError::GameOver);
    }
    let from = parse_square(from)?;
    let to = parse_square(to)?;

    let promotion = if needs_promotion(engine, &state.position, from, to) {
        Some(promotion_from_hint(piece_hint)?)
    } else {
        None
    };
    apply(engine, state, from, to, promotion, now)
}

/// Handle the piece picked in the promotion dialog. Unlike a plain drop,
/// the piece is mandatory here.
pub fn submit_promotion<R: RulesEngine>(
    engine: &R,
    state: &mut MatchState,
    piece: Option<&str>,
    from: &str,
    to: &str,
    now: Instant,
) -> Result<AppliedMove, MoveError> {
    if state.is_game_over() {
        return Err(MoveError::GameOver);
    }
    let piece = piece.ok_or_else(|| MoveError::InvalidPromotion(String::new()))?;
    let promotion = parse_promotion_piece(piece)?;
    let from = parse_square(from)?;
    let to = parse_square(to)?;
    apply(engine, state, from, to, Some(promotion), now)
}

fn apply<R: RulesEngine>(
    engine: &R,
    state: &mut MatchState,
    from: Square,
    to: Square,
    promotion: Option<Piece>,
    now: Instant,
) -> Result<AppliedMove, MoveError> {
    let mover = engine.side_to_move(&state.position);
    let next = match engine.apply_move(&state.position, from, to, promotion) {
        MoveResult::Applied(next) => next,
        MoveResult::Illegal => {
            warn!("Illegal move {}{} by {}", from, to, color_to_string(mover));
            return Err(MoveError::IllegalMove);
        }
    };

    let next_to_move = engine.side_to_move(&next);
    state.position = next;
    state.clear_highlights();
    state.clock.record_ply(mover);
    state.clock.hand_off(next_to_move, now);
    debug!("Applied {}{} by {}", from, to, color_to_string(mover));

    Ok(AppliedMove {
        from,
        to,
        promotion,
        mover,
        next_to_move,
    })
}
