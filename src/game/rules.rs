//! The rules-engine oracle.
//!
//! The match logic never decides legality itself. It asks a [`RulesEngine`]
//! and switches on the returned [`MoveResult`]. [`ChessRules`] is the
//! production engine, backed by the `chess` crate.

use chess::{Board, BoardStatus, ChessMove, Color, MoveGen, Piece, Square};
use std::fmt;
use std::str::FromStr;

use crate::error::PositionError;
use crate::game::utils::has_insufficient_material;

pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Halfmoves without a capture or pawn move after which the game is drawn.
const FIFTY_MOVE_HALFMOVES: u32 = 100;

/// An immutable snapshot of the game: board, side to move, castling and en
/// passant rights, the move counters and the positions seen since the last
/// irreversible move (for repetition draws).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Position {
    board: Board,
    halfmove_clock: u32,
    fullmove_number: u32,
    repetitions: Vec<u64>,
}

impl Position {
    pub fn side_to_move(&self) -> Color {
        self.board.side_to_move()
    }

    pub fn halfmove_clock(&self) -> u32 {
        self.halfmove_clock
    }

    pub fn fullmove_number(&self) -> u32 {
        self.fullmove_number
    }

    /// How many times the current position has occurred since the last
    /// capture or pawn move, counting this occurrence.
    pub fn repetition_count(&self) -> usize {
        let hash = self.board.get_hash();
        1 + self.repetitions.iter().filter(|h| **h == hash).count()
    }

    pub fn fen(&self) -> String {
        let board = self.board.to_string();
        let placement: Vec<&str> = board.split_whitespace().take(4).collect();
        format!(
            "{} {} {}",
            placement.join(" "),
            self.halfmove_clock,
            self.fullmove_number
        )
    }

    fn successor(&self, chess_move: ChessMove) -> Position {
        let irreversible = self.board.piece_on(chess_move.get_source()) == Some(Piece::Pawn)
            || self.board.piece_on(chess_move.get_dest()).is_some();

        let repetitions = if irreversible {
            Vec::new()
        } else {
            let mut seen = self.repetitions.clone();
            seen.push(self.board.get_hash());
            seen
        };

        Position {
            board: self.board.make_move_new(chess_move),
            halfmove_clock: if irreversible { 0 } else { self.halfmove_clock.saturating_add(1) },
            fullmove_number: match self.board.side_to_move() {
                Color::White => self.fullmove_number,
                Color::Black => self.fullmove_number.saturating_add(1),
            },
            repetitions,
        }
    }
}

impl Default for Position {
    fn default() -> Self {
        Position {
            board: Board::default(),
            halfmove_clock: 0,
            fullmove_number: 1,
            repetitions: Vec::new(),
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.fen())
    }
}

impl FromStr for Position {
    type Err = PositionError;

    fn from_str(fen: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = fen.split_whitespace().collect();
        if fields.len() < 4 || fields.len() > 6 {
            return Err(PositionError::InvalidFen(fen.to_string()));
        }

        let counter = |index: usize, default: u32| -> Result<u32, PositionError> {
            match fields.get(index) {
                Some(raw) => raw
                    .parse()
                    .map_err(|_| PositionError::InvalidFen(fen.to_string())),
                None => Ok(default),
            }
        };
        let halfmove_clock = counter(4, 0)?;
        let fullmove_number = counter(5, 1)?.max(1);

        let board = Board::from_str(&format!("{} 0 1", fields[..4].join(" ")))
            .map_err(|_| PositionError::InvalidFen(fen.to_string()))?;

        Ok(Position {
            board,
            halfmove_clock,
            fullmove_number,
            repetitions: Vec::new(),
        })
    }
}

/// What the oracle says about a candidate move.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MoveResult {
    Applied(Position),
    Illegal,
}

/// The external chess-rules capability the match state machine consults.
pub trait RulesEngine {
    fn new_game(&self) -> Position;

    fn load_position(&self, fen: &str) -> Result<Position, PositionError>;

    fn apply_move(
        &self,
        position: &Position,
        from: Square,
        to: Square,
        promotion: Option<Piece>,
    ) -> MoveResult;

    fn side_to_move(&self, position: &Position) -> Color {
        position.side_to_move()
    }

    fn is_checkmate(&self, position: &Position) -> bool;

    fn is_stalemate(&self, position: &Position) -> bool;

    fn is_draw(&self, position: &Position) -> bool;

    /// Legal destinations of the piece on `square`, sorted and deduplicated.
    fn legal_destinations(&self, position: &Position, square: Square) -> Vec<Square>;

    fn piece_at(&self, position: &Position, square: Square) -> Option<(Color, Piece)>;
}

/// Rules engine backed by the `chess` crate.
#[derive(Clone, Copy, Debug, Default)]
pub struct ChessRules;

impl RulesEngine for ChessRules {
    fn new_game(&self) -> Position {
        Position::default()
    }

    fn load_position(&self, fen: &str) -> Result<Position, PositionError> {
        fen.parse()
    }

    fn apply_move(
        &self,
        position: &Position,
        from: Square,
        to: Square,
        promotion: Option<Piece>,
    ) -> MoveResult {
        let chess_move = ChessMove::new(from, to, promotion);
        if position.board.legal(chess_move) {
            MoveResult::Applied(position.successor(chess_move))
        } else {
            MoveResult::Illegal
        }
    }

    fn is_checkmate(&self, position: &Position) -> bool {
        position.board.status() == BoardStatus::Checkmate
    }

    fn is_stalemate(&self, position: &Position) -> bool {
        position.board.status() == BoardStatus::Stalemate
    }

    fn is_draw(&self, position: &Position) -> bool {
        self.is_stalemate(position)
            || position.halfmove_clock >= FIFTY_MOVE_HALFMOVES
            || position.repetition_count() >= 3
            || has_insufficient_material(&position.board)
    }

    fn legal_destinations(&self, position: &Position, square: Square) -> Vec<Square> {
        let mut destinations: Vec<Square> = MoveGen::new_legal(&position.board)
            .filter(|chess_move| chess_move.get_source() == square)
            .map(|chess_move| chess_move.get_dest())
            .collect();
        destinations.sort_by_key(|square| square.to_index());
        destinations.dedup();
        destinations
    }

    fn piece_at(&self, position: &Position, square: Square) -> Option<(Color, Piece)> {
        let piece = position.board.piece_on(square)?;
        let color = position.board.color_on(square)?;
        Some((color, piece))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(name: &str) -> Square {
        Square::from_str(name).expect("valid square")
    }

    fn play(rules: &ChessRules, mut position: Position, moves: &[(&str, &str)]) -> Position {
        for (from, to) in moves {
            position = match rules.apply_move(&position, sq(from), sq(to), None) {
                MoveResult::Applied(next) => next,
                MoveResult::Illegal => panic!("{}{} should be legal", from, to),
            };
        }
        position
    }

    #[test]
    fn new_game_matches_start_fen() {
        let rules = ChessRules;
        assert_eq!(rules.new_game().fen(), START_FEN);
        assert_eq!(rules.load_position(START_FEN), Ok(rules.new_game()));
    }

    #[test]
    fn counters_follow_the_moves() {
        let rules = ChessRules;
        let position = play(&rules, rules.new_game(), &[("g1", "f3"), ("g8", "f6"), ("b1", "c3")]);
        assert_eq!(position.halfmove_clock(), 3);
        assert_eq!(position.fullmove_number(), 2);
        assert_eq!(position.side_to_move(), Color::Black);

        let position = play(&rules, position, &[("e7", "e5")]);
        assert_eq!(position.halfmove_clock(), 0);
        assert_eq!(position.fullmove_number(), 3);
        assert!(position.fen().ends_with(" 0 3"));
    }

    #[test]
    fn counters_saturate_instead_of_overflowing() {
        let rules = ChessRules;
        let position = rules
            .load_position("4k3/8/8/8/8/8/8/R3K3 b - - 4294967295 4294967295")
            .expect("valid FEN");
        let position = play(&rules, position, &[("e8", "d8")]);
        assert_eq!(position.halfmove_clock(), u32::MAX);
        assert_eq!(position.fullmove_number(), u32::MAX);
    }

    #[test]
    fn illegal_move_is_reported_not_raised() {
        let rules = ChessRules;
        let start = rules.new_game();
        assert_eq!(rules.apply_move(&start, sq("e2"), sq("e5"), None), MoveResult::Illegal);
        assert_eq!(rules.apply_move(&start, sq("e7"), sq("e5"), None), MoveResult::Illegal);
        assert_eq!(rules.apply_move(&start, sq("e4"), sq("e5"), None), MoveResult::Illegal);
    }

    #[test]
    fn malformed_fen_is_rejected() {
        let rules = ChessRules;
        assert!(rules.load_position("not a fen").is_err());
        assert!(rules.load_position("8/8/8/8 w - - 0 1").is_err());
        assert!(rules.load_position("4k3/8/8/8/8/8/8/4K3 w - - x 1").is_err());
    }

    #[test]
    fn fools_mate_is_checkmate() {
        let rules = ChessRules;
        let position = play(
            &rules,
            rules.new_game(),
            &[("f2", "f3"), ("e7", "e5"), ("g2", "g4"), ("d8", "h4")],
        );
        assert!(rules.is_checkmate(&position));
        assert!(!rules.is_stalemate(&position));
    }

    #[test]
    fn cornered_king_is_stalemate_and_draw() {
        let rules = ChessRules;
        let position = rules.load_position("k7/2Q5/1K6/8/8/8/8/8 b - - 0 1").expect("valid FEN");
        assert!(rules.is_stalemate(&position));
        assert!(!rules.is_checkmate(&position));
        assert!(rules.is_draw(&position));
    }

    #[test]
    fn fifty_move_rule_is_a_draw() {
        let rules = ChessRules;
        let position = rules
            .load_position("4k3/8/8/8/8/8/8/R3K3 w - - 100 80")
            .expect("valid FEN");
        assert!(rules.is_draw(&position));
        assert!(!rules.is_checkmate(&position));
    }

    #[test]
    fn threefold_repetition_is_a_draw() {
        let rules = ChessRules;
        let shuffle = [("g1", "f3"), ("g8", "f6"), ("f3", "g1"), ("f6", "g8")];
        let once = play(&rules, rules.new_game(), &shuffle);
        assert_eq!(once.repetition_count(), 2);
        assert!(!rules.is_draw(&once));

        let twice = play(&rules, once, &shuffle);
        assert_eq!(twice.repetition_count(), 3);
        assert!(rules.is_draw(&twice));
    }

    #[test]
    fn legal_destinations_are_deduplicated() {
        let rules = ChessRules;
        let start = rules.new_game();
        assert_eq!(rules.legal_destinations(&start, sq("g1")), vec![sq("f3"), sq("h3")]);
        assert!(rules.legal_destinations(&start, sq("e4")).is_empty());

        // Four promotion moves share one destination
        let promoting = rules.load_position("4k3/P7/8/8/8/8/8/4K3 w - - 0 1").expect("valid FEN");
        assert_eq!(rules.legal_destinations(&promoting, sq("a7")), vec![sq("a8")]);
    }

    #[test]
    fn piece_at_reports_colour_and_kind() {
        let rules = ChessRules;
        let start = rules.new_game();
        assert_eq!(rules.piece_at(&start, sq("e2")), Some((Color::White, Piece::Pawn)));
        assert_eq!(rules.piece_at(&start, sq("d8")), Some((Color::Black, Piece::Queen)));
        assert_eq!(rules.piece_at(&start, sq("e4")), None);
    }
}
