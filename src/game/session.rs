//! The match session controller.
//!
//! Owns the [`MatchState`] and is the only way the outside world changes it:
//! move attempts, promotion choices, clock ticks, square selection, "play
//! again" and time-setting changes all go through here.

use chess::Color;
use log::{info, warn};
use serde::Serialize;
use std::time::Instant;

use crate::config::DEFAULT_BASE_MINUTES;
use crate::error::{ClockError, MoveError};
use crate::game::clock::{ClockPhase, Tick};
use crate::game::moves::{self, AppliedMove};
use crate::game::outcome::{self, GameOver};
use crate::game::rules::{ChessRules, RulesEngine};
use crate::game::utils::color_to_string;
use crate::models::MatchState;

/// Aggregate statistics of the current match, derived on demand.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SessionStats {
    pub total_plies: u32,
    /// Sum of both sides' clock usage.
    pub total_match_time_ms: u64,
    pub white_avg_move_secs: f64,
    pub black_avg_move_secs: f64,
}

pub struct MatchSession<R = ChessRules> {
    engine: R,
    state: MatchState,
}

impl MatchSession<ChessRules> {
    pub fn new(base_minutes: u32) -> Self {
        Self::with_engine(ChessRules, base_minutes)
    }
}

impl<R: RulesEngine> MatchSession<R> {
    pub fn with_engine(engine: R, base_minutes: u32) -> Self {
        let position = engine.new_game();
        MatchSession {
            state: MatchState::new(position, base_minutes, 0),
            engine,
        }
    }

    pub fn engine(&self) -> &R {
        &self.engine
    }

    pub fn state(&self) -> &MatchState {
        &self.state
    }

    pub fn session_id(&self) -> u64 {
        self.state.session_id
    }

    pub fn turn(&self) -> Color {
        self.engine.side_to_move(&self.state.position)
    }

    pub fn outcome(&self) -> Option<GameOver> {
        self.state.outcome
    }

    pub fn is_game_over(&self) -> bool {
        self.state.is_game_over()
    }

    /// Whether a result requested under `session_id` still belongs to the
    /// live match.
    pub fn accepts_result_for(&self, session_id: u64) -> bool {
        session_id == self.state.session_id
    }

    /// Whether the tick timer should be armed.
    pub fn clock_running(&self) -> bool {
        !self.is_game_over() && matches!(self.state.clock.phase(), ClockPhase::Running(_))
    }

    pub fn needs_promotion(&self, from: &str, to: &str) -> bool {
        moves::is_promotion_move(&self.engine, &self.state.position, from, to)
    }

    pub fn attempt_move(
        &mut self,
        from: &str,
        to: &str,
        piece_hint: Option<&str>,
    ) -> Result<AppliedMove, MoveError> {
        let applied = moves::attempt_move(
            &self.engine,
            &mut self.state,
            from,
            to,
            piece_hint,
            Instant::now(),
        )?;
        self.evaluate();
        Ok(applied)
    }

    pub fn submit_promotion(
        &mut self,
        piece: Option<&str>,
        from: &str,
        to: &str,
    ) -> Result<AppliedMove, MoveError> {
        let applied = moves::submit_promotion(
            &self.engine,
            &mut self.state,
            piece,
            from,
            to,
            Instant::now(),
        )?;
        self.evaluate();
        Ok(applied)
    }

    /// Advance the clock by one step. A flag fall records a timeout unless
    /// the match already has an outcome.
    pub fn tick(&mut self) -> Tick {
        if self.is_game_over() {
            self.state.clock.stop();
            return Tick::Skipped;
        }
        let tick = self.state.clock.tick();
        if let Tick::Flagged(side) = tick {
            self.conclude(GameOver::timeout(side));
        }
        tick
    }

    /// Select a square and highlight it together with the legal destinations
    /// of the piece on it, if that piece belongs to the side to move.
    /// Anything else clears the selection. Ignored once the game is over.
    pub fn select_square(&mut self, square: &str) -> &[chess::Square] {
        if self.is_game_over() {
            return &self.state.highlights;
        }
        self.state.clear_highlights();

        let Ok(square) = moves::parse_square(square) else {
            return &self.state.highlights;
        };
        let turn = self.turn();
        if let Some((color, _)) = self.engine.piece_at(&self.state.position, square) {
            if color == turn {
                let mut highlights = self.engine.legal_destinations(&self.state.position, square);
                if !highlights.is_empty() {
                    highlights.push(square);
                    highlights.sort_by_key(|sq| sq.to_index());
                    self.state.selected = Some(square);
                    self.state.highlights = highlights;
                }
            }
        }
        &self.state.highlights
    }

    /// Start a fresh match with the current time setting.
    pub fn play_again(&mut self) {
        let base_minutes = self.state.clock.base_minutes();
        let session_id = self.state.session_id + 1;
        self.state = MatchState::new(self.engine.new_game(), base_minutes, session_id);
        info!("New match started (session {})", session_id);
    }

    /// Change the per-side time. Non-positive or missing values fall back to
    /// the default. Refused while the clock is running.
    pub fn set_base_minutes(&mut self, minutes: Option<i64>) -> Result<u32, ClockError> {
        let minutes = minutes
            .filter(|m| *m > 0)
            .and_then(|m| u32::try_from(m).ok())
            .unwrap_or(DEFAULT_BASE_MINUTES);

        if let Err(e) = self.state.clock.set_base_minutes(minutes) {
            warn!("Ignoring time setting of {} minutes: {}", minutes, e);
            return Err(e);
        }
        info!("Time setting changed to {} minutes per side", minutes);
        Ok(minutes)
    }

    pub fn stats(&self) -> SessionStats {
        let clock = &self.state.clock;
        let average = |side: Color| -> f64 {
            match clock.move_count(side) {
                0 => 0.0,
                moves => clock.elapsed_ms(side) as f64 / 1000.0 / f64::from(moves),
            }
        };

        SessionStats {
            total_plies: clock.move_count(Color::White) + clock.move_count(Color::Black),
            total_match_time_ms: clock.elapsed_ms(Color::White) + clock.elapsed_ms(Color::Black),
            white_avg_move_secs: average(Color::White),
            black_avg_move_secs: average(Color::Black),
        }
    }

    fn evaluate(&mut self) {
        if self.is_game_over() {
            return;
        }
        let flagged = self.state.clock.flagged();
        if let Some(outcome) = outcome::classify(&self.engine, &self.state.position, flagged) {
            self.conclude(outcome);
        }
    }

    fn conclude(&mut self, game_over: GameOver) {
        if outcome::record(&mut self.state.outcome, game_over) {
            self.state.clock.stop();
            match game_over.winner() {
                Some(winner) => info!(
                    "Game over: {}, {} wins",
                    game_over.reason(),
                    color_to_string(winner)
                ),
                None => info!("Game over: {}", game_over.reason()),
            }
        }
    }
}
