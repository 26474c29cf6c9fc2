//! Per-side countdown clock.
//!
//! Nothing runs before the first move. The first successful move starts the
//! clock for the side now to move; every later move hands it to the other
//! side. Ticks are a fixed one-second step applied to the active side only.

use chess::Color;
use log::{debug, info};
use std::time::Instant;

use crate::error::ClockError;
use crate::game::utils::color_to_string;

pub const TICK_MS: u64 = 1000;

const MS_PER_MINUTE: u64 = 60 * 1000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClockPhase {
    /// No move made yet.
    Idle,
    Running(Color),
    /// Halted by game end or a flag fall; only a reset leaves this state.
    Stopped,
}

/// What one tick did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tick {
    /// The clock was not running; nothing changed.
    Skipped,
    Decremented { side: Color, remaining_ms: u64 },
    /// `side` reached zero and the clock stopped.
    Flagged(Color),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct SideClock {
    remaining_ms: u64,
    elapsed_ms: u64,
    moves: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClockState {
    base_minutes: u32,
    white: SideClock,
    black: SideClock,
    active_side: Option<Color>,
    running: bool,
    match_started_at: Option<Instant>,
}

impl ClockState {
    pub fn new(base_minutes: u32) -> Self {
        let mut clock = ClockState {
            base_minutes,
            white: SideClock::default(),
            black: SideClock::default(),
            active_side: None,
            running: false,
            match_started_at: None,
        };
        clock.reset();
        clock
    }

    pub fn base_minutes(&self) -> u32 {
        self.base_minutes
    }

    pub fn base_ms(&self) -> u64 {
        u64::from(self.base_minutes) * MS_PER_MINUTE
    }

    pub fn remaining_ms(&self, side: Color) -> u64 {
        self.side(side).remaining_ms
    }

    pub fn elapsed_ms(&self, side: Color) -> u64 {
        self.side(side).elapsed_ms
    }

    pub fn move_count(&self, side: Color) -> u32 {
        self.side(side).moves
    }

    pub fn active_side(&self) -> Option<Color> {
        self.active_side
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn match_started_at(&self) -> Option<Instant> {
        self.match_started_at
    }

    pub fn phase(&self) -> ClockPhase {
        match (self.running, self.active_side, self.match_started_at) {
            (true, Some(side), _) => ClockPhase::Running(side),
            (_, _, None) => ClockPhase::Idle,
            _ => ClockPhase::Stopped,
        }
    }

    /// The side whose time has run out, if any.
    pub fn flagged(&self) -> Option<Color> {
        if self.match_started_at.is_none() {
            None
        } else if self.white.remaining_ms == 0 {
            Some(Color::White)
        } else if self.black.remaining_ms == 0 {
            Some(Color::Black)
        } else {
            None
        }
    }

    pub fn record_ply(&mut self, mover: Color) {
        self.side_mut(mover).moves += 1;
    }

    /// Give the clock to `next` after a completed move. The first call also
    /// stamps the match start.
    pub fn hand_off(&mut self, next: Color, now: Instant) {
        if self.match_started_at.is_none() {
            self.match_started_at = Some(now);
            info!("Clock started, {} to move", color_to_string(next));
        } else {
            debug!("Clock handed off to {}", color_to_string(next));
        }
        self.active_side = Some(next);
        self.running = true;
    }

    pub fn tick(&mut self) -> Tick {
        if !self.running {
            return Tick::Skipped;
        }
        let Some(side) = self.active_side else {
            self.running = false;
            return Tick::Skipped;
        };

        let clock = self.side_mut(side);
        clock.remaining_ms = clock.remaining_ms.saturating_sub(TICK_MS);
        clock.elapsed_ms += TICK_MS;
        let remaining_ms = clock.remaining_ms;

        if remaining_ms == 0 {
            self.running = false;
            info!("{} flag fell", color_to_string(side));
            return Tick::Flagged(side);
        }
        Tick::Decremented { side, remaining_ms }
    }

    pub fn stop(&mut self) {
        if self.running {
            info!("Clock stopped");
        }
        self.running = false;
    }

    /// Back to idle with full time on both sides and every counter zeroed.
    pub fn reset(&mut self) {
        let base_ms = self.base_ms();
        self.white = SideClock {
            remaining_ms: base_ms,
            ..SideClock::default()
        };
        self.black = self.white;
        self.active_side = None;
        self.running = false;
        self.match_started_at = None;
    }

    /// Change the per-side allowance. Refused while the clock is running;
    /// otherwise the clock is reset to the new allowance.
    pub fn set_base_minutes(&mut self, minutes: u32) -> Result<(), ClockError> {
        if self.running {
            return Err(ClockError::Running);
        }
        self.base_minutes = minutes;
        self.reset();
        Ok(())
    }

    fn side(&self, side: Color) -> &SideClock {
        match side {
            Color::White => &self.white,
            Color::Black => &self.black,
        }
    }

    fn side_mut(&mut self, side: Color) -> &mut SideClock {
        match side {
            Color::White => &mut self.white,
            Color::Black => &mut self.black,
        }
    }
}
