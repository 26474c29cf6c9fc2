use reqwest::StatusCode;

/// Why a move attempt or promotion selection was refused.
///
/// Every variant is recoverable: the match state is untouched when one of
/// these is returned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoveError {
    #[error("Game is already over")]
    GameOver,

    #[error("Legal move required")]
    IllegalMove,

    #[error("Legal move required")]
    InvalidPromotion(String),

    #[error("Invalid square: {0}")]
    InvalidSquare(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PositionError {
    #[error("Invalid FEN: {0}")]
    InvalidFen(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClockError {
    #[error("Time setting cannot change while the clock is running")]
    Running,
}

#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("Analysis request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Analysis service returned HTTP {0}")]
    Status(StatusCode),

    #[error("Analysis is unavailable once the game is over")]
    GameOver,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} must be a positive integer, got {value:?}")]
    InvalidNumber { name: &'static str, value: String },
}
