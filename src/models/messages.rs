use chess::Color;
use serde::{Deserialize, Serialize};

use crate::clients::analysis::AnalysisReport;
use crate::config::TIME_SETTINGS;
use crate::game::outcome::{GameOver, OutcomeKind};
use crate::game::rules::RulesEngine;
use crate::game::session::{MatchSession, SessionStats};
use crate::game::utils::{color_to_string, format_clock, side_name};

/// How long the client should show an inline move error.
pub const ERROR_DISMISS_MS: u64 = 3000;

/// Message sent from client to server
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ClientMessage {
    pub message_type: String,
    pub from: Option<String>,
    pub to: Option<String>,
    pub piece: Option<String>,
    pub square: Option<String>,
    pub minutes: Option<serde_json::Value>,
}

impl ClientMessage {
    /// The requested time setting, accepting whole numbers or numeric
    /// strings. Fractional minutes are not a valid setting and read as absent,
    /// so the session falls back to its default.
    pub fn minutes(&self) -> Option<i64> {
        match self.minutes.as_ref()? {
            serde_json::Value::Number(n) => n.as_i64().or_else(|| {
                n.as_f64()
                    .filter(|f| f.fract() == 0.0 && f.abs() <= i64::MAX as f64)
                    .map(|f| f as i64)
            }),
            serde_json::Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

/// Position plus interaction hints for the board renderer.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct BoardView {
    pub fen: String,
    pub orientation: String,
    pub highlighted: Vec<String>,
    pub selected: Option<String>,
    pub interaction_enabled: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ClockView {
    pub white_ms: u64,
    pub black_ms: u64,
    pub white_display: String,
    pub black_display: String,
    pub active_side: Option<String>,
    pub running: bool,
    pub base_minutes: u32,
    pub time_settings: Vec<u32>,
    pub selector_enabled: bool,
}

/// What the game-over modal shows.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct GameOverSummary {
    pub kind: OutcomeKind,
    pub winner: Option<String>,
    pub reason: String,
    pub headline: String,
}

impl From<GameOver> for GameOverSummary {
    fn from(game_over: GameOver) -> Self {
        let headline = match game_over.winner() {
            Some(winner) => format!("Winner: {}", side_name(winner)),
            None => format!("Game Over: Draw ({})", game_over.reason()),
        };
        GameOverSummary {
            kind: game_over.kind(),
            winner: game_over.winner().map(color_to_string),
            reason: game_over.reason().to_string(),
            headline,
        }
    }
}

/// Message sent from server to client
#[derive(Serialize, Debug, Clone, Default)]
pub struct ServerMessage {
    pub message_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub turn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub board: Option<BoardView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clock: Option<ClockView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<SessionStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game_over: Option<GameOverSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<AnalysisReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dismiss_after_ms: Option<u64>,
}

impl ServerMessage {
    /// Full snapshot of the match for the board, clocks, stats and modal.
    pub fn state<R: RulesEngine>(session: &MatchSession<R>) -> Self {
        let state = session.state();
        let clock = &state.clock;
        let turn = session.turn();

        ServerMessage {
            message_type: "state".to_string(),
            session_id: Some(state.session_id),
            turn: Some(color_to_string(turn)),
            board: Some(BoardView {
                fen: state.position.fen(),
                orientation: color_to_string(turn),
                highlighted: state.highlights.iter().map(|sq| sq.to_string()).collect(),
                selected: state.selected.map(|sq| sq.to_string()),
                interaction_enabled: !state.is_game_over(),
            }),
            clock: Some(ClockView {
                white_ms: clock.remaining_ms(Color::White),
                black_ms: clock.remaining_ms(Color::Black),
                white_display: format_clock(clock.remaining_ms(Color::White)),
                black_display: format_clock(clock.remaining_ms(Color::Black)),
                active_side: clock.active_side().map(color_to_string),
                running: clock.is_running(),
                base_minutes: clock.base_minutes(),
                time_settings: TIME_SETTINGS.to_vec(),
                selector_enabled: !clock.is_running(),
            }),
            stats: Some(session.stats()),
            game_over: state.outcome.map(GameOverSummary::from),
            ..Default::default()
        }
    }

    /// Transient inline error, dismissed by the client after a few seconds.
    pub fn error(message: impl Into<String>) -> Self {
        ServerMessage {
            message_type: "error".to_string(),
            error: Some(message.into()),
            dismiss_after_ms: Some(ERROR_DISMISS_MS),
            ..Default::default()
        }
    }

    pub fn promotion_check(required: bool) -> Self {
        ServerMessage {
            message_type: "promotion_check".to_string(),
            required: Some(required),
            ..Default::default()
        }
    }

    pub fn analysis(session_id: u64, report: AnalysisReport, stats: SessionStats) -> Self {
        ServerMessage {
            message_type: "analysis".to_string(),
            session_id: Some(session_id),
            analysis: Some(report),
            stats: Some(stats),
            ..Default::default()
        }
    }

    pub fn analysis_error(session_id: u64, message: impl Into<String>) -> Self {
        ServerMessage {
            message_type: "analysis_error".to_string(),
            session_id: Some(session_id),
            error: Some(message.into()),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn to_json(message: &ServerMessage) -> Value {
        serde_json::to_value(message).expect("serializable")
    }

    #[test]
    fn client_message_parses_move() {
        let msg: ClientMessage =
            serde_json::from_str(r#"{"message_type":"move","from":"e2","to":"e4","piece":"wP"}"#)
                .expect("valid message");
        assert_eq!(msg.message_type, "move");
        assert_eq!(msg.from.as_deref(), Some("e2"));
        assert_eq!(msg.piece.as_deref(), Some("wP"));
        assert_eq!(msg.minutes(), None);
    }

    #[test]
    fn minutes_accept_numbers_and_strings() {
        let numeric: ClientMessage =
            serde_json::from_value(json!({"message_type": "set_time", "minutes": 10})).expect("valid");
        assert_eq!(numeric.minutes(), Some(10));

        let text: ClientMessage =
            serde_json::from_value(json!({"message_type": "set_time", "minutes": "20"})).expect("valid");
        assert_eq!(text.minutes(), Some(20));

        let whole: ClientMessage =
            serde_json::from_value(json!({"message_type": "set_time", "minutes": 10.0})).expect("valid");
        assert_eq!(whole.minutes(), Some(10));

        let fractional: ClientMessage =
            serde_json::from_value(json!({"message_type": "set_time", "minutes": 0.5})).expect("valid");
        assert_eq!(fractional.minutes(), None);

        let junk: ClientMessage =
            serde_json::from_value(json!({"message_type": "set_time", "minutes": "soon"})).expect("valid");
        assert_eq!(junk.minutes(), None);
    }

    #[test]
    fn fresh_state_snapshot() {
        let session = MatchSession::new(5);
        let value = to_json(&ServerMessage::state(&session));

        assert_eq!(value["message_type"], "state");
        assert_eq!(value["turn"], "white");
        assert_eq!(value["board"]["orientation"], "white");
        assert_eq!(value["board"]["interaction_enabled"], true);
        assert_eq!(value["board"]["highlighted"], json!([]));
        assert_eq!(value["clock"]["white_display"], "05:00");
        assert_eq!(value["clock"]["active_side"], Value::Null);
        assert_eq!(value["clock"]["selector_enabled"], true);
        assert_eq!(value["clock"]["time_settings"], json!([5, 10, 20]));
        assert_eq!(value["stats"]["total_plies"], 0);
        assert!(value.get("game_over").is_none());
        assert!(value.get("error").is_none());
    }

    #[test]
    fn snapshot_after_move_and_selection() {
        let mut session = MatchSession::new(5);
        session.attempt_move("e2", "e4", None).expect("legal");
        session.select_square("g8");
        let value = to_json(&ServerMessage::state(&session));

        assert_eq!(value["board"]["orientation"], "black");
        assert_eq!(value["board"]["selected"], "g8");
        assert_eq!(value["board"]["highlighted"], json!(["f6", "h6", "g8"]));
        assert_eq!(value["clock"]["active_side"], "black");
        assert_eq!(value["clock"]["selector_enabled"], false);
    }

    #[test]
    fn game_over_summary_headlines() {
        let mate = GameOverSummary::from(GameOver::checkmate(Color::Black));
        assert_eq!(mate.winner.as_deref(), Some("black"));
        assert_eq!(mate.headline, "Winner: Black");
        assert_eq!(mate.reason, "Checkmate");

        let stale = GameOverSummary::from(GameOver::stalemate());
        assert_eq!(stale.winner, None);
        assert_eq!(stale.headline, "Game Over: Draw (Stalemate)");

        let flag = GameOverSummary::from(GameOver::timeout(Color::Black));
        assert_eq!(flag.headline, "Winner: White");
        assert_eq!(flag.reason, "Time Out");

        let value = serde_json::to_value(&flag).expect("serializable");
        assert_eq!(value["kind"], "timeout");
    }

    #[test]
    fn error_frames_carry_dismissal_delay() {
        let value = to_json(&ServerMessage::error("Legal move required"));
        assert_eq!(value["message_type"], "error");
        assert_eq!(value["error"], "Legal move required");
        assert_eq!(value["dismiss_after_ms"], 3000);
        assert!(value.get("board").is_none());
    }
}
