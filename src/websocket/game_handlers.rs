use actix::prelude::*;
use actix_web_actors::ws;
use log::{debug, info, warn};

use crate::clients::analysis::AnalysisReport;
use crate::error::{AnalysisError, MoveError};
use crate::game::utils::color_to_string;
use crate::models::{ClientMessage, ServerMessage};
use crate::websocket::handler::MatchSocket;

impl MatchSocket {
    pub fn handle_move(&mut self, msg: ClientMessage, ctx: &mut ws::WebsocketContext<Self>) {
        let (Some(from), Some(to)) = (msg.from.as_deref(), msg.to.as_deref()) else {
            warn!("Move requires from and to squares");
            self.send(ctx, &ServerMessage::error("Move requires from and to squares"));
            return;
        };

        let result = self.session.attempt_move(from, to, msg.piece.as_deref());
        self.after_move(result.map(|applied| applied.mover), ctx);
    }

    pub fn handle_promotion_check(&mut self, msg: ClientMessage, ctx: &mut ws::WebsocketContext<Self>) {
        let required = match (msg.from.as_deref(), msg.to.as_deref()) {
            (Some(from), Some(to)) => !self.session.is_game_over() && self.session.needs_promotion(from, to),
            _ => false,
        };
        self.send(ctx, &ServerMessage::promotion_check(required));
    }

    pub fn handle_promotion(&mut self, msg: ClientMessage, ctx: &mut ws::WebsocketContext<Self>) {
        let (Some(from), Some(to)) = (msg.from.as_deref(), msg.to.as_deref()) else {
            warn!("Promotion requires from and to squares");
            self.send(ctx, &ServerMessage::error("Promotion requires from and to squares"));
            return;
        };

        let result = self.session.submit_promotion(msg.piece.as_deref(), from, to);
        self.after_move(result.map(|applied| applied.mover), ctx);
    }

    fn after_move(&mut self, result: Result<chess::Color, MoveError>, ctx: &mut ws::WebsocketContext<Self>) {
        match result {
            Ok(mover) => {
                debug!("{} moved in session {}", color_to_string(mover), self.id);
                self.send_state(ctx);
            }
            Err(e) => {
                warn!("Move rejected for {}: {:?}", self.id, e);
                self.send(ctx, &ServerMessage::error(e.to_string()));
            }
        }
    }

    pub fn handle_select(&mut self, msg: ClientMessage, ctx: &mut ws::WebsocketContext<Self>) {
        let square = msg.square.unwrap_or_default();
        self.session.select_square(&square);
        self.send_state(ctx);
    }

    pub fn handle_set_time(&mut self, msg: ClientMessage, ctx: &mut ws::WebsocketContext<Self>) {
        match self.session.set_base_minutes(msg.minutes()) {
            Ok(_) => self.send_state(ctx),
            Err(e) => self.send(ctx, &ServerMessage::error(e.to_string())),
        }
    }

    pub fn handle_play_again(&mut self, ctx: &mut ws::WebsocketContext<Self>) {
        self.session.play_again();
        self.send_state(ctx);
    }

    /// Fetch analysis for the current position without blocking the actor.
    /// The result is tagged with the session id it was requested for.
    pub fn handle_analyze(&mut self, ctx: &mut ws::WebsocketContext<Self>) {
        let session_id = self.session.session_id();
        if self.session.is_game_over() {
            let message = AnalysisError::GameOver.to_string();
            self.send(ctx, &ServerMessage::analysis_error(session_id, message));
            return;
        }

        let fen = self.session.state().position.fen();
        let client = self.app_state.analysis.clone();
        info!("Requesting analysis for session {} ({})", self.id, fen);

        let request = async move { client.report(fen).await };
        ctx.spawn(request.into_actor(self).map(move |result, act, ctx| {
            act.deliver_analysis(session_id, result, ctx);
        }));
    }

    fn deliver_analysis(
        &mut self,
        session_id: u64,
        result: Result<AnalysisReport, AnalysisError>,
        ctx: &mut ws::WebsocketContext<Self>,
    ) {
        if !self.session.accepts_result_for(session_id) {
            debug!(
                "Dropping analysis for stale session {} (now {})",
                session_id,
                self.session.session_id()
            );
            return;
        }

        match result {
            Ok(report) => {
                let stats = self.session.stats();
                self.send(ctx, &ServerMessage::analysis(session_id, report, stats));
            }
            Err(e) => {
                warn!("Analysis failed for {}: {}", self.id, e);
                self.send(ctx, &ServerMessage::analysis_error(session_id, e.to_string()));
            }
        }
    }
}
