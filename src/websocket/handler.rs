use actix::*;
use actix_web::web;
use actix_web_actors::ws;
use log::{debug, info, warn};
use std::sync::atomic::Ordering;
use std::time::Duration;

use crate::game::clock::TICK_MS;
use crate::game::session::MatchSession;
use crate::models::{AppState, ClientMessage, ServerMessage};

/// One connection, one match. The actor's mailbox serialises client
/// messages, clock ticks and analysis completions, so the session is never
/// touched by two handlers at once.
pub struct MatchSocket {
    pub id: String,
    pub app_state: web::Data<AppState>,
    pub session: MatchSession,
    pub(crate) clock_timer: Option<SpawnHandle>,
}

impl MatchSocket {
    pub fn new(id: String, app_state: web::Data<AppState>) -> Self {
        let base_minutes = app_state.config.default_base_minutes;
        MatchSocket {
            id,
            app_state,
            session: MatchSession::new(base_minutes),
            clock_timer: None,
        }
    }
}

impl Actor for MatchSocket {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        let total_sessions = self.app_state.active_sessions.fetch_add(1, Ordering::SeqCst) + 1;
        info!("WebSocket connection started: {}", self.id);
        info!("Total active sessions: {}", total_sessions);

        let snapshot = ServerMessage::state(&self.session);
        self.send(ctx, &snapshot);
    }

    fn stopping(&mut self, ctx: &mut Self::Context) -> Running {
        self.stop_clock_timer(ctx);

        let total_sessions = self
            .app_state
            .active_sessions
            .fetch_sub(1, Ordering::SeqCst)
            .saturating_sub(1);
        info!("WebSocket connection closed: {}", self.id);
        info!("Total active sessions: {}", total_sessions);

        Running::Stop
    }
}

// WebSocket message handler
impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for MatchSocket {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Ping(msg)) => {
                ctx.pong(&msg);
            }
            Ok(ws::Message::Pong(_)) => {
                // Do nothing for pong messages
            }
            Ok(ws::Message::Text(text)) => {
                debug!("Received text message: {}", text);
                match serde_json::from_str::<ClientMessage>(text.as_ref()) {
                    Ok(client_msg) => {
                        self.handle_message(client_msg, ctx);
                    }
                    Err(e) => {
                        warn!("Error parsing client message: {}", e);
                        self.send(ctx, &ServerMessage::error(format!("Invalid message format: {}", e)));
                    }
                }
            }
            Ok(ws::Message::Binary(_)) => {
                warn!("Binary messages are not supported");
                self.send(ctx, &ServerMessage::error("Binary messages are not supported"));
            }
            Ok(ws::Message::Close(reason)) => {
                info!("Connection closed: {:?}", reason);
                ctx.close(reason);
                ctx.stop();
            }
            _ => {
                ctx.stop();
            }
        }
    }
}

impl MatchSocket {
    pub fn handle_message(&mut self, msg: ClientMessage, ctx: &mut ws::WebsocketContext<Self>) {
        match msg.message_type.as_str() {
            "move" => self.handle_move(msg, ctx),
            "promotion_check" => self.handle_promotion_check(msg, ctx),
            "promotion" => self.handle_promotion(msg, ctx),
            "select" => self.handle_select(msg, ctx),
            "set_time" => self.handle_set_time(msg, ctx),
            "play_again" => self.handle_play_again(ctx),
            "analyze" => self.handle_analyze(ctx),
            "state" => self.send_state(ctx),
            _ => {
                info!("Unknown message type: {}", msg.message_type);
                self.send(ctx, &ServerMessage::error(format!("Unknown message type: {}", msg.message_type)));
            }
        }
        self.sync_clock_timer(ctx);
    }

    pub fn send(&self, ctx: &mut ws::WebsocketContext<Self>, message: &ServerMessage) {
        match serde_json::to_string(message) {
            Ok(text) => ctx.text(text),
            Err(e) => {
                warn!("Failed to serialize {} message: {}", message.message_type, e);
                ctx.text("{\"message_type\": \"error\", \"error\": \"Internal server error\"}");
            }
        }
    }

    pub fn send_state(&self, ctx: &mut ws::WebsocketContext<Self>) {
        let snapshot = ServerMessage::state(&self.session);
        self.send(ctx, &snapshot);
    }

    /// Arm the one-second tick while the session's clock runs; tear it
    /// down as soon as it does not.
    pub(crate) fn sync_clock_timer(&mut self, ctx: &mut ws::WebsocketContext<Self>) {
        if self.session.clock_running() {
            if self.clock_timer.is_none() {
                let handle = ctx.run_interval(Duration::from_millis(TICK_MS), |act, ctx| {
                    act.on_tick(ctx);
                });
                self.clock_timer = Some(handle);
                debug!("Clock timer armed for {}", self.id);
            }
        } else {
            self.stop_clock_timer(ctx);
        }
    }

    fn stop_clock_timer(&mut self, ctx: &mut ws::WebsocketContext<Self>) {
        if let Some(handle) = self.clock_timer.take() {
            ctx.cancel_future(handle);
            debug!("Clock timer cancelled for {}", self.id);
        }
    }

    fn on_tick(&mut self, ctx: &mut ws::WebsocketContext<Self>) {
        // A stale timer must not tick a stopped or reset clock.
        if !self.session.clock_running() {
            self.stop_clock_timer(ctx);
            return;
        }
        self.session.tick();
        self.send_state(ctx);
        self.sync_clock_timer(ctx);
    }
}
