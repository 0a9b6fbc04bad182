use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use futures_util::{SinkExt, StreamExt};
use maze_chase_server::config::{ServerConfig, SimulationConfig};
use maze_chase_server::engine::GameEngine;
use maze_chase_server::levels;
use maze_chase_server::server_protocol::{parse_client_message, ParsedClientMessage};
use maze_chase_server::server_utils::resolve_static_dir;
use maze_chase_server::types::Command;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tower_http::services::{ServeDir, ServeFile};
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

type SharedState = Arc<AppState>;

struct AppState {
    simulation: SimulationConfig,
    outbound_queue: usize,
}

#[derive(Clone, Debug)]
enum OutboundMessage {
    Text(String),
    Close { code: u16, reason: String },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum QueuePolicy {
    DropOnFull,
    DisconnectOnFull,
}

/// One connected client and the engine it drives. Lives inside a single task.
struct Session {
    id: String,
    tx: mpsc::Sender<OutboundMessage>,
    engine: GameEngine,
    tick_ms: u64,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let server_config = ServerConfig::from_env();
    let simulation = match SimulationConfig::load() {
        Ok(config) => config,
        Err(err) => {
            error!(%err, "failed to load simulation config");
            std::process::exit(1);
        }
    };
    if let Err(err) = levels::builtin() {
        error!(%err, "built-in levels are invalid");
        std::process::exit(1);
    }

    let state = Arc::new(AppState {
        simulation,
        outbound_queue: server_config.outbound_queue,
    });

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/ws", get(ws_handler))
        .with_state(state);

    let app = if let Some(static_dir) = resolve_static_dir(server_config.static_dir.as_deref()) {
        let index_file = static_dir.join("index.html");
        info!(root = %static_dir.to_string_lossy(), "serving static files");
        app.fallback_service(
            ServeDir::new(static_dir).not_found_service(ServeFile::new(index_file)),
        )
    } else {
        warn!("static file root not found; only /healthz and /ws are served");
        app
    };

    let listener = match tokio::net::TcpListener::bind(&server_config.listen_addr).await {
        Ok(listener) => listener,
        Err(err) => {
            error!(%err, addr = %server_config.listen_addr, "failed to bind server socket");
            std::process::exit(1);
        }
    };

    info!(addr = %server_config.listen_addr, "listening");
    if let Err(err) = axum::serve(listener, app).await {
        error!(%err, "server runtime failed");
        std::process::exit(1);
    }
}

async fn healthz() -> impl IntoResponse {
    Json(json!({ "ok": true }))
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<SharedState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(state, socket))
}

async fn handle_socket(state: SharedState, socket: WebSocket) {
    let session_id = make_id("session");
    let (tx, mut rx) = mpsc::channel::<OutboundMessage>(state.outbound_queue);

    let (mut ws_sender, mut ws_receiver) = socket.split();
    let writer = tokio::spawn(async move {
        while let Some(outbound) = rx.recv().await {
            let should_close = matches!(outbound, OutboundMessage::Close { .. });
            let result = match outbound {
                OutboundMessage::Text(payload) => {
                    ws_sender.send(Message::Text(payload.into())).await
                }
                OutboundMessage::Close { code, reason } => {
                    let frame = CloseFrame {
                        code,
                        reason: reason.into(),
                    };
                    ws_sender.send(Message::Close(Some(frame))).await
                }
            };
            if result.is_err() || should_close {
                break;
            }
        }
    });

    let engine = match GameEngine::with_builtin_levels(state.simulation.clone()) {
        Ok(engine) => engine,
        Err(err) => {
            error!(session_id = %session_id, %err, "failed to create engine");
            let _ = tx.try_send(OutboundMessage::Close {
                code: 1011,
                reason: "engine unavailable".to_string(),
            });
            drop(tx);
            let _ = writer.await;
            return;
        }
    };

    let mut session = Session::new(session_id, tx, engine);
    info!(session_id = %session.id, "session started");
    let mut open = session.send_welcome_and_initial_state();

    let mut interval = tokio::time::interval(Duration::from_millis(session.tick_ms));
    while open {
        tokio::select! {
            _ = interval.tick() => {
                open = session.tick();
            }
            received = ws_receiver.next() => {
                let Some(Ok(message)) = received else {
                    break;
                };
                open = match message {
                    Message::Text(raw) => session.handle_client_message(&raw.to_string()),
                    Message::Binary(raw) => match String::from_utf8(raw.to_vec()) {
                        Ok(text) => session.handle_client_message(&text),
                        Err(_) => session.send_error("invalid utf8 message"),
                    },
                    Message::Close(_) => false,
                    _ => true,
                };
            }
        }
    }

    info!(
        session_id = %session.id,
        score = session.engine.status().score,
        "session closed"
    );
    drop(session);
    let _ = writer.await;
}

impl Session {
    fn new(id: String, tx: mpsc::Sender<OutboundMessage>, engine: GameEngine) -> Self {
        let tick_ms = engine.config().tick_ms();
        Self {
            id,
            tx,
            engine,
            tick_ms,
        }
    }

    fn send_welcome_and_initial_state(&mut self) -> bool {
        let welcome = json!({
            "type": "welcome",
            "sessionId": self.id,
            "tickRate": self.engine.config().tick_rate,
            "levels": self.engine.level_count(),
        });
        if !self.send(&welcome, QueuePolicy::DisconnectOnFull) {
            return false;
        }
        if !self.send_level_init() {
            return false;
        }
        let snapshot = self.engine.build_snapshot(false);
        self.send(
            &json!({
                "type": "state",
                "snapshot": snapshot,
            }),
            QueuePolicy::DisconnectOnFull,
        )
    }

    fn send_level_init(&self) -> bool {
        let init = self.engine.level_init();
        self.send(
            &json!({
                "type": "level_init",
                "level": init,
            }),
            QueuePolicy::DisconnectOnFull,
        )
    }

    fn tick(&mut self) -> bool {
        self.engine.step(self.tick_ms);
        let snapshot = self.engine.build_snapshot(true);
        self.send(
            &json!({
                "type": "state",
                "snapshot": snapshot,
            }),
            QueuePolicy::DropOnFull,
        )
    }

    /// Apply one client message. Returns false once the session should close.
    fn handle_client_message(&mut self, raw: &str) -> bool {
        let Some(message) = parse_client_message(raw) else {
            debug!(session_id = %self.id, "rejected client message");
            return self.send_error("invalid message");
        };

        if let ParsedClientMessage::Ping { t } = message {
            return self.send(
                &json!({
                    "type": "pong",
                    "t": t,
                }),
                QueuePolicy::DisconnectOnFull,
            );
        }

        let Some(command) = message.into_command(self.engine.status().level) else {
            return true;
        };
        self.engine.apply_command(command);
        match command {
            Command::Restart { .. } | Command::AdvanceToNextLevel => self.send_level_init(),
            _ => true,
        }
    }

    fn send_error(&self, message: &str) -> bool {
        self.send(
            &json!({
                "type": "error",
                "message": message,
            }),
            QueuePolicy::DisconnectOnFull,
        )
    }

    /// Queue a message for the writer task. A full queue under
    /// `DisconnectOnFull` ends the session.
    fn send(&self, message: &Value, policy: QueuePolicy) -> bool {
        let failed = self
            .tx
            .try_send(OutboundMessage::Text(message.to_string()))
            .is_err();
        if failed && policy == QueuePolicy::DisconnectOnFull {
            warn!(session_id = %self.id, "outbound queue full; closing session");
            return false;
        }
        true
    }
}

fn make_id(prefix: &str) -> String {
    let seq = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    format!("{prefix}_{seq}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(capacity: usize) -> (Session, mpsc::Receiver<OutboundMessage>) {
        let config = SimulationConfig {
            seed: Some(3),
            ..SimulationConfig::default()
        };
        let engine = GameEngine::with_builtin_levels(config).expect("engine builds");
        let (tx, rx) = mpsc::channel(capacity);
        (Session::new("session_test".to_string(), tx, engine), rx)
    }

    fn next_json(rx: &mut mpsc::Receiver<OutboundMessage>) -> Value {
        match rx.try_recv().expect("message queued") {
            OutboundMessage::Text(payload) => {
                serde_json::from_str(&payload).expect("payload is json")
            }
            OutboundMessage::Close { .. } => panic!("unexpected close"),
        }
    }

    #[test]
    fn welcome_is_followed_by_level_init_and_state() {
        let (mut session, mut rx) = session(8);
        assert!(session.send_welcome_and_initial_state());
        assert_eq!(next_json(&mut rx)["type"], "welcome");
        let init = next_json(&mut rx);
        assert_eq!(init["type"], "level_init");
        assert_eq!(init["level"]["tileSize"], 25.0);
        assert_eq!(next_json(&mut rx)["type"], "state");
    }

    #[test]
    fn ping_is_answered_with_pong() {
        let (mut session, mut rx) = session(8);
        assert!(session.handle_client_message(r#"{"type":"ping","t":4.5}"#));
        let pong = next_json(&mut rx);
        assert_eq!(pong["type"], "pong");
        assert_eq!(pong["t"], 4.5);
    }

    #[test]
    fn invalid_message_reports_error() {
        let (mut session, mut rx) = session(8);
        assert!(session.handle_client_message("{}"));
        assert_eq!(next_json(&mut rx)["message"], "invalid message");
    }

    #[test]
    fn pause_message_reaches_the_engine() {
        let (mut session, mut rx) = session(8);
        assert!(session.handle_client_message(r#"{"type":"toggle_pause"}"#));
        assert!(session.engine.status().paused);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn restart_resends_level_init() {
        let (mut session, mut rx) = session(8);
        assert!(session.handle_client_message(r#"{"type":"restart","level":1}"#));
        let init = next_json(&mut rx);
        assert_eq!(init["type"], "level_init");
        assert_eq!(init["level"]["level"], 1);
    }

    #[test]
    fn full_queue_drops_state_but_closes_on_replies() {
        let (mut session, _rx) = session(1);
        assert!(session.tick());
        assert!(session.tick());
        assert!(!session.handle_client_message(r#"{"type":"ping","t":1}"#));
    }
}
