// src/api/notification.rs
//
// Live notification transport. Clients open the websocket first and then
// authenticate at the application level (user id + role); the session only
// joins the registry once that handshake arrives.
use axum::{
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    extract::State,
    response::Response,
    routing::get,
    Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::app_state::AppState;
use crate::db::models::notification::Notification;
use crate::db::models::user::Role;
use crate::ws::dispatcher::SessionRegistry;

pub fn notification_routes() -> Router<AppState> {
    Router::new().route("/ws", get(ws_upgrade))
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClientMessage {
    Authenticate { user_id: i32, role: Role },
}

async fn ws_upgrade(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    let registry = state.registry.clone();
    ws.on_upgrade(move |socket| client_session(socket, registry))
}

async fn client_session(mut socket: WebSocket, registry: Arc<SessionRegistry>) {
    let session_id = Uuid::new_v4();
    let (tx, mut rx) = mpsc::unbounded_channel::<Notification>();

    loop {
        tokio::select! {
            inbound = socket.recv() => match inbound {
                Some(Ok(Message::Text(text))) => match serde_json::from_str(&text) {
                    Ok(ClientMessage::Authenticate { user_id, role }) => {
                        registry.register_session(session_id, user_id, role, tx.clone());
                    }
                    Err(e) => {
                        tracing::debug!(%session_id, error = %e, "ignoring unparseable client frame");
                    }
                },
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::debug!(%session_id, error = %e, "websocket receive error");
                    break;
                }
            },
            outbound = rx.recv() => match outbound {
                Some(notification) => {
                    let payload = match serde_json::to_string(&notification) {
                        Ok(payload) => payload,
                        Err(e) => {
                            tracing::error!(error = %e, "failed to serialize notification");
                            continue;
                        }
                    };
                    if socket.send(Message::Text(payload.into())).await.is_err() {
                        break;
                    }
                }
                None => break,
            },
        }
    }

    // Transport closed, one way or another; only this session goes away.
    registry.deregister_session(session_id);
}
