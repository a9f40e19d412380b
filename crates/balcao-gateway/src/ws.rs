// SPDX-FileCopyrightText: 2026 Balcao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WebSocket fan-out of the event bus.
//!
//! Client -> Server (JSON):
//! ```json
//! {"action": "join-chat", "chatId": "5511999999999@c.us"}
//! {"action": "leave-chat", "chatId": "5511999999999@c.us"}
//! ```
//!
//! Server -> Client: every bus event as JSON (`{"event": ..., "payload":
//! ..., "at": ...}`). Events scoped to a room are only delivered to
//! clients that joined it; everything else is broadcast.

use std::collections::HashSet;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::broadcast::error::RecvError;

use crate::server::AppState;

/// Room management message from a client.
#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
enum WsAction {
    JoinChat {
        #[serde(rename = "chatId")]
        chat_id: String,
    },
    LeaveChat {
        #[serde(rename = "chatId")]
        chat_id: String,
    },
}

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

/// One connected dashboard client: relay bus events out, track the rooms
/// it joined, until either side hangs up.
async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();
    let mut bus_rx = state.bus.subscribe();
    let mut rooms: HashSet<String> = HashSet::new();

    loop {
        tokio::select! {
            event = bus_rx.recv() => match event {
                Ok(event) => {
                    if let Some(room) = &event.room
                        && !rooms.contains(room)
                    {
                        continue;
                    }
                    let json = match serde_json::to_string(&event) {
                        Ok(json) => json,
                        Err(e) => {
                            tracing::warn!(error = %e, "failed to serialize bus event");
                            continue;
                        }
                    };
                    if sender.send(Message::Text(json.into())).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "websocket client lagged behind the bus");
                }
                Err(RecvError::Closed) => break,
            },
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    match serde_json::from_str::<WsAction>(&text) {
                        Ok(WsAction::JoinChat { chat_id }) => {
                            tracing::debug!(chat = %chat_id, "client joined chat room");
                            rooms.insert(chat_id);
                        }
                        Ok(WsAction::LeaveChat { chat_id }) => {
                            tracing::debug!(chat = %chat_id, "client left chat room");
                            rooms.remove(&chat_id);
                        }
                        Err(e) => tracing::warn!(error = %e, "invalid websocket message"),
                    }
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {} // binary and ping frames are ignored
                Some(Err(_)) => break,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_chat_action_deserializes() {
        let action: WsAction =
            serde_json::from_str(r#"{"action": "join-chat", "chatId": "55@c.us"}"#).unwrap();
        assert!(matches!(action, WsAction::JoinChat { chat_id } if chat_id == "55@c.us"));
    }

    #[test]
    fn leave_chat_action_deserializes() {
        let action: WsAction =
            serde_json::from_str(r#"{"action": "leave-chat", "chatId": "55@c.us"}"#).unwrap();
        assert!(matches!(action, WsAction::LeaveChat { chat_id } if chat_id == "55@c.us"));
    }

    #[test]
    fn unknown_action_is_an_error() {
        assert!(serde_json::from_str::<WsAction>(r#"{"action": "subscribe"}"#).is_err());
    }
}
