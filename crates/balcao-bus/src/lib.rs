// SPDX-FileCopyrightText: 2026 Balcao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Internal realtime event bus for the Balcao dashboard.
//!
//! Every state change that matters to an open dashboard (new orders,
//! spreadsheet edits, messaging session transitions, relayed chat messages)
//! is published here. The WebSocket layer subscribes and fans events out to
//! connected clients; room-scoped events reach only clients that joined the
//! room.
//!
//! Backed by a tokio broadcast channel: publishing never blocks, and a slow
//! subscriber that lags behind loses the oldest events rather than stalling
//! producers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::broadcast;

/// Broadcast channel capacity. A dashboard burst (spreadsheet bulk edit,
/// chat backlog replay) stays well under this.
const BUS_CAPACITY: usize = 256;

/// Event names published on the bus, as delivered to frontend clients.
pub mod events {
    pub const NOVO_PEDIDO: &str = "novo-pedido";
    pub const NOTIFICATION: &str = "notification";

    pub const SHEETS_UPDATED: &str = "sheets:updated";
    pub const SHEETS_ROW_ADDED: &str = "sheets:row-added";
    pub const SHEETS_ROW_DELETED: &str = "sheets:row-deleted";

    pub const WHATSAPP_QR: &str = "whatsapp:qr";
    pub const WHATSAPP_LOADING: &str = "whatsapp:loading";
    pub const WHATSAPP_READY: &str = "whatsapp:ready";
    pub const WHATSAPP_DISCONNECTED: &str = "whatsapp:disconnected";
    pub const WHATSAPP_AUTH_FAILURE: &str = "whatsapp:auth-failure";
    pub const WHATSAPP_RECOVERY_EXHAUSTED: &str = "whatsapp:recovery-exhausted";
    pub const WHATSAPP_MESSAGE: &str = "whatsapp:message";
    pub const WHATSAPP_MESSAGE_SENT: &str = "whatsapp:message-sent";
    pub const WHATSAPP_AI_BLOCKED: &str = "whatsapp:ai-blocked";
    pub const WHATSAPP_AI_UNBLOCKED: &str = "whatsapp:ai-unblocked";
    pub const WHATSAPP_HUMAN_NEEDED: &str = "whatsapp:human-needed";
}

/// One event on the bus.
///
/// `room` limits delivery: `None` is broadcast to every client, `Some(room)`
/// only to clients that joined that room (chat rooms use the chat id).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusEvent {
    pub event: String,
    pub payload: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room: Option<String>,
    pub at: DateTime<Utc>,
}

impl BusEvent {
    pub fn new(event: impl Into<String>, payload: Value) -> Self {
        Self {
            event: event.into(),
            payload,
            room: None,
            at: Utc::now(),
        }
    }

    pub fn for_room(event: impl Into<String>, payload: Value, room: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            payload,
            room: Some(room.into()),
            at: Utc::now(),
        }
    }
}

/// Shared event bus handle. Cheap to clone; all clones publish into and
/// subscribe from the same channel.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<BusEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(BUS_CAPACITY);
        Self { tx }
    }

    /// Publish an event to every subscriber. Events published while no
    /// subscriber exists are dropped silently.
    pub fn publish(&self, event: impl Into<String>, payload: Value) {
        self.send(BusEvent::new(event, payload));
    }

    /// Publish an event scoped to one room.
    pub fn publish_room(&self, event: impl Into<String>, payload: Value, room: impl Into<String>) {
        self.send(BusEvent::for_room(event, payload, room));
    }

    fn send(&self, event: BusEvent) {
        tracing::debug!(event = %event.event, room = ?event.room, "bus publish");
        // Err means no active subscribers, which is fine.
        let _ = self.tx.send(event);
    }

    /// Open a new subscription starting from the next published event.
    pub fn subscribe(&self) -> broadcast::Receiver<BusEvent> {
        self.tx.subscribe()
    }

    /// Number of live subscribers, used by the health endpoint.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn subscriber_receives_published_event() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();

        bus.publish(events::NOVO_PEDIDO, json!({"id": 7}));

        let ev = rx.recv().await.unwrap();
        assert_eq!(ev.event, "novo-pedido");
        assert_eq!(ev.payload["id"], 7);
        assert!(ev.room.is_none());
    }

    #[tokio::test]
    async fn room_scoped_event_carries_room() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();

        bus.publish_room(
            events::WHATSAPP_MESSAGE,
            json!({"message": "oi"}),
            "5511999999999@c.us",
        );

        let ev = rx.recv().await.unwrap();
        assert_eq!(ev.room.as_deref(), Some("5511999999999@c.us"));
    }

    #[tokio::test]
    async fn publish_without_subscribers_does_not_panic() {
        let bus = EventBus::new();
        bus.publish(events::NOTIFICATION, json!({"title": "Teste"}));
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn each_subscriber_gets_its_own_copy() {
        let bus = EventBus::new();
        let mut a = bus.subscribe();
        let mut b = bus.subscribe();

        bus.publish(events::SHEETS_UPDATED, json!({"range": "A1:B2"}));

        assert_eq!(a.recv().await.unwrap().event, "sheets:updated");
        assert_eq!(b.recv().await.unwrap().event, "sheets:updated");
    }

    #[tokio::test]
    async fn subscription_starts_at_next_event() {
        let bus = EventBus::new();
        let mut early = bus.subscribe();
        bus.publish(events::NOTIFICATION, json!({"n": 1}));

        let mut late = bus.subscribe();
        bus.publish(events::NOTIFICATION, json!({"n": 2}));

        assert_eq!(early.recv().await.unwrap().payload["n"], 1);
        assert_eq!(late.recv().await.unwrap().payload["n"], 2);
    }
}
