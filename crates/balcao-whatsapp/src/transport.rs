// SPDX-FileCopyrightText: 2026 Balcao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Transport seam between the bridge and the messaging platform.
//!
//! The bridge never talks to the platform directly; it consumes
//! [`TransportEvent`]s and issues commands through [`ChatTransport`]. Tests
//! drive the bridge with a scripted transport, production wires a real
//! platform session behind the same trait.

use async_trait::async_trait;

use balcao_core::{BalcaoError, ContactInfo, LastMessage};

/// Reason string the platform reports for an intentional disconnect
/// (logout or page navigation). Never triggers recovery.
pub const INTENTIONAL_DISCONNECT: &str = "NAVIGATION";

/// A session lifecycle or inbound-message event from the platform.
#[derive(Debug, Clone)]
pub enum TransportEvent {
    /// A pairing QR code was issued; forwarded to the dashboard for scanning.
    Qr(String),
    /// Session restore progress.
    Loading { percent: u8, message: String },
    /// Credentials accepted; the session is syncing but not usable yet.
    Authenticated,
    /// The session is fully usable.
    Ready,
    /// Credentials rejected; a new QR scan is required.
    AuthFailure(String),
    /// The session dropped. `reason` is the platform's disconnect reason;
    /// anything other than [`INTENTIONAL_DISCONNECT`] is treated as a crash.
    Disconnected { reason: String },
    /// An inbound message from a contact.
    Message(InboundMessage),
}

/// An inbound message as delivered by the platform.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub id: String,
    pub chat_id: String,
    pub body: String,
    /// Unix seconds assigned by the platform.
    pub timestamp: i64,
    pub has_media: bool,
    /// Platform message type ("chat", "image", "audio", ...).
    pub kind: String,
    pub sender_name: Option<String>,
    pub sender_number: String,
}

/// A chat session as listed by the platform.
#[derive(Debug, Clone)]
pub struct RemoteChat {
    pub id: String,
    pub name: String,
    pub is_group: bool,
    pub unread_count: u32,
    pub last_message: Option<LastMessage>,
    pub contact: ContactInfo,
}

/// A message from the platform's chat history.
#[derive(Debug, Clone)]
pub struct RemoteMessage {
    pub id: String,
    pub body: String,
    /// Unix seconds.
    pub timestamp: i64,
    pub from_me: bool,
    pub has_media: bool,
    pub kind: String,
}

/// Abstraction over one messaging platform session.
///
/// Implementations own the underlying connection. `next_event` is the only
/// pull point: the bridge's run loop awaits it until it yields `None`,
/// which means the transport was torn down for good.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Start (or restart) the platform session. Progress and the eventual
    /// ready signal arrive through `next_event`, not the return value.
    async fn connect(&self) -> Result<(), BalcaoError>;

    /// Await the next session event. `Ok(None)` means the transport is
    /// closed and no further events will arrive.
    async fn next_event(&self) -> Result<Option<TransportEvent>, BalcaoError>;

    /// Send a text message to a chat.
    async fn send_text(&self, chat_id: &str, body: &str) -> Result<(), BalcaoError>;

    /// List the current chat sessions in any order; the bridge sorts by
    /// last activity.
    async fn list_chats(&self) -> Result<Vec<RemoteChat>, BalcaoError>;

    /// Fetch the most recent `limit` messages of a chat, newest first.
    async fn fetch_messages(
        &self,
        chat_id: &str,
        limit: usize,
    ) -> Result<Vec<RemoteMessage>, BalcaoError>;

    /// Tear the session down. Emits an intentional disconnect.
    async fn destroy(&self) -> Result<(), BalcaoError>;
}

/// Transport used when the bridge is disabled in configuration. Yields no
/// events and rejects every command.
pub struct NoopTransport;

#[async_trait]
impl ChatTransport for NoopTransport {
    async fn connect(&self) -> Result<(), BalcaoError> {
        Ok(())
    }

    async fn next_event(&self) -> Result<Option<TransportEvent>, BalcaoError> {
        Ok(None)
    }

    async fn send_text(&self, _chat_id: &str, _body: &str) -> Result<(), BalcaoError> {
        Err(BalcaoError::channel("WhatsApp não está conectado"))
    }

    async fn list_chats(&self) -> Result<Vec<RemoteChat>, BalcaoError> {
        Ok(Vec::new())
    }

    async fn fetch_messages(
        &self,
        _chat_id: &str,
        _limit: usize,
    ) -> Result<Vec<RemoteMessage>, BalcaoError> {
        Ok(Vec::new())
    }

    async fn destroy(&self) -> Result<(), BalcaoError> {
        Ok(())
    }
}
