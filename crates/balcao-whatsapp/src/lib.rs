// SPDX-FileCopyrightText: 2026 Balcao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Messaging bridge between the platform session and the dashboard.
//!
//! The bridge consumes [`TransportEvent`]s from a [`ChatTransport`], keeps
//! the session lifecycle, relays messages onto the event bus, and routes
//! unblocked inbound messages through the automation webhook. Per-chat AI
//! blocking and the chat cache live here, in memory only.

pub mod automation;
pub mod state;
pub mod transport;

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use serde_json::json;
use tracing::{debug, info, warn};

use balcao_bus::{events, EventBus};
use balcao_config::model::WhatsappConfig;
use balcao_core::{BalcaoError, ChatMessage, ChatSummary, Direction, LastMessage};

pub use automation::{AutomationClient, AutomationReply};
pub use state::BridgeState;
pub use transport::{
    ChatTransport, InboundMessage, NoopTransport, RemoteChat, RemoteMessage, TransportEvent,
    INTENTIONAL_DISCONNECT,
};

/// Default history page size for one chat.
pub const DEFAULT_MESSAGE_LIMIT: usize = 50;

/// Apology sent to the contact when the automation webhook fails.
pub const AUTOMATION_FALLBACK: &str =
    "Desculpe, estou com dificuldades técnicas. Um atendente humano irá te ajudar em breve.";

/// Session snapshot for the status endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct BridgeStatus {
    #[serde(rename = "isReady")]
    pub is_ready: bool,
    pub status: &'static str,
    #[serde(rename = "connectedChats")]
    pub connected_chats: usize,
    #[serde(rename = "blockedChats")]
    pub blocked_chats: usize,
}

/// The messaging bridge. One instance per process, shared as `Arc`.
pub struct WhatsappBridge {
    transport: Arc<dyn ChatTransport>,
    bus: EventBus,
    automation: Option<AutomationClient>,

    max_reconnect_attempts: u32,
    reconnect_delay: Duration,
    ready_grace: Duration,
    chat_sync_budget: Duration,

    state: Mutex<BridgeState>,
    reconnect_attempts: AtomicU32,
    /// Chats where the automation is muted and a human answers.
    blocked: DashMap<String, ()>,
    /// Messages relayed through this process, kept as a fallback when the
    /// platform history fetch fails.
    history: Mutex<HashMap<String, Vec<ChatMessage>>>,
    chats_cache: Mutex<Vec<ChatSummary>>,
}

impl WhatsappBridge {
    pub fn new(config: &WhatsappConfig, transport: Arc<dyn ChatTransport>, bus: EventBus) -> Self {
        let automation = config.automation_webhook_url.as_ref().map(|url| {
            AutomationClient::new(url.clone(), Duration::from_secs(config.webhook_timeout_secs))
        });

        Self {
            transport,
            bus,
            automation,
            max_reconnect_attempts: config.max_reconnect_attempts,
            reconnect_delay: Duration::from_secs(config.reconnect_delay_secs),
            ready_grace: Duration::from_secs(config.ready_grace_secs),
            chat_sync_budget: Duration::from_millis(config.chat_sync_budget_ms),
            state: Mutex::new(BridgeState::Disconnected),
            reconnect_attempts: AtomicU32::new(0),
            blocked: DashMap::new(),
            history: Mutex::new(HashMap::new()),
            chats_cache: Mutex::new(Vec::new()),
        }
    }

    /// Connect the transport and consume its events until it closes.
    pub async fn run(self: Arc<Self>) {
        if let Err(e) = self.transport.connect().await {
            warn!(error = %e, "conexão inicial do WhatsApp falhou");
            self.clone().spawn_recovery();
        }

        loop {
            match self.transport.next_event().await {
                Ok(Some(event)) => self.handle_event(event).await,
                Ok(None) => {
                    debug!("transporte do WhatsApp encerrado");
                    break;
                }
                Err(e) => {
                    warn!(error = %e, "erro no transporte do WhatsApp");
                    break;
                }
            }
        }
    }

    async fn handle_event(self: &Arc<Self>, event: TransportEvent) {
        match event {
            TransportEvent::Qr(code) => {
                self.advance(BridgeState::on_qr);
                info!("QR code recebido, aguardando leitura");
                self.bus.publish(events::WHATSAPP_QR, json!({ "qr": code }));
            }
            TransportEvent::Loading { percent, message } => {
                self.bus.publish(
                    events::WHATSAPP_LOADING,
                    json!({ "percent": percent, "message": message }),
                );
            }
            TransportEvent::Authenticated => {
                self.advance(BridgeState::on_authenticated);
                // The session sync can hang without ever signalling ready;
                // after the grace period the bridge declares itself ready
                // anyway so the dashboard stays usable.
                let bridge = self.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(bridge.ready_grace).await;
                    if !bridge.is_ready() {
                        warn!("sinal de pronto não chegou, forçando");
                        bridge.set_ready(true);
                    }
                });
            }
            TransportEvent::Ready => self.set_ready(false),
            TransportEvent::AuthFailure(error) => {
                self.advance(BridgeState::on_drop);
                warn!(%error, "falha de autenticação do WhatsApp");
                self.bus
                    .publish(events::WHATSAPP_AUTH_FAILURE, json!({ "error": error }));
            }
            TransportEvent::Disconnected { reason } => {
                self.advance(BridgeState::on_drop);
                warn!(%reason, "sessão do WhatsApp caiu");
                self.bus
                    .publish(events::WHATSAPP_DISCONNECTED, json!({ "reason": reason }));
                if reason != INTENTIONAL_DISCONNECT {
                    self.clone().spawn_recovery();
                }
            }
            TransportEvent::Message(msg) => self.handle_incoming(msg).await,
        }
    }

    /// Apply a lifecycle step under the state lock. Returns whether the
    /// state actually moved; illegal or redundant steps leave it alone.
    fn advance(&self, step: impl FnOnce(BridgeState) -> BridgeState) -> bool {
        let mut st = self.state.lock().unwrap();
        let next = step(*st);
        if next == *st {
            debug!(state = %*st, "transição ignorada");
            return false;
        }
        debug!(from = %*st, to = %next, "transição de estado");
        *st = next;
        true
    }

    pub fn is_ready(&self) -> bool {
        self.state.lock().unwrap().is_ready()
    }

    fn set_ready(self: &Arc<Self>, forced: bool) {
        if !self.advance(BridgeState::on_ready) {
            return;
        }
        self.reconnect_attempts.store(0, Ordering::SeqCst);
        info!(forced, "sessão do WhatsApp pronta");
        self.bus.publish(
            events::WHATSAPP_READY,
            json!({
                "status": BridgeState::Ready.as_status(),
                "forced": forced,
                "timestamp": Utc::now().to_rfc3339(),
            }),
        );

        let bridge = self.clone();
        tokio::spawn(async move {
            bridge.refresh_chats().await;
        });
    }

    fn spawn_recovery(self: Arc<Self>) {
        tokio::spawn(async move { self.recover().await });
    }

    /// Reconnect after an unexpected drop, up to the configured attempt
    /// budget. The counter resets when a session reaches ready.
    async fn recover(self: Arc<Self>) {
        loop {
            let attempt = self.reconnect_attempts.fetch_add(1, Ordering::SeqCst) + 1;
            if attempt > self.max_reconnect_attempts {
                warn!(
                    attempts = self.max_reconnect_attempts,
                    "tentativas de reconexão esgotadas"
                );
                self.advance(BridgeState::on_exhausted);
                self.bus.publish(
                    events::WHATSAPP_RECOVERY_EXHAUSTED,
                    json!({
                        "attempts": self.max_reconnect_attempts,
                        "timestamp": Utc::now().to_rfc3339(),
                    }),
                );
                return;
            }

            self.advance(BridgeState::on_retry);
            info!(attempt, "tentando reconectar o WhatsApp");
            tokio::time::sleep(self.reconnect_delay).await;

            match self.transport.connect().await {
                Ok(()) => return,
                Err(e) => warn!(attempt, error = %e, "reconexão falhou"),
            }
        }
    }

    async fn handle_incoming(self: &Arc<Self>, msg: InboundMessage) {
        let contact_name = msg
            .sender_name
            .clone()
            .unwrap_or_else(|| msg.sender_number.clone());

        let record = ChatMessage {
            id: msg.id.clone(),
            chat_id: msg.chat_id.clone(),
            contact_name: Some(contact_name.clone()),
            contact_number: Some(msg.sender_number.clone()),
            message: msg.body.clone(),
            timestamp: unix_to_rfc3339(msg.timestamp),
            direction: Direction::Incoming,
            from_bot: false,
            has_media: msg.has_media,
            kind: msg.kind.clone(),
        };

        self.store_message(record.clone());
        self.bus.publish(
            events::WHATSAPP_MESSAGE,
            serde_json::to_value(&record).unwrap_or_default(),
        );
        self.touch_chat(&msg.chat_id, &msg.body);

        if self.is_blocked(&msg.chat_id) {
            info!(chat = %msg.chat_id, "IA bloqueada, encaminhando para humano");
            self.bus.publish(
                events::WHATSAPP_HUMAN_NEEDED,
                json!({
                    "chatId": msg.chat_id,
                    "contactName": contact_name,
                    "contactNumber": msg.sender_number,
                    "message": msg.body,
                    "reason": "IA bloqueada manualmente",
                }),
            );
            return;
        }

        let Some(automation) = &self.automation else {
            return;
        };

        match automation
            .ask(&msg.chat_id, &msg.body, &contact_name, &msg.sender_number)
            .await
        {
            Ok(reply) => {
                if let Some(response) = &reply.response {
                    if let Err(e) = self.send_message(&msg.chat_id, response, true).await {
                        warn!(error = %e, "falha ao enviar resposta da automação");
                    }
                }
                if reply.solicitar_atendente {
                    info!(chat = %msg.chat_id, "automação solicitou atendente humano");
                    self.bus.publish(
                        events::WHATSAPP_HUMAN_NEEDED,
                        json!({
                            "chatId": msg.chat_id,
                            "contactName": contact_name,
                            "contactNumber": msg.sender_number,
                            "message": msg.body,
                            "aiMessage": reply.mensagem,
                            "reason": "Solicitado pela IA",
                        }),
                    );
                    if let Some(mensagem) = &reply.mensagem {
                        if let Err(e) = self.send_message(&msg.chat_id, mensagem, true).await {
                            warn!(error = %e, "falha ao enviar mensagem de espera");
                        }
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, "webhook de automação falhou");
                if let Err(e) = self.send_message(&msg.chat_id, AUTOMATION_FALLBACK, true).await {
                    warn!(error = %e, "falha ao enviar mensagem de contingência");
                }
                self.bus.publish(
                    events::WHATSAPP_HUMAN_NEEDED,
                    json!({
                        "chatId": msg.chat_id,
                        "message": msg.body,
                        "reason": "Erro na IA",
                    }),
                );
            }
        }
    }

    /// Send a text message. `from_bot` marks automation replies so the
    /// dashboard can tell them apart from operator messages.
    pub async fn send_message(
        &self,
        chat_id: &str,
        body: &str,
        from_bot: bool,
    ) -> Result<ChatMessage, BalcaoError> {
        if !self.is_ready() {
            return Err(BalcaoError::channel("WhatsApp não está conectado"));
        }

        self.transport.send_text(chat_id, body).await?;

        let record = ChatMessage {
            id: Utc::now().timestamp_millis().to_string(),
            chat_id: chat_id.to_string(),
            contact_name: None,
            contact_number: None,
            message: body.to_string(),
            timestamp: Utc::now().to_rfc3339(),
            direction: Direction::Outgoing,
            from_bot,
            has_media: false,
            kind: "chat".to_string(),
        };

        self.store_message(record.clone());
        self.bus.publish(
            events::WHATSAPP_MESSAGE_SENT,
            serde_json::to_value(&record).unwrap_or_default(),
        );
        Ok(record)
    }

    /// Mute the automation for one chat; a human answers from here on.
    pub fn block_ai(&self, chat_id: &str) {
        self.blocked.insert(chat_id.to_string(), ());
        info!(chat = %chat_id, "IA bloqueada");
        self.bus.publish(
            events::WHATSAPP_AI_BLOCKED,
            json!({
                "chatId": chat_id,
                "blocked": true,
                "timestamp": Utc::now().to_rfc3339(),
            }),
        );
    }

    pub fn unblock_ai(&self, chat_id: &str) {
        self.blocked.remove(chat_id);
        info!(chat = %chat_id, "IA desbloqueada");
        self.bus.publish(
            events::WHATSAPP_AI_UNBLOCKED,
            json!({
                "chatId": chat_id,
                "blocked": false,
                "timestamp": Utc::now().to_rfc3339(),
            }),
        );
    }

    pub fn is_blocked(&self, chat_id: &str) -> bool {
        self.blocked.contains_key(chat_id)
    }

    /// Current chat list, newest activity first.
    ///
    /// Serves from the cache whenever possible: before the session is ready
    /// the cache is all there is, and once populated it is returned
    /// immediately while a background refresh runs. Only the very first
    /// call after ready blocks, and no longer than the sync budget.
    pub async fn get_chats(self: &Arc<Self>) -> Vec<ChatSummary> {
        if !self.is_ready() {
            return self.cached_chats();
        }

        let cached = self.cached_chats();
        if !cached.is_empty() {
            let bridge = self.clone();
            tokio::spawn(async move {
                bridge.refresh_chats().await;
            });
            return cached;
        }

        debug!("primeira sincronização de chats");
        match tokio::time::timeout(self.chat_sync_budget, self.refresh_chats()).await {
            Ok(chats) => chats,
            Err(_) => {
                warn!("sincronização de chats excedeu o orçamento, retornando vazio");
                Vec::new()
            }
        }
    }

    /// History of one chat in chronological order. Falls back to the
    /// messages relayed through this process when the platform fetch fails.
    pub async fn get_chat_messages(&self, chat_id: &str, limit: usize) -> Vec<ChatMessage> {
        if !self.is_ready() {
            return Vec::new();
        }

        match self.transport.fetch_messages(chat_id, limit).await {
            Ok(remote) => {
                let mut messages: Vec<ChatMessage> = remote
                    .into_iter()
                    .map(|m| ChatMessage {
                        id: m.id,
                        chat_id: chat_id.to_string(),
                        contact_name: None,
                        contact_number: None,
                        message: m.body,
                        timestamp: unix_to_rfc3339(m.timestamp),
                        direction: if m.from_me {
                            Direction::Outgoing
                        } else {
                            Direction::Incoming
                        },
                        from_bot: false,
                        has_media: m.has_media,
                        kind: m.kind,
                    })
                    .collect();
                messages.reverse();
                messages
            }
            Err(e) => {
                warn!(chat = %chat_id, error = %e, "busca de histórico falhou, usando memória local");
                let history = self.history.lock().unwrap();
                history.get(chat_id).cloned().unwrap_or_default()
            }
        }
    }

    pub fn status(&self) -> BridgeStatus {
        let state = *self.state.lock().unwrap();
        BridgeStatus {
            is_ready: state.is_ready(),
            status: state.as_status(),
            connected_chats: self.chats_cache.lock().unwrap().len(),
            blocked_chats: self.blocked.len(),
        }
    }

    /// Disconnect intentionally. No recovery is attempted.
    pub async fn shutdown(&self) -> Result<(), BalcaoError> {
        self.transport.destroy().await
    }

    fn store_message(&self, record: ChatMessage) {
        let mut history = self.history.lock().unwrap();
        history.entry(record.chat_id.clone()).or_default().push(record);
    }

    pub fn cached_chats(&self) -> Vec<ChatSummary> {
        self.chats_cache.lock().unwrap().clone()
    }

    /// Rebuild the chat cache from the platform's live list.
    async fn refresh_chats(self: &Arc<Self>) -> Vec<ChatSummary> {
        let remote = match self.transport.list_chats().await {
            Ok(remote) => remote,
            Err(e) => {
                warn!(error = %e, "falha ao listar chats, mantendo cache");
                return self.cached_chats();
            }
        };

        let mut chats: Vec<ChatSummary> = remote
            .into_iter()
            .map(|c| {
                let ai_blocked = self.is_blocked(&c.id);
                ChatSummary {
                    id: c.id,
                    name: c.name,
                    is_group: c.is_group,
                    unread_count: c.unread_count,
                    last_message: c.last_message,
                    ai_blocked,
                    contact: c.contact,
                }
            })
            .collect();
        chats.sort_by_key(|c| {
            std::cmp::Reverse(c.last_message.as_ref().map(|m| m.timestamp).unwrap_or(0))
        });

        *self.chats_cache.lock().unwrap() = chats.clone();
        chats
    }

    /// Move a chat to the top of the cache with a fresh last-message
    /// preview. Unknown chats trigger a full refresh instead.
    fn touch_chat(self: &Arc<Self>, chat_id: &str, body: &str) {
        let mut cache = self.chats_cache.lock().unwrap();
        if let Some(pos) = cache.iter().position(|c| c.id == chat_id) {
            let mut chat = cache.remove(pos);
            chat.last_message = Some(LastMessage {
                body: body.to_string(),
                timestamp: Utc::now().timestamp(),
            });
            cache.insert(0, chat);
        } else {
            drop(cache);
            let bridge = self.clone();
            tokio::spawn(async move {
                bridge.refresh_chats().await;
            });
        }
    }
}

fn unix_to_rfc3339(secs: i64) -> String {
    DateTime::<Utc>::from_timestamp(secs, 0)
        .unwrap_or_else(Utc::now)
        .to_rfc3339()
}

