// SPDX-FileCopyrightText: 2026 Balcao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scripted messaging transport for bridge tests.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::Notify;

use balcao_core::BalcaoError;
use balcao_whatsapp::transport::{
    ChatTransport, RemoteChat, RemoteMessage, TransportEvent, INTENTIONAL_DISCONNECT,
};

/// In-memory [`ChatTransport`] driven from the test body.
///
/// Events queued with [`inject`](MockTransport::inject) are delivered to the
/// bridge in order; sends are captured instead of leaving the process. Chat
/// lists and histories are whatever the test scripted.
#[derive(Default)]
pub struct MockTransport {
    events: Mutex<VecDeque<TransportEvent>>,
    notify: Notify,
    closed: AtomicBool,

    sent: Mutex<Vec<(String, String)>>,
    chats: Mutex<Vec<RemoteChat>>,
    histories: Mutex<HashMap<String, Vec<RemoteMessage>>>,

    connect_calls: AtomicU32,
    failing_connects: AtomicU32,
    fail_fetches: AtomicBool,
    fail_sends: AtomicBool,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an event for the bridge's run loop.
    pub fn inject(&self, event: TransportEvent) {
        self.events.lock().unwrap().push_back(event);
        self.notify.notify_one();
    }

    /// End the event stream; `next_event` returns `None` from here on.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.notify.notify_one();
    }

    /// Messages the bridge tried to send, as `(chat_id, body)` pairs.
    pub fn sent_messages(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    pub fn clear_sent(&self) {
        self.sent.lock().unwrap().clear();
    }

    /// Script the chat list returned by `list_chats`.
    pub fn set_chats(&self, chats: Vec<RemoteChat>) {
        *self.chats.lock().unwrap() = chats;
    }

    /// Script the history returned by `fetch_messages` for one chat,
    /// newest first as the platform delivers it.
    pub fn set_history(&self, chat_id: &str, messages: Vec<RemoteMessage>) {
        self.histories
            .lock()
            .unwrap()
            .insert(chat_id.to_string(), messages);
    }

    /// Make the next `n` connect attempts fail.
    pub fn fail_next_connects(&self, n: u32) {
        self.failing_connects.store(n, Ordering::SeqCst);
    }

    pub fn connect_calls(&self) -> u32 {
        self.connect_calls.load(Ordering::SeqCst)
    }

    pub fn fail_fetches(&self, fail: bool) {
        self.fail_fetches.store(fail, Ordering::SeqCst);
    }

    pub fn fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl ChatTransport for MockTransport {
    async fn connect(&self) -> Result<(), BalcaoError> {
        self.connect_calls.fetch_add(1, Ordering::SeqCst);
        let remaining = self.failing_connects.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failing_connects.store(remaining - 1, Ordering::SeqCst);
            return Err(BalcaoError::channel("conexão simulada falhou"));
        }
        Ok(())
    }

    async fn next_event(&self) -> Result<Option<TransportEvent>, BalcaoError> {
        loop {
            if let Some(event) = self.events.lock().unwrap().pop_front() {
                return Ok(Some(event));
            }
            if self.closed.load(Ordering::SeqCst) {
                return Ok(None);
            }
            self.notify.notified().await;
        }
    }

    async fn send_text(&self, chat_id: &str, body: &str) -> Result<(), BalcaoError> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(BalcaoError::channel("envio simulado falhou"));
        }
        self.sent
            .lock()
            .unwrap()
            .push((chat_id.to_string(), body.to_string()));
        Ok(())
    }

    async fn list_chats(&self) -> Result<Vec<RemoteChat>, BalcaoError> {
        Ok(self.chats.lock().unwrap().clone())
    }

    async fn fetch_messages(
        &self,
        chat_id: &str,
        limit: usize,
    ) -> Result<Vec<RemoteMessage>, BalcaoError> {
        if self.fail_fetches.load(Ordering::SeqCst) {
            return Err(BalcaoError::channel("busca de histórico simulada falhou"));
        }
        let histories = self.histories.lock().unwrap();
        let mut messages = histories.get(chat_id).cloned().unwrap_or_default();
        messages.truncate(limit);
        Ok(messages)
    }

    async fn destroy(&self) -> Result<(), BalcaoError> {
        self.inject(TransportEvent::Disconnected {
            reason: INTENTIONAL_DISCONNECT.to_string(),
        });
        self.close();
        Ok(())
    }
}
