// SPDX-FileCopyrightText: 2026 Balcao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Client for the automation webhook that answers incoming messages.
//!
//! The webhook receives every unblocked inbound message and replies with an
//! optional answer plus an optional hand-off request. The payload shape is
//! fixed by the automation flows already deployed against it.

use std::time::Duration;

use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use balcao_core::BalcaoError;

/// One call per inbound message, bounded by the configured timeout.
#[derive(Debug, Clone)]
pub struct AutomationClient {
    http: reqwest::Client,
    webhook_url: String,
    timeout: Duration,
}

/// The webhook's verdict for one inbound message.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AutomationReply {
    /// Answer to send back to the contact, if any.
    #[serde(default)]
    pub response: Option<String>,
    /// The automation wants a human to take over this chat.
    #[serde(default)]
    pub solicitar_atendente: bool,
    /// Message to send alongside a hand-off request ("aguarde um momento").
    #[serde(default)]
    pub mensagem: Option<String>,
}

impl AutomationClient {
    pub fn new(webhook_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            http: reqwest::Client::new(),
            webhook_url: webhook_url.into(),
            timeout,
        }
    }

    /// Forward an inbound message and await the automation's reply.
    pub async fn ask(
        &self,
        chat_id: &str,
        body: &str,
        contact_name: &str,
        contact_number: &str,
    ) -> Result<AutomationReply, BalcaoError> {
        let payload = json!({
            "data": { "key": { "remoteJid": chat_id } },
            "message": body,
            "contact": { "name": contact_name, "number": contact_number },
            "timestamp": Utc::now().to_rfc3339(),
        });

        let resp = self
            .http
            .post(&self.webhook_url)
            .timeout(self.timeout)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    BalcaoError::Timeout {
                        duration: self.timeout,
                    }
                } else {
                    BalcaoError::Channel {
                        message: "falha ao chamar o webhook de automação".into(),
                        source: Some(Box::new(e)),
                    }
                }
            })?;

        if !resp.status().is_success() {
            return Err(BalcaoError::channel(format!(
                "webhook de automação respondeu {}",
                resp.status()
            )));
        }

        resp.json::<AutomationReply>()
            .await
            .map_err(|e| BalcaoError::Channel {
                message: "resposta inválida do webhook de automação".into(),
                source: Some(Box::new(e)),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn forwards_message_with_contact_envelope() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/webhook/agente"))
            .and(body_partial_json(json!({
                "data": { "key": { "remoteJid": "5511999999999@c.us" } },
                "message": "quero fazer um pedido",
                "contact": { "name": "Maria", "number": "5511999999999" },
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "response": "Claro! O que você gostaria?"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = AutomationClient::new(
            format!("{}/webhook/agente", server.uri()),
            Duration::from_secs(30),
        );
        let reply = client
            .ask(
                "5511999999999@c.us",
                "quero fazer um pedido",
                "Maria",
                "5511999999999",
            )
            .await
            .unwrap();

        assert_eq!(reply.response.as_deref(), Some("Claro! O que você gostaria?"));
        assert!(!reply.solicitar_atendente);
        assert!(reply.mensagem.is_none());
    }

    #[tokio::test]
    async fn parses_handoff_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "solicitar_atendente": true,
                "mensagem": "Um atendente irá te ajudar em instantes."
            })))
            .mount(&server)
            .await;

        let client = AutomationClient::new(server.uri(), Duration::from_secs(30));
        let reply = client.ask("a@c.us", "falar com humano", "Ana", "55").await.unwrap();

        assert!(reply.response.is_none());
        assert!(reply.solicitar_atendente);
        assert_eq!(
            reply.mensagem.as_deref(),
            Some("Um atendente irá te ajudar em instantes.")
        );
    }

    #[tokio::test]
    async fn server_error_is_a_channel_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = AutomationClient::new(server.uri(), Duration::from_secs(30));
        let err = client.ask("a@c.us", "oi", "Ana", "55").await.unwrap_err();
        assert!(matches!(err, BalcaoError::Channel { .. }));
    }

    #[tokio::test]
    async fn empty_body_defaults_to_no_action() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;

        let client = AutomationClient::new(server.uri(), Duration::from_secs(30));
        let reply = client.ask("a@c.us", "oi", "Ana", "55").await.unwrap();
        assert!(reply.response.is_none());
        assert!(!reply.solicitar_atendente);
    }
}
