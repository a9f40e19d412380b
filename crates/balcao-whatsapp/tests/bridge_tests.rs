// SPDX-FileCopyrightText: 2026 Balcao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bridge lifecycle tests driven through [`MockTransport`].

use std::sync::Arc;
use std::time::Duration;

use balcao_bus::{events, EventBus};
use balcao_config::model::WhatsappConfig;
use balcao_core::{BalcaoError, ContactInfo, Direction, LastMessage};
use balcao_test_utils::MockTransport;
use balcao_whatsapp::{
    InboundMessage, RemoteChat, RemoteMessage, TransportEvent, WhatsappBridge,
    AUTOMATION_FALLBACK, DEFAULT_MESSAGE_LIMIT, INTENTIONAL_DISCONNECT,
};
use tokio::sync::broadcast;
use wiremock::matchers::{body_partial_json, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_config() -> WhatsappConfig {
    WhatsappConfig {
        enabled: true,
        ..WhatsappConfig::default()
    }
}

fn inbound(chat_id: &str, body: &str) -> InboundMessage {
    InboundMessage {
        id: "msg-1".into(),
        chat_id: chat_id.into(),
        body: body.into(),
        timestamp: 1_767_200_000,
        has_media: false,
        kind: "chat".into(),
        sender_name: Some("Maria".into()),
        sender_number: "5511999999999".into(),
    }
}

async fn next_named(
    rx: &mut broadcast::Receiver<balcao_bus::BusEvent>,
    name: &str,
) -> balcao_bus::BusEvent {
    loop {
        let ev = tokio::time::timeout(Duration::from_secs(120), rx.recv())
            .await
            .expect("timed out waiting for bus event")
            .expect("bus closed");
        if ev.event == name {
            return ev;
        }
    }
}

fn spawn_bridge(
    config: WhatsappConfig,
    transport: Arc<MockTransport>,
) -> (Arc<WhatsappBridge>, EventBus) {
    let bus = EventBus::new();
    let bridge = Arc::new(WhatsappBridge::new(&config, transport, bus.clone()));
    tokio::spawn(bridge.clone().run());
    (bridge, bus)
}

#[tokio::test]
async fn qr_and_ready_reach_the_bus() {
    let transport = Arc::new(MockTransport::new());
    let (bridge, bus) = spawn_bridge(test_config(), transport.clone());
    let mut rx = bus.subscribe();

    transport.inject(TransportEvent::Qr("qr-data".into()));
    let ev = next_named(&mut rx, events::WHATSAPP_QR).await;
    assert_eq!(ev.payload["qr"], "qr-data");

    transport.inject(TransportEvent::Ready);
    let ev = next_named(&mut rx, events::WHATSAPP_READY).await;
    assert_eq!(ev.payload["status"], "connected");
    assert_eq!(ev.payload["forced"], false);
    assert!(bridge.is_ready());
}

#[tokio::test(start_paused = true)]
async fn ready_is_forced_after_the_grace_period() {
    let transport = Arc::new(MockTransport::new());
    let (bridge, bus) = spawn_bridge(test_config(), transport.clone());
    let mut rx = bus.subscribe();

    transport.inject(TransportEvent::Authenticated);
    let ev = next_named(&mut rx, events::WHATSAPP_READY).await;
    assert_eq!(ev.payload["forced"], true);
    assert!(bridge.is_ready());
}

#[tokio::test]
async fn real_ready_wins_over_the_forced_timer() {
    let transport = Arc::new(MockTransport::new());
    let (_bridge, bus) = spawn_bridge(test_config(), transport.clone());
    let mut rx = bus.subscribe();

    transport.inject(TransportEvent::Authenticated);
    transport.inject(TransportEvent::Ready);
    let ev = next_named(&mut rx, events::WHATSAPP_READY).await;
    assert_eq!(ev.payload["forced"], false);
}

#[tokio::test(start_paused = true)]
async fn unexpected_disconnect_triggers_recovery_until_exhausted() {
    let transport = Arc::new(MockTransport::new());
    let (bridge, bus) = spawn_bridge(test_config(), transport.clone());
    let mut rx = bus.subscribe();

    transport.inject(TransportEvent::Ready);
    next_named(&mut rx, events::WHATSAPP_READY).await;

    transport.fail_next_connects(10);
    transport.inject(TransportEvent::Disconnected {
        reason: "CONFLICT".into(),
    });
    next_named(&mut rx, events::WHATSAPP_DISCONNECTED).await;

    let ev = next_named(&mut rx, events::WHATSAPP_RECOVERY_EXHAUSTED).await;
    assert_eq!(ev.payload["attempts"], 5);
    assert!(!bridge.is_ready());
    // Initial connect plus five failed recovery attempts.
    assert_eq!(transport.connect_calls(), 6);
}

#[tokio::test(start_paused = true)]
async fn ready_after_exhaustion_is_ignored() {
    let transport = Arc::new(MockTransport::new());
    let (bridge, bus) = spawn_bridge(test_config(), transport.clone());
    let mut rx = bus.subscribe();

    transport.fail_next_connects(10);
    transport.inject(TransportEvent::Disconnected {
        reason: "CONFLICT".into(),
    });
    next_named(&mut rx, events::WHATSAPP_RECOVERY_EXHAUSTED).await;

    // A late ready from the dead transport must not resurrect the
    // session or announce it on the bus.
    transport.inject(TransportEvent::Ready);
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert!(!bridge.is_ready());
    assert_eq!(bridge.status().status, "failed");
}

#[tokio::test(start_paused = true)]
async fn intentional_disconnect_skips_recovery() {
    let transport = Arc::new(MockTransport::new());
    let (_bridge, bus) = spawn_bridge(test_config(), transport.clone());
    let mut rx = bus.subscribe();

    transport.inject(TransportEvent::Ready);
    next_named(&mut rx, events::WHATSAPP_READY).await;

    transport.inject(TransportEvent::Disconnected {
        reason: INTENTIONAL_DISCONNECT.into(),
    });
    next_named(&mut rx, events::WHATSAPP_DISCONNECTED).await;

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(transport.connect_calls(), 1);
}

#[tokio::test]
async fn blocked_chat_goes_straight_to_human() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .expect(0)
        .mount(&server)
        .await;

    let mut config = test_config();
    config.automation_webhook_url = Some(server.uri());
    let transport = Arc::new(MockTransport::new());
    let (bridge, bus) = spawn_bridge(config, transport.clone());
    let mut rx = bus.subscribe();

    transport.inject(TransportEvent::Ready);
    next_named(&mut rx, events::WHATSAPP_READY).await;

    bridge.block_ai("5511999999999@c.us");
    next_named(&mut rx, events::WHATSAPP_AI_BLOCKED).await;

    transport.inject(TransportEvent::Message(inbound(
        "5511999999999@c.us",
        "preciso de ajuda",
    )));

    let msg = next_named(&mut rx, events::WHATSAPP_MESSAGE).await;
    assert_eq!(msg.payload["chatId"], "5511999999999@c.us");

    let ev = next_named(&mut rx, events::WHATSAPP_HUMAN_NEEDED).await;
    assert_eq!(ev.payload["reason"], "IA bloqueada manualmente");
    assert_eq!(ev.payload["contactName"], "Maria");
    assert!(transport.sent_messages().is_empty());
}

#[tokio::test]
async fn automation_reply_is_sent_back_to_the_chat() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(serde_json::json!({
            "message": "qual o horário de funcionamento?"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "response": "Funcionamos de 8h às 18h."
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = test_config();
    config.automation_webhook_url = Some(server.uri());
    let transport = Arc::new(MockTransport::new());
    let (_bridge, bus) = spawn_bridge(config, transport.clone());
    let mut rx = bus.subscribe();

    transport.inject(TransportEvent::Ready);
    next_named(&mut rx, events::WHATSAPP_READY).await;

    transport.inject(TransportEvent::Message(inbound(
        "5511999999999@c.us",
        "qual o horário de funcionamento?",
    )));

    let sent = next_named(&mut rx, events::WHATSAPP_MESSAGE_SENT).await;
    assert_eq!(sent.payload["message"], "Funcionamos de 8h às 18h.");
    assert_eq!(sent.payload["fromBot"], true);
    assert_eq!(
        transport.sent_messages(),
        vec![(
            "5511999999999@c.us".to_string(),
            "Funcionamos de 8h às 18h.".to_string()
        )]
    );
}

#[tokio::test]
async fn handoff_request_notifies_and_sends_wait_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "solicitar_atendente": true,
            "mensagem": "Aguarde um momento."
        })))
        .mount(&server)
        .await;

    let mut config = test_config();
    config.automation_webhook_url = Some(server.uri());
    let transport = Arc::new(MockTransport::new());
    let (_bridge, bus) = spawn_bridge(config, transport.clone());
    let mut rx = bus.subscribe();

    transport.inject(TransportEvent::Ready);
    next_named(&mut rx, events::WHATSAPP_READY).await;

    transport.inject(TransportEvent::Message(inbound(
        "5511999999999@c.us",
        "quero falar com uma pessoa",
    )));

    let ev = next_named(&mut rx, events::WHATSAPP_HUMAN_NEEDED).await;
    assert_eq!(ev.payload["reason"], "Solicitado pela IA");
    assert_eq!(ev.payload["aiMessage"], "Aguarde um momento.");

    next_named(&mut rx, events::WHATSAPP_MESSAGE_SENT).await;
    assert_eq!(
        transport.sent_messages(),
        vec![(
            "5511999999999@c.us".to_string(),
            "Aguarde um momento.".to_string()
        )]
    );
}

#[tokio::test]
async fn automation_failure_sends_apology_and_flags_human() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let mut config = test_config();
    config.automation_webhook_url = Some(server.uri());
    let transport = Arc::new(MockTransport::new());
    let (_bridge, bus) = spawn_bridge(config, transport.clone());
    let mut rx = bus.subscribe();

    transport.inject(TransportEvent::Ready);
    next_named(&mut rx, events::WHATSAPP_READY).await;

    transport.inject(TransportEvent::Message(inbound(
        "5511999999999@c.us",
        "oi",
    )));

    let ev = next_named(&mut rx, events::WHATSAPP_HUMAN_NEEDED).await;
    assert_eq!(ev.payload["reason"], "Erro na IA");
    assert_eq!(
        transport.sent_messages(),
        vec![("5511999999999@c.us".to_string(), AUTOMATION_FALLBACK.to_string())]
    );
}

#[tokio::test]
async fn send_message_requires_a_ready_session() {
    let transport = Arc::new(MockTransport::new());
    let bus = EventBus::new();
    let bridge = Arc::new(WhatsappBridge::new(&test_config(), transport, bus));

    let err = bridge.send_message("a@c.us", "oi", false).await.unwrap_err();
    assert!(matches!(err, BalcaoError::Channel { .. }));
}

#[tokio::test]
async fn chats_are_sorted_by_last_activity() {
    let transport = Arc::new(MockTransport::new());
    transport.set_chats(vec![
        RemoteChat {
            id: "old@c.us".into(),
            name: "Antigo".into(),
            is_group: false,
            unread_count: 0,
            last_message: Some(LastMessage {
                body: "tchau".into(),
                timestamp: 100,
            }),
            contact: ContactInfo::default(),
        },
        RemoteChat {
            id: "new@c.us".into(),
            name: "Recente".into(),
            is_group: false,
            unread_count: 2,
            last_message: Some(LastMessage {
                body: "oi".into(),
                timestamp: 200,
            }),
            contact: ContactInfo::default(),
        },
    ]);
    let (bridge, bus) = spawn_bridge(test_config(), transport.clone());
    let mut rx = bus.subscribe();

    transport.inject(TransportEvent::Ready);
    next_named(&mut rx, events::WHATSAPP_READY).await;

    let chats = bridge.get_chats().await;
    assert_eq!(chats.len(), 2);
    assert_eq!(chats[0].id, "new@c.us");
    assert_eq!(chats[1].id, "old@c.us");
}

#[tokio::test]
async fn get_chats_before_ready_serves_the_cache_only() {
    let transport = Arc::new(MockTransport::new());
    let bus = EventBus::new();
    let bridge = Arc::new(WhatsappBridge::new(&test_config(), transport, bus));

    assert!(bridge.get_chats().await.is_empty());
}

#[tokio::test]
async fn incoming_message_moves_chat_to_the_top() {
    let transport = Arc::new(MockTransport::new());
    transport.set_chats(vec![
        RemoteChat {
            id: "first@c.us".into(),
            name: "Primeiro".into(),
            is_group: false,
            unread_count: 0,
            last_message: Some(LastMessage {
                body: "a".into(),
                timestamp: 300,
            }),
            contact: ContactInfo::default(),
        },
        RemoteChat {
            id: "second@c.us".into(),
            name: "Segundo".into(),
            is_group: false,
            unread_count: 0,
            last_message: Some(LastMessage {
                body: "b".into(),
                timestamp: 200,
            }),
            contact: ContactInfo::default(),
        },
    ]);
    let (bridge, bus) = spawn_bridge(test_config(), transport.clone());
    let mut rx = bus.subscribe();

    transport.inject(TransportEvent::Ready);
    next_named(&mut rx, events::WHATSAPP_READY).await;
    bridge.get_chats().await;

    transport.inject(TransportEvent::Message(inbound("second@c.us", "olá")));
    next_named(&mut rx, events::WHATSAPP_MESSAGE).await;

    let chats = bridge.cached_chats();
    assert_eq!(chats[0].id, "second@c.us");
    assert_eq!(chats[0].last_message.as_ref().unwrap().body, "olá");
}

#[tokio::test]
async fn history_falls_back_to_local_store_on_fetch_failure() {
    let transport = Arc::new(MockTransport::new());
    transport.fail_fetches(true);
    let (bridge, bus) = spawn_bridge(test_config(), transport.clone());
    let mut rx = bus.subscribe();

    transport.inject(TransportEvent::Ready);
    next_named(&mut rx, events::WHATSAPP_READY).await;

    transport.inject(TransportEvent::Message(inbound("a@c.us", "guardada")));
    next_named(&mut rx, events::WHATSAPP_MESSAGE).await;

    let messages = bridge.get_chat_messages("a@c.us", DEFAULT_MESSAGE_LIMIT).await;
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].message, "guardada");
}

#[tokio::test]
async fn history_is_returned_in_chronological_order() {
    let transport = Arc::new(MockTransport::new());
    transport.set_history(
        "a@c.us",
        vec![
            RemoteMessage {
                id: "2".into(),
                body: "segunda".into(),
                timestamp: 200,
                from_me: true,
                has_media: false,
                kind: "chat".into(),
            },
            RemoteMessage {
                id: "1".into(),
                body: "primeira".into(),
                timestamp: 100,
                from_me: false,
                has_media: false,
                kind: "chat".into(),
            },
        ],
    );
    let (bridge, bus) = spawn_bridge(test_config(), transport.clone());
    let mut rx = bus.subscribe();

    transport.inject(TransportEvent::Ready);
    next_named(&mut rx, events::WHATSAPP_READY).await;

    let messages = bridge.get_chat_messages("a@c.us", DEFAULT_MESSAGE_LIMIT).await;
    assert_eq!(messages[0].message, "primeira");
    assert_eq!(messages[0].direction, Direction::Incoming);
    assert_eq!(messages[1].message, "segunda");
    assert_eq!(messages[1].direction, Direction::Outgoing);
}

#[tokio::test]
async fn status_reports_blocked_and_cached_counts() {
    let transport = Arc::new(MockTransport::new());
    let (bridge, bus) = spawn_bridge(test_config(), transport.clone());
    let mut rx = bus.subscribe();

    let status = bridge.status();
    assert!(!status.is_ready);
    assert_eq!(status.status, "disconnected");

    transport.inject(TransportEvent::Ready);
    next_named(&mut rx, events::WHATSAPP_READY).await;
    bridge.block_ai("a@c.us");

    let status = bridge.status();
    assert!(status.is_ready);
    assert_eq!(status.status, "connected");
    assert_eq!(status.blocked_chats, 1);
}
