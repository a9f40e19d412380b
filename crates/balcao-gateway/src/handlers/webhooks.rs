// SPDX-FileCopyrightText: 2026 Balcao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Inbound webhooks from the automation flows.
//!
//! These carry no auth; they are reachable only from the automation
//! network. Validation happens before any external call so malformed
//! payloads are rejected cheaply.

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};

use balcao_baserow::{NewLead, NewPedido};
use balcao_bus::events;

use crate::error::{bad_request, ApiError};
use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub struct PedidoWebhook {
    #[serde(default)]
    pub cliente: Option<String>,
    #[serde(default)]
    pub itens: Value,
    #[serde(default)]
    pub total: Value,
    #[serde(default)]
    pub endereco: Option<String>,
    #[serde(default)]
    pub whatsapp: Option<String>,
    #[serde(default)]
    pub data_hora: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AtendenteWebhook {
    #[serde(default)]
    pub chat_id: Option<String>,
    #[serde(default)]
    pub cliente: Option<String>,
    #[serde(default)]
    pub mensagem: Option<String>,
    #[serde(default)]
    pub contexto: Option<Value>,
}

/// POST /webhook/pedido: a new order from the automation. Persists the
/// order and notifies every open dashboard.
pub async fn pedido(
    State(state): State<AppState>,
    Json(body): Json<PedidoWebhook>,
) -> Result<Json<Value>, ApiError> {
    let cliente = body.cliente.clone().filter(|c| !c.is_empty());
    let has_itens = !body.itens.is_null();
    let has_total = !body.total.is_null();
    let (Some(cliente), true, true) = (cliente, has_itens, has_total) else {
        return Err(bad_request(
            "Dados incompletos. Campos obrigatórios: cliente, itens, total",
        ));
    };

    let created = state
        .pedidos()?
        .create(NewPedido {
            cliente: Some(cliente.clone()),
            itens: body.itens,
            total: body.total,
            endereco: body.endereco,
            whatsapp: body.whatsapp,
            data_hora: body.data_hora,
            status_pedido: None,
            status: None,
            origem: None,
        })
        .await?;

    let pedido_json = serde_json::to_value(&created).unwrap_or_default();
    state.bus.publish(events::NOVO_PEDIDO, pedido_json.clone());
    state.bus.publish(
        events::NOTIFICATION,
        json!({
            "type": "novo-pedido",
            "title": "Novo Pedido Recebido!",
            "message": format!("Pedido de {cliente} - R$ {}", created.total),
            "pedido": pedido_json,
        }),
    );

    Ok(Json(json!({
        "success": true,
        "message": format!("Sucesso! O pedido de {cliente} foi recebido e salvo."),
        "pedidoId": created.id,
        "timestamp": Utc::now().to_rfc3339(),
    })))
}

/// POST /webhook/chamar-atendente: the automation wants a human in the
/// loop. Pure notification, nothing is persisted.
pub async fn chamar_atendente(
    State(state): State<AppState>,
    Json(body): Json<AtendenteWebhook>,
) -> Json<Value> {
    let cliente = body.cliente.clone().unwrap_or_else(|| "Cliente".to_string());

    state.bus.publish(
        events::WHATSAPP_HUMAN_NEEDED,
        json!({
            "chatId": body.chat_id,
            "cliente": cliente,
            "mensagem": body.mensagem,
            "contexto": body.contexto,
            "timestamp": Utc::now().to_rfc3339(),
        }),
    );
    state.bus.publish(
        events::NOTIFICATION,
        json!({
            "type": "atendimento-solicitado",
            "title": "Atendente Necessário",
            "message": format!("{cliente} precisa de atendimento humano"),
            "chatId": body.chat_id,
            "priority": "high",
        }),
    );

    Json(json!({
        "success": true,
        "message": "Atendente notificado com sucesso",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

/// POST /webhook/crm/lead: a new lead captured by the automation.
pub async fn crm_lead(
    State(state): State<AppState>,
    Json(body): Json<NewLead>,
) -> Result<Json<Value>, ApiError> {
    let lead = state.leads()?.create(body).await?;

    state.bus.publish(
        events::NOTIFICATION,
        json!({
            "type": "novo-lead",
            "title": "Novo Lead Capturado!",
            "message": format!("Lead de {}", lead.nome),
            "lead": serde_json::to_value(&lead).unwrap_or_default(),
        }),
    );

    Ok(Json(json!({
        "success": true,
        "leadId": lead.id,
        "timestamp": Utc::now().to_rfc3339(),
    })))
}
