// SPDX-FileCopyrightText: 2026 Balcao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain records mirrored from the external stores.
//!
//! None of these are authoritative: leads, orders, and campaigns live in the
//! low-code database, products in the Postgres service, chat sessions in the
//! messaging platform. The structs here are the frontend-facing shapes.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Lead pipeline status.
///
/// Serialized lowercase on the wire and when read back from the external
/// store; written to the external store with the first letter capitalized
/// (see [`LeadStatus::external`]). The asymmetry matches the store's column
/// values and must be preserved, otherwise status filters silently miss.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum LeadStatus {
    #[default]
    Novo,
    Contatado,
    Qualificado,
    Proposta,
    Fechado,
    Perdido,
}

impl LeadStatus {
    /// The capitalized form stored in the external table.
    pub fn external(&self) -> &'static str {
        match self {
            LeadStatus::Novo => "Novo",
            LeadStatus::Contatado => "Contatado",
            LeadStatus::Qualificado => "Qualificado",
            LeadStatus::Proposta => "Proposta",
            LeadStatus::Fechado => "Fechado",
            LeadStatus::Perdido => "Perdido",
        }
    }
}

/// Order lifecycle status.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum PedidoStatus {
    #[default]
    Pendente,
    Processando,
    Concluido,
    Cancelado,
}

/// A CRM lead row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lead {
    pub id: i64,
    pub nome: String,
    pub telefone: String,
    pub email: String,
    pub status: LeadStatus,
    pub origem: String,
    pub notas: String,
    pub data: String,
}

/// An order row.
///
/// `data_hora` is a locale-formatted string, not a strict ISO date; the
/// history aggregation tolerates both slash-delimited and parseable formats.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pedido {
    pub id: i64,
    pub cliente: String,
    pub itens: String,
    pub total: f64,
    pub endereco: String,
    pub whatsapp: String,
    pub data_hora: String,
    pub status: PedidoStatus,
    pub origem: String,
}

/// A marketing campaign row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Campanha {
    pub id: i64,
    pub nome: String,
    pub descricao: String,
    pub link: String,
    pub ativa: bool,
    pub data_criacao: String,
}

/// An inventory item.
///
/// `price` is kept as the display string the store holds (locale decimal
/// separator), never parsed server-side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Produto {
    pub id: i64,
    pub name: String,
    pub quantity: i64,
    pub minimum_stock: i64,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl Produto {
    /// Low-stock predicate: quantity strictly below the per-item threshold.
    pub fn is_low_stock(&self) -> bool {
        self.quantity < self.minimum_stock
    }
}

/// Order summary counters for the dashboard overview.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PedidoStats {
    pub total: usize,
    pub pendentes: usize,
    pub processando: usize,
    pub concluidos: usize,
    pub cancelados: usize,
    pub faturamento: f64,
}

/// One calendar-date bucket of the order history view.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryBucket {
    pub date: String,
    #[serde(rename = "totalPedidos")]
    pub total_pedidos: usize,
    pub faturamento: f64,
    pub pedidos: Vec<Pedido>,
}

/// Message direction relative to this system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Incoming,
    Outgoing,
}

/// A chat message, either relayed live or fetched from the platform history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    #[serde(rename = "chatId")]
    pub chat_id: String,
    #[serde(rename = "contactName", default, skip_serializing_if = "Option::is_none")]
    pub contact_name: Option<String>,
    #[serde(rename = "contactNumber", default, skip_serializing_if = "Option::is_none")]
    pub contact_number: Option<String>,
    pub message: String,
    pub timestamp: String,
    pub direction: Direction,
    #[serde(rename = "fromBot")]
    pub from_bot: bool,
    #[serde(rename = "hasMedia")]
    pub has_media: bool,
    #[serde(rename = "type")]
    pub kind: String,
}

/// Contact metadata attached to a chat session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContactInfo {
    pub number: String,
    pub pushname: String,
    #[serde(rename = "isMyContact")]
    pub is_my_contact: bool,
    #[serde(rename = "profilePicUrl", default, skip_serializing_if = "Option::is_none")]
    pub profile_pic_url: Option<String>,
}

/// Preview of the most recent message in a chat.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LastMessage {
    pub body: String,
    /// Unix seconds, matching the platform's chat-list ordering key.
    pub timestamp: i64,
}

/// A chat session as surfaced to the frontend.
///
/// Ephemeral: rebuilt from the messaging platform's live chat list. The
/// only state this system owns is `ai_blocked`, held in memory and lost on
/// restart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSummary {
    pub id: String,
    pub name: String,
    #[serde(rename = "isGroup")]
    pub is_group: bool,
    #[serde(rename = "unreadCount")]
    pub unread_count: u32,
    #[serde(rename = "lastMessage")]
    pub last_message: Option<LastMessage>,
    #[serde(rename = "aiBlocked")]
    pub ai_blocked: bool,
    pub contact: ContactInfo,
}
