// SPDX-FileCopyrightText: 2026 Balcao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Messaging bridge endpoints: chats, history, sends, and AI blocking.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use balcao_whatsapp::DEFAULT_MESSAGE_LIMIT;

use crate::error::{bad_request, ApiError};
use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub struct MessagesQuery {
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendBody {
    #[serde(default)]
    pub chat_id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// GET /api/whatsapp/chats
pub async fn chats(State(state): State<AppState>) -> Json<Value> {
    let chats = state.whatsapp.get_chats().await;
    Json(json!({
        "success": true,
        "chats": chats,
        "total": chats.len(),
    }))
}

/// GET /api/whatsapp/chats/{chatId}/messages
pub async fn chat_messages(
    State(state): State<AppState>,
    Path(chat_id): Path<String>,
    Query(query): Query<MessagesQuery>,
) -> Json<Value> {
    let limit = query.limit.unwrap_or(DEFAULT_MESSAGE_LIMIT);
    let messages = state.whatsapp.get_chat_messages(&chat_id, limit).await;
    Json(json!({
        "success": true,
        "chatId": chat_id,
        "messages": messages,
        "total": messages.len(),
    }))
}

/// POST /api/whatsapp/send
pub async fn send(
    State(state): State<AppState>,
    Json(body): Json<SendBody>,
) -> Result<Json<Value>, ApiError> {
    let (Some(chat_id), Some(message)) = (body.chat_id, body.message) else {
        return Err(bad_request("chatId e message são obrigatórios"));
    };
    let sent = state.whatsapp.send_message(&chat_id, &message, false).await?;
    Ok(Json(json!({"success": true, "messageData": sent})))
}

/// POST /api/whatsapp/block-ai/{chatId}
pub async fn block_ai(State(state): State<AppState>, Path(chat_id): Path<String>) -> Json<Value> {
    state.whatsapp.block_ai(&chat_id);
    Json(json!({
        "success": true,
        "message": "IA bloqueada para este chat",
        "chatId": chat_id,
        "blocked": true,
    }))
}

/// POST /api/whatsapp/unblock-ai/{chatId}
pub async fn unblock_ai(
    State(state): State<AppState>,
    Path(chat_id): Path<String>,
) -> Json<Value> {
    state.whatsapp.unblock_ai(&chat_id);
    Json(json!({
        "success": true,
        "message": "IA desbloqueada para este chat",
        "chatId": chat_id,
        "blocked": false,
    }))
}

/// GET /api/whatsapp/ai-status/{chatId}
pub async fn ai_status(State(state): State<AppState>, Path(chat_id): Path<String>) -> Json<Value> {
    let blocked = state.whatsapp.is_blocked(&chat_id);
    Json(json!({
        "success": true,
        "chatId": chat_id,
        "blocked": blocked,
    }))
}

/// GET /api/whatsapp/status
pub async fn status(State(state): State<AppState>) -> Json<Value> {
    let status = state.whatsapp.status();
    let mut body = serde_json::to_value(&status).unwrap_or_else(|_| json!({}));
    if let Some(obj) = body.as_object_mut() {
        obj.insert("success".into(), json!(true));
    }
    Json(body)
}
