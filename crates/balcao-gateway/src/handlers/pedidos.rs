// SPDX-FileCopyrightText: 2026 Balcao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Order endpoints: listing with filters, lifecycle updates, stats, and
//! the per-day history view.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use balcao_baserow::{NewPedido, PedidoFilter, PedidoUpdate};
use balcao_core::PedidoStatus;

use crate::error::ApiError;
use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub status: Option<PedidoStatus>,
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct StatusBody {
    pub status: PedidoStatus,
}

/// GET /api/pedidos
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Value>, ApiError> {
    let pedidos = state
        .pedidos()?
        .list(PedidoFilter {
            status: query.status,
            limit: query.limit,
        })
        .await?;
    Ok(Json(json!({
        "success": true,
        "pedidos": pedidos,
        "total": pedidos.len(),
    })))
}

/// GET /api/pedidos/{id}
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let pedido = state.pedidos()?.get(id).await?;
    Ok(Json(json!({"success": true, "pedido": pedido})))
}

/// POST /api/pedidos
pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<NewPedido>,
) -> Result<Json<Value>, ApiError> {
    let pedido = state.pedidos()?.create(body).await?;
    Ok(Json(json!({"success": true, "pedido": pedido})))
}

/// PATCH /api/pedidos/{id}/status
pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<StatusBody>,
) -> Result<Json<Value>, ApiError> {
    let pedido = state.pedidos()?.update_status(id, body.status).await?;
    Ok(Json(json!({"success": true, "pedido": pedido})))
}

/// PATCH /api/pedidos/{id}
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<PedidoUpdate>,
) -> Result<Json<Value>, ApiError> {
    let pedido = state.pedidos()?.update(id, body).await?;
    Ok(Json(json!({"success": true, "pedido": pedido})))
}

/// DELETE /api/pedidos/{id}
pub async fn remove(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    state.pedidos()?.delete(id).await?;
    Ok(Json(json!({"success": true, "message": "Pedido removido"})))
}

/// GET /api/pedidos/stats/overview
pub async fn stats(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let stats = state.pedidos()?.stats().await?;
    Ok(Json(json!({"success": true, "stats": stats})))
}

/// GET /api/pedidos/history
pub async fn history(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let history = state.pedidos()?.history().await?;
    Ok(Json(json!({"success": true, "history": history})))
}
