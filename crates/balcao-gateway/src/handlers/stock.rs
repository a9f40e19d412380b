// SPDX-FileCopyrightText: 2026 Balcao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Inventory endpoints backed by the product store.

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use balcao_stock::{NewProduto, ProdutoUpdate};

use crate::error::ApiError;
use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub struct QuantityBody {
    pub quantity: i64,
}

/// GET /api/stock/products
pub async fn list(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let products = state.stock()?.list().await?;
    Ok(Json(json!({"success": true, "products": products})))
}

/// POST /api/stock/products
pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<NewProduto>,
) -> Result<Json<Value>, ApiError> {
    let product = state.stock()?.create(body).await?;
    Ok(Json(json!({"success": true, "product": product})))
}

/// PATCH /api/stock/products/{id}/quantity
pub async fn update_quantity(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<QuantityBody>,
) -> Result<Json<Value>, ApiError> {
    let product = state.stock()?.update_quantity(id, body.quantity).await?;
    Ok(Json(json!({"success": true, "product": product})))
}

/// PUT /api/stock/products/{id}
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<ProdutoUpdate>,
) -> Result<Json<Value>, ApiError> {
    let product = state.stock()?.update(id, body).await?;
    Ok(Json(json!({"success": true, "product": product})))
}

/// DELETE /api/stock/products/{id}
pub async fn remove(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    state.stock()?.delete(id).await?;
    Ok(Json(json!({"success": true, "message": "Produto removido"})))
}

/// GET /api/stock/low-stock
pub async fn low_stock(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let products = state.stock()?.low_stock().await?;
    Ok(Json(json!({"success": true, "products": products})))
}

/// GET /api/stock/status: connectivity probe, always 200.
pub async fn status(State(state): State<AppState>) -> Json<Value> {
    let stock = match state.stock() {
        Ok(stock) => stock,
        Err(e) => {
            return Json(json!({"success": false, "connected": false, "error": e.to_string()}));
        }
    };

    let status = stock.status().await;
    Json(json!({
        "success": status.connected,
        "connected": status.connected,
        "table": status.table,
        "error": status.error,
    }))
}
