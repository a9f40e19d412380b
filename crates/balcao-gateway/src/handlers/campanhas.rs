// SPDX-FileCopyrightText: 2026 Balcao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Campaign endpoints, including the plain-text feed for the automation.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use balcao_baserow::{CampanhaUpdate, NewCampanha};

use crate::error::ApiError;
use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// `cache=false` bypasses the short-lived list memo.
    #[serde(default)]
    pub cache: Option<String>,
}

/// GET /api/campanhas
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Value>, ApiError> {
    let use_cache = query.cache.as_deref() != Some("false");
    let campanhas = state.campanhas()?.list(use_cache).await?;
    Ok(Json(json!({
        "success": true,
        "campanhas": campanhas,
        "total": campanhas.len(),
    })))
}

/// GET /api/campanhas/texto: plain text for the automation's prompt.
/// Never errors; failures degrade to a fixed fallback sentence.
pub async fn texto(State(state): State<AppState>) -> Result<String, ApiError> {
    Ok(state.campanhas()?.texto_para_ia().await)
}

/// POST /api/campanhas/clear-cache
pub async fn clear_cache(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    state.campanhas()?.clear_cache().await;
    Ok(Json(json!({
        "success": true,
        "message": "Cache limpo com sucesso",
    })))
}

/// POST /api/campanhas
pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<NewCampanha>,
) -> Result<Json<Value>, ApiError> {
    let campanha = state.campanhas()?.create(body).await?;
    Ok(Json(json!({"success": true, "campanha": campanha})))
}

/// PUT /api/campanhas/{id}
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<CampanhaUpdate>,
) -> Result<Json<Value>, ApiError> {
    let campanha = state.campanhas()?.update(id, body).await?;
    Ok(Json(json!({"success": true, "campanha": campanha})))
}

/// DELETE /api/campanhas/{id}
pub async fn remove(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    state.campanhas()?.delete(id).await?;
    Ok(Json(json!({"success": true, "message": "Campanha removida"})))
}
