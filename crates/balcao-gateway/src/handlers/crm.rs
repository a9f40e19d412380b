// SPDX-FileCopyrightText: 2026 Balcao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! CRM lead endpoints.

use axum::extract::{Path, State};
use axum::Json;
use serde_json::{json, Value};

use balcao_baserow::{LeadUpdate, NewLead};

use crate::error::ApiError;
use crate::server::AppState;

/// GET /api/crm/status: connectivity probe against the leads table.
/// Always answers 200; failures land in the body so the dashboard can
/// show a diagnostic instead of a broken panel.
pub async fn status(State(state): State<AppState>) -> Json<Value> {
    let leads = match state.leads() {
        Ok(leads) => leads,
        Err(e) => {
            return Json(json!({"success": false, "connected": false, "error": e.to_string()}));
        }
    };

    match leads.list().await {
        Ok(leads) => Json(json!({
            "success": true,
            "connected": true,
            "totalLeads": leads.len(),
        })),
        Err(e) => Json(json!({
            "success": false,
            "connected": false,
            "error": e.to_string(),
        })),
    }
}

/// GET /api/crm/leads
pub async fn list(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let leads = state.leads()?.list().await?;
    Ok(Json(json!({
        "success": true,
        "leads": leads,
        "total": leads.len(),
    })))
}

/// POST /api/crm/leads
pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<NewLead>,
) -> Result<Json<Value>, ApiError> {
    let lead = state.leads()?.create(body).await?;
    Ok(Json(json!({"success": true, "lead": lead})))
}

/// PATCH /api/crm/leads/{id}
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<LeadUpdate>,
) -> Result<Json<Value>, ApiError> {
    let lead = state.leads()?.update(id, body).await?;
    Ok(Json(json!({"success": true, "lead": lead})))
}

/// DELETE /api/crm/leads/{id}
pub async fn remove(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    state.leads()?.delete(id).await?;
    Ok(Json(json!({"success": true, "message": "Lead removido"})))
}
