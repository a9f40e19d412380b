// SPDX-FileCopyrightText: 2026 Balcao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Spreadsheet endpoints. All of them are scoped by `userId`, since each
//! dashboard user connects their own spreadsheet.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::{bad_request, ApiError};
use crate::server::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectBody {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub spreadsheet_url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserQuery {
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadQuery {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub range: Option<String>,
    #[serde(default)]
    pub sheet_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBody {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub range: Option<String>,
    #[serde(default)]
    pub values: Option<Vec<Vec<String>>>,
    #[serde(default)]
    pub sheet_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddRowBody {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub values: Option<Vec<String>>,
    #[serde(default)]
    pub sheet_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteRowBody {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub sheet_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCellBody {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub cell: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub sheet_name: Option<String>,
}

/// POST /api/sheets/connect
pub async fn connect(
    State(state): State<AppState>,
    Json(body): Json<ConnectBody>,
) -> Result<Json<Value>, ApiError> {
    let (Some(user_id), Some(url)) = (body.user_id, body.spreadsheet_url) else {
        return Err(bad_request("userId e spreadsheetUrl são obrigatórios"));
    };
    let spreadsheet = state.sheets()?.connect(&user_id, &url).await?;
    Ok(Json(json!({"success": true, "spreadsheet": spreadsheet})))
}

/// GET /api/sheets/read
pub async fn read(
    State(state): State<AppState>,
    Query(query): Query<ReadQuery>,
) -> Result<Json<Value>, ApiError> {
    let Some(user_id) = query.user_id else {
        return Err(bad_request("userId é obrigatório"));
    };
    let result = state
        .sheets()?
        .read(&user_id, query.range.as_deref(), query.sheet_name.as_deref())
        .await?;
    Ok(Json(json!({
        "success": true,
        "values": result.values,
        "range": result.range,
    })))
}

/// PUT /api/sheets/update
pub async fn update(
    State(state): State<AppState>,
    Json(body): Json<UpdateBody>,
) -> Result<Json<Value>, ApiError> {
    let (Some(user_id), Some(range), Some(values)) = (body.user_id, body.range, body.values)
    else {
        return Err(bad_request("userId, range e values são obrigatórios"));
    };
    let outcome = state
        .sheets()?
        .write(&user_id, &range, values, body.sheet_name.as_deref())
        .await?;
    Ok(Json(json!({
        "success": true,
        "updatedCells": outcome.updated_cells,
        "updatedRows": outcome.updated_rows,
        "updatedColumns": outcome.updated_columns,
    })))
}

/// POST /api/sheets/add-row
pub async fn add_row(
    State(state): State<AppState>,
    Json(body): Json<AddRowBody>,
) -> Result<Json<Value>, ApiError> {
    let (Some(user_id), Some(values)) = (body.user_id, body.values) else {
        return Err(bad_request("userId e values são obrigatórios"));
    };
    let range = state
        .sheets()?
        .add_row(&user_id, values, body.sheet_name.as_deref())
        .await?;
    Ok(Json(json!({"success": true, "updatedRange": range})))
}

/// DELETE /api/sheets/delete-row/{rowIndex}
pub async fn delete_row(
    State(state): State<AppState>,
    Path(row_index): Path<u64>,
    Json(body): Json<DeleteRowBody>,
) -> Result<Json<Value>, ApiError> {
    let Some(user_id) = body.user_id else {
        return Err(bad_request("userId é obrigatório"));
    };
    state
        .sheets()?
        .delete_row(&user_id, row_index, body.sheet_id.unwrap_or(0))
        .await?;
    Ok(Json(json!({"success": true, "message": "Linha removida"})))
}

/// PUT /api/sheets/update-cell
pub async fn update_cell(
    State(state): State<AppState>,
    Json(body): Json<UpdateCellBody>,
) -> Result<Json<Value>, ApiError> {
    let (Some(user_id), Some(cell), Some(value)) = (body.user_id, body.cell, body.value) else {
        return Err(bad_request("userId, cell e value são obrigatórios"));
    };
    let outcome = state
        .sheets()?
        .update_cell(&user_id, &cell, value, body.sheet_name.as_deref())
        .await?;
    Ok(Json(json!({
        "success": true,
        "updatedCells": outcome.updated_cells,
        "updatedRows": outcome.updated_rows,
        "updatedColumns": outcome.updated_columns,
    })))
}

/// GET /api/sheets/low-stock: header-driven heuristic over the default
/// range; read failures yield an empty list, not an error.
pub async fn low_stock(
    State(state): State<AppState>,
    Query(query): Query<UserQuery>,
) -> Result<Json<Value>, ApiError> {
    let Some(user_id) = query.user_id else {
        return Err(bad_request("userId é obrigatório"));
    };
    let products = state.sheets()?.low_stock(&user_id).await;
    Ok(Json(json!({"success": true, "products": products})))
}

/// GET /api/sheets/status
pub async fn status(
    State(state): State<AppState>,
    Query(query): Query<UserQuery>,
) -> Result<Json<Value>, ApiError> {
    let Some(user_id) = query.user_id else {
        return Err(bad_request("userId é obrigatório"));
    };
    let spreadsheet = state.sheets()?.status(&user_id);
    Ok(Json(json!({
        "success": true,
        "connected": spreadsheet.is_some(),
        "spreadsheet": spreadsheet,
    })))
}

/// POST /api/sheets/disconnect
pub async fn disconnect(
    State(state): State<AppState>,
    Json(body): Json<UserQuery>,
) -> Result<Json<Value>, ApiError> {
    let Some(user_id) = body.user_id else {
        return Err(bad_request("userId é obrigatório"));
    };
    state.sheets()?.disconnect(&user_id);
    Ok(Json(json!({"success": true, "message": "Planilha desconectada"})))
}
