// SPDX-FileCopyrightText: 2026 Balcao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Spreadsheet adapter with per-user connections and a short-lived read
//! cache.
//!
//! Each dashboard user connects at most one spreadsheet by URL; reads are
//! cached per `(user, spreadsheet, range)` for thirty seconds and any write
//! drops every cached range of that user. Write operations publish
//! `sheets:*` events so open dashboards refresh.

use std::sync::LazyLock;
use std::time::{Duration, Instant};

use balcao_bus::{events, EventBus};
use balcao_core::BalcaoError;
use dashmap::DashMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info};

/// Reads younger than this are served from cache.
const CACHE_TTL: Duration = Duration::from_secs(30);

/// Range used when the caller does not name one.
const DEFAULT_RANGE: &str = "A1:Z1000";

static SPREADSHEET_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/d/([a-zA-Z0-9-_]+)").unwrap());

/// One tab of a connected spreadsheet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetTab {
    pub id: i64,
    pub title: String,
    pub index: i64,
}

/// A user's connected spreadsheet.
#[derive(Debug, Clone, Serialize)]
pub struct SpreadsheetInfo {
    pub id: String,
    pub title: String,
    pub sheets: Vec<SheetTab>,
    pub url: String,
    #[serde(rename = "connectedAt")]
    pub connected_at: String,
}

/// A range read: row-major cell values plus the resolved range.
#[derive(Debug, Clone, Serialize)]
pub struct ReadResult {
    pub values: Vec<Vec<String>>,
    pub range: String,
}

/// Outcome of a range write.
#[derive(Debug, Clone, Serialize)]
pub struct WriteOutcome {
    #[serde(rename = "updatedCells")]
    pub updated_cells: u64,
    #[serde(rename = "updatedRows")]
    pub updated_rows: u64,
    #[serde(rename = "updatedColumns")]
    pub updated_columns: u64,
}

/// One low-stock row from the inventory heuristic.
#[derive(Debug, Clone, Serialize)]
pub struct LowStockItem {
    /// 1-based spreadsheet row (header is row 1).
    #[serde(rename = "rowIndex")]
    pub row_index: usize,
    pub name: String,
    pub quantity: i64,
    pub minimum: i64,
    pub row: Vec<String>,
}

#[derive(Clone)]
struct CachedRange {
    at: Instant,
    values: Vec<Vec<String>>,
    range: String,
}

#[derive(Debug, Deserialize)]
struct SpreadsheetMeta {
    properties: SpreadsheetProps,
    #[serde(default)]
    sheets: Vec<SheetMeta>,
}

#[derive(Debug, Deserialize)]
struct SpreadsheetProps {
    title: String,
}

#[derive(Debug, Deserialize)]
struct SheetMeta {
    properties: SheetProps,
}

#[derive(Debug, Deserialize)]
struct SheetProps {
    #[serde(rename = "sheetId")]
    sheet_id: i64,
    title: String,
    index: i64,
}

#[derive(Debug, Deserialize)]
struct ValuesResponse {
    #[serde(default)]
    values: Vec<Vec<String>>,
    #[serde(default)]
    range: String,
}

#[derive(Debug, Deserialize)]
struct UpdateResponse {
    #[serde(rename = "updatedCells", default)]
    updated_cells: u64,
    #[serde(rename = "updatedRows", default)]
    updated_rows: u64,
    #[serde(rename = "updatedColumns", default)]
    updated_columns: u64,
}

#[derive(Debug, Deserialize)]
struct AppendResponse {
    updates: AppendUpdates,
}

#[derive(Debug, Deserialize)]
struct AppendUpdates {
    #[serde(rename = "updatedRange", default)]
    updated_range: String,
}

pub struct SheetsService {
    http: reqwest::Client,
    base_url: String,
    api_token: String,
    bus: EventBus,
    connections: DashMap<String, SpreadsheetInfo>,
    cache: DashMap<String, CachedRange>,
}

impl SheetsService {
    pub fn new(base_url: String, api_token: String, bus: EventBus) -> Result<Self, BalcaoError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| BalcaoError::Upstream {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_token,
            bus,
            connections: DashMap::new(),
            cache: DashMap::new(),
        })
    }

    /// Overrides the base URL (for testing with wiremock).
    #[cfg(test)]
    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    /// Pull the spreadsheet id out of a sharing URL. Tolerates stray
    /// quotes and whitespace around the pasted URL.
    pub fn extract_spreadsheet_id(url: &str) -> Result<String, BalcaoError> {
        let clean = url.trim().trim_matches(|c| c == '\'' || c == '"');
        SPREADSHEET_ID_RE
            .captures(clean)
            .map(|c| c[1].to_string())
            .ok_or_else(|| BalcaoError::Validation("URL inválida da planilha".into()))
    }

    /// Connect a user to a spreadsheet, replacing any previous connection.
    pub async fn connect(
        &self,
        user_id: &str,
        spreadsheet_url: &str,
    ) -> Result<SpreadsheetInfo, BalcaoError> {
        let spreadsheet_id = Self::extract_spreadsheet_id(spreadsheet_url)?;
        info!(user = user_id, spreadsheet = %spreadsheet_id, "connecting spreadsheet");

        let response = self
            .http
            .get(format!("{}/v4/spreadsheets/{spreadsheet_id}", self.base_url))
            .bearer_auth(&self.api_token)
            .send()
            .await
            .map_err(|e| BalcaoError::Upstream {
                message: format!("spreadsheet metadata request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let response = check_status(response).await?;
        let meta: SpreadsheetMeta =
            response.json().await.map_err(|e| BalcaoError::Upstream {
                message: format!("failed to parse spreadsheet metadata: {e}"),
                source: Some(Box::new(e)),
            })?;

        let info = SpreadsheetInfo {
            id: spreadsheet_id,
            title: meta.properties.title,
            sheets: meta
                .sheets
                .into_iter()
                .map(|s| SheetTab {
                    id: s.properties.sheet_id,
                    title: s.properties.title,
                    index: s.properties.index,
                })
                .collect(),
            url: spreadsheet_url.to_string(),
            connected_at: chrono::Utc::now().to_rfc3339(),
        };

        self.connections.insert(user_id.to_string(), info.clone());
        Ok(info)
    }

    fn connection(&self, user_id: &str) -> Result<SpreadsheetInfo, BalcaoError> {
        self.connections
            .get(user_id)
            .map(|e| e.value().clone())
            .ok_or_else(|| BalcaoError::NotFound("Planilha conectada".into()))
    }

    /// Read a range, serving from cache when fresh.
    pub async fn read(
        &self,
        user_id: &str,
        range: Option<&str>,
        sheet_name: Option<&str>,
    ) -> Result<ReadResult, BalcaoError> {
        let spreadsheet = self.connection(user_id)?;
        let full_range = full_range(range.unwrap_or(DEFAULT_RANGE), sheet_name);
        let cache_key = format!("{user_id}_{}_{full_range}", spreadsheet.id);

        if let Some(cached) = self.cache.get(&cache_key)
            && cached.at.elapsed() < CACHE_TTL
        {
            debug!(range = %full_range, "spreadsheet cache hit");
            return Ok(ReadResult {
                values: cached.values.clone(),
                range: cached.range.clone(),
            });
        }

        let response = self
            .http
            .get(format!(
                "{}/v4/spreadsheets/{}/values/{full_range}",
                self.base_url, spreadsheet.id
            ))
            .bearer_auth(&self.api_token)
            .send()
            .await
            .map_err(|e| BalcaoError::Upstream {
                message: format!("range read request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let response = check_status(response).await?;
        let parsed: ValuesResponse =
            response.json().await.map_err(|e| BalcaoError::Upstream {
                message: format!("failed to parse range values: {e}"),
                source: Some(Box::new(e)),
            })?;

        self.cache.insert(
            cache_key,
            CachedRange {
                at: Instant::now(),
                values: parsed.values.clone(),
                range: parsed.range.clone(),
            },
        );

        Ok(ReadResult {
            values: parsed.values,
            range: parsed.range,
        })
    }

    /// Overwrite a range and notify open dashboards.
    pub async fn write(
        &self,
        user_id: &str,
        range: &str,
        values: Vec<Vec<String>>,
        sheet_name: Option<&str>,
    ) -> Result<WriteOutcome, BalcaoError> {
        let spreadsheet = self.connection(user_id)?;
        let full_range = full_range(range, sheet_name);

        let response = self
            .http
            .put(format!(
                "{}/v4/spreadsheets/{}/values/{full_range}?valueInputOption=USER_ENTERED",
                self.base_url, spreadsheet.id
            ))
            .bearer_auth(&self.api_token)
            .json(&json!({"values": values}))
            .send()
            .await
            .map_err(|e| BalcaoError::Upstream {
                message: format!("range write request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let response = check_status(response).await?;
        let parsed: UpdateResponse =
            response.json().await.map_err(|e| BalcaoError::Upstream {
                message: format!("failed to parse write response: {e}"),
                source: Some(Box::new(e)),
            })?;

        self.bus.publish(
            events::SHEETS_UPDATED,
            json!({
                "userId": user_id,
                "range": full_range,
                "updatedCells": parsed.updated_cells,
            }),
        );
        self.invalidate_cache(user_id);

        Ok(WriteOutcome {
            updated_cells: parsed.updated_cells,
            updated_rows: parsed.updated_rows,
            updated_columns: parsed.updated_columns,
        })
    }

    /// Append one row after the used range.
    pub async fn add_row(
        &self,
        user_id: &str,
        values: Vec<String>,
        sheet_name: Option<&str>,
    ) -> Result<String, BalcaoError> {
        let spreadsheet = self.connection(user_id)?;
        let range = full_range("A:Z", sheet_name);

        let response = self
            .http
            .post(format!(
                "{}/v4/spreadsheets/{}/values/{range}:append?valueInputOption=USER_ENTERED&insertDataOption=INSERT_ROWS",
                self.base_url, spreadsheet.id
            ))
            .bearer_auth(&self.api_token)
            .json(&json!({"values": [values]}))
            .send()
            .await
            .map_err(|e| BalcaoError::Upstream {
                message: format!("row append request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let response = check_status(response).await?;
        let parsed: AppendResponse =
            response.json().await.map_err(|e| BalcaoError::Upstream {
                message: format!("failed to parse append response: {e}"),
                source: Some(Box::new(e)),
            })?;

        self.bus.publish(
            events::SHEETS_ROW_ADDED,
            json!({
                "userId": user_id,
                "range": parsed.updates.updated_range,
            }),
        );
        self.invalidate_cache(user_id);

        Ok(parsed.updates.updated_range)
    }

    /// Delete one row by 0-based index from one tab.
    pub async fn delete_row(
        &self,
        user_id: &str,
        row_index: u64,
        sheet_id: i64,
    ) -> Result<(), BalcaoError> {
        let spreadsheet = self.connection(user_id)?;

        let response = self
            .http
            .post(format!(
                "{}/v4/spreadsheets/{}:batchUpdate",
                self.base_url, spreadsheet.id
            ))
            .bearer_auth(&self.api_token)
            .json(&json!({
                "requests": [{
                    "deleteDimension": {
                        "range": {
                            "sheetId": sheet_id,
                            "dimension": "ROWS",
                            "startIndex": row_index,
                            "endIndex": row_index + 1,
                        }
                    }
                }]
            }))
            .send()
            .await
            .map_err(|e| BalcaoError::Upstream {
                message: format!("row delete request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        check_status(response).await?;

        self.bus.publish(
            events::SHEETS_ROW_DELETED,
            json!({
                "userId": user_id,
                "rowIndex": row_index,
            }),
        );
        self.invalidate_cache(user_id);
        Ok(())
    }

    /// Write a single cell.
    pub async fn update_cell(
        &self,
        user_id: &str,
        cell: &str,
        value: String,
        sheet_name: Option<&str>,
    ) -> Result<WriteOutcome, BalcaoError> {
        self.write(user_id, cell, vec![vec![value]], sheet_name).await
    }

    /// Inventory heuristic over the user's default range.
    ///
    /// The first row is treated as headers; quantity, minimum, and name
    /// columns are found by substring. Missing quantity or minimum column
    /// (or any read failure) yields an empty list rather than an error.
    pub async fn low_stock(&self, user_id: &str) -> Vec<LowStockItem> {
        let data = match self.read(user_id, None, None).await {
            Ok(data) => data,
            Err(_) => return Vec::new(),
        };
        low_stock_from_values(&data.values)
    }

    /// Drop the connection and every cached range of this user.
    pub fn disconnect(&self, user_id: &str) {
        self.invalidate_cache(user_id);
        self.connections.remove(user_id);
    }

    /// The user's current connection, if any.
    pub fn status(&self, user_id: &str) -> Option<SpreadsheetInfo> {
        self.connections.get(user_id).map(|e| e.value().clone())
    }

    fn invalidate_cache(&self, user_id: &str) {
        let prefix = format!("{user_id}_");
        self.cache.retain(|key, _| !key.starts_with(&prefix));
    }
}

fn full_range(range: &str, sheet_name: Option<&str>) -> String {
    match sheet_name {
        Some(name) => format!("{name}!{range}"),
        None => range.to_string(),
    }
}

/// Scan header-plus-rows cell values for items below their minimum.
fn low_stock_from_values(values: &[Vec<String>]) -> Vec<LowStockItem> {
    let Some(headers) = values.first() else {
        return Vec::new();
    };
    let rows = &values[1..];

    let find = |needles: &[&str]| {
        headers.iter().position(|h| {
            let h = h.to_lowercase();
            needles.iter().any(|n| h.contains(n))
        })
    };

    let Some(qty_index) = find(&["qtd", "quantidade"]) else {
        return Vec::new();
    };
    let Some(min_index) = find(&["mín", "minimo"]) else {
        return Vec::new();
    };
    let name_index = find(&["produto", "nome"]);

    rows.iter()
        .enumerate()
        .filter_map(|(i, row)| {
            let quantity: i64 = row
                .get(qty_index)
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(0);
            let minimum: i64 = row
                .get(min_index)
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(0);

            if quantity < minimum && quantity >= 0 {
                Some(LowStockItem {
                    // +2: headers occupy row 1, data starts at row 2.
                    row_index: i + 2,
                    name: name_index
                        .and_then(|n| row.get(n))
                        .cloned()
                        .filter(|s| !s.is_empty())
                        .unwrap_or_else(|| "Sem nome".to_string()),
                    quantity,
                    minimum,
                    row: row.clone(),
                })
            } else {
                None
            }
        })
        .collect()
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, BalcaoError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    match status.as_u16() {
        401 | 403 => Err(BalcaoError::UpstreamAuth {
            message: format!("spreadsheet API returned {status}: {body}"),
        }),
        404 => Err(BalcaoError::NotFound("Planilha".into())),
        _ => Err(BalcaoError::Upstream {
            message: format!("spreadsheet API returned {status}: {body}"),
            source: None,
        }),
    }
}
