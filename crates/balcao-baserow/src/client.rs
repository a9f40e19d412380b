// SPDX-FileCopyrightText: 2026 Balcao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the low-code database's row API.
//!
//! Provides [`BaserowClient`] which handles credential-based token auth
//! (tokens are cached for 24 hours), row listing, creation, partial update,
//! and deletion. All row endpoints use `user_field_names=true` so columns
//! come back under their display names.

use std::sync::Arc;
use std::time::{Duration, Instant};

use balcao_core::BalcaoError;
use serde::Deserialize;
use serde_json::{Map, Value};
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Auth tokens are valid for a day; re-authenticate after that.
const TOKEN_TTL: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug)]
struct CachedToken {
    token: String,
    fetched_at: Instant,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: String,
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(default)]
    results: Vec<Map<String, Value>>,
}

/// Client for one low-code database account.
///
/// Cheap to clone; clones share the cached auth token.
#[derive(Debug, Clone)]
pub struct BaserowClient {
    http: reqwest::Client,
    base_url: String,
    email: String,
    password: String,
    token: Arc<Mutex<Option<CachedToken>>>,
}

impl BaserowClient {
    pub fn new(base_url: String, email: String, password: String) -> Result<Self, BalcaoError> {
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
            email,
            password,
            token: Arc::new(Mutex::new(None)),
        })
    }

    /// Overrides the base URL (for testing with wiremock).
    #[cfg(test)]
    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    /// Return a valid auth token, authenticating if the cached one is
    /// missing or older than [`TOKEN_TTL`].
    async fn token(&self) -> Result<String, BalcaoError> {
        let mut guard = self.token.lock().await;

        if let Some(cached) = guard.as_ref()
            && cached.fetched_at.elapsed() < TOKEN_TTL
        {
            return Ok(cached.token.clone());
        }

        debug!("authenticating against the row store");
        let response = self
            .http
            .post(format!("{}/api/user/token-auth/", self.base_url))
            .json(&serde_json::json!({
                "email": self.email,
                "password": self.password,
            }))
            .send()
            .await
            .map_err(|e| BalcaoError::Upstream {
                message: format!("token auth request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, "token auth rejected");
            return Err(BalcaoError::UpstreamAuth {
                message: format!("token auth returned {status}: {body}"),
            });
        }

        let parsed: TokenResponse =
            response.json().await.map_err(|e| BalcaoError::Upstream {
                message: format!("failed to parse token auth response: {e}"),
                source: Some(Box::new(e)),
            })?;

        let token = parsed.token.clone();
        *guard = Some(CachedToken {
            token: parsed.token,
            fetched_at: Instant::now(),
        });
        Ok(token)
    }

    fn rows_url(&self, table_id: u64) -> String {
        format!(
            "{}/api/database/rows/table/{table_id}/?user_field_names=true",
            self.base_url
        )
    }

    fn row_url(&self, table_id: u64, row_id: i64) -> String {
        format!(
            "{}/api/database/rows/table/{table_id}/{row_id}/?user_field_names=true",
            self.base_url
        )
    }

    /// List all rows of a table, columns keyed by display name.
    pub async fn list_rows(&self, table_id: u64) -> Result<Vec<Map<String, Value>>, BalcaoError> {
        let token = self.token().await?;
        let response = self
            .http
            .get(self.rows_url(table_id))
            .header("Authorization", format!("JWT {token}"))
            .send()
            .await
            .map_err(|e| BalcaoError::Upstream {
                message: format!("row list request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let response = self.check_status(response, "Tabela").await?;
        let parsed: ListResponse =
            response.json().await.map_err(|e| BalcaoError::Upstream {
                message: format!("failed to parse row list response: {e}"),
                source: Some(Box::new(e)),
            })?;
        Ok(parsed.results)
    }

    /// Create a row; returns the stored row including its assigned id.
    pub async fn create_row(
        &self,
        table_id: u64,
        body: Value,
    ) -> Result<Map<String, Value>, BalcaoError> {
        let token = self.token().await?;
        let response = self
            .http
            .post(self.rows_url(table_id))
            .header("Authorization", format!("JWT {token}"))
            .json(&body)
            .send()
            .await
            .map_err(|e| BalcaoError::Upstream {
                message: format!("row create request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let response = self.check_status(response, "Tabela").await?;
        response.json().await.map_err(|e| BalcaoError::Upstream {
            message: format!("failed to parse created row: {e}"),
            source: Some(Box::new(e)),
        })
    }

    /// Partially update a row; only keys present in `body` change.
    pub async fn update_row(
        &self,
        table_id: u64,
        row_id: i64,
        body: Value,
    ) -> Result<Map<String, Value>, BalcaoError> {
        let token = self.token().await?;
        let response = self
            .http
            .patch(self.row_url(table_id, row_id))
            .header("Authorization", format!("JWT {token}"))
            .json(&body)
            .send()
            .await
            .map_err(|e| BalcaoError::Upstream {
                message: format!("row update request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let response = self.check_status(response, "Registro").await?;
        response.json().await.map_err(|e| BalcaoError::Upstream {
            message: format!("failed to parse updated row: {e}"),
            source: Some(Box::new(e)),
        })
    }

    pub async fn delete_row(&self, table_id: u64, row_id: i64) -> Result<(), BalcaoError> {
        let token = self.token().await?;
        let response = self
            .http
            .delete(format!(
                "{}/api/database/rows/table/{table_id}/{row_id}/",
                self.base_url
            ))
            .header("Authorization", format!("JWT {token}"))
            .send()
            .await
            .map_err(|e| BalcaoError::Upstream {
                message: format!("row delete request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        self.check_status(response, "Registro").await?;
        Ok(())
    }

    /// Map non-success statuses to errors. 401/403 also drops the cached
    /// token so the next call re-authenticates.
    async fn check_status(
        &self,
        response: reqwest::Response,
        entity: &str,
    ) -> Result<reqwest::Response, BalcaoError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        match status.as_u16() {
            401 | 403 => {
                warn!(status = %status, "row store rejected token, dropping cache");
                *self.token.lock().await = None;
                Err(BalcaoError::UpstreamAuth {
                    message: format!("row store returned {status}: {body}"),
                })
            }
            404 => Err(BalcaoError::NotFound(entity.to_string())),
            _ => Err(BalcaoError::Upstream {
                message: format!("row store returned {status}: {body}"),
                source: None,
            }),
        }
    }
}
