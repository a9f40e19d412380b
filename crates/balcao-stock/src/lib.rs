// SPDX-FileCopyrightText: 2026 Balcao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Inventory adapter over a PostgREST-style product API.
//!
//! Talks to the hosted Postgres service's REST layer: the service key is
//! sent both as `apikey` and as a bearer token, writes ask for
//! `Prefer: return=representation` so the stored row comes back, and row
//! filters use the `column=eq.value` query syntax.

use std::time::Duration;

use balcao_core::{BalcaoError, Produto};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

/// Payload for adding a product.
#[derive(Debug, Clone, Deserialize)]
pub struct NewProduto {
    pub name: String,
    #[serde(default)]
    pub quantity: Option<i64>,
    #[serde(default)]
    pub minimum_stock: Option<i64>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub price: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Partial product update; only `Some` fields are written.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProdutoUpdate {
    pub name: Option<String>,
    pub quantity: Option<i64>,
    pub minimum_stock: Option<i64>,
    pub category: Option<String>,
    pub price: Option<String>,
    pub brand: Option<String>,
    pub color: Option<String>,
    pub image_url: Option<String>,
}

/// Connection diagnostic returned by the status endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct StockStatus {
    pub connected: bool,
    pub table: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct StockService {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    table: String,
    default_minimum: i64,
}

impl StockService {
    pub fn new(
        base_url: String,
        api_key: String,
        table: String,
        default_minimum: i64,
    ) -> Result<Self, BalcaoError> {
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
            api_key,
            table,
            default_minimum,
        })
    }

    /// Overrides the base URL (for testing with wiremock).
    #[cfg(test)]
    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.base_url, self.table)
    }

    fn request(&self, method: reqwest::Method, url: String) -> reqwest::RequestBuilder {
        self.http
            .request(method, url)
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
    }

    /// All products, ordered by name.
    pub async fn list(&self) -> Result<Vec<Produto>, BalcaoError> {
        let response = self
            .request(
                reqwest::Method::GET,
                format!("{}?select=*&order=name.asc", self.table_url()),
            )
            .send()
            .await
            .map_err(|e| BalcaoError::Upstream {
                message: format!("product list request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let response = check_status(response).await?;
        response.json().await.map_err(|e| BalcaoError::Upstream {
            message: format!("failed to parse product list: {e}"),
            source: Some(Box::new(e)),
        })
    }

    /// Products whose quantity sits below their own threshold.
    ///
    /// The REST layer cannot compare two columns in a filter, so the check
    /// runs here after fetching the table.
    pub async fn low_stock(&self) -> Result<Vec<Produto>, BalcaoError> {
        let mut products = self.list().await?;
        products.retain(|p| p.quantity >= 0 && p.is_low_stock());
        Ok(products)
    }

    pub async fn create(&self, new: NewProduto) -> Result<Produto, BalcaoError> {
        if new.name.trim().is_empty() {
            return Err(BalcaoError::Validation("name é obrigatório".into()));
        }

        let mut body = Map::new();
        body.insert("name".into(), Value::String(new.name));
        body.insert("quantity".into(), json!(new.quantity.unwrap_or(0)));
        body.insert(
            "minimum_stock".into(),
            json!(new.minimum_stock.unwrap_or(self.default_minimum)),
        );
        body.insert(
            "category".into(),
            Value::String(new.category.unwrap_or_else(|| "Geral".to_string())),
        );
        if let Some(price) = new.price {
            body.insert("price".into(), Value::String(price));
        }
        if let Some(brand) = new.brand {
            body.insert("brand".into(), Value::String(brand));
        }
        if let Some(color) = new.color {
            body.insert("color".into(), Value::String(color));
        }
        if let Some(image_url) = new.image_url {
            body.insert("image_url".into(), Value::String(image_url));
        }

        let response = self
            .request(reqwest::Method::POST, self.table_url())
            .header("Prefer", "return=representation")
            .json(&Value::Array(vec![Value::Object(body)]))
            .send()
            .await
            .map_err(|e| BalcaoError::Upstream {
                message: format!("product create request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let response = check_status(response).await?;
        first_row(response).await
    }

    /// Overwrite just the quantity counter.
    pub async fn update_quantity(&self, id: i64, quantity: i64) -> Result<Produto, BalcaoError> {
        self.patch(id, json!({"quantity": quantity})).await
    }

    pub async fn update(&self, id: i64, update: ProdutoUpdate) -> Result<Produto, BalcaoError> {
        let mut body = Map::new();
        if let Some(name) = update.name {
            body.insert("name".into(), Value::String(name));
        }
        if let Some(quantity) = update.quantity {
            body.insert("quantity".into(), json!(quantity));
        }
        if let Some(minimum_stock) = update.minimum_stock {
            body.insert("minimum_stock".into(), json!(minimum_stock));
        }
        if let Some(category) = update.category {
            body.insert("category".into(), Value::String(category));
        }
        if let Some(price) = update.price {
            body.insert("price".into(), Value::String(price));
        }
        if let Some(brand) = update.brand {
            body.insert("brand".into(), Value::String(brand));
        }
        if let Some(color) = update.color {
            body.insert("color".into(), Value::String(color));
        }
        if let Some(image_url) = update.image_url {
            body.insert("image_url".into(), Value::String(image_url));
        }

        if body.is_empty() {
            return Err(BalcaoError::Validation(
                "nenhum campo para atualizar".into(),
            ));
        }

        self.patch(id, Value::Object(body)).await
    }

    async fn patch(&self, id: i64, body: Value) -> Result<Produto, BalcaoError> {
        let response = self
            .request(
                reqwest::Method::PATCH,
                format!("{}?id=eq.{id}", self.table_url()),
            )
            .header("Prefer", "return=representation")
            .json(&body)
            .send()
            .await
            .map_err(|e| BalcaoError::Upstream {
                message: format!("product update request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let response = check_status(response).await?;
        first_row(response).await
    }

    pub async fn delete(&self, id: i64) -> Result<(), BalcaoError> {
        let response = self
            .request(
                reqwest::Method::DELETE,
                format!("{}?id=eq.{id}", self.table_url()),
            )
            .send()
            .await
            .map_err(|e| BalcaoError::Upstream {
                message: format!("product delete request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        check_status(response).await?;
        Ok(())
    }

    /// Connection diagnostic: fetch a single row and report the outcome.
    pub async fn status(&self) -> StockStatus {
        let result = self
            .request(
                reqwest::Method::GET,
                format!("{}?select=id&limit=1", self.table_url()),
            )
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => {
                debug!(table = %self.table, "inventory store reachable");
                StockStatus {
                    connected: true,
                    table: self.table.clone(),
                    error: None,
                }
            }
            Ok(response) => {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                warn!(status = %status, "inventory store returned error");
                StockStatus {
                    connected: false,
                    table: self.table.clone(),
                    error: Some(format!("{status}: {body}")),
                }
            }
            Err(e) => StockStatus {
                connected: false,
                table: self.table.clone(),
                error: Some(e.to_string()),
            },
        }
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, BalcaoError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    match status.as_u16() {
        401 | 403 => Err(BalcaoError::UpstreamAuth {
            message: format!("inventory store returned {status}: {body}"),
        }),
        _ => Err(BalcaoError::Upstream {
            message: format!("inventory store returned {status}: {body}"),
            source: None,
        }),
    }
}

/// Representation responses come back as a one-element array; an empty
/// array means the filter matched no row.
async fn first_row(response: reqwest::Response) -> Result<Produto, BalcaoError> {
    let rows: Vec<Produto> = response.json().await.map_err(|e| BalcaoError::Upstream {
        message: format!("failed to parse product row: {e}"),
        source: Some(Box::new(e)),
    })?;
    rows.into_iter()
        .next()
        .ok_or_else(|| BalcaoError::NotFound("Produto".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn service(base_url: &str) -> StockService {
        StockService::new(
            "https://unused.invalid".into(),
            "service-role-key".into(),
            "products".into(),
            10,
        )
        .unwrap()
        .with_base_url(base_url.to_string())
    }

    fn produto_json(id: i64, name: &str, quantity: i64, minimum: i64) -> serde_json::Value {
        serde_json::json!({
            "id": id,
            "name": name,
            "quantity": quantity,
            "minimum_stock": minimum,
            "category": "Geral"
        })
    }

    #[tokio::test]
    async fn list_sends_service_key_and_orders_by_name() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/v1/products"))
            .and(query_param("order", "name.asc"))
            .and(header("apikey", "service-role-key"))
            .and(header("Authorization", "Bearer service-role-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                produto_json(1, "Açúcar", 5, 10),
                produto_json(2, "Farinha", 50, 10)
            ])))
            .mount(&server)
            .await;

        let products = service(&server.uri()).list().await.unwrap();
        assert_eq!(products.len(), 2);
        assert_eq!(products[0].name, "Açúcar");
    }

    #[tokio::test]
    async fn low_stock_filters_on_per_item_threshold() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/v1/products"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                produto_json(1, "Açúcar", 5, 10),
                produto_json(2, "Farinha", 50, 10),
                produto_json(3, "Fermento", 3, 20),
                produto_json(4, "Inconsistente", -1, 10)
            ])))
            .mount(&server)
            .await;

        let low = service(&server.uri()).low_stock().await.unwrap();
        let ids: Vec<i64> = low.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[tokio::test]
    async fn create_fills_defaults_from_config() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/rest/v1/products"))
            .and(header("Prefer", "return=representation"))
            .and(body_json(serde_json::json!([{
                "name": "Açúcar",
                "quantity": 0,
                "minimum_stock": 10,
                "category": "Geral"
            }])))
            .respond_with(
                ResponseTemplate::new(201)
                    .set_body_json(serde_json::json!([produto_json(7, "Açúcar", 0, 10)])),
            )
            .mount(&server)
            .await;

        let created = service(&server.uri())
            .create(NewProduto {
                name: "Açúcar".into(),
                quantity: None,
                minimum_stock: None,
                category: None,
                price: None,
                brand: None,
                color: None,
                image_url: None,
            })
            .await
            .unwrap();
        assert_eq!(created.id, 7);
        assert_eq!(created.minimum_stock, 10);
    }

    #[tokio::test]
    async fn update_quantity_patches_by_id_filter() {
        let server = MockServer::start().await;

        Mock::given(method("PATCH"))
            .and(path("/rest/v1/products"))
            .and(query_param("id", "eq.7"))
            .and(body_json(serde_json::json!({"quantity": 42})))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!([produto_json(7, "Açúcar", 42, 10)])),
            )
            .mount(&server)
            .await;

        let updated = service(&server.uri()).update_quantity(7, 42).await.unwrap();
        assert_eq!(updated.quantity, 42);
    }

    #[tokio::test]
    async fn patch_on_missing_row_is_not_found() {
        let server = MockServer::start().await;

        Mock::given(method("PATCH"))
            .and(path("/rest/v1/products"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .mount(&server)
            .await;

        let err = service(&server.uri())
            .update_quantity(999, 1)
            .await
            .unwrap_err();
        assert!(matches!(err, BalcaoError::NotFound(_)), "got: {err}");
    }

    #[tokio::test]
    async fn empty_update_is_rejected() {
        let server = MockServer::start().await;
        let err = service(&server.uri())
            .update(7, ProdutoUpdate::default())
            .await
            .unwrap_err();
        assert!(matches!(err, BalcaoError::Validation(_)), "got: {err}");
    }

    #[tokio::test]
    async fn bad_key_surfaces_as_auth_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/v1/products"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_json(serde_json::json!({"message": "Invalid API key"})),
            )
            .mount(&server)
            .await;

        let err = service(&server.uri()).list().await.unwrap_err();
        assert!(matches!(err, BalcaoError::UpstreamAuth { .. }), "got: {err}");
    }

    #[tokio::test]
    async fn status_reports_unreachable_store() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/v1/products"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let status = service(&server.uri()).status().await;
        assert!(!status.connected);
        assert_eq!(status.table, "products");
        assert!(status.error.unwrap().contains("500"));
    }
}
