// SPDX-FileCopyrightText: 2026 Balcao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! CRM lead operations on top of the row client.
//!
//! Rows come back with drifting column names; the field tables in
//! `balcao_core::fields::lead` resolve them. Status is read lowercase but
//! written capitalized, matching the store's column values.

use std::str::FromStr;

use balcao_core::fields::lead;
use balcao_core::{BalcaoError, Lead, LeadStatus};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::client::BaserowClient;

/// Payload for creating a lead.
#[derive(Debug, Clone, Deserialize)]
pub struct NewLead {
    pub nome: String,
    #[serde(default)]
    pub telefone: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub origem: Option<String>,
    #[serde(default)]
    pub notas: String,
}

/// Partial lead update; only `Some` fields are written.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LeadUpdate {
    pub nome: Option<String>,
    pub telefone: Option<String>,
    pub email: Option<String>,
    pub status: Option<LeadStatus>,
    pub origem: Option<String>,
    pub notas: Option<String>,
}

#[derive(Debug, Clone)]
pub struct LeadsService {
    client: BaserowClient,
    table_id: u64,
}

impl LeadsService {
    pub fn new(client: BaserowClient, table_id: u64) -> Self {
        Self { client, table_id }
    }

    pub async fn list(&self) -> Result<Vec<Lead>, BalcaoError> {
        let rows = self.client.list_rows(self.table_id).await?;
        Ok(rows.iter().map(map_lead).collect())
    }

    pub async fn create(&self, new: NewLead) -> Result<Lead, BalcaoError> {
        if new.nome.trim().is_empty() {
            return Err(BalcaoError::Validation("nome é obrigatório".into()));
        }

        let body = json!({
            "nome": new.nome,
            "telefone": new.telefone,
            "email": new.email,
            "status": LeadStatus::Novo.external(),
            "origem": new.origem.unwrap_or_else(|| "WhatsApp".to_string()),
            "notas": new.notas,
            "data_cadastrado": Utc::now().to_rfc3339(),
        });

        let row = self.client.create_row(self.table_id, body).await?;
        Ok(map_lead(&row))
    }

    pub async fn update(&self, id: i64, update: LeadUpdate) -> Result<Lead, BalcaoError> {
        let mut body = Map::new();
        if let Some(nome) = update.nome {
            body.insert("nome".into(), Value::String(nome));
        }
        if let Some(telefone) = update.telefone {
            body.insert("telefone".into(), Value::String(telefone));
        }
        if let Some(email) = update.email {
            body.insert("email".into(), Value::String(email));
        }
        if let Some(status) = update.status {
            // Stored capitalized, served lowercase.
            body.insert("status".into(), Value::String(status.external().to_string()));
        }
        if let Some(origem) = update.origem {
            body.insert("origem".into(), Value::String(origem));
        }
        if let Some(notas) = update.notas {
            body.insert("notas".into(), Value::String(notas));
        }

        if body.is_empty() {
            return Err(BalcaoError::Validation(
                "nenhum campo para atualizar".into(),
            ));
        }

        let row = self
            .client
            .update_row(self.table_id, id, Value::Object(body))
            .await?;
        Ok(map_lead(&row))
    }

    pub async fn update_status(&self, id: i64, status: LeadStatus) -> Result<Lead, BalcaoError> {
        self.update(
            id,
            LeadUpdate {
                status: Some(status),
                ..Default::default()
            },
        )
        .await
    }

    pub async fn delete(&self, id: i64) -> Result<(), BalcaoError> {
        self.client.delete_row(self.table_id, id).await
    }
}

/// Resolve a raw row into a frontend-facing lead.
fn map_lead(row: &Map<String, Value>) -> Lead {
    let status_raw = lead::STATUS.resolve(row);
    let data = lead::DATA.resolve(row);

    Lead {
        id: row.get("id").and_then(Value::as_i64).unwrap_or(0),
        nome: lead::NOME.resolve(row),
        telefone: lead::TELEFONE.resolve(row),
        email: lead::EMAIL.resolve(row),
        status: LeadStatus::from_str(&status_raw).unwrap_or_default(),
        origem: lead::ORIGEM.resolve(row),
        notas: lead::NOTAS.resolve(row),
        data: if data.is_empty() {
            Utc::now().to_rfc3339()
        } else {
            data
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path, path_regex};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn service(base_url: &str) -> LeadsService {
        let client = BaserowClient::new(
            "https://unused.invalid".into(),
            "dono@loja.com".into(),
            "segredo".into(),
        )
        .unwrap()
        .with_base_url(base_url.to_string());
        LeadsService::new(client, 101)
    }

    async fn mount_token_auth(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/api/user/token-auth/"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"token": "tok"})),
            )
            .mount(server)
            .await;
    }

    #[test]
    fn map_lead_resolves_legacy_columns() {
        let row = serde_json::json!({
            "id": 3,
            "Pushname": "Carlos",
            "ID": "5511988887777",
            "Status": "CONTATADO",
            "nova info para guardar": "prefere tarde"
        });
        let lead = map_lead(row.as_object().unwrap());

        assert_eq!(lead.id, 3);
        assert_eq!(lead.nome, "Carlos");
        assert_eq!(lead.telefone, "5511988887777");
        assert_eq!(lead.status, LeadStatus::Contatado);
        assert_eq!(lead.origem, "WhatsApp");
        assert_eq!(lead.notas, "prefere tarde");
    }

    #[test]
    fn map_lead_defaults_unparseable_status_to_novo() {
        let row = serde_json::json!({"id": 1, "status": "rabisco"});
        let lead = map_lead(row.as_object().unwrap());
        assert_eq!(lead.status, LeadStatus::Novo);
    }

    #[test]
    fn map_lead_fills_missing_date_with_now() {
        let row = serde_json::json!({"id": 1});
        let lead = map_lead(row.as_object().unwrap());
        assert!(!lead.data.is_empty());
    }

    #[tokio::test]
    async fn list_maps_every_row() {
        let server = MockServer::start().await;
        mount_token_auth(&server).await;

        Mock::given(method("GET"))
            .and(path("/api/database/rows/table/101/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "count": 2,
                "results": [
                    {"id": 1, "nome": "Ana", "status": "novo"},
                    {"id": 2, "Nome": "Bruno", "Status": "Fechado"}
                ]
            })))
            .mount(&server)
            .await;

        let leads = service(&server.uri()).list().await.unwrap();
        assert_eq!(leads.len(), 2);
        assert_eq!(leads[0].nome, "Ana");
        assert_eq!(leads[1].status, LeadStatus::Fechado);
    }

    #[tokio::test]
    async fn create_rejects_blank_name_before_any_call() {
        let server = MockServer::start().await;
        // No mocks mounted: a request would fail loudly.
        let err = service(&server.uri())
            .create(NewLead {
                nome: "  ".into(),
                telefone: String::new(),
                email: String::new(),
                origem: None,
                notas: String::new(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, BalcaoError::Validation(_)), "got: {err}");
    }

    #[tokio::test]
    async fn status_update_writes_capitalized_value() {
        let server = MockServer::start().await;
        mount_token_auth(&server).await;

        Mock::given(method("PATCH"))
            .and(path_regex(r"^/api/database/rows/table/101/7/$"))
            .and(body_json(serde_json::json!({"status": "Qualificado"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": 7,
                "nome": "Ana",
                "status": "Qualificado"
            })))
            .mount(&server)
            .await;

        let lead = service(&server.uri())
            .update_status(7, LeadStatus::Qualificado)
            .await
            .unwrap();
        // Served lowercase even though stored capitalized.
        assert_eq!(lead.status, LeadStatus::Qualificado);
    }

    #[tokio::test]
    async fn empty_update_is_rejected() {
        let server = MockServer::start().await;
        let err = service(&server.uri())
            .update(7, LeadUpdate::default())
            .await
            .unwrap_err();
        assert!(matches!(err, BalcaoError::Validation(_)), "got: {err}");
    }
}
