// SPDX-FileCopyrightText: 2026 Balcao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Campaign operations, including the plain-text rendering served to the
//! automation agent and a short-lived list memo.

use std::sync::Arc;
use std::time::{Duration, Instant};

use balcao_core::fields::campanha;
use balcao_core::{BalcaoError, Campanha};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tokio::sync::Mutex;
use tracing::debug;

use crate::client::BaserowClient;

/// Campaign lists change rarely; the automation agent polls them on every
/// conversation turn, so a short memo keeps that traffic off the store.
const LIST_TTL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Deserialize)]
pub struct NewCampanha {
    pub nome: String,
    #[serde(default)]
    pub descricao: String,
    #[serde(default)]
    pub link: String,
    #[serde(default = "default_ativa")]
    pub ativa: bool,
}

fn default_ativa() -> bool {
    true
}

/// Partial campaign update; only `Some` fields are written.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CampanhaUpdate {
    pub nome: Option<String>,
    pub descricao: Option<String>,
    pub link: Option<String>,
    pub ativa: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct CampanhasService {
    client: BaserowClient,
    table_id: u64,
    memo: Arc<Mutex<Option<(Instant, Vec<Campanha>)>>>,
}

impl CampanhasService {
    pub fn new(client: BaserowClient, table_id: u64) -> Self {
        Self {
            client,
            table_id,
            memo: Arc::new(Mutex::new(None)),
        }
    }

    /// List campaigns. With `use_cache` a memo younger than [`LIST_TTL`]
    /// is served without hitting the store.
    pub async fn list(&self, use_cache: bool) -> Result<Vec<Campanha>, BalcaoError> {
        let mut memo = self.memo.lock().await;

        if use_cache
            && let Some((at, cached)) = memo.as_ref()
            && at.elapsed() < LIST_TTL
        {
            debug!("serving campaign list from memo");
            return Ok(cached.clone());
        }

        let rows = self.client.list_rows(self.table_id).await?;
        let campanhas: Vec<Campanha> = rows.iter().map(map_campanha).collect();
        *memo = Some((Instant::now(), campanhas.clone()));
        Ok(campanhas)
    }

    pub async fn create(&self, new: NewCampanha) -> Result<Campanha, BalcaoError> {
        if new.nome.trim().is_empty() {
            return Err(BalcaoError::Validation("nome é obrigatório".into()));
        }

        let body = json!({
            "nome": new.nome,
            "descricao": new.descricao,
            "link": new.link,
            "ativa": new.ativa,
            "data_criacao": chrono::Utc::now().to_rfc3339(),
        });

        let row = self.client.create_row(self.table_id, body).await?;
        self.clear_cache().await;
        Ok(map_campanha(&row))
    }

    pub async fn update(&self, id: i64, update: CampanhaUpdate) -> Result<Campanha, BalcaoError> {
        let mut body = Map::new();
        if let Some(nome) = update.nome {
            body.insert("nome".into(), Value::String(nome));
        }
        if let Some(descricao) = update.descricao {
            body.insert("descricao".into(), Value::String(descricao));
        }
        if let Some(link) = update.link {
            body.insert("link".into(), Value::String(link));
        }
        if let Some(ativa) = update.ativa {
            body.insert("ativa".into(), Value::Bool(ativa));
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
        self.clear_cache().await;
        Ok(map_campanha(&row))
    }

    pub async fn delete(&self, id: i64) -> Result<(), BalcaoError> {
        self.client.delete_row(self.table_id, id).await?;
        self.clear_cache().await;
        Ok(())
    }

    /// Render active campaigns as plain text for the automation agent.
    ///
    /// Never errors: an empty or failing list degrades to a fixed phrase
    /// the agent can relay verbatim.
    pub async fn texto_para_ia(&self) -> String {
        match self.list(true).await {
            Ok(campanhas) => {
                let ativas: Vec<&Campanha> = campanhas.iter().filter(|c| c.ativa).collect();
                if ativas.is_empty() {
                    return "No momento não temos campanhas ativas.".to_string();
                }
                ativas
                    .iter()
                    .map(|c| {
                        format!(
                            "Campanha: {}\nDescrição: {}\nLink: {}",
                            c.nome, c.descricao, c.link
                        )
                    })
                    .collect::<Vec<_>>()
                    .join("\n\n")
            }
            Err(_) => "Houve um erro ao buscar as campanhas para a IA.".to_string(),
        }
    }

    pub async fn clear_cache(&self) {
        *self.memo.lock().await = None;
    }
}

/// Resolve a raw row into a frontend-facing campaign.
fn map_campanha(row: &Map<String, Value>) -> Campanha {
    Campanha {
        id: row.get("id").and_then(Value::as_i64).unwrap_or(0),
        nome: campanha::NOME.resolve(row),
        descricao: campanha::DESCRICAO.resolve(row),
        link: campanha::LINK.resolve(row),
        ativa: campanha::ATIVA.resolve_bool(row),
        data_criacao: campanha::DATA_CRIACAO.resolve(row),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn service(base_url: &str) -> CampanhasService {
        let client = BaserowClient::new(
            "https://unused.invalid".into(),
            "dono@loja.com".into(),
            "segredo".into(),
        )
        .unwrap()
        .with_base_url(base_url.to_string());
        CampanhasService::new(client, 103)
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

    #[tokio::test]
    async fn cached_list_hits_the_store_once() {
        let server = MockServer::start().await;
        mount_token_auth(&server).await;

        Mock::given(method("GET"))
            .and(path("/api/database/rows/table/103/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "count": 1,
                "results": [{"id": 1, "nome": "Promo de Verão", "ativa": true}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let svc = service(&server.uri());
        svc.list(true).await.unwrap();
        let second = svc.list(true).await.unwrap();
        assert_eq!(second[0].nome, "Promo de Verão");
    }

    #[tokio::test]
    async fn uncached_list_bypasses_memo() {
        let server = MockServer::start().await;
        mount_token_auth(&server).await;

        Mock::given(method("GET"))
            .and(path("/api/database/rows/table/103/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "count": 0,
                "results": []
            })))
            .expect(2)
            .mount(&server)
            .await;

        let svc = service(&server.uri());
        svc.list(true).await.unwrap();
        svc.list(false).await.unwrap();
    }

    #[tokio::test]
    async fn texto_lists_active_campaigns_only() {
        let server = MockServer::start().await;
        mount_token_auth(&server).await;

        Mock::given(method("GET"))
            .and(path("/api/database/rows/table/103/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "count": 2,
                "results": [
                    {"id": 1, "nome": "Promo de Verão", "descricao": "10% off", "link": "https://loja.com/verao", "ativa": true},
                    {"id": 2, "nome": "Antiga", "ativa": false}
                ]
            })))
            .mount(&server)
            .await;

        let texto = service(&server.uri()).texto_para_ia().await;
        assert_eq!(
            texto,
            "Campanha: Promo de Verão\nDescrição: 10% off\nLink: https://loja.com/verao"
        );
    }

    #[tokio::test]
    async fn texto_degrades_when_no_active_campaign() {
        let server = MockServer::start().await;
        mount_token_auth(&server).await;

        Mock::given(method("GET"))
            .and(path("/api/database/rows/table/103/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "count": 0,
                "results": []
            })))
            .mount(&server)
            .await;

        let texto = service(&server.uri()).texto_para_ia().await;
        assert_eq!(texto, "No momento não temos campanhas ativas.");
    }

    #[tokio::test]
    async fn texto_degrades_on_store_failure() {
        let server = MockServer::start().await;
        mount_token_auth(&server).await;

        Mock::given(method("GET"))
            .and(path("/api/database/rows/table/103/"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let texto = service(&server.uri()).texto_para_ia().await;
        assert_eq!(texto, "Houve um erro ao buscar as campanhas para a IA.");
    }

    #[tokio::test]
    async fn delete_invalidates_the_memo() {
        let server = MockServer::start().await;
        mount_token_auth(&server).await;

        Mock::given(method("GET"))
            .and(path("/api/database/rows/table/103/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "count": 0,
                "results": []
            })))
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/api/database/rows/table/103/1/"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let svc = service(&server.uri());
        svc.list(true).await.unwrap();
        svc.delete(1).await.unwrap();
        // Memo was dropped, so this hits the store again.
        svc.list(true).await.unwrap();
    }
}
