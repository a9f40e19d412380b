// SPDX-FileCopyrightText: 2026 Balcao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Order operations, overview stats, and the per-day history view.

use std::collections::HashMap;
use std::str::FromStr;

use balcao_core::fields::pedido;
use balcao_core::{BalcaoError, HistoryBucket, Pedido, PedidoStats, PedidoStatus};
use chrono::{DateTime, Local, NaiveDate};
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::client::BaserowClient;

/// Payload for creating an order, as posted by the automation webhook or
/// the dashboard. `itens` may arrive as a string or structured JSON.
#[derive(Debug, Clone, Deserialize)]
pub struct NewPedido {
    pub cliente: Option<String>,
    #[serde(default)]
    pub itens: Value,
    #[serde(default)]
    pub total: Value,
    pub endereco: Option<String>,
    pub whatsapp: Option<String>,
    pub data_hora: Option<String>,
    /// The automation posts `status_pedido`; the dashboard posts `status`.
    pub status_pedido: Option<PedidoStatus>,
    pub status: Option<PedidoStatus>,
    pub origem: Option<String>,
}

/// Partial update; only the fields present are written.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PedidoUpdate {
    pub cliente: Option<String>,
    pub itens: Option<String>,
    pub total: Option<f64>,
    pub endereco: Option<String>,
    pub whatsapp: Option<String>,
    pub data_hora: Option<String>,
    pub status: Option<PedidoStatus>,
    pub origem: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct PedidoFilter {
    pub status: Option<PedidoStatus>,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct PedidosService {
    client: BaserowClient,
    table_id: u64,
}

impl PedidosService {
    pub fn new(client: BaserowClient, table_id: u64) -> Self {
        Self { client, table_id }
    }

    pub async fn list(&self, filter: PedidoFilter) -> Result<Vec<Pedido>, BalcaoError> {
        let rows = self.client.list_rows(self.table_id).await?;
        let mut pedidos: Vec<Pedido> = rows.iter().map(map_pedido).collect();

        if let Some(status) = filter.status {
            pedidos.retain(|p| p.status == status);
        }
        if let Some(limit) = filter.limit {
            pedidos.truncate(limit);
        }
        Ok(pedidos)
    }

    pub async fn get(&self, id: i64) -> Result<Pedido, BalcaoError> {
        let pedidos = self.list(PedidoFilter::default()).await?;
        pedidos
            .into_iter()
            .find(|p| p.id == id)
            .ok_or_else(|| BalcaoError::NotFound("Pedido".into()))
    }

    pub async fn create(&self, new: NewPedido) -> Result<Pedido, BalcaoError> {
        let itens = match &new.itens {
            Value::String(s) => s.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        };
        let total = match &new.total {
            Value::Number(n) => n.as_f64().unwrap_or(0.0),
            Value::String(s) => s.trim().replace(',', ".").parse().unwrap_or(0.0),
            _ => 0.0,
        };
        // The automation's field name wins over the dashboard's.
        let status = new.status_pedido.or(new.status).unwrap_or_default();

        let body = json!({
            "cliente": new.cliente.unwrap_or_else(|| "Cliente não informado".to_string()),
            "itens": itens,
            "total": total,
            "endereco": new.endereco.unwrap_or_else(|| "Não informado".to_string()),
            "whatsapp": new.whatsapp.unwrap_or_else(|| "Não informado".to_string()),
            "data_hora": new
                .data_hora
                .unwrap_or_else(|| Local::now().format("%d/%m/%Y %H:%M:%S").to_string()),
            "status": status.to_string(),
            "origem": new.origem.unwrap_or_else(|| "whatsapp".to_string()),
        });

        let row = self.client.create_row(self.table_id, body).await?;
        Ok(map_pedido(&row))
    }

    pub async fn update_status(
        &self,
        id: i64,
        status: PedidoStatus,
    ) -> Result<Pedido, BalcaoError> {
        let row = self
            .client
            .update_row(self.table_id, id, json!({"status": status.to_string()}))
            .await?;
        Ok(map_pedido(&row))
    }

    pub async fn update(&self, id: i64, update: PedidoUpdate) -> Result<Pedido, BalcaoError> {
        let mut body = Map::new();
        if let Some(cliente) = update.cliente {
            body.insert("cliente".into(), cliente.into());
        }
        if let Some(itens) = update.itens {
            body.insert("itens".into(), itens.into());
        }
        if let Some(total) = update.total {
            body.insert("total".into(), total.into());
        }
        if let Some(endereco) = update.endereco {
            body.insert("endereco".into(), endereco.into());
        }
        if let Some(whatsapp) = update.whatsapp {
            body.insert("whatsapp".into(), whatsapp.into());
        }
        if let Some(data_hora) = update.data_hora {
            body.insert("data_hora".into(), data_hora.into());
        }
        if let Some(status) = update.status {
            body.insert("status".into(), status.to_string().into());
        }
        if let Some(origem) = update.origem {
            body.insert("origem".into(), origem.into());
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
        Ok(map_pedido(&row))
    }

    pub async fn delete(&self, id: i64) -> Result<(), BalcaoError> {
        self.client.delete_row(self.table_id, id).await
    }

    pub async fn stats(&self) -> Result<PedidoStats, BalcaoError> {
        let pedidos = self.list(PedidoFilter::default()).await?;
        Ok(compute_stats(&pedidos))
    }

    pub async fn history(&self) -> Result<Vec<HistoryBucket>, BalcaoError> {
        let pedidos = self.list(PedidoFilter::default()).await?;
        Ok(build_history(pedidos))
    }
}

/// Resolve a raw row into a frontend-facing order.
fn map_pedido(row: &Map<String, Value>) -> Pedido {
    let status_raw = pedido::STATUS.resolve(row);

    Pedido {
        id: row.get("id").and_then(Value::as_i64).unwrap_or(0),
        cliente: pedido::CLIENTE.resolve(row),
        itens: pedido::ITENS.resolve(row),
        total: pedido::TOTAL.resolve_f64(row),
        endereco: pedido::ENDERECO.resolve(row),
        whatsapp: pedido::WHATSAPP.resolve(row),
        data_hora: pedido::DATA_HORA.resolve(row),
        status: PedidoStatus::from_str(&status_raw).unwrap_or_default(),
        origem: pedido::ORIGEM.resolve(row),
    }
}

/// Overview counters. Revenue sums completed orders only.
pub fn compute_stats(pedidos: &[Pedido]) -> PedidoStats {
    let mut stats = PedidoStats {
        total: pedidos.len(),
        ..Default::default()
    };

    for p in pedidos {
        match p.status {
            PedidoStatus::Pendente => stats.pendentes += 1,
            PedidoStatus::Processando => stats.processando += 1,
            PedidoStatus::Concluido => {
                stats.concluidos += 1;
                stats.faturamento += p.total;
            }
            PedidoStatus::Cancelado => stats.cancelados += 1,
        }
    }
    stats
}

/// Group orders into per-day buckets, most recent day first.
///
/// `data_hora` arrives either as "DD/MM/YYYY HH:MM:SS" or as a parseable
/// timestamp; anything else lands in a trailing "Data indefinida" bucket.
pub fn build_history(pedidos: Vec<Pedido>) -> Vec<HistoryBucket> {
    const UNDATED: &str = "Data indefinida";

    let mut buckets: Vec<HistoryBucket> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for p in pedidos {
        let date = extract_date(&p.data_hora).unwrap_or_else(|| UNDATED.to_string());

        let i = *index.entry(date.clone()).or_insert_with(|| {
            buckets.push(HistoryBucket {
                date,
                total_pedidos: 0,
                faturamento: 0.0,
                pedidos: Vec::new(),
            });
            buckets.len() - 1
        });

        buckets[i].total_pedidos += 1;
        if p.status == PedidoStatus::Concluido {
            buckets[i].faturamento += p.total;
        }
        buckets[i].pedidos.push(p);
    }

    buckets.sort_by(|a, b| {
        let da = parse_bucket_date(&a.date);
        let db = parse_bucket_date(&b.date);
        // Parseable dates descending, undated last.
        db.cmp(&da)
    });
    buckets
}

fn extract_date(data_hora: &str) -> Option<String> {
    if data_hora.contains('/') {
        return data_hora
            .split_whitespace()
            .find(|tok| tok.contains('/'))
            .map(str::to_string);
    }
    DateTime::parse_from_rfc3339(data_hora)
        .ok()
        .map(|dt| dt.format("%d/%m/%Y").to_string())
}

fn parse_bucket_date(date: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(date, "%d/%m/%Y").ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn pedido(id: i64, status: PedidoStatus, total: f64, data_hora: &str) -> Pedido {
        Pedido {
            id,
            cliente: "Ana".into(),
            itens: "2x bolo".into(),
            total,
            endereco: "Rua A".into(),
            whatsapp: "5511999999999".into(),
            data_hora: data_hora.into(),
            status,
            origem: "whatsapp".into(),
        }
    }

    #[test]
    fn stats_sum_revenue_over_completed_only() {
        let pedidos = vec![
            pedido(1, PedidoStatus::Concluido, 50.0, "01/02/2026 10:00:00"),
            pedido(2, PedidoStatus::Concluido, 30.0, "01/02/2026 11:00:00"),
            pedido(3, PedidoStatus::Pendente, 99.0, "01/02/2026 12:00:00"),
            pedido(4, PedidoStatus::Cancelado, 20.0, "01/02/2026 13:00:00"),
        ];
        let stats = compute_stats(&pedidos);

        assert_eq!(stats.total, 4);
        assert_eq!(stats.pendentes, 1);
        assert_eq!(stats.concluidos, 2);
        assert_eq!(stats.cancelados, 1);
        assert_eq!(stats.processando, 0);
        assert_eq!(stats.faturamento, 80.0);
    }

    #[test]
    fn history_groups_by_day_most_recent_first() {
        let pedidos = vec![
            pedido(1, PedidoStatus::Concluido, 50.0, "01/02/2026 10:00:00"),
            pedido(2, PedidoStatus::Pendente, 10.0, "03/02/2026 09:00:00"),
            pedido(3, PedidoStatus::Concluido, 30.0, "01/02/2026 16:30:00"),
        ];
        let history = build_history(pedidos);

        assert_eq!(history.len(), 2);
        assert_eq!(history[0].date, "03/02/2026");
        assert_eq!(history[1].date, "01/02/2026");
        assert_eq!(history[1].total_pedidos, 2);
        assert_eq!(history[1].faturamento, 80.0);
    }

    #[test]
    fn history_accepts_rfc3339_timestamps() {
        let pedidos = vec![pedido(
            1,
            PedidoStatus::Pendente,
            10.0,
            "2026-02-01T10:00:00-03:00",
        )];
        let history = build_history(pedidos);
        assert_eq!(history[0].date, "01/02/2026");
    }

    #[test]
    fn history_puts_undated_orders_last() {
        let pedidos = vec![
            pedido(1, PedidoStatus::Pendente, 10.0, "garbage"),
            pedido(2, PedidoStatus::Pendente, 10.0, "01/02/2026 10:00:00"),
        ];
        let history = build_history(pedidos);

        assert_eq!(history.len(), 2);
        assert_eq!(history[0].date, "01/02/2026");
        assert_eq!(history[1].date, "Data indefinida");
    }

    fn service(base_url: &str) -> PedidosService {
        let client = BaserowClient::new(
            "https://unused.invalid".into(),
            "dono@loja.com".into(),
            "segredo".into(),
        )
        .unwrap()
        .with_base_url(base_url.to_string());
        PedidosService::new(client, 102)
    }

    async fn mount_rows(server: &MockServer, results: serde_json::Value) {
        Mock::given(method("POST"))
            .and(path("/api/user/token-auth/"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"token": "tok"})),
            )
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/database/rows/table/102/"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"count": 0, "results": results})),
            )
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn list_applies_status_filter_and_limit() {
        let server = MockServer::start().await;
        mount_rows(
            &server,
            serde_json::json!([
                {"id": 1, "status": "pendente", "total": "10"},
                {"id": 2, "status": "concluido", "total": "20"},
                {"id": 3, "status": "pendente", "total": "30"}
            ]),
        )
        .await;

        let svc = service(&server.uri());
        let pendentes = svc
            .list(PedidoFilter {
                status: Some(PedidoStatus::Pendente),
                limit: Some(1),
            })
            .await
            .unwrap();

        assert_eq!(pendentes.len(), 1);
        assert_eq!(pendentes[0].id, 1);
    }

    #[tokio::test]
    async fn empty_update_is_rejected_before_any_call() {
        let server = MockServer::start().await;
        let err = service(&server.uri())
            .update(1, PedidoUpdate::default())
            .await
            .unwrap_err();
        assert!(matches!(err, BalcaoError::Validation(_)));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn get_unknown_id_is_not_found() {
        let server = MockServer::start().await;
        mount_rows(&server, serde_json::json!([])).await;

        let err = service(&server.uri()).get(999).await.unwrap_err();
        assert!(matches!(err, BalcaoError::NotFound(_)), "got: {err}");
    }

    #[tokio::test]
    async fn create_fills_defaults_and_stringifies_items() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/user/token-auth/"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"token": "tok"})),
            )
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/database/rows/table/102/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": 5,
                "cliente": "Cliente não informado",
                "status": "pendente",
                "total": 42.5
            })))
            .mount(&server)
            .await;

        let created = service(&server.uri())
            .create(NewPedido {
                cliente: None,
                itens: serde_json::json!([{"produto": "bolo", "qtd": 2}]),
                total: serde_json::json!("42,50"),
                endereco: None,
                whatsapp: None,
                data_hora: None,
                status_pedido: None,
                status: None,
                origem: None,
            })
            .await
            .unwrap();

        assert_eq!(created.id, 5);
        assert_eq!(created.cliente, "Cliente não informado");
        assert_eq!(created.total, 42.5);
    }
}
