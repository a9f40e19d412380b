// SPDX-FileCopyrightText: 2026 Balcao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state. Every external store is
//! optional: a section missing from the configuration leaves its routes
//! mounted but answering 503.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use axum::http::{header, HeaderValue, Method};
use axum::routing::{delete, get, patch, post, put};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};

use balcao_baserow::{BaserowClient, CampanhasService, LeadsService, PedidosService};
use balcao_bus::EventBus;
use balcao_core::BalcaoError;
use balcao_sheets::SheetsService;
use balcao_stock::StockService;
use balcao_whatsapp::WhatsappBridge;

use crate::auth::AuthService;
use crate::handlers;
use crate::ws;

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct AppState {
    pub bus: EventBus,
    pub auth: Option<AuthService>,
    pub baserow: Option<BaserowClient>,
    pub leads: Option<LeadsService>,
    pub pedidos: Option<PedidosService>,
    pub campanhas: Option<CampanhasService>,
    pub stock: Option<StockService>,
    pub sheets: Option<Arc<SheetsService>>,
    pub whatsapp: Arc<WhatsappBridge>,
    /// Process start time for the health endpoint's uptime figure.
    pub started_at: Instant,
}

impl AppState {
    pub fn leads(&self) -> Result<&LeadsService, BalcaoError> {
        self.leads
            .as_ref()
            .ok_or_else(|| BalcaoError::Config("CRM não configurado".into()))
    }

    pub fn pedidos(&self) -> Result<&PedidosService, BalcaoError> {
        self.pedidos
            .as_ref()
            .ok_or_else(|| BalcaoError::Config("Pedidos não configurados".into()))
    }

    pub fn campanhas(&self) -> Result<&CampanhasService, BalcaoError> {
        self.campanhas
            .as_ref()
            .ok_or_else(|| BalcaoError::Config("Campanhas não configuradas".into()))
    }

    pub fn stock(&self) -> Result<&StockService, BalcaoError> {
        self.stock
            .as_ref()
            .ok_or_else(|| BalcaoError::Config("Estoque não configurado".into()))
    }

    pub fn sheets(&self) -> Result<&Arc<SheetsService>, BalcaoError> {
        self.sheets
            .as_ref()
            .ok_or_else(|| BalcaoError::Config("Planilhas não configuradas".into()))
    }

    pub fn auth(&self) -> Result<&AuthService, BalcaoError> {
        self.auth
            .as_ref()
            .ok_or_else(|| BalcaoError::Config("Autenticação não configurada".into()))
    }
}

/// Assemble the full route tree. Split from [`start_server`] so tests can
/// drive the router directly.
pub fn build_router(state: AppState, cors_origin: &str) -> Router {
    let api = Router::new()
        // auth
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/verify", get(handlers::auth::verify))
        // crm
        .route("/crm/status", get(handlers::crm::status))
        .route(
            "/crm/leads",
            get(handlers::crm::list).post(handlers::crm::create),
        )
        .route(
            "/crm/leads/{id}",
            patch(handlers::crm::update).delete(handlers::crm::remove),
        )
        // pedidos
        .route(
            "/pedidos",
            get(handlers::pedidos::list).post(handlers::pedidos::create),
        )
        .route("/pedidos/stats/overview", get(handlers::pedidos::stats))
        .route("/pedidos/history", get(handlers::pedidos::history))
        .route(
            "/pedidos/{id}",
            get(handlers::pedidos::get)
                .patch(handlers::pedidos::update)
                .delete(handlers::pedidos::remove),
        )
        .route("/pedidos/{id}/status", patch(handlers::pedidos::update_status))
        // campanhas
        .route(
            "/campanhas",
            get(handlers::campanhas::list).post(handlers::campanhas::create),
        )
        .route("/campanhas/texto", get(handlers::campanhas::texto))
        .route("/campanhas/clear-cache", post(handlers::campanhas::clear_cache))
        .route(
            "/campanhas/{id}",
            put(handlers::campanhas::update).delete(handlers::campanhas::remove),
        )
        // stock
        .route(
            "/stock/products",
            get(handlers::stock::list).post(handlers::stock::create),
        )
        .route(
            "/stock/products/{id}",
            put(handlers::stock::update).delete(handlers::stock::remove),
        )
        .route(
            "/stock/products/{id}/quantity",
            patch(handlers::stock::update_quantity),
        )
        .route("/stock/low-stock", get(handlers::stock::low_stock))
        .route("/stock/status", get(handlers::stock::status))
        // sheets
        .route("/sheets/connect", post(handlers::sheets::connect))
        .route("/sheets/read", get(handlers::sheets::read))
        .route("/sheets/update", put(handlers::sheets::update))
        .route("/sheets/add-row", post(handlers::sheets::add_row))
        .route(
            "/sheets/delete-row/{rowIndex}",
            delete(handlers::sheets::delete_row),
        )
        .route("/sheets/update-cell", put(handlers::sheets::update_cell))
        .route("/sheets/low-stock", get(handlers::sheets::low_stock))
        .route("/sheets/status", get(handlers::sheets::status))
        .route("/sheets/disconnect", post(handlers::sheets::disconnect))
        // whatsapp
        .route("/whatsapp/chats", get(handlers::whatsapp::chats))
        .route(
            "/whatsapp/chats/{chatId}/messages",
            get(handlers::whatsapp::chat_messages),
        )
        .route("/whatsapp/send", post(handlers::whatsapp::send))
        .route("/whatsapp/block-ai/{chatId}", post(handlers::whatsapp::block_ai))
        .route(
            "/whatsapp/unblock-ai/{chatId}",
            post(handlers::whatsapp::unblock_ai),
        )
        .route("/whatsapp/ai-status/{chatId}", get(handlers::whatsapp::ai_status))
        .route("/whatsapp/status", get(handlers::whatsapp::status));

    let webhooks = Router::new()
        .route("/pedido", post(handlers::webhooks::pedido))
        .route("/chamar-atendente", post(handlers::webhooks::chamar_atendente))
        .route("/crm/lead", post(handlers::webhooks::crm_lead));

    Router::new()
        .nest("/api", api)
        .nest("/webhook", webhooks)
        .route("/health", get(handlers::health::health))
        .route("/ws", get(ws::ws_handler))
        .layer(cors_layer(cors_origin))
        .with_state(state)
}

fn cors_layer(origin: &str) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    match origin.parse::<HeaderValue>() {
        Ok(value) if origin != "*" => layer.allow_origin(value),
        _ => layer.allow_origin(Any),
    }
}

/// Bind and serve until the shutdown future resolves.
pub async fn start_server(
    host: &str,
    port: u16,
    router: Router,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), BalcaoError> {
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| BalcaoError::Channel {
            message: format!("failed to bind gateway to {addr}: {e}"),
            source: Some(Box::new(e)),
        })?;

    tracing::info!("gateway listening on {addr}");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| BalcaoError::Channel {
            message: format!("gateway server error: {e}"),
            source: Some(Box::new(e)),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use balcao_config::model::WhatsappConfig;
    use balcao_whatsapp::NoopTransport;

    #[test]
    fn app_state_is_clone_and_reports_missing_services() {
        let bus = EventBus::new();
        let state = AppState {
            bus: bus.clone(),
            auth: None,
            baserow: None,
            leads: None,
            pedidos: None,
            campanhas: None,
            stock: None,
            sheets: None,
            whatsapp: Arc::new(WhatsappBridge::new(
                &WhatsappConfig::default(),
                Arc::new(NoopTransport),
                bus,
            )),
            started_at: Instant::now(),
        };
        let cloned = state.clone();

        assert!(matches!(cloned.leads(), Err(BalcaoError::Config(_))));
        assert!(matches!(cloned.stock(), Err(BalcaoError::Config(_))));
        assert!(matches!(cloned.auth(), Err(BalcaoError::Config(_))));
    }

    #[test]
    fn wildcard_origin_builds_permissive_cors() {
        // Must not panic on either form.
        let _ = cors_layer("*");
        let _ = cors_layer("http://localhost:5173");
    }
}
