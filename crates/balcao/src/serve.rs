// SPDX-FileCopyrightText: 2026 Balcao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `balcao serve` command implementation.
//!
//! Wires the configured adapters (low-code database, inventory store,
//! spreadsheet API, messaging bridge) to the event bus and the HTTP/WebSocket
//! gateway, then runs until ctrl-c or SIGTERM. Integrations whose credentials
//! are missing stay disabled; their endpoints answer 503 instead of failing
//! the whole process.

use std::sync::Arc;
use std::time::Instant;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use balcao_baserow::{BaserowClient, CampanhasService, LeadsService, PedidosService};
use balcao_bus::EventBus;
use balcao_config::model::BalcaoConfig;
use balcao_core::BalcaoError;
use balcao_gateway::{build_router, start_server, AppState, AuthService};
use balcao_sheets::SheetsService;
use balcao_stock::StockService;
use balcao_whatsapp::{NoopTransport, WhatsappBridge};

/// Runs the `balcao serve` command.
pub async fn run_serve(config: BalcaoConfig) -> Result<(), BalcaoError> {
    init_tracing(&config.server.log_level);

    let bus = EventBus::new();

    let auth = AuthService::from_config(&config.auth);
    if auth.is_none() {
        warn!("auth não configurado; login desabilitado");
    }

    let baserow = build_baserow(&config)?;
    let leads = service_for_table(&baserow, config.baserow.leads_table_id, LeadsService::new);
    let pedidos = service_for_table(&baserow, config.baserow.pedidos_table_id, PedidosService::new);
    let campanhas = service_for_table(
        &baserow,
        config.baserow.campanhas_table_id,
        CampanhasService::new,
    );
    if baserow.is_none() {
        warn!("baserow não configurado; CRM, pedidos e campanhas desabilitados");
    }

    let stock = build_stock(&config)?;
    if stock.is_none() {
        warn!("estoque não configurado");
    }

    let sheets = build_sheets(&config, bus.clone())?;
    if sheets.is_none() {
        warn!("planilhas não configuradas");
    }

    // The platform client is an external collaborator; without one compiled
    // in, the bridge runs on the noop transport and serves cached data only.
    let whatsapp = Arc::new(WhatsappBridge::new(
        &config.whatsapp,
        Arc::new(NoopTransport),
        bus.clone(),
    ));
    if config.whatsapp.enabled {
        info!("iniciando bridge do WhatsApp");
        tokio::spawn(Arc::clone(&whatsapp).run());
    } else {
        debug!("bridge do WhatsApp desabilitado");
    }

    let state = AppState {
        bus,
        auth,
        baserow,
        leads,
        pedidos,
        campanhas,
        stock,
        sheets,
        whatsapp: Arc::clone(&whatsapp),
        started_at: Instant::now(),
    };

    let router = build_router(state, &config.server.cors_origin);

    let cancel = install_signal_handler();
    info!(
        host = %config.server.host,
        port = config.server.port,
        "balcao serve iniciado"
    );
    start_server(
        &config.server.host,
        config.server.port,
        router,
        cancel.cancelled_owned(),
    )
    .await?;

    if let Err(e) = whatsapp.shutdown().await {
        warn!(error = %e, "encerramento do bridge falhou");
    }

    info!("balcao serve encerrado");
    Ok(())
}

fn build_baserow(config: &BalcaoConfig) -> Result<Option<BaserowClient>, BalcaoError> {
    let (Some(email), Some(password)) = (
        config.baserow.email.clone(),
        config.baserow.password.clone(),
    ) else {
        return Ok(None);
    };
    let client = BaserowClient::new(config.baserow.api_url.clone(), email, password)?;
    Ok(Some(client))
}

/// A Baserow-backed view exists only when both the client and its table id
/// are configured.
fn service_for_table<S>(
    client: &Option<BaserowClient>,
    table_id: Option<u64>,
    build: impl FnOnce(BaserowClient, u64) -> S,
) -> Option<S> {
    match (client, table_id) {
        (Some(client), Some(table_id)) => Some(build(client.clone(), table_id)),
        _ => None,
    }
}

fn build_stock(config: &BalcaoConfig) -> Result<Option<StockService>, BalcaoError> {
    let (Some(api_url), Some(api_key)) =
        (config.stock.api_url.clone(), config.stock.api_key.clone())
    else {
        return Ok(None);
    };
    let service = StockService::new(
        api_url,
        api_key,
        config.stock.table.clone(),
        config.stock.default_minimum,
    )?;
    Ok(Some(service))
}

fn build_sheets(
    config: &BalcaoConfig,
    bus: EventBus,
) -> Result<Option<Arc<SheetsService>>, BalcaoError> {
    let Some(api_token) = config.sheets.api_token.clone() else {
        return Ok(None);
    };
    let service = SheetsService::new(config.sheets.api_url.clone(), api_token, bus)?;
    Ok(Some(Arc::new(service)))
}

/// Installs signal handlers for SIGTERM and SIGINT.
///
/// Returns a [`CancellationToken`] that is cancelled when either signal is
/// received.
fn install_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let token_clone = token.clone();

    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            let mut sigterm =
                signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");

            tokio::select! {
                _ = ctrl_c => {
                    info!("SIGINT recebido, encerrando");
                }
                _ = sigterm.recv() => {
                    info!("SIGTERM recebido, encerrando");
                }
            }
        }

        #[cfg(not(unix))]
        {
            let _ = ctrl_c.await;
            info!("ctrl-c recebido, encerrando");
        }

        token_clone.cancel();
    });

    token
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("balcao={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
