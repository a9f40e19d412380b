// SPDX-FileCopyrightText: 2026 Balcao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Balcao dashboard.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Balcao configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable
/// overrides. All sections are optional and default to sensible values;
/// integrations whose credentials stay `None` are simply reported as not
/// configured when their endpoints are hit.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BalcaoConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Dashboard login and token signing settings.
    #[serde(default)]
    pub auth: AuthConfig,

    /// Low-code database settings (leads, orders, campaigns).
    #[serde(default)]
    pub baserow: BaserowConfig,

    /// Inventory store settings.
    #[serde(default)]
    pub stock: StockConfig,

    /// Spreadsheet API settings.
    #[serde(default)]
    pub sheets: SheetsConfig,

    /// Messaging bridge settings.
    #[serde(default)]
    pub whatsapp: WhatsappConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Address to bind the server to.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Origin allowed by the CORS layer.
    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origin: default_cors_origin(),
            log_level: default_log_level(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3001
}

fn default_cors_origin() -> String {
    "http://localhost:5173".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Dashboard login and token signing configuration.
///
/// There is a single operator account. Tokens are HMAC-signed and expire
/// after `token_ttl_hours`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    /// Operator login email. `None` disables the login endpoint.
    #[serde(default)]
    pub admin_email: Option<String>,

    /// Operator login password.
    #[serde(default)]
    pub admin_password: Option<String>,

    /// Display name returned after login.
    #[serde(default = "default_admin_name")]
    pub admin_name: String,

    /// Secret used to sign access tokens. `None` disables the login endpoint.
    #[serde(default)]
    pub token_secret: Option<String>,

    /// Token lifetime in hours.
    #[serde(default = "default_token_ttl_hours")]
    pub token_ttl_hours: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            admin_email: None,
            admin_password: None,
            admin_name: default_admin_name(),
            token_secret: None,
            token_ttl_hours: default_token_ttl_hours(),
        }
    }
}

fn default_admin_name() -> String {
    "Administrador".to_string()
}

fn default_token_ttl_hours() -> u64 {
    168 // 7 days
}

/// Low-code database configuration.
///
/// Table ids left as `None` mark the corresponding view (CRM, orders,
/// campaigns) as not configured.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BaserowConfig {
    /// Base API URL.
    #[serde(default = "default_baserow_url")]
    pub api_url: String,

    /// Account email used for token auth.
    #[serde(default)]
    pub email: Option<String>,

    /// Account password used for token auth.
    #[serde(default)]
    pub password: Option<String>,

    /// Table id holding CRM leads.
    #[serde(default)]
    pub leads_table_id: Option<u64>,

    /// Table id holding orders.
    #[serde(default)]
    pub pedidos_table_id: Option<u64>,

    /// Table id holding campaigns.
    #[serde(default)]
    pub campanhas_table_id: Option<u64>,
}

impl Default for BaserowConfig {
    fn default() -> Self {
        Self {
            api_url: default_baserow_url(),
            email: None,
            password: None,
            leads_table_id: None,
            pedidos_table_id: None,
            campanhas_table_id: None,
        }
    }
}

fn default_baserow_url() -> String {
    "https://api.baserow.io".to_string()
}

/// Inventory store configuration (PostgREST-style API).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StockConfig {
    /// Base API URL of the Postgres REST service. `None` disables inventory.
    #[serde(default)]
    pub api_url: Option<String>,

    /// Service API key, sent as both `apikey` and bearer token.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Table holding products.
    #[serde(default = "default_stock_table")]
    pub table: String,

    /// Minimum-stock threshold applied to items created without one.
    #[serde(default = "default_minimum")]
    pub default_minimum: i64,
}

impl Default for StockConfig {
    fn default() -> Self {
        Self {
            api_url: None,
            api_key: None,
            table: default_stock_table(),
            default_minimum: default_minimum(),
        }
    }
}

fn default_stock_table() -> String {
    "products".to_string()
}

fn default_minimum() -> i64 {
    10
}

/// Spreadsheet API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SheetsConfig {
    /// Base API URL.
    #[serde(default = "default_sheets_url")]
    pub api_url: String,

    /// OAuth access token used for spreadsheet calls. `None` disables the
    /// spreadsheet endpoints.
    #[serde(default)]
    pub api_token: Option<String>,
}

impl Default for SheetsConfig {
    fn default() -> Self {
        Self {
            api_url: default_sheets_url(),
            api_token: None,
        }
    }
}

fn default_sheets_url() -> String {
    "https://sheets.googleapis.com".to_string()
}

/// Messaging bridge configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WhatsappConfig {
    /// Enable the messaging bridge. Opt-in.
    #[serde(default)]
    pub enabled: bool,

    /// Automation webhook that answers incoming messages. `None` means
    /// incoming messages are relayed to the dashboard but never answered.
    #[serde(default)]
    pub automation_webhook_url: Option<String>,

    /// Timeout for one automation webhook call, in seconds.
    #[serde(default = "default_webhook_timeout_secs")]
    pub webhook_timeout_secs: u64,

    /// Unexpected-disconnect recovery attempts before giving up.
    #[serde(default = "default_max_reconnect_attempts")]
    pub max_reconnect_attempts: u32,

    /// Delay between recovery attempts, in seconds.
    #[serde(default = "default_reconnect_delay_secs")]
    pub reconnect_delay_secs: u64,

    /// Grace period after authentication before the session is forced to
    /// ready, in seconds.
    #[serde(default = "default_ready_grace_secs")]
    pub ready_grace_secs: u64,

    /// Budget for enriching one chat entry during list assembly, in
    /// milliseconds.
    #[serde(default = "default_chat_sync_budget_ms")]
    pub chat_sync_budget_ms: u64,
}

impl Default for WhatsappConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            automation_webhook_url: None,
            webhook_timeout_secs: default_webhook_timeout_secs(),
            max_reconnect_attempts: default_max_reconnect_attempts(),
            reconnect_delay_secs: default_reconnect_delay_secs(),
            ready_grace_secs: default_ready_grace_secs(),
            chat_sync_budget_ms: default_chat_sync_budget_ms(),
        }
    }
}

fn default_webhook_timeout_secs() -> u64 {
    30
}

fn default_max_reconnect_attempts() -> u32 {
    5
}

fn default_reconnect_delay_secs() -> u64 {
    5
}

fn default_ready_grace_secs() -> u64 {
    20
}

fn default_chat_sync_budget_ms() -> u64 {
    2500
}
