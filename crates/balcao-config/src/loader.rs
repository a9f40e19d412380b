// SPDX-FileCopyrightText: 2026 Balcao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./balcao.toml` > `~/.config/balcao/balcao.toml` > `/etc/balcao/balcao.toml`
//! with environment variable overrides via `BALCAO_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::BalcaoConfig;

/// TOML files consulted by [`load_config`], lowest precedence first.
/// Missing files are skipped silently.
pub(crate) fn config_file_candidates() -> Vec<PathBuf> {
    vec![
        PathBuf::from("/etc/balcao/balcao.toml"),
        dirs::config_dir()
            .map(|d| d.join("balcao/balcao.toml"))
            .unwrap_or_default(),
        PathBuf::from("balcao.toml"),
    ]
}

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier): compiled defaults, then each
/// file from [`config_file_candidates`], then `BALCAO_*` environment
/// variables.
pub fn load_config() -> Result<BalcaoConfig, figment::Error> {
    let mut figment = Figment::new().merge(Serialized::defaults(BalcaoConfig::default()));
    for path in config_file_candidates() {
        figment = figment.merge(Toml::file(path));
    }
    figment.merge(env_provider()).extract()
}

/// Load configuration from a specific TOML string only (no XDG lookup).
///
/// Used for testing and explicit config specification.
pub fn load_config_from_str(toml_content: &str) -> Result<BalcaoConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(BalcaoConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<BalcaoConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(BalcaoConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for section-to-dot mapping.
///
/// CRITICAL: Uses `Env::map()` NOT `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names. For example, `BALCAO_BASEROW_LEADS_TABLE_ID`
/// must map to `baserow.leads_table_id`, not `baserow.leads.table.id`.
fn env_provider() -> Env {
    Env::prefixed("BALCAO_").map(|key| {
        // `key` is the lowercased env var name with prefix stripped.
        // Example: BALCAO_BASEROW_LEADS_TABLE_ID -> "baserow_leads_table_id"
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("server_", "server.", 1)
            .replacen("auth_", "auth.", 1)
            .replacen("baserow_", "baserow.", 1)
            .replacen("stock_", "stock.", 1)
            .replacen("sheets_", "sheets.", 1)
            .replacen("whatsapp_", "whatsapp.", 1);
        mapped.into()
    })
}
