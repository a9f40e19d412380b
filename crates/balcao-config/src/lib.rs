// SPDX-FileCopyrightText: 2026 Balcao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration for the Balcao dashboard server.
//!
//! A single `balcao.toml`, merged across the XDG hierarchy and overridable
//! through `BALCAO_*` environment variables, drives every adapter: the
//! server binding, dashboard auth, the low-code CRM tables, the stock
//! store, the spreadsheet bridge, and the messaging session. Unknown keys
//! are rejected and reported with source spans and typo suggestions, so a
//! bad edit fails the boot loudly instead of silently running on defaults.
//!
//! ```no_run
//! let config = balcao_config::load_and_validate().unwrap_or_else(|errors| {
//!     balcao_config::render_errors(&errors);
//!     std::process::exit(1);
//! });
//! println!("Listening on {}:{}", config.server.host, config.server.port);
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

pub use diagnostic::{render_errors, ConfigError};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::BalcaoConfig;

/// Load the configuration from the XDG hierarchy, then validate it.
pub fn load_and_validate() -> Result<BalcaoConfig, Vec<ConfigError>> {
    checked(loader::load_config(), read_toml_hierarchy)
}

/// Same as [`load_and_validate`] but for an in-memory TOML document.
pub fn load_and_validate_str(toml_content: &str) -> Result<BalcaoConfig, Vec<ConfigError>> {
    checked(loader::load_config_from_str(toml_content), || {
        vec![("<inline>".to_string(), toml_content.to_string())]
    })
}

/// Run the cross-field validation, or convert the extraction failure into
/// diagnostics. Source documents are only materialized on the failure
/// path, where a span is worth pointing at.
fn checked(
    loaded: Result<BalcaoConfig, figment::Error>,
    sources: impl FnOnce() -> Vec<(String, String)>,
) -> Result<BalcaoConfig, Vec<ConfigError>> {
    match loaded {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => Err(diagnostic::figment_to_config_errors(err, &sources())),
    }
}

/// Content of every TOML file in the hierarchy, keyed by the path figment
/// reports as the error source.
fn read_toml_hierarchy() -> Vec<(String, String)> {
    loader::config_file_candidates()
        .into_iter()
        .filter_map(|path| {
            let content = std::fs::read_to_string(&path).ok()?;
            // Figment reports the local file with an absolute path.
            let shown = if path.is_relative() {
                std::env::current_dir()
                    .map(|d| d.join(&path))
                    .unwrap_or(path)
            } else {
                path
            };
            Some((shown.display().to_string(), content))
        })
        .collect()
}
