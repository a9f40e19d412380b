// SPDX-FileCopyrightText: 2026 Balcao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes, such as valid bind addresses, paired credentials, and
//! non-zero timeouts.

use crate::diagnostic::ConfigError;
use crate::model::BalcaoConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &BalcaoConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let host = config.server.host.trim();
    if host.is_empty() {
        errors.push(ConfigError::Validation {
            message: "server.host must not be empty".to_string(),
        });
    } else {
        let is_valid_ip = host.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':');
        if !is_valid_ip && !is_valid_hostname {
            errors.push(ConfigError::Validation {
                message: format!("server.host `{host}` is not a valid IP address or hostname"),
            });
        }
    }

    if config.server.port == 0 {
        errors.push(ConfigError::Validation {
            message: "server.port must not be 0".to_string(),
        });
    }

    // Login requires the full credential triple.
    let auth_partial = [
        ("auth.admin_email", config.auth.admin_email.is_some()),
        ("auth.admin_password", config.auth.admin_password.is_some()),
        ("auth.token_secret", config.auth.token_secret.is_some()),
    ];
    let set_count = auth_partial.iter().filter(|(_, set)| *set).count();
    if set_count > 0 && set_count < auth_partial.len() {
        for (key, set) in auth_partial {
            if !set {
                errors.push(ConfigError::Validation {
                    message: format!("{key} must be set when login is configured"),
                });
            }
        }
    }

    if config.auth.token_ttl_hours == 0 {
        errors.push(ConfigError::Validation {
            message: "auth.token_ttl_hours must be at least 1".to_string(),
        });
    }

    // Token auth needs both halves of the credential pair.
    if config.baserow.email.is_some() != config.baserow.password.is_some() {
        errors.push(ConfigError::Validation {
            message: "baserow.email and baserow.password must be set together".to_string(),
        });
    }

    if config.stock.api_url.is_some() && config.stock.api_key.is_none() {
        errors.push(ConfigError::Validation {
            message: "stock.api_key must be set when stock.api_url is configured".to_string(),
        });
    }

    if config.stock.default_minimum < 0 {
        errors.push(ConfigError::Validation {
            message: format!(
                "stock.default_minimum must be non-negative, got {}",
                config.stock.default_minimum
            ),
        });
    }

    if config.whatsapp.webhook_timeout_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "whatsapp.webhook_timeout_secs must be at least 1".to_string(),
        });
    }

    if config.whatsapp.enabled
        && let Some(url) = &config.whatsapp.automation_webhook_url
        && !url.starts_with("http://")
        && !url.starts_with("https://")
    {
        errors.push(ConfigError::Validation {
            message: format!("whatsapp.automation_webhook_url `{url}` is not an http(s) URL"),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
