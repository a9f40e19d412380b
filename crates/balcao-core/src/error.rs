// SPDX-FileCopyrightText: 2026 Balcao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types shared across the Balcao adapters and gateway.

use thiserror::Error;

/// The primary error type used across all Balcao adapters and the gateway.
///
/// The gateway maps these centrally to HTTP status codes: `Validation`
/// becomes 400, `NotFound` 404, and everything upstream-related 500.
#[derive(Debug, Error)]
pub enum BalcaoError {
    /// Configuration errors (missing table id, missing credentials).
    #[error("configuration error: {0}")]
    Config(String),

    /// A request failed shape validation before any external call.
    #[error("validation error: {0}")]
    Validation(String),

    /// The requested entity does not exist.
    #[error("{0} não encontrado")]
    NotFound(String),

    /// The external service rejected our credentials.
    #[error("upstream auth failure: {message}")]
    UpstreamAuth { message: String },

    /// The external service is unreachable or returned an error.
    #[error("upstream error: {message}")]
    Upstream {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Messaging bridge errors (transport failure, not connected).
    #[error("channel error: {message}")]
    Channel {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl BalcaoError {
    /// Shorthand for an upstream error wrapping a reqwest failure.
    pub fn upstream(message: impl Into<String>) -> Self {
        Self::Upstream {
            message: message.into(),
            source: None,
        }
    }

    /// Shorthand for a channel error with no source.
    pub fn channel(message: impl Into<String>) -> Self {
        Self::Channel {
            message: message.into(),
            source: None,
        }
    }
}
