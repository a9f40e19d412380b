// SPDX-FileCopyrightText: 2026 Balcao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Balcao operations dashboard.
//!
//! This crate provides the shared error type, the frontend-facing domain
//! records, and the field-resolution tables the store adapters use to read
//! loosely-typed external rows.

pub mod error;
pub mod fields;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::BalcaoError;
pub use types::{
    Campanha, ChatMessage, ChatSummary, ContactInfo, Direction, HistoryBucket, LastMessage, Lead,
    LeadStatus, Pedido, PedidoStats, PedidoStatus, Produto,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn balcao_error_has_all_variants() {
        // Verify all 8 error variants exist and can be constructed.
        let _config = BalcaoError::Config("test".into());
        let _validation = BalcaoError::Validation("test".into());
        let _not_found = BalcaoError::NotFound("Lead".into());
        let _upstream_auth = BalcaoError::UpstreamAuth {
            message: "test".into(),
        };
        let _upstream = BalcaoError::Upstream {
            message: "test".into(),
            source: None,
        };
        let _channel = BalcaoError::Channel {
            message: "test".into(),
            source: Some(Box::new(std::io::Error::other("test"))),
        };
        let _timeout = BalcaoError::Timeout {
            duration: std::time::Duration::from_secs(30),
        };
        let _internal = BalcaoError::Internal("test".into());
    }

    #[test]
    fn not_found_message_is_localized() {
        let err = BalcaoError::NotFound("Pedido".into());
        assert_eq!(err.to_string(), "Pedido não encontrado");
    }
}
