// SPDX-FileCopyrightText: 2026 Balcao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers, one module per dashboard surface.
//!
//! Success envelopes mirror what the frontend expects: `{"success": true,
//! ...}` with Portuguese keys; failures go through
//! [`ApiError`](crate::error::ApiError).

pub mod auth;
pub mod campanhas;
pub mod crm;
pub mod health;
pub mod pedidos;
pub mod sheets;
pub mod stock;
pub mod webhooks;
pub mod whatsapp;
