// SPDX-FileCopyrightText: 2026 Balcao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP/WebSocket gateway for the Balcao dashboard.
//!
//! Exposes the REST surface under `/api`, the automation webhooks under
//! `/webhook`, a `/health` probe, and the `/ws` fan-out of the internal
//! event bus.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod server;
pub mod ws;

pub use auth::AuthService;
pub use error::ApiError;
pub use server::{build_router, start_server, AppState};
