// SPDX-FileCopyrightText: 2026 Balcao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Low-code database adapter: leads, orders, and campaigns.
//!
//! One [`BaserowClient`] handles auth and raw row access; the per-view
//! services map raw rows into the frontend-facing records from
//! `balcao_core` and hold the view-specific rules (status casing, default
//! fills, stats, history buckets, campaign text).

pub mod campanhas;
pub mod client;
pub mod leads;
pub mod pedidos;

pub use campanhas::{CampanhaUpdate, CampanhasService, NewCampanha};
pub use client::BaserowClient;
pub use leads::{LeadUpdate, LeadsService, NewLead};
pub use pedidos::{NewPedido, PedidoFilter, PedidoUpdate, PedidosService};
