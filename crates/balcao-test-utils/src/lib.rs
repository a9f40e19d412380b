// SPDX-FileCopyrightText: 2026 Balcao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared test doubles for Balcao integration tests.

pub mod mock_transport;

pub use mock_transport::MockTransport;
