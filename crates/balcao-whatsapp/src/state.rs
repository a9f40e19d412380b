// SPDX-FileCopyrightText: 2026 Balcao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Messaging session lifecycle.

use serde::Serialize;
use strum::Display;

/// Where the platform session currently stands.
///
/// `Ready` is the only state that accepts outbound sends. `Failed` is
/// terminal: recovery attempts were exhausted and a manual restart is
/// required.
///
/// The lifecycle moves through the `on_*` steps below; a step whose edge
/// is not legal from the current state returns the state unchanged, so
/// stray transport events cannot resurrect a failed session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, Serialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BridgeState {
    #[default]
    Disconnected,
    /// A QR code was issued and awaits scanning.
    WaitingForScan,
    /// Credentials accepted, session still syncing.
    Authenticated,
    Ready,
    /// Sleeping between reconnect attempts after an unexpected drop.
    Recovering,
    Failed,
}

impl BridgeState {
    /// A QR code was issued and awaits the operator's scan.
    pub fn on_qr(self) -> BridgeState {
        match self {
            BridgeState::Failed => self,
            _ => BridgeState::WaitingForScan,
        }
    }

    /// The platform accepted the session credentials.
    pub fn on_authenticated(self) -> BridgeState {
        match self {
            BridgeState::Failed => self,
            _ => BridgeState::Authenticated,
        }
    }

    /// The session finished syncing, whether signalled or forced.
    pub fn on_ready(self) -> BridgeState {
        match self {
            BridgeState::Failed => self,
            _ => BridgeState::Ready,
        }
    }

    /// The session dropped or authentication was rejected.
    pub fn on_drop(self) -> BridgeState {
        match self {
            BridgeState::Failed => self,
            _ => BridgeState::Disconnected,
        }
    }

    /// A reconnect attempt is about to run. Only a dropped session
    /// recovers; a live one is left alone.
    pub fn on_retry(self) -> BridgeState {
        match self {
            BridgeState::Disconnected | BridgeState::Recovering => BridgeState::Recovering,
            _ => self,
        }
    }

    /// The reconnect budget ran out.
    pub fn on_exhausted(self) -> BridgeState {
        match self {
            BridgeState::Disconnected | BridgeState::Recovering => BridgeState::Failed,
            _ => self,
        }
    }

    pub fn is_ready(self) -> bool {
        self == BridgeState::Ready
    }

    /// Status string surfaced to the dashboard.
    pub fn as_status(self) -> &'static str {
        match self {
            BridgeState::Disconnected => "disconnected",
            BridgeState::WaitingForScan => "waiting_for_scan",
            BridgeState::Authenticated => "authenticated",
            BridgeState::Ready => "connected",
            BridgeState::Recovering => "recovering",
            BridgeState::Failed => "failed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_disconnected() {
        assert_eq!(BridgeState::default(), BridgeState::Disconnected);
        assert!(!BridgeState::default().is_ready());
    }

    #[test]
    fn ready_maps_to_connected_status() {
        assert_eq!(BridgeState::Ready.as_status(), "connected");
        assert!(BridgeState::Ready.is_ready());
    }

    #[test]
    fn serializes_snake_case() {
        let s = serde_json::to_string(&BridgeState::WaitingForScan).unwrap();
        assert_eq!(s, "\"waiting_for_scan\"");
    }

    #[test]
    fn full_session_walk() {
        let s = BridgeState::default().on_qr().on_authenticated().on_ready();
        assert!(s.is_ready());

        let s = s.on_drop().on_retry();
        assert_eq!(s, BridgeState::Recovering);
        assert_eq!(s.on_exhausted(), BridgeState::Failed);
    }

    #[test]
    fn failed_is_terminal() {
        let s = BridgeState::Failed;
        assert_eq!(s.on_qr(), BridgeState::Failed);
        assert_eq!(s.on_authenticated(), BridgeState::Failed);
        assert_eq!(s.on_ready(), BridgeState::Failed);
        assert_eq!(s.on_drop(), BridgeState::Failed);
        assert_eq!(s.on_retry(), BridgeState::Failed);
    }

    #[test]
    fn recovery_steps_need_a_dropped_session() {
        assert_eq!(BridgeState::Ready.on_retry(), BridgeState::Ready);
        assert_eq!(
            BridgeState::Authenticated.on_exhausted(),
            BridgeState::Authenticated
        );
    }
}
