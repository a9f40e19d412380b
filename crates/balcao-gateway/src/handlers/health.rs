// SPDX-FileCopyrightText: 2026 Balcao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Health endpoint for supervisors and uptime probes.

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde_json::{json, Value};

use crate::server::AppState;

/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<Value> {
    let (vsz_mb, rss_mb) = process_memory_mb();

    Json(json!({
        "status": "ok",
        "timestamp": Utc::now().to_rfc3339(),
        "uptime": state.started_at.elapsed().as_secs(),
        "memory": {
            "rss": format!("{rss_mb}MB"),
            "vsz": format!("{vsz_mb}MB"),
        },
        "services": {
            "whatsapp": state.whatsapp.status().status,
            "busSubscribers": state.bus.subscriber_count(),
        },
    }))
}

/// Virtual and resident set size in megabytes, from `/proc/self/statm`.
/// Returns zeros where procfs is unavailable.
fn process_memory_mb() -> (u64, u64) {
    let Ok(statm) = std::fs::read_to_string("/proc/self/statm") else {
        return (0, 0);
    };
    let mut fields = statm.split_whitespace();
    let pages = |f: Option<&str>| f.and_then(|v| v.parse::<u64>().ok()).unwrap_or(0);
    let size = pages(fields.next());
    let resident = pages(fields.next());

    let page_size = 4096;
    (
        size * page_size / (1024 * 1024),
        resident * page_size / (1024 * 1024),
    )
}
