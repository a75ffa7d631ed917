//! Health and version endpoints
//!
//! `/health` is a liveness probe: 200 whenever herald is running,
//! regardless of store backend. `/version` exposes build metadata for
//! deployment verification.

use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};
use serde::Serialize;
use std::sync::Arc;

use crate::server::AppState;

/// Liveness response
#[derive(Serialize)]
pub struct HealthResponse {
    pub healthy: bool,
    pub version: &'static str,
    /// Uptime in seconds
    pub uptime: u64,
    /// Operating mode
    pub mode: String,
    pub node_id: String,
    /// Store backend in use ("mongodb" or "memory")
    pub store: &'static str,
    /// Live feed subscribers
    pub subscribers: usize,
    pub timestamp: String,
}

/// Handle GET /health
pub fn health_check(state: Arc<AppState>) -> Response<Full<Bytes>> {
    let response = HealthResponse {
        healthy: true,
        version: env!("CARGO_PKG_VERSION"),
        uptime: state.started.elapsed().as_secs(),
        mode: if state.args.dev_mode {
            "development".to_string()
        } else {
            "production".to_string()
        },
        node_id: state.args.node_id.to_string(),
        store: state.store_backend,
        subscribers: state.feed.subscriber_count(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    };

    let body = serde_json::to_vec(&response).unwrap_or_default();

    Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", "application/json")
        .header("Cache-Control", "no-cache")
        .body(Full::new(Bytes::from(body)))
        .unwrap()
}

/// Handle GET /version
pub fn version_info() -> Response<Full<Bytes>> {
    let body = serde_json::json!({
        "version": env!("CARGO_PKG_VERSION"),
        "git_commit": env!("GIT_COMMIT_SHORT"),
        "build_timestamp": env!("BUILD_TIMESTAMP"),
    });

    Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", "application/json")
        .header("Cache-Control", "no-cache")
        .body(Full::new(Bytes::from(body.to_string())))
        .unwrap()
}
