//! # Frontdesk Gateway Crate
//!
//! The WebSocket edge of the realtime subsystem: connection admission,
//! per-connection read/write loops, and routing of inbound frames to the
//! conversation services. All state is injected through [`GatewayState`];
//! nothing here is a process-wide singleton.

pub mod error;
pub mod state;
pub mod websocket;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::{GatewayError, GatewayResult};
pub use state::GatewayState;

use axum::{http::Method, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

/// Create the main application router with all routes
pub fn create_router(state: GatewayState) -> Router {
    let arc_state = Arc::new(state);
    Router::new()
        .route("/health", get(health_check))
        .merge(websocket::create_websocket_routes().with_state(arc_state))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET])
                .allow_headers(Any),
        )
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        timestamp: Utc::now().to_rfc3339(),
    })
}
