// SPDX-FileCopyrightText: 2026 Waworker Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Control API HTTP server.

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tracing::info;

use waworker_config::model::ServerConfig;
use waworker_core::traits::DocumentStore;
use waworker_core::WorkerError;
use waworker_ingress::MessageIngress;
use waworker_supervisor::SupervisorRegistry;

use crate::handlers;

/// Shared state for all control API handlers.
#[derive(Clone)]
pub struct GatewayState {
    pub registry: Arc<SupervisorRegistry>,
    pub store: Arc<dyn DocumentStore>,
    pub ingress: MessageIngress,
}

impl GatewayState {
    pub fn new(registry: Arc<SupervisorRegistry>, store: Arc<dyn DocumentStore>) -> Self {
        let ingress = MessageIngress::new(store.clone());
        Self {
            registry,
            store,
            ingress,
        }
    }
}

/// Build the control API router.
pub fn build_router(state: GatewayState) -> Router {
    Router::new()
        .route("/health", get(handlers::get_health))
        .route(
            "/v1/channels",
            post(handlers::post_channels).get(handlers::get_channels),
        )
        .route(
            "/v1/channels/{id}",
            get(handlers::get_channel).patch(handlers::patch_channel),
        )
        .route("/v1/channels/{id}/qr", post(handlers::post_qr))
        .route("/v1/channels/{id}/disconnect", post(handlers::post_disconnect))
        .route(
            "/v1/channels/{id}/resetSession",
            post(handlers::post_reset_session),
        )
        .route("/v1/channels/{id}/repair", post(handlers::post_repair))
        .route("/v1/channels/{id}/messages/send", post(handlers::post_send))
        .route(
            "/v1/channels/{id}/conversations/{jid}/markRead",
            post(handlers::post_mark_read),
        )
        .route(
            "/v1/channels/{id}/bot/config",
            get(handlers::get_bot_config).put(handlers::put_bot_config),
        )
        .fallback(handlers::not_found)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind and serve the control API until `shutdown` fires.
pub async fn start_server(
    config: &ServerConfig,
    state: GatewayState,
    shutdown: CancellationToken,
) -> Result<(), WorkerError> {
    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| WorkerError::Internal(format!("failed to bind {addr}: {e}")))?;
    info!(%addr, "control API listening");

    let app = build_router(state);
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(|e| WorkerError::Internal(format!("control API server error: {e}")))
}
