// SPDX-FileCopyrightText: 2026 Waworker Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `waworker serve` command implementation.
//!
//! Wires the document store, credential session store, websocket
//! transport, supervisor registry, auto-reply dispatcher, and control
//! API together, then runs until SIGINT/SIGTERM.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use waworker_autoreply::{AutoReplyDispatcher, HttpResponder};
use waworker_config::model::WorkerConfig;
use waworker_core::traits::{DocumentStore, Responder};
use waworker_core::WorkerError;
use waworker_gateway::{start_server, GatewayState};
use waworker_ingress::MessageIngress;
use waworker_store::{ChannelPublisher, SqliteStore};
use waworker_supervisor::{Backoff, ChannelDeps, SupervisorRegistry};
use waworker_transport::{SessionStore, WsTransportFactory};

/// Runs the `waworker serve` command.
pub async fn run_serve(config: WorkerConfig) -> Result<(), WorkerError> {
    init_tracing(&config.worker.log_level);

    info!(name = config.worker.name.as_str(), "starting waworker serve");

    let store = Arc::new(SqliteStore::open(&config.store.database_path).await?);
    let store_dyn: Arc<dyn DocumentStore> = store.clone();
    info!(path = config.store.database_path.as_str(), "document store ready");

    let sessions = SessionStore::new(&config.session.dir);
    let factory = Arc::new(WsTransportFactory::new(&config.transport));
    let ingress = MessageIngress::new(store_dyn.clone());

    let dispatcher = match HttpResponder::from_config(&config.responder)? {
        Some(responder) => {
            info!(
                endpoint = config.responder.endpoint.as_deref().unwrap_or_default(),
                "auto-reply responder configured"
            );
            let responder: Arc<dyn Responder> = Arc::new(responder);
            Some(Arc::new(AutoReplyDispatcher::new(
                store_dyn.clone(),
                ingress.clone(),
                responder,
                config.responder.history_limit,
            )))
        }
        None => {
            info!("auto-reply dispatch disabled (no responder endpoint)");
            None
        }
    };

    let deps = ChannelDeps {
        factory,
        sessions,
        publisher: ChannelPublisher::new(store_dyn.clone()),
        ingress,
        dispatcher,
        backoff: Arc::new(Backoff::from_config(&config.reconnect)),
    };
    let registry = Arc::new(SupervisorRegistry::new(deps));

    let restored = registry.restore_from_store(store_dyn.as_ref()).await?;
    info!(restored, "channel actors restored");

    let shutdown = install_signal_handler();
    let state = GatewayState::new(registry.clone(), store_dyn);
    start_server(&config.server, state, shutdown.clone()).await?;

    info!("control API stopped, shutting down channels");
    registry.shutdown().await;
    if let Err(e) = store.close().await {
        warn!(error = %e, "document store close failed");
    }

    info!("waworker serve shutdown complete");
    Ok(())
}

/// Returns a token cancelled on the first SIGINT or SIGTERM.
fn install_signal_handler() -> CancellationToken {
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();
        #[cfg(unix)]
        {
            let mut term = match tokio::signal::unix::signal(
                tokio::signal::unix::SignalKind::terminate(),
            ) {
                Ok(term) => term,
                Err(e) => {
                    error!(error = %e, "failed to install SIGTERM handler");
                    return;
                }
            };
            tokio::select! {
                _ = ctrl_c => info!("SIGINT received"),
                _ = term.recv() => info!("SIGTERM received"),
            }
        }
        #[cfg(not(unix))]
        {
            let _ = ctrl_c.await;
            info!("ctrl-c received");
        }
        trigger.cancel();
    });
    cancel
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("{log_level},hyper=warn,tower=warn,tungstenite=warn"))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
