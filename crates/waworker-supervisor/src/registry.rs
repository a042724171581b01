// SPDX-FileCopyrightText: 2026 Waworker Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Channel registry: one actor per channel, shared by the control API
//! and the startup restore path.

use std::sync::Mutex;

use dashmap::DashMap;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use waworker_core::traits::DocumentStore;
use waworker_core::types::{ChannelPatch, ChannelStatus};
use waworker_core::WorkerError;

use crate::actor::{spawn_channel, ChannelDeps, ChannelHandle};

/// Owns every channel actor in the worker.
pub struct SupervisorRegistry {
    deps: ChannelDeps,
    cancel: CancellationToken,
    channels: DashMap<String, ChannelHandle>,
    joins: Mutex<Vec<JoinHandle<()>>>,
}

impl SupervisorRegistry {
    pub fn new(deps: ChannelDeps) -> Self {
        Self::with_cancel(deps, CancellationToken::new())
    }

    pub fn with_cancel(deps: ChannelDeps, cancel: CancellationToken) -> Self {
        Self {
            deps,
            cancel,
            channels: DashMap::new(),
            joins: Mutex::new(Vec::new()),
        }
    }

    /// Get or spawn the actor for a channel. Registration is
    /// idempotent; a new channel is seeded DISCONNECTED in the store.
    pub async fn ensure_channel(&self, channel_id: &str) -> ChannelHandle {
        let mut created = false;
        let handle = self
            .channels
            .entry(channel_id.to_string())
            .or_insert_with(|| {
                created = true;
                let (handle, join) = spawn_channel(
                    channel_id.to_string(),
                    self.deps.clone(),
                    self.cancel.child_token(),
                );
                self.joins.lock().unwrap().push(join);
                handle
            })
            .clone();
        if created {
            self.deps
                .publisher
                .publish(
                    channel_id,
                    &ChannelPatch::status(ChannelStatus::Disconnected),
                )
                .await;
            info!(channel_id, "channel registered");
        }
        handle
    }

    pub fn get(&self, channel_id: &str) -> Option<ChannelHandle> {
        self.channels.get(channel_id).map(|h| h.clone())
    }

    pub fn channel_ids(&self) -> Vec<String> {
        self.channels.iter().map(|e| e.key().clone()).collect()
    }

    /// Re-register every channel found in the store. A killed worker
    /// leaves stale CONNECTING/QR/CONNECTED rows behind; each one is
    /// corrected to DISCONNECTED and its actor restarts idle.
    pub async fn restore_from_store(
        &self,
        store: &dyn DocumentStore,
    ) -> Result<usize, WorkerError> {
        let channels = store.list_channels().await?;
        let count = channels.len();
        for channel in channels {
            let _ = self.ensure_channel(&channel.id).await;
            if channel.status != ChannelStatus::Disconnected {
                warn!(channel_id = %channel.id, stale = %channel.status,
                    "correcting stale channel status from previous run");
                self.deps
                    .publisher
                    .publish(
                        &channel.id,
                        &ChannelPatch::status(ChannelStatus::Disconnected)
                            .clear_qr()
                            .clear_phone(),
                    )
                    .await;
            }
        }
        info!(count, "channels restored from store");
        Ok(count)
    }

    /// Stop every actor and wait for teardown to finish.
    pub async fn shutdown(&self) {
        self.cancel.cancel();
        let joins: Vec<_> = std::mem::take(&mut *self.joins.lock().unwrap());
        for join in joins {
            if let Err(e) = join.await {
                warn!(error = %e, "channel actor join failed");
            }
        }
        info!("supervisor registry stopped");
    }
}
