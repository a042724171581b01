// SPDX-FileCopyrightText: 2026 Waworker Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Channel state publisher.
//!
//! All channel record writes funnel through here so the retry and
//! failure policy lives in one place. A failed publish never takes a
//! live session down: the session is the source of truth and the store
//! record is a projection of it, so the worst case of a dropped write
//! is a stale dashboard row that the next state change repairs.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use waworker_core::traits::DocumentStore;
use waworker_core::types::ChannelPatch;

const ATTEMPTS: u32 = 3;
const BASE_DELAY: Duration = Duration::from_millis(100);

/// Publishes channel state patches with bounded retries.
#[derive(Clone)]
pub struct ChannelPublisher {
    store: Arc<dyn DocumentStore>,
}

impl ChannelPublisher {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Merge `patch` into the channel record. Retries transient store
    /// failures with linear backoff; after the last attempt the error
    /// is logged and swallowed.
    pub async fn publish(&self, channel_id: &str, patch: &ChannelPatch) {
        for attempt in 1..=ATTEMPTS {
            match self.store.merge_channel(channel_id, patch).await {
                Ok(()) => {
                    debug!(channel_id, ?patch.status, "channel state published");
                    return;
                }
                Err(e) if attempt < ATTEMPTS => {
                    warn!(
                        channel_id,
                        attempt,
                        error = %e,
                        "channel publish failed, retrying"
                    );
                    tokio::time::sleep(BASE_DELAY * attempt).await;
                }
                Err(e) => {
                    warn!(
                        channel_id,
                        error = %e,
                        "channel publish failed after {ATTEMPTS} attempts, dropping update"
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    use async_trait::async_trait;
    use waworker_core::types::{
        BotConfig, BotConfigPatch, Channel, ChannelStatus, Conversation, MessageRecord,
        MessageStatus,
    };
    use waworker_core::WorkerError;

    /// Store that fails `merge_channel` a configurable number of times.
    struct FlakyStore {
        fail_first: u32,
        calls: AtomicU32,
    }

    #[async_trait]
    impl DocumentStore for FlakyStore {
        async fn merge_channel(
            &self,
            _channel_id: &str,
            _patch: &ChannelPatch,
        ) -> Result<(), WorkerError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.fail_first {
                Err(WorkerError::Internal("injected".into()))
            } else {
                Ok(())
            }
        }

        async fn get_channel(&self, _: &str) -> Result<Option<Channel>, WorkerError> {
            unimplemented!()
        }
        async fn list_channels(&self) -> Result<Vec<Channel>, WorkerError> {
            unimplemented!()
        }
        async fn upsert_conversation_on_message(
            &self,
            _: &str,
            _: &str,
            _: Option<&str>,
            _: &str,
            _: i64,
            _: bool,
        ) -> Result<(), WorkerError> {
            unimplemented!()
        }
        async fn mark_conversation_read(&self, _: &str, _: &str) -> Result<bool, WorkerError> {
            unimplemented!()
        }
        async fn get_conversation(
            &self,
            _: &str,
            _: &str,
        ) -> Result<Option<Conversation>, WorkerError> {
            unimplemented!()
        }
        async fn insert_message(
            &self,
            _: &str,
            _: &MessageRecord,
        ) -> Result<bool, WorkerError> {
            unimplemented!()
        }
        async fn update_message_status(
            &self,
            _: &str,
            _: &str,
            _: MessageStatus,
        ) -> Result<(), WorkerError> {
            unimplemented!()
        }
        async fn recent_messages(
            &self,
            _: &str,
            _: &str,
            _: i64,
        ) -> Result<Vec<MessageRecord>, WorkerError> {
            unimplemented!()
        }
        async fn get_bot_config(&self, _: &str) -> Result<BotConfig, WorkerError> {
            unimplemented!()
        }
        async fn put_bot_config(
            &self,
            _: &str,
            _: &BotConfigPatch,
        ) -> Result<BotConfig, WorkerError> {
            unimplemented!()
        }
        async fn touch_last_auto_reply(&self, _: &str, _: i64) -> Result<(), WorkerError> {
            unimplemented!()
        }
        async fn close(&self) -> Result<(), WorkerError> {
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn publish_retries_transient_failures() {
        let store = Arc::new(FlakyStore {
            fail_first: 2,
            calls: AtomicU32::new(0),
        });
        let publisher = ChannelPublisher::new(store.clone());

        publisher
            .publish("ch1", &ChannelPatch::status(ChannelStatus::Connected))
            .await;
        assert_eq!(store.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn publish_gives_up_after_three_attempts() {
        let store = Arc::new(FlakyStore {
            fail_first: 10,
            calls: AtomicU32::new(0),
        });
        let publisher = ChannelPublisher::new(store.clone());

        // Does not return an error; the failure is logged and dropped.
        publisher
            .publish("ch1", &ChannelPatch::status(ChannelStatus::Error))
            .await;
        assert_eq!(store.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn publish_succeeds_first_try() {
        let store = Arc::new(FlakyStore {
            fail_first: 0,
            calls: AtomicU32::new(0),
        });
        let publisher = ChannelPublisher::new(store.clone());

        publisher
            .publish("ch1", &ChannelPatch::status(ChannelStatus::Qr))
            .await;
        assert_eq!(store.calls.load(Ordering::SeqCst), 1);
    }
}
