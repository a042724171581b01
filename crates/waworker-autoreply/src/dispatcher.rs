// SPDX-FileCopyrightText: 2026 Waworker Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Auto-reply dispatch: one attempt per stored inbound message.
//!
//! The dispatcher sits between ingress and the channel session. It is
//! fire-and-forget from the session loop's point of view: every failure
//! (store read, responder call, send) is logged and dropped so a flaky
//! reply pipeline can never take a live connection down. At-most-once
//! comes for free from ingress deduplication — a re-delivered message
//! never reaches the dispatcher.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use waworker_core::traits::{DocumentStore, HistoryEntry, Responder};
use waworker_core::types::now_millis;
use waworker_core::WorkerError;
use waworker_ingress::{InboundText, MessageIngress};

use crate::prompt;

/// How the dispatcher hands a reply back to the live session.
#[async_trait]
pub trait ReplySender: Send + Sync {
    /// Send text to a JID on this channel; returns the message id.
    async fn send_text(&self, jid: &str, text: &str) -> Result<String, WorkerError>;
}

pub struct AutoReplyDispatcher {
    store: Arc<dyn DocumentStore>,
    ingress: MessageIngress,
    responder: Arc<dyn Responder>,
    history_limit: i64,
}

impl AutoReplyDispatcher {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        ingress: MessageIngress,
        responder: Arc<dyn Responder>,
        history_limit: i64,
    ) -> Self {
        Self {
            store,
            ingress,
            responder,
            history_limit,
        }
    }

    /// Attempt one auto-reply for a fresh inbound message.
    ///
    /// Returns the reply text that was sent, or `None` when the bot is
    /// disabled, the responder declined, or any step failed.
    pub async fn dispatch(
        &self,
        channel_id: &str,
        inbound: &InboundText,
        sender: &dyn ReplySender,
    ) -> Option<String> {
        let config = match self.store.get_bot_config(channel_id).await {
            Ok(config) => config,
            Err(e) => {
                warn!(channel_id, error = %e, "bot config read failed, skipping reply");
                return None;
            }
        };
        if !config.enabled {
            return None;
        }

        let history = match self
            .store
            .recent_messages(channel_id, &inbound.jid, self.history_limit)
            .await
        {
            Ok(messages) => messages
                .into_iter()
                .filter(|m| m.id != inbound.message_id)
                .filter_map(|m| {
                    m.text.map(|text| HistoryEntry {
                        from_me: m.from_me,
                        text,
                    })
                })
                .collect(),
            Err(e) => {
                warn!(channel_id, error = %e, "history read failed, replying without it");
                Vec::new()
            }
        };

        let ctx = prompt::build_context(&config, history, &inbound.text);
        let reply = match self.responder.reply(&ctx).await {
            Ok(Some(reply)) => reply,
            Ok(None) => {
                debug!(channel_id, jid = %inbound.jid, "responder declined");
                return None;
            }
            Err(e) => {
                warn!(channel_id, error = %e, "responder failed, dropping reply");
                return None;
            }
        };

        let message_id = match sender.send_text(&inbound.jid, &reply).await {
            Ok(id) => id,
            Err(e) => {
                warn!(channel_id, jid = %inbound.jid, error = %e, "reply send failed");
                return None;
            }
        };
        info!(channel_id, jid = %inbound.jid, message_id, "auto-reply sent");

        if let Err(e) = self
            .ingress
            .record_outbound(channel_id, &inbound.jid, &message_id, &reply)
            .await
        {
            warn!(channel_id, error = %e, "auto-reply record failed");
        }
        if let Err(e) = self.store.touch_last_auto_reply(channel_id, now_millis()).await {
            warn!(channel_id, error = %e, "lastAutoReplyAt stamp failed");
        }
        Some(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    use tempfile::tempdir;
    use waworker_core::traits::ReplyContext;
    use waworker_core::types::BotConfigPatch;
    use waworker_store::SqliteStore;

    struct FixedResponder {
        reply: Option<String>,
        calls: AtomicU32,
        last_context: Mutex<Option<ReplyContext>>,
    }

    impl FixedResponder {
        fn replying(text: &str) -> Self {
            Self {
                reply: Some(text.into()),
                calls: AtomicU32::new(0),
                last_context: Mutex::new(None),
            }
        }

        fn declining() -> Self {
            Self {
                reply: None,
                calls: AtomicU32::new(0),
                last_context: Mutex::new(None),
            }
        }
    }

    #[async_trait]
    impl Responder for FixedResponder {
        async fn reply(&self, ctx: &ReplyContext) -> Result<Option<String>, WorkerError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_context.lock().unwrap() = Some(ctx.clone());
            Ok(self.reply.clone())
        }
    }

    struct RecordingSender {
        sent: Mutex<Vec<(String, String)>>,
        fail: bool,
    }

    impl RecordingSender {
        fn new() -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
                fail: false,
            }
        }
    }

    #[async_trait]
    impl ReplySender for RecordingSender {
        async fn send_text(&self, jid: &str, text: &str) -> Result<String, WorkerError> {
            if self.fail {
                return Err(WorkerError::NotConnected);
            }
            self.sent.lock().unwrap().push((jid.into(), text.into()));
            Ok(format!("out-{}", self.sent.lock().unwrap().len()))
        }
    }

    async fn setup(
        dir: &tempfile::TempDir,
        responder: FixedResponder,
    ) -> (AutoReplyDispatcher, Arc<dyn DocumentStore>, Arc<FixedResponder>) {
        let path = dir.path().join("dispatch.db");
        let store: Arc<dyn DocumentStore> =
            Arc::new(SqliteStore::open(path.to_str().unwrap()).await.unwrap());
        let responder = Arc::new(responder);
        let dispatcher = AutoReplyDispatcher::new(
            store.clone(),
            MessageIngress::new(store.clone()),
            responder.clone(),
            20,
        );
        (dispatcher, store, responder)
    }

    fn inbound(id: &str, text: &str) -> InboundText {
        InboundText {
            jid: "5511@s.whatsapp.net".into(),
            message_id: id.into(),
            text: text.into(),
        }
    }

    async fn enable_bot(store: &Arc<dyn DocumentStore>, channel_id: &str) {
        store
            .put_bot_config(
                channel_id,
                &BotConfigPatch {
                    enabled: Some(true),
                    product_details: Some("pottery".into()),
                    ..BotConfigPatch::default()
                },
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn disabled_bot_never_invokes_responder() {
        let dir = tempdir().unwrap();
        let (dispatcher, _store, responder) = setup(&dir, FixedResponder::replying("hi")).await;
        let sender = RecordingSender::new();

        let reply = dispatcher.dispatch("ch1", &inbound("m1", "oi"), &sender).await;
        assert!(reply.is_none());
        assert_eq!(responder.calls.load(Ordering::SeqCst), 0);
        assert!(sender.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn enabled_bot_sends_and_records_reply() {
        let dir = tempdir().unwrap();
        let (dispatcher, store, _responder) =
            setup(&dir, FixedResponder::replying("Entregamos sim!")).await;
        enable_bot(&store, "ch1").await;
        let sender = RecordingSender::new();

        let reply = dispatcher
            .dispatch("ch1", &inbound("m1", "vocês entregam?"), &sender)
            .await;
        assert_eq!(reply.as_deref(), Some("Entregamos sim!"));
        assert_eq!(sender.sent.lock().unwrap().len(), 1);

        // The outbound record and the lastAutoReplyAt stamp both landed.
        let messages = store
            .recent_messages("ch1", "5511@s.whatsapp.net", 10)
            .await
            .unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].text.as_deref(), Some("Entregamos sim!"));
        let config = store.get_bot_config("ch1").await.unwrap();
        assert!(config.last_auto_reply_at.is_some());
    }

    #[tokio::test]
    async fn responder_decline_sends_nothing() {
        let dir = tempdir().unwrap();
        let (dispatcher, store, responder) = setup(&dir, FixedResponder::declining()).await;
        enable_bot(&store, "ch1").await;
        let sender = RecordingSender::new();

        let reply = dispatcher.dispatch("ch1", &inbound("m1", "oi"), &sender).await;
        assert!(reply.is_none());
        assert_eq!(responder.calls.load(Ordering::SeqCst), 1);
        assert!(sender.sent.lock().unwrap().is_empty());
        let config = store.get_bot_config("ch1").await.unwrap();
        assert!(config.last_auto_reply_at.is_none());
    }

    #[tokio::test]
    async fn send_failure_is_swallowed() {
        let dir = tempdir().unwrap();
        let (dispatcher, store, _responder) = setup(&dir, FixedResponder::replying("hi")).await;
        enable_bot(&store, "ch1").await;
        let sender = RecordingSender {
            sent: Mutex::new(Vec::new()),
            fail: true,
        };

        let reply = dispatcher.dispatch("ch1", &inbound("m1", "oi"), &sender).await;
        assert!(reply.is_none());
        let config = store.get_bot_config("ch1").await.unwrap();
        assert!(config.last_auto_reply_at.is_none());
    }

    #[tokio::test]
    async fn history_excludes_the_inbound_message() {
        let dir = tempdir().unwrap();
        let (dispatcher, store, responder) = setup(&dir, FixedResponder::replying("ok")).await;
        enable_bot(&store, "ch1").await;
        let ingress = MessageIngress::new(store.clone());
        let sender = RecordingSender::new();

        // Prior turn plus the inbound message itself, both stored.
        let prior = serde_json::json!({
            "key": {"id": "m0", "remoteJid": "5511@s.whatsapp.net"},
            "message": {"conversation": "qual o preço?"}
        });
        ingress.handle_inbound("ch1", &prior).await.unwrap();
        let current = serde_json::json!({
            "key": {"id": "m1", "remoteJid": "5511@s.whatsapp.net"},
            "message": {"conversation": "e o frete?"}
        });
        let flagged = ingress.handle_inbound("ch1", &current).await.unwrap().unwrap();

        dispatcher.dispatch("ch1", &flagged, &sender).await.unwrap();

        let ctx = responder.last_context.lock().unwrap().clone().unwrap();
        assert_eq!(ctx.inbound_text, "e o frete?");
        assert_eq!(ctx.history.len(), 1);
        assert_eq!(ctx.history[0].text, "qual o preço?");
    }
}
