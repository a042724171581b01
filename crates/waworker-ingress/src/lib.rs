// SPDX-FileCopyrightText: 2026 Waworker Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message ingress: normalizes loosely-shaped inbound payloads into
//! canonical records and keeps conversation summaries current.

pub mod extract;

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use waworker_core::traits::DocumentStore;
use waworker_core::types::{now_millis, Direction, MessageRecord, MessageStatus};
use waworker_core::WorkerError;

/// A freshly stored inbound message that may warrant an auto-reply.
#[derive(Debug, Clone)]
pub struct InboundText {
    pub jid: String,
    pub message_id: String,
    pub text: String,
}

/// Normalizes and persists message traffic for all channels.
#[derive(Clone)]
pub struct MessageIngress {
    store: Arc<dyn DocumentStore>,
}

impl MessageIngress {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Handle one inbound message event.
    ///
    /// Extracts the canonical fields, stores the message, and updates
    /// the conversation summary. Returns the inbound text when this is
    /// a fresh, non-own, non-empty message — the dispatcher's cue.
    /// Re-delivered ids and payloads without an id return `None`.
    pub async fn handle_inbound(
        &self,
        channel_id: &str,
        payload: &Value,
    ) -> Result<Option<InboundText>, WorkerError> {
        let Some(message_id) = extract::message_id(payload) else {
            debug!(channel_id, "message payload without id, dropping");
            return Ok(None);
        };
        let jid = extract::jid(payload, "unknown@s.whatsapp.net");
        let text = extract::text(payload);
        let from_me = extract::from_me(payload);
        let now = now_millis();
        let timestamp = extract::timestamp_millis(payload, now);

        let record = MessageRecord {
            id: message_id.clone(),
            jid: jid.clone(),
            from_me,
            direction: if from_me { Direction::Out } else { Direction::In },
            text: if text.is_empty() { None } else { Some(text.clone()) },
            status: Some(if from_me {
                MessageStatus::Sent
            } else {
                MessageStatus::Received
            }),
            timestamp,
            created_at: now,
        };

        let fresh = self.store.insert_message(channel_id, &record).await?;
        if !fresh {
            debug!(channel_id, message_id, "duplicate message id, skipping");
            return Ok(None);
        }

        self.store
            .upsert_conversation_on_message(
                channel_id,
                &jid,
                extract::push_name(payload).as_deref(),
                &text,
                timestamp,
                !from_me,
            )
            .await?;

        if !from_me && !text.is_empty() {
            Ok(Some(InboundText {
                jid,
                message_id,
                text,
            }))
        } else {
            Ok(None)
        }
    }

    /// Record a message this worker just sent (auto-reply or API send).
    pub async fn record_outbound(
        &self,
        channel_id: &str,
        jid: &str,
        message_id: &str,
        text: &str,
    ) -> Result<(), WorkerError> {
        let now = now_millis();
        let record = MessageRecord {
            id: message_id.to_string(),
            jid: jid.to_string(),
            from_me: true,
            direction: Direction::Out,
            text: Some(text.to_string()),
            status: Some(MessageStatus::Sent),
            timestamp: now,
            created_at: now,
        };
        self.store.insert_message(channel_id, &record).await?;
        self.store
            .upsert_conversation_on_message(channel_id, jid, None, text, now, false)
            .await
    }

    /// Apply a delivery receipt to a stored message.
    pub async fn handle_receipt(
        &self,
        channel_id: &str,
        message_id: &str,
        status: MessageStatus,
    ) -> Result<(), WorkerError> {
        self.store
            .update_message_status(channel_id, message_id, status)
            .await
    }

    /// Reset a conversation's unread count. `NotFound` for a
    /// conversation that was never seen.
    pub async fn mark_read(&self, channel_id: &str, jid: &str) -> Result<(), WorkerError> {
        if self.store.mark_conversation_read(channel_id, jid).await? {
            Ok(())
        } else {
            Err(WorkerError::NotFound(format!(
                "conversation {jid} on channel {channel_id}"
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;
    use waworker_store::SqliteStore;

    async fn ingress(dir: &tempfile::TempDir) -> (MessageIngress, Arc<dyn DocumentStore>) {
        let path = dir.path().join("ingress.db");
        let store: Arc<dyn DocumentStore> =
            Arc::new(SqliteStore::open(path.to_str().unwrap()).await.unwrap());
        (MessageIngress::new(store.clone()), store)
    }

    #[tokio::test]
    async fn inbound_text_is_stored_and_flagged_for_reply() {
        let dir = tempdir().unwrap();
        let (ingress, store) = ingress(&dir).await;

        let payload = json!({
            "key": {"id": "m1", "remoteJid": "5511@s.whatsapp.net", "fromMe": false},
            "message": {"conversation": "quero comprar"},
            "pushName": "Ana",
            "messageTimestamp": 1700000000
        });
        let inbound = ingress.handle_inbound("ch1", &payload).await.unwrap().unwrap();
        assert_eq!(inbound.jid, "5511@s.whatsapp.net");
        assert_eq!(inbound.text, "quero comprar");

        let conv = store
            .get_conversation("ch1", "5511@s.whatsapp.net")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(conv.name.as_deref(), Some("Ana"));
        assert_eq!(conv.unread_count, 1);
        assert_eq!(conv.last_message_at, 1_700_000_000_000);

        let messages = store
            .recent_messages("ch1", "5511@s.whatsapp.net", 10)
            .await
            .unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].direction, Direction::In);
        assert_eq!(messages[0].text.as_deref(), Some("quero comprar"));
    }

    #[tokio::test]
    async fn own_echo_is_stored_but_not_flagged() {
        let dir = tempdir().unwrap();
        let (ingress, store) = ingress(&dir).await;

        let payload = json!({
            "key": {"id": "m1", "remoteJid": "5511@s.whatsapp.net", "fromMe": true},
            "message": {"conversation": "resposta da loja"}
        });
        let inbound = ingress.handle_inbound("ch1", &payload).await.unwrap();
        assert!(inbound.is_none());

        let conv = store
            .get_conversation("ch1", "5511@s.whatsapp.net")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(conv.unread_count, 0);
        let messages = store
            .recent_messages("ch1", "5511@s.whatsapp.net", 10)
            .await
            .unwrap();
        assert_eq!(messages[0].direction, Direction::Out);
    }

    #[tokio::test]
    async fn duplicate_delivery_is_ignored() {
        let dir = tempdir().unwrap();
        let (ingress, store) = ingress(&dir).await;

        let payload = json!({
            "key": {"id": "m1", "remoteJid": "5511@s.whatsapp.net"},
            "message": {"conversation": "oi"}
        });
        assert!(ingress.handle_inbound("ch1", &payload).await.unwrap().is_some());
        assert!(ingress.handle_inbound("ch1", &payload).await.unwrap().is_none());

        let conv = store
            .get_conversation("ch1", "5511@s.whatsapp.net")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(conv.unread_count, 1);
    }

    #[tokio::test]
    async fn non_text_payload_is_stored_without_reply_cue() {
        let dir = tempdir().unwrap();
        let (ingress, store) = ingress(&dir).await;

        let payload = json!({
            "key": {"id": "m1", "remoteJid": "5511@s.whatsapp.net"},
            "message": {"audioMessage": {"seconds": 12}}
        });
        assert!(ingress.handle_inbound("ch1", &payload).await.unwrap().is_none());

        let messages = store
            .recent_messages("ch1", "5511@s.whatsapp.net", 10)
            .await
            .unwrap();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].text.is_none());
    }

    #[tokio::test]
    async fn payload_without_id_is_dropped() {
        let dir = tempdir().unwrap();
        let (ingress, _store) = ingress(&dir).await;

        let payload = json!({"message": {"conversation": "oi"}});
        assert!(ingress.handle_inbound("ch1", &payload).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn outbound_record_updates_summary_without_unread() {
        let dir = tempdir().unwrap();
        let (ingress, store) = ingress(&dir).await;

        ingress
            .record_outbound("ch1", "5511@s.whatsapp.net", "out-1", "chegou!")
            .await
            .unwrap();

        let conv = store
            .get_conversation("ch1", "5511@s.whatsapp.net")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(conv.unread_count, 0);
        assert_eq!(conv.last_message_text, "chegou!");
    }

    #[tokio::test]
    async fn receipt_marks_message_delivered() {
        let dir = tempdir().unwrap();
        let (ingress, store) = ingress(&dir).await;

        ingress
            .record_outbound("ch1", "5511@s.whatsapp.net", "out-1", "oi")
            .await
            .unwrap();
        ingress
            .handle_receipt("ch1", "out-1", MessageStatus::Delivered)
            .await
            .unwrap();

        let messages = store
            .recent_messages("ch1", "5511@s.whatsapp.net", 10)
            .await
            .unwrap();
        assert_eq!(messages[0].status, Some(MessageStatus::Delivered));
    }

    #[tokio::test]
    async fn mark_read_missing_conversation_is_not_found() {
        let dir = tempdir().unwrap();
        let (ingress, _store) = ingress(&dir).await;

        let err = ingress
            .mark_read("ch1", "ghost@s.whatsapp.net")
            .await
            .unwrap_err();
        assert!(matches!(err, WorkerError::NotFound(_)));
    }
}
