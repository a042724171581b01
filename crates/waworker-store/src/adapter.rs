// SPDX-FileCopyrightText: 2026 Waworker Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite-backed implementation of the `DocumentStore` trait.

use async_trait::async_trait;

use waworker_core::traits::DocumentStore;
use waworker_core::types::{
    BotConfig, BotConfigPatch, Channel, ChannelPatch, Conversation, MessageRecord,
    MessageStatus,
};
use waworker_core::WorkerError;

use crate::database::Database;
use crate::queries;

/// The worker's document store over a single SQLite file.
pub struct SqliteStore {
    db: Database,
}

impl SqliteStore {
    pub async fn open(path: &str) -> Result<Self, WorkerError> {
        let db = Database::open(path).await?;
        Ok(Self { db })
    }
}

#[async_trait]
impl DocumentStore for SqliteStore {
    async fn merge_channel(
        &self,
        channel_id: &str,
        patch: &ChannelPatch,
    ) -> Result<(), WorkerError> {
        queries::channels::merge(&self.db, channel_id, patch).await
    }

    async fn get_channel(&self, channel_id: &str) -> Result<Option<Channel>, WorkerError> {
        queries::channels::get(&self.db, channel_id).await
    }

    async fn list_channels(&self) -> Result<Vec<Channel>, WorkerError> {
        queries::channels::list(&self.db).await
    }

    async fn upsert_conversation_on_message(
        &self,
        channel_id: &str,
        jid: &str,
        name: Option<&str>,
        text: &str,
        at: i64,
        increment_unread: bool,
    ) -> Result<(), WorkerError> {
        queries::conversations::upsert_on_message(
            &self.db,
            channel_id,
            jid,
            name,
            text,
            at,
            increment_unread,
        )
        .await
    }

    async fn mark_conversation_read(
        &self,
        channel_id: &str,
        jid: &str,
    ) -> Result<bool, WorkerError> {
        queries::conversations::mark_read(&self.db, channel_id, jid).await
    }

    async fn get_conversation(
        &self,
        channel_id: &str,
        jid: &str,
    ) -> Result<Option<Conversation>, WorkerError> {
        queries::conversations::get(&self.db, channel_id, jid).await
    }

    async fn insert_message(
        &self,
        channel_id: &str,
        message: &MessageRecord,
    ) -> Result<bool, WorkerError> {
        queries::messages::insert(&self.db, channel_id, message).await
    }

    async fn update_message_status(
        &self,
        channel_id: &str,
        message_id: &str,
        status: MessageStatus,
    ) -> Result<(), WorkerError> {
        queries::messages::update_status(&self.db, channel_id, message_id, status).await
    }

    async fn recent_messages(
        &self,
        channel_id: &str,
        jid: &str,
        limit: i64,
    ) -> Result<Vec<MessageRecord>, WorkerError> {
        queries::messages::recent(&self.db, channel_id, jid, limit).await
    }

    async fn get_bot_config(&self, channel_id: &str) -> Result<BotConfig, WorkerError> {
        queries::botconfig::get(&self.db, channel_id).await
    }

    async fn put_bot_config(
        &self,
        channel_id: &str,
        patch: &BotConfigPatch,
    ) -> Result<BotConfig, WorkerError> {
        queries::botconfig::put(&self.db, channel_id, patch).await
    }

    async fn touch_last_auto_reply(
        &self,
        channel_id: &str,
        at: i64,
    ) -> Result<(), WorkerError> {
        queries::botconfig::touch_last_auto_reply(&self.db, channel_id, at).await
    }

    async fn close(&self) -> Result<(), WorkerError> {
        self.db.close().await
    }
}
