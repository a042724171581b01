// SPDX-FileCopyrightText: 2026 Waworker Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Document store trait: the shared external record of channels,
//! conversations, messages, and bot configs.
//!
//! Per-document merges are atomic; cross-document consistency is
//! best-effort (a conversation upsert may succeed while its paired
//! message insert fails — callers log and reconcile on the next event).

use async_trait::async_trait;

use crate::error::WorkerError;
use crate::types::{
    BotConfig, BotConfigPatch, Channel, ChannelPatch, Conversation, MessageRecord,
    MessageStatus,
};

#[async_trait]
pub trait DocumentStore: Send + Sync {
    // --- Channel records (written only via the publisher) ---

    /// Merge a partial update into `channels/{channel_id}`. Seeds a full
    /// default record first if none exists, so partial updates never
    /// fail on a missing base document. Stamps `updated_at` strictly
    /// increasing.
    async fn merge_channel(
        &self,
        channel_id: &str,
        patch: &ChannelPatch,
    ) -> Result<(), WorkerError>;

    async fn get_channel(&self, channel_id: &str) -> Result<Option<Channel>, WorkerError>;

    async fn list_channels(&self) -> Result<Vec<Channel>, WorkerError>;

    // --- Conversations ---

    /// Update the conversation summary for a message event, creating the
    /// conversation on first contact. Increments `unread_count` when
    /// `increment_unread` is set. `last_message_at` only moves forward.
    #[allow(clippy::too_many_arguments)]
    async fn upsert_conversation_on_message(
        &self,
        channel_id: &str,
        jid: &str,
        name: Option<&str>,
        text: &str,
        at: i64,
        increment_unread: bool,
    ) -> Result<(), WorkerError>;

    /// Reset `unread_count` to 0. Returns `false` when the conversation
    /// does not exist (callers map that to NotFound); repeat calls on an
    /// existing conversation are no-op successes.
    async fn mark_conversation_read(
        &self,
        channel_id: &str,
        jid: &str,
    ) -> Result<bool, WorkerError>;

    async fn get_conversation(
        &self,
        channel_id: &str,
        jid: &str,
    ) -> Result<Option<Conversation>, WorkerError>;

    // --- Messages ---

    /// Insert a message record. Returns `false` when a record with the
    /// same id already exists (re-delivered event) — callers use this to
    /// keep the ingress→dispatcher pipeline exactly-once.
    async fn insert_message(
        &self,
        channel_id: &str,
        message: &MessageRecord,
    ) -> Result<bool, WorkerError>;

    /// Update a message's delivery status in place (receipt events).
    async fn update_message_status(
        &self,
        channel_id: &str,
        message_id: &str,
        status: MessageStatus,
    ) -> Result<(), WorkerError>;

    /// Most recent messages for a conversation, oldest first.
    async fn recent_messages(
        &self,
        channel_id: &str,
        jid: &str,
        limit: i64,
    ) -> Result<Vec<MessageRecord>, WorkerError>;

    // --- Bot config ---

    /// Read the bot config, creating a disabled default on first read.
    async fn get_bot_config(&self, channel_id: &str) -> Result<BotConfig, WorkerError>;

    /// Merge the provided fields and stamp `updated_at`/`updated_by_*`.
    async fn put_bot_config(
        &self,
        channel_id: &str,
        patch: &BotConfigPatch,
    ) -> Result<BotConfig, WorkerError>;

    async fn touch_last_auto_reply(
        &self,
        channel_id: &str,
        at: i64,
    ) -> Result<(), WorkerError>;

    // --- Lifecycle ---

    async fn close(&self) -> Result<(), WorkerError>;
}
