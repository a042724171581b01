// SPDX-FileCopyrightText: 2026 Waworker Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! External text-generation responder trait.
//!
//! The responder receives channel knowledge plus recent conversation
//! history and either returns reply text or declines. It may be slow;
//! callers bound every invocation with a timeout.

use async_trait::async_trait;

use crate::error::WorkerError;

/// One turn of prior conversation passed to the responder.
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub from_me: bool,
    pub text: String,
}

/// Everything the responder is allowed to know for one reply.
#[derive(Debug, Clone)]
pub struct ReplyContext {
    /// Fixed global rules (never fabricate outside supplied knowledge, etc.).
    pub system_rules: String,
    pub product_details: String,
    pub sales_strategy: String,
    /// Most recent messages, oldest first.
    pub history: Vec<HistoryEntry>,
    /// The inbound text being replied to.
    pub inbound_text: String,
}

/// Pluggable reply generator.
#[async_trait]
pub trait Responder: Send + Sync {
    /// Produce a reply, or `Ok(None)` to decline to respond.
    async fn reply(&self, ctx: &ReplyContext) -> Result<Option<String>, WorkerError>;
}
