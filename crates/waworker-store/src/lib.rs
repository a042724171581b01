// SPDX-FileCopyrightText: 2026 Waworker Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite document store and channel state publisher.
//!
//! Layout written by the worker, mirrored by the dashboard:
//! - `channels/{channelId}` — live status, QR payloads, last error
//! - `channels/{channelId}/conversations/{jid}` — chat summaries
//! - `.../conversations/{jid}/messages/{messageId}` — message records
//! - `channels/{channelId}/botConfig` — auto-reply settings
//!
//! All writes go through one tokio-rusqlite connection; the publisher
//! adds retry/swallow semantics on top for channel state updates.

pub mod adapter;
pub mod database;
pub mod migrations;
pub mod publisher;
pub mod queries;

pub use adapter::SqliteStore;
pub use database::{map_tr_err, Database};
pub use publisher::ChannelPublisher;
