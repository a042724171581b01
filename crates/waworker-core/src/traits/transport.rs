// SPDX-FileCopyrightText: 2026 Waworker Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Transport adapter trait for the multi-device protocol session.
//!
//! The supervisor owns exactly one `Transport` at a time per channel and
//! drives its full lifecycle; implementations only move bytes and decode
//! events. Production uses the WebSocket transport; tests use a mock.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::WorkerError;
use crate::types::{SessionCreds, TransportEvent};

/// A live (or pairing) protocol session.
#[async_trait]
pub trait Transport: Send {
    /// Next event from the session. `None` means the underlying stream
    /// is exhausted after a [`TransportEvent::Closed`] was delivered.
    async fn next_event(&mut self) -> Option<TransportEvent>;

    /// Send a text message to the given JID. Returns the
    /// protocol-assigned message id.
    async fn send_text(&mut self, to: &str, text: &str) -> Result<String, WorkerError>;

    /// Tear the session down. Idempotent; never fails.
    async fn close(&mut self);
}

/// Opens new transport sessions for a channel.
///
/// `creds` carries previously persisted credential material for silent
/// re-auth; `None` forces a fresh QR pairing. The factory must observe
/// `cancel` and abandon the handshake promptly when it fires.
#[async_trait]
pub trait TransportFactory: Send + Sync {
    async fn connect(
        &self,
        channel_id: &str,
        creds: Option<SessionCreds>,
        cancel: CancellationToken,
    ) -> Result<Box<dyn Transport>, WorkerError>;
}
