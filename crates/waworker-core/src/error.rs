// SPDX-FileCopyrightText: 2026 Waworker Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the waworker connection worker.

use thiserror::Error;

/// The primary error type used across all waworker adapter traits and
/// supervisor operations.
#[derive(Debug, Error)]
pub enum WorkerError {
    /// Configuration errors (invalid TOML, missing required fields,
    /// missing external endpoint).
    #[error("configuration error: {0}")]
    Config(String),

    /// Transport/protocol failures (socket errors, handshake failures,
    /// malformed frames). Retried per the reconnect policy.
    #[error("transport error: {message}")]
    Transport {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The remote side revoked the device pairing. Fatal to the session;
    /// a brand-new QR scan is required. Never retried automatically.
    #[error("device logged out, new pairing required")]
    LoggedOut,

    /// A channel operation was issued while the channel is connected and
    /// the operation requires it not to be.
    #[error("channel is already connected")]
    AlreadyConnected,

    /// A send (or similar) was issued while the channel has no live session.
    #[error("channel is not connected")]
    NotConnected,

    /// Generic precondition failure (returned to the caller as a 4xx,
    /// never retried by the worker).
    #[error("precondition failed: {0}")]
    Precondition(String),

    /// The named channel or conversation does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Document store read/write failure. Publishes are retried with
    /// backoff and logged; they never crash the owning task.
    #[error("store error: {source}")]
    Store {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// External responder failure (HTTP error, bad payload).
    #[error("responder error: {message}")]
    Responder {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl WorkerError {
    /// Short machine-readable code for the error, as stored in a
    /// channel's `last_error` and returned in API error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            WorkerError::Config(_) => "config",
            WorkerError::Transport { .. } => "transport",
            WorkerError::LoggedOut => "logged_out",
            WorkerError::AlreadyConnected => "already_connected",
            WorkerError::NotConnected => "not_connected",
            WorkerError::Precondition(_) => "precondition_failed",
            WorkerError::NotFound(_) => "not_found",
            WorkerError::Store { .. } => "store",
            WorkerError::Responder { .. } => "responder",
            WorkerError::Timeout { .. } => "timeout",
            WorkerError::Internal(_) => "internal",
        }
    }
}
