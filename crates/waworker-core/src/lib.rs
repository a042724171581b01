// SPDX-FileCopyrightText: 2026 Waworker Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the waworker connection worker.
//!
//! This crate provides the foundational trait definitions, error types,
//! and domain types used throughout the waworker workspace. The
//! transport, responder, and store adapters all implement traits
//! defined here.

pub mod error;
pub mod traits;
pub mod types;

pub use error::WorkerError;
pub use types::{
    ChannelStatus, CloseReason, Direction, MessageStatus, RetryDecision, SessionCreds,
    TransportEvent,
};

pub use traits::{DocumentStore, Responder, Transport, TransportFactory};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn worker_error_codes_are_stable() {
        assert_eq!(WorkerError::LoggedOut.code(), "logged_out");
        assert_eq!(WorkerError::NotConnected.code(), "not_connected");
        assert_eq!(WorkerError::AlreadyConnected.code(), "already_connected");
        assert_eq!(
            WorkerError::Precondition("x".into()).code(),
            "precondition_failed"
        );
        assert_eq!(WorkerError::NotFound("c1".into()).code(), "not_found");
    }

    #[test]
    fn worker_error_display_has_no_internals() {
        let err = WorkerError::Transport {
            message: "socket reset".into(),
            source: None,
        };
        assert_eq!(err.to_string(), "transport error: socket reset");
    }
}
