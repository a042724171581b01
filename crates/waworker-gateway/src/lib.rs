// SPDX-FileCopyrightText: 2026 Waworker Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP control API for the connection worker.
//!
//! Exposes channel lifecycle operations (QR pairing, disconnect,
//! session reset, repair), message send, conversation mark-read, and
//! bot-config read/write over JSON, for the dashboard backend to call.

pub mod error;
pub mod handlers;
pub mod server;

pub use server::{build_router, start_server, GatewayState};
