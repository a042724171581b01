// SPDX-FileCopyrightText: 2026 Waworker Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WebSocket transport, wire codec, QR rendering, and session
//! credential persistence.

pub mod qr;
pub mod session;
pub mod websocket;
pub mod wire;

pub use session::SessionStore;
pub use websocket::{WebSocketTransport, WsTransportFactory};
