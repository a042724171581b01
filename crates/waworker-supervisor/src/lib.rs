// SPDX-FileCopyrightText: 2026 Waworker Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session supervision: one actor per channel driving connect, QR
//! pairing, reconnect backoff, and teardown, plus the registry that
//! owns them.

pub mod actor;
pub mod backoff;
pub mod registry;

pub use actor::{ChannelDeps, ChannelHandle};
pub use backoff::Backoff;
pub use registry::SupervisorRegistry;
