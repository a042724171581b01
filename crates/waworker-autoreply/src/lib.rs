// SPDX-FileCopyrightText: 2026 Waworker Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Auto-reply pipeline: context assembly, external responder client,
//! and the per-message dispatcher.

pub mod dispatcher;
pub mod prompt;
pub mod responder;

pub use dispatcher::{AutoReplyDispatcher, ReplySender};
pub use responder::HttpResponder;
