// SPDX-FileCopyrightText: 2026 Waworker Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter traits at the seams of the worker: the protocol transport,
//! the external text-generation responder, and the document store.

pub mod responder;
pub mod store;
pub mod transport;

pub use responder::{HistoryEntry, ReplyContext, Responder};
pub use store::DocumentStore;
pub use transport::{Transport, TransportFactory};
