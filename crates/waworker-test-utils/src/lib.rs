// SPDX-FileCopyrightText: 2026 Waworker Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared mocks and fixtures for waworker tests.

pub mod mock_transport;
pub mod store;

pub use mock_transport::{ConnectOutcome, MockTransport, MockTransportFactory, SentMessage};
pub use store::temp_store;
