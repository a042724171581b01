// SPDX-FileCopyrightText: 2026 Waworker Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQL query modules, one per document family.

pub mod botconfig;
pub mod channels;
pub mod conversations;
pub mod messages;
