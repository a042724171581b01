// SPDX-FileCopyrightText: 2026 Waworker Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the waworker connection worker.
//!
//! Layered TOML + environment configuration built on figment, with
//! compiled defaults for every field.

pub mod loader;
pub mod model;

pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::WorkerConfig;
