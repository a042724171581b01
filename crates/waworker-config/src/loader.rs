// SPDX-FileCopyrightText: 2026 Waworker Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports the XDG hierarchy: `./waworker.toml` >
//! `~/.config/waworker/waworker.toml` > `/etc/waworker/waworker.toml`
//! with environment variable overrides via the `WAWORKER_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::WorkerConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/waworker/waworker.toml` (system-wide)
/// 3. `~/.config/waworker/waworker.toml` (user XDG config)
/// 4. `./waworker.toml` (local directory)
/// 5. `WAWORKER_*` environment variables
pub fn load_config() -> Result<WorkerConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(WorkerConfig::default()))
        .merge(Toml::file("/etc/waworker/waworker.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("waworker/waworker.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("waworker.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no XDG lookup).
///
/// Used for testing and explicit config specification.
pub fn load_config_from_str(toml_content: &str) -> Result<WorkerConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(WorkerConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<WorkerConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(WorkerConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` NOT `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names. For example,
/// `WAWORKER_STORE_DATABASE_PATH` must map to `store.database_path`,
/// not `store.database.path`.
fn env_provider() -> Env {
    Env::prefixed("WAWORKER_").map(|key| {
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("worker_", "worker.", 1)
            .replacen("server_", "server.", 1)
            .replacen("store_", "store.", 1)
            .replacen("session_", "session.", 1)
            .replacen("transport_", "transport.", 1)
            .replacen("reconnect_", "reconnect.", 1)
            .replacen("responder_", "responder.", 1);
        mapped.into()
    })
}
