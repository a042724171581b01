// SPDX-FileCopyrightText: 2026 Waworker Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the waworker connection worker.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject
//! unrecognized config keys at startup.

use serde::{Deserialize, Serialize};

/// Top-level waworker configuration.
///
/// Loaded from TOML files following the XDG hierarchy, with environment
/// variable overrides. All sections are optional and default to
/// sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WorkerConfig {
    /// Worker identity and logging.
    #[serde(default)]
    pub worker: WorkerSection,

    /// Control API HTTP server.
    #[serde(default)]
    pub server: ServerConfig,

    /// Document store backend.
    #[serde(default)]
    pub store: StoreConfig,

    /// On-disk credential session store.
    #[serde(default)]
    pub session: SessionConfig,

    /// Protocol transport endpoint.
    #[serde(default)]
    pub transport: TransportConfig,

    /// Reconnect backoff policy.
    #[serde(default)]
    pub reconnect: ReconnectConfig,

    /// External auto-reply responder.
    #[serde(default)]
    pub responder: ResponderConfig,
}

/// Worker identity and logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WorkerSection {
    /// Display name of this worker instance.
    #[serde(default = "default_worker_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for WorkerSection {
    fn default() -> Self {
        Self {
            name: default_worker_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_worker_name() -> String {
    "waworker".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Control API server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Document store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("waworker").join("waworker.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("waworker.db"))
        .to_string_lossy()
        .into_owned()
}

/// Credential session store configuration.
///
/// Credentials live on local disk; they survive restarts only if the
/// deployment provides persistent storage. On ephemeral disks a cold
/// start requires a fresh QR pairing — an operational constraint, not
/// a bug.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SessionConfig {
    /// Directory holding per-channel credential material.
    #[serde(default = "default_session_dir")]
    pub dir: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            dir: default_session_dir(),
        }
    }
}

fn default_session_dir() -> String {
    dirs::data_dir()
        .map(|p| p.join("waworker").join("sessions"))
        .unwrap_or_else(|| std::path::PathBuf::from("sessions"))
        .to_string_lossy()
        .into_owned()
}

/// Protocol transport configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TransportConfig {
    /// WebSocket endpoint of the multi-device pairing service.
    #[serde(default = "default_transport_endpoint")]
    pub endpoint: String,

    /// Handshake timeout in seconds.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            endpoint: default_transport_endpoint(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

fn default_transport_endpoint() -> String {
    "wss://web.whatsapp.com/ws/chat".to_string()
}

fn default_connect_timeout_secs() -> u64 {
    30
}

/// Reconnect backoff policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ReconnectConfig {
    /// First retry delay in milliseconds.
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    /// Retry delay cap in milliseconds.
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Jitter fraction (0.0-1.0) applied to each delay so many channels
    /// do not reconnect in lockstep.
    #[serde(default = "default_jitter")]
    pub jitter: f64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            jitter: default_jitter(),
        }
    }
}

fn default_initial_delay_ms() -> u64 {
    1_000
}

fn default_max_delay_ms() -> u64 {
    60_000
}

fn default_jitter() -> f64 {
    0.2
}

/// External responder configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ResponderConfig {
    /// HTTP endpoint of the reply generator. `None` disables auto-reply
    /// dispatch entirely (bot configs are still stored).
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Bearer token for the responder endpoint.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Per-invocation timeout in seconds.
    #[serde(default = "default_responder_timeout_secs")]
    pub timeout_secs: u64,

    /// How many recent messages to pass as history.
    #[serde(default = "default_history_limit")]
    pub history_limit: i64,
}

impl Default for ResponderConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            timeout_secs: default_responder_timeout_secs(),
            history_limit: default_history_limit(),
        }
    }
}

fn default_responder_timeout_secs() -> u64 {
    30
}

fn default_history_limit() -> i64 {
    20
}
