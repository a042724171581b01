// SPDX-FileCopyrightText: 2026 Waworker Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared across the waworker crates.
//!
//! The channel/conversation/message records here are the shapes the
//! worker writes to the document store and the dashboard reads back.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Observable status of a channel, as written to the document store.
///
/// Serialized SCREAMING_SNAKE to match what the dashboard expects
/// (`DISCONNECTED`, `CONNECTING`, `QR`, `CONNECTED`, `ERROR`).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChannelStatus {
    Disconnected,
    Connecting,
    Qr,
    Connected,
    Error,
}

/// Structured last-error field on a channel record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastError {
    pub code: String,
    pub message: String,
}

/// One managed WhatsApp-linked session/number.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Channel {
    pub id: String,
    pub display_name: String,
    pub status: ChannelStatus,
    /// Raw pairing payload. Non-null only while status is QR.
    pub qr: Option<String>,
    /// Rendered image form of the pairing payload (SVG data URL).
    pub qr_data_url: Option<String>,
    /// Non-null only while status is CONNECTED.
    pub phone_e164: Option<String>,
    /// Epoch millis of the last inbound protocol activity.
    pub last_seen_at: Option<i64>,
    /// Epoch millis, strictly increasing across updates to one channel.
    pub updated_at: i64,
    pub last_error: Option<LastError>,
    /// Tenant assignment, owned by the dashboard. Read-only to the worker.
    pub company_id: Option<String>,
    pub company_name: Option<String>,
}

/// A patch cell: distinguish "leave unchanged" from "set" from
/// "explicitly clear to null".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Field<T> {
    #[default]
    Keep,
    Set(T),
    Clear,
}

impl<T> Field<T> {
    pub fn is_keep(&self) -> bool {
        matches!(self, Field::Keep)
    }

    pub fn as_set(&self) -> Option<&T> {
        match self {
            Field::Set(v) => Some(v),
            _ => None,
        }
    }
}

/// Non-destructive partial update of a channel record.
///
/// Fields left at their defaults are never touched by a merge; `Clear`
/// explicitly nulls a nullable column. `updated_at` is stamped by the
/// publisher, never by callers.
#[derive(Debug, Clone, Default)]
pub struct ChannelPatch {
    pub display_name: Option<String>,
    pub status: Option<ChannelStatus>,
    pub qr: Field<String>,
    pub qr_data_url: Field<String>,
    pub phone_e164: Field<String>,
    pub last_seen_at: Option<i64>,
    pub last_error: Field<LastError>,
}

impl ChannelPatch {
    pub fn status(status: ChannelStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn with_qr(mut self, qr: String, qr_data_url: String) -> Self {
        self.qr = Field::Set(qr);
        self.qr_data_url = Field::Set(qr_data_url);
        self
    }

    pub fn clear_qr(mut self) -> Self {
        self.qr = Field::Clear;
        self.qr_data_url = Field::Clear;
        self
    }

    pub fn with_phone(mut self, phone_e164: Option<String>) -> Self {
        self.phone_e164 = match phone_e164 {
            Some(p) => Field::Set(p),
            None => Field::Clear,
        };
        self
    }

    pub fn clear_phone(mut self) -> Self {
        self.phone_e164 = Field::Clear;
        self
    }

    pub fn with_error(mut self, error: LastError) -> Self {
        self.last_error = Field::Set(error);
        self
    }

    pub fn clear_error(mut self) -> Self {
        self.last_error = Field::Clear;
        self
    }

    pub fn with_last_seen(mut self, at: i64) -> Self {
        self.last_seen_at = Some(at);
        self
    }
}

/// Per-channel auto-reply configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BotConfig {
    pub enabled: bool,
    /// Free-text product/sales knowledge base.
    pub product_details: String,
    /// Free-text persona/strategy instructions.
    pub sales_strategy: String,
    pub updated_at: i64,
    pub updated_by_uid: Option<String>,
    pub updated_by_email: Option<String>,
    pub last_auto_reply_at: Option<i64>,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            product_details: String::new(),
            sales_strategy: String::new(),
            updated_at: 0,
            updated_by_uid: None,
            updated_by_email: None,
            last_auto_reply_at: None,
        }
    }
}

/// Partial bot-config update; provided fields are merged, the rest kept.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct BotConfigPatch {
    pub enabled: Option<bool>,
    pub product_details: Option<String>,
    pub sales_strategy: Option<String>,
    pub updated_by_uid: Option<String>,
    pub updated_by_email: Option<String>,
}

/// Whether a conversation party is a single user or a group.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ConversationKind {
    User,
    Group,
}

impl ConversationKind {
    /// Derive the kind from the JID suffix. Group JIDs end in `@g.us`.
    pub fn from_jid(jid: &str) -> Self {
        if jid.ends_with("@g.us") {
            ConversationKind::Group
        } else {
            ConversationKind::User
        }
    }
}

/// One conversation per (channel, remote party) pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub jid: String,
    pub kind: ConversationKind,
    pub name: Option<String>,
    pub last_message_text: String,
    /// Epoch millis, monotonic per conversation.
    pub last_message_at: i64,
    /// Never negative; reset to 0 only by an explicit mark-read.
    pub unread_count: i64,
    pub updated_at: i64,
}

/// Message direction relative to the channel's own device.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    In,
    Out,
}

/// Delivery lifecycle of a message.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    Received,
    Sent,
    Delivered,
    Read,
}

/// Canonical message record, child of a conversation.
///
/// `timestamp` is protocol-assigned and may arrive out of order within a
/// conversation; consumers sort, they do not assume ingestion order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageRecord {
    pub id: String,
    pub jid: String,
    pub from_me: bool,
    pub direction: Direction,
    /// Non-text payloads carry no text.
    pub text: Option<String>,
    pub status: Option<MessageStatus>,
    /// Epoch millis, protocol-assigned.
    pub timestamp: i64,
    /// Epoch millis, store-assigned.
    pub created_at: i64,
}

/// Opaque multi-device credential material issued by the transport.
///
/// The worker persists this blob verbatim and offers it back on connect
/// for silent re-auth; it never inspects the contents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionCreds(pub serde_json::Value);

/// Why a transport session closed.
///
/// A closed enum rather than a boolean so the retry/no-retry decision
/// stays auditable and extensible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "camelCase")]
pub enum CloseReason {
    /// The remote side revoked this device's pairing.
    LoggedOut,
    /// Another device logged in and took over the session.
    Replaced,
    /// The stored credential material is unusable.
    BadSession,
    ConnectionLost,
    TimedOut,
    ServerRestart,
    Unknown,
}

/// What the supervisor does after a given close reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Re-attempt with existing credentials, backoff applies.
    Retry,
    /// Session is dead; a new QR pairing is required. No auto-reconnect.
    RequireNewPairing,
}

impl CloseReason {
    /// The reconnect policy table. Logged-out style closures must never
    /// be retried automatically; everything else is transient.
    pub fn retry_decision(self) -> RetryDecision {
        match self {
            CloseReason::LoggedOut | CloseReason::Replaced | CloseReason::BadSession => {
                RetryDecision::RequireNewPairing
            }
            CloseReason::ConnectionLost
            | CloseReason::TimedOut
            | CloseReason::ServerRestart
            | CloseReason::Unknown => RetryDecision::Retry,
        }
    }

    /// Map a wire-level reason string onto the closed enum. Unrecognized
    /// reasons are `Unknown` (and therefore retried).
    pub fn from_wire(reason: &str) -> Self {
        match reason {
            "loggedOut" | "logged_out" => CloseReason::LoggedOut,
            "replaced" | "connectionReplaced" => CloseReason::Replaced,
            "badSession" | "bad_session" => CloseReason::BadSession,
            "connectionLost" | "connection_lost" => CloseReason::ConnectionLost,
            "timedOut" | "timed_out" => CloseReason::TimedOut,
            "serverRestart" | "restartRequired" => CloseReason::ServerRestart,
            _ => CloseReason::Unknown,
        }
    }
}

/// An event produced by a live transport session.
#[derive(Debug, Clone)]
pub enum TransportEvent {
    /// A pairing payload was issued; show it until scanned or replaced.
    Qr(String),
    /// The session is authenticated and open.
    Open { phone_e164: Option<String> },
    /// Credential material was issued or rotated; persist it.
    Creds(SessionCreds),
    /// An inbound (or device-echoed) message payload, loosely shaped.
    Message(serde_json::Value),
    /// Delivery receipt for a previously sent message.
    Receipt {
        message_id: String,
        status: MessageStatus,
    },
    /// The session closed.
    Closed(CloseReason),
}

/// Current epoch time in milliseconds.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
