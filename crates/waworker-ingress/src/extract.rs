// SPDX-FileCopyrightText: 2026 Waworker Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Total extractors over loosely-shaped message payloads.
//!
//! Device clients, history syncs, and notification relays all produce
//! differently nested JSON for the same logical message. Each accessor
//! below walks an ordered chain of known locations and returns the
//! first hit; malformed or unknown shapes degrade to `""`/`false`/the
//! caller's fallback, never to an error.

use serde_json::Value;

type TextExtractor = fn(&Value) -> Option<&str>;

fn top_level_text(v: &Value) -> Option<&str> {
    v.get("text")?.as_str()
}

fn conversation_text(v: &Value) -> Option<&str> {
    v.get("message")?.get("conversation")?.as_str()
}

fn extended_text(v: &Value) -> Option<&str> {
    v.get("message")?
        .get("extendedTextMessage")?
        .get("text")?
        .as_str()
}

fn image_caption(v: &Value) -> Option<&str> {
    v.get("message")?
        .get("imageMessage")?
        .get("caption")?
        .as_str()
}

const TEXT_CHAIN: &[TextExtractor] =
    &[top_level_text, conversation_text, extended_text, image_caption];

/// Best-effort text body. Empty string for non-text payloads
/// (stickers, audio, reactions).
pub fn text(payload: &Value) -> String {
    // Filter inside the walk: an empty hit falls through to the next
    // location instead of ending the chain.
    TEXT_CHAIN
        .iter()
        .find_map(|extract| extract(payload).filter(|s| !s.is_empty()))
        .unwrap_or_default()
        .to_string()
}

type BoolExtractor = fn(&Value) -> Option<bool>;

fn top_level_from_me(v: &Value) -> Option<bool> {
    v.get("fromMe")?.as_bool()
}

fn is_bot(v: &Value) -> Option<bool> {
    v.get("isBot")?.as_bool()
}

fn key_from_me(v: &Value) -> Option<bool> {
    v.get("key")?.get("fromMe")?.as_bool()
}

const FROM_ME_CHAIN: &[BoolExtractor] = &[top_level_from_me, is_bot, key_from_me];

/// Whether the message was authored by the channel's own device (or a
/// bot echo). Defaults to `false`: better to treat an echo as inbound
/// than to drop a customer message.
pub fn from_me(payload: &Value) -> bool {
    FROM_ME_CHAIN
        .iter()
        .find_map(|extract| extract(payload))
        .unwrap_or(false)
}

type StrExtractor = fn(&Value) -> Option<&str>;

fn top_level_jid(v: &Value) -> Option<&str> {
    v.get("jid")?.as_str()
}

fn key_remote_jid(v: &Value) -> Option<&str> {
    v.get("key")?.get("remoteJid")?.as_str()
}

fn remote_jid(v: &Value) -> Option<&str> {
    v.get("remoteJid")?.as_str()
}

const JID_CHAIN: &[StrExtractor] = &[top_level_jid, key_remote_jid, remote_jid];

/// Remote party JID, or `fallback` when no location yields one.
pub fn jid(payload: &Value, fallback: &str) -> String {
    JID_CHAIN
        .iter()
        .find_map(|extract| extract(payload).filter(|s| !s.is_empty()))
        .unwrap_or(fallback)
        .to_string()
}

fn top_level_id(v: &Value) -> Option<&str> {
    v.get("id")?.as_str()
}

fn key_id(v: &Value) -> Option<&str> {
    v.get("key")?.get("id")?.as_str()
}

const ID_CHAIN: &[StrExtractor] = &[top_level_id, key_id];

/// Protocol message id, if the payload carries one.
pub fn message_id(payload: &Value) -> Option<String> {
    ID_CHAIN
        .iter()
        .find_map(|extract| extract(payload).filter(|s| !s.is_empty()))
        .map(str::to_string)
}

/// Sender display name (`pushName`), when present.
pub fn push_name(payload: &Value) -> Option<String> {
    payload
        .get("pushName")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Protocol timestamp normalized to epoch millis.
///
/// `messageTimestamp` arrives in seconds from device clients and in
/// millis from some relays; values below 1e12 are treated as seconds.
pub fn timestamp_millis(payload: &Value, fallback: i64) -> i64 {
    let raw = payload
        .get("messageTimestamp")
        .or_else(|| payload.get("timestamp"))
        .and_then(Value::as_i64);
    match raw {
        Some(t) if t >= 1_000_000_000_000 => t,
        Some(t) if t > 0 => t * 1000,
        _ => fallback,
    }
}
