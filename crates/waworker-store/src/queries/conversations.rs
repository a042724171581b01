// SPDX-FileCopyrightText: 2026 Waworker Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation summary queries.

use rusqlite::params;
use waworker_core::types::{now_millis, Conversation, ConversationKind};
use waworker_core::WorkerError;

use crate::database::{map_tr_err, Database};

/// Upsert the conversation summary for a message event.
///
/// `last_message_text`/`last_message_at` only move forward: an
/// out-of-order older message never overwrites a newer summary.
pub async fn upsert_on_message(
    db: &Database,
    channel_id: &str,
    jid: &str,
    name: Option<&str>,
    text: &str,
    at: i64,
    increment_unread: bool,
) -> Result<(), WorkerError> {
    let channel_id = channel_id.to_string();
    let jid = jid.to_string();
    let name = name.map(str::to_string);
    let text = text.to_string();
    let kind = ConversationKind::from_jid(&jid).to_string();
    let now = now_millis();
    let inc: i64 = if increment_unread { 1 } else { 0 };
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO conversations
                     (channel_id, jid, kind, name, last_message_text,
                      last_message_at, unread_count, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                 ON CONFLICT (channel_id, jid) DO UPDATE SET
                     name = COALESCE(excluded.name, conversations.name),
                     last_message_text = CASE
                         WHEN excluded.last_message_at >= conversations.last_message_at
                         THEN excluded.last_message_text
                         ELSE conversations.last_message_text
                     END,
                     last_message_at =
                         MAX(conversations.last_message_at, excluded.last_message_at),
                     unread_count = conversations.unread_count + ?7,
                     updated_at = excluded.updated_at",
                params![channel_id, jid, kind, name, text, at, inc, now],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Reset `unread_count`. Returns `false` when the conversation is
/// missing.
pub async fn mark_read(
    db: &Database,
    channel_id: &str,
    jid: &str,
) -> Result<bool, WorkerError> {
    let channel_id = channel_id.to_string();
    let jid = jid.to_string();
    let now = now_millis();
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE conversations SET unread_count = 0, updated_at = ?3
                 WHERE channel_id = ?1 AND jid = ?2",
                params![channel_id, jid, now],
            )?;
            Ok(changed > 0)
        })
        .await
        .map_err(map_tr_err)
}

pub async fn get(
    db: &Database,
    channel_id: &str,
    jid: &str,
) -> Result<Option<Conversation>, WorkerError> {
    let channel_id = channel_id.to_string();
    let jid = jid.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT jid, kind, name, last_message_text, last_message_at,
                        unread_count, updated_at
                 FROM conversations WHERE channel_id = ?1 AND jid = ?2",
            )?;
            let mut rows = stmt.query_map(params![channel_id, jid], row_to_conversation)?;
            match rows.next() {
                Some(row) => Ok(Some(row?)),
                None => Ok(None),
            }
        })
        .await
        .map_err(map_tr_err)
}

fn row_to_conversation(row: &rusqlite::Row<'_>) -> rusqlite::Result<Conversation> {
    let kind_raw: String = row.get("kind")?;
    let kind = kind_raw.parse().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(Conversation {
        jid: row.get("jid")?,
        kind,
        name: row.get("name")?,
        last_message_text: row.get("last_message_text")?,
        last_message_at: row.get("last_message_at")?,
        unread_count: row.get("unread_count")?,
        updated_at: row.get("updated_at")?,
    })
}
