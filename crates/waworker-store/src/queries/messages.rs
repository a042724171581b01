// SPDX-FileCopyrightText: 2026 Waworker Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message record queries.

use rusqlite::params;
use waworker_core::types::{MessageRecord, MessageStatus};
use waworker_core::WorkerError;

use crate::database::{map_tr_err, Database};

/// Insert a message keyed by its protocol id. Returns `false` when the
/// id already exists, so re-delivered events stay exactly-once.
pub async fn insert(
    db: &Database,
    channel_id: &str,
    message: &MessageRecord,
) -> Result<bool, WorkerError> {
    let channel_id = channel_id.to_string();
    let message = message.clone();
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "INSERT INTO messages
                     (channel_id, id, jid, from_me, direction, text, status,
                      timestamp, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                 ON CONFLICT (channel_id, id) DO NOTHING",
                params![
                    channel_id,
                    message.id,
                    message.jid,
                    message.from_me,
                    message.direction.to_string(),
                    message.text,
                    message.status.map(|s| s.to_string()),
                    message.timestamp,
                    message.created_at,
                ],
            )?;
            Ok(changed > 0)
        })
        .await
        .map_err(map_tr_err)
}

pub async fn update_status(
    db: &Database,
    channel_id: &str,
    message_id: &str,
    status: MessageStatus,
) -> Result<(), WorkerError> {
    let channel_id = channel_id.to_string();
    let message_id = message_id.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE messages SET status = ?3 WHERE channel_id = ?1 AND id = ?2",
                params![channel_id, message_id, status.to_string()],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// The `limit` most recent messages for a conversation, oldest first.
pub async fn recent(
    db: &Database,
    channel_id: &str,
    jid: &str,
    limit: i64,
) -> Result<Vec<MessageRecord>, WorkerError> {
    let channel_id = channel_id.to_string();
    let jid = jid.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, jid, from_me, direction, text, status, timestamp, created_at
                 FROM messages WHERE channel_id = ?1 AND jid = ?2
                 ORDER BY timestamp DESC LIMIT ?3",
            )?;
            let rows = stmt.query_map(params![channel_id, jid, limit], row_to_message)?;
            let mut messages = Vec::new();
            for row in rows {
                messages.push(row?);
            }
            messages.reverse();
            Ok(messages)
        })
        .await
        .map_err(map_tr_err)
}

fn row_to_message(row: &rusqlite::Row<'_>) -> rusqlite::Result<MessageRecord> {
    let direction_raw: String = row.get("direction")?;
    let direction = direction_raw.parse().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let status_raw: Option<String> = row.get("status")?;
    let status = match status_raw {
        Some(raw) => Some(raw.parse().map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                5,
                rusqlite::types::Type::Text,
                Box::new(e),
            )
        })?),
        None => None,
    };
    Ok(MessageRecord {
        id: row.get("id")?,
        jid: row.get("jid")?,
        from_me: row.get("from_me")?,
        direction,
        text: row.get("text")?,
        status,
        timestamp: row.get("timestamp")?,
        created_at: row.get("created_at")?,
    })
}
