// SPDX-FileCopyrightText: 2026 Waworker Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Channel record queries.
//!
//! Merges are non-destructive: a patch only touches the columns it
//! names, and the base row is seeded first so a partial update never
//! fails on a missing document.

use rusqlite::params;
use waworker_core::types::{now_millis, Channel, ChannelPatch, Field, LastError};
use waworker_core::WorkerError;

use crate::database::{map_tr_err, Database};

/// Apply a partial update to `channels/{channel_id}` in one transaction.
///
/// `updated_at` is stamped `max(now, prev + 1)` so it is strictly
/// increasing even when wall clocks stall or step backwards.
pub async fn merge(
    db: &Database,
    channel_id: &str,
    patch: &ChannelPatch,
) -> Result<(), WorkerError> {
    let id = channel_id.to_string();
    let patch = patch.clone();
    let now = now_millis();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT OR IGNORE INTO channels (id, updated_at) VALUES (?1, 0)",
                params![id],
            )?;
            let prev: i64 = tx.query_row(
                "SELECT updated_at FROM channels WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )?;
            let stamp = now.max(prev + 1);

            if let Some(name) = &patch.display_name {
                tx.execute(
                    "UPDATE channels SET display_name = ?2 WHERE id = ?1",
                    params![id, name],
                )?;
            }
            if let Some(status) = patch.status {
                tx.execute(
                    "UPDATE channels SET status = ?2 WHERE id = ?1",
                    params![id, status.to_string()],
                )?;
            }
            apply_field(&tx, &id, "qr", &patch.qr)?;
            apply_field(&tx, &id, "qr_data_url", &patch.qr_data_url)?;
            apply_field(&tx, &id, "phone_e164", &patch.phone_e164)?;
            if let Some(at) = patch.last_seen_at {
                tx.execute(
                    "UPDATE channels SET last_seen_at = ?2 WHERE id = ?1",
                    params![id, at],
                )?;
            }
            match &patch.last_error {
                Field::Keep => {}
                Field::Set(err) => {
                    tx.execute(
                        "UPDATE channels SET last_error_code = ?2, last_error_message = ?3
                         WHERE id = ?1",
                        params![id, err.code, err.message],
                    )?;
                }
                Field::Clear => {
                    tx.execute(
                        "UPDATE channels SET last_error_code = NULL, last_error_message = NULL
                         WHERE id = ?1",
                        params![id],
                    )?;
                }
            }
            tx.execute(
                "UPDATE channels SET updated_at = ?2 WHERE id = ?1",
                params![id, stamp],
            )?;
            tx.commit()?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

fn apply_field(
    tx: &rusqlite::Transaction<'_>,
    id: &str,
    column: &str,
    field: &Field<String>,
) -> rusqlite::Result<()> {
    // `column` is one of a fixed internal set, never caller input.
    match field {
        Field::Keep => {}
        Field::Set(value) => {
            tx.execute(
                &format!("UPDATE channels SET {column} = ?2 WHERE id = ?1"),
                params![id, value],
            )?;
        }
        Field::Clear => {
            tx.execute(
                &format!("UPDATE channels SET {column} = NULL WHERE id = ?1"),
                params![id],
            )?;
        }
    }
    Ok(())
}

const SELECT_COLUMNS: &str = "id, display_name, status, qr, qr_data_url, phone_e164,
     last_seen_at, updated_at, last_error_code, last_error_message,
     company_id, company_name";

pub async fn get(db: &Database, channel_id: &str) -> Result<Option<Channel>, WorkerError> {
    let id = channel_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SELECT_COLUMNS} FROM channels WHERE id = ?1"
            ))?;
            let mut rows = stmt.query_map(params![id], row_to_channel)?;
            match rows.next() {
                Some(row) => Ok(Some(row?)),
                None => Ok(None),
            }
        })
        .await
        .map_err(map_tr_err)
}

pub async fn list(db: &Database) -> Result<Vec<Channel>, WorkerError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SELECT_COLUMNS} FROM channels ORDER BY id"
            ))?;
            let rows = stmt.query_map([], row_to_channel)?;
            let mut channels = Vec::new();
            for row in rows {
                channels.push(row?);
            }
            Ok(channels)
        })
        .await
        .map_err(map_tr_err)
}

fn row_to_channel(row: &rusqlite::Row<'_>) -> rusqlite::Result<Channel> {
    let status_raw: String = row.get("status")?;
    let status = status_raw.parse().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let last_error_code: Option<String> = row.get("last_error_code")?;
    let last_error_message: Option<String> = row.get("last_error_message")?;
    let last_error = last_error_code.map(|code| LastError {
        code,
        message: last_error_message.unwrap_or_default(),
    });
    Ok(Channel {
        id: row.get("id")?,
        display_name: row.get("display_name")?,
        status,
        qr: row.get("qr")?,
        qr_data_url: row.get("qr_data_url")?,
        phone_e164: row.get("phone_e164")?,
        last_seen_at: row.get("last_seen_at")?,
        updated_at: row.get("updated_at")?,
        last_error,
        company_id: row.get("company_id")?,
        company_name: row.get("company_name")?,
    })
}
