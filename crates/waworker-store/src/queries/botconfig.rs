// SPDX-FileCopyrightText: 2026 Waworker Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bot config queries.
//!
//! The config document is seeded with a disabled default on first
//! touch, so reads never fail on a missing row.

use rusqlite::params;
use waworker_core::types::{now_millis, BotConfig, BotConfigPatch};
use waworker_core::WorkerError;

use crate::database::{map_tr_err, Database};

fn seed(conn: &rusqlite::Connection, channel_id: &str) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO bot_configs (channel_id, updated_at) VALUES (?1, ?2)",
        params![channel_id, now_millis()],
    )?;
    Ok(())
}

pub async fn get(db: &Database, channel_id: &str) -> Result<BotConfig, WorkerError> {
    let channel_id = channel_id.to_string();
    db.connection()
        .call(move |conn| {
            seed(conn, &channel_id)?;
            select(conn, &channel_id)
        })
        .await
        .map_err(map_tr_err)
}

/// Merge the provided fields, stamp `updated_at` and the editor
/// attribution, and return the resulting config.
pub async fn put(
    db: &Database,
    channel_id: &str,
    patch: &BotConfigPatch,
) -> Result<BotConfig, WorkerError> {
    let channel_id = channel_id.to_string();
    let patch = patch.clone();
    let now = now_millis();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            seed(&tx, &channel_id)?;
            if let Some(enabled) = patch.enabled {
                tx.execute(
                    "UPDATE bot_configs SET enabled = ?2 WHERE channel_id = ?1",
                    params![channel_id, enabled],
                )?;
            }
            if let Some(details) = &patch.product_details {
                tx.execute(
                    "UPDATE bot_configs SET product_details = ?2 WHERE channel_id = ?1",
                    params![channel_id, details],
                )?;
            }
            if let Some(strategy) = &patch.sales_strategy {
                tx.execute(
                    "UPDATE bot_configs SET sales_strategy = ?2 WHERE channel_id = ?1",
                    params![channel_id, strategy],
                )?;
            }
            tx.execute(
                "UPDATE bot_configs
                 SET updated_at = ?2, updated_by_uid = ?3, updated_by_email = ?4
                 WHERE channel_id = ?1",
                params![channel_id, now, patch.updated_by_uid, patch.updated_by_email],
            )?;
            let config = select(&tx, &channel_id)?;
            tx.commit()?;
            Ok(config)
        })
        .await
        .map_err(map_tr_err)
}

pub async fn touch_last_auto_reply(
    db: &Database,
    channel_id: &str,
    at: i64,
) -> Result<(), WorkerError> {
    let channel_id = channel_id.to_string();
    db.connection()
        .call(move |conn| {
            seed(conn, &channel_id)?;
            conn.execute(
                "UPDATE bot_configs SET last_auto_reply_at = ?2 WHERE channel_id = ?1",
                params![channel_id, at],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

fn select(conn: &rusqlite::Connection, channel_id: &str) -> rusqlite::Result<BotConfig> {
    conn.query_row(
        "SELECT enabled, product_details, sales_strategy, updated_at,
                updated_by_uid, updated_by_email, last_auto_reply_at
         FROM bot_configs WHERE channel_id = ?1",
        params![channel_id],
        |row| {
            Ok(BotConfig {
                enabled: row.get("enabled")?,
                product_details: row.get("product_details")?,
                sales_strategy: row.get("sales_strategy")?,
                updated_at: row.get("updated_at")?,
                updated_by_uid: row.get("updated_by_uid")?,
                updated_by_email: row.get("updated_by_email")?,
                last_auto_reply_at: row.get("last_auto_reply_at")?,
            })
        },
    )
}
