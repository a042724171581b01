// SPDX-FileCopyrightText: 2026 Waworker Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Temp-backed store fixtures.

use std::sync::Arc;

use waworker_store::SqliteStore;

/// Fresh store in a temp dir. Keep the `TempDir` alive for the test's
/// duration.
pub async fn temp_store() -> (tempfile::TempDir, Arc<SqliteStore>) {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("test.db");
    let store = SqliteStore::open(path.to_str().unwrap())
        .await
        .expect("open test store");
    (dir, Arc::new(store))
}
