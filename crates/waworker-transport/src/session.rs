// SPDX-FileCopyrightText: 2026 Waworker Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-channel session credential persistence.
//!
//! Credential material is an opaque JSON blob owned by the protocol
//! layer. It lives at `<root>/<channel_id>/creds.json`; writes go
//! through a temp file plus rename so a crash mid-write never leaves a
//! truncated blob that would poison the next silent re-auth.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use waworker_core::types::SessionCreds;
use waworker_core::WorkerError;

/// Filesystem store for transport credential blobs.
#[derive(Clone)]
pub struct SessionStore {
    root: PathBuf,
}

impl SessionStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn creds_path(&self, channel_id: &str) -> PathBuf {
        self.root.join(channel_id).join("creds.json")
    }

    /// Load persisted credentials, if any. A corrupt blob is treated as
    /// absent (and logged): the session falls back to a fresh pairing.
    pub async fn load(&self, channel_id: &str) -> Result<Option<SessionCreds>, WorkerError> {
        let path = self.creds_path(channel_id);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(io_err("read session creds", e)),
        };
        match serde_json::from_slice(&bytes) {
            Ok(value) => Ok(Some(SessionCreds(value))),
            Err(e) => {
                warn!(channel_id, path = %path.display(), error = %e,
                    "corrupt credential blob, treating as absent");
                Ok(None)
            }
        }
    }

    /// Persist credentials atomically.
    pub async fn save(
        &self,
        channel_id: &str,
        creds: &SessionCreds,
    ) -> Result<(), WorkerError> {
        let path = self.creds_path(channel_id);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| io_err("create session dir", e))?;
        }
        let bytes = serde_json::to_vec(&creds.0).map_err(|e| WorkerError::Transport {
            message: "serialize session creds".into(),
            source: Some(Box::new(e)),
        })?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &bytes)
            .await
            .map_err(|e| io_err("write session creds", e))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| io_err("commit session creds", e))?;
        debug!(channel_id, "session creds persisted");
        Ok(())
    }

    /// Delete all session material for a channel. Idempotent.
    pub async fn wipe(&self, channel_id: &str) -> Result<(), WorkerError> {
        let dir = self.root.join(channel_id);
        match tokio::fs::remove_dir_all(&dir).await {
            Ok(()) => {
                debug!(channel_id, "session creds wiped");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_err("wipe session dir", e)),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

fn io_err(message: &str, e: std::io::Error) -> WorkerError {
    WorkerError::Transport {
        message: message.into(),
        source: Some(Box::new(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn creds(n: i64) -> SessionCreds {
        SessionCreds(serde_json::json!({"noiseKey": "k", "registration": n}))
    }

    #[tokio::test]
    async fn load_missing_is_none() {
        let dir = tempdir().unwrap();
        let store = SessionStore::new(dir.path());
        assert!(store.load("ch1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let dir = tempdir().unwrap();
        let store = SessionStore::new(dir.path());

        store.save("ch1", &creds(1)).await.unwrap();
        let loaded = store.load("ch1").await.unwrap().unwrap();
        assert_eq!(loaded.0["registration"], 1);
    }

    #[tokio::test]
    async fn save_overwrites_previous_blob() {
        let dir = tempdir().unwrap();
        let store = SessionStore::new(dir.path());

        store.save("ch1", &creds(1)).await.unwrap();
        store.save("ch1", &creds(2)).await.unwrap();
        let loaded = store.load("ch1").await.unwrap().unwrap();
        assert_eq!(loaded.0["registration"], 2);
    }

    #[tokio::test]
    async fn channels_are_isolated() {
        let dir = tempdir().unwrap();
        let store = SessionStore::new(dir.path());

        store.save("ch1", &creds(1)).await.unwrap();
        assert!(store.load("ch2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn wipe_removes_creds_and_is_idempotent() {
        let dir = tempdir().unwrap();
        let store = SessionStore::new(dir.path());

        store.save("ch1", &creds(1)).await.unwrap();
        store.wipe("ch1").await.unwrap();
        assert!(store.load("ch1").await.unwrap().is_none());
        // Second wipe of an absent dir is fine.
        store.wipe("ch1").await.unwrap();
    }

    #[tokio::test]
    async fn corrupt_blob_reads_as_absent() {
        let dir = tempdir().unwrap();
        let store = SessionStore::new(dir.path());

        let path = dir.path().join("ch1");
        tokio::fs::create_dir_all(&path).await.unwrap();
        tokio::fs::write(path.join("creds.json"), b"{trunc")
            .await
            .unwrap();
        assert!(store.load("ch1").await.unwrap().is_none());
    }
}
