//! Single-file ballot store.
//!
//! The snapshot is written to a sibling `.tmp` file, synced to disk, and
//! only then renamed over the target. A crash mid-write leaves the previous
//! snapshot in place.

use super::traits::*;
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl BallotStore for FileStore {
    async fn load(&self) -> StoreResult<Option<BallotSnapshot>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => BallotSnapshot::decode(&bytes).map(Some),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, snapshot: &BallotSnapshot) -> StoreResult<()> {
        let bytes = snapshot.encode()?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let temp = self.temp_path();
        let result = match write_synced(&temp, &bytes).await {
            Ok(()) => tokio::fs::rename(&temp, &self.path).await,
            Err(e) => Err(e),
        };

        if let Err(e) = result {
            // The write or rename error is the one reported
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(e.into());
        }
        Ok(())
    }
}

async fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = tokio::fs::File::create(path).await?;
    file.write_all(bytes).await?;
    file.sync_all().await
}
