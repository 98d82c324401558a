//! Directory-backed cache store for self-hosted runners

use super::archive::{create_archive, extract_archive};
use super::key::cache_version;
use super::store::{CacheStore, SaveOutcome};
use super::run_blocking;
use crate::error::{ActionError, ActionResult};
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};
use uuid::Uuid;

/// Cache store that keeps archives as files in a local directory
pub struct LocalCacheStore {
    root: PathBuf,
}

impl LocalCacheStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Archive file for a key and cached path
    fn entry_path(&self, path: &Path, key: &str) -> PathBuf {
        // Keys may hold any character, including path separators
        let key_hash = hex::encode(Sha256::digest(key.as_bytes()));
        let version = cache_version(path);
        self.root.join(format!("{}-{}.tar.gz", key_hash, &version[..12]))
    }
}

#[async_trait]
impl CacheStore for LocalCacheStore {
    async fn restore(&self, path: &Path, key: &str) -> ActionResult<Option<String>> {
        let entry = self.entry_path(path, key);
        if !entry.is_file() {
            debug!("No cache entry at {}", entry.display());
            return Ok(None);
        }

        let dest = path.to_path_buf();
        run_blocking(move || extract_archive(&entry, &dest)).await?;
        Ok(Some(key.to_string()))
    }

    async fn save(&self, path: &Path, key: &str) -> ActionResult<SaveOutcome> {
        let entry = self.entry_path(path, key);
        if entry.exists() {
            return Ok(SaveOutcome::AlreadyExists);
        }

        fs::create_dir_all(&self.root)
            .await
            .map_err(|e| ActionError::io(format!("creating {}", self.root.display()), e))?;

        // Write next to the final location, then rename into place
        let partial = self.root.join(format!(".partial-{}", Uuid::new_v4()));
        let src = path.to_path_buf();
        let tmp = partial.clone();
        let size = run_blocking(move || create_archive(&src, &tmp)).await?;

        fs::rename(&partial, &entry)
            .await
            .map_err(|e| ActionError::io(format!("writing {}", entry.display()), e))?;

        info!("Stored {} bytes at {}", size, entry.display());
        Ok(SaveOutcome::Saved)
    }

    fn name(&self) -> &'static str {
        "local"
    }
}
