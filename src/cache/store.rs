//! Cache storage abstraction
//!
//! A store maps an exact key (plus a version derived from the cached path)
//! to an archived directory tree.

use crate::error::ActionResult;
use async_trait::async_trait;
use std::path::Path;

/// Result of a save attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// The entry was written
    Saved,
    /// An entry with this key already exists (or is being written by another job)
    AlreadyExists,
}

/// Backend that can restore and save directory trees by key
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Restore the entry for `key` into `path`.
    ///
    /// Returns the matched key on a hit, `None` on a miss. On a miss `path`
    /// is left untouched.
    async fn restore(&self, path: &Path, key: &str) -> ActionResult<Option<String>>;

    /// Archive `path` and store it under `key`
    async fn save(&self, path: &Path, key: &str) -> ActionResult<SaveOutcome>;

    /// Human-readable backend name for logs
    fn name(&self) -> &'static str;
}
