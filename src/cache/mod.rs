//! Cache of the mise data directory
//!
//! The main step restores the data directory by an exact key derived from
//! the project's mise configuration; the post step saves it back under the
//! same key when the restore missed.
//!
//! # Run state
//!
//! | State | Written by | Meaning |
//! |-------|-----------|---------|
//! | `CACHE` | main | `true` when the post step should save |
//! | `PRIMARY_KEY` | main | key derived for this run |
//! | `MISE_DIR` | main | directory that was restored / should be saved |
//! | `CACHE_KEY` | main, on hit | key that was actually restored |

mod archive;
mod github;
pub mod key;
mod local;
mod save;
mod store;

pub use archive::{create_archive, extract_archive};
pub use github::GithubCacheService;
pub use key::{cache_key, hash_config_files, DEFAULT_KEY_PREFIX};
pub use local::LocalCacheStore;
pub use save::{plan_save, save_mise_cache, SavePlan};
pub use store::{CacheStore, SaveOutcome};

use crate::error::{ActionError, ActionResult};
use crate::platform::Platform;
use crate::runner::Runner;
use std::path::Path;
use tracing::info;

/// Names of the values shared with the post step
pub mod state {
    pub const CACHE: &str = "CACHE";
    pub const PRIMARY_KEY: &str = "PRIMARY_KEY";
    pub const MISE_DIR: &str = "MISE_DIR";
    pub const CACHE_KEY: &str = "CACHE_KEY";
}

/// Step output reporting whether the cache was restored
pub const CACHE_HIT_OUTPUT: &str = "cache-hit";

/// Pick a cache backend: a local directory when one is configured,
/// otherwise the GitHub Actions cache service.
pub fn open_store(
    runner: &dyn Runner,
    cache_dir: Option<&Path>,
) -> ActionResult<Box<dyn CacheStore>> {
    match cache_dir {
        Some(dir) => Ok(Box::new(LocalCacheStore::new(dir))),
        None => Ok(Box::new(GithubCacheService::from_runner(runner)?)),
    }
}

/// Restore the mise data directory.
///
/// Returns whether the cache was hit. State for the post step is recorded on
/// both hit and miss; errors from the store abort the run.
pub async fn restore_mise_cache(
    runner: &mut dyn Runner,
    store: &dyn CacheStore,
    working_dir: &Path,
    key_prefix: &str,
    data_dir: &Path,
) -> ActionResult<bool> {
    let platform: Platform = runner.platform().clone();
    let hash = hash_config_files(working_dir)?;
    let primary_key = cache_key(key_prefix, &platform, &hash);

    runner.save_state(state::PRIMARY_KEY, &primary_key)?;
    runner.save_state(state::MISE_DIR, &data_dir.to_string_lossy())?;

    info!("Looking up {} cache for key {}", store.name(), primary_key);
    let restored = store.restore(data_dir, &primary_key).await?;
    runner.set_output(CACHE_HIT_OUTPUT, if restored.is_some() { "true" } else { "false" })?;

    match restored {
        Some(cache_key) => {
            runner.save_state(state::CACHE_KEY, &cache_key)?;
            info!("mise cache restored from key: {}", cache_key);
            Ok(true)
        }
        None => {
            info!("mise cache not found for {} tool versions", platform);
            Ok(false)
        }
    }
}

/// Run a blocking closure on tokio's blocking pool
pub(crate) async fn run_blocking<T, F>(f: F) -> ActionResult<T>
where
    F: FnOnce() -> ActionResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ActionError::Internal(format!("blocking task failed: {e}")))?
}
