//! Post-step cache save

use super::state;
use super::store::{CacheStore, SaveOutcome};
use crate::error::{ActionError, ActionResult};
use crate::runner::Runner;
use std::path::PathBuf;
use tracing::{info, warn};

/// What the post step should save, decided from run state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavePlan {
    pub path: PathBuf,
    pub key: String,
}

/// Decide whether the post step saves anything.
///
/// Returns `None` when saving is disabled, when no key was recorded, or when
/// the main step restored an exact hit for the primary key.
pub fn plan_save(runner: &dyn Runner) -> Option<SavePlan> {
    if runner.state(state::CACHE).as_deref() != Some("true") {
        info!("Cache saving is disabled, not saving cache.");
        return None;
    }

    let primary_key = match runner.state(state::PRIMARY_KEY).filter(|k| !k.is_empty()) {
        Some(key) => key,
        None => {
            warn!("Error retrieving key from state.");
            return None;
        }
    };

    if runner.state(state::CACHE_KEY).as_deref() == Some(primary_key.as_str()) {
        info!("Cache hit occurred on key {}, not saving cache.", primary_key);
        return None;
    }

    let path = runner
        .state(state::MISE_DIR)
        .filter(|d| !d.is_empty())
        .map(PathBuf::from)?;

    Some(SavePlan {
        path,
        key: primary_key,
    })
}

/// Save the data directory described by `plan`
pub async fn save_mise_cache(store: &dyn CacheStore, plan: &SavePlan) -> ActionResult<SaveOutcome> {
    if !plan.path.exists() {
        return Err(ActionError::CachePathMissing(plan.path.clone()));
    }

    let outcome = store.save(&plan.path, &plan.key).await?;
    match outcome {
        SaveOutcome::Saved => info!(
            "Cache saved from {} with key: {}",
            plan.path.display(),
            plan.key
        ),
        SaveOutcome::AlreadyExists => warn!(
            "Cache entry with key {} already exists, not saving cache.",
            plan.key
        ),
    }
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::LocalCacheStore;
    use crate::platform::Platform;
    use crate::runner::MemoryRunner;
    use tempfile::TempDir;

    fn runner() -> MemoryRunner {
        MemoryRunner::new(Platform::from_identifiers("linux", "x86_64"))
    }

    #[test]
    fn disabled_cache_skips() {
        let runner = runner()
            .with_state(state::CACHE, "false")
            .with_state(state::PRIMARY_KEY, "k")
            .with_state(state::MISE_DIR, "/data");
        assert!(plan_save(&runner).is_none());
    }

    #[test]
    fn missing_key_skips() {
        let runner = runner()
            .with_state(state::CACHE, "true")
            .with_state(state::MISE_DIR, "/data");
        assert!(plan_save(&runner).is_none());
    }

    #[test]
    fn exact_hit_skips() {
        let runner = runner()
            .with_state(state::CACHE, "true")
            .with_state(state::PRIMARY_KEY, "k")
            .with_state(state::CACHE_KEY, "k")
            .with_state(state::MISE_DIR, "/data");
        assert!(plan_save(&runner).is_none());
    }

    #[test]
    fn miss_plans_save() {
        let runner = runner()
            .with_state(state::CACHE, "true")
            .with_state(state::PRIMARY_KEY, "k")
            .with_state(state::MISE_DIR, "/data");
        assert_eq!(
            plan_save(&runner),
            Some(SavePlan {
                path: PathBuf::from("/data"),
                key: "k".to_string(),
            })
        );
    }

    #[tokio::test]
    async fn missing_directory_fails() {
        let root = TempDir::new().unwrap();
        let store = LocalCacheStore::new(root.path().join("cache"));
        let plan = SavePlan {
            path: root.path().join("absent"),
            key: "k".to_string(),
        };
        let err = save_mise_cache(&store, &plan).await.unwrap_err();
        assert!(matches!(err, ActionError::CachePathMissing(_)));
    }

    #[tokio::test]
    async fn saves_existing_directory() {
        let root = TempDir::new().unwrap();
        let data = root.path().join("data");
        std::fs::create_dir_all(&data).unwrap();
        let store = LocalCacheStore::new(root.path().join("cache"));
        let plan = SavePlan {
            path: data,
            key: "k".to_string(),
        };
        assert_eq!(
            save_mise_cache(&store, &plan).await.unwrap(),
            SaveOutcome::Saved
        );
    }
}
