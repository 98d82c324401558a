//! Post command - save the mise data directory after the job

use crate::cache;
use crate::error::ActionResult;
use crate::runner::GithubRunner;
use std::path::Path;
use tracing::debug;

/// Execute the post command
pub async fn execute(cache_dir: Option<&Path>) -> ActionResult<()> {
    let runner = GithubRunner::from_env();

    let Some(plan) = cache::plan_save(&runner) else {
        return Ok(());
    };
    debug!("Saving {} as {}", plan.path.display(), plan.key);

    let store = cache::open_store(&runner, cache_dir)?;
    cache::save_mise_cache(store.as_ref(), &plan).await?;
    Ok(())
}
