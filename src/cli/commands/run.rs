//! Run command - the action's main step

use crate::cache;
use crate::cli::args::RunArgs;
use crate::config::ActionConfig;
use crate::error::{ActionError, ActionResult};
use crate::install::HttpsDownloader;
use crate::pipeline;
use crate::runner::GithubRunner;
use std::path::Path;
use tracing::{debug, info};

/// Execute the run command
pub async fn execute(args: RunArgs, cache_dir: Option<&Path>) -> ActionResult<()> {
    let cwd = std::env::current_dir()
        .map_err(|e| ActionError::io("getting current directory", e))?;
    let config = ActionConfig::from_args(&args, &cwd)?;
    debug!("Resolved config: {:?}", config);

    let mut runner = GithubRunner::from_env();
    let store = if config.cache {
        Some(cache::open_store(&runner, cache_dir)?)
    } else {
        None
    };

    let summary = pipeline::run(
        &mut runner,
        &config,
        &HttpsDownloader::new(),
        store.as_deref(),
    )
    .await?;

    info!(
        "mise installed at {} (cache hit: {})",
        summary.bin.display(),
        summary.cache_hit
    );
    Ok(())
}
