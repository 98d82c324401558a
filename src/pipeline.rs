//! The main step: seven stages, run in order
//!
//! write configs → restore cache → install mise → bootstrap env → verify →
//! install tools → export env. The first error stops the run; anything
//! already applied to the job stays applied.

use crate::cache::{self, CacheStore, CACHE_HIT_OUTPUT};
use crate::config::ActionConfig;
use crate::config_files::write_config_files;
use crate::env::{bootstrap_env, export_env};
use crate::error::{ActionError, ActionResult};
use crate::install::{install_mise, BinarySource};
use crate::mise::MiseCommand;
use crate::platform::mise_data_dir;
use crate::runner::Runner;
use std::path::PathBuf;
use tracing::info;

/// What a completed run did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub cache_hit: bool,
    pub data_dir: PathBuf,
    pub bin: PathBuf,
}

/// Run the main step.
///
/// `store` must be present when `config.cache` is true and is never touched
/// otherwise.
pub async fn run(
    runner: &mut dyn Runner,
    config: &ActionConfig,
    source: &dyn BinarySource,
    store: Option<&dyn CacheStore>,
) -> ActionResult<RunSummary> {
    let data_dir = mise_data_dir(|name| runner.var(name));

    write_config_files(config).await?;

    runner.save_state(
        cache::state::CACHE,
        if config.save_enabled() { "true" } else { "false" },
    )?;

    let cache_hit = if config.cache {
        let store = store.ok_or_else(|| {
            ActionError::Internal("cache enabled without a cache store".to_string())
        })?;
        runner.start_group("Restoring mise cache");
        let hit = cache::restore_mise_cache(
            runner,
            store,
            &config.working_dir,
            &config.cache_key_prefix,
            &data_dir,
        )
        .await;
        runner.end_group();
        hit?
    } else {
        runner.set_output(CACHE_HIT_OUTPUT, "false")?;
        false
    };

    runner.start_group("Installing mise");
    let bin = install_mise(runner, source, config.version.as_deref(), &data_dir).await;
    runner.end_group();
    let bin = bin?;

    runner.start_group("Setting env vars");
    let bootstrapped = bootstrap_env(runner, config);
    runner.end_group();
    bootstrapped?;

    let mise = MiseCommand::new(&bin, &config.working_dir);

    let version = mise.version(runner.vars()).await?;
    info!("Installed {}", version.stdout.trim());

    if config.install {
        runner.start_group("Running mise install");
        let installed = mise.install(runner.vars()).await;
        runner.end_group();
        installed?;
    }

    runner.start_group("Exporting mise environment");
    let dump = mise.env_json(runner.vars()).await;
    let exported = dump.and_then(|output| export_env(runner, &output));
    runner.end_group();
    exported?;

    Ok(RunSummary {
        cache_hit,
        data_dir,
        bin,
    })
}
