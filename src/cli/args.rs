//! CLI argument definitions using clap derive
//!
//! Every action input is also read from the `INPUT_<NAME>` variable the
//! Actions runner sets from the step's `with:` block.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// mise-action - install mise in CI
///
/// Installs the mise CLI, restores a cache of its data directory and
/// exports the environment mise computes for the project.
#[derive(Parser, Debug)]
#[command(name = "mise-action")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Store cache archives in this directory instead of the GitHub cache service
    #[arg(long, global = true, env = "MISE_ACTION_CACHE_DIR")]
    pub cache_dir: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Main step: write configs, restore cache, install mise, export env
    Run(RunArgs),

    /// Post step: save the mise data directory to the cache
    Post,
}

/// Action inputs for the main step.
///
/// Values are kept as raw strings; `config::ActionConfig` validates them.
#[derive(Parser, Debug, Default)]
pub struct RunArgs {
    /// Restore the mise data directory from cache (true/false)
    #[arg(long, env = "INPUT_CACHE")]
    pub cache: Option<String>,

    /// Save the cache in the post step (true/false)
    #[arg(long, env = "INPUT_CACHE_SAVE")]
    pub cache_save: Option<String>,

    /// Prefix for the cache key
    #[arg(long, env = "INPUT_CACHE_KEY_PREFIX")]
    pub cache_key_prefix: Option<String>,

    /// mise version to install (latest if omitted)
    #[arg(long = "mise-version", env = "INPUT_VERSION")]
    pub version: Option<String>,

    /// Directory mise runs in (defaults to current directory)
    #[arg(long, env = "INPUT_INSTALL_DIR")]
    pub install_dir: Option<String>,

    /// Enable mise experimental features ("true" to enable)
    #[arg(long, env = "INPUT_EXPERIMENTAL")]
    pub experimental: Option<String>,

    /// Body written to .tool-versions
    #[arg(long, env = "INPUT_TOOL_VERSIONS")]
    pub tool_versions: Option<String>,

    /// Body written to .mise.toml
    #[arg(long, env = "INPUT_MISE_TOML")]
    pub mise_toml: Option<String>,

    /// Run `mise install` (true/false)
    #[arg(long, env = "INPUT_INSTALL")]
    pub install: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_run() {
        let cli = Cli::parse_from([
            "mise-action",
            "run",
            "--cache",
            "false",
            "--mise-version",
            "2024.12.14",
            "--tool-versions",
            "node 20",
        ]);
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.cache.as_deref(), Some("false"));
                assert_eq!(args.version.as_deref(), Some("2024.12.14"));
                assert_eq!(args.tool_versions.as_deref(), Some("node 20"));
            }
            _ => panic!("expected Run command"),
        }
    }

    #[test]
    fn cli_parses_post() {
        let cli = Cli::parse_from(["mise-action", "post"]);
        assert!(matches!(cli.command, Commands::Post));
    }

    #[test]
    fn cli_cache_dir_is_global() {
        let cli = Cli::parse_from(["mise-action", "post", "--cache-dir", "/tmp/cache"]);
        assert_eq!(cli.cache_dir, Some(PathBuf::from("/tmp/cache")));
    }

    #[test]
    fn cli_verbose_levels() {
        let cli = Cli::parse_from(["mise-action", "post"]);
        assert_eq!(cli.verbose, 0);

        let cli = Cli::parse_from(["mise-action", "-vv", "post"]);
        assert_eq!(cli.verbose, 2);
    }
}
