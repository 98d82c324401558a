//! Action configuration
//!
//! Turns the raw input strings into a validated [`ActionConfig`]. Empty
//! inputs count as unset, matching how the Actions runner passes inputs the
//! workflow did not provide.

use crate::cache::DEFAULT_KEY_PREFIX;
use crate::cli::args::RunArgs;
use crate::error::{ActionError, ActionResult};
use std::path::{Path, PathBuf};

/// Validated inputs for the main step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionConfig {
    /// Restore the data directory from cache
    pub cache: bool,
    /// Let the post step save the cache
    pub cache_save: bool,
    /// Prefix for the cache key
    pub cache_key_prefix: String,
    /// mise version without a leading `v`; `None` installs the latest release
    pub version: Option<String>,
    /// Directory configs are written to and mise runs in
    pub working_dir: PathBuf,
    /// Set `MISE_EXPERIMENTAL`
    pub experimental: bool,
    /// Body for `.tool-versions` (empty = don't write)
    pub tool_versions: String,
    /// Body for `.mise.toml` (empty = don't write)
    pub mise_toml: String,
    /// Run `mise install`
    pub install: bool,
}

impl ActionConfig {
    /// Resolve inputs against the caller's working directory
    pub fn from_args(args: &RunArgs, cwd: &Path) -> ActionResult<Self> {
        let working_dir = match non_empty(&args.install_dir) {
            Some(dir) => cwd.join(dir),
            None => cwd.to_path_buf(),
        };

        let version = non_empty(&args.version).map(|v| v.strip_prefix('v').unwrap_or(v).to_string());

        Ok(Self {
            cache: parse_bool("cache", args.cache.as_deref(), true)?,
            cache_save: parse_bool("cache_save", args.cache_save.as_deref(), true)?,
            cache_key_prefix: non_empty(&args.cache_key_prefix)
                .unwrap_or(DEFAULT_KEY_PREFIX)
                .to_string(),
            version,
            working_dir,
            experimental: non_empty(&args.experimental) == Some("true"),
            tool_versions: args.tool_versions.clone().unwrap_or_default(),
            mise_toml: args.mise_toml.clone().unwrap_or_default(),
            install: parse_bool("install", args.install.as_deref(), true)?,
        })
    }

    /// Whether the post step should save the cache
    pub fn save_enabled(&self) -> bool {
        self.cache && self.cache_save
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Parse a boolean input using the YAML 1.2 core schema spellings
pub fn parse_bool(name: &str, value: Option<&str>, default: bool) -> ActionResult<bool> {
    match value.map(str::trim) {
        None | Some("") => Ok(default),
        Some("true" | "True" | "TRUE") => Ok(true),
        Some("false" | "False" | "FALSE") => Ok(false),
        Some(_) => Err(ActionError::InvalidBooleanInput {
            name: name.to_string(),
        }),
    }
}
