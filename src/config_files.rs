//! Writing mise configuration files from action inputs

use crate::config::ActionConfig;
use crate::error::{ActionError, ActionResult};
use std::path::PathBuf;
use tokio::fs;
use tracing::info;

/// Legacy tool-versions file name
pub const TOOL_VERSIONS_FILE: &str = ".tool-versions";

/// mise TOML config file name
pub const MISE_TOML_FILE: &str = ".mise.toml";

/// Write `.tool-versions` and/or `.mise.toml` into the working directory.
///
/// Each file is written verbatim, replacing any existing file, only when its
/// input is non-empty. Returns the paths written.
pub async fn write_config_files(config: &ActionConfig) -> ActionResult<Vec<PathBuf>> {
    let files = [
        (TOOL_VERSIONS_FILE, &config.tool_versions),
        (MISE_TOML_FILE, &config.mise_toml),
    ];

    let mut written = Vec::new();
    for (name, body) in files {
        if body.is_empty() {
            continue;
        }
        let path = config.working_dir.join(name);
        info!("Writing {}", path.display());
        fs::write(&path, body.as_bytes())
            .await
            .map_err(|e| ActionError::io(format!("writing {}", path.display()), e))?;
        written.push(path);
    }
    Ok(written)
}
