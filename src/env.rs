//! Environment bootstrap and export
//!
//! Before mise runs, a few variables make it non-interactive and trust the
//! project config. After it runs, the environment mise computes for the
//! project is copied into the job.

use crate::config::ActionConfig;
use crate::error::{ActionError, ActionResult};
use crate::mise::ToolOutput;
use crate::runner::Runner;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Set pre-install variables that the caller has not set already.
///
/// Returns the names that were set.
pub fn bootstrap_env(runner: &mut dyn Runner, config: &ActionConfig) -> ActionResult<Vec<String>> {
    let mut defaults = vec![
        (
            "MISE_TRUSTED_CONFIG_PATHS",
            config.working_dir.to_string_lossy().into_owned(),
        ),
        ("MISE_YES", "1".to_string()),
    ];
    if config.experimental {
        defaults.push(("MISE_EXPERIMENTAL", "1".to_string()));
    }

    let mut set = Vec::new();
    for (name, value) in defaults {
        if runner.var(name).is_some_and(|v| !v.is_empty()) {
            debug!("{} already set, leaving it alone", name);
            continue;
        }
        info!("Setting {}={}", name, value);
        runner.export_variable(name, &value)?;
        set.push(name.to_string());
    }
    Ok(set)
}

/// Parse `mise env --json` output into a name/value map
pub fn parse_env_dump(stdout: &str) -> ActionResult<BTreeMap<String, String>> {
    let value: serde_json::Value = serde_json::from_str(stdout)?;
    let object = value
        .as_object()
        .ok_or_else(|| ActionError::EnvDump("expected a JSON object".to_string()))?;

    object
        .iter()
        .map(|(name, value)| match value {
            serde_json::Value::String(s) => Ok((name.clone(), s.clone())),
            other => Err(ActionError::EnvDump(format!(
                "value for {name} is not a string: {other}"
            ))),
        })
        .collect()
}

/// Apply the environment dump to the job.
///
/// Nothing is applied unless the command succeeded and its output parsed.
/// `PATH` is split and each entry added on its own, so entries from earlier
/// steps stay in place; the first entry of the dump ends up first.
pub fn export_env(runner: &mut dyn Runner, output: &ToolOutput) -> ActionResult<()> {
    if !output.success() {
        return Err(ActionError::command_exit(
            "mise env --json",
            output.code,
            output.stderr.trim_end(),
        ));
    }
    let vars = parse_env_dump(&output.stdout)?;

    let delimiter = runner.platform().path_delimiter();
    for (name, value) in &vars {
        if name == "PATH" {
            let entries: Vec<&str> = value.split(delimiter).filter(|p| !p.is_empty()).collect();
            for entry in entries.into_iter().rev() {
                runner.add_path(entry)?;
            }
        } else {
            debug!("Exporting {}", name);
            runner.export_variable(name, value)?;
        }
    }
    info!("Exported {} variables from mise", vars.len());
    Ok(())
}
