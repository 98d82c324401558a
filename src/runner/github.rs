//! GitHub Actions runner
//!
//! Speaks the runner's file-command protocol (`GITHUB_ENV`, `GITHUB_PATH`,
//! `GITHUB_OUTPUT`, `GITHUB_STATE`). When a file variable is missing the
//! equivalent `::command::` line is printed to stdout instead.

use super::{EnvMap, Runner};
use crate::error::{ActionError, ActionResult};
use crate::platform::Platform;
use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;
use uuid::Uuid;

/// Runner backed by the GitHub Actions process environment
pub struct GithubRunner {
    env: EnvMap,
    platform: Platform,
}

impl GithubRunner {
    /// Snapshot the current process environment
    pub fn from_env() -> Self {
        Self::new(std::env::vars(), Platform::detect())
    }

    /// Create a runner over an explicit environment
    pub fn new(vars: impl IntoIterator<Item = (String, String)>, platform: Platform) -> Self {
        Self {
            env: EnvMap::new(vars),
            platform,
        }
    }

    fn command_file(&self, kind: &str) -> Option<PathBuf> {
        self.env
            .get(&format!("GITHUB_{kind}"))
            .filter(|p| !p.is_empty())
            .map(PathBuf::from)
    }

    /// Append a raw line to a command file
    fn append(path: &Path, content: &str) -> ActionResult<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|source| ActionError::FileCommand {
                path: path.to_path_buf(),
                source,
            })?;
        file.write_all(content.as_bytes())
            .map_err(|source| ActionError::FileCommand {
                path: path.to_path_buf(),
                source,
            })
    }

    /// Write `name=value` to a command file using the heredoc form, or fall
    /// back to a workflow command
    fn key_value_command(
        &self,
        kind: &str,
        fallback: &str,
        name: &str,
        value: &str,
    ) -> ActionResult<()> {
        match self.command_file(kind) {
            Some(path) => {
                debug!("Writing {} to GITHUB_{}", name, kind);
                Self::append(&path, &prepare_key_value(name, value)?)
            }
            None => {
                println!(
                    "::{} name={}::{}",
                    fallback,
                    escape_property(name),
                    escape_data(value)
                );
                Ok(())
            }
        }
    }
}

impl Runner for GithubRunner {
    fn platform(&self) -> &Platform {
        &self.platform
    }

    fn var(&self, name: &str) -> Option<String> {
        self.env.get(name)
    }

    fn vars(&self) -> &BTreeMap<String, String> {
        self.env.all()
    }

    fn export_variable(&mut self, name: &str, value: &str) -> ActionResult<()> {
        self.env.set(name, value);
        self.key_value_command("ENV", "set-env", name, value)
    }

    fn add_path(&mut self, dir: &str) -> ActionResult<()> {
        let delimiter = self.platform.path_delimiter();
        self.env.prepend_path(dir, delimiter);
        match self.command_file("PATH") {
            Some(path) => Self::append(&path, &format!("{dir}\n")),
            None => {
                println!("::add-path::{}", escape_data(dir));
                Ok(())
            }
        }
    }

    fn set_output(&mut self, name: &str, value: &str) -> ActionResult<()> {
        self.key_value_command("OUTPUT", "set-output", name, value)
    }

    fn save_state(&mut self, name: &str, value: &str) -> ActionResult<()> {
        self.key_value_command("STATE", "save-state", name, value)
    }

    fn state(&self, name: &str) -> Option<String> {
        self.env.get(&format!("STATE_{name}"))
    }

    fn start_group(&mut self, name: &str) {
        println!("::group::{}", escape_data(name));
    }

    fn end_group(&mut self) {
        println!("::endgroup::");
    }
}

/// Format `name=value` as a heredoc block with a random delimiter
fn prepare_key_value(name: &str, value: &str) -> ActionResult<String> {
    let delimiter = format!("ghadelimiter_{}", Uuid::new_v4());
    if name.contains(&delimiter) {
        return Err(ActionError::Internal(format!(
            "Unexpected input: name should not contain the delimiter \"{delimiter}\""
        )));
    }
    if value.contains(&delimiter) {
        return Err(ActionError::Internal(format!(
            "Unexpected input: value should not contain the delimiter \"{delimiter}\""
        )));
    }
    Ok(format!("{name}<<{delimiter}\n{value}\n{delimiter}\n"))
}

/// Escape the message part of a workflow command
pub fn escape_data(s: &str) -> String {
    s.replace('%', "%25").replace('\r', "%0D").replace('\n', "%0A")
}

/// Escape a property value of a workflow command
pub fn escape_property(s: &str) -> String {
    escape_data(s).replace(':', "%3A").replace(',', "%2C")
}

/// Emit an error annotation so the job records the failure
pub fn issue_error(message: &str) {
    println!("::error::{}", escape_data(message));
}
