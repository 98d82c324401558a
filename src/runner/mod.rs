//! CI runner context
//!
//! Every side effect that outlives a pipeline stage (exported variables,
//! PATH entries, step outputs, saved state) goes through a [`Runner`], which
//! is passed explicitly to each stage. Stages never touch the process
//! environment directly, so the whole pipeline can run against a
//! [`MemoryRunner`] in tests.

mod github;
mod memory;

pub use github::{escape_data, escape_property, issue_error, GithubRunner};
pub use memory::MemoryRunner;

use crate::error::ActionResult;
use crate::platform::Platform;
use std::collections::BTreeMap;

/// Side-effecting context shared by all pipeline stages
pub trait Runner: Send {
    /// Platform the run targets
    fn platform(&self) -> &Platform;

    /// Look up a variable in the effective environment
    fn var(&self, name: &str) -> Option<String>;

    /// Effective environment, as handed to subprocesses
    fn vars(&self) -> &BTreeMap<String, String>;

    /// Set a variable for this process and all later steps of the job
    fn export_variable(&mut self, name: &str, value: &str) -> ActionResult<()>;

    /// Prepend a directory to PATH for this process and later steps
    fn add_path(&mut self, dir: &str) -> ActionResult<()>;

    /// Set a step output
    fn set_output(&mut self, name: &str, value: &str) -> ActionResult<()>;

    /// Persist a value for the post step
    fn save_state(&mut self, name: &str, value: &str) -> ActionResult<()>;

    /// Read a value saved by the main step
    fn state(&self, name: &str) -> Option<String>;

    /// Begin a collapsible log group
    fn start_group(&mut self, name: &str);

    /// End the current log group
    fn end_group(&mut self);
}

/// Environment snapshot with PATH-aware updates
#[derive(Debug, Clone, Default)]
pub(crate) struct EnvMap {
    vars: BTreeMap<String, String>,
}

impl EnvMap {
    pub(crate) fn new(vars: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            vars: vars.into_iter().collect(),
        }
    }

    pub(crate) fn get(&self, name: &str) -> Option<String> {
        self.vars.get(name).cloned()
    }

    pub(crate) fn all(&self) -> &BTreeMap<String, String> {
        &self.vars
    }

    pub(crate) fn set(&mut self, name: &str, value: &str) {
        self.vars.insert(name.to_string(), value.to_string());
    }

    /// Put `dir` at the front of PATH, dropping any other occurrence of it
    pub(crate) fn prepend_path(&mut self, dir: &str, delimiter: char) {
        let current = self.vars.get("PATH").cloned().unwrap_or_default();
        let mut entries: Vec<&str> = current
            .split(delimiter)
            .filter(|entry| !entry.is_empty() && *entry != dir)
            .collect();
        entries.insert(0, dir);
        let joined = entries.join(&delimiter.to_string());
        self.vars.insert("PATH".to_string(), joined);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prepend_path_to_empty() {
        let mut env = EnvMap::default();
        env.prepend_path("/a", ':');
        assert_eq!(env.get("PATH").as_deref(), Some("/a"));
    }

    #[test]
    fn prepend_path_moves_duplicate_to_front() {
        let mut env = EnvMap::new([("PATH".to_string(), "/usr/bin:/a:/bin".to_string())]);
        env.prepend_path("/a", ':');
        assert_eq!(env.get("PATH").as_deref(), Some("/a:/usr/bin:/bin"));
    }

    #[test]
    fn prepend_path_windows_delimiter() {
        let mut env = EnvMap::new([("PATH".to_string(), r"C:\Windows".to_string())]);
        env.prepend_path(r"C:\mise\bin", ';');
        assert_eq!(env.get("PATH").as_deref(), Some(r"C:\mise\bin;C:\Windows"));
    }
}
