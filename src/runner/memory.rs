//! In-memory runner that records every side effect

use super::{EnvMap, Runner};
use crate::error::ActionResult;
use crate::platform::Platform;
use std::collections::BTreeMap;

/// Runner that keeps outputs, state and environment in memory
#[derive(Debug, Clone)]
pub struct MemoryRunner {
    env: EnvMap,
    platform: Platform,
    exported: Vec<(String, String)>,
    paths: Vec<String>,
    outputs: BTreeMap<String, String>,
    state: BTreeMap<String, String>,
    groups: Vec<String>,
}

impl MemoryRunner {
    pub fn new(platform: Platform) -> Self {
        Self {
            env: EnvMap::default(),
            platform,
            exported: Vec::new(),
            paths: Vec::new(),
            outputs: BTreeMap::new(),
            state: BTreeMap::new(),
            groups: Vec::new(),
        }
    }

    /// Seed a variable as if the caller had set it
    pub fn with_var(mut self, name: &str, value: &str) -> Self {
        self.env.set(name, value);
        self
    }

    /// Seed state as if a previous step had saved it
    pub fn with_state(mut self, name: &str, value: &str) -> Self {
        self.state.insert(name.to_string(), value.to_string());
        self
    }

    /// Variables exported through the runner, in order
    pub fn exported(&self) -> &[(String, String)] {
        &self.exported
    }

    /// Directories added to PATH, in order
    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    pub fn output(&self, name: &str) -> Option<&str> {
        self.outputs.get(name).map(String::as_str)
    }

    pub fn saved_state(&self) -> &BTreeMap<String, String> {
        &self.state
    }

    /// Names of the log groups opened so far
    pub fn groups(&self) -> &[String] {
        &self.groups
    }
}

impl Runner for MemoryRunner {
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
        self.exported.push((name.to_string(), value.to_string()));
        Ok(())
    }

    fn add_path(&mut self, dir: &str) -> ActionResult<()> {
        let delimiter = self.platform.path_delimiter();
        self.env.prepend_path(dir, delimiter);
        self.paths.push(dir.to_string());
        Ok(())
    }

    fn set_output(&mut self, name: &str, value: &str) -> ActionResult<()> {
        self.outputs.insert(name.to_string(), value.to_string());
        Ok(())
    }

    fn save_state(&mut self, name: &str, value: &str) -> ActionResult<()> {
        self.state.insert(name.to_string(), value.to_string());
        Ok(())
    }

    fn state(&self, name: &str) -> Option<String> {
        self.state.get(name).cloned()
    }

    fn start_group(&mut self, name: &str) {
        self.groups.push(name.to_string());
    }

    fn end_group(&mut self) {}
}
