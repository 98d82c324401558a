//! mise-action - install mise in CI
//!
//! Installs the mise CLI, restores and saves a cache of its data directory,
//! and exports the environment mise computes for the project.

pub mod cache;
pub mod cli;
pub mod config;
pub mod config_files;
pub mod env;
pub mod error;
pub mod install;
pub mod mise;
pub mod pipeline;
pub mod platform;
pub mod runner;

pub use error::{ActionError, ActionResult};
