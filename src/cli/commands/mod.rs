//! CLI command implementations

pub mod post;
pub mod run;

pub use post::execute as post;
pub use run::execute as run;
