//! Subcommand implementations.
//!
//! Every command runs against the conventional file layout in the current
//! working directory: `values.json`, `ports.json`, `projects.json`,
//! `bootstrap.json`, `config.json`, the `source/` template tree and the
//! `build/` / `prev-build/` output trees.

use std::path::Path;

use anyhow::{Context, Result};

use stagehand_core::config::BootstrapConfig;
use stagehand_core::values::{self, ValueSet};

mod diff;
mod link;
mod new_project;
mod template;
mod validate;

pub use diff::cmd_diff;
pub use link::cmd_link;
pub use new_project::cmd_new_project;
pub use template::cmd_template;
pub use validate::cmd_validate;

pub const VALUES_FILE: &str = "values.json";
pub const PORTS_FILE: &str = "ports.json";
pub const PROJECTS_FILE: &str = "projects.json";
pub const BOOTSTRAP_FILE: &str = "bootstrap.json";
pub const SOURCE_DIR: &str = "source";
pub const BUILD_DIR: &str = "build";
pub const PREV_BUILD_DIR: &str = "prev-build";

/// Resolve the full layered value set for a render or link run.
fn resolve_values() -> Result<ValueSet> {
  let bootstrap =
    BootstrapConfig::load(Path::new(BOOTSTRAP_FILE)).context("Failed to load bootstrap config")?;

  values::resolve(
    Path::new(VALUES_FILE),
    Path::new(PORTS_FILE),
    Path::new(PROJECTS_FILE),
    bootstrap.secret_source(),
  )
  .context("Failed to resolve configuration values")
}
