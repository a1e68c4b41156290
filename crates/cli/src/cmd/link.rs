//! Implementation of the `stagehand link` command.

use std::path::Path;

use anyhow::{Context, Result};

use stagehand_core::link;

use crate::cmd::resolve_values;
use crate::output::print_success;

/// Publish the build directory under the configured base via symlinks.
pub fn cmd_link(build_dir: &Path) -> Result<()> {
  let values = resolve_values()?;
  let base = link::base_dir(&values).context("Failed to determine deployment base directory")?;

  let linked = link::deploy(build_dir, &base)
    .with_context(|| format!("Failed to link {} into {}", build_dir.display(), base.display()))?;

  print_success(&format!(
    "Linked {} file(s) into {}",
    linked.len(),
    base.display()
  ));

  Ok(())
}
