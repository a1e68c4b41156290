//! Implementation of the `stagehand template` command.

use std::path::Path;

use anyhow::{Context, Result};

use stagehand_core::template::render_tree;

use crate::cmd::{SOURCE_DIR, resolve_values};
use crate::output::print_success;

/// Render the `source/` tree into the build directory.
///
/// Resolves the layered value set first, so a broken values file fails
/// before anything is written.
pub fn cmd_template(build_dir: &Path) -> Result<()> {
  let values = resolve_values()?;

  let outputs = render_tree(Path::new(SOURCE_DIR), build_dir, &values)
    .context("Failed to render template tree")?;

  print_success(&format!(
    "Rendered {} file(s) into {}",
    outputs.len(),
    build_dir.display()
  ));

  Ok(())
}
