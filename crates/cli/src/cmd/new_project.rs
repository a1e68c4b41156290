//! Implementation of the `stagehand new-project` command.

use std::path::Path;

use anyhow::{Context, Result, bail};

use stagehand_core::projects::{add_project, scaffold_project_dir};
use stagehand_core::values::ValueSet;

use crate::cmd::{PROJECTS_FILE, SOURCE_DIR, VALUES_FILE};
use crate::output::{print_info, print_success};

/// Register a project in `projects.json` and scaffold its source directory.
pub fn cmd_new_project(name: &str, no_env: bool) -> Result<()> {
  let added = add_project(Path::new(PROJECTS_FILE), name)
    .with_context(|| format!("Failed to register project '{name}'"))?;

  if !added {
    print_info(&format!("Project '{name}' is already registered"));
    return Ok(());
  }

  // The scaffold lands under the org directory named in the base values.
  let values = ValueSet::load(Path::new(VALUES_FILE)).context("Failed to load base values")?;
  let Some(org) = values.get_str("OrgName") else {
    bail!("{VALUES_FILE} has no string 'OrgName' entry; cannot scaffold the project directory");
  };

  let project_dir = scaffold_project_dir(Path::new(SOURCE_DIR), org, name, !no_env)
    .with_context(|| format!("Failed to scaffold source directory for '{name}'"))?;

  print_success(&format!(
    "Registered project '{name}' ({})",
    project_dir.display()
  ));

  Ok(())
}
