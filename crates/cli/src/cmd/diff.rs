//! Implementation of the `stagehand diff` command.
//!
//! Compares the previous build tree against the current one, then drives the
//! restart orchestrator for every changed service. With `--dry-run` the
//! changed set is printed and nothing is contacted.

use std::path::Path;

use anyhow::{Context, Result};

use stagehand_core::changes::{ChangeDetection, detect_changes};
use stagehand_core::config::RestartConfig;
use stagehand_core::restart::{HttpNotifier, restart_services};

use crate::cmd::{BUILD_DIR, PREV_BUILD_DIR};
use crate::output::{print_info, print_item, print_success};

pub fn cmd_diff(config: &Path, dry_run: bool) -> Result<()> {
  let detection = detect_changes(Path::new(PREV_BUILD_DIR), Path::new(BUILD_DIR))
    .context("Failed to compare build trees")?;

  let changed = match detection {
    ChangeDetection::NoPriorBuild => {
      print_info("No comparable previous build; nothing to restart");
      return Ok(());
    }
    ChangeDetection::Changed(changed) => changed,
  };

  if changed.is_empty() {
    print_success("No services changed");
    return Ok(());
  }

  print_info(&format!("{} service(s) changed:", changed.len()));
  for service in &changed {
    print_item(service);
  }

  if dry_run {
    print_info("Dry run; no restarts issued");
    return Ok(());
  }

  let restart_config = RestartConfig::load(config)
    .with_context(|| format!("Failed to load restart config '{}'", config.display()))?;
  let notifier = HttpNotifier::new(&restart_config.url);

  let plan = restart_services(&changed, &notifier, restart_config.wait())
    .context("Restart sequence aborted")?;

  print_success(&format!(
    "Restarted {} service(s)",
    plan.fleet.len() + usize::from(plan.control_plane)
  ));

  Ok(())
}
