//! Implementation of the `stagehand validate` command.
//!
//! Checks every configuration file the pipeline reads, reporting each one
//! individually and exiting non-zero when any fails. Optional files that are
//! absent count as fine.

use std::path::Path;

use anyhow::{Result, bail};

use stagehand_core::config::RestartConfig;
use stagehand_core::projects::load_projects;
use stagehand_core::values::ValueSet;

use crate::cmd::{PORTS_FILE, PROJECTS_FILE, VALUES_FILE};
use crate::output::{print_error, print_info, print_success};

const RESTART_CONFIG_FILE: &str = "config.json";

pub fn cmd_validate() -> Result<()> {
  let mut failures = 0;

  let mut check = |file: &str, result: Result<(), String>| match result {
    Ok(()) => print_success(&format!("{file} is valid")),
    Err(message) => {
      print_error(&format!("{file}: {message}"));
      failures += 1;
    }
  };

  check(
    VALUES_FILE,
    ValueSet::load(Path::new(VALUES_FILE))
      .map(|_| ())
      .map_err(|e| e.to_string()),
  );

  if Path::new(PORTS_FILE).exists() {
    check(
      PORTS_FILE,
      ValueSet::load(Path::new(PORTS_FILE))
        .map(|_| ())
        .map_err(|e| e.to_string()),
    );
  } else {
    print_info(&format!("{PORTS_FILE} absent (optional)"));
  }

  check(
    PROJECTS_FILE,
    load_projects(Path::new(PROJECTS_FILE))
      .map(|_| ())
      .map_err(|e| e.to_string()),
  );

  if Path::new(RESTART_CONFIG_FILE).exists() {
    check(
      RESTART_CONFIG_FILE,
      RestartConfig::load(Path::new(RESTART_CONFIG_FILE))
        .map(|_| ())
        .map_err(|e| e.to_string()),
    );
  } else {
    print_info(&format!("{RESTART_CONFIG_FILE} absent (optional)"));
  }

  if failures > 0 {
    bail!("{failures} configuration file(s) failed validation");
  }

  Ok(())
}
