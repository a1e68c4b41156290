//! Change detection between the previous and the current build tree.
//!
//! The comparison itself is delegated to `diff -qr`, which reports one line
//! per differing file. Service names are recovered from the reported paths:
//! builds are laid out `<root>/<org>/<service>/...`, so the second component
//! of the path relative to the build root names the service. Files added or
//! removed wholesale show up as "Only in" lines and are deliberately not
//! counted; a brand-new service has nothing running to restart and a removed
//! one has nothing left to restart.

use std::collections::BTreeSet;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DiffError {
  #[error("failed to run the comparison tool: {0}")]
  Spawn(#[from] io::Error),

  #[error("comparison tool failed (exit {code:?}): {stderr}")]
  Tool { code: Option<i32>, stderr: String },

  #[error("failed to inspect build tree '{path}': {source}")]
  ReadDir {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
}

/// Outcome of comparing the current build against the previous one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeDetection {
  /// No previous build exists, so there is nothing to compare against.
  NoPriorBuild,
  /// Services whose rendered files differ, sorted and deduplicated.
  Changed(BTreeSet<String>),
}

/// Compare two build trees and name the services that changed.
///
/// `diff` exits 1 when trees differ, which is the normal case here; anything
/// above 1 means the tool itself failed.
pub fn detect_changes(prev_root: &Path, curr_root: &Path) -> Result<ChangeDetection, DiffError> {
  if !is_populated(prev_root)? || !is_populated(curr_root)? {
    return Ok(ChangeDetection::NoPriorBuild);
  }

  let output = Command::new("diff")
    .arg("-qr")
    .arg(prev_root)
    .arg(curr_root)
    .output()?;

  match output.status.code() {
    Some(0) | Some(1) => {}
    code => {
      return Err(DiffError::Tool {
        code,
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
      });
    }
  }

  let stdout = String::from_utf8_lossy(&output.stdout);
  Ok(ChangeDetection::Changed(parse_changed_services(
    &stdout, prev_root,
  )))
}

/// A build tree counts as comparable only when it exists and holds at least
/// one entry.
fn is_populated(root: &Path) -> Result<bool, DiffError> {
  if !root.is_dir() {
    return Ok(false);
  }
  let mut entries = root.read_dir().map_err(|source| DiffError::ReadDir {
    path: root.to_path_buf(),
    source,
  })?;
  Ok(entries.next().is_some())
}

/// Extract service names from `diff -qr` output.
///
/// Only "Files A and B differ" lines contribute; the path is taken from the
/// first operand and resolved against `prev_root`. Lines whose path is too
/// shallow to carry an org and a service are ignored.
pub fn parse_changed_services(diff_output: &str, prev_root: &Path) -> BTreeSet<String> {
  let mut services = BTreeSet::new();

  for line in diff_output.lines() {
    let Some(rest) = line.strip_prefix("Files ") else {
      continue;
    };
    let Some(rest) = rest.strip_suffix(" differ") else {
      continue;
    };
    let Some((prev_path, _curr_path)) = rest.split_once(" and ") else {
      continue;
    };

    let Ok(rel) = Path::new(prev_path).strip_prefix(prev_root) else {
      continue;
    };
    let mut components = rel.components().map(|c| c.as_os_str().to_string_lossy());
    let _org = components.next();
    let Some(service) = components.next() else {
      continue;
    };
    // A two-component path is <org>/<file>, not a service directory.
    if components.next().is_none() {
      continue;
    }
    services.insert(service.into_owned());
  }

  services
}
