//! Project registry.
//!
//! `projects.json` holds one entry per deployable unit. The renderer consumes
//! the entries read-only as generic mappings under `ValueSet["Projects"]`;
//! the `new-project` command appends entries with default capability flags.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::values::{ValueMap, ValuesError};

/// One deployable unit in the registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectEntry {
  pub name: String,

  #[serde(rename = "allowDeploy", default)]
  pub allow_deploy: bool,

  #[serde(rename = "isContainerProject", default)]
  pub is_container_project: bool,

  #[serde(rename = "useWithChat", default)]
  pub use_with_chat: bool,

  #[serde(rename = "useWithIssues", default)]
  pub use_with_issues: bool,

  #[serde(rename = "buildCommands", default, skip_serializing_if = "Vec::is_empty")]
  pub build_commands: Vec<String>,

  #[serde(rename = "upCommands", default, skip_serializing_if = "Vec::is_empty")]
  pub up_commands: Vec<String>,

  #[serde(rename = "downCommands", default, skip_serializing_if = "Vec::is_empty")]
  pub down_commands: Vec<String>,
}

impl ProjectEntry {
  /// A freshly onboarded project: all capabilities on, no custom commands.
  pub fn with_defaults(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      allow_deploy: true,
      is_container_project: true,
      use_with_chat: true,
      use_with_issues: true,
      build_commands: Vec::new(),
      up_commands: Vec::new(),
      down_commands: Vec::new(),
    }
  }
}

/// Load the project list for template rendering.
///
/// The file is required. Every entry must carry a non-empty, unique `name`;
/// entries are returned as generic mappings so templates can iterate over
/// whatever fields the registry holds.
pub fn load_projects(path: &Path) -> Result<Vec<ValueMap>, ValuesError> {
  let data = fs::read_to_string(path).map_err(|source| ValuesError::Read {
    path: path.to_path_buf(),
    source,
  })?;
  parse_projects(&data, path)
}

fn parse_projects(data: &str, path: &Path) -> Result<Vec<ValueMap>, ValuesError> {
  let value: Value = serde_json::from_str(data).map_err(|source| ValuesError::Parse {
    path: path.to_path_buf(),
    source,
  })?;
  let Value::Array(items) = value else {
    return Err(ValuesError::NotAnArray {
      path: path.to_path_buf(),
    });
  };

  let mut seen = std::collections::HashSet::new();
  let mut entries = Vec::with_capacity(items.len());
  for (index, item) in items.into_iter().enumerate() {
    let Value::Object(map) = item else {
      return Err(ValuesError::UnnamedProject {
        index,
        path: path.to_path_buf(),
      });
    };
    let name = map.get("name").and_then(Value::as_str).unwrap_or_default();
    if name.is_empty() {
      return Err(ValuesError::UnnamedProject {
        index,
        path: path.to_path_buf(),
      });
    }
    if !seen.insert(name.to_string()) {
      return Err(ValuesError::DuplicateProject {
        name: name.to_string(),
        path: path.to_path_buf(),
      });
    }
    entries.push(map);
  }

  Ok(entries)
}

/// Add a project to the registry file, creating the file if absent.
///
/// Idempotent: returns `Ok(false)` without touching the file when the name is
/// already registered. Entries are kept sorted by name and the written file
/// is re-validated before returning.
pub fn add_project(path: &Path, name: &str) -> Result<bool, ValuesError> {
  let mut entries: Vec<ProjectEntry> = match fs::read_to_string(path) {
    Ok(data) => serde_json::from_str(&data).map_err(|source| ValuesError::Parse {
      path: path.to_path_buf(),
      source,
    })?,
    Err(e) if e.kind() == io::ErrorKind::NotFound => Vec::new(),
    Err(source) => {
      return Err(ValuesError::Read {
        path: path.to_path_buf(),
        source,
      });
    }
  };

  if entries.iter().any(|p| p.name == name) {
    tracing::info!(name, "project already registered");
    return Ok(false);
  }

  entries.push(ProjectEntry::with_defaults(name));
  entries.sort_by(|a, b| a.name.cmp(&b.name));

  let mut output = serde_json::to_string_pretty(&entries).map_err(|source| ValuesError::Parse {
    path: path.to_path_buf(),
    source,
  })?;
  output.push('\n');
  fs::write(path, &output).map_err(|source| ValuesError::Write {
    path: path.to_path_buf(),
    source,
  })?;

  // The registry feeds the renderer, so make sure what we wrote loads back.
  parse_projects(&output, path)?;

  Ok(true)
}

/// Create `source/<org>/<name>/`, with an empty `.env.tmpl` when `with_env`
/// is set, idempotently.
///
/// Returns the project directory. Existing directories and env files are
/// left untouched.
pub fn scaffold_project_dir(
  source_root: &Path,
  org: &str,
  name: &str,
  with_env: bool,
) -> Result<PathBuf, ValuesError> {
  let project_dir = source_root.join(org).join(name);
  fs::create_dir_all(&project_dir).map_err(|source| ValuesError::Write {
    path: project_dir.clone(),
    source,
  })?;

  if !with_env {
    return Ok(project_dir);
  }

  let env_file = project_dir.join(".env.tmpl");
  if !env_file.exists() {
    fs::write(&env_file, "").map_err(|source| ValuesError::Write {
      path: env_file.clone(),
      source,
    })?;
    tracing::info!(path = %env_file.display(), "created empty env template");
  }

  Ok(project_dir)
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::TempDir;

  #[test]
  fn load_projects_exposes_generic_mappings() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("projects.json");
    fs::write(
      &path,
      r#"[{"name": "api", "allowDeploy": true, "extraField": 42}]"#,
    )
    .unwrap();

    let entries = load_projects(&path).unwrap();
    assert_eq!(entries.len(), 1);
    // Unknown fields survive, templates see the raw mapping.
    assert_eq!(entries[0]["extraField"], serde_json::json!(42));
  }

  #[test]
  fn load_projects_requires_file() {
    let dir = TempDir::new().unwrap();
    let result = load_projects(&dir.path().join("projects.json"));
    assert!(matches!(result, Err(ValuesError::Read { .. })));
  }

  #[test]
  fn load_projects_rejects_empty_name() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("projects.json");
    fs::write(&path, r#"[{"name": ""}]"#).unwrap();

    let result = load_projects(&path);
    assert!(matches!(result, Err(ValuesError::UnnamedProject { index: 0, .. })));
  }

  #[test]
  fn load_projects_rejects_duplicate_names() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("projects.json");
    fs::write(&path, r#"[{"name": "api"}, {"name": "api"}]"#).unwrap();

    let result = load_projects(&path);
    assert!(matches!(result, Err(ValuesError::DuplicateProject { .. })));
  }

  #[test]
  fn add_project_creates_file_and_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("projects.json");

    assert!(add_project(&path, "api").unwrap());
    assert!(!add_project(&path, "api").unwrap());

    let entries = load_projects(&path).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["name"], serde_json::json!("api"));
    assert_eq!(entries[0]["allowDeploy"], serde_json::json!(true));
  }

  #[test]
  fn add_project_keeps_entries_sorted() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("projects.json");

    add_project(&path, "zeta").unwrap();
    add_project(&path, "alpha").unwrap();
    add_project(&path, "mid").unwrap();

    let entries = load_projects(&path).unwrap();
    let names: Vec<_> = entries.iter().map(|e| e["name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["alpha", "mid", "zeta"]);
  }

  #[test]
  fn scaffold_creates_dir_and_env_once() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("source");

    let project_dir = scaffold_project_dir(&source, "acme", "api", true).unwrap();
    assert!(project_dir.join(".env.tmpl").exists());

    // Pre-existing env content survives a re-run.
    fs::write(project_dir.join(".env.tmpl"), "KEY={{.Key}}").unwrap();
    scaffold_project_dir(&source, "acme", "api", true).unwrap();
    let content = fs::read_to_string(project_dir.join(".env.tmpl")).unwrap();
    assert_eq!(content, "KEY={{.Key}}");
  }

  #[test]
  fn scaffold_can_skip_the_env_template() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("source");

    let project_dir = scaffold_project_dir(&source, "acme", "api", false).unwrap();
    assert!(project_dir.is_dir());
    assert!(!project_dir.join(".env.tmpl").exists());
  }
}
