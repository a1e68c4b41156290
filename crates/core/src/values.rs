//! Layered configuration values.
//!
//! A [`ValueSet`] is a flat mapping from string keys to JSON-style values,
//! built by merging sources low to high precedence:
//!
//! 1. base values (`values.json`, required)
//! 2. ports overlay (`ports.json`, optional)
//! 3. project list, injected under the key `Projects`
//! 4. secret-store overlay, when the bootstrap configuration names one
//!
//! The merge is shallow: later layers overwrite earlier ones key-by-key and
//! never descend into nested mappings.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use thiserror::Error;

use crate::projects;

/// The key under which the project list is exposed to templates.
pub const PROJECTS_KEY: &str = "Projects";

/// A flat string-keyed JSON object.
pub type ValueMap = Map<String, Value>;

/// Errors produced while loading or merging configuration values.
#[derive(Debug, Error)]
pub enum ValuesError {
  #[error("failed to read '{path}': {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("invalid JSON in '{path}': {source}")]
  Parse {
    path: PathBuf,
    #[source]
    source: serde_json::Error,
  },

  #[error("'{path}' must contain a JSON object at the top level")]
  NotAnObject { path: PathBuf },

  #[error("'{path}' must contain a JSON array of project entries")]
  NotAnArray { path: PathBuf },

  #[error("project entry {index} in '{path}' has an empty or missing name")]
  UnnamedProject { index: usize, path: PathBuf },

  #[error("duplicate project name '{name}' in '{path}'")]
  DuplicateProject { name: String, path: PathBuf },

  #[error("failed to write '{path}': {source}")]
  Write {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error(transparent)]
  SecretStore(#[from] stagehand_secrets::SecretStoreError),
}

/// Merged key-value configuration used to drive rendering.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValueSet {
  entries: ValueMap,
}

impl ValueSet {
  /// Create an empty value set.
  pub fn new() -> Self {
    Self::default()
  }

  /// Wrap an existing map.
  pub fn from_map(entries: ValueMap) -> Self {
    Self { entries }
  }

  /// Load a required values file.
  ///
  /// A missing file, malformed JSON, or a non-object top level is an error.
  pub fn load(path: &Path) -> Result<Self, ValuesError> {
    let data = fs::read_to_string(path).map_err(|source| ValuesError::Read {
      path: path.to_path_buf(),
      source,
    })?;
    Self::parse(&data, path)
  }

  /// Load an optional values file.
  ///
  /// A missing file yields an empty overlay; any other failure is an error.
  pub fn load_optional(path: &Path) -> Result<Self, ValuesError> {
    match fs::read_to_string(path) {
      Ok(data) => Self::parse(&data, path),
      Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Self::new()),
      Err(source) => Err(ValuesError::Read {
        path: path.to_path_buf(),
        source,
      }),
    }
  }

  fn parse(data: &str, path: &Path) -> Result<Self, ValuesError> {
    let value: Value = serde_json::from_str(data).map_err(|source| ValuesError::Parse {
      path: path.to_path_buf(),
      source,
    })?;
    match value {
      Value::Object(entries) => Ok(Self { entries }),
      _ => Err(ValuesError::NotAnObject {
        path: path.to_path_buf(),
      }),
    }
  }

  /// Look up a value by key.
  pub fn get(&self, key: &str) -> Option<&Value> {
    self.entries.get(key)
  }

  /// Look up a string-typed value by key.
  ///
  /// Returns `None` when the key is absent or holds a non-string value.
  pub fn get_str(&self, key: &str) -> Option<&str> {
    self.entries.get(key).and_then(Value::as_str)
  }

  /// Insert or overwrite a single key.
  pub fn insert(&mut self, key: impl Into<String>, value: Value) {
    self.entries.insert(key.into(), value);
  }

  /// Merge an overlay into this set.
  ///
  /// Shallow: every key of the overlay overwrites the existing entry wholesale,
  /// keys absent from the overlay are untouched.
  pub fn merge(&mut self, overlay: ValueSet) {
    for (key, value) in overlay.entries {
      self.entries.insert(key, value);
    }
  }

  /// Iterate over all entries.
  pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
    self.entries.iter()
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  /// Borrow the underlying map.
  pub fn as_map(&self) -> &ValueMap {
    &self.entries
  }

  /// Convert into a JSON value suitable as a template root context.
  pub fn to_value(&self) -> Value {
    Value::Object(self.entries.clone())
  }
}

/// Resolve the full value set for a render run.
///
/// Layers, low to high precedence: base values, ports overlay, project list
/// under [`PROJECTS_KEY`], secret-store overrides. `secret_source` is the
/// secret identifier from the bootstrap configuration; `None` means no secret
/// is configured and is not an error, while a configured source that cannot
/// be reached is.
pub fn resolve(
  base: &Path,
  ports: &Path,
  projects_path: &Path,
  secret_source: Option<&str>,
) -> Result<ValueSet, ValuesError> {
  let mut values = ValueSet::load(base)?;

  let ports_overlay = ValueSet::load_optional(ports)?;
  if !ports_overlay.is_empty() {
    tracing::debug!(count = ports_overlay.len(), "merging ports overlay");
  }
  values.merge(ports_overlay);

  let entries = projects::load_projects(projects_path)?;
  values.insert(
    PROJECTS_KEY,
    Value::Array(entries.into_iter().map(Value::Object).collect()),
  );

  if let Some(source) = secret_source {
    let overrides = stagehand_secrets::fetch_overrides(source)?;
    tracing::info!(count = overrides.len(), "loaded secret-store overrides");
    values.merge(ValueSet::from_map(overrides));
  }

  Ok(values)
}
