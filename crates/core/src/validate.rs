//! Syntax validation for generated configuration files.
//!
//! Rendered templates can produce syntactically broken JSON or YAML even
//! when the template itself parsed (a conditional block swallowing a comma
//! is the classic case). Every rendered `.json`/`.yaml`/`.yml` file is
//! checked immediately after it is written, so the break surfaces here and
//! not in whatever consumes the file downstream.

use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidateError {
  #[error("invalid JSON in '{path}': {source}")]
  Json {
    path: PathBuf,
    #[source]
    source: serde_json::Error,
  },

  #[error("invalid YAML in '{path}': {source}")]
  Yaml {
    path: PathBuf,
    #[source]
    source: serde_yaml::Error,
  },
}

/// Check that `bytes` parse as JSON.
pub fn validate_json(path: &Path, bytes: &[u8]) -> Result<(), ValidateError> {
  serde_json::from_slice::<serde_json::Value>(bytes)
    .map(|_| ())
    .map_err(|source| ValidateError::Json {
      path: path.to_path_buf(),
      source,
    })
}

/// Check that `bytes` parse as YAML.
pub fn validate_yaml(path: &Path, bytes: &[u8]) -> Result<(), ValidateError> {
  serde_yaml::from_slice::<serde_yaml::Value>(bytes)
    .map(|_| ())
    .map_err(|source| ValidateError::Yaml {
      path: path.to_path_buf(),
      source,
    })
}

/// Validate a rendered output file by extension.
///
/// Files that are neither JSON nor YAML pass unchecked.
pub fn validate_rendered(path: &Path, bytes: &[u8]) -> Result<(), ValidateError> {
  match path.extension().and_then(|e| e.to_str()) {
    Some("json") => validate_json(path, bytes),
    Some("yaml") | Some("yml") => validate_yaml(path, bytes),
    _ => Ok(()),
  }
}
