//! On-disk configuration for the restart orchestrator and bootstrap.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

/// Fallback wait between the control-plane phase and the fleet phase.
pub const DEFAULT_RESTART_WAIT_SECS: u64 = 5;

#[derive(Debug, Error)]
pub enum ConfigError {
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

  #[error("'{path}' is missing the control-plane endpoint URL")]
  MissingUrl { path: PathBuf },
}

/// Configuration for the `diff` pipeline.
///
/// `RestartWaitSeconds` left unset or set to 0 resolves to
/// [`DEFAULT_RESTART_WAIT_SECS`]; an explicit zero is indistinguishable from
/// unset.
#[derive(Debug, Clone, Deserialize)]
pub struct RestartConfig {
  #[serde(rename = "TurnItOffAndOnAgainUrl")]
  pub url: String,

  #[serde(rename = "RestartWaitSeconds", default)]
  wait_seconds: u64,
}

impl RestartConfig {
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    let data = fs::read_to_string(path).map_err(|source| ConfigError::Read {
      path: path.to_path_buf(),
      source,
    })?;
    let config: Self = serde_json::from_str(&data).map_err(|source| ConfigError::Parse {
      path: path.to_path_buf(),
      source,
    })?;
    if config.url.is_empty() {
      return Err(ConfigError::MissingUrl {
        path: path.to_path_buf(),
      });
    }
    Ok(config)
  }

  /// The settling delay between restart phases.
  pub fn wait(&self) -> Duration {
    if self.wait_seconds == 0 {
      Duration::from_secs(DEFAULT_RESTART_WAIT_SECS)
    } else {
      Duration::from_secs(self.wait_seconds)
    }
  }
}

/// Optional bootstrap configuration naming a secret source.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BootstrapConfig {
  #[serde(rename = "SecretUrl", default)]
  pub secret_url: Option<String>,
}

impl BootstrapConfig {
  /// Load `bootstrap.json`.
  ///
  /// A missing file means "no secret configured" and yields the default.
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    let data = match fs::read_to_string(path) {
      Ok(data) => data,
      Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
      Err(source) => {
        return Err(ConfigError::Read {
          path: path.to_path_buf(),
          source,
        });
      }
    };
    serde_json::from_str(&data).map_err(|source| ConfigError::Parse {
      path: path.to_path_buf(),
      source,
    })
  }

  /// The configured secret source, ignoring an empty string.
  pub fn secret_source(&self) -> Option<&str> {
    self.secret_url.as_deref().filter(|s| !s.is_empty())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::TempDir;

  fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
  }

  #[test]
  fn restart_config_parses_fields() {
    let dir = TempDir::new().unwrap();
    let path = write(
      &dir,
      "config.json",
      r#"{"TurnItOffAndOnAgainUrl": "http://cp:8080", "RestartWaitSeconds": 12}"#,
    );

    let config = RestartConfig::load(&path).unwrap();
    assert_eq!(config.url, "http://cp:8080");
    assert_eq!(config.wait(), Duration::from_secs(12));
  }

  #[test]
  fn missing_wait_defaults_to_five_seconds() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "config.json", r#"{"TurnItOffAndOnAgainUrl": "http://cp"}"#);

    let config = RestartConfig::load(&path).unwrap();
    assert_eq!(config.wait(), Duration::from_secs(5));
  }

  #[test]
  fn explicit_zero_wait_also_defaults() {
    let dir = TempDir::new().unwrap();
    let path = write(
      &dir,
      "config.json",
      r#"{"TurnItOffAndOnAgainUrl": "http://cp", "RestartWaitSeconds": 0}"#,
    );

    let config = RestartConfig::load(&path).unwrap();
    assert_eq!(config.wait(), Duration::from_secs(5));
  }

  #[test]
  fn missing_url_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "config.json", r#"{"RestartWaitSeconds": 3}"#);

    // Serde fills nothing in: the URL field is required.
    let result = RestartConfig::load(&path);
    assert!(result.is_err());
  }

  #[test]
  fn empty_url_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "config.json", r#"{"TurnItOffAndOnAgainUrl": ""}"#);

    let result = RestartConfig::load(&path);
    assert!(matches!(result, Err(ConfigError::MissingUrl { .. })));
  }

  #[test]
  fn bootstrap_missing_file_means_no_secret() {
    let dir = TempDir::new().unwrap();
    let config = BootstrapConfig::load(&dir.path().join("bootstrap.json")).unwrap();
    assert_eq!(config.secret_source(), None);
  }

  #[test]
  fn bootstrap_empty_url_means_no_secret() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "bootstrap.json", r#"{"SecretUrl": ""}"#);
    let config = BootstrapConfig::load(&path).unwrap();
    assert_eq!(config.secret_source(), None);
  }

  #[test]
  fn bootstrap_names_secret_source() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "bootstrap.json", r#"{"SecretUrl": "http://vault/kv/deploy"}"#);
    let config = BootstrapConfig::load(&path).unwrap();
    assert_eq!(config.secret_source(), Some("http://vault/kv/deploy"));
  }

  #[test]
  fn bootstrap_malformed_is_error() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "bootstrap.json", "{");
    assert!(matches!(
      BootstrapConfig::load(&path),
      Err(ConfigError::Parse { .. })
    ));
  }
}
