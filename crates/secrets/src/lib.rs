//! Secret-store client.
//!
//! Secrets live in an external key-value store reached over HTTP; a single
//! GET against the configured source returns a flat JSON object whose
//! entries override the on-disk values. Values never touch the filesystem,
//! and the keys that arrived are logged without their contents.

use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SecretStoreError {
  #[error("failed to reach secret store at '{url}': {source}")]
  Transport {
    url: String,
    #[source]
    source: reqwest::Error,
  },

  #[error("secret store at '{url}' answered with status {status}")]
  Status { url: String, status: u16 },

  #[error("secret store at '{url}' returned malformed JSON: {source}")]
  Decode {
    url: String,
    #[source]
    source: reqwest::Error,
  },

  #[error("secret store at '{url}' did not return a JSON object")]
  NotAnObject { url: String },
}

/// Fetch the override map from the secret store at `source`.
///
/// An empty source is treated as "no store configured" and yields an empty
/// map. Everything else must answer 2xx with a JSON object.
pub fn fetch_overrides(source: &str) -> Result<Map<String, Value>, SecretStoreError> {
  if source.is_empty() {
    return Ok(Map::new());
  }

  let response = reqwest::blocking::get(source).map_err(|e| SecretStoreError::Transport {
    url: source.to_string(),
    source: e,
  })?;

  let status = response.status();
  if !status.is_success() {
    return Err(SecretStoreError::Status {
      url: source.to_string(),
      status: status.as_u16(),
    });
  }

  let body: Value = response.json().map_err(|e| SecretStoreError::Decode {
    url: source.to_string(),
    source: e,
  })?;

  match body {
    Value::Object(map) => {
      tracing::debug!(keys = ?map.keys().collect::<Vec<_>>(), "fetched secret overrides");
      Ok(map)
    }
    _ => Err(SecretStoreError::NotAnObject {
      url: source.to_string(),
    }),
  }
}
