//! Publishing the build tree via symlinks.
//!
//! Every file under the build root gets a symlink at the mirrored path under
//! the deployment base directory. An existing entry at a target path is
//! removed first, so re-linking the same build is idempotent and linking a
//! new build atomically retargets each file one at a time.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use walkdir::WalkDir;

use crate::values::ValueSet;

/// Value key naming the deployment base directory.
pub const BASE_DIR_KEY: &str = "BaseDir";

#[derive(Debug, Error)]
pub enum LinkError {
  #[error("value set has no usable '{BASE_DIR_KEY}' entry")]
  MissingBaseDir,

  #[error("failed to walk build tree: {0}")]
  Walk(#[from] walkdir::Error),

  #[error("failed to resolve '{path}': {source}")]
  Resolve {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to create directory '{path}': {source}")]
  CreateDir {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to remove existing entry '{path}': {source}")]
  Remove {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to link '{target}' -> '{source_path}': {source}")]
  Symlink {
    target: PathBuf,
    source_path: PathBuf,
    #[source]
    source: io::Error,
  },
}

/// Read the deployment base directory out of the merged values.
///
/// Must be called against the values the templates were rendered with; only
/// a non-empty string qualifies.
pub fn base_dir(values: &ValueSet) -> Result<PathBuf, LinkError> {
  match values.get_str(BASE_DIR_KEY) {
    Some(dir) if !dir.is_empty() => Ok(PathBuf::from(dir)),
    _ => Err(LinkError::MissingBaseDir),
  }
}

/// Link every file under `build_root` into `base`.
///
/// Directories are created as plain directories; only files become symlinks.
/// Returns the symlink paths that were created, in traversal order.
pub fn deploy(build_root: &Path, base: &Path) -> Result<Vec<PathBuf>, LinkError> {
  fs::create_dir_all(base).map_err(|source| LinkError::CreateDir {
    path: base.to_path_buf(),
    source,
  })?;

  let mut linked = Vec::new();

  for entry in WalkDir::new(build_root).min_depth(1).sort_by_file_name() {
    let entry = entry?;
    let rel = entry
      .path()
      .strip_prefix(build_root)
      .unwrap_or(entry.path());
    let target = base.join(rel);

    if entry.file_type().is_dir() {
      fs::create_dir_all(&target).map_err(|source| LinkError::CreateDir {
        path: target,
        source,
      })?;
      continue;
    }

    // Symlinks resolve relative to their own location, so the link target
    // has to be absolute to survive being placed anywhere under the base.
    let absolute = std::path::absolute(entry.path()).map_err(|source| LinkError::Resolve {
      path: entry.path().to_path_buf(),
      source,
    })?;

    replace_with_symlink(&absolute, &target)?;
    tracing::info!(link = %target.display(), to = %absolute.display(), "linked");
    linked.push(target);
  }

  Ok(linked)
}

/// Point `link` at `original`, removing whatever currently sits at `link`.
fn replace_with_symlink(original: &Path, link: &Path) -> Result<(), LinkError> {
  // symlink_metadata does not follow the link, so a dangling symlink is
  // still detected and removed.
  match fs::symlink_metadata(link) {
    Ok(meta) => {
      let removal = if meta.is_dir() {
        fs::remove_dir_all(link)
      } else {
        fs::remove_file(link)
      };
      removal.map_err(|source| LinkError::Remove {
        path: link.to_path_buf(),
        source,
      })?;
    }
    Err(e) if e.kind() == io::ErrorKind::NotFound => {}
    Err(source) => {
      return Err(LinkError::Remove {
        path: link.to_path_buf(),
        source,
      });
    }
  }

  symlink_file(original, link).map_err(|source| LinkError::Symlink {
    target: link.to_path_buf(),
    source_path: original.to_path_buf(),
    source,
  })
}

#[cfg(unix)]
fn symlink_file(original: &Path, link: &Path) -> io::Result<()> {
  std::os::unix::fs::symlink(original, link)
}

#[cfg(windows)]
fn symlink_file(original: &Path, link: &Path) -> io::Result<()> {
  std::os::windows::fs::symlink_file(original, link)
}
