//! Source-tree rendering into the build tree.
//!
//! Walks the source tree depth-first. Directories are mirrored under the
//! build root at their placeholder-expanded relative path, `.tmpl` files are
//! rendered against the merged value set (with the suffix stripped from the
//! output name), and everything else is ignored. Generated JSON/YAML output
//! is syntax-checked as soon as it is written.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde_json::Value;
use walkdir::WalkDir;

use thiserror::Error;

use crate::pathvars::expand_path_vars;
use crate::template::engine::{Template, TemplateError};
use crate::validate::{ValidateError, validate_rendered};
use crate::values::ValueSet;

/// Suffix marking a file as a template.
pub const TEMPLATE_SUFFIX: &str = ".tmpl";

#[derive(Debug, Error)]
pub enum RenderError {
  #[error("failed to walk source tree: {0}")]
  Walk(#[from] walkdir::Error),

  #[error("failed to create directory '{path}': {source}")]
  CreateDir {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to read template '{path}': {source}")]
  ReadTemplate {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("template '{path}': {source}")]
  Template {
    path: PathBuf,
    #[source]
    source: TemplateError,
  },

  #[error("failed to write output '{path}': {source}")]
  WriteOutput {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error(transparent)]
  Invalid(#[from] ValidateError),
}

/// Render every template under `source_root` into `build_root`.
///
/// Returns the rendered output paths in traversal order. Any failure aborts
/// the whole render with the offending path attached.
pub fn render_tree(
  source_root: &Path,
  build_root: &Path,
  values: &ValueSet,
) -> Result<Vec<PathBuf>, RenderError> {
  fs::create_dir_all(build_root).map_err(|source| RenderError::CreateDir {
    path: build_root.to_path_buf(),
    source,
  })?;

  let root_context = values.to_value();
  let mut outputs = Vec::new();

  for entry in WalkDir::new(source_root).min_depth(1).sort_by_file_name() {
    let entry = entry?;
    let rel = entry
      .path()
      .strip_prefix(source_root)
      .unwrap_or(entry.path());
    let expanded_rel = expand_path_vars(&rel.to_string_lossy(), values);

    if entry.file_type().is_dir() {
      // Mirror the directory even when it holds no templates.
      let build_path = build_root.join(&expanded_rel);
      fs::create_dir_all(&build_path).map_err(|source| RenderError::CreateDir {
        path: build_path,
        source,
      })?;
      continue;
    }

    if !expanded_rel.ends_with(TEMPLATE_SUFFIX) {
      tracing::debug!(path = %entry.path().display(), "skipping non-template file");
      continue;
    }

    let output = render_file(entry.path(), build_root, &expanded_rel, &root_context)?;
    tracing::info!(path = %output.display(), "rendered");
    outputs.push(output);
  }

  Ok(outputs)
}

/// Render a single template file, write it, and validate the result.
fn render_file(
  src_path: &Path,
  build_root: &Path,
  expanded_rel: &str,
  context: &Value,
) -> Result<PathBuf, RenderError> {
  let source = fs::read_to_string(src_path).map_err(|source| RenderError::ReadTemplate {
    path: src_path.to_path_buf(),
    source,
  })?;

  let template = Template::parse(&source).map_err(|source| RenderError::Template {
    path: src_path.to_path_buf(),
    source,
  })?;
  let rendered = template.render(context).map_err(|source| RenderError::Template {
    path: src_path.to_path_buf(),
    source,
  })?;

  let output_rel = expanded_rel
    .strip_suffix(TEMPLATE_SUFFIX)
    .unwrap_or(expanded_rel);
  let output_path = build_root.join(output_rel);

  if let Some(parent) = output_path.parent() {
    fs::create_dir_all(parent).map_err(|source| RenderError::CreateDir {
      path: parent.to_path_buf(),
      source,
    })?;
  }

  fs::write(&output_path, &rendered).map_err(|source| RenderError::WriteOutput {
    path: output_path.clone(),
    source,
  })?;

  validate_rendered(&output_path, rendered.as_bytes())?;

  Ok(output_path)
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;
  use tempfile::TempDir;

  fn values(v: serde_json::Value) -> ValueSet {
    ValueSet::from_map(v.as_object().unwrap().clone())
  }

  fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
  }

  #[test]
  fn renders_templates_and_strips_suffix() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("source");
    let build = dir.path().join("build");
    write(&source, "acme/api/config.json.tmpl", r#"{"port": {{.Port}}}"#);

    let values = values(json!({"Port": 8080}));
    let outputs = render_tree(&source, &build, &values).unwrap();

    assert_eq!(outputs, vec![build.join("acme/api/config.json")]);
    let content = fs::read_to_string(build.join("acme/api/config.json")).unwrap();
    assert_eq!(content, r#"{"port": 8080}"#);
  }

  #[test]
  fn literal_template_round_trips_and_validates() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("source");
    let build = dir.path().join("build");
    let literal = "{\n  \"name\": \"api\",\n  \"replicas\": 2\n}\n";
    write(&source, "config.json.tmpl", literal);

    render_tree(&source, &build, &ValueSet::new()).unwrap();

    let content = fs::read_to_string(build.join("config.json")).unwrap();
    assert_eq!(content, literal);
  }

  #[test]
  fn expands_path_placeholders_before_creating_dirs() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("source");
    let build = dir.path().join("build");
    write(&source, "__.OrgName__/api/.env.tmpl", "TOKEN={{.Token}}");

    let values = values(json!({"OrgName": "acme", "Token": "t0"}));
    let outputs = render_tree(&source, &build, &values).unwrap();

    assert_eq!(outputs, vec![build.join("acme/api/.env")]);
    assert_eq!(fs::read_to_string(build.join("acme/api/.env")).unwrap(), "TOKEN=t0");
  }

  #[test]
  fn empty_directories_are_mirrored() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("source");
    let build = dir.path().join("build");
    fs::create_dir_all(source.join("acme/empty-service")).unwrap();

    let outputs = render_tree(&source, &build, &ValueSet::new()).unwrap();

    assert!(outputs.is_empty());
    assert!(build.join("acme/empty-service").is_dir());
  }

  #[test]
  fn non_template_files_are_ignored() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("source");
    let build = dir.path().join("build");
    write(&source, "acme/api/README.md", "docs");
    write(&source, "acme/api/app.json.tmpl", "{}");

    let outputs = render_tree(&source, &build, &ValueSet::new()).unwrap();

    assert_eq!(outputs, vec![build.join("acme/api/app.json")]);
    assert!(!build.join("acme/api/README.md").exists());
  }

  #[test]
  fn templates_iterate_over_projects() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("source");
    let build = dir.path().join("build");
    write(
      &source,
      "deploy.txt.tmpl",
      "{{range .Projects}}{{.name}}\n{{end}}",
    );

    let values = values(json!({"Projects": [{"name": "api"}, {"name": "worker"}]}));
    render_tree(&source, &build, &values).unwrap();

    assert_eq!(
      fs::read_to_string(build.join("deploy.txt")).unwrap(),
      "api\nworker\n"
    );
  }

  #[test]
  fn invalid_generated_json_aborts_with_the_output_path() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("source");
    let build = dir.path().join("build");
    // Valid template, conditionally broken output.
    write(
      &source,
      "broken.json.tmpl",
      r#"{"a": 1{{if .WithB}}, "b": 2{{end}},}"#,
    );

    let result = render_tree(&source, &build, &ValueSet::new());

    let err = result.unwrap_err();
    assert!(matches!(err, RenderError::Invalid(_)));
    assert!(err.to_string().contains("broken.json"));
  }

  #[test]
  fn template_syntax_error_names_the_source_file() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("source");
    let build = dir.path().join("build");
    write(&source, "bad.txt.tmpl", "{{if .X}}never closed");

    let err = render_tree(&source, &build, &ValueSet::new()).unwrap_err();
    assert!(matches!(err, RenderError::Template { .. }));
    assert!(err.to_string().contains("bad.txt.tmpl"));
  }

  #[test]
  fn yaml_output_is_validated_too() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("source");
    let build = dir.path().join("build");
    write(&source, "compose.yaml.tmpl", "services: [unclosed");

    let err = render_tree(&source, &build, &ValueSet::new()).unwrap_err();
    assert!(matches!(err, RenderError::Invalid(ValidateError::Yaml { .. })));
  }
}
