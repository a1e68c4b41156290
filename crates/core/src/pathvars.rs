//! Path placeholder expansion.
//!
//! Relative paths in the source tree may embed tokens of the form
//! `__.Key__`, replaced with the string value of `Key` before any directory
//! or output file is created. Expansion is a total function: unmatched
//! placeholders pass through verbatim (so literal text resembling a token is
//! safe) and only string-typed values ever participate, so numbers, lists
//! and mappings are never stringified into paths.

use crate::values::ValueSet;

/// Expand every `__.Key__` occurrence in `path` from string-typed entries of
/// `values`.
pub fn expand_path_vars(path: &str, values: &ValueSet) -> String {
  let mut expanded = path.to_string();
  for (key, value) in values.iter() {
    let Some(text) = value.as_str() else { continue };
    let token = format!("__.{key}__");
    if expanded.contains(&token) {
      expanded = expanded.replace(&token, text);
    }
  }
  expanded
}
