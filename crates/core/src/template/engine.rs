//! Logic-capable text template engine.
//!
//! Templates substitute values from the merged [`ValueSet`](crate::values::ValueSet)
//! and may branch and iterate over nested data:
//!
//! - `{{.Key}}` / `{{.Key.Subkey}}` - insert a value, resolved from the
//!   current context ("dot")
//! - `{{.}}` - insert the current context itself
//! - `{{if .Flag}} ... {{else}} ... {{end}}` - branch on truthiness
//! - `{{range .List}} ... {{end}}` - iterate a list, rebinding dot to each
//!   element
//!
//! Semantics follow the configuration templates this tool has always
//! consumed: a missing or null value renders as `<no value>`, zero values
//! (false, 0, empty string/list/mapping) are falsy, and ranging over a
//! missing or null value iterates zero times.

use serde_json::Value;
use thiserror::Error;

/// Errors raised while parsing or rendering a template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
  #[error("unclosed tag starting at byte {0}")]
  Unclosed(usize),

  #[error("bad expression '{0}' in template tag")]
  BadExpression(String),

  #[error("'end' tag with no open block")]
  UnexpectedEnd,

  #[error("'else' tag outside an if block")]
  DanglingElse,

  #[error("unterminated '{0}' block")]
  Unterminated(&'static str),

  #[error("cannot range over non-list value '{0}'")]
  NotIterable(String),
}

/// A field reference relative to the current dot; empty means dot itself.
type FieldPath = Vec<String>;

#[derive(Debug, Clone, PartialEq)]
enum Node {
  Text(String),

  Field(FieldPath),

  If {
    path: FieldPath,
    then_body: Vec<Node>,
    else_body: Vec<Node>,
  },

  Range {
    path: FieldPath,
    body: Vec<Node>,
  },
}

/// A parsed template, ready to render against any context value.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
  nodes: Vec<Node>,
}

impl Template {
  /// Parse template source into an executable form.
  pub fn parse(source: &str) -> Result<Self, TemplateError> {
    let tokens = lex(source)?;
    let mut parser = Parser { tokens, pos: 0 };
    let (nodes, terminator) = parser.parse_body()?;
    match terminator {
      Terminator::Eof => Ok(Self { nodes }),
      Terminator::End => Err(TemplateError::UnexpectedEnd),
      Terminator::Else => Err(TemplateError::DanglingElse),
    }
  }

  /// Render against a root context, usually the merged value set.
  pub fn render(&self, root: &Value) -> Result<String, TemplateError> {
    let mut out = String::new();
    render_nodes(&self.nodes, root, &mut out)?;
    Ok(out)
  }
}

// ---------------------------------------------------------------------------
// Lexing
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum Token {
  Text(String),
  Field(FieldPath),
  If(FieldPath),
  Range(FieldPath),
  Else,
  End,
}

fn lex(source: &str) -> Result<Vec<Token>, TemplateError> {
  let mut tokens = Vec::new();
  let mut rest = source;
  let mut offset = 0;

  while let Some(open) = rest.find("{{") {
    if open > 0 {
      tokens.push(Token::Text(rest[..open].to_string()));
    }
    let after_open = &rest[open + 2..];
    let close = after_open
      .find("}}")
      .ok_or(TemplateError::Unclosed(offset + open))?;
    tokens.push(lex_tag(&after_open[..close])?);
    let consumed = open + 2 + close + 2;
    offset += consumed;
    rest = &rest[consumed..];
  }

  if !rest.is_empty() {
    tokens.push(Token::Text(rest.to_string()));
  }

  Ok(tokens)
}

fn lex_tag(content: &str) -> Result<Token, TemplateError> {
  let content = content.trim();
  match content {
    "end" => Ok(Token::End),
    "else" => Ok(Token::Else),
    _ => {
      if let Some(expr) = content.strip_prefix("if ") {
        Ok(Token::If(parse_field_path(expr.trim())?))
      } else if let Some(expr) = content.strip_prefix("range ") {
        Ok(Token::Range(parse_field_path(expr.trim())?))
      } else {
        Ok(Token::Field(parse_field_path(content)?))
      }
    }
  }
}

/// Parse `.`, `.Key` or `.Key.Subkey` into a path of segments.
fn parse_field_path(expr: &str) -> Result<FieldPath, TemplateError> {
  if expr == "." {
    return Ok(Vec::new());
  }
  let Some(rest) = expr.strip_prefix('.') else {
    return Err(TemplateError::BadExpression(expr.to_string()));
  };
  let segments: Vec<String> = rest.split('.').map(str::to_string).collect();
  if segments.iter().any(|s| s.is_empty() || s.contains(char::is_whitespace)) {
    return Err(TemplateError::BadExpression(expr.to_string()));
  }
  Ok(segments)
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// What stopped a body parse: the token is consumed, the caller decides
/// whether it was legal there.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Terminator {
  Eof,
  End,
  Else,
}

struct Parser {
  tokens: Vec<Token>,
  pos: usize,
}

impl Parser {
  /// Parse nodes until an `end`/`else` tag or end of input.
  fn parse_body(&mut self) -> Result<(Vec<Node>, Terminator), TemplateError> {
    let mut nodes = Vec::new();

    loop {
      let Some(token) = self.tokens.get(self.pos).cloned() else {
        return Ok((nodes, Terminator::Eof));
      };
      self.pos += 1;

      match token {
        Token::Text(text) => nodes.push(Node::Text(text)),
        Token::Field(path) => nodes.push(Node::Field(path)),
        Token::If(path) => {
          let (then_body, terminator) = self.parse_body()?;
          let else_body = match terminator {
            Terminator::Else => {
              let (body, terminator) = self.parse_body()?;
              match terminator {
                Terminator::End => body,
                Terminator::Else => return Err(TemplateError::DanglingElse),
                Terminator::Eof => return Err(TemplateError::Unterminated("if")),
              }
            }
            Terminator::End => Vec::new(),
            Terminator::Eof => return Err(TemplateError::Unterminated("if")),
          };
          nodes.push(Node::If {
            path,
            then_body,
            else_body,
          });
        }
        Token::Range(path) => {
          let (body, terminator) = self.parse_body()?;
          match terminator {
            Terminator::End => nodes.push(Node::Range { path, body }),
            Terminator::Else => return Err(TemplateError::DanglingElse),
            Terminator::Eof => return Err(TemplateError::Unterminated("range")),
          }
        }
        Token::Else => return Ok((nodes, Terminator::Else)),
        Token::End => return Ok((nodes, Terminator::End)),
      }
    }
  }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

fn render_nodes(nodes: &[Node], dot: &Value, out: &mut String) -> Result<(), TemplateError> {
  for node in nodes {
    match node {
      Node::Text(text) => out.push_str(text),
      Node::Field(path) => out.push_str(&format_value(lookup(dot, path))),
      Node::If {
        path,
        then_body,
        else_body,
      } => {
        if is_truthy(lookup(dot, path)) {
          render_nodes(then_body, dot, out)?;
        } else {
          render_nodes(else_body, dot, out)?;
        }
      }
      Node::Range { path, body } => match lookup(dot, path) {
        None | Some(Value::Null) => {}
        Some(Value::Array(items)) => {
          for item in items {
            render_nodes(body, item, out)?;
          }
        }
        Some(_) => return Err(TemplateError::NotIterable(display_path(path))),
      },
    }
  }
  Ok(())
}

/// Resolve a field path from the current dot.
fn lookup<'a>(dot: &'a Value, path: &[String]) -> Option<&'a Value> {
  let mut current = dot;
  for segment in path {
    current = current.as_object()?.get(segment)?;
  }
  Some(current)
}

fn format_value(value: Option<&Value>) -> String {
  match value {
    None | Some(Value::Null) => "<no value>".to_string(),
    Some(Value::String(s)) => s.clone(),
    Some(Value::Bool(b)) => b.to_string(),
    Some(Value::Number(n)) => n.to_string(),
    // Lists and mappings render as compact JSON.
    Some(other) => serde_json::to_string(other).unwrap_or_default(),
  }
}

/// Zero-value truthiness: false, 0, null, missing, and empty
/// strings/lists/mappings are falsy.
fn is_truthy(value: Option<&Value>) -> bool {
  match value {
    None | Some(Value::Null) => false,
    Some(Value::Bool(b)) => *b,
    Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
    Some(Value::String(s)) => !s.is_empty(),
    Some(Value::Array(items)) => !items.is_empty(),
    Some(Value::Object(map)) => !map.is_empty(),
  }
}

fn display_path(path: &[String]) -> String {
  if path.is_empty() {
    ".".to_string()
  } else {
    format!(".{}", path.join("."))
  }
}
