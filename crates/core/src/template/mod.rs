//! Template rendering: the engine plus the source-tree walker.

mod engine;
mod render;

pub use engine::{Template, TemplateError};
pub use render::{RenderError, TEMPLATE_SUFFIX, render_tree};
