//! Template rendering against an [`Environment`].
//!
//! The [`Renderer`] trait is the seam between the sender and whatever template
//! engine the application uses. [`TemplateRenderer`] is the built-in engine: it
//! substitutes `{{ name }}` expressions, where `name` is a dotted path into the
//! (possibly nested) environment, e.g. `{{ api.host }}` or `{{ hosts.0 }}`.
//!
//! What happens with variables that are not defined is controlled by
//! [`UndefinedBehavior`]: they are either left in place verbatim, or reported as
//! a [`TemplateError::UndefinedVariable`].
use serde_json::Value;

use crate::model::Environment;

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    #[error("undefined variable: {0}")]
    UndefinedVariable(String),

    #[error("unterminated template expression at offset {0}")]
    Unterminated(usize),
}

/// Renders template text against an environment.
pub trait Renderer: Send + Sync {
    fn render(&self, text: &str, environment: &Environment) -> Result<String, TemplateError>;
}

/// How the renderer treats expressions referencing unknown variables.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UndefinedBehavior {
    /// Leave the expression in the output unchanged.
    #[default]
    PassThrough,
    /// Fail rendering.
    Error,
}

/// Built-in `{{ variable }}` renderer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateRenderer {
    undefined: UndefinedBehavior,
}

impl TemplateRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Renderer that fails on undefined variables and unterminated expressions.
    pub fn strict() -> Self {
        Self { undefined: UndefinedBehavior::Error }
    }

    pub fn with_undefined(undefined: UndefinedBehavior) -> Self {
        Self { undefined }
    }
}

impl Renderer for TemplateRenderer {
    fn render(&self, text: &str, environment: &Environment) -> Result<String, TemplateError> {
        let mut out = String::with_capacity(text.len());
        let mut rest = text;
        let mut offset = 0;

        while let Some(start) = rest.find(OPEN) {
            out.push_str(&rest[..start]);
            let after_open = &rest[start + OPEN.len()..];

            let Some(end) = after_open.find(CLOSE) else {
                if self.undefined == UndefinedBehavior::Error {
                    return Err(TemplateError::Unterminated(offset + start));
                }
                out.push_str(&rest[start..]);
                return Ok(out);
            };

            let expr = after_open[..end].trim();
            let consumed = start + OPEN.len() + end + CLOSE.len();

            match lookup(environment, expr) {
                Some(value) => out.push_str(&stringify(value)),
                None if self.undefined == UndefinedBehavior::Error => {
                    return Err(TemplateError::UndefinedVariable(expr.to_string()));
                }
                None => out.push_str(&rest[start..consumed]),
            }

            rest = &rest[consumed..];
            offset += consumed;
        }

        out.push_str(rest);
        Ok(out)
    }
}

/// Resolves a dotted path (`a.b.0`) against the environment.
fn lookup<'a>(environment: &'a Environment, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return None;
    }

    let mut segments = path.split('.');
    let mut current = environment.get(segments.next()?)?;

    for segment in segments {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }

    Some(current)
}

fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
