//! Text templating of hook script commands.
//! Only command strings are rendered; file contents are copied verbatim.
use crate::error::{Error, Result};
use minijinja::{Environment, UndefinedBehavior};
use regex::Regex;
use std::borrow::Cow;
use std::sync::OnceLock;

/// Trait for template rendering engines.
pub trait TemplateRenderer {
    /// Renders `template` against `context`.
    ///
    /// # Arguments
    /// * `name` - Name reported in syntax errors (the script key)
    /// * `template` - Template string to render
    /// * `context` - Context variables for rendering
    fn render(&self, name: &str, template: &str, context: &serde_json::Value)
        -> Result<String>;
}

/// MiniJinja-based template rendering engine.
pub struct MiniJinjaRenderer {
    env: Environment<'static>,
}

impl MiniJinjaRenderer {
    pub fn new() -> Self {
        let mut env = Environment::new();
        // Missing context values render as empty strings.
        env.set_undefined_behavior(UndefinedBehavior::Lenient);
        Self { env }
    }
}

impl Default for MiniJinjaRenderer {
    fn default() -> Self {
        MiniJinjaRenderer::new()
    }
}

impl TemplateRenderer for MiniJinjaRenderer {
    /// # Errors
    /// * `Error::MinijinjaError` if the template has a syntax error or fails
    ///   to evaluate
    fn render(
        &self,
        name: &str,
        template: &str,
        context: &serde_json::Value,
    ) -> Result<String> {
        let template = strip_field_dots(template);
        self.env.render_named_str(name, &template, context).map_err(Error::MinijinjaError)
    }
}

fn field_dot_regex() -> &'static Regex {
    static FIELD_DOT: OnceLock<Regex> = OnceLock::new();
    FIELD_DOT.get_or_init(|| {
        Regex::new(r"(\{\{-?\s*)\.([A-Za-z_])").expect("valid field regex")
    })
}

/// Accepts the `{{.Name}}` field form by dropping the dot that opens an
/// expression, so `{{.Name}}` and `{{ Name }}` render the same.
fn strip_field_dots(template: &str) -> Cow<'_, str> {
    field_dot_regex().replace_all(template, "${1}${2}")
}
