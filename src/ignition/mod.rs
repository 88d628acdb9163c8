//! Ignition rendering
//!
//! A machine's ignition is produced in three steps:
//!
//! 1. the base Butane template is merged with the machine class' override
//!    document ([`document`]),
//! 2. the merged document, serialized as JSON, is rendered with Tera using
//!    the machine's hostname, user data and DNS servers,
//! 3. the result is translated from Butane to Ignition ([`butane`]).
//!
//! The template engine has no access to the environment: only the values
//! of [`Config`] and the `json_escape` filter are available, every builtin
//! function fails. Override documents may only use `{{ ... }}` expressions;
//! `{%` and `{#` in their text are kept literally.

pub mod butane;
pub mod document;
mod user_data;

use std::collections::HashMap;

use serde::Serialize;
use tera::{Context, Tera, Value};
use tracing::{debug, instrument};

use crate::error::{Error, Result};
pub use document::{MergeMode, Node};
pub use user_data::prepare_user_data;

/// Base template used when none is configured.
pub const BASE_TEMPLATE: &str = include_str!("templates/ignition.yaml");

const TEMPLATE_NAME: &str = "ignition.json";

/// Functions Tera registers on its own.
const BUILTIN_FUNCTIONS: [&str; 5] = ["range", "now", "throw", "get_random", "get_env"];

/// Composer configuration.
#[derive(Debug, Clone)]
pub struct ComposerConfig {
    /// Butane document every rendered ignition starts from.
    pub base_template: String,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self {
            base_template: BASE_TEMPLATE.to_string(),
        }
    }
}

/// Per-machine inputs of a render.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    pub hostname: String,
    pub user_data: String,
    pub dns_servers: Vec<String>,
    /// Butane override document, may be empty.
    pub ignition: String,
    /// Replace lists of the base instead of appending to them.
    pub ignition_override: bool,
}

#[derive(Serialize)]
struct TemplateValues<'a> {
    hostname: &'a str,
    user_data: &'a str,
    dns_servers: &'a [String],
}

/// Renders ignition from a fixed base template.
#[derive(Debug, Clone)]
pub struct Composer {
    base: Node,
}

impl Composer {
    /// Create a composer, parsing the base template once.
    pub fn new(config: ComposerConfig) -> Result<Self> {
        Ok(Self {
            base: Node::from_yaml(&config.base_template)?,
        })
    }

    /// Render the ignition JSON for a machine.
    #[instrument(skip_all, fields(hostname = %config.hostname))]
    pub fn render(&self, config: &Config) -> Result<String> {
        let mode = MergeMode::from_override_flag(config.ignition_override);
        let merged = self.merge(&config.ignition, mode)?;

        let text = merged.to_json()?;
        let rendered = substitute(
            &text,
            &TemplateValues {
                hostname: &config.hostname,
                user_data: &config.user_data,
                dns_servers: &config.dns_servers,
            },
        )?;

        let ignition = butane::translate(&rendered)?;
        debug!(bytes = ignition.len(), "Rendered ignition");
        Ok(ignition)
    }

    fn merge(&self, overlay: &str, mode: MergeMode) -> Result<Node> {
        if overlay.trim().is_empty() {
            return Ok(self.base.clone());
        }
        let overlay = Node::from_yaml(overlay)?.map_text(&escape_tags);
        self.base.clone().merge(overlay, mode)
    }
}

/// Render ignition with the built-in base template.
pub fn render(config: &Config) -> Result<String> {
    Composer::new(ComposerConfig::default())?.render(config)
}

fn substitute(text: &str, values: &TemplateValues<'_>) -> Result<String> {
    let mut tera = Tera::default();
    for name in BUILTIN_FUNCTIONS {
        tera.register_function(name, move |_: &HashMap<String, Value>| -> tera::Result<Value> {
            Err(tera::Error::msg(format!("function '{name}' is not available")))
        });
    }
    tera.register_filter("json_escape", json_escape);
    tera.add_raw_template(TEMPLATE_NAME, text)
        .map_err(Error::template)?;
    let context = Context::from_serialize(values).map_err(Error::template)?;
    tera.render(TEMPLATE_NAME, &context).map_err(Error::template)
}

/// Turn `{%` and `{#` into expressions printing them, leaving `{{ ... }}`
/// untouched.
fn escape_tags(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find('{') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        if tail.starts_with("{{") {
            let end = tail.find("}}").map_or(tail.len(), |i| i + 2);
            out.push_str(&tail[..end]);
            rest = &tail[end..];
        } else if tail.starts_with("{%") || tail.starts_with("{#") {
            out.push_str("{{ '");
            out.push_str(&tail[..2]);
            out.push_str("' }}");
            rest = &tail[2..];
        } else {
            out.push('{');
            rest = &tail[1..];
        }
    }
    out.push_str(rest);
    out
}

/// Escape a value for use inside a JSON string literal.
fn json_escape(value: &Value, _: &HashMap<String, Value>) -> tera::Result<Value> {
    let raw = match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    let quoted = serde_json::to_string(&raw).map_err(|e| tera::Error::msg(e.to_string()))?;
    Ok(Value::String(quoted[1..quoted.len() - 1].to_string()))
}
