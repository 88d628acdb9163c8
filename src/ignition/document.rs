//! Loosely typed documents and their merge rules
//!
//! Both the base template and the user supplied override are parsed into a
//! [`Node`] tree. Mappings always merge key by key; how sequences and
//! scalars combine depends on the [`MergeMode`].

use std::collections::BTreeMap;

use serde_json::{Number, Value};

use crate::error::{Error, Result};

/// A document node.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Mapping(BTreeMap<String, Node>),
    Sequence(Vec<Node>),
    Scalar(Scalar),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
}

/// How an override document is combined with the base.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MergeMode {
    /// Sequences are concatenated, base entries first.
    #[default]
    Append,
    /// Sequences from the override replace those of the base.
    Override,
}

impl MergeMode {
    pub fn from_override_flag(full_override: bool) -> Self {
        if full_override {
            MergeMode::Override
        } else {
            MergeMode::Append
        }
    }
}

impl Node {
    /// Parse a YAML (or JSON) document.
    pub fn from_yaml(text: &str) -> Result<Self> {
        let value: Value = serde_yaml::from_str(text)?;
        Ok(Self::from(value))
    }

    /// Serialize to compact JSON text.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&Value::from(self.clone()))?)
    }

    fn kind(&self) -> &'static str {
        match self {
            Node::Mapping(_) => "mapping",
            Node::Sequence(_) => "sequence",
            Node::Scalar(Scalar::Null) => "null",
            Node::Scalar(_) => "scalar",
        }
    }

    /// Rewrite every string and mapping key with `f`.
    pub fn map_text(self, f: &impl Fn(&str) -> String) -> Node {
        match self {
            Node::Mapping(map) => {
                Node::Mapping(map.into_iter().map(|(k, v)| (f(&k), v.map_text(f))).collect())
            }
            Node::Sequence(items) => Node::Sequence(items.into_iter().map(|n| n.map_text(f)).collect()),
            Node::Scalar(Scalar::String(s)) => Node::Scalar(Scalar::String(f(&s))),
            scalar => scalar,
        }
    }

    /// Merge `overlay` into `self`.
    pub fn merge(self, overlay: Node, mode: MergeMode) -> Result<Node> {
        merge_at(self, overlay, mode, &mut Vec::new())
    }
}

fn merge_at(base: Node, overlay: Node, mode: MergeMode, path: &mut Vec<String>) -> Result<Node> {
    match (base, overlay) {
        (base, Node::Scalar(Scalar::Null)) => Ok(base),
        (Node::Scalar(Scalar::Null), overlay) => Ok(overlay),
        (Node::Mapping(mut base), Node::Mapping(overlay)) => {
            for (key, value) in overlay {
                let merged = match base.remove(&key) {
                    Some(existing) => {
                        path.push(key.clone());
                        let merged = merge_at(existing, value, mode, path)?;
                        path.pop();
                        merged
                    }
                    None => value,
                };
                base.insert(key, merged);
            }
            Ok(Node::Mapping(base))
        }
        (Node::Sequence(mut base), Node::Sequence(overlay)) => match mode {
            MergeMode::Append => {
                base.extend(overlay);
                Ok(Node::Sequence(base))
            }
            MergeMode::Override => Ok(Node::Sequence(overlay)),
        },
        (Node::Scalar(_), Node::Scalar(overlay)) => Ok(Node::Scalar(overlay)),
        (base, overlay) => Err(Error::MergeConflict {
            path: display_path(path),
            base: base.kind(),
            overlay: overlay.kind(),
        }),
    }
}

fn display_path(path: &[String]) -> String {
    if path.is_empty() {
        "document root".to_string()
    } else {
        path.join(".")
    }
}

impl From<Value> for Node {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Node::Scalar(Scalar::Null),
            Value::Bool(b) => Node::Scalar(Scalar::Bool(b)),
            Value::Number(n) => Node::Scalar(Scalar::Number(n)),
            Value::String(s) => Node::Scalar(Scalar::String(s)),
            Value::Array(items) => Node::Sequence(items.into_iter().map(Node::from).collect()),
            Value::Object(map) => {
                Node::Mapping(map.into_iter().map(|(k, v)| (k, Node::from(v))).collect())
            }
        }
    }
}

impl From<Node> for Value {
    fn from(node: Node) -> Self {
        match node {
            Node::Scalar(Scalar::Null) => Value::Null,
            Node::Scalar(Scalar::Bool(b)) => Value::Bool(b),
            Node::Scalar(Scalar::Number(n)) => Value::Number(n),
            Node::Scalar(Scalar::String(s)) => Value::String(s),
            Node::Sequence(items) => Value::Array(items.into_iter().map(Value::from).collect()),
            Node::Mapping(map) => {
                Value::Object(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}
