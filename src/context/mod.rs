//! Property lookup for interpolation
//!
//! Two sources back every interpolation pass:
//! - [`ModelValueSource`]: self-references into the model being built
//!   (`project.*`, `pom.*`, `basedir`), consulted first
//! - [`PropertyContext`]: layered properties, later layers shadowing
//!   earlier ones

use indexmap::IndexMap;
use pom_interpolation::ValueSource;
use pom_model::{ModelTree, ParentRef};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::borrow::Cow;
use std::path::Path;

/// Prefixes that address the model itself
const SELF_PREFIXES: &[&str] = &["project.", "pom."];

/// Property layers, lowest precedence first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyLayer {
    /// Environment and configured system properties
    System,
    /// Properties of the merged chain
    Model,
    /// Properties contributed by active profiles
    Profile,
    /// Caller-supplied overrides
    User,
}

/// Layered key/value context, read-only during a resolution pass
#[derive(Debug, Clone, Default)]
pub struct PropertyContext {
    layers: Vec<(PropertyLayer, IndexMap<String, String>)>,
}

impl PropertyContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a layer above every existing one
    pub fn with_layer(mut self, layer: PropertyLayer, properties: IndexMap<String, String>) -> Self {
        self.layers.push((layer, properties));
        self
    }

    /// Resolve a key, topmost layer first
    pub fn get(&self, key: &str) -> Option<&str> {
        self.layers
            .iter()
            .rev()
            .find_map(|(_, props)| props.get(key).map(String::as_str))
    }

    /// Layer that currently provides `key`
    pub fn provider(&self, key: &str) -> Option<PropertyLayer> {
        self.layers
            .iter()
            .rev()
            .find(|(_, props)| props.contains_key(key))
            .map(|(layer, _)| *layer)
    }

    pub fn layer(&self, layer: PropertyLayer) -> Option<&IndexMap<String, String>> {
        self.layers
            .iter()
            .find(|(l, _)| *l == layer)
            .map(|(_, props)| props)
    }

    pub fn len(&self) -> usize {
        self.layers.iter().map(|(_, props)| props.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ValueSource for PropertyContext {
    fn lookup(&self, key: &str) -> Option<Cow<'_, str>> {
        self.get(key).map(Cow::Borrowed)
    }
}

/// Self-references resolved against a snapshot of the model taken before
/// interpolation
#[derive(Debug, Clone)]
pub struct ModelValueSource {
    snapshot: Value,
    basedir: Option<String>,
}

impl ModelValueSource {
    pub fn new(tree: &Value, parent: Option<&ParentRef>, basedir: Option<&Path>) -> Self {
        let mut snapshot = tree.clone();
        if let (Some(parent), Value::Object(map)) = (parent, &mut snapshot) {
            if let Ok(parent) = serde_json::to_value(parent) {
                map.insert("parent".to_string(), parent);
            }
        }
        Self {
            snapshot,
            basedir: basedir.map(|p| p.display().to_string()),
        }
    }

    /// Snapshot a typed tree
    pub fn from_tree(tree: &ModelTree, parent: Option<&ParentRef>, basedir: Option<&Path>) -> Result<Self, serde_json::Error> {
        Ok(Self::new(&serde_json::to_value(tree)?, parent, basedir))
    }

    fn field(&self, path: &str) -> Option<Cow<'_, str>> {
        let mut current = &self.snapshot;
        for part in path.split('.') {
            current = current.as_object()?.get(part)?;
        }
        match current {
            Value::String(s) => Some(Cow::Borrowed(s.as_str())),
            Value::Bool(b) => Some(Cow::Owned(b.to_string())),
            Value::Number(n) => Some(Cow::Owned(n.to_string())),
            _ => None,
        }
    }
}

impl ValueSource for ModelValueSource {
    fn lookup(&self, key: &str) -> Option<Cow<'_, str>> {
        if key == "basedir" || key == "project.basedir" {
            return self.basedir.as_deref().map(Cow::Borrowed);
        }
        let path = SELF_PREFIXES.iter().find_map(|prefix| key.strip_prefix(prefix))?;
        // `project.properties.x` is not a self-reference
        if path.starts_with("properties.") {
            return None;
        }
        self.field(path)
    }
}
