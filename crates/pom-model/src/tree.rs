//! The model attribute tree.
//!
//! Every scalar is an `Option` so that "not declared" stays distinct from
//! "declared empty". Collections use serde defaults and are omitted from
//! serialized output when empty.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{DEFAULT_DEPENDENCY_TYPE, DEFAULT_PLUGIN_GROUP_ID};

/// Entries of a list merged by key rather than by position.
pub trait Keyed {
    /// Key identifying this entry within its list.
    fn merge_key(&self) -> String;
}

/// Attribute tree of a model or of a profile fragment
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ModelTree {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,

    /// Not inherited from the parent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub packaging: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub inception_year: Option<String>,

    /// Properties in declaration order
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub properties: IndexMap<String, String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<Dependency>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub dependency_management: Vec<Dependency>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub build: Option<Build>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub repositories: Vec<Repository>,

    /// Aggregated sub-modules; not inherited from the parent
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub modules: Vec<String>,
}

impl ModelTree {
    /// Convenience constructor for the common coordinate triple.
    pub fn with_coordinates(group_id: &str, artifact_id: &str, version: &str) -> Self {
        Self {
            group_id: Some(group_id.to_string()),
            artifact_id: Some(artifact_id.to_string()),
            version: Some(version.to_string()),
            ..Self::default()
        }
    }

    /// Set one property, keeping declaration order.
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn with_dependency(mut self, dependency: Dependency) -> Self {
        self.dependencies.push(dependency);
        self
    }
}

/// A declared dependency (or managed dependency)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Dependency {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Artifact type; `jar` when unset
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub classifier: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub optional: Option<bool>,
}

impl Dependency {
    pub fn new(group_id: &str, artifact_id: &str, version: Option<&str>) -> Self {
        Self {
            group_id: Some(group_id.to_string()),
            artifact_id: Some(artifact_id.to_string()),
            version: version.map(str::to_string),
            ..Self::default()
        }
    }

    pub fn with_scope(mut self, scope: &str) -> Self {
        self.scope = Some(scope.to_string());
        self
    }
}

impl Keyed for Dependency {
    /// `groupId:artifactId:type[:classifier]`
    fn merge_key(&self) -> String {
        let mut key = format!(
            "{}:{}:{}",
            self.group_id.as_deref().unwrap_or_default(),
            self.artifact_id.as_deref().unwrap_or_default(),
            self.kind.as_deref().unwrap_or(DEFAULT_DEPENDENCY_TYPE),
        );
        if let Some(classifier) = self.classifier.as_deref().filter(|c| !c.is_empty()) {
            key.push(':');
            key.push_str(classifier);
        }
        key
    }
}

/// Build section
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Build {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub directory: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_directory: Option<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub plugins: Vec<Plugin>,
}

/// A build plugin declaration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Plugin {
    /// Defaults to `org.apache.maven.plugins` for keying
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// `Some(false)` keeps this plugin out of child models
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inherited: Option<bool>,

    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub configuration: IndexMap<String, String>,
}

impl Plugin {
    pub fn new(artifact_id: &str, version: Option<&str>) -> Self {
        Self {
            artifact_id: Some(artifact_id.to_string()),
            version: version.map(str::to_string),
            ..Self::default()
        }
    }

    pub fn is_inherited(&self) -> bool {
        self.inherited.unwrap_or(true)
    }
}

impl Keyed for Plugin {
    fn merge_key(&self) -> String {
        format!(
            "{}:{}",
            self.group_id.as_deref().unwrap_or(DEFAULT_PLUGIN_GROUP_ID),
            self.artifact_id.as_deref().unwrap_or_default(),
        )
    }
}

/// Artifact repository declaration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Repository {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl Keyed for Repository {
    fn merge_key(&self) -> String {
        self.id.clone().unwrap_or_default()
    }
}
