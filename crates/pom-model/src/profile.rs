//! Profiles and their activation predicates.

use serde::{Deserialize, Serialize};

use crate::tree::ModelTree;

/// A named, conditionally-activated fragment of a model
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activation: Option<Activation>,

    /// Fragment contributed when the profile is active
    #[serde(flatten)]
    pub tree: ModelTree,
}

impl Profile {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            activation: None,
            tree: ModelTree::default(),
        }
    }

    pub fn with_activation(mut self, activation: Activation) -> Self {
        self.activation = Some(activation);
        self
    }

    pub fn with_tree(mut self, tree: ModelTree) -> Self {
        self.tree = tree;
        self
    }
}

/// Activation predicate set; declared conditions combine with AND.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Activation {
    /// Active when no other profile of the same model is active
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub active_by_default: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub property: Option<ActivationProperty>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<ActivationFile>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub os: Option<ActivationOs>,
}

impl Activation {
    /// Whether any predicate (other than `activeByDefault`) is declared
    pub fn has_conditions(&self) -> bool {
        self.property.is_some() || self.file.is_some() || self.os.is_some()
    }

    /// `property-present(name)`; prefix the name with `!` for absence
    pub fn property_present(name: &str) -> Self {
        Self {
            property: Some(ActivationProperty {
                name: name.to_string(),
                value: None,
            }),
            ..Self::default()
        }
    }

    /// `property-equals(name, value)`; prefix the value with `!` to negate
    pub fn property_equals(name: &str, value: &str) -> Self {
        Self {
            property: Some(ActivationProperty {
                name: name.to_string(),
                value: Some(value.to_string()),
            }),
            ..Self::default()
        }
    }

    pub fn file_exists(path: &str) -> Self {
        Self {
            file: Some(ActivationFile {
                exists: Some(path.to_string()),
                missing: None,
            }),
            ..Self::default()
        }
    }

    pub fn file_missing(path: &str) -> Self {
        Self {
            file: Some(ActivationFile {
                exists: None,
                missing: Some(path.to_string()),
            }),
            ..Self::default()
        }
    }

    pub fn os_family(family: &str) -> Self {
        Self {
            os: Some(ActivationOs {
                family: Some(family.to_string()),
                ..ActivationOs::default()
            }),
            ..Self::default()
        }
    }

    pub fn by_default() -> Self {
        Self {
            active_by_default: true,
            ..Self::default()
        }
    }
}

/// Property presence or equality predicate
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivationProperty {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

/// File existence predicate; exactly one of the two must be set
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActivationFile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exists: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub missing: Option<String>,
}

/// Operating system predicate; each field may be negated with `!`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActivationOs {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub family: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub arch: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}
