//! Model identifiers and parent references.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

use crate::{UNKNOWN_ARTIFACT_ID, UNKNOWN_GROUP_ID, UNKNOWN_VERSION};

/// Identifier naming one model within a build (`group:artifact:version`).
///
/// Shared as the map key between the builder and the result container.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelId(String);

impl ModelId {
    /// Wrap an already-formatted identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Build an identifier from possibly-missing coordinates.
    ///
    /// Missing parts render as `[unknown-group-id]` and friends so that a
    /// partially defined raw model still gets a stable, printable key.
    pub fn from_parts(group_id: Option<&str>, artifact_id: Option<&str>, version: Option<&str>) -> Self {
        fn part<'a>(value: Option<&'a str>, unknown: &'a str) -> &'a str {
            match value {
                Some(v) if !v.trim().is_empty() => v,
                _ => unknown,
            }
        }

        Self(format!(
            "{}:{}:{}",
            part(group_id, UNKNOWN_GROUP_ID),
            part(artifact_id, UNKNOWN_ARTIFACT_ID),
            part(version, UNKNOWN_VERSION),
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ModelId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ModelId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for ModelId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ModelId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Reference from a child model to its parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParentRef {
    pub group_id: String,

    pub artifact_id: String,

    pub version: String,

    /// Location of the parent relative to the child's file.
    ///
    /// `None` means "use the default location"; an empty string disables
    /// the location lookup entirely.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relative_path: Option<String>,
}

impl ParentRef {
    pub fn new(group_id: impl Into<String>, artifact_id: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            group_id: group_id.into(),
            artifact_id: artifact_id.into(),
            version: version.into(),
            relative_path: None,
        }
    }

    /// Set an explicit relative location
    pub fn with_relative_path(mut self, path: impl Into<String>) -> Self {
        self.relative_path = Some(path.into());
        self
    }

    /// Identifier of the referenced parent
    pub fn id(&self) -> ModelId {
        ModelId::from_parts(Some(&self.group_id), Some(&self.artifact_id), Some(&self.version))
    }

    /// Relative location to probe, falling back to `default` when unset.
    ///
    /// Returns `None` when location lookup is disabled.
    pub fn relative_path_or<'a>(&'a self, default: &'a str) -> Option<&'a str> {
        match self.relative_path.as_deref() {
            None => Some(default),
            Some(p) if p.trim().is_empty() => None,
            Some(p) => Some(p),
        }
    }
}

impl fmt::Display for ParentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}
