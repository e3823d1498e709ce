//! Raw (as-loaded) models.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::coordinates::{ModelId, ParentRef};
use crate::profile::Profile;
use crate::tree::ModelTree;

/// Snapshot of one model source as produced by a loader.
///
/// Treated as immutable once loaded; the builder shares it behind an `Arc`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawModel {
    /// File this model was read from, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<ParentRef>,

    /// Declared profiles in declaration order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub profiles: Vec<Profile>,

    #[serde(flatten)]
    pub tree: ModelTree,
}

impl RawModel {
    pub fn new(tree: ModelTree) -> Self {
        Self {
            tree,
            ..Self::default()
        }
    }

    pub fn with_parent(mut self, parent: ParentRef) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn with_location(mut self, location: impl Into<PathBuf>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_profile(mut self, profile: Profile) -> Self {
        self.profiles.push(profile);
        self
    }

    /// Group id, inherited from the parent reference when not declared
    pub fn effective_group_id(&self) -> Option<&str> {
        self.tree
            .group_id
            .as_deref()
            .or_else(|| self.parent.as_ref().map(|p| p.group_id.as_str()))
    }

    /// Version, inherited from the parent reference when not declared
    pub fn effective_version(&self) -> Option<&str> {
        self.tree
            .version
            .as_deref()
            .or_else(|| self.parent.as_ref().map(|p| p.version.as_str()))
    }

    /// Identifier of this model (`group:artifact:version`)
    pub fn id(&self) -> ModelId {
        ModelId::from_parts(
            self.effective_group_id(),
            self.tree.artifact_id.as_deref(),
            self.effective_version(),
        )
    }

    /// Directory containing the model file
    pub fn basedir(&self) -> Option<&Path> {
        self.location.as_deref().and_then(Path::parent)
    }

    /// Whether this model satisfies a parent reference (same coordinates)
    pub fn satisfies(&self, parent: &ParentRef) -> bool {
        self.effective_group_id() == Some(parent.group_id.as_str())
            && self.tree.artifact_id.as_deref() == Some(parent.artifact_id.as_str())
            && self.effective_version() == Some(parent.version.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_inherits_group_and_version_from_parent() {
        let model = RawModel::new(ModelTree {
            artifact_id: Some("child".to_string()),
            ..ModelTree::default()
        })
        .with_parent(ParentRef::new("org.acme", "parent", "2.0"));

        assert_eq!(model.id().as_str(), "org.acme:child:2.0");
    }

    #[test]
    fn test_id_partially_undefined() {
        let model = RawModel::new(ModelTree {
            artifact_id: Some("orphan".to_string()),
            ..ModelTree::default()
        });
        assert_eq!(model.id().as_str(), "[unknown-group-id]:orphan:[unknown-version]");
    }

    #[test]
    fn test_basedir() {
        let model = RawModel::default().with_location("/work/app/pom.xml");
        assert_eq!(model.basedir(), Some(Path::new("/work/app")));
    }

    #[test]
    fn test_satisfies_parent_ref() {
        let parent = RawModel::new(ModelTree::with_coordinates("g", "p", "1"));
        assert!(parent.satisfies(&ParentRef::new("g", "p", "1")));
        assert!(!parent.satisfies(&ParentRef::new("g", "p", "2")));
        assert!(!parent.satisfies(&ParentRef::new("g", "other", "1")));
    }

    #[test]
    fn test_raw_model_from_json() {
        let model: RawModel = serde_json::from_str(
            r#"{
                "location": "/w/leaf/pom.xml",
                "parent": {"groupId": "g", "artifactId": "root", "version": "1.0"},
                "artifactId": "leaf",
                "properties": {"y": "${x}"}
            }"#,
        )
        .unwrap();

        assert_eq!(model.id().as_str(), "g:leaf:1.0");
        assert_eq!(model.tree.properties["y"], "${x}");
        assert!(model.profiles.is_empty());
    }
}
