//! Structural validation of raw models.
//!
//! Catches trees the merger cannot process deterministically: duplicate
//! merge keys within one list, blank key components, and blank or
//! duplicate profile ids.

use std::collections::HashSet;

use crate::raw::RawModel;
use crate::tree::{Keyed, ModelTree};

/// A structural defect in a model tree
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{path}: {message}")]
pub struct ModelStructureError {
    /// Dotted path of the offending field
    pub path: String,

    pub message: String,
}

impl ModelStructureError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

fn is_blank(value: Option<&String>) -> bool {
    value.map_or(true, |v| v.trim().is_empty())
}

fn check_unique<T: Keyed>(path: &str, entries: &[T]) -> Result<(), ModelStructureError> {
    let mut seen = HashSet::new();
    for (i, entry) in entries.iter().enumerate() {
        let key = entry.merge_key();
        if !seen.insert(key.clone()) {
            return Err(ModelStructureError::new(
                format!("{}[{}]", path, i),
                format!("duplicate entry '{}' must be unique", key),
            ));
        }
    }
    Ok(())
}

impl ModelTree {
    /// Validate this tree; `prefix` is prepended to reported paths.
    pub fn validate(&self, prefix: &str) -> Result<(), ModelStructureError> {
        let path = |field: &str| {
            if prefix.is_empty() {
                field.to_string()
            } else {
                format!("{}.{}", prefix, field)
            }
        };

        for key in self.properties.keys() {
            if key.trim().is_empty() {
                return Err(ModelStructureError::new(path("properties"), "property key is blank"));
            }
        }

        for (field, deps) in [
            ("dependencies", &self.dependencies),
            ("dependencyManagement", &self.dependency_management),
        ] {
            for (i, dep) in deps.iter().enumerate() {
                if is_blank(dep.group_id.as_ref()) {
                    return Err(ModelStructureError::new(
                        format!("{}[{}].groupId", path(field), i),
                        "is missing",
                    ));
                }
                if is_blank(dep.artifact_id.as_ref()) {
                    return Err(ModelStructureError::new(
                        format!("{}[{}].artifactId", path(field), i),
                        "is missing",
                    ));
                }
            }
            check_unique(&path(field), deps)?;
        }

        if let Some(build) = &self.build {
            let plugins_path = path("build.plugins");
            for (i, plugin) in build.plugins.iter().enumerate() {
                if is_blank(plugin.artifact_id.as_ref()) {
                    return Err(ModelStructureError::new(
                        format!("{}[{}].artifactId", plugins_path, i),
                        "is missing",
                    ));
                }
            }
            check_unique(&plugins_path, &build.plugins)?;
        }

        for (i, repo) in self.repositories.iter().enumerate() {
            if is_blank(repo.id.as_ref()) {
                return Err(ModelStructureError::new(
                    format!("{}[{}].id", path("repositories"), i),
                    "is missing",
                ));
            }
        }
        check_unique(&path("repositories"), &self.repositories)?;

        Ok(())
    }
}

impl RawModel {
    /// Validate the model tree and every profile fragment.
    pub fn validate(&self) -> Result<(), ModelStructureError> {
        self.tree.validate("")?;

        let mut ids = HashSet::new();
        for (i, profile) in self.profiles.iter().enumerate() {
            if profile.id.trim().is_empty() {
                return Err(ModelStructureError::new(format!("profiles[{}].id", i), "is missing"));
            }
            if !ids.insert(profile.id.as_str()) {
                return Err(ModelStructureError::new(
                    format!("profiles[{}].id", i),
                    format!("duplicate profile '{}' must be unique", profile.id),
                ));
            }
            profile.tree.validate(&format!("profiles[{}]", profile.id))?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::Profile;
    use crate::tree::{Build, Dependency, Plugin};

    #[test]
    fn test_valid_model() {
        let model = RawModel::new(
            ModelTree::with_coordinates("g", "a", "1")
                .with_dependency(Dependency::new("g", "x", Some("1")))
                .with_dependency(Dependency::new("g", "y", None)),
        );
        assert!(model.validate().is_ok());
    }

    #[test]
    fn test_duplicate_dependency_rejected() {
        let model = RawModel::new(
            ModelTree::default()
                .with_dependency(Dependency::new("g", "x", Some("1")))
                .with_dependency(Dependency::new("g", "x", Some("2"))),
        );
        let err = model.validate().unwrap_err();
        assert_eq!(err.path, "dependencies[1]");
        assert!(err.message.contains("g:x:jar"));
    }

    #[test]
    fn test_dependency_missing_artifact_id() {
        let mut dep = Dependency::new("g", "x", None);
        dep.artifact_id = None;
        let model = RawModel::new(ModelTree::default().with_dependency(dep));
        let err = model.validate().unwrap_err();
        assert_eq!(err.path, "dependencies[0].artifactId");
    }

    #[test]
    fn test_duplicate_plugin_rejected() {
        let model = RawModel::new(ModelTree {
            build: Some(Build {
                plugins: vec![Plugin::new("p", None), Plugin::new("p", Some("2"))],
                ..Build::default()
            }),
            ..ModelTree::default()
        });
        assert_eq!(model.validate().unwrap_err().path, "build.plugins[1]");
    }

    #[test]
    fn test_duplicate_profile_id_rejected() {
        let model = RawModel::default()
            .with_profile(Profile::new("ci"))
            .with_profile(Profile::new("ci"));
        let err = model.validate().unwrap_err();
        assert_eq!(err.path, "profiles[1].id");
    }

    #[test]
    fn test_profile_fragment_validated_with_prefix() {
        let fragment = ModelTree::default()
            .with_dependency(Dependency::new("g", "x", None))
            .with_dependency(Dependency::new("g", "x", None));
        let model = RawModel::default().with_profile(Profile::new("dev").with_tree(fragment));
        let err = model.validate().unwrap_err();
        assert_eq!(err.path, "profiles[dev].dependencies[1]");
    }

    #[test]
    fn test_blank_property_key_rejected() {
        let model = RawModel::new(ModelTree::default().with_property(" ", "v"));
        assert_eq!(model.validate().unwrap_err().path, "properties");
    }
}
