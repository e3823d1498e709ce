//! Raw model sources
//!
//! The builder never reads files itself: every raw model comes through a
//! [`ModelSource`]. Parsing POM files is the loader's business.

use pom_model::{ModelId, ParentRef, RawModel};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Errors reported by a model source
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// Nothing is known under the requested id or location
    #[error("model not found: {0}")]
    NotFound(String),

    /// The model exists but could not be produced
    #[error("failed to load {what}: {message}")]
    Failed { what: String, message: String },
}

impl LoadError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, LoadError::NotFound(_))
    }
}

/// Lookup capability used by the chain resolver.
///
/// Implementations must be callable from several builds at once; any
/// caching they do is their own concern.
pub trait ModelSource: Send + Sync {
    /// Load the model named by a parent reference's coordinates
    fn load_by_id(&self, parent: &ParentRef) -> Result<Arc<RawModel>, LoadError>;

    /// Load the model stored at a file location
    fn load_by_location(&self, location: &Path) -> Result<Arc<RawModel>, LoadError>;
}

/// Source backed by models registered up front
#[derive(Debug, Default, Clone)]
pub struct InMemoryModelSource {
    by_id: HashMap<ModelId, Arc<RawModel>>,
    by_location: HashMap<PathBuf, Arc<RawModel>>,
}

impl InMemoryModelSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a model under its id and, when set, its location.
    ///
    /// Returns the shared handle so callers can start a build from it.
    pub fn insert(&mut self, model: RawModel) -> Arc<RawModel> {
        let model = Arc::new(model);
        if let Some(location) = &model.location {
            self.by_location.insert(location.clone(), Arc::clone(&model));
        }
        self.by_id.insert(model.id(), Arc::clone(&model));
        model
    }

    /// Register a model reachable only through its location
    pub fn insert_at_location(&mut self, location: impl Into<PathBuf>, model: RawModel) -> Arc<RawModel> {
        let location = location.into();
        let model = Arc::new(RawModel {
            location: Some(location.clone()),
            ..model
        });
        self.by_location.insert(location, Arc::clone(&model));
        model
    }

    pub fn with_model(mut self, model: RawModel) -> Self {
        self.insert(model);
        self
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty() && self.by_location.is_empty()
    }
}

impl ModelSource for InMemoryModelSource {
    fn load_by_id(&self, parent: &ParentRef) -> Result<Arc<RawModel>, LoadError> {
        let id = parent.id();
        self.by_id
            .get(&id)
            .cloned()
            .ok_or_else(|| LoadError::NotFound(id.to_string()))
    }

    fn load_by_location(&self, location: &Path) -> Result<Arc<RawModel>, LoadError> {
        self.by_location
            .get(location)
            .cloned()
            .ok_or_else(|| LoadError::NotFound(location.display().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pom_model::ModelTree;

    #[test]
    fn test_load_by_id() {
        let source = InMemoryModelSource::new()
            .with_model(RawModel::new(ModelTree::with_coordinates("g", "root", "1")));

        let loaded = source.load_by_id(&ParentRef::new("g", "root", "1")).unwrap();
        assert_eq!(loaded.id().as_str(), "g:root:1");
    }

    #[test]
    fn test_missing_is_not_found() {
        let source = InMemoryModelSource::new();
        let err = source.load_by_id(&ParentRef::new("g", "root", "1")).unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "model not found: g:root:1");
    }

    #[test]
    fn test_load_by_location() {
        let mut source = InMemoryModelSource::new();
        source.insert(
            RawModel::new(ModelTree::with_coordinates("g", "root", "1")).with_location("/w/pom.xml"),
        );

        let loaded = source.load_by_location(Path::new("/w/pom.xml")).unwrap();
        assert_eq!(loaded.tree.artifact_id.as_deref(), Some("root"));
        assert!(source.load_by_location(Path::new("/w/other/pom.xml")).is_err());
    }

    #[test]
    fn test_location_only_model() {
        let mut source = InMemoryModelSource::new();
        source.insert_at_location(
            "/w/pom.xml",
            RawModel::new(ModelTree::with_coordinates("g", "root", "1")),
        );

        assert!(source.load_by_id(&ParentRef::new("g", "root", "1")).is_err());
        let loaded = source.load_by_location(Path::new("/w/pom.xml")).unwrap();
        assert_eq!(loaded.location.as_deref(), Some(Path::new("/w/pom.xml")));
    }
}
