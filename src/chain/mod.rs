//! Parent chain resolution
//!
//! Walks parent references from a starting model up to the root and returns
//! the models root-first. Every step tries the parent's relative location
//! before falling back to a lookup by coordinates.

use pom_model::{ModelId, ParentRef, RawModel};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use crate::config::{DEFAULT_MAX_CHAIN_DEPTH, DEFAULT_RELATIVE_PATH};
use crate::source::{LoadError, ModelSource};

/// File name appended when a relative location names a directory
const DEFAULT_MODEL_FILE: &str = "pom.xml";

/// Ordered raw models, root ancestor first, initiating model last
#[derive(Debug, Clone)]
pub struct Chain {
    models: Vec<Arc<RawModel>>,
}

impl Chain {
    pub fn models(&self) -> &[Arc<RawModel>] {
        &self.models
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<RawModel>> {
        self.models.iter()
    }

    /// The initiating model
    pub fn leaf(&self) -> &Arc<RawModel> {
        // A chain always holds at least the starting model.
        &self.models[self.models.len() - 1]
    }

    pub fn root(&self) -> &Arc<RawModel> {
        &self.models[0]
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Ids root-first
    pub fn ids(&self) -> Vec<ModelId> {
        self.models.iter().map(|m| m.id()).collect()
    }
}

/// Chain resolution errors
#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    #[error("cycle detected in parent chain: {}", format_path(.path))]
    CycleDetected { path: Vec<ModelId> },

    #[error("model id {id} produced by two sources: {first} and {second}")]
    DuplicateModelId {
        id: ModelId,
        first: String,
        second: String,
    },

    #[error("parent {parent} of {child} not found")]
    ParentNotFound { child: ModelId, parent: ModelId },

    #[error("parent chain of {id} exceeds {max_depth} models")]
    ChainTooLong { id: ModelId, max_depth: usize },

    #[error("failed to load {id}: {source}")]
    Load {
        id: ModelId,
        #[source]
        source: LoadError,
    },
}

impl ChainError {
    /// Model the error is reported against
    pub fn model_id(&self) -> Option<&ModelId> {
        match self {
            ChainError::CycleDetected { path } => path.last(),
            ChainError::DuplicateModelId { id, .. } => Some(id),
            ChainError::ParentNotFound { child, .. } => Some(child),
            ChainError::ChainTooLong { id, .. } => Some(id),
            ChainError::Load { id, .. } => Some(id),
        }
    }
}

fn format_path(path: &[ModelId]) -> String {
    path.iter()
        .map(ModelId::as_str)
        .collect::<Vec<_>>()
        .join(" -> ")
}

struct Visited {
    id: ModelId,
    location: Option<PathBuf>,
}

/// Resolves parent chains against a model source
pub struct ChainResolver<'a> {
    source: &'a dyn ModelSource,
    max_depth: usize,
    default_relative_path: String,
}

impl<'a> ChainResolver<'a> {
    pub fn new(source: &'a dyn ModelSource) -> Self {
        Self {
            source,
            max_depth: DEFAULT_MAX_CHAIN_DEPTH,
            default_relative_path: DEFAULT_RELATIVE_PATH.to_string(),
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_default_relative_path(mut self, path: impl Into<String>) -> Self {
        self.default_relative_path = path.into();
        self
    }

    /// Resolve the chain ending at `start`
    pub fn resolve(&self, start: Arc<RawModel>) -> Result<Chain, ChainError> {
        let mut visited = vec![Visited {
            id: start.id(),
            location: start.location.clone(),
        }];
        let mut models = vec![start];

        loop {
            let current = &models[models.len() - 1];
            let Some(parent_ref) = current.parent.as_ref() else {
                break;
            };

            let parent = self.lookup_parent(current, parent_ref)?;
            let id = parent.id();

            if let Some(pos) = visited.iter().position(|v| v.id == id) {
                let seen = &visited[pos];
                if seen.location == parent.location {
                    let mut path: Vec<ModelId> = visited.iter().map(|v| v.id.clone()).collect();
                    path.push(id);
                    return Err(ChainError::CycleDetected { path });
                }
                return Err(ChainError::DuplicateModelId {
                    id,
                    first: describe_location(seen.location.as_deref()),
                    second: describe_location(parent.location.as_deref()),
                });
            }

            if models.len() >= self.max_depth {
                return Err(ChainError::ChainTooLong {
                    id: visited[0].id.clone(),
                    max_depth: self.max_depth,
                });
            }

            debug!(child = %visited[visited.len() - 1].id, parent = %id, "resolved parent");
            visited.push(Visited {
                id,
                location: parent.location.clone(),
            });
            models.push(parent);
        }

        models.reverse();
        Ok(Chain { models })
    }

    fn lookup_parent(&self, child: &RawModel, parent_ref: &ParentRef) -> Result<Arc<RawModel>, ChainError> {
        let parent_id = parent_ref.id();

        if let Some(location) = self.relative_location(child, parent_ref) {
            match self.source.load_by_location(&location) {
                Ok(model) if model.satisfies(parent_ref) => return Ok(model),
                Ok(model) => {
                    debug!(
                        location = %location.display(),
                        found = %model.id(),
                        expected = %parent_id,
                        "model at relative location does not match parent reference"
                    );
                }
                Err(err) if err.is_not_found() => {}
                Err(source) => {
                    return Err(ChainError::Load {
                        id: parent_id,
                        source,
                    })
                }
            }
        }

        match self.source.load_by_id(parent_ref) {
            Ok(model) => Ok(model),
            Err(err) if err.is_not_found() => Err(ChainError::ParentNotFound {
                child: child.id(),
                parent: parent_id,
            }),
            Err(source) => Err(ChainError::Load {
                id: parent_id,
                source,
            }),
        }
    }

    fn relative_location(&self, child: &RawModel, parent_ref: &ParentRef) -> Option<PathBuf> {
        let relative = parent_ref.relative_path_or(&self.default_relative_path)?;
        let basedir = child.basedir()?;

        let mut location = basedir.join(relative);
        if location.extension().is_none() {
            location.push(DEFAULT_MODEL_FILE);
        }
        Some(normalize_path(&location))
    }
}

fn describe_location(location: Option<&Path>) -> String {
    location
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "<memory>".to_string())
}

/// Lexically normalize a path, folding `.` and `..` without touching the
/// filesystem.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let can_pop = matches!(out.components().next_back(), Some(Component::Normal(_)));
                if can_pop {
                    out.pop();
                } else if !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
