//! Model inheritance merging
//!
//! Merge semantics (child over parent):
//! - Scalars: child wins when declared
//! - Keyed lists: parent entries first, same key merges recursively,
//!   child-only entries appended
//! - Maps: union, child shadows parent
//! - Non-inheritable fields are never carried from the parent

use indexmap::IndexMap;
use pom_model::{
    Build, Dependency, Keyed, ModelId, ModelStructureError, ModelTree, Plugin, Profile, Repository,
};
use std::collections::HashMap;
use tracing::debug;

use crate::chain::Chain;

/// How a fragment is laid over an accumulated tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeMode {
    /// Child model over its parent: `artifactId`, `modules` and plugins
    /// marked `inherited = false` stay behind
    Inheritance,

    /// Active profile over the working model: every field merges
    Injection,
}

/// Structural merge of a child fragment onto `self`
pub trait Overlay {
    fn overlay(&mut self, child: &Self, mode: MergeMode);
}

#[derive(Debug, thiserror::Error)]
pub enum MergeError {
    #[error("invalid model structure in {id}: {source}")]
    InvalidModelStructure {
        id: ModelId,
        #[source]
        source: ModelStructureError,
    },
}

impl MergeError {
    pub fn model_id(&self) -> &ModelId {
        match self {
            MergeError::InvalidModelStructure { id, .. } => id,
        }
    }
}

fn merge_scalar<T: Clone>(target: &mut Option<T>, child: &Option<T>) {
    if child.is_some() {
        target.clone_from(child);
    }
}

fn merge_map(target: &mut IndexMap<String, String>, child: &IndexMap<String, String>) {
    for (key, value) in child {
        target.insert(key.clone(), value.clone());
    }
}

/// Merge a keyed list in place, keeping parent order
pub fn merge_keyed<T>(target: &mut Vec<T>, child: &[T], mode: MergeMode)
where
    T: Keyed + Overlay + Clone,
{
    let mut index: HashMap<String, usize> = target
        .iter()
        .enumerate()
        .map(|(i, entry)| (entry.merge_key(), i))
        .collect();

    for entry in child {
        let key = entry.merge_key();
        match index.get(&key) {
            Some(&pos) => target[pos].overlay(entry, mode),
            None => {
                index.insert(key, target.len());
                target.push(entry.clone());
            }
        }
    }
}

impl Overlay for ModelTree {
    fn overlay(&mut self, child: &Self, mode: MergeMode) {
        merge_scalar(&mut self.group_id, &child.group_id);
        merge_scalar(&mut self.version, &child.version);
        merge_scalar(&mut self.packaging, &child.packaging);
        merge_scalar(&mut self.name, &child.name);
        merge_scalar(&mut self.description, &child.description);
        merge_scalar(&mut self.url, &child.url);
        merge_scalar(&mut self.inception_year, &child.inception_year);

        merge_map(&mut self.properties, &child.properties);
        merge_keyed(&mut self.dependencies, &child.dependencies, mode);
        merge_keyed(&mut self.dependency_management, &child.dependency_management, mode);
        merge_keyed(&mut self.repositories, &child.repositories, mode);

        match mode {
            MergeMode::Inheritance => {
                self.artifact_id.clone_from(&child.artifact_id);
                self.modules.clone_from(&child.modules);
                if let Some(build) = self.build.as_mut() {
                    build.plugins.retain(Plugin::is_inherited);
                }
            }
            MergeMode::Injection => {
                merge_scalar(&mut self.artifact_id, &child.artifact_id);
                for module in &child.modules {
                    if !self.modules.contains(module) {
                        self.modules.push(module.clone());
                    }
                }
            }
        }

        if let Some(child_build) = &child.build {
            self.build
                .get_or_insert_with(Build::default)
                .overlay(child_build, mode);
        }
    }
}

impl Overlay for Dependency {
    fn overlay(&mut self, child: &Self, _mode: MergeMode) {
        merge_scalar(&mut self.group_id, &child.group_id);
        merge_scalar(&mut self.artifact_id, &child.artifact_id);
        merge_scalar(&mut self.version, &child.version);
        merge_scalar(&mut self.kind, &child.kind);
        merge_scalar(&mut self.classifier, &child.classifier);
        merge_scalar(&mut self.scope, &child.scope);
        merge_scalar(&mut self.optional, &child.optional);
    }
}

impl Overlay for Build {
    fn overlay(&mut self, child: &Self, mode: MergeMode) {
        merge_scalar(&mut self.final_name, &child.final_name);
        merge_scalar(&mut self.directory, &child.directory);
        merge_scalar(&mut self.source_directory, &child.source_directory);
        merge_keyed(&mut self.plugins, &child.plugins, mode);
    }
}

impl Overlay for Plugin {
    fn overlay(&mut self, child: &Self, _mode: MergeMode) {
        merge_scalar(&mut self.group_id, &child.group_id);
        merge_scalar(&mut self.artifact_id, &child.artifact_id);
        merge_scalar(&mut self.version, &child.version);
        merge_scalar(&mut self.inherited, &child.inherited);
        merge_map(&mut self.configuration, &child.configuration);
    }
}

impl Overlay for Repository {
    fn overlay(&mut self, child: &Self, _mode: MergeMode) {
        merge_scalar(&mut self.id, &child.id);
        merge_scalar(&mut self.name, &child.name);
        merge_scalar(&mut self.url, &child.url);
    }
}

/// Fold a chain root-first into one tree.
///
/// Every raw model is validated before it contributes.
pub fn merge_chain(chain: &Chain) -> Result<ModelTree, MergeError> {
    let mut merged: Option<ModelTree> = None;

    for model in chain.iter() {
        model
            .validate()
            .map_err(|source| MergeError::InvalidModelStructure {
                id: model.id(),
                source,
            })?;

        match merged.as_mut() {
            None => merged = Some(model.tree.clone()),
            Some(acc) => {
                debug!(model = %model.id(), "merging child model");
                acc.overlay(&model.tree, MergeMode::Inheritance);
            }
        }
    }

    Ok(merged.unwrap_or_default())
}

/// Inject active profile fragments in activation order
pub fn inject_profiles<'p>(tree: &mut ModelTree, profiles: impl IntoIterator<Item = &'p Profile>) {
    for profile in profiles {
        debug!(profile = %profile.id, "injecting profile");
        tree.overlay(&profile.tree, MergeMode::Injection);
    }
}
