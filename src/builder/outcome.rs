//! Build outputs

use chrono::{DateTime, Utc};
use pom_model::{ModelId, ModelTree, Profile, RawModel};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::Arc;

use super::error::BuildError;
use crate::result::{ResultContainer, ResultError};

/// Schema identifier for build summaries
pub const SUMMARY_SCHEMA_ID: &str = "pom-builder/build_summary@1";

/// The fully merged, fully interpolated model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectiveModel {
    pub id: ModelId,

    pub tree: ModelTree,

    /// SHA-256 over the RFC 8785 canonical JSON of `tree`
    pub digest: String,
}

impl EffectiveModel {
    pub fn new(tree: ModelTree) -> Result<Self, BuildError> {
        let id = ModelId::from_parts(
            tree.group_id.as_deref(),
            tree.artifact_id.as_deref(),
            tree.version.as_deref(),
        );
        let digest = Self::compute_digest(&tree)?;
        Ok(Self { id, tree, digest })
    }

    /// SHA-256 hex digest of JCS(tree)
    pub fn compute_digest(tree: &ModelTree) -> Result<String, BuildError> {
        let jcs_bytes = serde_json_canonicalizer::to_vec(tree)
            .map_err(|e| BuildError::Digest(e.to_string()))?;

        let mut hasher = Sha256::new();
        hasher.update(&jcs_bytes);
        Ok(hex::encode(hasher.finalize()))
    }
}

/// Everything a successful build produced
#[derive(Debug, Clone)]
pub struct BuildOutcome {
    pub build_id: String,

    pub started_at: DateTime<Utc>,

    pub finished_at: DateTime<Utc>,

    pub effective_model: EffectiveModel,

    /// Raw models, initiating model first
    pub raw_models: Vec<(ModelId, Arc<RawModel>)>,

    /// Active profiles per chain model, same order as `raw_models`
    pub active_pom_profiles: Vec<(ModelId, Vec<Profile>)>,

    pub active_external_profiles: Vec<Profile>,

    /// Lenient-mode diagnostics
    pub warnings: Vec<String>,
}

impl BuildOutcome {
    /// Model ids, initiating model first
    pub fn model_ids(&self) -> Vec<&ModelId> {
        self.raw_models.iter().map(|(id, _)| id).collect()
    }

    /// Write the outcome into a result container
    pub fn publish(&self, container: &mut dyn ResultContainer) -> Result<(), ResultError> {
        container.set_effective_model(self.effective_model.clone())?;

        for (id, raw) in &self.raw_models {
            container.add_model_id(id.clone())?;
            container.set_raw_model(id.clone(), Arc::clone(raw))?;
        }

        for (id, profiles) in &self.active_pom_profiles {
            container.set_active_pom_profiles(id.clone(), Some(profiles.as_slice()))?;
        }

        container.set_active_external_profiles(Some(self.active_external_profiles.as_slice()))
    }

    pub fn summary(&self) -> BuildSummary {
        BuildSummary {
            schema_id: SUMMARY_SCHEMA_ID.to_string(),
            build_id: self.build_id.clone(),
            model_id: self.effective_model.id.clone(),
            digest: self.effective_model.digest.clone(),
            model_ids: self.raw_models.iter().map(|(id, _)| id.clone()).collect(),
            active_profiles: self
                .active_pom_profiles
                .iter()
                .flat_map(|(_, profiles)| profiles.iter())
                .chain(self.active_external_profiles.iter())
                .map(|p| p.id.clone())
                .collect(),
            warnings: self.warnings.clone(),
            started_at: self.started_at,
            finished_at: self.finished_at,
            duration_ms: (self.finished_at - self.started_at).num_milliseconds().max(0) as u64,
        }
    }
}

/// Serializable record of a finished build
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildSummary {
    pub schema_id: String,
    pub build_id: String,
    pub model_id: ModelId,
    pub digest: String,
    pub model_ids: Vec<ModelId>,
    pub active_profiles: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub duration_ms: u64,
}

impl BuildSummary {
    /// Serialize to JSON (pretty printed)
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
