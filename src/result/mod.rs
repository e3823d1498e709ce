//! Model building result container
//!
//! Receives the outputs of one build: the effective model, the ordered
//! model ids, and raw models and active profiles keyed by id.

use pom_model::{ModelId, Profile, RawModel};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::builder::EffectiveModel;

/// Whether associations must name an id already added to the container
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdValidation {
    /// Any non-empty id is accepted
    #[default]
    Off,
    /// Raw models and profiles may only be attached to known ids
    Enforce,
}

impl std::str::FromStr for IdValidation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "off" => Ok(IdValidation::Off),
            "enforce" => Ok(IdValidation::Enforce),
            _ => Err(format!("unknown id validation mode: {}", s)),
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ResultError {
    #[error("no model identifier specified")]
    EmptyModelId,

    #[error("model identifier {0} has not been added to the result")]
    UnknownModelId(ModelId),
}

/// Write side of a build result.
///
/// Setters overwrite; sequences are copied before they are retained.
pub trait ResultContainer {
    fn set_effective_model(&mut self, model: EffectiveModel) -> Result<(), ResultError>;

    /// Append an id; duplicates are kept
    fn add_model_id(&mut self, id: ModelId) -> Result<(), ResultError>;

    fn set_raw_model(&mut self, id: ModelId, model: Arc<RawModel>) -> Result<(), ResultError>;

    /// Associate active profiles with an id; `None` removes the association
    fn set_active_pom_profiles(&mut self, id: ModelId, profiles: Option<&[Profile]>) -> Result<(), ResultError>;

    /// Replace the external profile list; `None` clears it
    fn set_active_external_profiles(&mut self, profiles: Option<&[Profile]>) -> Result<(), ResultError>;
}

/// In-memory result container
#[derive(Debug, Clone, Default)]
pub struct ModelBuildingResult {
    effective_model: Option<EffectiveModel>,
    model_ids: Vec<ModelId>,
    raw_models: HashMap<ModelId, Arc<RawModel>>,
    active_pom_profiles: HashMap<ModelId, Vec<Profile>>,
    active_external_profiles: Vec<Profile>,
    id_validation: IdValidation,
}

impl ModelBuildingResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id_validation(id_validation: IdValidation) -> Self {
        Self {
            id_validation,
            ..Self::default()
        }
    }

    pub fn effective_model(&self) -> Option<&EffectiveModel> {
        self.effective_model.as_ref()
    }

    pub fn model_ids(&self) -> &[ModelId] {
        &self.model_ids
    }

    /// Raw model of the first id added, the initiating model of a build
    pub fn raw_model(&self) -> Option<&Arc<RawModel>> {
        self.model_ids.first().and_then(|id| self.raw_models.get(id))
    }

    pub fn raw_model_by_id(&self, id: &str) -> Option<&Arc<RawModel>> {
        self.raw_models.get(id)
    }

    pub fn active_pom_profiles(&self, id: &str) -> Option<&[Profile]> {
        self.active_pom_profiles.get(id).map(Vec::as_slice)
    }

    pub fn active_external_profiles(&self) -> &[Profile] {
        &self.active_external_profiles
    }

    fn check_id(&self, id: &ModelId) -> Result<(), ResultError> {
        if id.is_empty() {
            return Err(ResultError::EmptyModelId);
        }
        if self.id_validation == IdValidation::Enforce && !self.model_ids.contains(id) {
            return Err(ResultError::UnknownModelId(id.clone()));
        }
        Ok(())
    }
}

impl ResultContainer for ModelBuildingResult {
    fn set_effective_model(&mut self, model: EffectiveModel) -> Result<(), ResultError> {
        self.effective_model = Some(model);
        Ok(())
    }

    fn add_model_id(&mut self, id: ModelId) -> Result<(), ResultError> {
        if id.is_empty() {
            return Err(ResultError::EmptyModelId);
        }
        self.model_ids.push(id);
        Ok(())
    }

    fn set_raw_model(&mut self, id: ModelId, model: Arc<RawModel>) -> Result<(), ResultError> {
        self.check_id(&id)?;
        self.raw_models.insert(id, model);
        Ok(())
    }

    fn set_active_pom_profiles(&mut self, id: ModelId, profiles: Option<&[Profile]>) -> Result<(), ResultError> {
        self.check_id(&id)?;
        match profiles {
            Some(profiles) => {
                self.active_pom_profiles.insert(id, profiles.to_vec());
            }
            None => {
                self.active_pom_profiles.remove(&id);
            }
        }
        Ok(())
    }

    fn set_active_external_profiles(&mut self, profiles: Option<&[Profile]>) -> Result<(), ResultError> {
        self.active_external_profiles.clear();
        if let Some(profiles) = profiles {
            self.active_external_profiles.extend_from_slice(profiles);
        }
        Ok(())
    }
}
