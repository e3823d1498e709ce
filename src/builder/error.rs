//! Build errors and failure reports

use pom_interpolation::InterpolationError;
use pom_model::{ModelId, ModelStructureError};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::state::BuildStateError;
use crate::chain::ChainError;
use crate::config::ConfigError;
use crate::merge::MergeError;
use crate::profile::ActivationError;
use crate::result::ResultError;

/// Stage a build was in when it failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildStage {
    Config,
    ChainResolution,
    Merge,
    ProfileActivation,
    Interpolation,
    Validation,
    Publish,
}

impl BuildStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            BuildStage::Config => "config",
            BuildStage::ChainResolution => "chain_resolution",
            BuildStage::Merge => "merge",
            BuildStage::ProfileActivation => "profile_activation",
            BuildStage::Interpolation => "interpolation",
            BuildStage::Validation => "validation",
            BuildStage::Publish => "publish",
        }
    }
}

impl fmt::Display for BuildStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that abort a build
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Chain(#[from] ChainError),

    #[error(transparent)]
    Merge(#[from] MergeError),

    #[error(transparent)]
    Activation(#[from] ActivationError),

    #[error("interpolation failed: {0}")]
    Interpolation(#[from] InterpolationError),

    #[error("invalid model structure in {id}: {source}")]
    InvalidModelStructure {
        id: ModelId,
        #[source]
        source: ModelStructureError,
    },

    #[error("result container rejected output: {0}")]
    Result(#[from] ResultError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("digest error: {0}")]
    Digest(String),

    #[error("state error: {0}")]
    State(#[from] BuildStateError),
}

impl BuildError {
    /// Stable error code
    pub fn code(&self) -> &'static str {
        match self {
            BuildError::Config(_) => "CONFIG_ERROR",
            BuildError::Chain(ChainError::CycleDetected { .. }) => "CYCLE_DETECTED",
            BuildError::Chain(ChainError::DuplicateModelId { .. }) => "DUPLICATE_MODEL_ID",
            BuildError::Chain(ChainError::ParentNotFound { .. }) => "PARENT_NOT_FOUND",
            BuildError::Chain(ChainError::ChainTooLong { .. }) => "CHAIN_TOO_LONG",
            BuildError::Chain(ChainError::Load { .. }) => "LOAD_ERROR",
            BuildError::Merge(MergeError::InvalidModelStructure { .. }) => "INVALID_MODEL_STRUCTURE",
            BuildError::InvalidModelStructure { .. } => "INVALID_MODEL_STRUCTURE",
            BuildError::Activation(_) => "ACTIVATION_EVALUATION_ERROR",
            BuildError::Interpolation(err) => err.code(),
            BuildError::Result(_) => "RESULT_ERROR",
            BuildError::Serialization(_) | BuildError::Digest(_) => "SERIALIZATION_ERROR",
            BuildError::State(_) => "INVALID_STATE",
        }
    }
}

/// A failed build: where it stopped, what it was working on, and why
#[derive(Debug)]
pub struct BuildFailure {
    pub build_id: String,
    pub stage: BuildStage,
    pub model_id: Option<ModelId>,
    pub profile_id: Option<String>,
    pub error: BuildError,
}

impl BuildFailure {
    pub fn code(&self) -> &'static str {
        self.error.code()
    }
}

impl fmt::Display for BuildFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "model build failed during {}", self.stage)?;
        if let Some(id) = &self.model_id {
            write!(f, " for {}", id)?;
        }
        if let Some(profile) = &self.profile_id {
            write!(f, " (profile '{}')", profile)?;
        }
        write!(f, ": {}", self.error)
    }
}

impl std::error::Error for BuildFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}
