//! POM Builder - effective project model construction
//!
//! This crate turns a raw project model and its parent chain into a single
//! effective model: it resolves the chain, merges it under inheritance
//! rules, activates and injects profiles, and resolves `${...}`
//! placeholders. Results can be published into a result container.

pub mod builder;
pub mod chain;
pub mod config;
pub mod context;
pub mod merge;
pub mod profile;
pub mod result;
pub mod source;

pub use builder::{
    BuildError, BuildFailure, BuildOutcome, BuildRequest, BuildSession, BuildStage, BuildState,
    EffectiveModel, ModelBuilder,
};
pub use chain::{Chain, ChainError, ChainResolver};
pub use config::{BuilderConfig, BuilderSettings, ConfigError};
pub use context::{ModelValueSource, PropertyContext, PropertyLayer};
pub use merge::{MergeError, MergeMode, Overlay};
pub use profile::{
    ActivatedProfiles, ActivationEnvironment, ActivationError, OsDescriptor, ProfileActivator,
    StaticEnvironment, SystemEnvironment,
};
pub use result::{IdValidation, ModelBuildingResult, ResultContainer, ResultError};
pub use source::{InMemoryModelSource, LoadError, ModelSource};

pub use pom_interpolation::{InterpolationError, InterpolationMode, InterpolatorConfig};
pub use pom_model::{
    Activation, ActivationFile, ActivationOs, ActivationProperty, Build, Dependency, ModelId,
    ModelTree, ParentRef, Plugin, Profile, RawModel, Repository,
};
