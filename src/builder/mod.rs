//! Effective model builder
//!
//! Sequences one build: resolve chain → merge → activate profiles →
//! interpolate → validate. Each stage is a method on [`BuildSession`] so a
//! caller can stop between stages; [`ModelBuilder::build`] runs them all.

mod error;
mod outcome;
mod state;

pub use error::{BuildError, BuildFailure, BuildStage};
pub use outcome::{BuildOutcome, BuildSummary, EffectiveModel, SUMMARY_SCHEMA_ID};
pub use state::{BuildState, BuildStateError};

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use pom_interpolation::Interpolator;
use pom_model::{ModelId, ModelStructureError, ModelTree, Profile, RawModel};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::chain::{Chain, ChainResolver};
use crate::config::{BuilderConfig, BuilderSettings};
use crate::context::{ModelValueSource, PropertyContext, PropertyLayer};
use crate::merge::{inject_profiles, merge_chain};
use crate::profile::{ActivatedProfiles, ActivationEnvironment, ProfileActivator, SystemEnvironment};
use crate::result::ModelBuildingResult;
use crate::source::ModelSource;

/// Result alias for build operations
pub type BuildResult<T> = Result<T, BuildFailure>;

/// Generate a new build id using ULID (sortable, filesystem-safe)
pub fn generate_build_id() -> String {
    ulid::Ulid::new().to_string().to_lowercase()
}

/// Input of one build
#[derive(Debug, Clone)]
pub struct BuildRequest {
    /// The initiating raw model
    pub model: Arc<RawModel>,

    /// Profiles supplied from outside the chain; always active
    pub external_profiles: Vec<Profile>,
}

impl BuildRequest {
    pub fn new(model: impl Into<Arc<RawModel>>) -> Self {
        Self {
            model: model.into(),
            external_profiles: Vec::new(),
        }
    }

    pub fn with_external_profile(mut self, profile: Profile) -> Self {
        self.external_profiles.push(profile);
        self
    }
}

/// Builds effective models.
///
/// Holds no per-build state; one builder can serve concurrent builds.
pub struct ModelBuilder {
    settings: BuilderSettings,
    source: Arc<dyn ModelSource>,
    environment: Arc<dyn ActivationEnvironment>,
}

impl ModelBuilder {
    /// Builder with default settings and the process environment
    pub fn new(source: Arc<dyn ModelSource>) -> Self {
        Self::with_settings(BuilderSettings::default(), source)
    }

    pub fn with_settings(settings: BuilderSettings, source: Arc<dyn ModelSource>) -> Self {
        let environment = Arc::new(SystemEnvironment::new(settings.properties.system.clone()));
        Self {
            settings,
            source,
            environment,
        }
    }

    pub fn from_config(config: &BuilderConfig, source: Arc<dyn ModelSource>) -> Self {
        Self::with_settings(config.settings.clone(), source)
    }

    /// Load layered configuration for `project_dir` and build from it
    pub fn discover(
        project_dir: &Path,
        overrides: Option<serde_json::Value>,
        source: Arc<dyn ModelSource>,
    ) -> Result<Self, BuildError> {
        let config = BuilderConfig::discover(project_dir, overrides)?;
        Ok(Self::from_config(&config, source))
    }

    /// Replace the activation environment
    pub fn with_environment(mut self, environment: Arc<dyn ActivationEnvironment>) -> Self {
        self.environment = environment;
        self
    }

    pub fn settings(&self) -> &BuilderSettings {
        &self.settings
    }

    /// Empty result container honouring `result.id_validation`
    pub fn new_result(&self) -> ModelBuildingResult {
        ModelBuildingResult::with_id_validation(self.settings.result.id_validation)
    }

    /// Start a staged build
    pub fn session(&self, request: BuildRequest) -> BuildSession<'_> {
        BuildSession::new(self, request)
    }

    /// Run every stage
    pub fn build(&self, request: BuildRequest) -> BuildResult<BuildOutcome> {
        let mut session = self.session(request);
        session.resolve_chain()?;
        session.merge()?;
        session.activate_profiles()?;
        session.interpolate()?;
        session.finish()
    }
}

/// One build in progress
pub struct BuildSession<'b> {
    builder: &'b ModelBuilder,
    request: BuildRequest,
    build_id: String,
    started_at: DateTime<Utc>,
    state: BuildState,
    chain: Option<Chain>,
    base: Option<ModelTree>,
    activated: Option<ActivatedProfiles>,
    working: Option<ModelTree>,
    warnings: Vec<String>,
}

impl<'b> BuildSession<'b> {
    fn new(builder: &'b ModelBuilder, request: BuildRequest) -> Self {
        let build_id = generate_build_id();
        info!(build_id = %build_id, model = %request.model.id(), "starting model build");
        Self {
            builder,
            request,
            build_id,
            started_at: Utc::now(),
            state: BuildState::Idle,
            chain: None,
            base: None,
            activated: None,
            working: None,
            warnings: Vec::new(),
        }
    }

    pub fn build_id(&self) -> &str {
        &self.build_id
    }

    pub fn state(&self) -> BuildState {
        self.state
    }

    pub fn chain(&self) -> Option<&Chain> {
        self.chain.as_ref()
    }

    /// Working tree of the latest completed stage
    pub fn tree(&self) -> Option<&ModelTree> {
        self.working.as_ref().or(self.base.as_ref())
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// IDLE → CHAIN_RESOLVED
    pub fn resolve_chain(&mut self) -> BuildResult<()> {
        let stage = BuildStage::ChainResolution;
        self.require_transition(stage, BuildState::ChainResolved)?;

        let settings = &self.builder.settings.chain;
        let resolver = ChainResolver::new(self.builder.source.as_ref())
            .with_max_depth(settings.max_depth)
            .with_default_relative_path(settings.default_relative_path.clone());

        match resolver.resolve(Arc::clone(&self.request.model)) {
            Ok(chain) => {
                debug!(build_id = %self.build_id, models = chain.len(), "chain resolved");
                self.chain = Some(chain);
                self.advance(BuildState::ChainResolved);
                Ok(())
            }
            Err(err) => {
                let model_id = err.model_id().cloned();
                Err(self.fail(stage, model_id, None, err.into()))
            }
        }
    }

    /// CHAIN_RESOLVED → MERGED
    pub fn merge(&mut self) -> BuildResult<()> {
        let stage = BuildStage::Merge;
        self.require_transition(stage, BuildState::Merged)?;
        let chain = self.chain.as_ref().ok_or_else(|| self.missing(stage))?;

        match merge_chain(chain) {
            Ok(tree) => {
                debug!(build_id = %self.build_id, "chain merged");
                self.base = Some(tree);
                self.advance(BuildState::Merged);
                Ok(())
            }
            Err(err) => {
                let model_id = Some(err.model_id().clone());
                Err(self.fail(stage, model_id, None, err.into()))
            }
        }
    }

    /// MERGED → PROFILES_ACTIVATED; active fragments are injected here
    pub fn activate_profiles(&mut self) -> BuildResult<()> {
        let stage = BuildStage::ProfileActivation;
        self.require_transition(stage, BuildState::ProfilesActivated)?;
        if let Err((profile_id, source)) = validate_external(&self.request.external_profiles) {
            let id = self.request.model.id();
            return Err(self.fail(
                stage,
                Some(id.clone()),
                Some(profile_id),
                BuildError::InvalidModelStructure { id, source },
            ));
        }

        let chain = self.chain.as_ref().ok_or_else(|| self.missing(stage))?;
        let base = self.base.as_ref().ok_or_else(|| self.missing(stage))?;

        let settings = &self.builder.settings;
        let activator = ProfileActivator::new(self.builder.environment.as_ref())
            .with_user_properties(settings.properties.user.clone())
            .with_explicit(settings.profiles.active.clone(), settings.profiles.inactive.clone());

        match activator.activate(chain, &self.request.external_profiles) {
            Ok(activated) => {
                let mut working = base.clone();
                inject_profiles(&mut working, activated.ordered());
                debug!(build_id = %self.build_id, profiles = ?activated.ids(), "profiles activated");

                self.warnings.extend(activated.warnings.iter().cloned());
                self.working = Some(working);
                self.activated = Some(activated);
                self.advance(BuildState::ProfilesActivated);
                Ok(())
            }
            Err(err) => {
                let model_id = Some(err.model_id().clone());
                let profile_id = Some(err.profile_id().to_string());
                Err(self.fail(stage, model_id, profile_id, err.into()))
            }
        }
    }

    /// PROFILES_ACTIVATED → INTERPOLATED
    pub fn interpolate(&mut self) -> BuildResult<()> {
        let stage = BuildStage::Interpolation;
        self.require_transition(stage, BuildState::Interpolated)?;

        match self.run_interpolation() {
            Ok((tree, changed, unresolved)) => {
                debug!(build_id = %self.build_id, changed, "interpolated model");
                for placeholder in unresolved {
                    warn!(build_id = %self.build_id, %placeholder, "placeholder left unresolved");
                    self.warnings.push(placeholder.to_string());
                }
                self.working = Some(tree);
                self.advance(BuildState::Interpolated);
                Ok(())
            }
            Err(err) => {
                let model_id = Some(self.request.model.id());
                Err(self.fail(stage, model_id, None, err))
            }
        }
    }

    /// INTERPOLATED → DONE
    pub fn finish(mut self) -> BuildResult<BuildOutcome> {
        let stage = BuildStage::Validation;
        self.require_transition(stage, BuildState::Done)?;

        let tree = match self.working.take() {
            Some(tree) => tree,
            None => return Err(self.missing(stage)),
        };
        if let Err(err) = validate_required(&tree) {
            let id = self.request.model.id();
            return Err(self.fail(
                stage,
                Some(id.clone()),
                None,
                BuildError::InvalidModelStructure { id, source: err },
            ));
        }

        let effective_model = match EffectiveModel::new(tree) {
            Ok(model) => model,
            Err(err) => return Err(self.fail(stage, Some(self.request.model.id()), None, err)),
        };

        let (raw_models, active_pom_profiles, active_external_profiles) = self.collect_outputs();
        self.advance(BuildState::Done);

        let outcome = BuildOutcome {
            build_id: self.build_id,
            started_at: self.started_at,
            finished_at: Utc::now(),
            effective_model,
            raw_models,
            active_pom_profiles,
            active_external_profiles,
            warnings: self.warnings,
        };
        info!(
            build_id = %outcome.build_id,
            model = %outcome.effective_model.id,
            digest = %outcome.effective_model.digest,
            "model build done"
        );
        Ok(outcome)
    }

    #[allow(clippy::type_complexity)]
    fn collect_outputs(
        &self,
    ) -> (
        Vec<(ModelId, Arc<RawModel>)>,
        Vec<(ModelId, Vec<Profile>)>,
        Vec<Profile>,
    ) {
        let raw_models = self
            .chain
            .iter()
            .flat_map(|chain| chain.models().iter().rev())
            .map(|model| (model.id(), Arc::clone(model)))
            .collect();

        let (active_pom_profiles, external) = match &self.activated {
            Some(activated) => (
                activated
                    .per_model
                    .iter()
                    .rev()
                    .map(|m| (m.id.clone(), m.profiles.clone()))
                    .collect(),
                activated.external.clone(),
            ),
            None => (Vec::new(), Vec::new()),
        };

        (raw_models, active_pom_profiles, external)
    }

    fn run_interpolation(&self) -> Result<(ModelTree, usize, Vec<pom_interpolation::UnresolvedPlaceholder>), BuildError> {
        let working = self
            .working
            .as_ref()
            .ok_or(BuildStateError::InvalidTransition {
                from: self.state,
                to: BuildState::Interpolated,
            })?;
        let base = self.base.as_ref().ok_or(BuildStateError::InvalidTransition {
            from: self.state,
            to: BuildState::Interpolated,
        })?;

        let mut value = serde_json::to_value(working)?;
        let leaf = &self.request.model;
        let self_source = ModelValueSource::new(&value, leaf.parent.as_ref(), leaf.basedir());
        let context = self.property_context(base);

        let mut interpolator = Interpolator::new(self.builder.settings.interpolation)
            .with_source(&self_source)
            .with_source(&context);
        let changed = interpolator.interpolate_value(&mut value)?;
        let unresolved = interpolator.take_unresolved();

        let tree: ModelTree = serde_json::from_value(value)?;
        Ok((tree, changed, unresolved))
    }

    fn property_context(&self, base: &ModelTree) -> PropertyContext {
        let mut profile_props = IndexMap::new();
        if let Some(activated) = &self.activated {
            for profile in activated.ordered() {
                for (key, value) in &profile.tree.properties {
                    profile_props.insert(key.clone(), value.clone());
                }
            }
        }

        PropertyContext::new()
            .with_layer(PropertyLayer::System, self.builder.environment.system_properties())
            .with_layer(PropertyLayer::Model, base.properties.clone())
            .with_layer(PropertyLayer::Profile, profile_props)
            .with_layer(PropertyLayer::User, self.builder.settings.properties.user.clone())
    }

    fn require_transition(&self, stage: BuildStage, next: BuildState) -> BuildResult<()> {
        if self.state.can_transition_to(next) {
            return Ok(());
        }
        let err = BuildStateError::InvalidTransition {
            from: self.state,
            to: next,
        };
        Err(self.failure(stage, None, None, err.into()))
    }

    fn advance(&mut self, next: BuildState) {
        debug!(build_id = %self.build_id, from = %self.state, to = %next, "build state transition");
        self.state = next;
    }

    fn missing(&self, stage: BuildStage) -> BuildFailure {
        let err = BuildStateError::InvalidTransition {
            from: self.state,
            to: BuildState::Failed,
        };
        self.failure(stage, None, None, err.into())
    }

    /// Record the failure and move to FAILED
    fn fail(
        &mut self,
        stage: BuildStage,
        model_id: Option<ModelId>,
        profile_id: Option<String>,
        error: BuildError,
    ) -> BuildFailure {
        error!(build_id = %self.build_id, %stage, code = error.code(), error = %error, "model build failed");
        if self.state.can_transition_to(BuildState::Failed) {
            self.state = BuildState::Failed;
        }
        self.failure(stage, model_id, profile_id, error)
    }

    fn failure(
        &self,
        stage: BuildStage,
        model_id: Option<ModelId>,
        profile_id: Option<String>,
        error: BuildError,
    ) -> BuildFailure {
        BuildFailure {
            build_id: self.build_id.clone(),
            stage,
            model_id,
            profile_id,
            error,
        }
    }
}

/// External fragments get the same structural checks as pom profiles
fn validate_external(profiles: &[Profile]) -> Result<(), (String, ModelStructureError)> {
    for (i, profile) in profiles.iter().enumerate() {
        if profile.id.trim().is_empty() {
            let err = ModelStructureError::new(format!("externalProfiles[{}].id", i), "is missing");
            return Err((profile.id.clone(), err));
        }
        profile
            .tree
            .validate(&format!("externalProfiles[{}]", profile.id))
            .map_err(|err| (profile.id.clone(), err))?;
    }
    Ok(())
}

/// Required coordinates must be present after interpolation; nothing is
/// defaulted
fn validate_required(tree: &ModelTree) -> Result<(), ModelStructureError> {
    let fields = [
        ("groupId", &tree.group_id),
        ("artifactId", &tree.artifact_id),
        ("version", &tree.version),
    ];
    for (name, value) in fields {
        match value.as_deref() {
            Some(v) if !v.trim().is_empty() => {}
            _ => return Err(ModelStructureError::new(name, "missing required field")),
        }
    }
    Ok(())
}
