//! Profile activation
//!
//! Evaluates activation predicates across a chain. Activation order is
//! root model first, declaration order within a model, then the externally
//! supplied profiles, which are always active.

use indexmap::IndexMap;
use pom_interpolation::{Interpolator, InterpolatorConfig};
use pom_model::{Activation, ActivationFile, ActivationOs, ActivationProperty, ModelId, Profile, RawModel};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::environment::ActivationEnvironment;
use crate::chain::{normalize_path, Chain};

/// Activation failures; all name the offending profile
#[derive(Debug, thiserror::Error)]
pub enum ActivationError {
    #[error("invalid activation of profile '{profile}' in {model}: {message}")]
    InvalidPredicate {
        model: ModelId,
        profile: String,
        message: String,
    },

    #[error("cannot resolve file path of profile '{profile}' in {model}: {source}")]
    FilePath {
        model: ModelId,
        profile: String,
        #[source]
        source: pom_interpolation::InterpolationError,
    },
}

impl ActivationError {
    pub fn model_id(&self) -> &ModelId {
        match self {
            ActivationError::InvalidPredicate { model, .. } => model,
            ActivationError::FilePath { model, .. } => model,
        }
    }

    pub fn profile_id(&self) -> &str {
        match self {
            ActivationError::InvalidPredicate { profile, .. } => profile,
            ActivationError::FilePath { profile, .. } => profile,
        }
    }
}

/// Profiles active for one chain model
#[derive(Debug, Clone)]
pub struct ModelProfiles {
    pub id: ModelId,
    pub profiles: Vec<Profile>,
}

/// Outcome of profile activation
#[derive(Debug, Clone, Default)]
pub struct ActivatedProfiles {
    /// Per chain model, root-first
    pub per_model: Vec<ModelProfiles>,

    /// Externally supplied profiles, in the order given
    pub external: Vec<Profile>,

    /// Non-fatal diagnostics (unknown explicit ids, unresolvable file paths)
    pub warnings: Vec<String>,
}

impl ActivatedProfiles {
    /// Every active profile in injection order
    pub fn ordered(&self) -> impl Iterator<Item = &Profile> {
        self.per_model
            .iter()
            .flat_map(|m| m.profiles.iter())
            .chain(self.external.iter())
    }

    /// Active profile ids in injection order
    pub fn ids(&self) -> Vec<&str> {
        self.ordered().map(|p| p.id.as_str()).collect()
    }

    pub fn for_model(&self, id: &ModelId) -> Option<&[Profile]> {
        self.per_model
            .iter()
            .find(|m| &m.id == id)
            .map(|m| m.profiles.as_slice())
    }
}

/// Decides which profiles apply to a chain
pub struct ProfileActivator<'a> {
    env: &'a dyn ActivationEnvironment,
    user_properties: IndexMap<String, String>,
    explicit_active: Vec<String>,
    explicit_inactive: Vec<String>,
}

impl<'a> ProfileActivator<'a> {
    pub fn new(env: &'a dyn ActivationEnvironment) -> Self {
        Self {
            env,
            user_properties: IndexMap::new(),
            explicit_active: Vec::new(),
            explicit_inactive: Vec::new(),
        }
    }

    /// User properties shadow environment properties in predicates
    pub fn with_user_properties(mut self, properties: IndexMap<String, String>) -> Self {
        self.user_properties = properties;
        self
    }

    pub fn with_explicit(mut self, active: Vec<String>, inactive: Vec<String>) -> Self {
        self.explicit_active = active;
        self.explicit_inactive = inactive;
        self
    }

    /// Activate profiles of every chain model plus the external ones
    pub fn activate(&self, chain: &Chain, external: &[Profile]) -> Result<ActivatedProfiles, ActivationError> {
        let mut result = ActivatedProfiles::default();
        let mut declared: HashSet<&str> = HashSet::new();

        for model in chain.iter() {
            declared.extend(model.profiles.iter().map(|p| p.id.as_str()));
            let profiles = self.activate_model(model, &mut result.warnings)?;
            result.per_model.push(ModelProfiles {
                id: model.id(),
                profiles,
            });
        }

        declared.extend(external.iter().map(|p| p.id.as_str()));
        for id in &self.explicit_active {
            if !declared.contains(id.as_str()) {
                let message = format!("requested profile '{}' is not declared", id);
                warn!(profile = %id, "{}", message);
                result.warnings.push(message);
            }
        }

        result.external = external.to_vec();
        Ok(result)
    }

    fn activate_model(&self, model: &RawModel, warnings: &mut Vec<String>) -> Result<Vec<Profile>, ActivationError> {
        let id = model.id();
        let mut active = Vec::new();
        let mut defaults = Vec::new();

        for profile in &model.profiles {
            if self.explicit_inactive.contains(&profile.id) {
                debug!(model = %id, profile = %profile.id, "profile deactivated explicitly");
                continue;
            }

            let matched = match &profile.activation {
                Some(activation) => self.evaluate(model, &id, profile, activation, warnings)?,
                None => false,
            };

            if matched || self.explicit_active.contains(&profile.id) {
                debug!(model = %id, profile = %profile.id, "profile activated");
                active.push(profile.clone());
            } else if profile.activation.as_ref().is_some_and(|a| a.active_by_default) {
                defaults.push(profile.clone());
            }
        }

        if active.is_empty() && !defaults.is_empty() {
            debug!(model = %id, count = defaults.len(), "activating default profiles");
            return Ok(defaults);
        }
        Ok(active)
    }

    fn evaluate(
        &self,
        model: &RawModel,
        id: &ModelId,
        profile: &Profile,
        activation: &Activation,
        warnings: &mut Vec<String>,
    ) -> Result<bool, ActivationError> {
        if !activation.has_conditions() {
            return Ok(false);
        }

        let invalid = |message: String| ActivationError::InvalidPredicate {
            model: id.clone(),
            profile: profile.id.clone(),
            message,
        };

        if let Some(property) = &activation.property {
            if !self.property_matches(property).map_err(invalid)? {
                return Ok(false);
            }
        }

        if let Some(os) = &activation.os {
            if !self.os_matches(os).map_err(invalid)? {
                return Ok(false);
            }
        }

        if let Some(file) = &activation.file {
            if !self.file_matches(model, id, profile, file, warnings)? {
                return Ok(false);
            }
        }

        Ok(true)
    }

    fn lookup(&self, name: &str) -> Option<String> {
        self.user_properties
            .get(name)
            .cloned()
            .or_else(|| self.env.property(name))
    }

    fn property_matches(&self, property: &ActivationProperty) -> Result<bool, String> {
        let (name, name_negated) = split_negation(property.name.trim());
        if name.is_empty() {
            return Err("property name is blank".to_string());
        }

        let actual = self.lookup(name);
        match property.value.as_deref() {
            None => Ok(actual.is_some() != name_negated),
            Some(_) if name_negated => Err(format!(
                "negated property '{}' cannot also declare a value",
                name
            )),
            Some(value) => {
                let (expected, value_negated) = split_negation(value);
                if value_negated && expected.is_empty() {
                    return Err(format!("property '{}' has an empty negated value", name));
                }
                Ok((actual.as_deref() == Some(expected)) != value_negated)
            }
        }
    }

    fn os_matches(&self, os: &ActivationOs) -> Result<bool, String> {
        let host = self.env.os();

        if let Some(family) = &os.family {
            let (family, negated) = checked_negation("os family", family)?;
            let is_family = host
                .is_family(family)
                .ok_or_else(|| format!("unknown os family '{}'", family))?;
            if is_family == negated {
                return Ok(false);
            }
        }

        let fields = [
            ("os name", &os.name, &host.name),
            ("os arch", &os.arch, &host.arch),
            ("os version", &os.version, &host.version),
        ];
        for (what, expected, actual) in fields {
            if let Some(expected) = expected {
                let (expected, negated) = checked_negation(what, expected)?;
                if expected.eq_ignore_ascii_case(actual) == negated {
                    return Ok(false);
                }
            }
        }

        Ok(true)
    }

    fn file_matches(
        &self,
        model: &RawModel,
        id: &ModelId,
        profile: &Profile,
        file: &ActivationFile,
        warnings: &mut Vec<String>,
    ) -> Result<bool, ActivationError> {
        let invalid = |message: &str| ActivationError::InvalidPredicate {
            model: id.clone(),
            profile: profile.id.clone(),
            message: message.to_string(),
        };

        let (raw, want_exists) = match (&file.exists, &file.missing) {
            (Some(path), None) => (path, true),
            (None, Some(path)) => (path, false),
            (Some(_), Some(_)) => return Err(invalid("file predicate declares both exists and missing")),
            (None, None) => return Err(invalid("file predicate declares neither exists nor missing")),
        };
        if raw.trim().is_empty() {
            return Err(invalid("file path is blank"));
        }

        // A path that still holds a placeholder names no file; the
        // predicate is not satisfied either way
        let path = match self.resolve_file_path(model, raw) {
            Ok(path) => path,
            Err(FilePathError::Unresolved(expression)) => {
                let message = format!(
                    "profile '{}' in {}: unresolved placeholder ${{{}}} in file path",
                    profile.id, id, expression
                );
                warn!(model = %id, profile = %profile.id, "{}", message);
                warnings.push(message);
                return Ok(false);
            }
            Err(FilePathError::Interpolation(source)) => {
                return Err(ActivationError::FilePath {
                    model: id.clone(),
                    profile: profile.id.clone(),
                    source,
                })
            }
        };

        let exists = self.env.file_exists(&path);
        debug!(profile = %profile.id, path = %path.display(), exists, "probed activation file");
        Ok(exists == want_exists)
    }

    fn resolve_file_path(&self, model: &RawModel, raw: &str) -> Result<PathBuf, FilePathError> {
        let mut basedir_props = IndexMap::new();
        if let Some(basedir) = model.basedir() {
            let basedir = basedir.display().to_string();
            basedir_props.insert("basedir".to_string(), basedir.clone());
            basedir_props.insert("project.basedir".to_string(), basedir);
        }
        let system = self.env.system_properties();

        let mut interpolator = Interpolator::new(InterpolatorConfig::lenient())
            .with_source(&basedir_props)
            .with_source(&self.user_properties)
            .with_source(&system);
        let rendered = interpolator
            .interpolate(raw, "activation.file")
            .map_err(FilePathError::Interpolation)?;
        if let Some(missing) = interpolator.take_unresolved().into_iter().next() {
            return Err(FilePathError::Unresolved(missing.expression));
        }

        let path = Path::new(&rendered);
        let path = match model.basedir() {
            Some(basedir) if path.is_relative() => basedir.join(path),
            _ => path.to_path_buf(),
        };
        Ok(normalize_path(&path))
    }
}

enum FilePathError {
    Interpolation(pom_interpolation::InterpolationError),
    Unresolved(String),
}

fn split_negation(value: &str) -> (&str, bool) {
    match value.strip_prefix('!') {
        Some(rest) => (rest.trim(), true),
        None => (value, false),
    }
}

fn checked_negation<'v>(what: &str, value: &'v str) -> Result<(&'v str, bool), String> {
    let (value, negated) = split_negation(value.trim());
    if value.is_empty() {
        return Err(format!("{} is blank", what));
    }
    Ok((value, negated))
}
