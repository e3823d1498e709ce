//! Effective builder configuration with full provenance
//!
//! The builder config captures the merged configuration plus information
//! about where each value came from.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use pom_interpolation::InterpolatorConfig;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

use super::defaults::{BuiltinDefaults, DEFAULT_MAX_CHAIN_DEPTH, DEFAULT_RELATIVE_PATH};
use super::merge::merge_layers;
use crate::result::IdValidation;

/// Schema version for the config snapshot
pub const SCHEMA_VERSION: u32 = 1;

/// Schema identifier
pub const SCHEMA_ID: &str = "pom-builder/builder_config@1";

/// User config location under `$HOME`
pub const USER_CONFIG_PATH: &str = ".config/pom-builder/config.toml";

/// Project config file name
pub const PROJECT_CONFIG_FILE: &str = ".pom-builder.toml";

/// Origin of a configuration source
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ConfigOrigin {
    Builtin,
    User,
    Project,
    Overrides,
}

/// A contributing config source with provenance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSource {
    /// Origin of this source
    pub origin: ConfigOrigin,

    /// File path (None for builtin/overrides)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// SHA-256 digest of raw file bytes (None for builtin/overrides)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
}

/// Parent chain settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainSettings {
    pub max_depth: usize,
    pub default_relative_path: String,
}

impl Default for ChainSettings {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_CHAIN_DEPTH,
            default_relative_path: DEFAULT_RELATIVE_PATH.to_string(),
        }
    }
}

/// Explicit profile activation lists
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileSettings {
    /// Profile ids activated regardless of their predicates
    pub active: Vec<String>,

    /// Profile ids never activated
    pub inactive: Vec<String>,
}

/// Property layers supplied by configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PropertySettings {
    /// Lowest-precedence layer, also visible to activation predicates
    pub system: IndexMap<String, String>,

    /// Highest-precedence layer
    pub user: IndexMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResultSettings {
    pub id_validation: IdValidation,
}

/// Typed view of the merged configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuilderSettings {
    pub chain: ChainSettings,
    pub interpolation: InterpolatorConfig,
    pub profiles: ProfileSettings,
    pub properties: PropertySettings,
    pub result: ResultSettings,
}

/// Effective builder configuration with provenance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuilderConfig {
    /// Schema version
    pub schema_version: u32,

    /// Schema identifier
    pub schema_id: String,

    /// When this config was computed
    pub created_at: DateTime<Utc>,

    /// Typed settings used by the builder
    pub settings: BuilderSettings,

    /// The merged configuration object, secrets redacted
    pub config: Value,

    /// Contributing sources in precedence order
    pub sources: Vec<ConfigSource>,

    /// Redacted key paths
    pub redactions: Vec<String>,
}

/// Keys that contain secrets and should be redacted
const SECRET_KEYS: &[&str] = &[
    "password",
    "token",
    "secret",
    "private_key",
    "api_key",
    "credential",
];

impl BuilderConfig {
    /// Build config from layers
    pub fn build(
        user_config_path: Option<&Path>,
        project_config_path: Option<&Path>,
        overrides: Option<Value>,
    ) -> Result<Self, ConfigError> {
        let mut layers = Vec::new();
        let mut sources = Vec::new();

        // Layer 1: Built-in defaults
        let defaults = BuiltinDefaults::default();
        layers.push(defaults.to_value());
        sources.push(ConfigSource {
            origin: ConfigOrigin::Builtin,
            path: None,
            digest: None,
        });

        // Layer 2: User config
        if let Some(path) = user_config_path {
            if path.exists() {
                let (value, digest) = Self::load_toml_file(path)?;
                layers.push(value);
                sources.push(ConfigSource {
                    origin: ConfigOrigin::User,
                    path: Some(path.to_string_lossy().to_string()),
                    digest: Some(digest),
                });
            }
        }

        // Layer 3: Project config
        if let Some(path) = project_config_path {
            if path.exists() {
                let (value, digest) = Self::load_toml_file(path)?;
                layers.push(value);
                sources.push(ConfigSource {
                    origin: ConfigOrigin::Project,
                    path: Some(path.to_string_lossy().to_string()),
                    digest: Some(digest),
                });
            }
        }

        // Layer 4: Programmatic overrides
        if let Some(overrides) = overrides {
            layers.push(overrides);
            sources.push(ConfigSource {
                origin: ConfigOrigin::Overrides,
                path: None,
                digest: None,
            });
        }

        let mut merged = merge_layers(layers);

        let settings: BuilderSettings = serde_json::from_value(merged.clone())
            .map_err(|e| ConfigError::ParseError(format!("invalid configuration: {}", e)))?;
        Self::validate_settings(&settings)?;

        let redactions = Self::redact_secrets(&mut merged);

        Ok(Self {
            schema_version: SCHEMA_VERSION,
            schema_id: SCHEMA_ID.to_string(),
            created_at: Utc::now(),
            settings,
            config: merged,
            sources,
            redactions,
        })
    }

    /// Build from the conventional locations: the user file under `$HOME`
    /// and `.pom-builder.toml` in `project_dir`.
    pub fn discover(project_dir: &Path, overrides: Option<Value>) -> Result<Self, ConfigError> {
        let user = Self::user_config_path();
        let project = project_dir.join(PROJECT_CONFIG_FILE);
        Self::build(user.as_deref(), Some(&project), overrides)
    }

    /// Default user config path, if `$HOME` is set
    pub fn user_config_path() -> Option<PathBuf> {
        std::env::var("HOME")
            .ok()
            .map(|home| PathBuf::from(home).join(USER_CONFIG_PATH))
    }

    /// Load and parse a TOML file, returning the value and digest
    fn load_toml_file(path: &Path) -> Result<(Value, String), ConfigError> {
        let bytes = fs::read(path).map_err(|e| ConfigError::IoError(e.to_string()))?;

        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        let digest = hex::encode(hasher.finalize());

        let contents = String::from_utf8(bytes)
            .map_err(|e| ConfigError::ParseError(format!("Invalid UTF-8: {}", e)))?;

        let toml_value: toml::Value = toml::from_str(&contents)
            .map_err(|e| ConfigError::ParseError(format!("TOML parse error: {}", e)))?;

        Ok((Self::toml_to_json(toml_value), digest))
    }

    /// Convert TOML Value to JSON Value
    fn toml_to_json(toml: toml::Value) -> Value {
        match toml {
            toml::Value::String(s) => Value::String(s),
            toml::Value::Integer(i) => Value::Number(i.into()),
            toml::Value::Float(f) => serde_json::Number::from_f64(f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            toml::Value::Boolean(b) => Value::Bool(b),
            toml::Value::Datetime(dt) => Value::String(dt.to_string()),
            toml::Value::Array(arr) => Value::Array(arr.into_iter().map(Self::toml_to_json).collect()),
            toml::Value::Table(table) => {
                let map: serde_json::Map<String, Value> = table
                    .into_iter()
                    .map(|(k, v)| (k, Self::toml_to_json(v)))
                    .collect();
                Value::Object(map)
            }
        }
    }

    /// Redact secrets in the snapshot, returning list of redacted paths
    fn redact_secrets(value: &mut Value) -> Vec<String> {
        let mut redactions = Vec::new();
        Self::redact_recursive(value, String::new(), &mut redactions);
        redactions
    }

    fn redact_recursive(value: &mut Value, path: String, redactions: &mut Vec<String>) {
        match value {
            Value::Object(map) => {
                for (key, val) in map.iter_mut() {
                    let key_lower = key.to_lowercase();
                    let current_path = if path.is_empty() {
                        key.clone()
                    } else {
                        format!("{}.{}", path, key)
                    };

                    let is_secret = SECRET_KEYS.iter().any(|s| key_lower.contains(s));

                    if is_secret && !val.is_object() && !val.is_array() {
                        *val = Value::String("[REDACTED]".to_string());
                        redactions.push(current_path);
                    } else {
                        Self::redact_recursive(val, current_path, redactions);
                    }
                }
            }
            Value::Array(arr) => {
                for (i, val) in arr.iter_mut().enumerate() {
                    let current_path = format!("{}[{}]", path, i);
                    Self::redact_recursive(val, current_path, redactions);
                }
            }
            _ => {}
        }
    }

    /// Validate configuration values
    fn validate_settings(settings: &BuilderSettings) -> Result<(), ConfigError> {
        // chain.max_depth must be in [1, 1024]
        if settings.chain.max_depth == 0 || settings.chain.max_depth > 1024 {
            return Err(ConfigError::ValidationError(
                "chain.max_depth must be in [1, 1024]".to_string(),
            ));
        }

        // interpolation.max_depth must be in [1, 256]
        let depth = settings.interpolation.max_depth;
        if depth == 0 || depth > 256 {
            return Err(ConfigError::ValidationError(
                "interpolation.max_depth must be in [1, 256]".to_string(),
            ));
        }

        if settings.chain.default_relative_path.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "chain.default_relative_path cannot be empty".to_string(),
            ));
        }

        // A profile cannot be both forced on and forced off
        if let Some(id) = settings
            .profiles
            .active
            .iter()
            .find(|id| settings.profiles.inactive.contains(id))
        {
            return Err(ConfigError::ValidationError(format!(
                "profile '{}' is listed as both active and inactive",
                id
            )));
        }

        Ok(())
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Get a snapshot value by path (dot-separated)
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut current = &self.config;
        for part in path.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    /// Get a snapshot value as string
    pub fn get_str(&self, path: &str) -> Option<&str> {
        self.get(path).and_then(|v| v.as_str())
    }
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            schema_id: SCHEMA_ID.to_string(),
            created_at: Utc::now(),
            settings: BuilderSettings::default(),
            config: BuiltinDefaults::default().to_value(),
            sources: vec![ConfigSource {
                origin: ConfigOrigin::Builtin,
                path: None,
                digest: None,
            }],
            redactions: Vec::new(),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}
