//! Test fixtures for integration tests
//!
//! Each chain case lists the raw models a source can serve, the model the
//! build starts from, and either the expected effective model or the
//! expected failure code.

#![allow(dead_code)]

use indexmap::IndexMap;
use pom_builder::{
    BuilderConfig, BuilderSettings, InMemoryModelSource, OsDescriptor, Profile, RawModel,
    StaticEnvironment,
};
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Path to the fixtures directory
pub fn fixtures_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

/// Path to the chain corpus
pub fn chain_corpus_path() -> PathBuf {
    fixtures_dir().join("chains/corpus.json")
}

/// Install a test-writer subscriber once; `RUST_LOG` picks the level
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[derive(Debug, serde::Deserialize)]
pub struct ChainCorpus {
    pub schema_version: u32,
    pub description: String,
    pub cases: Vec<ChainCase>,
}

#[derive(Debug, serde::Deserialize)]
pub struct ChainCase {
    pub id: String,
    pub description: String,
    pub models: Vec<RawModel>,
    /// `group:artifact:version` of the initiating model
    pub start: String,
    /// Config overrides layered over the builtin defaults
    #[serde(default)]
    pub settings: Option<Value>,
    #[serde(default)]
    pub environment: EnvironmentFixture,
    #[serde(default)]
    pub external_profiles: Vec<Profile>,
    pub expected: Expected,
}

#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct EnvironmentFixture {
    pub properties: IndexMap<String, String>,
    pub os: Option<String>,
    pub files: Vec<PathBuf>,
}

#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct Expected {
    /// Subset of the serialized effective tree, compared key by key
    pub tree: Option<Value>,
    /// Top-level keys that must not appear in the effective tree
    pub absent: Vec<String>,
    pub model_ids: Option<Vec<String>>,
    pub active_profiles: Option<Vec<String>>,
    pub warnings: Option<usize>,
    pub error: Option<String>,
    pub stage: Option<String>,
}

impl ChainCorpus {
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(chain_corpus_path())?;
        let corpus: ChainCorpus = serde_json::from_str(&content)?;
        Ok(corpus)
    }
}

impl ChainCase {
    /// Source serving every model of the case
    pub fn source(&self) -> InMemoryModelSource {
        let mut source = InMemoryModelSource::new();
        for model in &self.models {
            source.insert(model.clone());
        }
        source
    }

    pub fn start_model(&self) -> Option<RawModel> {
        self.models.iter().find(|m| m.id().as_str() == self.start).cloned()
    }

    pub fn settings(&self) -> Result<BuilderSettings, Box<dyn std::error::Error>> {
        let config = BuilderConfig::build(None, None, self.settings.clone())?;
        Ok(config.settings)
    }

    pub fn environment(&self) -> StaticEnvironment {
        let mut env = StaticEnvironment::new();
        for (name, value) in &self.environment.properties {
            env = env.with_property(name.clone(), value.clone());
        }
        match self.environment.os.as_deref() {
            Some("macos") => env = env.with_os(OsDescriptor::macos()),
            Some("windows") => env = env.with_os(OsDescriptor::windows()),
            _ => {}
        }
        for file in &self.environment.files {
            env = env.with_file(file.clone());
        }
        env
    }
}

/// Check that every key of `expected` matches `actual`; objects recurse,
/// everything else compares whole
pub fn assert_subset(expected: &Value, actual: &Value, path: &str) {
    match (expected, actual) {
        (Value::Object(exp), Value::Object(act)) => {
            for (key, exp_value) in exp {
                let child = if path.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", path, key)
                };
                match act.get(key) {
                    Some(act_value) => assert_subset(exp_value, act_value, &child),
                    None => panic!("missing '{}' in effective model", child),
                }
            }
        }
        _ => assert_eq!(expected, actual, "mismatch at '{}'", path),
    }
}
