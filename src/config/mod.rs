//! Builder configuration
//!
//! Implements the 4-layer configuration merge:
//! 1. Built-in defaults
//! 2. User config (~/.config/pom-builder/config.toml)
//! 3. Project config (.pom-builder.toml)
//! 4. Programmatic overrides

mod defaults;
mod effective;
mod merge;

pub use defaults::{BuiltinDefaults, DEFAULT_MAX_CHAIN_DEPTH, DEFAULT_RELATIVE_PATH};
pub use effective::{
    BuilderConfig, BuilderSettings, ChainSettings, ConfigError, ConfigOrigin, ConfigSource,
    ProfileSettings, PropertySettings, ResultSettings,
};
pub use merge::{deep_merge, merge_layers};
