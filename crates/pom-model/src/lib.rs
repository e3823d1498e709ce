//! Project Model Types
//!
//! Defines the in-memory shape of a raw project model: its coordinates,
//! parent reference, attribute tree and declared profiles. These types are
//! produced by a loader and consumed read-only by the effective model
//! builder.

pub mod coordinates;
pub mod profile;
pub mod raw;
pub mod tree;
pub mod validate;

pub use coordinates::{ModelId, ParentRef};
pub use profile::{Activation, ActivationFile, ActivationOs, ActivationProperty, Profile};
pub use raw::RawModel;
pub use tree::{Build, Dependency, Keyed, ModelTree, Plugin, Repository};
pub use validate::ModelStructureError;

/// Placeholder rendered for a missing group id in a model identifier.
pub const UNKNOWN_GROUP_ID: &str = "[unknown-group-id]";

/// Placeholder rendered for a missing artifact id in a model identifier.
pub const UNKNOWN_ARTIFACT_ID: &str = "[unknown-artifact-id]";

/// Placeholder rendered for a missing version in a model identifier.
pub const UNKNOWN_VERSION: &str = "[unknown-version]";

/// Group id assumed for plugins that do not declare one.
pub const DEFAULT_PLUGIN_GROUP_ID: &str = "org.apache.maven.plugins";

/// Dependency type assumed when none is declared.
pub const DEFAULT_DEPENDENCY_TYPE: &str = "jar";
