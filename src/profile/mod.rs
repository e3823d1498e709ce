//! Profile activation
//!
//! Predicates supported:
//! - property presence / equality, each negatable with `!`
//! - file exists / missing, relative to the declaring model's directory
//! - OS family, name, arch and version
//! - `activeByDefault` and explicit activation lists

mod activator;
mod environment;

pub use activator::{ActivatedProfiles, ActivationError, ModelProfiles, ProfileActivator};
pub use environment::{
    ActivationEnvironment, OsDescriptor, StaticEnvironment, SystemEnvironment, ENV_PREFIX, OS_FAMILIES,
};
