//! Interpolation errors and diagnostics.

use serde::{Deserialize, Serialize};

/// Interpolation failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InterpolationError {
    /// Resolving a key required resolving itself
    #[error("cyclic reference detected: {}", .path.join(" -> "))]
    CyclicReference {
        /// Keys visited, ending with the repeated key
        path: Vec<String>,
    },

    /// Strict mode only
    #[error("unresolved reference '${{{expression}}}' at {location}")]
    UnresolvedReference { expression: String, location: String },

    #[error("placeholder '{expression}' nests deeper than {max_depth} levels")]
    TooDeep { expression: String, max_depth: usize },
}

impl InterpolationError {
    /// Stable machine-readable code for this error
    pub fn code(&self) -> &'static str {
        match self {
            Self::CyclicReference { .. } => "CYCLIC_REFERENCE_DETECTED",
            Self::UnresolvedReference { .. } => "UNRESOLVED_REFERENCE",
            Self::TooDeep { .. } => "INTERPOLATION_TOO_DEEP",
        }
    }
}

/// A placeholder left as literal text in lenient mode
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnresolvedPlaceholder {
    /// Expression between the braces
    pub expression: String,

    /// Where it was found (dotted tree path, or caller-supplied label)
    pub location: String,
}

impl std::fmt::Display for UnresolvedPlaceholder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unresolved '${{{}}}' at {}", self.expression, self.location)
    }
}
