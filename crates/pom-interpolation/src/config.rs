//! Interpolator configuration.

use serde::{Deserialize, Serialize};

/// Default ceiling on nested placeholder resolution
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// How unresolved placeholders are treated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterpolationMode {
    /// Keep the literal `${...}` text and report a diagnostic
    #[default]
    Lenient,
    /// Fail on the first unresolved placeholder
    Strict,
}

impl std::str::FromStr for InterpolationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "lenient" => Ok(Self::Lenient),
            "strict" => Ok(Self::Strict),
            other => Err(format!(
                "invalid interpolation mode '{}': must be 'strict' or 'lenient'",
                other
            )),
        }
    }
}

/// Interpolator settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterpolatorConfig {
    pub mode: InterpolationMode,

    /// Maximum nesting of placeholder-in-value resolution
    pub max_depth: usize,
}

impl Default for InterpolatorConfig {
    fn default() -> Self {
        Self {
            mode: InterpolationMode::default(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl InterpolatorConfig {
    pub fn strict() -> Self {
        Self {
            mode: InterpolationMode::Strict,
            ..Self::default()
        }
    }

    pub fn lenient() -> Self {
        Self::default()
    }
}
