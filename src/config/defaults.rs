//! Built-in builder defaults (layer 1)
//!
//! Hardcoded defaults for all configuration values.

use serde::{Deserialize, Serialize};

/// Default ceiling on parent chain length
pub const DEFAULT_MAX_CHAIN_DEPTH: usize = 64;

/// Default parent location relative to a child model file
pub const DEFAULT_RELATIVE_PATH: &str = "../pom.xml";

/// Built-in default configuration values
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltinDefaults {
    /// Parent chain ceiling (default: 64)
    pub max_chain_depth: usize,

    /// Parent relative location (default: "../pom.xml")
    pub default_relative_path: String,

    /// Unresolved placeholder policy (default: "lenient")
    pub interpolation_mode: String,

    /// Nested placeholder ceiling (default: 32)
    pub interpolation_max_depth: usize,

    /// Result container id cross-validation (default: "off")
    pub id_validation: String,
}

impl Default for BuiltinDefaults {
    fn default() -> Self {
        Self {
            max_chain_depth: DEFAULT_MAX_CHAIN_DEPTH,
            default_relative_path: DEFAULT_RELATIVE_PATH.to_string(),
            interpolation_mode: "lenient".to_string(),
            interpolation_max_depth: pom_interpolation::DEFAULT_MAX_DEPTH,
            id_validation: "off".to_string(),
        }
    }
}

impl BuiltinDefaults {
    /// Convert to JSON Value for merging
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::json!({
            "chain": {
                "max_depth": self.max_chain_depth,
                "default_relative_path": self.default_relative_path
            },
            "interpolation": {
                "mode": self.interpolation_mode,
                "max_depth": self.interpolation_max_depth
            },
            "profiles": {
                "active": [],
                "inactive": []
            },
            "properties": {
                "system": {},
                "user": {}
            },
            "result": {
                "id_validation": self.id_validation
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let defaults = BuiltinDefaults::default();
        assert_eq!(defaults.max_chain_depth, 64);
        assert_eq!(defaults.default_relative_path, "../pom.xml");
        assert_eq!(defaults.interpolation_mode, "lenient");
        assert_eq!(defaults.interpolation_max_depth, 32);
        assert_eq!(defaults.id_validation, "off");
    }

    #[test]
    fn test_to_value() {
        let defaults = BuiltinDefaults::default();
        let value = defaults.to_value();

        assert_eq!(value["chain"]["max_depth"], 64);
        assert_eq!(value["interpolation"]["mode"], "lenient");
        assert!(value["profiles"]["active"].as_array().unwrap().is_empty());
    }
}
