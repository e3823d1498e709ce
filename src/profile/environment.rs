//! Activation environment: what profile predicates can observe

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Prefix under which process environment variables are exposed
pub const ENV_PREFIX: &str = "env.";

/// Operating system description matched by `os` predicates
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OsDescriptor {
    /// Lower-case OS name, e.g. `linux`, `mac os x`, `windows 11`
    pub name: String,
    pub arch: String,
    pub version: String,
    /// Path list separator, `:` or `;`
    pub path_separator: String,
}

/// Families understood by `os.family`
pub const OS_FAMILIES: &[&str] = &[
    "dos", "mac", "netware", "os/2", "tandem", "unix", "windows", "win9x", "winnt", "z/os",
    "os/400", "openvms",
];

impl OsDescriptor {
    pub fn new(name: &str, arch: &str, version: &str, path_separator: &str) -> Self {
        Self {
            name: name.to_lowercase(),
            arch: arch.to_lowercase(),
            version: version.to_lowercase(),
            path_separator: path_separator.to_string(),
        }
    }

    /// Descriptor of the running platform
    pub fn current() -> Self {
        let name = match std::env::consts::OS {
            "macos" => "mac os x",
            other => other,
        };
        let separator = if cfg!(windows) { ";" } else { ":" };
        Self::new(name, std::env::consts::ARCH, "", separator)
    }

    pub fn linux() -> Self {
        Self::new("linux", "x86_64", "", ":")
    }

    pub fn macos() -> Self {
        Self::new("mac os x", "aarch64", "", ":")
    }

    pub fn windows() -> Self {
        Self::new("windows 11", "x86_64", "10.0", ";")
    }

    /// Whether this OS belongs to `family`; `None` for an unknown family
    pub fn is_family(&self, family: &str) -> Option<bool> {
        let family = family.to_lowercase();
        let name = self.name.as_str();
        let is_windows = name.contains("windows");
        let is_win9x = is_windows
            && (name.contains("95") || name.contains("98") || name.contains("me") || name.contains("ce"));

        let matches = match family.as_str() {
            "windows" => is_windows,
            "win9x" => is_win9x,
            "winnt" => is_windows && !is_win9x,
            "os/2" => name.contains("os/2"),
            "netware" => name.contains("netware"),
            "dos" => self.path_separator == ";" && !name.contains("netware"),
            "mac" => name.contains("mac"),
            "tandem" => name.contains("nonstop_kernel"),
            "unix" => {
                self.path_separator == ":"
                    && !name.contains("openvms")
                    && (!name.contains("mac") || name.ends_with('x'))
            }
            "z/os" => name.contains("z/os") || name.contains("os/390"),
            "os/400" => name.contains("os/400"),
            "openvms" => name.contains("openvms"),
            _ => return None,
        };
        Some(matches)
    }
}

impl Default for OsDescriptor {
    fn default() -> Self {
        Self::current()
    }
}

/// Everything profile activation may probe.
///
/// Injected so builds stay reproducible in tests.
pub trait ActivationEnvironment: Send + Sync {
    /// Look up a system-level property (including `env.*`)
    fn property(&self, name: &str) -> Option<String>;

    /// Every system-level property, used as the lowest interpolation layer
    fn system_properties(&self) -> IndexMap<String, String>;

    fn os(&self) -> &OsDescriptor;

    fn file_exists(&self, path: &Path) -> bool;
}

/// The running process: configured properties, `env.*` variables, the
/// host OS and the real filesystem
#[derive(Debug, Clone, Default)]
pub struct SystemEnvironment {
    properties: IndexMap<String, String>,
    os: OsDescriptor,
}

impl SystemEnvironment {
    pub fn new(properties: IndexMap<String, String>) -> Self {
        Self {
            properties,
            os: OsDescriptor::current(),
        }
    }
}

impl ActivationEnvironment for SystemEnvironment {
    fn property(&self, name: &str) -> Option<String> {
        if let Some(value) = self.properties.get(name) {
            return Some(value.clone());
        }
        name.strip_prefix(ENV_PREFIX)
            .and_then(|var| std::env::var(var).ok())
    }

    fn system_properties(&self) -> IndexMap<String, String> {
        let mut all: IndexMap<String, String> = std::env::vars()
            .map(|(k, v)| (format!("{}{}", ENV_PREFIX, k), v))
            .collect();
        all.sort_keys();
        for (key, value) in &self.properties {
            all.insert(key.clone(), value.clone());
        }
        all
    }

    fn os(&self) -> &OsDescriptor {
        &self.os
    }

    fn file_exists(&self, path: &Path) -> bool {
        path.exists()
    }
}

/// Fixed environment for tests and reproducible builds
#[derive(Debug, Clone)]
pub struct StaticEnvironment {
    properties: IndexMap<String, String>,
    os: OsDescriptor,
    files: HashSet<PathBuf>,
}

impl StaticEnvironment {
    pub fn new() -> Self {
        Self {
            properties: IndexMap::new(),
            os: OsDescriptor::linux(),
            files: HashSet::new(),
        }
    }

    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    pub fn with_os(mut self, os: OsDescriptor) -> Self {
        self.os = os;
        self
    }

    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.files.insert(path.into());
        self
    }
}

impl Default for StaticEnvironment {
    fn default() -> Self {
        Self::new()
    }
}

impl ActivationEnvironment for StaticEnvironment {
    fn property(&self, name: &str) -> Option<String> {
        self.properties.get(name).cloned()
    }

    fn system_properties(&self) -> IndexMap<String, String> {
        self.properties.clone()
    }

    fn os(&self) -> &OsDescriptor {
        &self.os
    }

    fn file_exists(&self, path: &Path) -> bool {
        self.files.contains(path)
    }
}
