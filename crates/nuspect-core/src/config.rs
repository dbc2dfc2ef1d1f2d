use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use nuspect_util::errors::NuspectError;

/// The public NuGet gallery's v3 service index.
pub const NUGET_ORG_INDEX: &str = "https://api.nuget.org/v3/index.json";

/// Global user configuration loaded from `~/.nuspect/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlobalConfig {
    /// Package sources by name, each a NuGet v3 service index URL.
    #[serde(default)]
    pub sources: BTreeMap<String, String>,

    #[serde(default)]
    pub resolution: ResolutionConfig,
}

/// Resolution settings from `[resolution]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolutionConfig {
    /// Forces the version-override switch instead of reading it from
    /// `Directory.Packages.props`.
    #[serde(default, rename = "check-version-override")]
    pub check_version_override: Option<bool>,
    #[serde(default = "default_max_concurrent_lookups", rename = "max-concurrent-lookups")]
    pub max_concurrent_lookups: usize,
}

impl Default for ResolutionConfig {
    fn default() -> Self {
        Self {
            check_version_override: None,
            max_concurrent_lookups: default_max_concurrent_lookups(),
        }
    }
}

fn default_max_concurrent_lookups() -> usize {
    8
}

impl GlobalConfig {
    /// Load the global configuration from `~/.nuspect/config.toml`, or return defaults if the file doesn't exist.
    pub fn load() -> miette::Result<Self> {
        Self::load_from(&Self::default_path())
    }

    /// Load configuration from an explicit path, or return defaults if the file doesn't exist.
    pub fn load_from(path: &Path) -> miette::Result<Self> {
        if !path.is_file() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|e| NuspectError::Config {
            message: format!("Failed to read {}: {e}", path.display()),
        })?;
        toml::from_str(&content).map_err(|e| {
            NuspectError::Config {
                message: format!("Failed to parse {}: {e}", path.display()),
            }
            .into()
        })
    }

    /// Configured source URLs, falling back to nuget.org when none are set.
    pub fn source_urls(&self) -> Vec<String> {
        if self.sources.is_empty() {
            vec![NUGET_ORG_INDEX.to_string()]
        } else {
            self.sources.values().cloned().collect()
        }
    }

    /// Returns the default path to the global config file.
    pub fn default_path() -> PathBuf {
        dirs_path().join("config.toml")
    }
}

/// Returns the path to the nuspect data directory (`~/.nuspect/`).
pub fn dirs_path() -> PathBuf {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .unwrap_or_else(|_| ".".to_string());
    Path::new(&home).join(".nuspect")
}
