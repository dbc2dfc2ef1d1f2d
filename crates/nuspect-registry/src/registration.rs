//! NuGet v3 service index and registration (package metadata) documents.

use serde::Deserialize;
use tracing::warn;

use nuspect_core::dependency::NugetDependency;
use nuspect_core::version::{NuGetVersion, VersionRange};

/// Registration resource types, in order of preference. The semver2 and
/// gzip variants are skipped since their pages are served compressed.
const REGISTRATION_TYPES: &[&str] = &[
    "RegistrationsBaseUrl",
    "RegistrationsBaseUrl/3.0.0-rc",
    "RegistrationsBaseUrl/3.0.0-beta",
];

/// Range NuGet assumes for a dependency declared without one.
const ANY_VERSION: &str = "0.0.0";

/// The `index.json` a NuGet v3 source is addressed by.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceIndex {
    #[serde(default)]
    pub resources: Vec<ServiceResource>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceResource {
    #[serde(rename = "@id")]
    pub id: String,
    #[serde(rename = "@type")]
    pub resource_type: String,
}

impl ServiceIndex {
    /// Base URL of the package metadata (registration) resource.
    pub fn registrations_base_url(&self) -> Option<&str> {
        REGISTRATION_TYPES
            .iter()
            .find_map(|t| self.resources.iter().find(|r| r.resource_type == *t))
            .map(|r| r.id.trim_end_matches('/'))
    }
}

/// A package's registration index: versions grouped into pages.
#[derive(Debug, Clone, Deserialize)]
pub struct RegistrationIndex {
    #[serde(default)]
    pub items: Vec<RegistrationPage>,
}

/// A page of versions. Large packages leave `items` out and the page must be
/// fetched from its `@id`.
#[derive(Debug, Clone, Deserialize)]
pub struct RegistrationPage {
    #[serde(rename = "@id")]
    pub id: String,
    #[serde(default)]
    pub items: Option<Vec<RegistrationLeaf>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegistrationLeaf {
    #[serde(rename = "catalogEntry")]
    pub catalog_entry: CatalogEntry,
}

/// Metadata for one version of a package.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogEntry {
    pub id: String,
    pub version: String,
    #[serde(default = "default_listed")]
    pub listed: bool,
    #[serde(default, rename = "dependencyGroups")]
    pub dependency_groups: Vec<DependencyGroup>,
}

fn default_listed() -> bool {
    true
}

/// Dependencies declared for one target framework.
#[derive(Debug, Clone, Deserialize)]
pub struct DependencyGroup {
    #[serde(default, rename = "targetFramework")]
    pub target_framework: Option<String>,
    #[serde(default)]
    pub dependencies: Vec<RegistrationDependency>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegistrationDependency {
    pub id: String,
    #[serde(default)]
    pub range: Option<String>,
}

impl CatalogEntry {
    pub fn parsed_version(&self) -> Option<NuGetVersion> {
        NuGetVersion::parse(&self.version)
    }

    /// Dependencies across every target framework group. When several groups
    /// name the same package, the first range wins.
    pub fn flattened_dependencies(&self) -> Vec<NugetDependency> {
        let mut deps: Vec<NugetDependency> = Vec::new();
        for group in &self.dependency_groups {
            for dep in &group.dependencies {
                if deps.iter().any(|d| d.name.eq_ignore_ascii_case(&dep.id)) {
                    continue;
                }
                let range = dep.range.as_deref().unwrap_or(ANY_VERSION);
                match VersionRange::parse(range) {
                    Some(version_range) => deps.push(NugetDependency::new(dep.id.clone(), version_range)),
                    None => warn!(
                        package = %self.id,
                        dependency = %dep.id,
                        range,
                        "ignoring dependency with invalid range"
                    ),
                }
            }
        }
        deps
    }
}
