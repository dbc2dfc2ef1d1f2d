//! An in-memory package catalog, loadable from a JSON file for offline runs.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use nuspect_core::dependency::NugetDependency;
use nuspect_core::package::PackageId;
use nuspect_core::version::NuGetVersion;
use nuspect_util::errors::NuspectError;

use crate::source::{PackageSource, ResolvedPackage};

/// Offline catalog file layout.
///
/// ```json
/// { "packages": [ { "id": "Serilog", "version": "3.1.1",
///                   "dependencies": { "System.Diagnostics.DiagnosticSource": "7.0.2" } } ] }
/// ```
#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    packages: Vec<CatalogPackage>,
}

#[derive(Debug, Deserialize)]
struct CatalogPackage {
    id: String,
    version: String,
    #[serde(default)]
    dependencies: BTreeMap<String, String>,
}

#[derive(Debug, Clone)]
struct CatalogEntry {
    id: String,
    version: NuGetVersion,
    dependencies: Vec<NugetDependency>,
}

/// A package source backed by an in-memory catalog. Package ids match
/// case-insensitively, as on a NuGet feed.
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    packages: BTreeMap<String, Vec<CatalogEntry>>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one version of a package with its direct dependencies as
    /// `(name, range)` pairs. Re-adding a version replaces it.
    pub fn add_package(
        &mut self,
        id: &str,
        version: &str,
        dependencies: &[(&str, &str)],
    ) -> miette::Result<()> {
        let parsed = NuGetVersion::parse(version).ok_or_else(|| NuspectError::Version {
            message: format!("'{version}' is not a valid version of {id}"),
        })?;
        let dependencies = dependencies
            .iter()
            .map(|(name, range)| {
                NugetDependency::parse(*name, range).ok_or_else(|| NuspectError::Version {
                    message: format!("'{range}' is not a valid range for {name} in {id} {version}"),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let entries = self.packages.entry(id.to_ascii_lowercase()).or_default();
        entries.retain(|e| e.version != parsed);
        entries.push(CatalogEntry {
            id: id.to_string(),
            version: parsed,
            dependencies,
        });
        Ok(())
    }

    /// Parse a JSON catalog.
    pub fn from_json(json: &str) -> miette::Result<Self> {
        let file: CatalogFile = serde_json::from_str(json).map_err(|e| NuspectError::Registry {
            message: format!("Failed to parse package catalog: {e}"),
        })?;

        let mut source = Self::new();
        for pkg in &file.packages {
            let deps: Vec<(&str, &str)> = pkg
                .dependencies
                .iter()
                .map(|(name, range)| (name.as_str(), range.as_str()))
                .collect();
            source.add_package(&pkg.id, &pkg.version, &deps)?;
        }
        Ok(source)
    }

    /// Load a JSON catalog from disk.
    pub fn from_path(path: &Path) -> miette::Result<Self> {
        let content = nuspect_util::fs::read_text(path).map_err(|e| NuspectError::Registry {
            message: format!("Failed to read package catalog {}: {e}", path.display()),
        })?;
        Self::from_json(&content)
    }

    /// Number of package versions in the catalog.
    pub fn len(&self) -> usize {
        self.packages.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn resolve(&self, dependency: &NugetDependency) -> Option<ResolvedPackage> {
        let entries = self.packages.get(&dependency.name.to_ascii_lowercase())?;
        let best = dependency
            .version_range
            .find_best_match(entries.iter().map(|e| &e.version))?;
        let entry = entries.iter().find(|e| &e.version == best)?;
        Some(ResolvedPackage {
            id: PackageId::new(entry.id.clone(), entry.version.to_normalized_string()),
            dependencies: entry.dependencies.clone(),
        })
    }
}

impl PackageSource for InMemorySource {
    async fn lookup(&self, dependency: &NugetDependency) -> miette::Result<Option<ResolvedPackage>> {
        let resolved = self.resolve(dependency);
        debug!(%dependency, resolved = ?resolved.as_ref().map(|r| r.id.to_string()), "catalog lookup");
        Ok(resolved)
    }
}
