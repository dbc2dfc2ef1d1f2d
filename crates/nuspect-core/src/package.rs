//! Resolved package identities, graph nodes, and the resolution result.

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

/// Identity of a resolved package: a name and a concrete version.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct PackageId {
    pub name: String,
    pub version: String,
}

impl PackageId {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

impl fmt::Display for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.name, self.version)
    }
}

/// A node of the resolved graph: a package and the packages it depends on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Package {
    pub package_id: PackageId,
    pub dependencies: BTreeSet<PackageId>,
}

impl Package {
    pub fn new(package_id: PackageId) -> Self {
        Self {
            package_id,
            dependencies: BTreeSet::new(),
        }
    }
}

/// Output of resolving one project.
///
/// `dependencies` holds the root packages: those no other package in
/// `packages` depends on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyResult {
    pub success: bool,
    pub packages: Vec<Package>,
    pub dependencies: Vec<PackageId>,
}

impl DependencyResult {
    /// The result of a run whose project could not be parsed.
    pub fn failure() -> Self {
        Self::default()
    }

    /// Look up a package node by name, ignoring version.
    pub fn find(&self, name: &str) -> Option<&Package> {
        self.packages.iter().find(|p| p.package_id.name == name)
    }

    /// Whether every dependency edge points at a package present in `packages`.
    pub fn is_closed(&self) -> bool {
        let ids: BTreeSet<&PackageId> = self.packages.iter().map(|p| &p.package_id).collect();
        self.packages
            .iter()
            .flat_map(|p| p.dependencies.iter())
            .all(|dep| ids.contains(dep))
    }
}
