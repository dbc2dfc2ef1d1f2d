use std::fmt;

use serde::Serialize;

use crate::version::VersionRange;

/// A normalized package reference: a package name and the range of
/// versions the project accepts for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NugetDependency {
    pub name: String,
    pub version_range: VersionRange,
}

impl NugetDependency {
    pub fn new(name: impl Into<String>, version_range: VersionRange) -> Self {
        Self {
            name: name.into(),
            version_range,
        }
    }

    /// Parse `range` and pair it with `name`. Returns `None` when the range is invalid.
    pub fn parse(name: impl Into<String>, range: &str) -> Option<Self> {
        VersionRange::parse(range).map(|version_range| Self::new(name, version_range))
    }
}

impl fmt::Display for NugetDependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.version_range)
    }
}
