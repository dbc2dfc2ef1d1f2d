//! Central package management: package versions governed by a
//! `Directory.Packages.props` file instead of the individual references.

use std::path::Path;

use nuspect_util::errors::NuspectError;
use tracing::{debug, warn};

use crate::package::PackageId;
use crate::project::Project;
use crate::version::VersionRange;

/// File name NuGet looks for when central package management is enabled.
pub const PROPS_FILE: &str = "Directory.Packages.props";

const MANAGE_CENTRALLY: &str = "ManagePackageVersionsCentrally";
const OVERRIDE_ENABLED: &str = "CentralPackageVersionOverrideEnabled";

/// Version policy for one resolution run: the centrally managed packages and
/// whether references may override their central version.
#[derive(Debug, Clone, Default)]
pub struct CentralPackageManagement {
    packages: Vec<PackageId>,
    check_version_override: bool,
}

impl CentralPackageManagement {
    pub fn new(packages: impl IntoIterator<Item = PackageId>, check_version_override: bool) -> Self {
        Self {
            packages: packages.into_iter().collect(),
            check_version_override,
        }
    }

    /// No centrally managed packages; every reference carries its own version.
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn with_check_version_override(mut self, enabled: bool) -> Self {
        self.check_version_override = enabled;
        self
    }

    /// The managed package whose name equals `name` exactly. The first
    /// declaration wins when a name is managed more than once.
    pub fn find(&self, name: &str) -> Option<&PackageId> {
        self.packages.iter().find(|p| p.name == name)
    }

    pub fn check_version_override(&self) -> bool {
        self.check_version_override
    }

    pub fn packages(&self) -> &[PackageId] {
        &self.packages
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    /// Build the policy from a parsed central props file.
    ///
    /// The file only takes effect when it sets `ManagePackageVersionsCentrally`
    /// to `true`. Overrides are enabled unless
    /// `CentralPackageVersionOverrideEnabled` is `false`. Entries without a
    /// valid version are skipped.
    pub fn from_props(props: &Project) -> Self {
        if props.property_is_true(MANAGE_CENTRALLY) != Some(true) {
            debug!("{MANAGE_CENTRALLY} is not enabled, ignoring central package versions");
            return Self::disabled();
        }

        let packages = props
            .package_versions
            .iter()
            .filter_map(|pv| {
                let version = pv.version.as_deref().unwrap_or_default();
                if VersionRange::parse(version).is_none() {
                    warn!(package = %pv.include, version, "skipping central package version");
                    return None;
                }
                Some(PackageId::new(pv.include.clone(), version.trim()))
            })
            .collect();

        Self {
            packages,
            check_version_override: props.property_is_true(OVERRIDE_ENABLED).unwrap_or(true),
        }
    }

    /// Load the policy from a `Directory.Packages.props` file.
    pub fn from_props_path(path: &Path) -> miette::Result<Self> {
        Project::from_path(path).map(|props| Self::from_props(&props))
    }

    /// Locate the props file governing `project_path` by walking up from the
    /// project's directory.
    ///
    /// The project can opt out by setting `ManagePackageVersionsCentrally` to
    /// `false`, and can set `CentralPackageVersionOverrideEnabled` itself.
    pub fn discover(project_path: &Path, project: &Project) -> miette::Result<Self> {
        if project.property_is_true(MANAGE_CENTRALLY) == Some(false) {
            return Ok(Self::disabled());
        }
        let absolute = std::path::absolute(project_path).map_err(|e| NuspectError::Manifest {
            message: format!("Failed to resolve {}: {e}", project_path.display()),
        })?;
        let start = absolute.parent().unwrap_or_else(|| Path::new("."));
        let Some(dir) = nuspect_util::fs::find_ancestor_with(start, PROPS_FILE) else {
            return Ok(Self::disabled());
        };

        let props_path = dir.join(PROPS_FILE);
        debug!(path = %props_path.display(), "using central package versions");
        let mut central = Self::from_props_path(&props_path)?;
        if let Some(enabled) = project.property_is_true(OVERRIDE_ENABLED) {
            central.check_version_override = enabled;
        }
        Ok(central)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::parse_project;

    #[test]
    fn find_is_exact_and_first_wins() {
        let central = CentralPackageManagement::new(
            [
                PackageId::new("Serilog", "3.1.1"),
                PackageId::new("Serilog", "2.0.0"),
            ],
            true,
        );
        assert_eq!(central.find("Serilog").unwrap().version, "3.1.1");
        assert!(central.find("serilog").is_none());
    }

    #[test]
    fn from_props_requires_opt_in() {
        let props = parse_project(
            r#"<Project><ItemGroup><PackageVersion Include="A" Version="1.0.0" /></ItemGroup></Project>"#,
        )
        .unwrap();
        assert!(CentralPackageManagement::from_props(&props).is_empty());
    }

    #[test]
    fn from_props_reads_versions_and_override_flag() {
        let props = parse_project(
            r#"<Project>
  <PropertyGroup>
    <ManagePackageVersionsCentrally>true</ManagePackageVersionsCentrally>
    <CentralPackageVersionOverrideEnabled>false</CentralPackageVersionOverrideEnabled>
  </PropertyGroup>
  <ItemGroup>
    <PackageVersion Include="A" Version="1.0.0" />
    <PackageVersion Include="B" Version="not-a-version" />
    <PackageVersion Include="C" />
  </ItemGroup>
</Project>"#,
        )
        .unwrap();
        let central = CentralPackageManagement::from_props(&props);
        assert_eq!(central.packages(), [PackageId::new("A", "1.0.0")]);
        assert!(!central.check_version_override());
    }

    #[test]
    fn override_enabled_by_default() {
        let props = parse_project(
            r#"<Project>
  <PropertyGroup><ManagePackageVersionsCentrally>true</ManagePackageVersionsCentrally></PropertyGroup>
</Project>"#,
        )
        .unwrap();
        assert!(CentralPackageManagement::from_props(&props).check_version_override());
    }
}
