//! Reference normalization: turns a project's package references and legacy
//! assembly references into a flat list of dependencies.
//!
//! Version precedence for a `<PackageReference>`:
//! 1. Centrally managed package: `VersionOverride` when overrides are
//!    allowed, otherwise the central version. A reference carrying an
//!    override while overrides are disabled is dropped.
//! 2. Otherwise the reference's own `Version`.
//! 3. Otherwise nothing: references without any version are framework
//!    references and are excluded.
//!
//! Legacy `<Reference>` items take the version embedded in their include and
//! ignore central management.

use std::fmt;

use tracing::{info, warn};

use nuspect_core::central::CentralPackageManagement;
use nuspect_core::dependency::NugetDependency;
use nuspect_core::project::{AssemblyReference, PackageReference, Project};

use crate::legacy;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
}

/// Why a reference produced no dependency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WarningReason {
    /// The version (explicit, override, or central) is not a valid range.
    InvalidVersion { value: String },
    /// A centrally managed reference carries `VersionOverride` while
    /// overrides are disabled.
    // TODO: fall back to the central version once the drop is confirmed unintended.
    OverrideDisabled,
    /// Neither the reference nor central management supplies a version.
    MissingVersion,
    /// A legacy include mentions `Version=` but has no usable name/version.
    MalformedLegacyReference,
}

impl fmt::Display for WarningReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidVersion { value } => write!(f, "'{value}' is not a valid version range"),
            Self::OverrideDisabled => f.write_str(
                "central package version overriding is disabled; enable it or remove VersionOverride",
            ),
            Self::MissingVersion => f.write_str("framework reference has no version and is not included"),
            Self::MalformedLegacyReference => f.write_str("reference include has no usable name and version"),
        }
    }
}

/// A diagnostic for a reference that was left out of the dependency list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceWarning {
    pub severity: Severity,
    pub reference: String,
    pub reason: WarningReason,
}

impl fmt::Display for ReferenceWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.reference, self.reason)
    }
}

/// Output of normalization: dependencies in declaration order, plus a
/// diagnostic for every reference that was skipped.
#[derive(Debug, Clone, Default)]
pub struct Normalized {
    pub dependencies: Vec<NugetDependency>,
    pub warnings: Vec<ReferenceWarning>,
}

impl Normalized {
    fn push_parsed(&mut self, name: &str, version: &str) {
        match NugetDependency::parse(name, version) {
            Some(dep) => self.dependencies.push(dep),
            None => self.report(
                Severity::Warning,
                name,
                WarningReason::InvalidVersion {
                    value: version.to_string(),
                },
            ),
        }
    }

    fn report(&mut self, severity: Severity, reference: &str, reason: WarningReason) {
        match severity {
            Severity::Info => info!(reference, %reason, "skipping reference"),
            Severity::Warning => warn!(reference, %reason, "skipping reference"),
        }
        self.warnings.push(ReferenceWarning {
            severity,
            reference: reference.to_string(),
            reason,
        });
    }
}

/// Applies the version policy to a project's references.
#[derive(Debug, Clone, Default)]
pub struct ReferenceNormalizer {
    central: CentralPackageManagement,
}

impl ReferenceNormalizer {
    pub fn new(central: CentralPackageManagement) -> Self {
        Self { central }
    }

    pub fn central(&self) -> &CentralPackageManagement {
        &self.central
    }

    /// Normalize every package reference, then every legacy reference.
    pub fn normalize(&self, project: &Project) -> Normalized {
        let mut out = Normalized::default();
        for reference in &project.package_references {
            self.normalize_package_reference(reference, &mut out);
        }
        for reference in &project.references {
            self.normalize_legacy_reference(reference, &mut out);
        }
        out
    }

    fn normalize_package_reference(&self, reference: &PackageReference, out: &mut Normalized) {
        let name = reference.include.as_str();

        if let Some(managed) = self.central.find(name) {
            match (&reference.version_override, self.central.check_version_override()) {
                (Some(version_override), true) => out.push_parsed(name, version_override),
                (Some(_), false) => out.report(Severity::Warning, name, WarningReason::OverrideDisabled),
                (None, _) => out.push_parsed(name, &managed.version),
            }
        } else if let Some(ref version) = reference.version {
            out.push_parsed(name, version);
        } else {
            out.report(Severity::Info, name, WarningReason::MissingVersion);
        }
    }

    fn normalize_legacy_reference(&self, reference: &AssemblyReference, out: &mut Normalized) {
        if !legacy::has_version(&reference.include) {
            return;
        }
        match legacy::parse_assembly_identity(&reference.include) {
            Some(identity) => out.push_parsed(&identity.name, &identity.version),
            None => out.report(
                Severity::Warning,
                reference.include.trim(),
                WarningReason::MalformedLegacyReference,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nuspect_core::package::PackageId;
    use nuspect_core::project::parse_project;

    fn central(check_version_override: bool) -> CentralPackageManagement {
        CentralPackageManagement::new(
            [PackageId::new("Managed", "1.0.0")],
            check_version_override,
        )
    }

    fn normalize(xml: &str, central: CentralPackageManagement) -> Normalized {
        ReferenceNormalizer::new(central).normalize(&parse_project(xml).unwrap())
    }

    fn range_of(out: &Normalized, name: &str) -> String {
        out.dependencies
            .iter()
            .find(|d| d.name == name)
            .map(|d| d.version_range.to_string())
            .unwrap()
    }

    #[test]
    fn override_wins_when_enabled() {
        let out = normalize(
            r#"<Project><ItemGroup><PackageReference Include="Managed" VersionOverride="2.0.0" Version="3.0.0" /></ItemGroup></Project>"#,
            central(true),
        );
        assert_eq!(out.dependencies.len(), 1);
        assert_eq!(range_of(&out, "Managed"), "[2.0.0, )");
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn invalid_override_emits_nothing() {
        let out = normalize(
            r#"<Project><ItemGroup><PackageReference Include="Managed" VersionOverride="two" /></ItemGroup></Project>"#,
            central(true),
        );
        assert!(out.dependencies.is_empty());
        assert_eq!(
            out.warnings[0].reason,
            WarningReason::InvalidVersion {
                value: "two".to_string()
            }
        );
    }

    #[test]
    fn override_dropped_when_disabled() {
        let out = normalize(
            r#"<Project><ItemGroup><PackageReference Include="Managed" VersionOverride="2.0.0" /></ItemGroup></Project>"#,
            central(false),
        );
        assert!(out.dependencies.is_empty());
        assert_eq!(out.warnings.len(), 1);
        assert_eq!(out.warnings[0].reason, WarningReason::OverrideDisabled);
        assert_eq!(out.warnings[0].severity, Severity::Warning);
        assert_eq!(out.warnings[0].reference, "Managed");
    }

    #[test]
    fn central_version_used_without_override() {
        for enabled in [true, false] {
            let out = normalize(
                r#"<Project><ItemGroup><PackageReference Include="Managed" Version="9.9.9" /></ItemGroup></Project>"#,
                central(enabled),
            );
            assert_eq!(range_of(&out, "Managed"), "[1.0.0, )");
        }
    }

    #[test]
    fn central_match_is_case_sensitive() {
        let out = normalize(
            r#"<Project><ItemGroup><PackageReference Include="managed" Version="5.0.0" /></ItemGroup></Project>"#,
            central(true),
        );
        assert_eq!(range_of(&out, "managed"), "[5.0.0, )");
    }

    #[test]
    fn explicit_version_used_as_is() {
        let out = normalize(
            r#"<Project><ItemGroup><PackageReference Include="A" Version="[1.2.3]" /></ItemGroup></Project>"#,
            CentralPackageManagement::disabled(),
        );
        assert_eq!(range_of(&out, "A"), "[1.2.3]");
    }

    #[test]
    fn missing_version_is_excluded() {
        let out = normalize(
            r#"<Project><ItemGroup><PackageReference Include="Microsoft.AspNetCore.App" /></ItemGroup></Project>"#,
            central(true),
        );
        assert!(out.dependencies.is_empty());
        assert_eq!(out.warnings[0].reason, WarningReason::MissingVersion);
        assert_eq!(out.warnings[0].severity, Severity::Info);
    }

    #[test]
    fn legacy_references_ignore_central_policy() {
        let out = normalize(
            r#"<Project><ItemGroup>
  <Reference Include="System" />
  <Reference Include="Managed, Version=4.0.0.0, Culture=neutral" />
</ItemGroup></Project>"#,
            central(false),
        );
        assert_eq!(out.dependencies.len(), 1);
        assert_eq!(range_of(&out, "Managed"), "[4.0.0, )");
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn malformed_legacy_reference_is_reported() {
        let out = normalize(
            r#"<Project><ItemGroup><Reference Include="Version=1.0" /></ItemGroup></Project>"#,
            CentralPackageManagement::disabled(),
        );
        assert!(out.dependencies.is_empty());
        assert_eq!(out.warnings[0].reason, WarningReason::MalformedLegacyReference);
    }

    #[test]
    fn order_and_duplicates_preserved() {
        let out = normalize(
            r#"<Project><ItemGroup>
  <PackageReference Include="B" Version="1.0.0" />
  <PackageReference Include="A" Version="1.0.0" />
  <PackageReference Include="B" Version="2.0.0" />
  <Reference Include="C, Version=3.0.0.0" />
</ItemGroup></Project>"#,
            CentralPackageManagement::disabled(),
        );
        let names: Vec<&str> = out.dependencies.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, ["B", "A", "B", "C"]);
    }

    #[test]
    fn warning_display() {
        let warning = ReferenceWarning {
            severity: Severity::Warning,
            reference: "A".to_string(),
            reason: WarningReason::InvalidVersion {
                value: "x".to_string(),
            },
        };
        assert_eq!(warning.to_string(), "A: 'x' is not a valid version range");
    }
}
