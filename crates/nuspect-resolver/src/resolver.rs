//! Resolution orchestration: parse the project, normalize its references,
//! expand the package graph, and compute the roots.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, error, info};

use nuspect_core::central::CentralPackageManagement;
use nuspect_core::dependency::NugetDependency;
use nuspect_core::package::DependencyResult;
use nuspect_core::project::Project;
use nuspect_registry::source::PackageSource;

use crate::expander::{GraphExpander, DEFAULT_MAX_CONCURRENT_LOOKUPS};
use crate::normalizer::{ReferenceNormalizer, ReferenceWarning};
use crate::roots::find_roots;

/// Where the central package versions for a run come from.
#[derive(Debug, Clone, Default)]
pub enum CentralConfig {
    /// Walk up from the project to the nearest `Directory.Packages.props`.
    #[default]
    Discover,
    /// Read an explicit props file.
    Props(PathBuf),
    /// Use a policy built by the caller.
    Fixed(CentralPackageManagement),
    /// No central package management.
    Disabled,
}

/// A detailed resolution outcome.
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    pub result: DependencyResult,
    /// References left out of the dependency list.
    pub warnings: Vec<ReferenceWarning>,
    /// Dependencies the package source could not resolve.
    pub unresolved: Vec<NugetDependency>,
}

impl Resolution {
    fn failure() -> Self {
        Self {
            result: DependencyResult::failure(),
            ..Self::default()
        }
    }
}

/// Resolves the package references of one project file.
pub struct ProjectReferenceResolver<S> {
    project_path: PathBuf,
    source: Arc<S>,
    central: CentralConfig,
    check_version_override: Option<bool>,
    max_concurrent: usize,
}

impl<S: PackageSource + 'static> ProjectReferenceResolver<S> {
    pub fn new(project_path: impl Into<PathBuf>, source: Arc<S>) -> Self {
        Self {
            project_path: project_path.into(),
            source,
            central: CentralConfig::default(),
            check_version_override: None,
            max_concurrent: DEFAULT_MAX_CONCURRENT_LOOKUPS,
        }
    }

    pub fn with_central(mut self, central: CentralConfig) -> Self {
        self.central = central;
        self
    }

    /// Force the override switch, whatever the props files say.
    pub fn with_check_version_override(mut self, enabled: bool) -> Self {
        self.check_version_override = Some(enabled);
        self
    }

    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent;
        self
    }

    pub fn project_path(&self) -> &Path {
        &self.project_path
    }

    /// Resolve the project. A project that cannot be parsed yields an
    /// unsuccessful result with no packages.
    pub async fn process(&self) -> DependencyResult {
        self.process_detailed().await.result
    }

    /// Resolve the project, keeping the skipped references and unresolved
    /// dependencies alongside the result.
    pub async fn process_detailed(&self) -> Resolution {
        let project = match Project::from_path(&self.project_path) {
            Ok(project) => project,
            Err(e) => {
                error!(path = %self.project_path.display(), error = %e, "failed to parse project");
                return Resolution::failure();
            }
        };

        let central = match self.load_central(&project) {
            Ok(central) => central,
            Err(e) => {
                error!(path = %self.project_path.display(), error = %e, "failed to load central package versions");
                return Resolution::failure();
            }
        };
        debug!(
            managed = central.packages().len(),
            check_version_override = central.check_version_override(),
            "central package management"
        );

        let normalized = ReferenceNormalizer::new(central).normalize(&project);
        info!(
            path = %self.project_path.display(),
            dependencies = normalized.dependencies.len(),
            skipped = normalized.warnings.len(),
            "normalized references"
        );

        let expansion = GraphExpander::new(Arc::clone(&self.source))
            .with_max_concurrent(self.max_concurrent)
            .expand(normalized.dependencies)
            .await;

        let packages = expansion.graph.packages();
        let roots = find_roots(&packages);
        Resolution {
            result: DependencyResult {
                success: true,
                packages,
                dependencies: roots,
            },
            warnings: normalized.warnings,
            unresolved: expansion.unresolved,
        }
    }

    fn load_central(&self, project: &Project) -> miette::Result<CentralPackageManagement> {
        let central = match &self.central {
            CentralConfig::Discover => CentralPackageManagement::discover(&self.project_path, project)?,
            CentralConfig::Props(path) => CentralPackageManagement::from_props_path(path)?,
            CentralConfig::Fixed(central) => central.clone(),
            CentralConfig::Disabled => CentralPackageManagement::disabled(),
        };
        Ok(match self.check_version_override {
            Some(enabled) => central.with_check_version_override(enabled),
            None => central,
        })
    }
}
