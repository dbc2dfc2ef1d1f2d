//! The registry lookup seam.

use std::future::Future;

use nuspect_core::dependency::NugetDependency;
use nuspect_core::package::PackageId;

/// A package resolved by a source: its concrete identity and its own direct
/// dependencies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPackage {
    pub id: PackageId,
    pub dependencies: Vec<NugetDependency>,
}

/// Resolves a dependency to a concrete package.
///
/// Implementations select the version satisfying the dependency's range and
/// report the package's direct dependencies. Lookups must be idempotent: the
/// same dependency always resolves to the same package, so a caller may issue
/// a lookup more than once.
///
/// `Ok(None)` means the source has no package satisfying the dependency;
/// `Err` is reserved for faults such as network failures.
pub trait PackageSource: Send + Sync {
    fn lookup(
        &self,
        dependency: &NugetDependency,
    ) -> impl Future<Output = miette::Result<Option<ResolvedPackage>>> + Send;
}
