//! Root identification: the packages no other package depends on.

use std::collections::HashSet;

use nuspect_core::package::{Package, PackageId};

/// Packages in `packages` that appear in no other package's dependency set,
/// in list order.
///
/// A package listing itself does not stop it from being a root.
pub fn find_roots(packages: &[Package]) -> Vec<PackageId> {
    let referenced: HashSet<&PackageId> = packages
        .iter()
        .flat_map(|p| p.dependencies.iter().filter(move |d| **d != p.package_id))
        .collect();

    packages
        .iter()
        .map(|p| &p.package_id)
        .filter(|id| !referenced.contains(id))
        .cloned()
        .collect()
}
