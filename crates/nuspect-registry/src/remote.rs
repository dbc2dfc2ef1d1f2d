//! NuGet v3 protocol source: service index discovery and registration lookups.

use reqwest::Client;
use tokio::sync::OnceCell;
use tracing::debug;

use nuspect_core::config::NUGET_ORG_INDEX;
use nuspect_core::dependency::NugetDependency;
use nuspect_core::package::PackageId;
use nuspect_core::version::NuGetVersion;
use nuspect_util::errors::NuspectError;

use crate::download::fetch_json;
use crate::registration::{CatalogEntry, RegistrationIndex, RegistrationPage, ServiceIndex};
use crate::source::{PackageSource, ResolvedPackage};

/// A remote NuGet v3 feed addressed by its service index URL.
#[derive(Debug)]
pub struct RemoteSource {
    client: Client,
    index_url: String,
    registrations_base: OnceCell<String>,
}

impl RemoteSource {
    pub fn new(client: Client, index_url: impl Into<String>) -> Self {
        Self {
            client,
            index_url: index_url.into(),
            registrations_base: OnceCell::new(),
        }
    }

    /// The public nuget.org feed.
    pub fn nuget_org(client: Client) -> Self {
        Self::new(client, NUGET_ORG_INDEX)
    }

    pub fn index_url(&self) -> &str {
        &self.index_url
    }

    /// Registration base URL, read from the service index on first use.
    async fn registrations_base(&self) -> miette::Result<&str> {
        let base = self
            .registrations_base
            .get_or_try_init(|| async {
                let index: ServiceIndex = fetch_json(&self.client, &self.index_url)
                    .await?
                    .ok_or_else(|| NuspectError::Registry {
                        message: format!("No service index at {}", self.index_url),
                    })?;
                let base = index.registrations_base_url().ok_or_else(|| NuspectError::Registry {
                    message: format!("{} has no RegistrationsBaseUrl resource", self.index_url),
                })?;
                Ok::<_, miette::Report>(base.to_string())
            })
            .await?;
        Ok(base.as_str())
    }

    /// Every catalog entry the feed lists for `id`, or `None` when the feed
    /// does not know the package.
    async fn catalog_entries(&self, id: &str) -> miette::Result<Option<Vec<CatalogEntry>>> {
        let base = self.registrations_base().await?;
        let url = registration_index_url(base, id);
        let Some(index) = fetch_json::<RegistrationIndex>(&self.client, &url).await? else {
            return Ok(None);
        };

        let mut entries = Vec::new();
        for page in index.items {
            let leaves = match page.items {
                Some(items) => items,
                None => {
                    debug!(page = %page.id, "fetching registration page");
                    fetch_json::<RegistrationPage>(&self.client, &page.id)
                        .await?
                        .and_then(|p| p.items)
                        .unwrap_or_default()
                }
            };
            entries.extend(leaves.into_iter().map(|leaf| leaf.catalog_entry));
        }
        Ok(Some(entries))
    }
}

/// `{base}/{id-lower}/index.json`
pub fn registration_index_url(base: &str, id: &str) -> String {
    format!("{}/{}/index.json", base.trim_end_matches('/'), id.to_lowercase())
}

/// Choose the entry a restore would pick for `dependency`, preferring listed
/// versions and falling back to unlisted ones.
pub fn select_entry<'a>(
    entries: &'a [CatalogEntry],
    dependency: &NugetDependency,
) -> Option<(&'a CatalogEntry, NuGetVersion)> {
    let parsed: Vec<(&CatalogEntry, NuGetVersion)> = entries
        .iter()
        .filter_map(|e| e.parsed_version().map(|v| (e, v)))
        .collect();

    for listed_only in [true, false] {
        let candidates: Vec<&NuGetVersion> = parsed
            .iter()
            .filter(|(e, _)| e.listed || !listed_only)
            .map(|(_, v)| v)
            .collect();
        if let Some(best) = dependency.version_range.find_best_match(candidates) {
            return parsed
                .iter()
                .find(|(_, v)| v == best)
                .map(|(e, v)| (*e, v.clone()));
        }
    }
    None
}

impl PackageSource for RemoteSource {
    async fn lookup(&self, dependency: &NugetDependency) -> miette::Result<Option<ResolvedPackage>> {
        let Some(entries) = self.catalog_entries(&dependency.name).await? else {
            debug!(%dependency, source = %self.index_url, "package not found");
            return Ok(None);
        };
        Ok(select_entry(&entries, dependency).map(|(entry, version)| ResolvedPackage {
            id: PackageId::new(entry.id.clone(), version.to_normalized_string()),
            dependencies: entry.flattened_dependencies(),
        }))
    }
}

/// Several feeds consulted in order; the first feed that resolves a
/// dependency wins.
#[derive(Debug, Default)]
pub struct FeedSet {
    feeds: Vec<RemoteSource>,
}

impl FeedSet {
    pub fn new(feeds: Vec<RemoteSource>) -> Self {
        Self { feeds }
    }

    pub fn feeds(&self) -> &[RemoteSource] {
        &self.feeds
    }
}

impl PackageSource for FeedSet {
    /// A feed that fails is skipped. The last failure is returned only when
    /// no feed resolved the dependency and at least one failed.
    async fn lookup(&self, dependency: &NugetDependency) -> miette::Result<Option<ResolvedPackage>> {
        let mut last_error = None;
        for feed in &self.feeds {
            match feed.lookup(dependency).await {
                Ok(Some(resolved)) => return Ok(Some(resolved)),
                Ok(None) => continue,
                Err(e) => {
                    debug!(%dependency, source = %feed.index_url, error = %e, "feed lookup failed");
                    last_error = Some(e);
                }
            }
        }
        match last_error {
            Some(e) => Err(e),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(version: &str, listed: bool) -> CatalogEntry {
        CatalogEntry {
            id: "Serilog".to_string(),
            version: version.to_string(),
            listed,
            dependency_groups: Vec::new(),
        }
    }

    #[tokio::test]
    async fn empty_feed_set_resolves_nothing() {
        let dep = NugetDependency::parse("Serilog", "3.0").unwrap();
        assert!(FeedSet::default().lookup(&dep).await.unwrap().is_none());
    }

    #[test]
    fn registration_url_lowercases_id() {
        assert_eq!(
            registration_index_url("https://api.nuget.org/v3/registration5-semver1/", "Newtonsoft.Json"),
            "https://api.nuget.org/v3/registration5-semver1/newtonsoft.json/index.json"
        );
    }

    #[test]
    fn select_prefers_listed_versions() {
        let entries = [entry("2.0.0", false), entry("2.1.0", true)];
        let dep = NugetDependency::parse("Serilog", "2.0").unwrap();
        let (chosen, version) = select_entry(&entries, &dep).unwrap();
        assert_eq!(chosen.version, "2.1.0");
        assert_eq!(version.to_normalized_string(), "2.1.0");
    }

    #[test]
    fn select_falls_back_to_unlisted() {
        let entries = [entry("2.0.0", false), entry("3.0.0", true)];
        let dep = NugetDependency::parse("Serilog", "[2.0.0]").unwrap();
        let (chosen, _) = select_entry(&entries, &dep).unwrap();
        assert_eq!(chosen.version, "2.0.0");
    }

    #[test]
    fn select_skips_unparseable_versions() {
        let entries = [entry("garbage", true)];
        let dep = NugetDependency::parse("Serilog", "0.0.1").unwrap();
        assert!(select_entry(&entries, &dep).is_none());
    }
}
