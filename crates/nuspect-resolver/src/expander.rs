//! Package graph expansion: resolves normalized dependencies through a
//! `PackageSource` and follows their dependencies until nothing new appears.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use petgraph::graph::NodeIndex;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use nuspect_core::dependency::NugetDependency;
use nuspect_registry::source::{PackageSource, ResolvedPackage};

use crate::graph::PackageGraph;

/// Maximum number of registry lookups in flight at once.
pub const DEFAULT_MAX_CONCURRENT_LOOKUPS: usize = 8;

/// Memo key: lower-cased package name plus the range as written.
type LookupKey = (String, String);

fn lookup_key(dependency: &NugetDependency) -> LookupKey {
    (
        dependency.name.to_ascii_lowercase(),
        dependency.version_range.to_string(),
    )
}

struct QueueEntry {
    dependency: NugetDependency,
    depth: usize,
    parent: Option<NodeIndex>,
}

/// The outcome of an expansion: a closed package graph plus every
/// dependency the source could not resolve.
#[derive(Debug, Default)]
pub struct Expansion {
    pub graph: PackageGraph,
    pub unresolved: Vec<NugetDependency>,
}

/// Expands a dependency list into a package graph, one depth level at a
/// time, with the lookups of each level issued concurrently.
pub struct GraphExpander<S> {
    source: Arc<S>,
    max_concurrent: usize,
}

impl<S: PackageSource + 'static> GraphExpander<S> {
    pub fn new(source: Arc<S>) -> Self {
        Self {
            source,
            max_concurrent: DEFAULT_MAX_CONCURRENT_LOOKUPS,
        }
    }

    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent.max(1);
        self
    }

    pub async fn expand(&self, dependencies: Vec<NugetDependency>) -> Expansion {
        let mut expansion = Expansion::default();
        let mut memo: HashMap<LookupKey, Option<ResolvedPackage>> = HashMap::new();
        let mut reported: HashSet<LookupKey> = HashSet::new();
        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));

        let mut queue: VecDeque<QueueEntry> = dependencies
            .into_iter()
            .map(|dependency| QueueEntry {
                dependency,
                depth: 0,
                parent: None,
            })
            .collect();

        while let Some(current_depth) = queue.front().map(|e| e.depth) {
            let mut level = Vec::new();
            while queue.front().is_some_and(|e| e.depth == current_depth) {
                level.extend(queue.pop_front());
            }

            self.prefetch(&level, &mut memo, &semaphore).await;

            for entry in level {
                let key = lookup_key(&entry.dependency);
                let Some(resolved) = memo.get(&key).cloned().flatten() else {
                    if reported.insert(key) {
                        warn!(dependency = %entry.dependency, "unable to resolve dependency");
                        expansion.unresolved.push(entry.dependency);
                    }
                    continue;
                };

                let (node, inserted) = expansion.graph.add_package(resolved.id.clone());
                if let Some(parent) = entry.parent {
                    expansion.graph.add_dependency(parent, node);
                }
                if !inserted {
                    continue;
                }

                debug!(package = %resolved.id, depth = entry.depth, "added package");
                queue.extend(resolved.dependencies.into_iter().map(|dependency| QueueEntry {
                    dependency,
                    depth: entry.depth + 1,
                    parent: Some(node),
                }));
            }
        }

        expansion
    }

    /// Look up every dependency of a level not already memoized. Results are
    /// merged into `memo` only after every lookup of the level completes.
    async fn prefetch(
        &self,
        level: &[QueueEntry],
        memo: &mut HashMap<LookupKey, Option<ResolvedPackage>>,
        semaphore: &Arc<Semaphore>,
    ) {
        let mut pending: HashMap<LookupKey, NugetDependency> = HashMap::new();
        for entry in level {
            let key = lookup_key(&entry.dependency);
            if !memo.contains_key(&key) {
                pending.entry(key).or_insert_with(|| entry.dependency.clone());
            }
        }
        if pending.is_empty() {
            return;
        }

        let mut join_set = JoinSet::new();
        for (key, dependency) in pending {
            let source = Arc::clone(&self.source);
            let sem = Arc::clone(semaphore);
            join_set.spawn(async move {
                let _permit = sem.acquire().await;
                let result = source.lookup(&dependency).await;
                (key, dependency, result)
            });
        }

        let mut fetched = Vec::new();
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((key, _, Ok(resolved))) => fetched.push((key, resolved)),
                Ok((key, dependency, Err(e))) => {
                    warn!(%dependency, error = %e, "package lookup failed");
                    fetched.push((key, None));
                }
                Err(e) => warn!(error = %e, "package lookup task failed"),
            }
        }
        memo.extend(fetched);
    }
}
