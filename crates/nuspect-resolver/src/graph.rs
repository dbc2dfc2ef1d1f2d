//! Resolved package graph construction and traversal.

use std::collections::{HashMap, HashSet};

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;

use nuspect_core::package::{Package, PackageId};

use crate::roots::find_roots;

/// A resolved package graph backed by petgraph. Nodes are keyed by full
/// `PackageId`, so several versions of one package may coexist.
#[derive(Debug, Default)]
pub struct PackageGraph {
    graph: DiGraph<PackageId, ()>,
    index: HashMap<PackageId, NodeIndex>,
}

impl PackageGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a graph from a resolved package list.
    pub fn from_packages(packages: &[Package]) -> Self {
        let mut graph = Self::new();
        for package in packages {
            graph.add_package(package.package_id.clone());
        }
        for package in packages {
            let (from, _) = graph.add_package(package.package_id.clone());
            for dep in &package.dependencies {
                let (to, _) = graph.add_package(dep.clone());
                graph.add_dependency(from, to);
            }
        }
        graph
    }

    /// Add a package, or retrieve it if already present. The flag is `true`
    /// when the package was newly inserted.
    pub fn add_package(&mut self, id: PackageId) -> (NodeIndex, bool) {
        if let Some(&idx) = self.index.get(&id) {
            return (idx, false);
        }
        let idx = self.graph.add_node(id.clone());
        self.index.insert(id, idx);
        (idx, true)
    }

    /// Record that `from` depends on `to`.
    pub fn add_dependency(&mut self, from: NodeIndex, to: NodeIndex) {
        if !self.graph.edges(from).any(|e| e.target() == to) {
            self.graph.add_edge(from, to, ());
        }
    }

    pub fn contains(&self, id: &PackageId) -> bool {
        self.index.contains_key(id)
    }

    pub fn find(&self, id: &PackageId) -> Option<NodeIndex> {
        self.index.get(id).copied()
    }

    /// Direct dependencies of a node.
    pub fn dependencies_of(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        let mut deps: Vec<NodeIndex> = self
            .graph
            .edges_directed(idx, Direction::Outgoing)
            .map(|e| e.target())
            .collect();
        deps.sort_by(|a, b| self.graph[*a].cmp(&self.graph[*b]));
        deps
    }

    /// Every node as a `Package`, in insertion order.
    pub fn packages(&self) -> Vec<Package> {
        self.graph
            .node_indices()
            .map(|idx| Package {
                package_id: self.graph[idx].clone(),
                dependencies: self
                    .graph
                    .edges_directed(idx, Direction::Outgoing)
                    .map(|e| self.graph[e.target()].clone())
                    .collect(),
            })
            .collect()
    }

    /// Packages no other package depends on.
    pub fn roots(&self) -> Vec<PackageId> {
        find_roots(&self.packages())
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Print each root and its dependency subtree.
    ///
    /// A package already printed on the current path is shown once and not
    /// descended into again, so cycles print finitely.
    pub fn print_tree(&self, max_depth: Option<usize>) -> String {
        let mut output = String::new();
        let roots: Vec<NodeIndex> = self
            .roots()
            .iter()
            .filter_map(|id| self.find(id))
            .collect();

        for root in roots {
            output.push_str(&format!("{}\n", self.graph[root]));
            let mut visited = HashSet::new();
            visited.insert(root);
            let deps = self.dependencies_of(root);
            let count = deps.len();
            for (i, child) in deps.into_iter().enumerate() {
                self.print_subtree(&mut output, child, "", i == count - 1, 1, max_depth, &mut visited);
            }
        }
        output
    }

    #[allow(clippy::too_many_arguments)]
    fn print_subtree(
        &self,
        output: &mut String,
        idx: NodeIndex,
        prefix: &str,
        is_last: bool,
        depth: usize,
        max_depth: Option<usize>,
        visited: &mut HashSet<NodeIndex>,
    ) {
        let connector = if is_last { "└── " } else { "├── " };
        output.push_str(&format!("{prefix}{connector}{}\n", self.graph[idx]));

        if let Some(max) = max_depth {
            if depth >= max {
                return;
            }
        }

        if !visited.insert(idx) {
            return;
        }

        let child_prefix = format!("{prefix}{}", if is_last { "    " } else { "│   " });
        let deps = self.dependencies_of(idx);
        let count = deps.len();
        for (i, child) in deps.into_iter().enumerate() {
            self.print_subtree(
                output,
                child,
                &child_prefix,
                i == count - 1,
                depth + 1,
                max_depth,
                visited,
            );
        }

        visited.remove(&idx);
    }

    /// Find a path from a root package to the package named `name`
    /// (case-insensitive, any version).
    pub fn find_path(&self, name: &str) -> Option<Vec<&PackageId>> {
        let target = self
            .graph
            .node_indices()
            .find(|&idx| self.graph[idx].name.eq_ignore_ascii_case(name))?;

        for root in self.roots() {
            let Some(start) = self.find(&root) else {
                continue;
            };
            let mut path = Vec::new();
            let mut visited = HashSet::new();
            if self.dfs_path(start, target, &mut path, &mut visited) {
                return Some(path.iter().map(|&idx| &self.graph[idx]).collect());
            }
        }
        None
    }

    fn dfs_path(
        &self,
        current: NodeIndex,
        target: NodeIndex,
        path: &mut Vec<NodeIndex>,
        visited: &mut HashSet<NodeIndex>,
    ) -> bool {
        path.push(current);
        if current == target {
            return true;
        }
        if !visited.insert(current) {
            path.pop();
            return false;
        }
        for child in self.dependencies_of(current) {
            if self.dfs_path(child, target, path, visited) {
                return true;
            }
        }
        path.pop();
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(name: &str) -> PackageId {
        PackageId::new(name, "1.0.0")
    }

    /// A -> B -> C, A -> D
    fn sample() -> PackageGraph {
        let mut g = PackageGraph::new();
        let (a, _) = g.add_package(id("A"));
        let (b, _) = g.add_package(id("B"));
        let (c, _) = g.add_package(id("C"));
        let (d, _) = g.add_package(id("D"));
        g.add_dependency(a, b);
        g.add_dependency(b, c);
        g.add_dependency(a, d);
        g
    }

    #[test]
    fn duplicate_add_returns_same_index() {
        let mut g = PackageGraph::new();
        let (first, inserted) = g.add_package(id("A"));
        assert!(inserted);
        let (second, inserted) = g.add_package(id("A"));
        assert!(!inserted);
        assert_eq!(first, second);
        assert_eq!(g.len(), 1);
    }

    #[test]
    fn versions_are_distinct_nodes() {
        let mut g = PackageGraph::new();
        g.add_package(PackageId::new("A", "1.0.0"));
        g.add_package(PackageId::new("A", "2.0.0"));
        assert_eq!(g.len(), 2);
    }

    #[test]
    fn duplicate_edges_collapse() {
        let mut g = PackageGraph::new();
        let (a, _) = g.add_package(id("A"));
        let (b, _) = g.add_package(id("B"));
        g.add_dependency(a, b);
        g.add_dependency(a, b);
        assert_eq!(g.packages()[0].dependencies.len(), 1);
    }

    #[test]
    fn packages_are_closed_and_ordered() {
        let packages = sample().packages();
        let names: Vec<&str> = packages.iter().map(|p| p.package_id.name.as_str()).collect();
        assert_eq!(names, ["A", "B", "C", "D"]);
        assert_eq!(packages[0].dependencies.len(), 2);
        assert!(packages[2].dependencies.is_empty());
    }

    #[test]
    fn roots_of_sample() {
        assert_eq!(sample().roots(), [id("A")]);
    }

    #[test]
    fn tree_printing() {
        let tree = sample().print_tree(None);
        assert!(tree.starts_with("A/1.0.0\n"));
        assert!(tree.contains("├── B/1.0.0"));
        assert!(tree.contains("│   └── C/1.0.0"));
        assert!(tree.contains("└── D/1.0.0"));
    }

    #[test]
    fn tree_depth_limit() {
        let tree = sample().print_tree(Some(1));
        assert!(tree.contains("B/1.0.0"));
        assert!(!tree.contains("C/1.0.0"));
    }

    #[test]
    fn find_path_exists() {
        let g = sample();
        let path = g.find_path("c").unwrap();
        let names: Vec<&str> = path.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["A", "B", "C"]);
    }

    #[test]
    fn rebuilt_graph_matches_original() {
        let original = sample();
        let rebuilt = PackageGraph::from_packages(&original.packages());
        assert_eq!(rebuilt.packages(), original.packages());
        assert_eq!(rebuilt.print_tree(None), original.print_tree(None));
    }

    #[test]
    fn find_path_not_found() {
        assert!(sample().find_path("Missing").is_none());
    }
}
