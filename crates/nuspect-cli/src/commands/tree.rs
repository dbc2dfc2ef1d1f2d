//! Handler for `nuspect tree`.

use std::path::Path;

use miette::Result;

use nuspect_resolver::graph::PackageGraph;
use nuspect_util::errors::NuspectError;

use crate::cli::ResolveArgs;

pub async fn exec(
    project: &Path,
    depth: Option<usize>,
    why: Option<&str>,
    args: &ResolveArgs,
) -> Result<()> {
    let resolution = super::resolve(project, args).await?;
    if !resolution.result.success {
        return Err(NuspectError::Manifest {
            message: format!("Failed to resolve {}", project.display()),
        }
        .into());
    }

    let graph = PackageGraph::from_packages(&resolution.result.packages);

    if let Some(target) = why {
        match graph.find_path(target) {
            Some(path) => {
                println!("Path to {target}:");
                for (i, id) in path.iter().enumerate() {
                    println!("{}{id}", "  ".repeat(i));
                }
            }
            None => println!("Package '{target}' not found in the graph."),
        }
        return Ok(());
    }

    let tree = graph.print_tree(depth);
    if tree.is_empty() {
        println!("No root packages.");
    } else {
        print!("{tree}");
    }
    Ok(())
}
