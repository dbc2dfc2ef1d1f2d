//! Command dispatch and handler modules.

mod inspect;
mod tree;

use std::path::Path;
use std::sync::Arc;

use miette::Result;
use tracing::debug;

use nuspect_core::config::GlobalConfig;
use nuspect_registry::download::build_client;
use nuspect_registry::memory::InMemorySource;
use nuspect_registry::remote::{FeedSet, RemoteSource};
use nuspect_registry::source::PackageSource;
use nuspect_resolver::normalizer::Severity;
use nuspect_resolver::resolver::{CentralConfig, ProjectReferenceResolver, Resolution};
use nuspect_util::progress::{spinner, status, status_warn};

use crate::cli::{Cli, Command, ResolveArgs};

/// Route a parsed CLI invocation to the appropriate command handler.
pub async fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Inspect {
            project,
            format,
            output,
            resolve,
        } => inspect::exec(&project, format, output.as_deref(), &resolve).await,
        Command::Tree {
            project,
            depth,
            why,
            resolve,
        } => tree::exec(&project, depth, why.as_deref(), &resolve).await,
    }
}

/// Resolve `project` against the sources and version policy selected on
/// the command line, falling back to the global configuration.
async fn resolve(project: &Path, args: &ResolveArgs) -> Result<Resolution> {
    let config = GlobalConfig::load()?;

    let resolution = match &args.catalog {
        Some(catalog) => {
            let source = InMemorySource::from_path(catalog)?;
            run(project, Arc::new(source), args, &config).await
        }
        None => {
            let client = build_client()?;
            let urls = match &args.source {
                Some(url) => vec![url.clone()],
                None => config.source_urls(),
            };
            debug!(?urls, "resolving against package feeds");
            let feeds = urls
                .into_iter()
                .map(|url| RemoteSource::new(client.clone(), url))
                .collect();
            run(project, Arc::new(FeedSet::new(feeds)), args, &config).await
        }
    };

    report(&resolution);
    Ok(resolution)
}

async fn run<S: PackageSource + 'static>(
    project: &Path,
    source: Arc<S>,
    args: &ResolveArgs,
    config: &GlobalConfig,
) -> Resolution {
    let central = if args.no_central {
        CentralConfig::Disabled
    } else if let Some(ref props) = args.props {
        CentralConfig::Props(props.clone())
    } else {
        CentralConfig::Discover
    };

    let mut resolver = ProjectReferenceResolver::new(project, source)
        .with_central(central)
        .with_max_concurrent(config.resolution.max_concurrent_lookups);
    let check_version_override = if args.no_version_override {
        Some(false)
    } else {
        config.resolution.check_version_override
    };
    if let Some(enabled) = check_version_override {
        resolver = resolver.with_check_version_override(enabled);
    }

    status("Resolving", &project.display().to_string());
    let sp = spinner("Resolving dependencies...");
    let resolution = resolver.process_detailed().await;
    sp.finish_and_clear();
    resolution
}

fn report(resolution: &Resolution) {
    for warning in &resolution.warnings {
        if warning.severity == Severity::Warning {
            status_warn("warning", &warning.to_string());
        }
    }
    for dependency in &resolution.unresolved {
        status_warn("warning", &format!("unable to resolve {dependency}"));
    }
    if resolution.result.success {
        status(
            "Resolved",
            &format!(
                "{} packages ({} roots)",
                resolution.result.packages.len(),
                resolution.result.dependencies.len()
            ),
        );
    }
}
