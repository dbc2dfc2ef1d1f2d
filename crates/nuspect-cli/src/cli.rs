//! CLI argument definitions for Nuspect.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(
    name = "nuspect",
    version,
    about = "Inspect the NuGet dependencies of .NET projects",
    long_about = "Nuspect reads a .NET project file, applies central package management, \
                  and resolves its package references into a complete dependency graph."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Resolve a project and print its packages and root dependencies
    Inspect {
        /// Path to the project file (.csproj, .fsproj, .vbproj)
        project: PathBuf,
        /// Output format
        #[arg(short, long, value_enum, default_value_t = Format::Json)]
        format: Format,
        /// Write the result to a file instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
        #[command(flatten)]
        resolve: ResolveArgs,
    },

    /// Display the resolved dependency tree
    Tree {
        /// Path to the project file (.csproj, .fsproj, .vbproj)
        project: PathBuf,
        /// Maximum depth to display
        #[arg(short, long)]
        depth: Option<usize>,
        /// Show the path from a root to the named package
        #[arg(long, value_name = "PACKAGE")]
        why: Option<String>,
        #[command(flatten)]
        resolve: ResolveArgs,
    },
}

/// Options controlling where packages are resolved from and how the
/// version policy is applied.
#[derive(Args, Debug, Default)]
pub struct ResolveArgs {
    /// NuGet v3 service index URL (overrides configured sources)
    #[arg(long, value_name = "URL", conflicts_with = "catalog")]
    pub source: Option<String>,
    /// Resolve offline against a JSON package catalog
    #[arg(long, value_name = "FILE")]
    pub catalog: Option<PathBuf>,
    /// Central package versions file (skips Directory.Packages.props discovery)
    #[arg(long, value_name = "FILE", conflicts_with = "no_central")]
    pub props: Option<PathBuf>,
    /// Ignore central package management
    #[arg(long)]
    pub no_central: bool,
    /// Disallow VersionOverride on centrally managed packages
    #[arg(long)]
    pub no_version_override: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Text,
}

/// Parse command-line arguments into a [`Cli`] struct.
pub fn parse() -> Cli {
    Cli::parse()
}
