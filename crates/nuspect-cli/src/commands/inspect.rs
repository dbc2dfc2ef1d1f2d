//! Handler for `nuspect inspect`.

use std::fmt::Write as _;
use std::path::Path;

use miette::Result;

use nuspect_core::package::DependencyResult;
use nuspect_util::errors::NuspectError;

use crate::cli::{Format, ResolveArgs};

pub async fn exec(
    project: &Path,
    format: Format,
    output: Option<&Path>,
    args: &ResolveArgs,
) -> Result<()> {
    let resolution = super::resolve(project, args).await?;
    let result = &resolution.result;

    let rendered = match format {
        Format::Json => {
            let mut json = serde_json::to_string_pretty(result).map_err(|e| NuspectError::Generic {
                message: format!("Failed to serialize result: {e}"),
            })?;
            json.push('\n');
            json
        }
        Format::Text => render_text(result),
    };

    match output {
        Some(path) => {
            std::fs::write(path, &rendered).map_err(NuspectError::Io)?;
            nuspect_util::progress::status("Wrote", &path.display().to_string());
        }
        None => print!("{rendered}"),
    }

    if !result.success {
        return Err(NuspectError::Manifest {
            message: format!("Failed to resolve {}", project.display()),
        }
        .into());
    }
    Ok(())
}

/// Plain-text listing: every package with its direct dependencies, then the
/// root packages.
fn render_text(result: &DependencyResult) -> String {
    let mut out = String::new();
    if !result.success {
        out.push_str("Resolution failed.\n");
        return out;
    }

    let _ = writeln!(out, "Packages ({}):", result.packages.len());
    for package in &result.packages {
        let _ = writeln!(out, "  {}", package.package_id);
        for dep in &package.dependencies {
            let _ = writeln!(out, "    -> {dep}");
        }
    }
    let _ = writeln!(out, "Roots ({}):", result.dependencies.len());
    for root in &result.dependencies {
        let _ = writeln!(out, "  {root}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use nuspect_core::package::{Package, PackageId};

    #[test]
    fn text_lists_packages_and_roots() {
        let a = PackageId::new("A", "1.0.0");
        let b = PackageId::new("B", "2.0.0");
        let mut package_a = Package::new(a.clone());
        package_a.dependencies.insert(b.clone());
        let result = DependencyResult {
            success: true,
            packages: vec![package_a, Package::new(b)],
            dependencies: vec![a],
        };

        assert_eq!(
            render_text(&result),
            "Packages (2):\n  A/1.0.0\n    -> B/2.0.0\n  B/2.0.0\nRoots (1):\n  A/1.0.0\n"
        );
    }

    #[test]
    fn text_for_failure() {
        assert_eq!(render_text(&DependencyResult::failure()), "Resolution failed.\n");
    }
}
