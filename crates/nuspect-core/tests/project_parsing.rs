use nuspect_core::project::Project;
use std::path::PathBuf;

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .join("tests/fixtures")
}

#[test]
fn test_parse_sdk_style_fixture() {
    let project = Project::from_path(&fixtures_dir().join("sdk-style.csproj")).unwrap();
    assert_eq!(project.property("TargetFramework"), Some("net8.0"));
    assert_eq!(project.package_references.len(), 5);

    let serilog = &project.package_references[1];
    assert_eq!(serilog.include, "Serilog");
    assert_eq!(serilog.version.as_deref(), Some("3.1.1"));

    let polly = &project.package_references[2];
    assert_eq!(polly.version.as_deref(), Some("[8.0.0, 9.0.0)"));

    assert!(project.references.is_empty());
}

#[test]
fn test_parse_legacy_fixture() {
    let project = Project::from_path(&fixtures_dir().join("legacy.csproj")).unwrap();
    assert!(project.package_references.is_empty());
    assert_eq!(project.references.len(), 4);
    assert_eq!(project.references[0].include, "System");
    assert!(project.references[2].include.starts_with("Newtonsoft.Json, Version=9.0.0.0"));
    assert_eq!(project.property("OutputType"), Some("Library"));
}

#[test]
fn test_parse_central_project_fixture() {
    let path = fixtures_dir().join("central/src/App/App.csproj");
    let project = Project::from_path(&path).unwrap();
    assert_eq!(project.package_references[0].version, None);
    assert_eq!(
        project.package_references[1].version_override.as_deref(),
        Some("2.12.0")
    );
}

#[test]
fn test_malformed_fixture_fails() {
    let err = Project::from_path(&fixtures_dir().join("malformed.csproj")).unwrap_err();
    assert!(err.to_string().starts_with("Manifest error"), "got: {err}");
}

#[test]
fn test_missing_file_is_manifest_error() {
    let err = Project::from_path(&fixtures_dir().join("does-not-exist.csproj")).unwrap_err();
    assert!(err.to_string().starts_with("Manifest error"), "got: {err}");
}
