use nuspect_core::dependency::NugetDependency;
use nuspect_core::package::PackageId;
use nuspect_registry::memory::InMemorySource;
use nuspect_registry::source::PackageSource;
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
fn test_load_catalog_fixture() {
    let source = InMemorySource::from_path(&fixtures_dir().join("catalog.json")).unwrap();
    assert_eq!(source.len(), 11);
}

#[test]
fn test_missing_catalog_is_error() {
    let err = InMemorySource::from_path(&fixtures_dir().join("missing.json")).unwrap_err();
    assert!(err.to_string().starts_with("Registry error"), "got: {err}");
}

#[tokio::test]
async fn test_fixture_lookup_floating_range() {
    let source = InMemorySource::from_path(&fixtures_dir().join("catalog.json")).unwrap();
    let dep = NugetDependency::parse("Newtonsoft.Json", "13.*").unwrap();
    let resolved = source.lookup(&dep).await.unwrap().unwrap();
    assert_eq!(resolved.id, PackageId::new("Newtonsoft.Json", "13.0.3"));
}

#[tokio::test]
async fn test_fixture_lookup_four_part_version_range() {
    let source = InMemorySource::from_path(&fixtures_dir().join("catalog.json")).unwrap();
    let dep = NugetDependency::parse("Newtonsoft.Json", "9.0.0.0").unwrap();
    let resolved = source.lookup(&dep).await.unwrap().unwrap();
    assert_eq!(resolved.id.version, "9.0.1");
}

#[tokio::test]
async fn test_lookup_is_idempotent() {
    let source = InMemorySource::from_path(&fixtures_dir().join("catalog.json")).unwrap();
    let dep = NugetDependency::parse("Serilog", "3.1.1").unwrap();
    let first = source.lookup(&dep).await.unwrap();
    let second = source.lookup(&dep).await.unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_catalog_with_bom_and_invalid_range() {
    let tmp = tempfile::TempDir::new().unwrap();
    let good = tmp.path().join("good.json");
    std::fs::write(
        &good,
        "\u{feff}{ \"packages\": [ { \"id\": \"A\", \"version\": \"1.0.0\" } ] }",
    )
    .unwrap();
    assert_eq!(InMemorySource::from_path(&good).unwrap().len(), 1);

    let bad = tmp.path().join("bad.json");
    std::fs::write(
        &bad,
        r#"{ "packages": [ { "id": "A", "version": "1.0.0", "dependencies": { "B": "(1.0.0)" } } ] }"#,
    )
    .unwrap();
    let err = InMemorySource::from_path(&bad).unwrap_err();
    assert!(err.to_string().starts_with("Invalid version"), "got: {err}");
}
