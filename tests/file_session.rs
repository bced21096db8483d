// tests/file_session.rs

use std::error::Error;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use loadgate::build_session;
use loadgate::cli::LogLevel;
use loadgate::errors::LoadError;
use loadgate::fs::mock::MockFileSystem;
use loadgate::fs::{FileSystem, RealFileSystem};
use loadgate::logging::resolve_level;
use loadgate::manifest::load_and_validate_with;
use loadgate::resource_root;
use loadgate_test_utils::builders::ManifestBuilder;
use loadgate_test_utils::{init_tracing, with_timeout};

type TestResult = Result<(), Box<dyn Error>>;

fn site_fs(files: &[&str]) -> MockFileSystem {
    let mock = MockFileSystem::new();
    for file in files {
        mock.add_file(Path::new("/site").join(file), format!("/* {file} */"));
    }
    mock
}

#[tokio::test]
async fn session_preloads_then_loads_units_after_dependencies() -> TestResult {
    init_tracing();

    let manifest = ManifestBuilder::new()
        .style("css/site.css")
        .head("js/vendor.js")
        .unit("core", "js/core.js", &[])
        .unit("app", "js/app.js", &["core"])
        .unit("widgets", "js/widgets.js", &["core"])
        .build();
    let mock = site_fs(&[
        "css/site.css",
        "js/vendor.js",
        "js/core.js",
        "js/app.js",
        "js/widgets.js",
    ]);
    let fs: Arc<dyn FileSystem> = Arc::new(mock.clone());

    let (runtime, _handle) = build_session(&manifest, Path::new("/site"), fs).await?;
    let stats = with_timeout(runtime.run()).await?;

    assert_eq!(stats.preloaded, 2);
    assert_eq!(stats.units_completed, 3);
    assert_eq!(stats.files_loaded(), 5);

    let reads = mock.reads();
    assert_eq!(reads.len(), 5);
    assert_eq!(reads[0], PathBuf::from("/site/css/site.css"));
    assert_eq!(reads[1], PathBuf::from("/site/js/vendor.js"));
    assert_eq!(reads[2], PathBuf::from("/site/js/core.js"));

    Ok(())
}

#[tokio::test]
async fn unreadable_unit_fails_session_with_fetch_error() -> TestResult {
    init_tracing();

    let manifest = ManifestBuilder::new()
        .unit("a", "js/a.js", &[])
        .unit("b", "js/b.js", &["a"])
        .build();
    let fs: Arc<dyn FileSystem> = Arc::new(site_fs(&["js/a.js"]));

    let (runtime, _handle) = build_session(&manifest, Path::new("/site"), fs).await?;
    let err = with_timeout(runtime.run())
        .await
        .expect_err("b.js is missing");

    match err.as_load_error() {
        Some(LoadError::Fetch { id, reason }) => {
            assert_eq!(id, "b");
            assert!(reason.contains("File not found"), "reason: {reason}");
        }
        other => panic!("expected Fetch error, got {other:?}"),
    }

    Ok(())
}

#[tokio::test]
async fn unreadable_preload_stops_before_session() -> TestResult {
    init_tracing();

    let manifest = ManifestBuilder::new()
        .style("css/missing.css")
        .unit("a", "js/a.js", &[])
        .build();
    let mock = site_fs(&["js/a.js"]);
    let fs: Arc<dyn FileSystem> = Arc::new(mock.clone());

    match build_session(&manifest, Path::new("/site"), fs).await {
        Ok(_) => panic!("preload of a missing stylesheet must fail"),
        Err(err) => assert!(matches!(
            err.as_load_error(),
            Some(LoadError::Fetch { id, .. }) if id == "css/missing.css"
        )),
    }
    assert!(mock.reads().is_empty(), "no unit may be fetched");

    Ok(())
}

#[tokio::test]
async fn manifest_and_resources_load_from_real_directory() -> TestResult {
    init_tracing();

    let dir = tempfile::tempdir()?;
    std::fs::create_dir_all(dir.path().join("js"))?;
    std::fs::write(dir.path().join("js/core.js"), "core")?;
    std::fs::write(dir.path().join("js/app.js"), "app")?;
    let manifest_path = dir.path().join("loadgate.json");
    std::fs::write(
        &manifest_path,
        r#"[
            { "url": "js/core.js", "slug": "core" },
            { "url": "js/app.js", "slug": "app", "dependsOn": ["core"] }
        ]"#,
    )?;

    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    let manifest = load_and_validate_with(fs.as_ref(), &manifest_path)?;
    let root = resource_root(&manifest_path, None);
    assert_eq!(root, dir.path());

    let (runtime, _handle) = build_session(&manifest, &root, fs).await?;
    let stats = with_timeout(runtime.run()).await?;
    assert_eq!(stats.units_completed, 2);
    assert_eq!(stats.preloaded, 0);

    Ok(())
}

#[test]
fn resource_root_prefers_explicit_root() {
    let manifest = Path::new("site/loadgate.json");

    assert_eq!(resource_root(manifest, Some("/srv/www")), PathBuf::from("/srv/www"));
    assert_eq!(resource_root(manifest, None), PathBuf::from("site"));
}

#[test]
fn resource_root_of_bare_filename_is_current_dir() -> TestResult {
    let expected = std::env::current_dir()?;
    assert_eq!(resource_root(Path::new("loadgate.json"), None), expected);
    Ok(())
}

#[test]
fn log_level_prefers_cli_then_env_then_info() {
    use tracing::Level;

    assert_eq!(resolve_level(Some(LogLevel::Debug), Some("error")), Level::DEBUG);
    assert_eq!(resolve_level(None, Some("warn")), Level::WARN);
    assert_eq!(resolve_level(None, Some(" TRACE ")), Level::TRACE);
    assert_eq!(resolve_level(None, Some("loud")), Level::INFO);
    assert_eq!(resolve_level(None, None), Level::INFO);
}
