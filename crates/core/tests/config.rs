use std::fs;

use binmap_core::config::{MasterConfig, ToolConfig};
use binmap_core::BinmapError;
use tempfile::tempdir;

#[test]
fn defaults_match_pool_limits_and_roots() {
    let config = ToolConfig::default();
    assert_eq!(config.pool.concurrency, 2);
    assert_eq!(config.pool.max_dispatch, 20);
    assert_eq!(config.roots.sdk_root, "cvpysdk");
    assert_eq!(config.roots.automation_root, "Automation");
    assert_eq!(config.exclude_dirs, vec![".svn", ".git"]);
}

#[test]
fn partial_yaml_overrides_only_given_fields() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("binmap.yaml");
    fs::write(&path, "pool:\n  concurrency: 4\nrun_name: nightly\n").unwrap();

    let config = ToolConfig::load(&path).unwrap();
    assert_eq!(config.pool.concurrency, 4);
    assert_eq!(config.pool.max_dispatch, 20);
    assert_eq!(config.run_name, "nightly");
}

#[test]
fn json_config_is_parsed_by_extension() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("binmap.json");
    fs::write(&path, r#"{"vcs": {"repository_url": "svn://example/repo/"}}"#).unwrap();

    let config = ToolConfig::load(&path).unwrap();
    assert_eq!(
        config.vcs.upstream_url(&config.vcs.full_checkout.upstream_path),
        "svn://example/repo/Automation/Autocenter"
    );
}

#[test]
fn malformed_config_is_config_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad.json");
    fs::write(&path, "{").unwrap();
    let err = ToolConfig::load(&path).unwrap_err();
    assert!(matches!(err, BinmapError::Config { .. }));
}

#[test]
fn missing_config_path_falls_back_to_defaults() {
    assert_eq!(ToolConfig::load_or_default(None).unwrap(), ToolConfig::default());
}

#[test]
fn master_placeholder_rules() {
    let master = MasterConfig::default();
    assert!(master.is_placeholder("cv-automation-master"));
    assert!(master.is_placeholder("cv-wc-master"));
    assert!(!master.is_placeholder("cvpysdk-master"));
    assert!(!master.is_placeholder("Server"));
}

#[test]
fn checkout_markers_match_by_substring() {
    let config = ToolConfig::default();
    assert!(config.vcs.full_checkout.matches("Autocenter"));
    assert!(config.vcs.packages_overlay.matches("WebConsole"));
    assert!(!config.vcs.packages_overlay.matches("Server"));
}

#[test]
fn dependency_manifest_url_requires_base_and_subfolder() {
    let mut config = ToolConfig::default();
    assert_eq!(config.dependency_manifests.url_for("Web"), None);
    config.dependency_manifests.base_url = "https://deps.example/".into();
    assert_eq!(
        config.dependency_manifests.url_for("Web").as_deref(),
        Some("https://deps.example/Web/requirements.txt")
    );
    assert_eq!(config.dependency_manifests.url_for("Server"), None);
}
