use std::fs;

use binmap::{canonicalize_or_current, init_logging, is_official_build};
use tempfile::tempdir;

#[test]
fn canonicalize_or_current_returns_cwd_for_dot() {
    let cwd = std::env::current_dir().expect("cwd");
    let result = canonicalize_or_current(".").expect("canonicalize");
    assert_eq!(result, cwd);
}

#[test]
fn canonicalize_or_current_resolves_existing_path() {
    let tmp = tempdir().expect("tempdir");
    let subdir = tmp.path().join("nested");
    fs::create_dir_all(&subdir).expect("create nested");

    let result = canonicalize_or_current(subdir.to_str().unwrap()).expect("canonicalize nested");
    assert_eq!(result, subdir.canonicalize().expect("canonicalize subdir"));
}

#[test]
fn canonicalize_or_current_keeps_missing_paths_absolute() {
    let result = canonicalize_or_current("does/not/exist/yet").expect("canonicalize");
    assert!(result.is_absolute());
    assert!(result.ends_with("does/not/exist/yet"));
}

#[test]
fn official_flag_values() {
    for flag in ["true", "TRUE", "1", "yes", "official", " True "] {
        assert!(is_official_build(Some(flag)), "{flag}");
    }
    for flag in ["false", "0", "", "run analysis"] {
        assert!(!is_official_build(Some(flag)), "{flag}");
    }
    assert!(!is_official_build(None));
}

#[test]
fn init_logging_creates_log_file_and_is_repeatable() {
    let tmp = tempdir().expect("tempdir");
    let log = tmp.path().join("out/binmap.log");
    init_logging(&log).expect("first init");
    init_logging(&log).expect("second init");
    assert!(log.is_file());
}
