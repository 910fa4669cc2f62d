use binmap_core::layout::{OutputLayout, REPORT_FILE_NAME};
use binmap_core::version;

#[test]
fn version_is_non_empty() {
    let v = version();
    assert!(!v.is_empty());
}

#[test]
fn layout_places_outputs_under_destination_root() {
    let root = tempfile::tempdir().unwrap();
    let layout = OutputLayout::new(root.path(), "run42", ".checkout");
    assert!(layout.run_dir.ends_with("run42"));
    assert!(layout.report_path.ends_with(REPORT_FILE_NAME));
    assert!(layout.manifest_path.ends_with("binaries.json"));
    assert!(layout.log_path.starts_with(root.path()));
    assert!(layout.staging_for("Autocenter").ends_with(".checkout/Autocenter"));
}

#[test]
fn unit_dest_joins_relative_path_under_run_dir() {
    let root = tempfile::tempdir().unwrap();
    let layout = OutputLayout::new(root.path(), "package", ".checkout");
    let dest = layout.unit_dest(std::path::Path::new("Automation/Server"));
    assert_eq!(dest, root.path().join("package").join("Automation/Server"));
}

#[test]
fn run_dir_containment_is_lexical_and_strict() {
    let root = tempfile::tempdir().unwrap();
    let layout = OutputLayout::new(root.path(), "package", ".checkout");
    assert!(layout.is_within_run_dir(&layout.run_dir.join("Automation/Server")));
    assert!(!layout.is_within_run_dir(&layout.run_dir));
    assert!(!layout.is_within_run_dir(&layout.run_dir.join("../..")));
    assert!(!layout.is_within_run_dir(&layout.run_dir.join("Automation/../../x")));
    assert!(!layout.is_within_run_dir(root.path()));
}
