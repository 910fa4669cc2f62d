use binmap_core::config::MasterConfig;
use binmap_core::manifest::BinaryManifest;
use binmap_core::mapping::MappingTables;
use binmap_core::model::UnitKeySet;
use tempfile::tempdir;

fn keys(list: &[&str]) -> UnitKeySet {
    let mut set = UnitKeySet::new();
    for key in list {
        set.insert(*key, format!("Automation/{key}/x.py"));
    }
    set
}

#[test]
fn manifest_is_seeded_and_stable_across_runs() {
    let tables = MappingTables::default();
    let master = MasterConfig::default();
    let set = keys(&["Server", "cvpysdk", "Laptop", "CVAutomation.py"]);

    let first = BinaryManifest::from_keys(&set, &tables, &master);
    let second = BinaryManifest::from_keys(&set, &tables, &master);

    assert_eq!(first, second);
    assert_eq!(first.win_binaries[0], master.token);
    assert_eq!(
        first.win_binaries,
        vec!["cv-automation-master", "Server", "cvpysdk-master", "Laptop", "CVAutomation.py"]
    );
    // Laptop is Windows-only.
    assert_eq!(first.unix_binaries, vec!["Server", "cvpysdk", "CVAutomation.py"]);
}

#[test]
fn unmapped_keys_are_omitted() {
    let manifest = BinaryManifest::from_keys(
        &keys(&["NotAUnit", "NAS"]),
        &MappingTables::default(),
        &MasterConfig::default(),
    );
    assert_eq!(manifest.win_binaries, vec!["cv-automation-master", "NAS"]);
    assert_eq!(manifest.unix_binaries, vec!["NAS"]);
}

#[test]
fn empty_key_set_still_has_master_token() {
    let manifest = BinaryManifest::from_keys(
        &UnitKeySet::new(),
        &MappingTables::default(),
        &MasterConfig::default(),
    );
    assert_eq!(manifest.win_binaries, vec!["cv-automation-master"]);
    assert!(manifest.unix_binaries.is_empty());
}

#[test]
fn labels_are_routed_by_suffix() {
    let master = MasterConfig::default();
    let mut manifest = BinaryManifest::seeded(&master);
    manifest.add_labels(
        &["tools.tar", "setup.sh", "client.see", "run.cmd", "common.jar", "cv-wc-master", "client.see"],
        &master,
    );
    assert_eq!(
        manifest.win_binaries,
        vec!["cv-automation-master", "client.see", "run.cmd", "common.jar", "cv-wc-master"]
    );
    assert_eq!(manifest.unix_binaries, vec!["tools.tar", "setup.sh", "common.jar"]);
}

#[test]
fn written_manifest_is_real_json_with_expected_keys() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("out/binaries.json");
    let master = MasterConfig::default();
    let mut manifest = BinaryManifest::seeded(&master);
    manifest.add_labels(&["it's \"quoted\" ünïcode.jar"], &master);
    manifest.write(&path).unwrap();

    let body = std::fs::read_to_string(&path).unwrap();
    let value: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(value["WinBinaries"][0], "cv-automation-master");
    assert_eq!(value["WinBinaries"][1], "it's \"quoted\" ünïcode.jar");
    assert!(value["UnixBinaries"].is_array());
}
