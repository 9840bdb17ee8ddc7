use std::fs;

use assert_matches::assert_matches;
use camino::Utf8PathBuf;

use biomedsheets::config::{Config, ConfigLoader, SheetConfigEntry};
use biomedsheets::domain::{AssaySelector, SheetType};
use biomedsheets::error::SheetError;

#[test]
fn detailed_entry_sets_type_and_paths() {
    let temp = tempfile::tempdir().unwrap();
    let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap();
    let config_path = root.join("biomedsheets.json");
    fs::write(
        config_path.as_std_path(),
        r#"{
            "sheet": {"path": "sheets/tumor.json", "type": "cancer", "selector": "ngs_library"},
            "ped_output": "/abs/out.ped",
            "only_with_dna_library": true
        }"#,
    )
    .unwrap();

    let resolved = ConfigLoader::resolve(Some(config_path.as_str())).unwrap();
    assert_eq!(resolved.sheet_path, root.join("sheets/tumor.json"));
    assert_eq!(resolved.sheet_type, SheetType::Cancer);
    assert_eq!(resolved.selector, AssaySelector::NgsLibrary);
    assert_eq!(resolved.ped_output, Some(Utf8PathBuf::from("/abs/out.ped")));
    assert!(resolved.only_with_dna_library);
    assert_eq!(resolved.join_by_field, None);
}

#[test]
fn shorthand_entry_parses() {
    let config: Config =
        serde_json::from_str(r#"{"sheet": "sheet.json", "join_by_field": "familyId"}"#).unwrap();
    assert_matches!(config.sheet, SheetConfigEntry::Shorthand(ref path) if path == "sheet.json");
    assert_eq!(config.join_by_field.as_deref(), Some("familyId"));
}

#[test]
fn unknown_sheet_type_is_a_parse_error() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("biomedsheets.json");
    fs::write(&path, r#"{"sheet": {"path": "s.json", "type": "tumor"}}"#).unwrap();
    let err = ConfigLoader::resolve(path.to_str()).unwrap_err();
    assert_matches!(err, SheetError::ConfigParse(_));
}

#[test]
fn explicit_missing_file_is_a_read_error() {
    let err = ConfigLoader::resolve(Some("/nonexistent/biomedsheets.json")).unwrap_err();
    assert_matches!(err, SheetError::ConfigRead(_));
}
