mod common;

use std::collections::BTreeSet;
use std::fs;

use camino::Utf8PathBuf;
use serde_json::json;

use biomedsheets::ped::{write_pedigree, write_pedigrees_to_path};
use biomedsheets::shortcuts::germline::GermlineCaseSheet;

use common::{germline_donor, sheet};

fn family_sheet() -> biomedsheets::models::Sheet {
    sheet(vec![
        germline_donor(1, "father", json!({"sex": "male", "isAffected": "unaffected"}), true),
        germline_donor(2, "mother", json!({"sex": "female"}), false),
        germline_donor(
            3,
            "child",
            json!({"fatherPk": 1, "motherPk": 2, "sex": "male", "isAffected": "affected"}),
            true,
        ),
        germline_donor(4, "single", json!({"sex": "female"}), true),
    ])
}

#[test]
fn ped_lines_use_library_names() {
    let sheet = family_sheet();
    let case_sheet = GermlineCaseSheet::new(&sheet, None).unwrap();
    let mut out = Vec::new();
    write_pedigree(&mut out, &case_sheet.cohort.pedigrees[0]).unwrap();
    let text = String::from_utf8(out).unwrap();

    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(
        lines,
        vec![
            "FAM_000003-child\t000103-father-N1-DNA1-WES1\t0\t0\t1\t1",
            "FAM_000003-child\t000002-mother\t0\t0\t2\t0",
            "FAM_000003-child\t000303-child-N1-DNA1-WES1\t000103-father-N1-DNA1-WES1\t000002-mother\t1\t2",
        ]
    );
}

#[test]
fn ped_file_round_trips_family_and_parents() {
    let sheet = family_sheet();
    let case_sheet = GermlineCaseSheet::new(&sheet, None).unwrap();
    let temp = tempfile::tempdir().unwrap();
    let path = Utf8PathBuf::from_path_buf(temp.path().join("out/cohort.ped")).unwrap();

    write_pedigrees_to_path(&path, &case_sheet.cohort.pedigrees).unwrap();

    let content = fs::read_to_string(path.as_std_path()).unwrap();
    let rows: Vec<Vec<&str>> = content
        .lines()
        .map(|line| line.split('\t').collect())
        .collect();
    assert_eq!(rows.len(), 4);
    assert!(rows.iter().all(|row| row.len() == 6));

    let families: BTreeSet<&str> = rows.iter().map(|row| row[0]).collect();
    assert_eq!(
        families,
        BTreeSet::from(["FAM_000003-child", "FAM_000004-single"])
    );
    let parents: BTreeSet<&str> = rows
        .iter()
        .flat_map(|row| [row[2], row[3]])
        .filter(|name| *name != "0")
        .collect();
    assert_eq!(
        parents,
        BTreeSet::from(["000103-father-N1-DNA1-WES1", "000002-mother"])
    );

    let leftovers: Vec<_> = fs::read_dir(temp.path().join("out"))
        .unwrap()
        .map(|entry| entry.unwrap().file_name())
        .collect();
    assert_eq!(leftovers.len(), 1);
}
