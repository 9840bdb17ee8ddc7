mod common;

use assert_matches::assert_matches;
use serde_json::json;

use biomedsheets::domain::{AssaySelector, ExtraValue, Pk};
use biomedsheets::error::SheetError;
use biomedsheets::loader::SheetLoader;
use biomedsheets::models::{Entry, SheetNode};
use biomedsheets::shortcuts::Shortcut;
use biomedsheets::shortcuts::generic::GenericCaseSheet;

use common::{bio_entity, bio_sample, library, sheet, test_sample};

#[test]
fn loads_mixed_primary_keys_and_extra_infos() {
    let sheet = SheetLoader::from_json(
        r#"{
            "identifier": "urn:test",
            "title": "Mixed",
            "bio_entities": [
                {
                    "pk": "0042",
                    "secondary_id": "P001",
                    "extra_infos": {"ncbiTaxon": 9606, "ratio": 0.5, "isAffected": "affected"},
                    "bio_samples": []
                },
                {"pk": 7, "secondary_id": "P002", "disabled": true}
            ]
        }"#,
    )
    .unwrap();

    assert_eq!(sheet.identifier(), "urn:test");
    let first = &sheet.bio_entities()["P001"];
    assert_eq!(first.pk(), &Pk::new("0042"));
    assert_eq!(first.extra_infos().get("ncbiTaxon"), Some(&ExtraValue::Integer(9606)));
    assert_eq!(first.extra_infos().get("ratio"), Some(&ExtraValue::Float(0.5)));
    let second = &sheet.bio_entities()["P002"];
    assert!(second.disabled());
    assert_eq!(second.pk().padded(), "000007");
}

#[test]
fn serialized_sheet_loads_back() {
    let original = sheet(vec![bio_entity(
        1,
        "P001",
        json!({"sex": "female"}),
        vec![bio_sample(
            2,
            "N1",
            json!({}),
            vec![test_sample(3, "DNA1", "DNA", vec![library(4, "WES1")])],
        )],
    )]);
    let text = serde_json::to_string(&original).unwrap();
    let reloaded = SheetLoader::from_json(&text).unwrap();
    assert_eq!(original, reloaded);
}

#[test]
fn crawl_reaches_every_level() {
    let sheet = sheet(vec![bio_entity(
        1,
        "P001",
        json!({}),
        vec![bio_sample(
            2,
            "N1",
            json!({}),
            vec![test_sample(3, "DNA1", "DNA", vec![library(4, "WES1")])],
        )],
    )]);

    assert_matches!(sheet.crawl("P001").unwrap(), SheetNode::BioEntity(_));
    assert_matches!(sheet.crawl("P001-N1").unwrap(), SheetNode::BioSample(_));
    assert_matches!(sheet.crawl("P001-N1-DNA1").unwrap(), SheetNode::TestSample(_));
    let node = sheet.crawl("P001-N1-DNA1-WES1").unwrap();
    assert_eq!(node.entry().secondary_id, "WES1");

    let err = sheet.crawl("P002").unwrap_err();
    assert_matches!(err, SheetError::SecondaryIdNotFound(ref id) if id == "P002");
}

#[test]
fn generic_view_collects_active_assay_samples() {
    let sheet = sheet(vec![
        bio_entity(
            1,
            "P001",
            json!({}),
            vec![bio_sample(
                2,
                "N1",
                json!({}),
                vec![
                    test_sample(3, "DNA1", "DNA", vec![library(4, "WES1")]),
                    test_sample(5, "DNA2", "DNA", Vec::new()),
                ],
            )],
        ),
        json!({
            "pk": 10,
            "secondary_id": "P002",
            "disabled": true,
            "bio_samples": [bio_sample(
                11,
                "N1",
                json!({}),
                vec![test_sample(12, "DNA1", "DNA", vec![library(13, "WES1")])],
            )],
        }),
    ]);

    let case_sheet = GenericCaseSheet::new(&sheet, AssaySelector::NgsLibrary).unwrap();
    assert_eq!(case_sheet.test_samples.len(), 1);
    let shortcut = &case_sheet.test_samples[0];
    assert_eq!(shortcut.name(), "000003-P001-N1-DNA1");
    assert_eq!(
        shortcut.assay_sample().map(|assay| assay.name()),
        Some("000004-P001-N1-DNA1-WES1".to_string())
    );

    let proteomics = GenericCaseSheet::new(&sheet, AssaySelector::MsProteinPool).unwrap();
    assert!(proteomics.test_samples.is_empty());
}

#[test]
fn selector_parses_known_names_only() {
    assert_eq!(
        "ms_protein_pool".parse::<AssaySelector>().unwrap(),
        AssaySelector::MsProteinPool
    );
    let err = "protein".parse::<AssaySelector>().unwrap_err();
    assert_matches!(err, SheetError::InvalidSelector(ref value) if value == "protein");
}
