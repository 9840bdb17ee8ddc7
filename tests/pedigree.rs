mod common;

use assert_matches::assert_matches;
use serde_json::json;

use biomedsheets::cohort::{Cohort, CohortBuilder};
use biomedsheets::domain::{Affection, Pk, Sex};
use biomedsheets::error::SheetError;
use biomedsheets::models::Sheet;
use biomedsheets::pedigree::Pedigree;
use biomedsheets::shortcuts::Shortcut;
use biomedsheets::shortcuts::germline::{
    GermlineCaseSheet, GermlineDonor, ParentLink, ParentRole, donor_has_dna_ngs_library,
};

use common::{bio_entity, bio_sample, germline_donor, library, sheet, test_sample};

fn abc_sheet(a_extra: serde_json::Value, a_library: bool, b_library: bool) -> Sheet {
    sheet(vec![
        germline_donor(1, "A", a_extra, a_library),
        germline_donor(2, "B", json!({"fatherPk": 1}), b_library),
        germline_donor(3, "C", json!({}), false),
    ])
}

fn index_of(case_sheet: &GermlineCaseSheet<'_>, pk: &str) -> String {
    let pedigree = case_sheet.cohort.pedigree_by_pk(&Pk::from(pk)).unwrap();
    pedigree.index().unwrap().secondary_id().to_string()
}

#[test]
fn row_partitioning_follows_parent_links() {
    let sheet = abc_sheet(json!({}), false, false);
    let case_sheet = GermlineCaseSheet::new(&sheet, None).unwrap();
    let cohort = &case_sheet.cohort;

    assert_eq!(cohort.pedigree_count(), 2);
    assert_eq!(cohort.member_count(), 3);
    let members: Vec<Vec<&str>> = cohort
        .pedigrees
        .iter()
        .map(|pedigree| pedigree.donors.iter().map(|donor| donor.secondary_id()).collect())
        .collect();
    assert_eq!(members, vec![vec!["A", "B"], vec!["C"]]);
}

#[test]
fn index_prefers_affected_donor_with_library() {
    let sheet = abc_sheet(json!({"isAffected": "affected"}), true, true);
    let case_sheet = GermlineCaseSheet::new(&sheet, None).unwrap();
    assert_eq!(index_of(&case_sheet, "1"), "A");
}

#[test]
fn index_falls_back_to_donor_with_library() {
    let sheet = abc_sheet(json!({"isAffected": "unaffected"}), false, true);
    let case_sheet = GermlineCaseSheet::new(&sheet, None).unwrap();
    assert_eq!(index_of(&case_sheet, "1"), "B");
}

#[test]
fn index_falls_back_to_first_donor() {
    let sheet = abc_sheet(json!({}), false, false);
    let case_sheet = GermlineCaseSheet::new(&sheet, None).unwrap();
    assert_eq!(index_of(&case_sheet, "2"), "A");
}

#[test]
fn affected_ties_break_on_name() {
    let sheet = sheet(vec![
        germline_donor(5, "dad", json!({"isAffected": "affected"}), true),
        germline_donor(
            4,
            "kid",
            json!({"fatherPk": "5", "isAffected": "affected"}),
            true,
        ),
    ]);
    let case_sheet = GermlineCaseSheet::new(&sheet, None).unwrap();
    let pedigree = &case_sheet.cohort.pedigrees[0];
    assert_eq!(pedigree.index().unwrap().name(), "000004-kid");
    let affecteds: Vec<String> = pedigree.affecteds().map(|donor| donor.name()).collect();
    assert_eq!(affecteds, vec!["000004-kid", "000005-dad"]);
}

#[test]
fn singleton_indexes_its_only_member() {
    let sheet = sheet(vec![germline_donor(
        7,
        "solo",
        json!({"isAffected": "unaffected"}),
        false,
    )]);
    let case_sheet = GermlineCaseSheet::new(&sheet, None).unwrap();
    let pedigree = &case_sheet.cohort.pedigrees[0];
    assert_eq!(pedigree.index().unwrap().secondary_id(), "solo");
    assert_eq!(pedigree.affecteds().count(), 0);
}

#[test]
fn parent_links_resolve_within_pedigree() {
    let sheet = abc_sheet(json!({}), false, false);
    let case_sheet = GermlineCaseSheet::new(&sheet, None).unwrap();
    let pedigree = case_sheet.cohort.pedigree_by_pk(&Pk::from(2)).unwrap();
    let child = pedigree.donor_by_secondary_id("B").unwrap();

    assert_eq!(child.father().unwrap(), Some(&Pk::from(1)));
    assert_eq!(child.mother().unwrap(), None);
    let father = pedigree.father(child).unwrap().unwrap();
    assert_eq!(father.secondary_id(), "A");
    assert!(pedigree.contains_pk(father.pk()));
    assert_eq!(*father.link(ParentRole::Father), ParentLink::Absent);

    let founders: Vec<&str> = pedigree.founders().map(|donor| donor.secondary_id()).collect();
    assert_eq!(founders, vec!["A"]);
}

#[test]
fn partition_ignores_order_of_unrelated_donors() {
    let forward = abc_sheet(json!({}), false, false);
    let reversed = sheet(vec![
        germline_donor(3, "C", json!({}), false),
        germline_donor(2, "B", json!({"fatherPk": 1}), false),
        germline_donor(1, "A", json!({}), false),
    ]);
    let groups = |sheet: &Sheet| {
        let case_sheet = GermlineCaseSheet::new(sheet, None).unwrap();
        let mut groups: Vec<Vec<String>> = case_sheet
            .cohort
            .pedigrees
            .iter()
            .map(|pedigree| {
                let mut ids: Vec<String> = pedigree
                    .donors
                    .iter()
                    .map(|donor| donor.secondary_id().to_string())
                    .collect();
                ids.sort();
                ids
            })
            .collect();
        groups.sort();
        groups
    };
    assert_eq!(groups(&forward), groups(&reversed));
}

fn trio() -> Sheet {
    sheet(vec![
        germline_donor(1, "father", json!({"sex": "male"}), false),
        germline_donor(2, "mother", json!({"sex": "female"}), true),
        germline_donor(
            3,
            "child",
            json!({"fatherPk": 1, "motherPk": 2, "isAffected": "affected", "sex": "female"}),
            true,
        ),
    ])
}

#[test]
fn filtering_severs_links_and_keeps_source() {
    let sheet = trio();
    let case_sheet = GermlineCaseSheet::new(&sheet, None).unwrap();
    let original = &case_sheet.cohort.pedigrees[0];

    let filtered = original
        .with_filtered_donors(donor_has_dna_ngs_library)
        .unwrap();
    assert_eq!(filtered.member_count(), 2);
    assert_eq!(filtered.index().unwrap().secondary_id(), "child");

    let child = filtered.donor_by_secondary_id("child").unwrap();
    assert_eq!(*child.link(ParentRole::Father), ParentLink::Absent);
    assert_eq!(child.father_pk(), None);
    assert!(!child.extra_infos.contains_key("fatherPk"));
    assert_eq!(filtered.mother(child).unwrap().unwrap().secondary_id(), "mother");
    assert_eq!(child.sex(), Sex::Female);
    assert_eq!(child.affection(), Affection::Affected);

    assert_eq!(original.member_count(), 3);
    let original_child = original.donor_by_secondary_id("child").unwrap();
    assert_eq!(original_child.father_pk(), Some(&Pk::from(1)));
    assert!(original_child.extra_infos.contains_key("fatherPk"));
    assert_eq!(
        original.father(original_child).unwrap().unwrap().secondary_id(),
        "father"
    );
}

#[test]
fn filtering_reselects_index_when_excluded() {
    let sheet = trio();
    let case_sheet = GermlineCaseSheet::new(&sheet, None).unwrap();
    let original = &case_sheet.cohort.pedigrees[0];

    let parents = original
        .with_filtered_donors(|donor| donor.secondary_id() != "child")
        .unwrap();
    assert_eq!(parents.member_count(), 2);
    // the mother is the only one left with a library
    assert_eq!(parents.index().unwrap().secondary_id(), "mother");
}

#[test]
fn field_partitioning_groups_by_value() {
    let sheet = sheet(vec![
        germline_donor(1, "A", json!({"familyId": "F1"}), true),
        germline_donor(2, "B", json!({"familyId": "F2"}), true),
        germline_donor(3, "C", json!({"familyId": "F1", "motherPk": 1}), true),
    ]);
    let case_sheet = GermlineCaseSheet::new(&sheet, Some("familyId")).unwrap();
    let cohort = &case_sheet.cohort;
    assert_eq!(cohort.pedigree_count(), 2);
    assert_eq!(cohort.pedigrees[0].member_count(), 2);
    assert_eq!(
        cohort.pedigree_by_secondary_id("C").unwrap().index().unwrap().secondary_id(),
        "A"
    );
}

#[test]
fn field_partitioning_requires_field() {
    let sheet = sheet(vec![
        germline_donor(1, "A", json!({"familyId": "F1"}), true),
        germline_donor(2, "B", json!({"sex": "male"}), true),
    ]);
    let err = GermlineCaseSheet::new(&sheet, Some("familyId")).unwrap_err();
    assert_matches!(
        err,
        SheetError::UndefinedField { ref field, ref pk, ref available }
            if field == "familyId" && pk == "2" && available == &["sex"]
    );
}

#[test]
fn field_partitioning_rejects_cross_family_parent() {
    let sheet = sheet(vec![
        germline_donor(1, "A", json!({"familyId": "F1"}), true),
        germline_donor(2, "B", json!({"familyId": "F2", "fatherPk": 1}), true),
    ]);
    let err = GermlineCaseSheet::new(&sheet, Some("familyId")).unwrap_err();
    assert_matches!(
        err,
        SheetError::InconsistentPedigree { ref secondary_id, ref join_by_field }
            if secondary_id == "B" && join_by_field.as_deref() == Some("familyId")
    );
}

#[test]
fn unknown_parent_is_fatal() {
    let sheet = sheet(vec![germline_donor(1, "A", json!({"fatherPk": 9}), true)]);
    let err = GermlineCaseSheet::new(&sheet, None).unwrap_err();
    assert_matches!(
        err,
        SheetError::UnknownParent { ref parent_pk, .. } if parent_pk == "9"
    );
}

fn donors(sheet: &Sheet) -> Vec<GermlineDonor<'_>> {
    sheet
        .bio_entities()
        .values()
        .map(GermlineDonor::new)
        .collect::<Result<Vec<_>, _>>()
        .unwrap()
}

#[test]
fn cohort_rejects_donor_in_two_pedigrees() {
    let sheet = abc_sheet(json!({}), false, false);
    let donors = donors(&sheet);
    let first = Pedigree::new(donors[..2].to_vec(), None).unwrap();
    let overlapping = Pedigree::new(donors[1..].to_vec(), None).unwrap();

    let err = Cohort::new(vec![first.clone(), overlapping.clone()]).unwrap_err();
    assert_matches!(err, SheetError::DuplicateKey { scope: "cohort", .. });

    let mut cohort = Cohort::new(vec![first]).unwrap();
    cohort.pedigrees.push(overlapping);
    assert!(cohort.update_shortcuts().is_err());
    assert!(cohort.donor_by_secondary_id("C").is_none());
    assert_eq!(cohort.indices().count(), 1);
}

#[test]
fn pedigree_rejects_duplicate_members() {
    let sheet = abc_sheet(json!({}), false, false);
    let donors = donors(&sheet);
    let err = Pedigree::new(vec![donors[0].clone(), donors[0].clone()], None).unwrap_err();
    assert_matches!(err, SheetError::DuplicateKey { scope: "pedigree", .. });
}

#[test]
fn unbuilt_donors_report_unresolved_parents() {
    let sheet = abc_sheet(json!({}), false, false);
    let donors = donors(&sheet);
    let err = donors[1].father().unwrap_err();
    assert_matches!(err, SheetError::ParentNotResolved { role: "father", .. });

    let cohort = CohortBuilder::new(donors).run().unwrap();
    let child = cohort.donor_by_secondary_id("B").unwrap();
    assert_eq!(child.father().unwrap(), Some(&Pk::from("1")));
}

#[test]
fn library_lookups_cover_donors_and_indices() {
    let sheet = trio();
    let case_sheet = GermlineCaseSheet::new(&sheet, None).unwrap();

    let index_libraries: Vec<&str> = case_sheet.index_library_names().collect();
    assert_eq!(index_libraries, vec!["000303-child-N1-DNA1-WES1"]);
    let donor_libraries: Vec<&str> = case_sheet.donor_library_names().collect();
    assert_eq!(
        donor_libraries,
        vec!["000203-mother-N1-DNA1-WES1", "000303-child-N1-DNA1-WES1"]
    );
    let donor = case_sheet
        .donor_by_library("000203-mother-N1-DNA1-WES1")
        .unwrap();
    assert_eq!(donor.secondary_id(), "mother");
    assert!(
        case_sheet
            .pedigree_by_donor_library("000203-mother-N1-DNA1-WES1")
            .is_some()
    );
    assert_eq!(case_sheet.libraries().count(), 2);
    let order: Vec<&str> = case_sheet.donors().map(|donor| donor.secondary_id()).collect();
    assert_eq!(order, vec!["father", "mother", "child"]);
}

#[test]
fn germline_resolution_skips_disabled_samples() {
    let mut n1 = bio_sample(
        10,
        "N1",
        json!({"isTumor": false}),
        vec![test_sample(11, "DNA1", "DNA", vec![library(12, "WES1")])],
    );
    n1["disabled"] = json!(true);
    let mut dna1 = test_sample(21, "DNA1", "DNA", vec![library(22, "WES1")]);
    dna1["disabled"] = json!(true);
    let n2 = bio_sample(
        20,
        "N2",
        json!({"isTumor": false}),
        vec![dna1, test_sample(23, "DNA2", "DNA", vec![library(24, "WES1")])],
    );
    let sheet = sheet(vec![bio_entity(1, "donor", json!({}), vec![n1, n2])]);
    let entity = sheet.bio_entities().get("donor").unwrap();
    let donor = GermlineDonor::new(entity).unwrap();

    assert_eq!(donor.dna_bio_sample.unwrap().secondary_id(), "N2");
    assert_eq!(donor.dna_test_sample.unwrap().name(), "000023-donor-N2-DNA2");
    assert_eq!(
        donor.dna_ngs_library.unwrap().name(),
        "000024-donor-N2-DNA2-WES1"
    );
}
