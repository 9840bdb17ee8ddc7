#![allow(dead_code)]

use serde_json::{Value, json};

use biomedsheets::loader::SheetLoader;
use biomedsheets::models::Sheet;

pub fn sheet(bio_entities: Vec<Value>) -> Sheet {
    SheetLoader::from_value(json!({
        "identifier": "urn:biomedsheets:test",
        "title": "Test sheet",
        "bio_entities": bio_entities,
    }))
    .unwrap()
}

pub fn library(pk: i64, secondary_id: &str) -> Value {
    json!({"pk": pk, "secondary_id": secondary_id})
}

pub fn test_sample(pk: i64, secondary_id: &str, extraction_type: &str, libraries: Vec<Value>) -> Value {
    json!({
        "pk": pk,
        "secondary_id": secondary_id,
        "extra_infos": {"extractionType": extraction_type},
        "ngs_libraries": libraries,
    })
}

pub fn bio_sample(pk: i64, secondary_id: &str, extra_infos: Value, test_samples: Vec<Value>) -> Value {
    json!({
        "pk": pk,
        "secondary_id": secondary_id,
        "extra_infos": extra_infos,
        "test_samples": test_samples,
    })
}

pub fn bio_entity(pk: i64, secondary_id: &str, extra_infos: Value, bio_samples: Vec<Value>) -> Value {
    json!({
        "pk": pk,
        "secondary_id": secondary_id,
        "extra_infos": extra_infos,
        "bio_samples": bio_samples,
    })
}

/// Germline donor with one normal DNA sample; `with_library` adds a WES
/// library. Child pks are derived from the donor pk.
pub fn germline_donor(pk: i64, secondary_id: &str, extra_infos: Value, with_library: bool) -> Value {
    let libraries = if with_library {
        vec![library(pk * 100 + 3, "WES1")]
    } else {
        Vec::new()
    };
    bio_entity(
        pk,
        secondary_id,
        extra_infos,
        vec![bio_sample(
            pk * 100 + 1,
            "N1",
            json!({"isTumor": false}),
            vec![test_sample(pk * 100 + 2, "DNA1", "DNA", libraries)],
        )],
    )
}

/// Tumor or normal bio sample with one DNA test sample and library.
pub fn cancer_sample(pk: i64, secondary_id: &str, is_cancer: bool) -> Value {
    bio_sample(
        pk,
        secondary_id,
        json!({"isCancer": is_cancer}),
        vec![test_sample(
            pk * 10 + 1,
            "DNA1",
            "DNA",
            vec![library(pk * 10 + 2, "WES1")],
        )],
    )
}
