//! Generic experiment view: every active test sample of one assay type.

use crate::domain::AssaySelector;
use crate::error::SheetError;
use crate::models::Sheet;

use super::{BioSampleShortcut, Requirement, TestSampleShortcut};

#[derive(Debug, Clone)]
pub struct GenericCaseSheet<'a> {
    pub sheet: &'a Sheet,
    pub selector: AssaySelector,
    pub test_samples: Vec<TestSampleShortcut<'a>>,
}

impl<'a> GenericCaseSheet<'a> {
    /// Collect the enabled test samples that hold an enabled child of the
    /// `selector` type; disabled donors and bio samples are skipped.
    pub fn new(sheet: &'a Sheet, selector: AssaySelector) -> Result<Self, SheetError> {
        let mut test_samples = Vec::new();
        for bio_entity in sheet.bio_entities().values() {
            if !bio_entity.entry.enabled() {
                continue;
            }
            for bio_sample in bio_entity.bio_samples().values() {
                if !bio_sample.entry.enabled() {
                    continue;
                }
                let parent = BioSampleShortcut::new(bio_entity, bio_sample);
                for test_sample in bio_sample.test_samples().values() {
                    if !test_sample.entry.enabled() {
                        continue;
                    }
                    let shortcut = TestSampleShortcut::with_requirement(
                        parent,
                        test_sample,
                        selector,
                        Requirement::Optional,
                    )?;
                    if shortcut.assay_sample().is_some() {
                        test_samples.push(shortcut);
                    }
                }
            }
        }
        Ok(Self {
            sheet,
            selector,
            test_samples,
        })
    }
}
