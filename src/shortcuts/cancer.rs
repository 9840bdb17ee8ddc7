//! Matched tumor/normal view on a sample sheet.

use tracing::debug;

use crate::domain::{AssaySelector, ExtractionType, KEY_IS_CANCER};
use crate::error::SheetError;
use crate::models::{BioEntity, BioSample, Entry, Sheet};

use super::{
    BioEntityShortcut, BioSampleShortcut, NgsLibraryShortcut, Requirement, Shortcut,
    TestSampleShortcut, primary_test_sample,
};

/// All donors of a sheet viewed as cancer patients.
#[derive(Debug, Clone)]
pub struct CancerCaseSheet<'a> {
    pub sheet: &'a Sheet,
    pub donors: Vec<CancerDonor<'a>>,
}

impl<'a> CancerCaseSheet<'a> {
    pub fn new(sheet: &'a Sheet) -> Result<Self, SheetError> {
        let donors = sheet
            .bio_entities()
            .values()
            .filter(|bio_entity| bio_entity.enabled())
            .map(CancerDonor::new)
            .collect::<Result<Vec<_>, _>>()?;
        debug!(sheet = sheet.identifier(), donors = donors.len(), "built cancer case sheet");
        Ok(Self { sheet, donors })
    }

    /// One pair per donor, using the donor's first tumor sample.
    pub fn primary_sample_pairs(&self) -> impl Iterator<Item = &CancerMatchedSamplePair<'a>> {
        self.donors.iter().map(|donor| &donor.primary_pair)
    }

    /// One pair per tumor sample of every donor.
    pub fn all_sample_pairs(&self) -> impl Iterator<Item = &CancerMatchedSamplePair<'a>> {
        self.donors.iter().flat_map(|donor| donor.all_pairs.iter())
    }
}

/// A donor in a matched tumor/normal study.
#[derive(Debug, Clone)]
pub struct CancerDonor<'a> {
    pub bio_entity: &'a BioEntity,
    pub primary_pair: CancerMatchedSamplePair<'a>,
    pub all_pairs: Vec<CancerMatchedSamplePair<'a>>,
}

impl<'a> CancerDonor<'a> {
    pub fn new(bio_entity: &'a BioEntity) -> Result<Self, SheetError> {
        let classified = classify_bio_samples(bio_entity)?;
        let normal = classified
            .iter()
            .find(|(bio_sample, is_cancer)| !is_cancer && bio_sample.enabled())
            .map(|(bio_sample, _)| *bio_sample)
            .ok_or_else(|| SheetError::missing(bio_entity.label(), "primary normal sample"))?;
        let tumors: Vec<&BioSample> = classified
            .iter()
            .filter(|(_, is_cancer)| *is_cancer)
            .map(|(bio_sample, _)| *bio_sample)
            .collect();

        let normal_sample = CancerBioSample::new(bio_entity, normal, false)?;
        let all_pairs = tumors
            .into_iter()
            .map(|tumor| {
                Ok(CancerMatchedSamplePair {
                    donor: BioEntityShortcut::new(bio_entity),
                    tumor_sample: CancerBioSample::new(bio_entity, tumor, true)?,
                    normal_sample,
                })
            })
            .collect::<Result<Vec<_>, SheetError>>()?;
        let primary_pair = all_pairs.first().copied().ok_or_else(|| {
            SheetError::missing(
                bio_entity.label(),
                format!("BioSample with {KEY_IS_CANCER} = true"),
            )
        })?;

        Ok(Self {
            bio_entity,
            primary_pair,
            all_pairs,
        })
    }
}

impl Shortcut for CancerDonor<'_> {
    type Wrapped = BioEntity;

    fn wrapped(&self) -> &BioEntity {
        self.bio_entity
    }

    fn path(&self) -> Vec<&str> {
        vec![self.bio_entity.secondary_id()]
    }
}

/// Every bio sample of the donor with its cancer flag; the flag is mandatory.
fn classify_bio_samples(bio_entity: &BioEntity) -> Result<Vec<(&BioSample, bool)>, SheetError> {
    bio_entity
        .bio_samples()
        .values()
        .map(|bio_sample| {
            let is_cancer = bio_sample
                .extra_infos()
                .require_bool(KEY_IS_CANCER, &bio_sample.label())?;
            Ok((bio_sample, is_cancer))
        })
        .collect()
}

#[derive(Debug, Clone, Copy)]
pub struct CancerMatchedSamplePair<'a> {
    pub donor: BioEntityShortcut<'a>,
    pub tumor_sample: CancerBioSample<'a>,
    pub normal_sample: CancerBioSample<'a>,
}

/// One side of a tumor/normal pair with its resolved DNA (required) and RNA
/// (optional) test samples and libraries.
#[derive(Debug, Clone, Copy)]
pub struct CancerBioSample<'a> {
    pub bio_sample: BioSampleShortcut<'a>,
    pub is_cancer: bool,
    pub dna_test_sample: TestSampleShortcut<'a>,
    pub rna_test_sample: Option<TestSampleShortcut<'a>>,
    pub dna_ngs_library: NgsLibraryShortcut<'a>,
    pub rna_ngs_library: Option<NgsLibraryShortcut<'a>>,
}

impl<'a> CancerBioSample<'a> {
    pub fn new(
        bio_entity: &'a BioEntity,
        bio_sample: &'a BioSample,
        is_cancer: bool,
    ) -> Result<Self, SheetError> {
        let parent = BioSampleShortcut::new(bio_entity, bio_sample);

        let dna = primary_test_sample(bio_sample, ExtractionType::Dna, Requirement::Required)?
            .ok_or_else(|| SheetError::missing(bio_sample.label(), "DNA TestSample"))?;
        let dna_test_sample = TestSampleShortcut::new(parent, dna, AssaySelector::NgsLibrary)?;
        let dna_ngs_library = dna_test_sample
            .ngs_library()
            .ok_or_else(|| SheetError::missing(dna.label(), "DNA NGS library"))?;

        let rna_test_sample =
            match primary_test_sample(bio_sample, ExtractionType::Rna, Requirement::Optional)? {
                Some(rna) => Some(TestSampleShortcut::with_requirement(
                    parent,
                    rna,
                    AssaySelector::NgsLibrary,
                    Requirement::Optional,
                )?),
                None => None,
            };
        let rna_ngs_library = rna_test_sample.and_then(|test_sample| test_sample.ngs_library());

        debug!(
            bio_sample = %parent.name(),
            is_cancer,
            dna_library = %dna_ngs_library.name(),
            has_rna = rna_ngs_library.is_some(),
            "resolved cancer bio sample"
        );

        Ok(Self {
            bio_sample: parent,
            is_cancer,
            dna_test_sample,
            rna_test_sample,
            dna_ngs_library,
            rna_ngs_library,
        })
    }
}

impl Shortcut for CancerBioSample<'_> {
    type Wrapped = BioSample;

    fn wrapped(&self) -> &BioSample {
        self.bio_sample.bio_sample
    }

    fn path(&self) -> Vec<&str> {
        self.bio_sample.path()
    }
}
