//! Read-only views over the entity graph.
//!
//! Shortcuts borrow from a [`Sheet`](crate::models::Sheet) and add derived
//! identity (the composite display name) plus the resolution of the one
//! sample or library that matters for a study design. Resolution happens once,
//! when the shortcut is built; shortcuts never write to the graph.
//!
//! Assumptions behind the resolution rules:
//!
//! - a sheet describes one assay type per study (e.g. WES or WGS)
//! - for rare disease studies only the first active bio sample, test sample
//!   and library of each donor are considered
//! - for cancer studies every tumor sample is paired with the first active
//!   normal sample of the same donor

pub mod cancer;
pub mod generic;
pub mod germline;

use crate::domain::{AssaySelector, ExtractionType, KEY_EXTRACTION_TYPE, Pk};
use crate::error::SheetError;
use crate::models::{BioEntity, BioSample, Entry, MsProteinPool, NgsLibrary, PATH_SEP, TestSample};

/// Whether resolving a child that does not exist is an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    Required,
    Optional,
}

/// Common accessors of all shortcut types.
pub trait Shortcut {
    type Wrapped: Entry;

    fn wrapped(&self) -> &Self::Wrapped;

    /// Secondary ids from the donor down to the wrapped entity.
    fn path(&self) -> Vec<&str>;

    fn pk(&self) -> &Pk {
        self.wrapped().pk()
    }

    fn secondary_id(&self) -> &str {
        self.wrapped().secondary_id()
    }

    fn disabled(&self) -> bool {
        self.wrapped().disabled()
    }

    fn enabled(&self) -> bool {
        self.wrapped().enabled()
    }

    /// Zero-padded primary key followed by the secondary id path, e.g.
    /// `000042-P001-N1-DNA1-WES1`.
    fn name(&self) -> String {
        let mut name = self.pk().padded();
        for secondary_id in self.path() {
            name.push(PATH_SEP);
            name.push_str(secondary_id);
        }
        name
    }
}

/// Donor-level shortcut without any study specific resolution.
#[derive(Debug, Clone, Copy)]
pub struct BioEntityShortcut<'a> {
    pub bio_entity: &'a BioEntity,
}

impl<'a> BioEntityShortcut<'a> {
    pub fn new(bio_entity: &'a BioEntity) -> Self {
        Self { bio_entity }
    }
}

impl Shortcut for BioEntityShortcut<'_> {
    type Wrapped = BioEntity;

    fn wrapped(&self) -> &BioEntity {
        self.bio_entity
    }

    fn path(&self) -> Vec<&str> {
        vec![self.bio_entity.secondary_id()]
    }
}

#[derive(Debug, Clone, Copy)]
pub struct BioSampleShortcut<'a> {
    pub bio_entity: &'a BioEntity,
    pub bio_sample: &'a BioSample,
}

impl<'a> BioSampleShortcut<'a> {
    pub fn new(bio_entity: &'a BioEntity, bio_sample: &'a BioSample) -> Self {
        Self {
            bio_entity,
            bio_sample,
        }
    }
}

impl Shortcut for BioSampleShortcut<'_> {
    type Wrapped = BioSample;

    fn wrapped(&self) -> &BioSample {
        self.bio_sample
    }

    fn path(&self) -> Vec<&str> {
        vec![self.bio_entity.secondary_id(), self.bio_sample.secondary_id()]
    }
}

/// Shortcut to a `TestSample`, pre-configured with the child type whose first
/// enabled instance is the assay sample.
#[derive(Debug, Clone, Copy)]
pub struct TestSampleShortcut<'a> {
    pub bio_sample: BioSampleShortcut<'a>,
    pub test_sample: &'a TestSample,
    pub selector: AssaySelector,
    assay_sample: Option<AssaySampleShortcut<'a>>,
}

impl<'a> TestSampleShortcut<'a> {
    /// Wrap `test_sample`; fails if no enabled child of the selected type exists.
    pub fn new(
        bio_sample: BioSampleShortcut<'a>,
        test_sample: &'a TestSample,
        selector: AssaySelector,
    ) -> Result<Self, SheetError> {
        Self::with_requirement(bio_sample, test_sample, selector, Requirement::Required)
    }

    pub fn with_requirement(
        bio_sample: BioSampleShortcut<'a>,
        test_sample: &'a TestSample,
        selector: AssaySelector,
        requirement: Requirement,
    ) -> Result<Self, SheetError> {
        let mut shortcut = Self {
            bio_sample,
            test_sample,
            selector,
            assay_sample: None,
        };
        shortcut.assay_sample = shortcut.resolve_assay_sample();
        if shortcut.assay_sample.is_none() && requirement == Requirement::Required {
            return Err(SheetError::missing(
                test_sample.label(),
                format!("data entity of type {selector}"),
            ));
        }
        Ok(shortcut)
    }

    fn resolve_assay_sample(&self) -> Option<AssaySampleShortcut<'a>> {
        let test_sample = self.test_sample;
        match self.selector {
            AssaySelector::NgsLibrary => first_enabled(test_sample.ngs_libraries().values())
                .map(|library| {
                    AssaySampleShortcut::NgsLibrary(NgsLibraryShortcut {
                        bio_sample: self.bio_sample,
                        test_sample,
                        ngs_library: library,
                    })
                }),
            AssaySelector::MsProteinPool => first_enabled(test_sample.ms_protein_pools().values())
                .map(|pool| {
                    AssaySampleShortcut::MsProteinPool(MsProteinPoolShortcut {
                        bio_sample: self.bio_sample,
                        test_sample,
                        ms_protein_pool: pool,
                    })
                }),
        }
    }

    pub fn assay_sample(&self) -> Option<&AssaySampleShortcut<'a>> {
        self.assay_sample.as_ref()
    }

    pub fn ngs_library(&self) -> Option<NgsLibraryShortcut<'a>> {
        match self.assay_sample {
            Some(AssaySampleShortcut::NgsLibrary(library)) => Some(library),
            _ => None,
        }
    }

    pub fn ms_protein_pool(&self) -> Option<MsProteinPoolShortcut<'a>> {
        match self.assay_sample {
            Some(AssaySampleShortcut::MsProteinPool(pool)) => Some(pool),
            _ => None,
        }
    }
}

impl Shortcut for TestSampleShortcut<'_> {
    type Wrapped = TestSample;

    fn wrapped(&self) -> &TestSample {
        self.test_sample
    }

    fn path(&self) -> Vec<&str> {
        let mut path = self.bio_sample.path();
        path.push(self.test_sample.secondary_id());
        path
    }
}

/// The selected child of a [`TestSampleShortcut`].
#[derive(Debug, Clone, Copy)]
pub enum AssaySampleShortcut<'a> {
    NgsLibrary(NgsLibraryShortcut<'a>),
    MsProteinPool(MsProteinPoolShortcut<'a>),
}

impl AssaySampleShortcut<'_> {
    pub fn name(&self) -> String {
        match self {
            AssaySampleShortcut::NgsLibrary(library) => library.name(),
            AssaySampleShortcut::MsProteinPool(pool) => pool.name(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct NgsLibraryShortcut<'a> {
    pub bio_sample: BioSampleShortcut<'a>,
    pub test_sample: &'a TestSample,
    pub ngs_library: &'a NgsLibrary,
}

impl<'a> NgsLibraryShortcut<'a> {
    pub fn new(
        bio_sample: BioSampleShortcut<'a>,
        test_sample: &'a TestSample,
        ngs_library: &'a NgsLibrary,
    ) -> Self {
        Self {
            bio_sample,
            test_sample,
            ngs_library,
        }
    }
}

impl Shortcut for NgsLibraryShortcut<'_> {
    type Wrapped = NgsLibrary;

    fn wrapped(&self) -> &NgsLibrary {
        self.ngs_library
    }

    fn path(&self) -> Vec<&str> {
        let mut path = self.bio_sample.path();
        path.push(self.test_sample.secondary_id());
        path.push(self.ngs_library.secondary_id());
        path
    }
}

#[derive(Debug, Clone, Copy)]
pub struct MsProteinPoolShortcut<'a> {
    pub bio_sample: BioSampleShortcut<'a>,
    pub test_sample: &'a TestSample,
    pub ms_protein_pool: &'a MsProteinPool,
}

impl Shortcut for MsProteinPoolShortcut<'_> {
    type Wrapped = MsProteinPool;

    fn wrapped(&self) -> &MsProteinPool {
        self.ms_protein_pool
    }

    fn path(&self) -> Vec<&str> {
        let mut path = self.bio_sample.path();
        path.push(self.test_sample.secondary_id());
        path.push(self.ms_protein_pool.secondary_id());
        path
    }
}

pub(crate) fn first_enabled<'a, T, I>(items: I) -> Option<&'a T>
where
    T: Entry + 'a,
    I: IntoIterator<Item = &'a T>,
{
    items.into_iter().find(|item| item.enabled())
}

/// First enabled test sample of `bio_sample` with the given extraction type.
///
/// Every test sample inspected before the match must carry the extraction
/// type flag.
pub(crate) fn primary_test_sample<'a>(
    bio_sample: &'a BioSample,
    extraction_type: ExtractionType,
    requirement: Requirement,
) -> Result<Option<&'a TestSample>, SheetError> {
    for test_sample in bio_sample.test_samples().values() {
        if has_extraction_type(test_sample, extraction_type)? && test_sample.enabled() {
            return Ok(Some(test_sample));
        }
    }
    match requirement {
        Requirement::Optional => Ok(None),
        Requirement::Required => Err(SheetError::missing(
            bio_sample.label(),
            format!("TestSample with {KEY_EXTRACTION_TYPE} == {extraction_type}"),
        )),
    }
}

pub(crate) fn has_extraction_type(
    test_sample: &TestSample,
    extraction_type: ExtractionType,
) -> Result<bool, SheetError> {
    let value = test_sample
        .extra_infos()
        .require_text(KEY_EXTRACTION_TYPE, &test_sample.label())?;
    Ok(value == extraction_type.as_str())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::models::SheetEntry;

    fn sample_tree() -> BioEntity {
        let libraries = vec![
            NgsLibrary::new(SheetEntry::new(4, "WES1").disabled(true)),
            NgsLibrary::new(SheetEntry::new(5, "WES2")),
        ];
        let test_sample = TestSample::new(SheetEntry::new(3, "DNA1"), libraries, Vec::new()).unwrap();
        let bio_sample = BioSample::new(SheetEntry::new(2, "N1"), vec![test_sample]).unwrap();
        BioEntity::new(SheetEntry::new(1, "P001"), vec![bio_sample]).unwrap()
    }

    #[test]
    fn first_enabled_library_wins() {
        let donor = sample_tree();
        let bio_sample = &donor.bio_samples()["N1"];
        let test_sample = &bio_sample.test_samples()["DNA1"];
        let shortcut = TestSampleShortcut::new(
            BioSampleShortcut::new(&donor, bio_sample),
            test_sample,
            AssaySelector::NgsLibrary,
        )
        .unwrap();
        let library = shortcut.ngs_library().unwrap();
        assert_eq!(library.secondary_id(), "WES2");
        assert_eq!(library.name(), "000005-P001-N1-DNA1-WES2");
        assert_eq!(shortcut.name(), "000003-P001-N1-DNA1");
    }

    #[test]
    fn missing_assay_sample_is_an_error() {
        let donor = sample_tree();
        let bio_sample = &donor.bio_samples()["N1"];
        let test_sample = &bio_sample.test_samples()["DNA1"];
        let err = TestSampleShortcut::new(
            BioSampleShortcut::new(&donor, bio_sample),
            test_sample,
            AssaySelector::MsProteinPool,
        )
        .unwrap_err();
        assert_matches!(err, SheetError::MissingDataEntity { ref what, .. } if what.contains("ms_protein_pool"));

        let optional = TestSampleShortcut::with_requirement(
            BioSampleShortcut::new(&donor, bio_sample),
            test_sample,
            AssaySelector::MsProteinPool,
            Requirement::Optional,
        )
        .unwrap();
        assert!(optional.assay_sample().is_none());
    }
}
