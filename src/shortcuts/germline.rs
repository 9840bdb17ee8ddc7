//! Germline (rare disease) view on a sample sheet.

use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::cohort::{Cohort, CohortBuilder, DonorRef};
use crate::domain::{
    Affection, AssaySelector, ExtraInfos, ExtractionType, KEY_FATHER_PK, KEY_IS_AFFECTED,
    KEY_IS_TUMOR, KEY_MOTHER_PK, KEY_SEX, Pk, Sex,
};
use crate::error::SheetError;
use crate::models::{BioEntity, BioSample, Entry, Sheet};
use crate::pedigree::Pedigree;

use super::{
    BioSampleShortcut, NgsLibraryShortcut, Requirement, Shortcut, TestSampleShortcut,
    has_extraction_type, primary_test_sample,
};

/// Whether the donor has a resolved DNA library.
pub fn donor_has_dna_ngs_library(donor: &GermlineDonor<'_>) -> bool {
    donor.dna_ngs_library.is_some()
}

/// State of a donor's link to one of its parents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParentLink {
    /// The cohort builder has not looked at this donor yet.
    Unset,
    /// Known to have no parent of this role in the pedigree.
    Absent,
    /// Parent donor with this primary key, a member of the same pedigree.
    Resolved(Pk),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParentRole {
    Father,
    Mother,
}

impl ParentRole {
    pub fn as_str(self) -> &'static str {
        match self {
            ParentRole::Father => "father",
            ParentRole::Mother => "mother",
        }
    }

    fn key(self) -> &'static str {
        match self {
            ParentRole::Father => KEY_FATHER_PK,
            ParentRole::Mother => KEY_MOTHER_PK,
        }
    }
}

/// A donor in a germline study.
///
/// `extra_infos` is a snapshot of the bio entity's attributes taken at
/// construction; filtering a pedigree edits the snapshot, never the sheet.
#[derive(Debug, Clone)]
pub struct GermlineDonor<'a> {
    pub bio_entity: &'a BioEntity,
    pub extra_infos: ExtraInfos,
    father_pk: Option<Pk>,
    mother_pk: Option<Pk>,
    father: ParentLink,
    mother: ParentLink,
    affection: Affection,
    sex: Sex,
    pub dna_bio_sample: Option<BioSampleShortcut<'a>>,
    pub rna_bio_sample: Option<BioSampleShortcut<'a>>,
    pub dna_test_sample: Option<TestSampleShortcut<'a>>,
    pub rna_test_sample: Option<TestSampleShortcut<'a>>,
    pub dna_ngs_library: Option<NgsLibraryShortcut<'a>>,
    pub rna_ngs_library: Option<NgsLibraryShortcut<'a>>,
}

impl<'a> GermlineDonor<'a> {
    pub fn new(bio_entity: &'a BioEntity) -> Result<Self, SheetError> {
        let mut donor = Self::unresolved(bio_entity)?;
        donor.resolve_samples()?;
        Ok(donor)
    }

    /// Donor with its attributes parsed but no samples resolved yet.
    pub fn unresolved(bio_entity: &'a BioEntity) -> Result<Self, SheetError> {
        let label = bio_entity.label();
        let extra_infos = bio_entity.extra_infos().clone();
        Ok(Self {
            bio_entity,
            father_pk: extra_infos.pk(KEY_FATHER_PK, &label)?,
            mother_pk: extra_infos.pk(KEY_MOTHER_PK, &label)?,
            affection: extra_infos.parse_or(KEY_IS_AFFECTED, &label, Affection::Unknown)?,
            sex: extra_infos.parse_or(KEY_SEX, &label, Sex::Unknown)?,
            extra_infos,
            father: ParentLink::Unset,
            mother: ParentLink::Unset,
            dna_bio_sample: None,
            rna_bio_sample: None,
            dna_test_sample: None,
            rna_test_sample: None,
            dna_ngs_library: None,
            rna_ngs_library: None,
        })
    }

    /// Resolve the primary DNA and RNA bio sample, test sample and library.
    pub fn resolve_samples(&mut self) -> Result<(), SheetError> {
        let (bio_sample, test_sample) = self.resolve_primary(ExtractionType::Dna)?;
        self.dna_bio_sample = bio_sample;
        self.dna_test_sample = test_sample;
        self.dna_ngs_library = test_sample.and_then(|test_sample| test_sample.ngs_library());

        let (bio_sample, test_sample) = self.resolve_primary(ExtractionType::Rna)?;
        self.rna_bio_sample = bio_sample;
        self.rna_test_sample = test_sample;
        self.rna_ngs_library = test_sample.and_then(|test_sample| test_sample.ngs_library());

        debug!(
            donor = %self.name(),
            dna_library = ?self.dna_ngs_library.map(|library| library.name()),
            rna_library = ?self.rna_ngs_library.map(|library| library.name()),
            "resolved germline donor"
        );
        Ok(())
    }

    #[allow(clippy::type_complexity)]
    fn resolve_primary(
        &self,
        extraction_type: ExtractionType,
    ) -> Result<(Option<BioSampleShortcut<'a>>, Option<TestSampleShortcut<'a>>), SheetError> {
        let bio_entity = self.bio_entity;
        let Some(bio_sample) = primary_bio_sample(bio_entity, extraction_type)? else {
            return Ok((None, None));
        };
        let parent = BioSampleShortcut::new(bio_entity, bio_sample);
        let test_sample =
            match primary_test_sample(bio_sample, extraction_type, Requirement::Optional)? {
                Some(test_sample) => Some(TestSampleShortcut::with_requirement(
                    parent,
                    test_sample,
                    AssaySelector::NgsLibrary,
                    Requirement::Optional,
                )?),
                None => None,
            };
        Ok((Some(parent), test_sample))
    }

    pub fn affection(&self) -> Affection {
        self.affection
    }

    pub fn is_affected(&self) -> bool {
        self.affection == Affection::Affected
    }

    pub fn sex(&self) -> Sex {
        self.sex
    }

    pub fn father_pk(&self) -> Option<&Pk> {
        self.father_pk.as_ref()
    }

    pub fn mother_pk(&self) -> Option<&Pk> {
        self.mother_pk.as_ref()
    }

    pub fn parent_pk(&self, role: ParentRole) -> Option<&Pk> {
        match role {
            ParentRole::Father => self.father_pk(),
            ParentRole::Mother => self.mother_pk(),
        }
    }

    /// A founder declares neither father nor mother.
    pub fn is_founder(&self) -> bool {
        self.father_pk.is_none() && self.mother_pk.is_none()
    }

    pub fn has_library(&self) -> bool {
        self.dna_ngs_library.is_some() || self.rna_ngs_library.is_some()
    }

    pub fn link(&self, role: ParentRole) -> &ParentLink {
        match role {
            ParentRole::Father => &self.father,
            ParentRole::Mother => &self.mother,
        }
    }

    /// Primary key of the resolved father, if any.
    ///
    /// Fails when a father is declared but the cohort builder has not resolved
    /// the link yet.
    pub fn father(&self) -> Result<Option<&Pk>, SheetError> {
        self.resolved_parent(ParentRole::Father)
    }

    pub fn mother(&self) -> Result<Option<&Pk>, SheetError> {
        self.resolved_parent(ParentRole::Mother)
    }

    pub fn resolved_parent(&self, role: ParentRole) -> Result<Option<&Pk>, SheetError> {
        match self.link(role) {
            ParentLink::Resolved(pk) => Ok(Some(pk)),
            ParentLink::Absent => Ok(None),
            ParentLink::Unset if self.parent_pk(role).is_some() => {
                Err(SheetError::ParentNotResolved {
                    secondary_id: self.secondary_id().to_string(),
                    role: role.as_str(),
                })
            }
            ParentLink::Unset => Ok(None),
        }
    }

    pub(crate) fn set_link(&mut self, role: ParentRole, link: ParentLink) {
        match role {
            ParentRole::Father => self.father = link,
            ParentRole::Mother => self.mother = link,
        }
    }

    /// Drop the parent of `role` entirely, including the declared key.
    pub(crate) fn sever(&mut self, role: ParentRole) {
        self.set_link(role, ParentLink::Absent);
        self.extra_infos.remove(role.key());
        match role {
            ParentRole::Father => self.father_pk = None,
            ParentRole::Mother => self.mother_pk = None,
        }
    }
}

impl Shortcut for GermlineDonor<'_> {
    type Wrapped = BioEntity;

    fn wrapped(&self) -> &BioEntity {
        self.bio_entity
    }

    fn path(&self) -> Vec<&str> {
        vec![self.bio_entity.secondary_id()]
    }
}

/// First enabled, non-tumor bio sample holding an enabled test sample of the
/// given extraction type.
fn primary_bio_sample(
    bio_entity: &BioEntity,
    extraction_type: ExtractionType,
) -> Result<Option<&BioSample>, SheetError> {
    for bio_sample in bio_entity.bio_samples().values() {
        if !bio_sample.enabled() {
            continue;
        }
        if bio_sample
            .extra_infos()
            .flag(KEY_IS_TUMOR, &bio_sample.label())?
        {
            continue;
        }
        for test_sample in bio_sample.test_samples().values() {
            if has_extraction_type(test_sample, extraction_type)? && test_sample.enabled() {
                return Ok(Some(bio_sample));
            }
        }
    }
    Ok(None)
}

/// All donors of a sheet arranged into pedigrees.
#[derive(Debug, Clone)]
pub struct GermlineCaseSheet<'a> {
    pub sheet: &'a Sheet,
    pub cohort: Cohort<'a>,
    donor_order: Vec<Pk>,
    index_ngs_library_to_pedigree: IndexMap<String, usize>,
    donor_ngs_library_to_pedigree: IndexMap<String, usize>,
    ngs_library_to_donor: IndexMap<String, DonorRef>,
    library_name_to_library: IndexMap<String, NgsLibraryShortcut<'a>>,
}

impl<'a> GermlineCaseSheet<'a> {
    /// Build the view; `join_by_field` groups donors by an extra info field
    /// instead of by their parent links.
    pub fn new(sheet: &'a Sheet, join_by_field: Option<&str>) -> Result<Self, SheetError> {
        let donors = sheet
            .bio_entities()
            .values()
            .map(GermlineDonor::new)
            .collect::<Result<Vec<_>, _>>()?;
        let donor_order: Vec<Pk> = donors.iter().map(|donor| donor.pk().clone()).collect();
        let library_name_to_library = library_name_to_library(&donors);

        let mut builder = CohortBuilder::new(donors);
        if let Some(field) = join_by_field {
            builder = builder.join_by_field(field);
        }
        let cohort = builder.run()?;

        let mut index_ngs_library_to_pedigree = IndexMap::new();
        let mut donor_ngs_library_to_pedigree = IndexMap::new();
        let mut ngs_library_to_donor = IndexMap::new();
        for (pedigree_idx, pedigree) in cohort.pedigrees.iter().enumerate() {
            match pedigree.index().and_then(|index| index.dna_ngs_library) {
                Some(library) => {
                    index_ngs_library_to_pedigree.insert(library.name(), pedigree_idx);
                }
                None => warn!(
                    index = ?pedigree.index().map(|index| index.name()),
                    members = pedigree.member_count(),
                    "pedigree index has no DNA library"
                ),
            }
            for (donor_idx, donor) in pedigree.donors.iter().enumerate() {
                if let Some(library) = donor.dna_ngs_library {
                    donor_ngs_library_to_pedigree.insert(library.name(), pedigree_idx);
                    ngs_library_to_donor.insert(
                        library.name(),
                        DonorRef {
                            pedigree: pedigree_idx,
                            donor: donor_idx,
                        },
                    );
                }
            }
        }

        Ok(Self {
            sheet,
            cohort,
            donor_order,
            index_ngs_library_to_pedigree,
            donor_ngs_library_to_pedigree,
            ngs_library_to_donor,
            library_name_to_library,
        })
    }

    /// Donors in sheet order.
    pub fn donors(&self) -> impl Iterator<Item = &GermlineDonor<'a>> {
        self.donor_order
            .iter()
            .filter_map(|pk| self.cohort.donor_by_pk(pk))
    }

    /// Pedigree whose index has the given DNA library.
    pub fn pedigree_by_index_library(&self, library_name: &str) -> Option<&Pedigree<'a>> {
        self.index_ngs_library_to_pedigree
            .get(library_name)
            .and_then(|idx| self.cohort.pedigrees.get(*idx))
    }

    /// Pedigree of any donor with the given DNA library.
    pub fn pedigree_by_donor_library(&self, library_name: &str) -> Option<&Pedigree<'a>> {
        self.donor_ngs_library_to_pedigree
            .get(library_name)
            .and_then(|idx| self.cohort.pedigrees.get(*idx))
    }

    pub fn donor_by_library(&self, library_name: &str) -> Option<&GermlineDonor<'a>> {
        self.ngs_library_to_donor
            .get(library_name)
            .and_then(|donor_ref| self.cohort.donor(*donor_ref))
    }

    pub fn index_library_names(&self) -> impl Iterator<Item = &str> {
        self.index_ngs_library_to_pedigree.keys().map(String::as_str)
    }

    /// DNA library name of every donor that has one, in pedigree order.
    pub fn donor_library_names(&self) -> impl Iterator<Item = &str> {
        self.ngs_library_to_donor.keys().map(String::as_str)
    }

    pub fn library(&self, library_name: &str) -> Option<&NgsLibraryShortcut<'a>> {
        self.library_name_to_library.get(library_name)
    }

    pub fn libraries(&self) -> impl Iterator<Item = &NgsLibraryShortcut<'a>> {
        self.library_name_to_library.values()
    }
}

fn library_name_to_library<'a>(
    donors: &[GermlineDonor<'a>],
) -> IndexMap<String, NgsLibraryShortcut<'a>> {
    let mut libraries = IndexMap::new();
    for donor in donors {
        let bio_entity = donor.bio_entity;
        for bio_sample in bio_entity.bio_samples().values() {
            let parent = BioSampleShortcut::new(bio_entity, bio_sample);
            for test_sample in bio_sample.test_samples().values() {
                for ngs_library in test_sample.ngs_libraries().values() {
                    let shortcut = NgsLibraryShortcut::new(parent, test_sample, ngs_library);
                    libraries.insert(shortcut.name(), shortcut);
                }
            }
        }
    }
    libraries
}
