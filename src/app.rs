use std::io::Write;

use serde::Serialize;
use tracing::info;

use crate::config::ResolvedConfig;
use crate::domain::{Affection, AssaySelector, Sex, SheetType};
use crate::error::SheetError;
use crate::loader::SheetLoader;
use crate::models::{Sheet, SheetNode};
use crate::ped::{self, family_id, ped_name};
use crate::pedigree::Pedigree;
use crate::shortcuts::Shortcut;
use crate::shortcuts::cancer::{CancerCaseSheet, CancerMatchedSamplePair};
use crate::shortcuts::generic::GenericCaseSheet;
use crate::shortcuts::germline::{GermlineCaseSheet, GermlineDonor, donor_has_dna_ngs_library};

#[derive(Debug, Clone, Serialize)]
pub struct PedResult {
    pub pedigrees: usize,
    pub donors: usize,
    pub output: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "sheet_type", rename_all = "lowercase")]
pub enum SummaryResult {
    Germline(CohortSummary),
    Cancer(CancerSummary),
    Generic(GenericSummary),
}

#[derive(Debug, Clone, Serialize)]
pub struct CohortSummary {
    pub pedigree_count: usize,
    pub member_count: usize,
    pub pedigrees: Vec<PedigreeSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PedigreeSummary {
    pub family: Option<String>,
    pub index: Option<String>,
    pub affecteds: Vec<String>,
    pub founders: Vec<String>,
    pub members: Vec<DonorSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DonorSummary {
    pub name: String,
    pub secondary_id: String,
    pub sex: Sex,
    pub affection: Affection,
    pub father: Option<String>,
    pub mother: Option<String>,
    pub dna_library: Option<String>,
    pub rna_library: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CancerSummary {
    pub donors: usize,
    pub pairs: Vec<PairSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PairSummary {
    pub donor: String,
    pub primary: bool,
    pub tumor: String,
    pub normal: String,
    pub tumor_dna_library: String,
    pub normal_dna_library: String,
    pub tumor_rna_library: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GenericSummary {
    pub selector: AssaySelector,
    pub test_samples: Vec<AssaySummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AssaySummary {
    pub test_sample: String,
    pub assay_sample: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CrawlResult<'a> {
    pub path: String,
    pub name: String,
    pub node: SheetNode<'a>,
}

/// Operations behind the command line, driven by a resolved configuration.
#[derive(Debug, Clone)]
pub struct App {
    config: ResolvedConfig,
}

impl App {
    pub fn new(config: ResolvedConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ResolvedConfig {
        &self.config
    }

    pub fn load_sheet(&self) -> Result<Sheet, SheetError> {
        SheetLoader::from_path(&self.config.sheet_path)
    }

    fn germline<'a>(&self, sheet: &'a Sheet) -> Result<GermlineCaseSheet<'a>, SheetError> {
        GermlineCaseSheet::new(sheet, self.config.join_by_field.as_deref())
    }

    /// Pedigrees to write, restricted to donors with a DNA library if so
    /// configured; pedigrees left without members are dropped.
    pub fn pedigrees<'a>(
        &self,
        case_sheet: &GermlineCaseSheet<'a>,
    ) -> Result<Vec<Pedigree<'a>>, SheetError> {
        if !self.config.only_with_dna_library {
            return Ok(case_sheet.cohort.pedigrees.clone());
        }
        let mut pedigrees = Vec::with_capacity(case_sheet.cohort.pedigree_count());
        for pedigree in &case_sheet.cohort.pedigrees {
            let filtered = pedigree.with_filtered_donors(donor_has_dna_ngs_library)?;
            if filtered.member_count() > 0 {
                pedigrees.push(filtered);
            }
        }
        Ok(pedigrees)
    }

    /// Write the germline cohort in PED format, to the configured file if any
    /// and to `out` otherwise.
    pub fn ped(&self, sheet: &Sheet, out: &mut dyn Write) -> Result<PedResult, SheetError> {
        let case_sheet = self.germline(sheet)?;
        let pedigrees = self.pedigrees(&case_sheet)?;
        let donors: usize = pedigrees.iter().map(Pedigree::member_count).sum();

        let output = match &self.config.ped_output {
            Some(path) => {
                ped::write_pedigrees_to_path(path, &pedigrees)?;
                Some(path.to_string())
            }
            None => {
                ped::write_pedigrees(out, &pedigrees)?;
                None
            }
        };
        info!(
            pedigrees = pedigrees.len(),
            donors,
            output = output.as_deref().unwrap_or("-"),
            "wrote pedigrees"
        );
        Ok(PedResult {
            pedigrees: pedigrees.len(),
            donors,
            output,
        })
    }

    pub fn summary(&self, sheet: &Sheet) -> Result<SummaryResult, SheetError> {
        let result = match self.config.sheet_type {
            SheetType::Germline => SummaryResult::Germline(self.cohort_summary(sheet)?),
            SheetType::Cancer => SummaryResult::Cancer(cancer_summary(&CancerCaseSheet::new(sheet)?)),
            SheetType::Generic => SummaryResult::Generic(generic_summary(&GenericCaseSheet::new(
                sheet,
                self.config.selector,
            )?)),
        };
        info!(sheet_type = %self.config.sheet_type, sheet = sheet.identifier(), "summarized sheet");
        Ok(result)
    }

    fn cohort_summary(&self, sheet: &Sheet) -> Result<CohortSummary, SheetError> {
        let case_sheet = self.germline(sheet)?;
        let pedigrees = self.pedigrees(&case_sheet)?;
        Ok(CohortSummary {
            pedigree_count: pedigrees.len(),
            member_count: pedigrees.iter().map(Pedigree::member_count).sum(),
            pedigrees: pedigrees
                .iter()
                .map(pedigree_summary)
                .collect::<Result<Vec<_>, _>>()?,
        })
    }

    pub fn crawl<'a>(&self, sheet: &'a Sheet, path: &str) -> Result<CrawlResult<'a>, SheetError> {
        let node = sheet.crawl(path)?;
        Ok(CrawlResult {
            path: path.to_string(),
            name: format!("{}-{path}", node.entry().pk.padded()),
            node,
        })
    }
}

fn pedigree_summary(pedigree: &Pedigree<'_>) -> Result<PedigreeSummary, SheetError> {
    let members = pedigree
        .donors
        .iter()
        .map(|donor| {
            Ok(DonorSummary {
                name: donor.name(),
                secondary_id: donor.secondary_id().to_string(),
                sex: donor.sex(),
                affection: donor.affection(),
                father: pedigree.father(donor)?.map(ped_name),
                mother: pedigree.mother(donor)?.map(ped_name),
                dna_library: donor.dna_ngs_library.map(|library| library.name()),
                rna_library: donor.rna_ngs_library.map(|library| library.name()),
            })
        })
        .collect::<Result<Vec<_>, SheetError>>()?;
    Ok(PedigreeSummary {
        family: family_id(pedigree),
        index: pedigree.index().map(|index| index.name()),
        affecteds: names(pedigree.affecteds()),
        founders: names(pedigree.founders()),
        members,
    })
}

fn names<'d, 'a: 'd>(donors: impl Iterator<Item = &'d GermlineDonor<'a>>) -> Vec<String> {
    donors.map(|donor| donor.name()).collect()
}

fn cancer_summary(case_sheet: &CancerCaseSheet<'_>) -> CancerSummary {
    let pairs = case_sheet
        .donors
        .iter()
        .flat_map(|donor| {
            donor
                .all_pairs
                .iter()
                .enumerate()
                .map(|(idx, pair)| pair_summary(pair, idx == 0))
        })
        .collect();
    CancerSummary {
        donors: case_sheet.donors.len(),
        pairs,
    }
}

fn pair_summary(pair: &CancerMatchedSamplePair<'_>, primary: bool) -> PairSummary {
    PairSummary {
        donor: pair.donor.name(),
        primary,
        tumor: pair.tumor_sample.name(),
        normal: pair.normal_sample.name(),
        tumor_dna_library: pair.tumor_sample.dna_ngs_library.name(),
        normal_dna_library: pair.normal_sample.dna_ngs_library.name(),
        tumor_rna_library: pair
            .tumor_sample
            .rna_ngs_library
            .map(|library| library.name()),
    }
}

fn generic_summary(case_sheet: &GenericCaseSheet<'_>) -> GenericSummary {
    GenericSummary {
        selector: case_sheet.selector,
        test_samples: case_sheet
            .test_samples
            .iter()
            .map(|test_sample| AssaySummary {
                test_sample: test_sample.name(),
                assay_sample: test_sample.assay_sample().map(|assay| assay.name()),
            })
            .collect(),
    }
}
