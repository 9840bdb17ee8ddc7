//! Disjoint union of pedigrees and the builder that partitions donors into
//! pedigrees.

use indexmap::IndexMap;
use tracing::{debug, info};

use crate::domain::Pk;
use crate::error::SheetError;
use crate::pedigree::Pedigree;
use crate::shortcuts::Shortcut;
use crate::shortcuts::germline::{GermlineDonor, ParentLink, ParentRole};
use crate::union_find::UnionFind;

/// Position of a donor inside a [`Cohort`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DonorRef {
    pub pedigree: usize,
    pub donor: usize,
}

/// Pedigrees of a study with cohort-wide lookups.
///
/// Like [`Pedigree`], the derived members are computed on construction and
/// must be refreshed with [`Cohort::update_shortcuts`] after `pedigrees` is
/// changed directly.
#[derive(Debug, Clone, Default)]
pub struct Cohort<'a> {
    pub pedigrees: Vec<Pedigree<'a>>,
    indices: Vec<DonorRef>,
    affecteds: Vec<DonorRef>,
    name_to_donor: IndexMap<String, DonorRef>,
    pk_to_donor: IndexMap<Pk, DonorRef>,
    secondary_id_to_donor: IndexMap<String, DonorRef>,
}

impl<'a> Cohort<'a> {
    pub fn new(pedigrees: Vec<Pedigree<'a>>) -> Result<Self, SheetError> {
        let mut cohort = Self {
            pedigrees,
            ..Self::default()
        };
        cohort.update_shortcuts()?;
        Ok(cohort)
    }

    pub fn member_count(&self) -> usize {
        self.pedigrees.iter().map(Pedigree::member_count).sum()
    }

    pub fn pedigree_count(&self) -> usize {
        self.pedigrees.len()
    }

    /// Rebuild index and affected lists and the cohort-wide key maps.
    ///
    /// Fails as soon as a name, pk, or secondary id occurs in more than one
    /// pedigree; nothing is updated in that case.
    pub fn update_shortcuts(&mut self) -> Result<(), SheetError> {
        let mut name_to_donor = IndexMap::new();
        let mut pk_to_donor = IndexMap::new();
        let mut secondary_id_to_donor = IndexMap::new();
        let mut indices = Vec::new();
        let mut affecteds = Vec::new();

        for (pedigree_idx, pedigree) in self.pedigrees.iter().enumerate() {
            let at = |donor: usize| DonorRef {
                pedigree: pedigree_idx,
                donor,
            };
            let members = || pedigree.donors.iter().enumerate();
            merge_checked(
                &mut name_to_donor,
                members().map(|(pos, donor)| (donor.name(), at(pos))),
                "name",
            )?;
            merge_checked(
                &mut pk_to_donor,
                members().map(|(pos, donor)| (donor.pk().clone(), at(pos))),
                "pk",
            )?;
            merge_checked(
                &mut secondary_id_to_donor,
                members().map(|(pos, donor)| (donor.secondary_id().to_string(), at(pos))),
                "secondary id",
            )?;
            indices.extend(pedigree.index_position().map(at));
            affecteds.extend(pedigree.affected_positions().map(at));
        }

        self.indices = indices;
        self.affecteds = affecteds;
        self.name_to_donor = name_to_donor;
        self.pk_to_donor = pk_to_donor;
        self.secondary_id_to_donor = secondary_id_to_donor;
        Ok(())
    }

    pub fn donor(&self, donor_ref: DonorRef) -> Option<&GermlineDonor<'a>> {
        self.pedigrees
            .get(donor_ref.pedigree)
            .and_then(|pedigree| pedigree.donors.get(donor_ref.donor))
    }

    /// Index individual of every pedigree.
    pub fn indices(&self) -> impl Iterator<Item = &GermlineDonor<'a>> {
        self.indices.iter().filter_map(|donor_ref| self.donor(*donor_ref))
    }

    pub fn affecteds(&self) -> impl Iterator<Item = &GermlineDonor<'a>> {
        self.affecteds
            .iter()
            .filter_map(|donor_ref| self.donor(*donor_ref))
    }

    pub fn donor_ref_by_pk(&self, pk: &Pk) -> Option<DonorRef> {
        self.pk_to_donor.get(pk).copied()
    }

    pub fn donor_by_pk(&self, pk: &Pk) -> Option<&GermlineDonor<'a>> {
        self.donor_ref_by_pk(pk).and_then(|donor_ref| self.donor(donor_ref))
    }

    pub fn donor_by_name(&self, name: &str) -> Option<&GermlineDonor<'a>> {
        self.name_to_donor
            .get(name)
            .and_then(|donor_ref| self.donor(*donor_ref))
    }

    pub fn donor_by_secondary_id(&self, secondary_id: &str) -> Option<&GermlineDonor<'a>> {
        self.secondary_id_to_donor
            .get(secondary_id)
            .and_then(|donor_ref| self.donor(*donor_ref))
    }

    pub fn pedigree_by_pk(&self, pk: &Pk) -> Option<&Pedigree<'a>> {
        self.pk_to_donor
            .get(pk)
            .and_then(|donor_ref| self.pedigrees.get(donor_ref.pedigree))
    }

    pub fn pedigree_by_name(&self, name: &str) -> Option<&Pedigree<'a>> {
        self.name_to_donor
            .get(name)
            .and_then(|donor_ref| self.pedigrees.get(donor_ref.pedigree))
    }

    pub fn pedigree_by_secondary_id(&self, secondary_id: &str) -> Option<&Pedigree<'a>> {
        self.secondary_id_to_donor
            .get(secondary_id)
            .and_then(|donor_ref| self.pedigrees.get(donor_ref.pedigree))
    }
}

fn merge_checked<K, I>(
    dest: &mut IndexMap<K, DonorRef>,
    entries: I,
    key_kind: &'static str,
) -> Result<(), SheetError>
where
    K: std::hash::Hash + Eq + ToString,
    I: Iterator<Item = (K, DonorRef)>,
{
    let entries: Vec<(K, DonorRef)> = entries.collect();
    let mut overlap: Vec<String> = entries
        .iter()
        .filter(|(key, _)| dest.contains_key(key))
        .map(|(key, _)| key.to_string())
        .collect();
    if !overlap.is_empty() {
        overlap.sort();
        return Err(SheetError::DuplicateKey {
            scope: "cohort",
            key_kind,
            keys: overlap,
        });
    }
    dest.extend(entries);
    Ok(())
}

/// Partitions germline donors into pedigrees and resolves parent links.
#[derive(Debug, Clone)]
pub struct CohortBuilder<'a> {
    donors: Vec<GermlineDonor<'a>>,
    join_by_field: Option<String>,
}

impl<'a> CohortBuilder<'a> {
    pub fn new(donors: Vec<GermlineDonor<'a>>) -> Self {
        Self {
            donors,
            join_by_field: None,
        }
    }

    /// Group donors by the value of this extra info field instead of by their
    /// parent links, e.g. a family identifier.
    pub fn join_by_field(mut self, field: impl Into<String>) -> Self {
        self.join_by_field = Some(field.into());
        self
    }

    pub fn run(self) -> Result<Cohort<'a>, SheetError> {
        let join_by_field = self.join_by_field.clone();
        let partition = match &join_by_field {
            Some(field) => partition_by_field(self.donors, field)?,
            None => partition_by_links(self.donors),
        };
        let pedigrees = partition
            .into_iter()
            .map(|donors| Pedigree::new(donors, None))
            .collect::<Result<Vec<_>, _>>()?;
        let mut cohort = Cohort::new(pedigrees)?;

        let links = plan_links(&cohort, join_by_field.as_deref())?;
        for (donor_ref, role, link) in links {
            if let Some(donor) = cohort
                .pedigrees
                .get_mut(donor_ref.pedigree)
                .and_then(|pedigree| pedigree.donors.get_mut(donor_ref.donor))
            {
                donor.set_link(role, link);
            }
        }

        info!(
            pedigrees = cohort.pedigree_count(),
            donors = cohort.member_count(),
            join_by_field = join_by_field.as_deref().unwrap_or("-"),
            "built cohort"
        );
        Ok(cohort)
    }
}

/// Connected components of the "is parent of" relation, in order of first
/// appearance; members keep their input order.
fn partition_by_links(donors: Vec<GermlineDonor<'_>>) -> Vec<Vec<GermlineDonor<'_>>> {
    let mut union_find = UnionFind::new();
    for donor in &donors {
        union_find.find(donor.pk().as_str());
        for parent_pk in [donor.father_pk(), donor.mother_pk()].into_iter().flatten() {
            union_find.union(donor.pk().as_str(), parent_pk.as_str());
        }
    }
    let mut partition: IndexMap<usize, Vec<GermlineDonor<'_>>> = IndexMap::new();
    for donor in donors {
        let root = union_find.find(donor.pk().as_str());
        partition.entry(root).or_default().push(donor);
    }
    debug!(groups = partition.len(), "partitioned donors by parent links");
    partition.into_values().collect()
}

fn partition_by_field<'a>(
    donors: Vec<GermlineDonor<'a>>,
    field: &str,
) -> Result<Vec<Vec<GermlineDonor<'a>>>, SheetError> {
    let mut partition: IndexMap<String, Vec<GermlineDonor<'a>>> = IndexMap::new();
    for donor in donors {
        let Some(value) = donor.extra_infos.get(field) else {
            return Err(SheetError::UndefinedField {
                field: field.to_string(),
                pk: donor.pk().to_string(),
                available: donor.extra_infos.keys().map(str::to_string).collect(),
            });
        };
        partition.entry(value.to_string()).or_default().push(donor);
    }
    debug!(groups = partition.len(), field, "partitioned donors by field");
    Ok(partition.into_values().collect())
}

/// Parent link for every donor and role; a declared parent must exist in the
/// cohort and live in the donor's own pedigree.
fn plan_links(
    cohort: &Cohort<'_>,
    join_by_field: Option<&str>,
) -> Result<Vec<(DonorRef, ParentRole, ParentLink)>, SheetError> {
    let mut links = Vec::new();
    for (pedigree_idx, pedigree) in cohort.pedigrees.iter().enumerate() {
        for (donor_idx, donor) in pedigree.donors.iter().enumerate() {
            let donor_ref = DonorRef {
                pedigree: pedigree_idx,
                donor: donor_idx,
            };
            for role in [ParentRole::Father, ParentRole::Mother] {
                let Some(parent_pk) = donor.parent_pk(role) else {
                    links.push((donor_ref, role, ParentLink::Absent));
                    continue;
                };
                if cohort.donor_ref_by_pk(parent_pk).is_none() {
                    return Err(SheetError::UnknownParent {
                        secondary_id: donor.secondary_id().to_string(),
                        parent_pk: parent_pk.to_string(),
                    });
                }
                if !pedigree.contains_pk(parent_pk) {
                    return Err(SheetError::InconsistentPedigree {
                        secondary_id: donor.secondary_id().to_string(),
                        join_by_field: join_by_field.map(str::to_string),
                    });
                }
                links.push((donor_ref, role, ParentLink::Resolved(parent_pk.clone())));
            }
        }
    }
    Ok(links)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::domain::{ExtraInfos, ExtraValue};
    use crate::models::{BioEntity, SheetEntry};

    fn entity(pk: i64, id: &str, extra: ExtraInfos) -> BioEntity {
        BioEntity::new(SheetEntry::new(pk, id).with_extra_infos(extra), Vec::new()).unwrap()
    }

    fn donors(entities: &[BioEntity]) -> Vec<GermlineDonor<'_>> {
        entities.iter().map(|bio_entity| GermlineDonor::new(bio_entity).unwrap()).collect()
    }

    #[test]
    fn integer_field_values_group_donors() {
        let entities = [
            entity(1, "a", [("family", ExtraValue::Integer(7))].into_iter().collect()),
            entity(2, "b", [("family", ExtraValue::Integer(8))].into_iter().collect()),
            entity(3, "c", [("family", ExtraValue::Integer(7))].into_iter().collect()),
        ];
        let cohort = CohortBuilder::new(donors(&entities))
            .join_by_field("family")
            .run()
            .unwrap();
        assert_eq!(cohort.pedigree_count(), 2);
        assert_eq!(cohort.member_count(), 3);
        assert_eq!(cohort.indices().count(), 2);
        let pedigree = cohort.pedigree_by_name("000003-c").unwrap();
        assert!(pedigree.contains_pk(&Pk::from(1)));
    }

    #[test]
    fn row_mode_resolves_links_in_component() {
        let entities = [
            entity(1, "a", ExtraInfos::new()),
            entity(2, "b", [("motherPk", "1")].into_iter().collect()),
        ];
        let cohort = CohortBuilder::new(donors(&entities)).run().unwrap();
        assert_eq!(cohort.pedigree_count(), 1);
        let child = cohort.donor_by_name("000002-b").unwrap();
        assert_matches!(child.link(ParentRole::Mother), ParentLink::Resolved(pk) if pk.as_str() == "1");
        assert_eq!(*child.link(ParentRole::Father), ParentLink::Absent);
    }

    #[test]
    fn refresh_uses_current_member_positions() {
        let entities = [
            entity(1, "a", ExtraInfos::new()),
            entity(2, "b", [("motherPk", "1"), ("isAffected", "affected")].into_iter().collect()),
        ];
        let mut cohort = CohortBuilder::new(donors(&entities)).run().unwrap();
        cohort.pedigrees[0].donors.reverse();
        cohort.update_shortcuts().unwrap();

        for name in ["000001-a", "000002-b"] {
            assert_eq!(cohort.donor_by_name(name).unwrap().name(), name);
        }
        assert_eq!(
            cohort.donor_ref_by_pk(&Pk::from(1)),
            Some(DonorRef { pedigree: 0, donor: 1 })
        );
    }
}
