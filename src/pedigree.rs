//! One family group of germline donors.

use std::collections::HashSet;

use indexmap::IndexMap;

use crate::domain::Pk;
use crate::error::SheetError;
use crate::shortcuts::Shortcut;
use crate::shortcuts::germline::{GermlineDonor, ParentLink, ParentRole};

/// Donors of one family group with derived lookups.
///
/// The index, affected and founder lists and the lookup maps are derived from
/// `donors` by [`Pedigree::update_shortcuts`]. They are computed on
/// construction; after changing `donors` directly the caller must call
/// `update_shortcuts` again.
#[derive(Debug, Clone, Default)]
pub struct Pedigree<'a> {
    pub donors: Vec<GermlineDonor<'a>>,
    index: Option<Pk>,
    affecteds: Vec<usize>,
    founders: Vec<usize>,
    name_to_donor: IndexMap<String, usize>,
    pk_to_donor: IndexMap<Pk, usize>,
    secondary_id_to_donor: IndexMap<String, usize>,
}

impl<'a> Pedigree<'a> {
    /// Build a pedigree; `index` keeps a preselected index individual if it is
    /// a member.
    pub fn new(donors: Vec<GermlineDonor<'a>>, index: Option<Pk>) -> Result<Self, SheetError> {
        let mut pedigree = Self {
            donors,
            index,
            ..Self::default()
        };
        pedigree.update_shortcuts()?;
        Ok(pedigree)
    }

    pub fn member_count(&self) -> usize {
        self.donors.len()
    }

    /// Recompute index, affecteds, founders and the lookup maps.
    ///
    /// Fails on a name, pk, or secondary id shared by two members and leaves
    /// the previous derived state untouched in that case.
    pub fn update_shortcuts(&mut self) -> Result<(), SheetError> {
        let name_to_donor = unique_keys(&self.donors, "name", |donor| donor.name())?;
        let pk_to_donor = unique_keys(&self.donors, "pk", |donor| donor.pk().clone())?;
        let secondary_id_to_donor = unique_keys(&self.donors, "secondary id", |donor| {
            donor.secondary_id().to_string()
        })?;

        let mut affecteds: Vec<usize> = Vec::new();
        let index = match self.donors.len() {
            0 => None,
            // Singletons are their own index regardless of affection; this
            // lets non-family sheets reuse the pedigree machinery.
            1 => Some(self.donors[0].pk().clone()),
            _ => {
                affecteds = self.sorted_positions(|donor| donor.is_affected());
                match &self.index {
                    Some(pk) if pk_to_donor.contains_key(pk) => Some(pk.clone()),
                    _ => self.select_index(),
                }
            }
        };
        let founders = (0..self.donors.len())
            .filter(|pos| self.donors[*pos].is_founder())
            .collect();

        self.index = index;
        self.affecteds = affecteds;
        self.founders = founders;
        self.name_to_donor = name_to_donor;
        self.pk_to_donor = pk_to_donor;
        self.secondary_id_to_donor = secondary_id_to_donor;
        Ok(())
    }

    /// Index selection by tier: affected with library, any with library, any
    /// affected, then the first donor. Ties break on the donor name.
    fn select_index(&self) -> Option<Pk> {
        let tiers: [fn(&GermlineDonor<'_>) -> bool; 3] = [
            |donor| donor.has_library() && donor.is_affected(),
            |donor| donor.has_library(),
            |donor| donor.is_affected(),
        ];
        tiers
            .iter()
            .find_map(|tier| self.sorted_positions(*tier).first().copied())
            .or(if self.donors.is_empty() { None } else { Some(0) })
            .map(|pos| self.donors[pos].pk().clone())
    }

    fn sorted_positions(&self, predicate: impl Fn(&GermlineDonor<'a>) -> bool) -> Vec<usize> {
        let mut positions: Vec<(String, usize)> = self
            .donors
            .iter()
            .enumerate()
            .filter(|(_, donor)| predicate(*donor))
            .map(|(pos, donor)| (donor.name(), pos))
            .collect();
        positions.sort();
        positions.into_iter().map(|(_, pos)| pos).collect()
    }

    pub fn index(&self) -> Option<&GermlineDonor<'a>> {
        self.index.as_ref().and_then(|pk| self.donor_by_pk(pk))
    }

    /// Affected members sorted by name; empty for singletons.
    pub fn affecteds(&self) -> impl Iterator<Item = &GermlineDonor<'a>> {
        self.affecteds.iter().map(|pos| &self.donors[*pos])
    }

    pub fn founders(&self) -> impl Iterator<Item = &GermlineDonor<'a>> {
        self.founders.iter().map(|pos| &self.donors[*pos])
    }

    pub fn donor_by_name(&self, name: &str) -> Option<&GermlineDonor<'a>> {
        self.name_to_donor.get(name).map(|pos| &self.donors[*pos])
    }

    pub fn donor_by_pk(&self, pk: &Pk) -> Option<&GermlineDonor<'a>> {
        self.pk_to_donor.get(pk).map(|pos| &self.donors[*pos])
    }

    pub fn donor_by_secondary_id(&self, secondary_id: &str) -> Option<&GermlineDonor<'a>> {
        self.secondary_id_to_donor
            .get(secondary_id)
            .map(|pos| &self.donors[*pos])
    }

    /// Position of the index in `donors`, found by scanning the members.
    pub(crate) fn index_position(&self) -> Option<usize> {
        let pk = self.index.as_ref()?;
        self.donors.iter().position(|donor| donor.pk() == pk)
    }

    pub(crate) fn affected_positions(&self) -> impl Iterator<Item = usize> + '_ {
        self.affecteds.iter().copied()
    }

    pub fn contains_pk(&self, pk: &Pk) -> bool {
        self.pk_to_donor.contains_key(pk)
    }

    /// Father of `donor` within this pedigree.
    pub fn father(&self, donor: &GermlineDonor<'a>) -> Result<Option<&GermlineDonor<'a>>, SheetError> {
        self.parent(donor, ParentRole::Father)
    }

    pub fn mother(&self, donor: &GermlineDonor<'a>) -> Result<Option<&GermlineDonor<'a>>, SheetError> {
        self.parent(donor, ParentRole::Mother)
    }

    pub fn parent(
        &self,
        donor: &GermlineDonor<'a>,
        role: ParentRole,
    ) -> Result<Option<&GermlineDonor<'a>>, SheetError> {
        Ok(donor
            .resolved_parent(role)?
            .and_then(|pk| self.donor_by_pk(pk)))
    }

    /// New pedigree holding only the donors that satisfy `predicate`.
    ///
    /// Donors are copied; links to parents outside the kept set are severed in
    /// the copies, together with the declared parent key. The current index is
    /// kept if it passes the predicate, otherwise a new one is selected.
    pub fn with_filtered_donors(
        &self,
        predicate: impl Fn(&GermlineDonor<'a>) -> bool,
    ) -> Result<Pedigree<'a>, SheetError> {
        let index = self
            .index()
            .filter(|index| predicate(*index))
            .map(|index| index.pk().clone());
        let included: HashSet<String> = self
            .donors
            .iter()
            .filter(|donor| predicate(*donor))
            .map(|donor| donor.name())
            .collect();

        let mut donors = Vec::with_capacity(included.len());
        for donor in self.donors.iter().filter(|donor| included.contains(&donor.name())) {
            let mut donor = donor.clone();
            for role in [ParentRole::Father, ParentRole::Mother] {
                let keep = match donor.link(role) {
                    ParentLink::Resolved(pk) => self
                        .donor_by_pk(pk)
                        .is_some_and(|parent| included.contains(&parent.name())),
                    ParentLink::Unset | ParentLink::Absent => false,
                };
                if !keep {
                    donor.sever(role);
                }
            }
            donors.push(donor);
        }
        Pedigree::new(donors, index)
    }
}

fn unique_keys<K, F>(
    donors: &[GermlineDonor<'_>],
    key_kind: &'static str,
    key: F,
) -> Result<IndexMap<K, usize>, SheetError>
where
    K: std::hash::Hash + Eq + ToString,
    F: Fn(&GermlineDonor<'_>) -> K,
{
    let mut map = IndexMap::with_capacity(donors.len());
    let mut duplicates = Vec::new();
    for (pos, donor) in donors.iter().enumerate() {
        let value = key(donor);
        if map.contains_key(&value) {
            duplicates.push(value.to_string());
        } else {
            map.insert(value, pos);
        }
    }
    if !duplicates.is_empty() {
        duplicates.sort();
        return Err(SheetError::DuplicateKey {
            scope: "pedigree",
            key_kind,
            keys: duplicates,
        });
    }
    Ok(map)
}
