//! Entity graph of a biomedical sample sheet.
//!
//! The containment hierarchy is `Sheet -> BioEntity -> BioSample -> TestSample
//! -> {NgsLibrary | MsProteinPool}`. Children are kept in insertion order and
//! keyed by their secondary id; uniqueness of that id among siblings is checked
//! once, when the children are merged into their container.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::domain::{ExtraInfos, Pk};
use crate::error::SheetError;

/// Separator between secondary ids in crawl paths and display names.
pub const PATH_SEP: char = '-';

/// Properties shared by every entry below the sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SheetEntry {
    pub pk: Pk,
    #[serde(default)]
    pub disabled: bool,
    pub secondary_id: String,
    #[serde(default)]
    pub extra_ids: Vec<String>,
    #[serde(default)]
    pub extra_infos: ExtraInfos,
}

impl SheetEntry {
    pub fn new(pk: impl Into<Pk>, secondary_id: impl Into<String>) -> Self {
        Self {
            pk: pk.into(),
            disabled: false,
            secondary_id: secondary_id.into(),
            extra_ids: Vec::new(),
            extra_infos: ExtraInfos::new(),
        }
    }

    pub fn with_extra_infos(mut self, extra_infos: ExtraInfos) -> Self {
        self.extra_infos = extra_infos;
        self
    }

    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    pub fn enabled(&self) -> bool {
        !self.disabled
    }
}

/// Read access to the [`SheetEntry`] part of an entity.
pub trait Entry {
    const KIND: &'static str;

    fn entry(&self) -> &SheetEntry;

    fn pk(&self) -> &Pk {
        &self.entry().pk
    }

    fn secondary_id(&self) -> &str {
        &self.entry().secondary_id
    }

    fn disabled(&self) -> bool {
        self.entry().disabled
    }

    fn enabled(&self) -> bool {
        self.entry().enabled()
    }

    fn extra_infos(&self) -> &ExtraInfos {
        &self.entry().extra_infos
    }

    /// Human readable label used in error messages.
    fn label(&self) -> String {
        format!("{} {} (pk {})", Self::KIND, self.secondary_id(), self.pk())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSheet")]
pub struct Sheet {
    identifier: String,
    pub title: String,
    pub description: Option<String>,
    #[serde(serialize_with = "serialize_values")]
    bio_entities: IndexMap<String, BioEntity>,
}

impl Sheet {
    pub fn new(
        identifier: impl Into<String>,
        title: impl Into<String>,
        description: Option<String>,
        bio_entities: Vec<BioEntity>,
    ) -> Result<Self, SheetError> {
        let identifier = identifier.into();
        let bio_entities = index_by_secondary_id(&format!("Sheet {identifier}"), bio_entities)?;
        Ok(Self {
            identifier,
            title: title.into(),
            description,
            bio_entities,
        })
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn bio_entities(&self) -> &IndexMap<String, BioEntity> {
        &self.bio_entities
    }

    /// Walk down the hierarchy following a `-`-separated secondary id path.
    pub fn crawl(&self, path: &str) -> Result<SheetNode<'_>, SheetError> {
        let (head, rest) = split_path(path);
        let bio_entity = lookup(&self.bio_entities, head)?;
        match rest {
            None => Ok(SheetNode::BioEntity(bio_entity)),
            Some(rest) => bio_entity.crawl(rest),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawBioEntity")]
pub struct BioEntity {
    #[serde(flatten)]
    pub entry: SheetEntry,
    #[serde(serialize_with = "serialize_values")]
    bio_samples: IndexMap<String, BioSample>,
}

impl BioEntity {
    pub fn new(entry: SheetEntry, bio_samples: Vec<BioSample>) -> Result<Self, SheetError> {
        let bio_samples = index_by_secondary_id(&entry_label::<Self>(&entry), bio_samples)?;
        Ok(Self { entry, bio_samples })
    }

    pub fn bio_samples(&self) -> &IndexMap<String, BioSample> {
        &self.bio_samples
    }

    pub fn crawl(&self, path: &str) -> Result<SheetNode<'_>, SheetError> {
        let (head, rest) = split_path(path);
        let bio_sample = lookup(&self.bio_samples, head)?;
        match rest {
            None => Ok(SheetNode::BioSample(bio_sample)),
            Some(rest) => bio_sample.crawl(rest),
        }
    }
}

impl Entry for BioEntity {
    const KIND: &'static str = "BioEntity";

    fn entry(&self) -> &SheetEntry {
        &self.entry
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawBioSample")]
pub struct BioSample {
    #[serde(flatten)]
    pub entry: SheetEntry,
    #[serde(serialize_with = "serialize_values")]
    test_samples: IndexMap<String, TestSample>,
}

impl BioSample {
    pub fn new(entry: SheetEntry, test_samples: Vec<TestSample>) -> Result<Self, SheetError> {
        let test_samples = index_by_secondary_id(&entry_label::<Self>(&entry), test_samples)?;
        Ok(Self {
            entry,
            test_samples,
        })
    }

    pub fn test_samples(&self) -> &IndexMap<String, TestSample> {
        &self.test_samples
    }

    pub fn crawl(&self, path: &str) -> Result<SheetNode<'_>, SheetError> {
        let (head, rest) = split_path(path);
        let test_sample = lookup(&self.test_samples, head)?;
        match rest {
            None => Ok(SheetNode::TestSample(test_sample)),
            Some(rest) => test_sample.crawl(rest),
        }
    }
}

impl Entry for BioSample {
    const KIND: &'static str = "BioSample";

    fn entry(&self) -> &SheetEntry {
        &self.entry
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTestSample")]
pub struct TestSample {
    #[serde(flatten)]
    pub entry: SheetEntry,
    #[serde(serialize_with = "serialize_values")]
    ngs_libraries: IndexMap<String, NgsLibrary>,
    #[serde(serialize_with = "serialize_values")]
    ms_protein_pools: IndexMap<String, MsProteinPool>,
}

impl TestSample {
    /// Build a test sample; fails when a secondary id is used by both an NGS
    /// library and a protein pool.
    pub fn new(
        entry: SheetEntry,
        ngs_libraries: Vec<NgsLibrary>,
        ms_protein_pools: Vec<MsProteinPool>,
    ) -> Result<Self, SheetError> {
        let container = entry_label::<Self>(&entry);
        let ngs_libraries = index_by_secondary_id(&container, ngs_libraries)?;
        let ms_protein_pools = index_by_secondary_id(&container, ms_protein_pools)?;
        let shared: Vec<String> = ngs_libraries
            .keys()
            .filter(|id| ms_protein_pools.contains_key(*id))
            .cloned()
            .collect();
        if !shared.is_empty() {
            return Err(SheetError::AmbiguousSecondaryId {
                container,
                ids: shared,
            });
        }
        Ok(Self {
            entry,
            ngs_libraries,
            ms_protein_pools,
        })
    }

    pub fn ngs_libraries(&self) -> &IndexMap<String, NgsLibrary> {
        &self.ngs_libraries
    }

    pub fn ms_protein_pools(&self) -> &IndexMap<String, MsProteinPool> {
        &self.ms_protein_pools
    }

    pub fn crawl(&self, path: &str) -> Result<SheetNode<'_>, SheetError> {
        let (head, rest) = split_path(path);
        if let Some(rest) = rest {
            return Err(SheetError::SecondaryIdNotFound(rest.to_string()));
        }
        if let Some(library) = self.ngs_libraries.get(head) {
            return Ok(SheetNode::NgsLibrary(library));
        }
        lookup(&self.ms_protein_pools, head).map(SheetNode::MsProteinPool)
    }
}

impl Entry for TestSample {
    const KIND: &'static str = "TestSample";

    fn entry(&self) -> &SheetEntry {
        &self.entry
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NgsLibrary {
    #[serde(flatten)]
    pub entry: SheetEntry,
}

impl NgsLibrary {
    pub fn new(entry: SheetEntry) -> Self {
        Self { entry }
    }
}

impl Entry for NgsLibrary {
    const KIND: &'static str = "NGSLibrary";

    fn entry(&self) -> &SheetEntry {
        &self.entry
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MsProteinPool {
    #[serde(flatten)]
    pub entry: SheetEntry,
}

impl MsProteinPool {
    pub fn new(entry: SheetEntry) -> Self {
        Self { entry }
    }
}

impl Entry for MsProteinPool {
    const KIND: &'static str = "MSProteinPool";

    fn entry(&self) -> &SheetEntry {
        &self.entry
    }
}

/// Node reached by crawling a sheet.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(tag = "kind", content = "entity", rename_all = "snake_case")]
pub enum SheetNode<'a> {
    BioEntity(&'a BioEntity),
    BioSample(&'a BioSample),
    TestSample(&'a TestSample),
    NgsLibrary(&'a NgsLibrary),
    MsProteinPool(&'a MsProteinPool),
}

impl SheetNode<'_> {
    pub fn entry(&self) -> &SheetEntry {
        match self {
            SheetNode::BioEntity(node) => &node.entry,
            SheetNode::BioSample(node) => &node.entry,
            SheetNode::TestSample(node) => &node.entry,
            SheetNode::NgsLibrary(node) => &node.entry,
            SheetNode::MsProteinPool(node) => &node.entry,
        }
    }
}

#[derive(Deserialize)]
struct RawSheet {
    identifier: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    bio_entities: Vec<BioEntity>,
}

impl TryFrom<RawSheet> for Sheet {
    type Error = SheetError;

    fn try_from(raw: RawSheet) -> Result<Self, Self::Error> {
        Sheet::new(raw.identifier, raw.title, raw.description, raw.bio_entities)
    }
}

#[derive(Deserialize)]
struct RawBioEntity {
    #[serde(flatten)]
    entry: SheetEntry,
    #[serde(default)]
    bio_samples: Vec<BioSample>,
}

impl TryFrom<RawBioEntity> for BioEntity {
    type Error = SheetError;

    fn try_from(raw: RawBioEntity) -> Result<Self, Self::Error> {
        BioEntity::new(raw.entry, raw.bio_samples)
    }
}

#[derive(Deserialize)]
struct RawBioSample {
    #[serde(flatten)]
    entry: SheetEntry,
    #[serde(default)]
    test_samples: Vec<TestSample>,
}

impl TryFrom<RawBioSample> for BioSample {
    type Error = SheetError;

    fn try_from(raw: RawBioSample) -> Result<Self, Self::Error> {
        BioSample::new(raw.entry, raw.test_samples)
    }
}

#[derive(Deserialize)]
struct RawTestSample {
    #[serde(flatten)]
    entry: SheetEntry,
    #[serde(default)]
    ngs_libraries: Vec<NgsLibrary>,
    #[serde(default)]
    ms_protein_pools: Vec<MsProteinPool>,
}

impl TryFrom<RawTestSample> for TestSample {
    type Error = SheetError;

    fn try_from(raw: RawTestSample) -> Result<Self, Self::Error> {
        TestSample::new(raw.entry, raw.ngs_libraries, raw.ms_protein_pools)
    }
}

fn entry_label<T: Entry>(entry: &SheetEntry) -> String {
    format!("{} {} (pk {})", T::KIND, entry.secondary_id, entry.pk)
}

fn index_by_secondary_id<T: Entry>(
    container: &str,
    items: Vec<T>,
) -> Result<IndexMap<String, T>, SheetError> {
    let mut map = IndexMap::with_capacity(items.len());
    let mut duplicates = Vec::new();
    for item in items {
        let key = item.secondary_id().to_string();
        if map.contains_key(&key) {
            duplicates.push(key);
        } else {
            map.insert(key, item);
        }
    }
    if !duplicates.is_empty() {
        return Err(SheetError::AmbiguousSecondaryId {
            container: container.to_string(),
            ids: duplicates,
        });
    }
    Ok(map)
}

fn split_path(path: &str) -> (&str, Option<&str>) {
    match path.split_once(PATH_SEP) {
        Some((head, rest)) => (head, Some(rest)),
        None => (path, None),
    }
}

fn lookup<'a, T>(map: &'a IndexMap<String, T>, key: &str) -> Result<&'a T, SheetError> {
    map.get(key)
        .ok_or_else(|| SheetError::SecondaryIdNotFound(key.to_string()))
}

fn serialize_values<S, T>(map: &IndexMap<String, T>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
    T: Serialize,
{
    serializer.collect_seq(map.values())
}
