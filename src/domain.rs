use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::SheetError;

/// Key of the "is cancer" flag on bio samples.
pub const KEY_IS_CANCER: &str = "isCancer";
/// Key of the "is tumor" flag consulted by germline resolution.
pub const KEY_IS_TUMOR: &str = "isTumor";
/// Key of the extraction type on test samples.
pub const KEY_EXTRACTION_TYPE: &str = "extractionType";
/// Key of the affection state on germline donors.
pub const KEY_IS_AFFECTED: &str = "isAffected";
/// Key of the father's primary key on germline donors.
pub const KEY_FATHER_PK: &str = "fatherPk";
/// Key of the mother's primary key on germline donors.
pub const KEY_MOTHER_PK: &str = "motherPk";
/// Key of the sex on germline donors.
pub const KEY_SEX: &str = "sex";

/// Primary key of a sheet entry in its canonical string form.
///
/// Sheets carry primary keys and parent references either as JSON integers or
/// as strings; both collapse onto the same value here so that `1` and `"1"`
/// address the same donor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Pk(String);

impl Pk {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Primary key left-padded with zeros to six characters.
    pub fn padded(&self) -> String {
        format!("{:0>6}", self.0)
    }
}

impl fmt::Display for Pk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Pk {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<i64> for Pk {
    fn from(value: i64) -> Self {
        Self(value.to_string())
    }
}

impl From<i32> for Pk {
    fn from(value: i32) -> Self {
        Self(value.to_string())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawPk {
    Integer(i64),
    Text(String),
}

impl<'de> Deserialize<'de> for Pk {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match RawPk::deserialize(deserializer)? {
            RawPk::Integer(value) => Pk::from(value),
            RawPk::Text(value) => Pk::new(value),
        })
    }
}

impl Serialize for Pk {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

/// One value of the open `extra_infos` attribute bag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExtraValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for ExtraValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtraValue::Bool(value) => write!(f, "{value}"),
            ExtraValue::Integer(value) => write!(f, "{value}"),
            ExtraValue::Float(value) => write!(f, "{value}"),
            ExtraValue::Text(value) => write!(f, "{value}"),
        }
    }
}

impl From<bool> for ExtraValue {
    fn from(value: bool) -> Self {
        ExtraValue::Bool(value)
    }
}

impl From<i64> for ExtraValue {
    fn from(value: i64) -> Self {
        ExtraValue::Integer(value)
    }
}

impl From<i32> for ExtraValue {
    fn from(value: i32) -> Self {
        ExtraValue::Integer(i64::from(value))
    }
}

impl From<&str> for ExtraValue {
    fn from(value: &str) -> Self {
        ExtraValue::Text(value.to_string())
    }
}

/// Ordered attribute bag attached to every sheet entry.
///
/// All typed lookups of domain flags go through the accessors here so that a
/// missing or malformed flag always surfaces as a [`SheetError`] naming the
/// entity and the key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExtraInfos(IndexMap<String, ExtraValue>);

impl ExtraInfos {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&ExtraValue> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ExtraValue>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<ExtraValue> {
        self.0.shift_remove(key)
    }

    pub fn require(&self, key: &str, entity: &str) -> Result<&ExtraValue, SheetError> {
        self.0
            .get(key)
            .ok_or_else(|| SheetError::missing(entity, format!("\"{key}\" flag")))
    }

    pub fn require_bool(&self, key: &str, entity: &str) -> Result<bool, SheetError> {
        let value = self.require(key, entity)?;
        as_bool(value).ok_or_else(|| invalid(entity, key, value))
    }

    /// Boolean flag that defaults to `false` when absent.
    pub fn flag(&self, key: &str, entity: &str) -> Result<bool, SheetError> {
        match self.0.get(key) {
            None => Ok(false),
            Some(value) => as_bool(value).ok_or_else(|| invalid(entity, key, value)),
        }
    }

    pub fn require_text(&self, key: &str, entity: &str) -> Result<&str, SheetError> {
        match self.require(key, entity)? {
            ExtraValue::Text(text) => Ok(text.as_str()),
            other => Err(invalid(entity, key, other)),
        }
    }

    /// Primary key stored under `key`, if any.
    ///
    /// Empty strings and the integer `0` count as "no value", matching how
    /// sheets leave parent columns blank.
    pub fn pk(&self, key: &str, entity: &str) -> Result<Option<Pk>, SheetError> {
        match self.0.get(key) {
            None | Some(ExtraValue::Integer(0)) => Ok(None),
            Some(ExtraValue::Integer(value)) => Ok(Some(Pk::from(*value))),
            Some(ExtraValue::Text(text)) if text.trim().is_empty() => Ok(None),
            Some(ExtraValue::Text(text)) => Ok(Some(Pk::new(text.as_str()))),
            Some(other) => Err(invalid(entity, key, other)),
        }
    }

    /// Parse the text value under `key`, falling back to `default` when absent.
    pub fn parse_or<T: FromStr>(&self, key: &str, entity: &str, default: T) -> Result<T, SheetError> {
        match self.0.get(key) {
            None => Ok(default),
            Some(ExtraValue::Text(text)) => text
                .parse()
                .map_err(|_| invalid(entity, key, &ExtraValue::Text(text.clone()))),
            Some(other) => Err(invalid(entity, key, other)),
        }
    }
}

impl<K: Into<String>, V: Into<ExtraValue>> FromIterator<(K, V)> for ExtraInfos {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}

fn as_bool(value: &ExtraValue) -> Option<bool> {
    match value {
        ExtraValue::Bool(flag) => Some(*flag),
        ExtraValue::Integer(0) => Some(false),
        ExtraValue::Integer(1) => Some(true),
        ExtraValue::Text(text) => match text.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" => Some(true),
            "false" | "no" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn invalid(entity: &str, key: &str, value: &ExtraValue) -> SheetError {
    SheetError::InvalidFieldValue {
        entity: entity.to_string(),
        field: key.to_string(),
        value: value.to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
    Unknown,
}

impl Sex {
    /// Code used in the sex column of pedigree files.
    pub fn ped_code(self) -> &'static str {
        match self {
            Sex::Male => "1",
            Sex::Female => "2",
            Sex::Unknown => "0",
        }
    }
}

impl FromStr for Sex {
    type Err = SheetError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "male" => Ok(Sex::Male),
            "female" => Ok(Sex::Female),
            "unknown" => Ok(Sex::Unknown),
            _ => Err(invalid("sex value", KEY_SEX, &ExtraValue::from(value))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Affection {
    Affected,
    Unaffected,
    Unknown,
}

impl Affection {
    /// Code used in the affection column of pedigree files.
    pub fn ped_code(self) -> &'static str {
        match self {
            Affection::Affected => "2",
            Affection::Unaffected => "1",
            Affection::Unknown => "0",
        }
    }
}

impl FromStr for Affection {
    type Err = SheetError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "affected" => Ok(Affection::Affected),
            "unaffected" => Ok(Affection::Unaffected),
            "unknown" => Ok(Affection::Unknown),
            _ => Err(invalid(
                "affection value",
                KEY_IS_AFFECTED,
                &ExtraValue::from(value),
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionType {
    Dna,
    Rna,
}

impl ExtractionType {
    pub fn as_str(self) -> &'static str {
        match self {
            ExtractionType::Dna => "DNA",
            ExtractionType::Rna => "RNA",
        }
    }
}

impl fmt::Display for ExtractionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Child type of a `TestSample` that an assay-level shortcut resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum AssaySelector {
    #[value(name = "ngs_library")]
    NgsLibrary,
    #[value(name = "ms_protein_pool")]
    MsProteinPool,
}

impl fmt::Display for AssaySelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssaySelector::NgsLibrary => write!(f, "ngs_library"),
            AssaySelector::MsProteinPool => write!(f, "ms_protein_pool"),
        }
    }
}

impl FromStr for AssaySelector {
    type Err = SheetError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "ngs_library" => Ok(AssaySelector::NgsLibrary),
            "ms_protein_pool" => Ok(AssaySelector::MsProteinPool),
            _ => Err(SheetError::InvalidSelector(value.to_string())),
        }
    }
}

/// Study design a sheet is viewed through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SheetType {
    Germline,
    Cancer,
    Generic,
}

impl fmt::Display for SheetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SheetType::Germline => write!(f, "germline"),
            SheetType::Cancer => write!(f, "cancer"),
            SheetType::Generic => write!(f, "generic"),
        }
    }
}

impl FromStr for SheetType {
    type Err = SheetError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "germline" => Ok(SheetType::Germline),
            "cancer" => Ok(SheetType::Cancer),
            "generic" => Ok(SheetType::Generic),
            _ => Err(SheetError::InvalidSheetType(value.to_string())),
        }
    }
}
