use camino::Utf8PathBuf;
use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum SheetError {
    #[error("could not find {what} for {entity}")]
    MissingDataEntity { entity: String, what: String },

    #[error("invalid test sample selector: {0}")]
    InvalidSelector(String),

    #[error("ambiguous secondary ids in {container}: {}", ids.join(", "))]
    AmbiguousSecondaryId { container: String, ids: Vec<String> },

    #[error("could not find sub entry with secondary id {0}")]
    SecondaryIdNotFound(String),

    #[error("invalid value {value:?} for field {field:?} of {entity}")]
    InvalidFieldValue {
        entity: String,
        field: String,
        value: String,
    },

    #[error("field '{field}' is not defined for 'pk {pk}'. Available fields: {}", available.join(", "))]
    UndefinedField {
        field: String,
        pk: String,
        available: Vec<String>,
    },

    #[error(
        "inconsistent pedigree for '{secondary_id}': parent links from the sheet rows \
         disagree with the grouping by '{}'",
        join_by_field.as_deref().unwrap_or("parent links")
    )]
    InconsistentPedigree {
        secondary_id: String,
        join_by_field: Option<String>,
    },

    #[error("parent pk {parent_pk} declared by '{secondary_id}' matches no donor")]
    UnknownParent {
        secondary_id: String,
        parent_pk: String,
    },

    #[error("{role} of '{secondary_id}' is declared but not resolved; run the cohort builder first")]
    ParentNotResolved {
        secondary_id: String,
        role: &'static str,
    },

    #[error("duplicate {key_kind}s when building {scope} shortcuts: {}", keys.join(", "))]
    DuplicateKey {
        scope: &'static str,
        key_kind: &'static str,
        keys: Vec<String>,
    },

    #[error("missing config file biomedsheets.json in current directory")]
    MissingConfig,

    #[error("failed to read config file at {0}")]
    ConfigRead(Utf8PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("failed to read sample sheet at {0}")]
    SheetRead(Utf8PathBuf),

    #[error("failed to parse sample sheet: {0}")]
    SheetParse(String),

    #[error("invalid sheet type: {0}")]
    InvalidSheetType(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),
}

impl SheetError {
    pub(crate) fn missing(entity: impl Into<String>, what: impl Into<String>) -> Self {
        SheetError::MissingDataEntity {
            entity: entity.into(),
            what: what.into(),
        }
    }
}
