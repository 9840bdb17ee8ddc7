use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

use crate::domain::{AssaySelector, SheetType};
use crate::error::SheetError;

pub const DEFAULT_CONFIG_FILE: &str = "biomedsheets.json";

#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub schema_version: Option<u32>,
    pub sheet: SheetConfigEntry,
    #[serde(default)]
    pub join_by_field: Option<String>,
    #[serde(default)]
    pub ped_output: Option<String>,
    #[serde(default)]
    pub only_with_dna_library: Option<bool>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(untagged)]
pub enum SheetConfigEntry {
    Shorthand(String),
    Detailed(SheetConfigObject),
}

#[derive(Debug, Deserialize, Serialize)]
pub struct SheetConfigObject {
    pub path: String,
    #[serde(default, rename = "type")]
    pub sheet_type: Option<SheetType>,
    #[serde(default)]
    pub selector: Option<AssaySelector>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    pub schema_version: u32,
    pub sheet_path: Utf8PathBuf,
    pub sheet_type: SheetType,
    pub selector: AssaySelector,
    pub join_by_field: Option<String>,
    pub ped_output: Option<Utf8PathBuf>,
    pub only_with_dna_library: bool,
}

impl ResolvedConfig {
    /// Configuration for a sheet given directly, without a project file.
    pub fn for_sheet(sheet_path: Utf8PathBuf) -> Self {
        Self {
            schema_version: 1,
            sheet_path,
            sheet_type: SheetType::Germline,
            selector: AssaySelector::NgsLibrary,
            join_by_field: None,
            ped_output: None,
            only_with_dna_library: false,
        }
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load the project file; without an explicit path `biomedsheets.json` in
    /// the current directory is used and must exist.
    pub fn resolve(path: Option<&str>) -> Result<ResolvedConfig, SheetError> {
        let config_path = Utf8PathBuf::from(path.unwrap_or(DEFAULT_CONFIG_FILE));

        if path.is_none() && !config_path.as_std_path().exists() {
            return Err(SheetError::MissingConfig);
        }

        let content = fs::read_to_string(config_path.as_std_path())
            .map_err(|_| SheetError::ConfigRead(config_path.clone()))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|err| SheetError::ConfigParse(err.to_string()))?;

        let base_dir = config_path.parent().unwrap_or(Utf8Path::new(""));
        Self::resolve_config(config, base_dir)
    }

    /// Apply defaults; relative paths are taken relative to `base_dir`.
    pub fn resolve_config(config: Config, base_dir: &Utf8Path) -> Result<ResolvedConfig, SheetError> {
        let schema_version = config.schema_version.unwrap_or(1);

        let (sheet_path, sheet_type, selector) = match config.sheet {
            SheetConfigEntry::Shorthand(path) => (path, None, None),
            SheetConfigEntry::Detailed(obj) => (obj.path, obj.sheet_type, obj.selector),
        };
        if sheet_path.trim().is_empty() {
            return Err(SheetError::ConfigParse("sheet path must not be empty".to_string()));
        }
        if let Some(field) = &config.join_by_field
            && field.trim().is_empty()
        {
            return Err(SheetError::ConfigParse(
                "join_by_field must not be empty".to_string(),
            ));
        }

        Ok(ResolvedConfig {
            schema_version,
            sheet_path: relative_to(base_dir, &sheet_path),
            sheet_type: sheet_type.unwrap_or(SheetType::Germline),
            selector: selector.unwrap_or(AssaySelector::NgsLibrary),
            join_by_field: config.join_by_field,
            ped_output: config
                .ped_output
                .as_deref()
                .map(|path| relative_to(base_dir, path)),
            only_with_dna_library: config.only_with_dna_library.unwrap_or(false),
        })
    }
}

fn relative_to(base_dir: &Utf8Path, path: &str) -> Utf8PathBuf {
    let path = Utf8Path::new(path);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}
