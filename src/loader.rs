use std::fs;

use camino::Utf8Path;
use tracing::debug;

use crate::error::SheetError;
use crate::models::Sheet;

/// Reads the normalized JSON rendition of a sample sheet.
pub struct SheetLoader;

impl SheetLoader {
    pub fn from_path(path: &Utf8Path) -> Result<Sheet, SheetError> {
        let content = fs::read_to_string(path.as_std_path())
            .map_err(|_| SheetError::SheetRead(path.to_path_buf()))?;
        let sheet = Self::from_json(&content)?;
        debug!(
            path = %path,
            identifier = sheet.identifier(),
            bio_entities = sheet.bio_entities().len(),
            "loaded sample sheet"
        );
        Ok(sheet)
    }

    pub fn from_json(content: &str) -> Result<Sheet, SheetError> {
        serde_json::from_str(content).map_err(|err| SheetError::SheetParse(err.to_string()))
    }

    pub fn from_value(value: serde_json::Value) -> Result<Sheet, SheetError> {
        serde_json::from_value(value).map_err(|err| SheetError::SheetParse(err.to_string()))
    }
}
