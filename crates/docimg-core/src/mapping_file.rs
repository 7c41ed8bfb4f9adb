//! Reviewable mapping configuration persisted between the analysis and apply runs.

use crate::error::Result;
use crate::placeholder::{Mappings, PlaceholderMap};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Default location of the mapping file.
pub const DEFAULT_MAPPING_FILE: &str = "image_mappings.json";

/// Help text stored alongside the mappings.
pub const MAPPING_INSTRUCTIONS: &str = "Edit the 'manual_mappings' section to override suggestions. \
     Format: {'file:placeholder': 'image_name'}";

/// JSON document written by the analysis pass and read by the apply pass.
///
/// `manual_mappings` is authoritative once non-empty; it is never merged with
/// `suggestions`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MappingConfigFile {
    /// Raw findings: file → `[text, start, end]` tuples
    pub placeholders: PlaceholderMap,
    /// Generated suggestions
    pub suggestions: Mappings,
    /// Human overrides
    pub manual_mappings: Mappings,
    pub instructions: String,
}

impl MappingConfigFile {
    /// Build a fresh config from an analysis pass (manual section empty).
    #[must_use]
    pub fn new(placeholders: PlaceholderMap, suggestions: Mappings) -> Self {
        Self {
            placeholders,
            suggestions,
            manual_mappings: Mappings::new(),
            instructions: MAPPING_INSTRUCTIONS.to_string(),
        }
    }

    /// Write as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        log::info!("Mapping configuration saved to: {}", path.display());
        Ok(())
    }

    /// Read a previously saved config.
    ///
    /// Missing sections default to empty so hand-trimmed files still load.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid JSON.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Mappings to apply: manual overrides if any exist, suggestions otherwise.
    #[must_use]
    pub fn effective_mappings(&self) -> &Mappings {
        if self.manual_mappings.is_empty() {
            &self.suggestions
        } else {
            &self.manual_mappings
        }
    }
}
