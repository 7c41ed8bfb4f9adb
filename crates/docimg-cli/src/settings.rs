//! `.docimg.toml` settings
//!
//! Settings files can be placed in:
//! - User home directory: `~/.docimg.toml` (user defaults)
//! - Project directory: `./.docimg.toml` (project defaults)
//! - Custom location via `--config` (replaces the project file)
//!
//! Precedence order (highest to lowest):
//! 1. Command-line arguments
//! 2. `--config` file, or project settings
//! 3. User settings
//! 4. Built-in defaults

use anyhow::{Context, Result};
use colored::Colorize;
use docimg_extract::DedupPolicy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// File name looked up in the home and working directories.
pub const SETTINGS_FILE_NAME: &str = ".docimg.toml";

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extract: Option<ExtractSettings>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub mapping: Option<MappingSettings>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExtractSettings {
    /// Directory extracted images are written to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,

    /// content-hash or legacy
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dedup: Option<DedupPolicy>,

    /// Archive-scan entries smaller than this (bytes) are skipped
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_image_size: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MappingSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mapping_file: Option<PathBuf>,

    /// Suggestion threshold in [0, 1]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,

    /// Write `.bak` copies before rewriting markdown
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup: Option<bool>,
}

impl Settings {
    /// Parse a settings file, printing a syntax hint on failure.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file: {}", path.display()))?;

        let settings: Self = toml::from_str(&content).map_err(|e| {
            // TOML errors carry line/column information
            eprintln!(
                "{} Failed to parse settings file: {}",
                "Error:".red().bold(),
                path.display()
            );
            eprintln!("{} {}", "Parse error:".yellow().bold(), e);
            eprintln!();
            eprintln!("{} Settings file syntax:", "Help:".cyan().bold());
            eprintln!("  [extract]");
            eprintln!("  output_dir = \"extracted_images\"");
            eprintln!("  dedup = \"content-hash\"  # content-hash or legacy");
            eprintln!("  min_image_size = 100");
            eprintln!();
            eprintln!("  [mapping]");
            eprintln!("  mapping_file = \"image_mappings.json\"");
            eprintln!("  threshold = 0.3");
            eprintln!("  backup = true");
            anyhow::anyhow!("Failed to parse settings file {}: {e}", path.display())
        })?;

        settings.validate(path)?;
        Ok(settings)
    }

    /// Range checks the TOML types cannot express.
    fn validate(&self, path: &Path) -> Result<()> {
        if let Some(threshold) = self.mapping.as_ref().and_then(|m| m.threshold) {
            if !(0.0..=1.0).contains(&threshold) {
                anyhow::bail!(
                    "Invalid settings file {}: threshold must be between 0 and 1, got {threshold}",
                    path.display()
                );
            }
        }
        Ok(())
    }

    /// Load `path` if it exists.
    fn load_if_present(path: &Path) -> Result<Option<Self>> {
        if path.is_file() {
            Self::load_from_file(path).map(Some)
        } else {
            Ok(None)
        }
    }

    /// Resolve the effective settings for this run.
    ///
    /// An explicit `--config` file must exist; discovered files are optional.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        let user = match dirs::home_dir() {
            Some(home) => Self::load_if_present(&home.join(SETTINGS_FILE_NAME))?,
            None => None,
        };
        let project = match explicit {
            Some(path) => Some(Self::load_from_file(path)?),
            None => Self::load_if_present(Path::new(SETTINGS_FILE_NAME))?,
        };
        Ok(Self::merge(user, project))
    }

    /// Field-wise merge; `project` wins over `user`.
    pub fn merge(user: Option<Self>, project: Option<Self>) -> Self {
        let user = user.unwrap_or_default();
        let project = project.unwrap_or_default();

        let extract = match (user.extract, project.extract) {
            (None, None) => None,
            (u, p) => {
                let u = u.unwrap_or_default();
                let p = p.unwrap_or_default();
                Some(ExtractSettings {
                    output_dir: p.output_dir.or(u.output_dir),
                    dedup: p.dedup.or(u.dedup),
                    min_image_size: p.min_image_size.or(u.min_image_size),
                })
            }
        };

        let mapping = match (user.mapping, project.mapping) {
            (None, None) => None,
            (u, p) => {
                let u = u.unwrap_or_default();
                let p = p.unwrap_or_default();
                Some(MappingSettings {
                    mapping_file: p.mapping_file.or(u.mapping_file),
                    threshold: p.threshold.or(u.threshold),
                    backup: p.backup.or(u.backup),
                })
            }
        };

        Self { extract, mapping }
    }

    pub fn extract(&self) -> ExtractSettings {
        self.extract.clone().unwrap_or_default()
    }

    pub fn mapping(&self) -> MappingSettings {
        self.mapping.clone().unwrap_or_default()
    }
}
