//! Extraction report (`extraction_report.txt`).

use crate::options::Strategy;
use crate::package;
use crate::sniff::{self, REPORT_IMAGE_EXTENSIONS};
use docimg_core::{ImageMapping, Result};
use std::collections::HashSet;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

/// File name of the report inside the output directory.
pub const REPORT_FILE_NAME: &str = "extraction_report.txt";

const RULE_HEAVY: &str = "==================================================";
const RULE_LIGHT: &str = "--------------------------------------------------";

/// What one strategy did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrategyOutcome {
    pub strategy: Strategy,
    /// Images this strategy added to the mapping
    pub extracted: usize,
    /// Individual items that failed and were skipped
    pub failures: usize,
    /// Duplicates detected and skipped
    pub duplicates: usize,
    /// Strategy-level notes (skips, whole-strategy failures)
    pub notes: Vec<String>,
}

impl StrategyOutcome {
    #[must_use]
    pub const fn new(strategy: Strategy) -> Self {
        Self {
            strategy,
            extracted: 0,
            failures: 0,
            duplicates: 0,
            notes: Vec::new(),
        }
    }

    /// Record a strategy-level note and log it.
    pub fn note(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::warn!("  Note: {message}");
        self.notes.push(message);
    }
}

/// Raw archive layout, independent of what was extracted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArchiveStructure {
    /// Entries with "media" anywhere in the path
    pub media_paths: usize,
    /// Entries whose extension is an image extension
    pub potential_images: Vec<String>,
}

impl ArchiveStructure {
    /// Inspect a document archive.
    ///
    /// # Errors
    ///
    /// Returns an error if the archive cannot be opened.
    pub fn inspect(word_file: &Path) -> Result<Self> {
        let archive = package::open_archive(word_file)?;
        Ok(Self::from_names(&package::entry_names(&archive)))
    }

    #[must_use]
    pub fn from_names(names: &[String]) -> Self {
        let media_paths = names
            .iter()
            .filter(|n| n.to_lowercase().contains("media"))
            .count();
        let potential_images = names
            .iter()
            .filter(|n| {
                sniff::extension_of(n).is_some_and(|ext| sniff::is_in(REPORT_IMAGE_EXTENSIONS, &ext))
            })
            .cloned()
            .collect();
        Self {
            media_paths,
            potential_images,
        }
    }
}

/// Everything the report file shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionReport {
    pub document_name: String,
    pub output_dir: String,
    /// Extracted names, sorted
    pub image_names: Vec<String>,
    pub outcomes: Vec<StrategyOutcome>,
    /// Archive layout, or why it could not be read
    pub structure: std::result::Result<ArchiveStructure, String>,
    /// Potential image paths no image was written from, in archive order
    pub unextracted_candidates: Vec<String>,
}

impl ExtractionReport {
    /// Assemble a report for a finished extraction.
    #[must_use]
    pub fn build(
        word_file: &Path,
        output_dir: &Path,
        mapping: &ImageMapping,
        extracted_sources: &HashSet<String>,
        outcomes: &[StrategyOutcome],
    ) -> Self {
        let structure = ArchiveStructure::inspect(word_file).map_err(|e| e.to_string());
        let unextracted_candidates = structure.as_ref().map_or_else(
            |_| Vec::new(),
            |s| {
                s.potential_images
                    .iter()
                    .filter(|path| !extracted_sources.contains(*path))
                    .cloned()
                    .collect()
            },
        );
        Self {
            document_name: word_file
                .file_name()
                .map_or_else(|| word_file.display().to_string(), |n| n.to_string_lossy().to_string()),
            output_dir: output_dir.display().to_string(),
            image_names: mapping.keys().cloned().collect(),
            outcomes: outcomes.to_vec(),
            structure,
            unextracted_candidates,
        }
    }

    /// True when the archive holds more image-like paths than were extracted.
    #[must_use]
    pub fn has_missing_images(&self) -> bool {
        self.structure
            .as_ref()
            .is_ok_and(|s| s.potential_images.len() > self.image_names.len())
    }

    /// Render the report text.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        let total = self.image_names.len();

        // Writing into a String cannot fail
        let _ = writeln!(out, "Image Extraction Report");
        let _ = writeln!(out, "{RULE_HEAVY}");
        let _ = writeln!(out, "Document: {}", self.document_name);
        let _ = writeln!(out, "Total images extracted: {total}");
        let _ = writeln!(out, "Output directory: {}\n", self.output_dir);

        let _ = writeln!(out, "Extracted Images:");
        let _ = writeln!(out, "{RULE_LIGHT}");
        for name in &self.image_names {
            let _ = writeln!(out, "  {name}");
        }

        let _ = writeln!(out, "\n\nStrategies:");
        let _ = writeln!(out, "{RULE_LIGHT}");
        for outcome in &self.outcomes {
            let _ = writeln!(
                out,
                "{}: {} extracted, {} duplicates skipped, {} failed",
                outcome.strategy, outcome.extracted, outcome.duplicates, outcome.failures
            );
            for note in &outcome.notes {
                let _ = writeln!(out, "  - {note}");
            }
        }

        let _ = writeln!(out, "\n\nDiagnostics:");
        let _ = writeln!(out, "{RULE_LIGHT}");
        match &self.structure {
            Ok(structure) => {
                let potential = structure.potential_images.len();
                let _ = writeln!(out, "Files with 'media' in path: {}", structure.media_paths);
                let _ = writeln!(out, "Potential image files in document: {potential}");
                if self.has_missing_images() {
                    let _ = writeln!(
                        out,
                        "\nWARNING: Found {potential} potential images but only extracted {total}"
                    );
                    let _ = writeln!(out, "Some images might be duplicates or failed to extract.");
                    let _ = writeln!(out, "\nPotential image paths not extracted:");
                    for path in &self.unextracted_candidates {
                        let _ = writeln!(out, "  - {path}");
                    }
                }
            }
            Err(e) => {
                let _ = writeln!(out, "Could not analyze document structure: {e}");
            }
        }

        out
    }

    /// Write the report into `output_dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn write_to(&self, output_dir: &Path) -> Result<()> {
        let path = output_dir.join(REPORT_FILE_NAME);
        fs::write(&path, self.render())?;
        log::info!("Extraction report saved to: {}", path.display());
        Ok(())
    }
}
