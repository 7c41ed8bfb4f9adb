//! Extractor configuration and start-up capability detection.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Entries smaller than this are not real images (archive scan only).
pub const DEFAULT_MIN_IMAGE_SIZE: usize = 100;

/// How duplicate images are detected across strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DedupPolicy {
    /// One set of full content digests shared by every strategy
    #[default]
    ContentHash,
    /// Per-strategy checks of earlier releases: hash substring in existing
    /// names for the archive scan, output-path-exists for shapes and
    /// relationships, none for the converter
    Legacy,
}

impl fmt::Display for DedupPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ContentHash => write!(f, "content-hash"),
            Self::Legacy => write!(f, "legacy"),
        }
    }
}

impl FromStr for DedupPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "content-hash" | "content_hash" | "hash" => Ok(Self::ContentHash),
            "legacy" => Ok(Self::Legacy),
            other => Err(format!(
                "unknown dedup policy '{other}' (expected content-hash or legacy)"
            )),
        }
    }
}

/// Options for [`crate::ImageExtractor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExtractOptions {
    pub dedup: DedupPolicy,
    /// Archive-scan candidates below this many bytes are discarded
    pub min_image_size: usize,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            dedup: DedupPolicy::default(),
            min_image_size: DEFAULT_MIN_IMAGE_SIZE,
        }
    }
}

/// Optional capabilities, resolved once at start-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Capabilities {
    converter: bool,
}

impl Capabilities {
    /// Detect what this build supports.
    #[must_use]
    pub const fn detect() -> Self {
        Self {
            converter: cfg!(feature = "converter"),
        }
    }

    /// Turn the converter strategy off even when it is compiled in.
    #[must_use]
    pub const fn without_converter(self) -> Self {
        Self { converter: false }
    }

    /// True if the text-and-media converter can run.
    #[must_use]
    pub const fn has_converter(self) -> bool {
        self.converter
    }
}

impl Default for Capabilities {
    fn default() -> Self {
        Self::detect()
    }
}

/// The four extraction strategies, in the order they run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Strategy {
    Converter,
    ArchiveScan,
    ShapeWalk,
    Relationships,
}

impl Strategy {
    pub const ALL: [Self; 4] = [
        Self::Converter,
        Self::ArchiveScan,
        Self::ShapeWalk,
        Self::Relationships,
    ];

    /// 1-based position, used in console and report headings.
    #[must_use]
    pub const fn number(self) -> usize {
        match self {
            Self::Converter => 1,
            Self::ArchiveScan => 2,
            Self::ShapeWalk => 3,
            Self::Relationships => 4,
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Converter => "Text-and-media converter",
            Self::ArchiveScan => "Archive scan",
            Self::ShapeWalk => "Inline shape walk",
            Self::Relationships => "Relationship files",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[Method {}] {}", self.number(), self.label())
    }
}
