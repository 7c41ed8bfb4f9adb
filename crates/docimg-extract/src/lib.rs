//! # docimg extract
//!
//! Pulls every embedded image out of a DOCX file into a directory, using four
//! independent strategies so that images one technique misses are still
//! found by another:
//!
//! 1. a built-in text-and-media converter (cargo feature `converter`)
//! 2. a scan of the ZIP container (media folders, image extensions, VML
//!    base64 payloads, magic-byte sniffing)
//! 3. a walk of inline shapes in `word/document.xml`
//! 4. the `Target` attributes of every `.rels` part
//!
//! Results are named `img_NNNN[_hint][_hash8].ext`, deduplicated per
//! [`DedupPolicy`], and summarized in `extraction_report.txt`.
//!
//! ```no_run
//! use docimg_extract::{ExtractOptions, ImageExtractor};
//!
//! let mut extractor = ImageExtractor::new("guide.docx", "extracted_images", ExtractOptions::default())?;
//! let mapping = extractor.extract_all_images();
//! for (name, path) in &mapping {
//!     println!("{name} -> {}", path.display());
//! }
//! # Ok::<(), docimg_core::DocimgError>(())
//! ```

#[cfg(feature = "converter")]
pub mod converter;
pub mod extractor;
pub mod options;
pub mod package;
pub mod report;
pub mod shapes;
pub mod sniff;

pub use extractor::{content_hash8, ImageExtractor};
pub use options::{Capabilities, DedupPolicy, ExtractOptions, Strategy, DEFAULT_MIN_IMAGE_SIZE};
pub use report::{ArchiveStructure, ExtractionReport, StrategyOutcome, REPORT_FILE_NAME};
