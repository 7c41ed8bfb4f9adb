//! Multi-strategy image extraction
//!
//! Four independent strategies run in order and append to one mapping:
//!
//! 1. text-and-media converter (optional capability)
//! 2. archive scan of media folders, image extensions and VML base64 payloads
//! 3. inline shape walk (`wp:inline` → `a:blip r:embed` → part bytes)
//! 4. relationship files (`Target` attributes pointing at images)
//!
//! No strategy short-circuits on an earlier one's success. Failures are
//! contained at the lowest level: a bad entry is skipped, a bad strategy is
//! noted, and the next strategy still runs.

use crate::options::{Capabilities, DedupPolicy, ExtractOptions, Strategy};
use crate::package::{self, ContentTypes, DocxArchive, Relationship};
use crate::report::{ExtractionReport, StrategyOutcome};
use crate::shapes;
use crate::sniff::{self, SCAN_IMAGE_EXTENSIONS};
use base64::Engine;
use docimg_core::{image_name, DocimgError, ImageMapping, ImageRecord, Result};
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Folder prefixes whose entries are archive-scan candidates.
const MEDIA_FOLDER_PREFIXES: &[&str] = &[
    "word/media/",
    "media/",
    "word/embeddings/",
    "embeddings/",
    "word/charts/",
    "word/drawings/",
    "ppt/media/",
    "xl/media/",
];

/// Name hint used for images without a parent folder.
const ROOT_HINT: &str = "root";

static RE_VML_IMAGEDATA: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<v:imagedata[^>]*src="data:image/([^;"]+);base64,([^"]+)""#)
        .expect("valid VML imagedata regex")
});

static RE_IMAGE_TARGET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)Target="([^"]*\.(?:png|jpg|jpeg|gif|bmp|tiff|wmf|emf))""#)
        .expect("valid image target regex")
});

static RE_MEDIA_TARGET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)Target="([^"]*media/[^"]*)""#).expect("valid media target regex")
});

/// First 8 hex characters of the MD5 digest of `bytes`.
#[must_use]
pub fn content_hash8(bytes: &[u8]) -> String {
    hash8(&md5::compute(bytes))
}

fn hash8(digest: &md5::Digest) -> String {
    let mut hex = format!("{digest:x}");
    hex.truncate(8);
    hex
}

/// How the archive scan treats an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Candidate {
    /// XML part that may carry base64 images
    XmlWithMedia,
    /// Binary part that may itself be an image
    Binary,
}

fn classify_candidate(name: &str) -> Option<Candidate> {
    let lower = name.to_lowercase();
    if lower.ends_with(".xml") && lower.contains("media") {
        return Some(Candidate::XmlWithMedia);
    }
    let under_media_folder = MEDIA_FOLDER_PREFIXES.iter().any(|p| lower.starts_with(p));
    let image_extension = sniff::extension_of(name).is_some_and(|ext| sniff::is_in(SCAN_IMAGE_EXTENSIONS, &ext));
    // Non-images among these fall out at the sniff
    let image_like_path = lower.contains("media") || lower.contains("image");
    (under_media_folder || image_extension || image_like_path).then_some(Candidate::Binary)
}

/// Extension for a binary part: its own if image-like, otherwise sniffed.
fn image_extension(path: &str, data: &[u8]) -> Option<String> {
    match sniff::extension_of(path) {
        Some(ext) if sniff::is_in(SCAN_IMAGE_EXTENSIONS, &ext) => Some(ext),
        _ => sniff::sniff_extension(data).map(String::from),
    }
}

/// Immediate parent folder of an archive path, or `root`.
fn parent_hint(path: &str) -> &str {
    path.rsplit('/').nth(1).unwrap_or(ROOT_HINT)
}

/// Extracts every image it can find in one DOCX file.
///
/// Owns all mutable extraction state: the sequence counter, the mapping, the
/// set of digests already written, and per-strategy outcomes.
#[derive(Debug)]
pub struct ImageExtractor {
    word_file: PathBuf,
    output_dir: PathBuf,
    options: ExtractOptions,
    capabilities: Capabilities,
    mapping: ImageMapping,
    image_count: usize,
    seen_digests: HashSet<[u8; 16]>,
    /// Archive paths an image was written from
    extracted_sources: HashSet<String>,
    outcomes: Vec<StrategyOutcome>,
}

impl ImageExtractor {
    /// Prepare an extractor, creating `output_dir` if needed.
    ///
    /// # Errors
    ///
    /// Returns [`DocimgError::Precondition`] if `word_file` is not an existing
    /// file, or an I/O error if the output directory cannot be created.
    pub fn new(
        word_file: impl AsRef<Path>,
        output_dir: impl AsRef<Path>,
        options: ExtractOptions,
    ) -> Result<Self> {
        let word_file = word_file.as_ref();
        if !word_file.is_file() {
            return Err(DocimgError::Precondition(format!(
                "Word document not found: {}",
                word_file.display()
            )));
        }

        let output_dir = output_dir.as_ref();
        fs::create_dir_all(output_dir)?;
        let output_dir = fs::canonicalize(output_dir)?;

        Ok(Self {
            word_file: word_file.to_path_buf(),
            output_dir,
            options,
            capabilities: Capabilities::detect(),
            mapping: ImageMapping::new(),
            image_count: 0,
            seen_digests: HashSet::new(),
            extracted_sources: HashSet::new(),
            outcomes: Vec::new(),
        })
    }

    /// Override the detected capabilities.
    #[must_use]
    pub const fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Absolute output directory.
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    #[must_use]
    pub const fn mapping(&self) -> &ImageMapping {
        &self.mapping
    }

    /// Outcomes of the strategies run so far.
    #[must_use]
    pub fn outcomes(&self) -> &[StrategyOutcome] {
        &self.outcomes
    }

    /// Run all four strategies and write the extraction report.
    ///
    /// Never fails: problems end up in the outcomes and the report.
    pub fn extract_all_images(&mut self) -> ImageMapping {
        log::info!("Extracting images from: {}", self.word_file.display());

        for strategy in Strategy::ALL {
            log::info!("{strategy}...");
            let before = self.mapping.len();
            let mut outcome = StrategyOutcome::new(strategy);

            let result = match strategy {
                Strategy::Converter => self.extract_with_converter(&mut outcome),
                Strategy::ArchiveScan => self.extract_from_archive(&mut outcome),
                Strategy::ShapeWalk => self.extract_inline_shapes(&mut outcome),
                Strategy::Relationships => self.extract_from_relationships(&mut outcome),
            };
            if let Err(e) = result {
                outcome.note(format!("{} had issues: {e}", strategy.label()));
            }

            outcome.extracted = self.mapping.len() - before;
            log::info!("  Found {} new images", outcome.extracted);
            self.outcomes.push(outcome);
        }

        log::info!("Total unique images extracted: {}", self.mapping.len());

        if let Err(e) = self.report().write_to(&self.output_dir) {
            log::warn!("Could not write extraction report: {e}");
        }

        self.mapping.clone()
    }

    /// Report for the current state.
    #[must_use]
    pub fn report(&self) -> ExtractionReport {
        ExtractionReport::build(
            &self.word_file,
            &self.output_dir,
            &self.mapping,
            &self.extracted_sources,
            &self.outcomes,
        )
    }

    // ========================================================================
    // Shared bookkeeping
    // ========================================================================

    fn next_seq(&mut self) -> usize {
        self.image_count += 1;
        self.image_count
    }

    fn seen(&self, digest: &md5::Digest) -> bool {
        self.options.dedup == DedupPolicy::ContentHash && self.seen_digests.contains(&digest.0)
    }

    /// Write a record into the output directory and register it.
    fn store(&mut self, record: ImageRecord, digest: &md5::Digest) -> Result<()> {
        let path = self.output_dir.join(&record.generated_name);
        fs::write(&path, &record.bytes)?;
        self.seen_digests.insert(digest.0);
        log::info!(
            "  Extracted: {} (from {})",
            record.generated_name,
            record.source_path
        );
        self.extracted_sources.insert(record.source_path);
        self.mapping.insert(record.generated_name, path);
        Ok(())
    }

    fn store_or_count(&mut self, record: ImageRecord, digest: &md5::Digest, outcome: &mut StrategyOutcome) {
        let source = record.source_path.clone();
        if let Err(e) = self.store(record, digest) {
            outcome.failures += 1;
            log::warn!("  Could not write image from {source}: {e}");
        }
    }

    /// Name and store a part found by the shape walk or a relationship.
    ///
    /// These two strategies share their dedup rule: canonical digests, or in
    /// legacy mode an exact-output-path check after the counter has advanced.
    fn store_part(
        &mut self,
        hint: &str,
        ext: &str,
        source: &str,
        bytes: Vec<u8>,
        outcome: &mut StrategyOutcome,
    ) {
        let digest = md5::compute(&bytes);
        if self.seen(&digest) {
            outcome.duplicates += 1;
            return;
        }
        let seq = self.next_seq();
        let name = image_name(seq, Some(hint), Some(&hash8(&digest)), ext);
        if self.options.dedup == DedupPolicy::Legacy && self.output_dir.join(&name).exists() {
            outcome.duplicates += 1;
            return;
        }
        self.store_or_count(ImageRecord::new(name, source, bytes), &digest, outcome);
    }

    // ========================================================================
    // Strategy 1: text-and-media converter
    // ========================================================================

    fn extract_with_converter(&mut self, outcome: &mut StrategyOutcome) -> Result<()> {
        if !self.capabilities.has_converter() {
            outcome.note("Skipping converter (not available in this build)");
            return Ok(());
        }
        self.run_converter(outcome)
    }

    #[cfg(feature = "converter")]
    fn run_converter(&mut self, outcome: &mut StrategyOutcome) -> Result<()> {
        let scratch = tempfile::Builder::new().prefix("docimg-media-").tempdir()?;
        let conversion = crate::converter::process(&self.word_file, scratch.path())?;
        log::debug!(
            "  Converter produced {} characters of text",
            conversion.text.chars().count()
        );

        for file in &conversion.media_files {
            let Some(ext) = file
                .extension()
                .map(|e| e.to_string_lossy().to_lowercase())
                .filter(|ext| sniff::is_in(sniff::CONVERTER_IMAGE_EXTENSIONS, ext))
            else {
                continue;
            };

            let bytes = match fs::read(file) {
                Ok(bytes) => bytes,
                Err(e) => {
                    outcome.failures += 1;
                    log::warn!("  Could not read converter output {}: {e}", file.display());
                    continue;
                }
            };

            let digest = md5::compute(&bytes);
            if self.seen(&digest) {
                outcome.duplicates += 1;
                continue;
            }
            let seq = self.next_seq();
            let name = image_name(seq, None, None, &ext);
            // Media is dumped flat, so this is the archive path it came from
            let source = file.file_name().map_or_else(
                || file.display().to_string(),
                |n| format!("{}{}", crate::converter::MEDIA_PREFIX, n.to_string_lossy()),
            );
            self.store_or_count(ImageRecord::new(name, source, bytes), &digest, outcome);
        }
        // scratch directory is removed on drop
        Ok(())
    }

    #[cfg(not(feature = "converter"))]
    fn run_converter(&mut self, outcome: &mut StrategyOutcome) -> Result<()> {
        outcome.note("Skipping converter (not available in this build)");
        Ok(())
    }

    // ========================================================================
    // Strategy 2: archive scan
    // ========================================================================

    fn extract_from_archive(&mut self, outcome: &mut StrategyOutcome) -> Result<()> {
        let mut archive = package::open_archive(&self.word_file)?;
        let names = package::entry_names(&archive);
        log::info!("  Searching {} files in document...", names.len());

        for name in &names {
            let Some(candidate) = classify_candidate(name) else {
                continue;
            };

            let data = match package::read_entry(&mut archive, name) {
                Ok(data) => data,
                Err(e) => {
                    outcome.failures += 1;
                    log::warn!("  Could not extract {name}: {e}");
                    continue;
                }
            };

            if data.len() < self.options.min_image_size {
                log::debug!("  Skipping {name}: {} bytes is too small", data.len());
                continue;
            }

            match candidate {
                Candidate::XmlWithMedia => self.extract_xml_payloads(name, &data, outcome),
                Candidate::Binary => self.extract_binary_candidate(name, data, outcome),
            }
        }

        Ok(())
    }

    fn extract_xml_payloads(&mut self, name: &str, data: &[u8], outcome: &mut StrategyOutcome) {
        let text = String::from_utf8_lossy(data);
        for caps in RE_VML_IMAGEDATA.captures_iter(&text) {
            let payload: String = caps[2].chars().filter(|c| !c.is_whitespace()).collect();
            let bytes = match base64::engine::general_purpose::STANDARD.decode(payload) {
                Ok(bytes) => bytes,
                Err(e) => {
                    outcome.failures += 1;
                    log::debug!("  Undecodable base64 image in {name}: {e}");
                    continue;
                }
            };

            let digest = md5::compute(&bytes);
            if self.seen(&digest) {
                outcome.duplicates += 1;
                continue;
            }
            let ext = sniff::extension_for_mime(Some(&format!("image/{}", &caps[1])));
            let seq = self.next_seq();
            let image = image_name(seq, Some("xmldata"), Some(&hash8(&digest)), ext);
            self.store_or_count(ImageRecord::new(image, name, bytes), &digest, outcome);
        }
    }

    fn extract_binary_candidate(&mut self, name: &str, data: Vec<u8>, outcome: &mut StrategyOutcome) {
        let digest = md5::compute(&data);
        let hash = hash8(&digest);

        let duplicate = match self.options.dedup {
            DedupPolicy::ContentHash => self.seen(&digest),
            DedupPolicy::Legacy => self.mapping.keys().any(|existing| existing.contains(&hash)),
        };
        if duplicate {
            outcome.duplicates += 1;
            log::debug!("  Skipping duplicate {name}");
            return;
        }

        let Some(ext) = image_extension(name, &data) else {
            log::debug!("  Skipping {name}: not a recognizable image");
            return;
        };

        let seq = self.next_seq();
        let image = image_name(seq, Some(parent_hint(name)), Some(&hash), &ext);
        self.store_or_count(ImageRecord::new(image, name, data), &digest, outcome);
    }

    // ========================================================================
    // Strategy 3: inline shape walk
    // ========================================================================

    fn extract_inline_shapes(&mut self, outcome: &mut StrategyOutcome) -> Result<()> {
        let mut archive = package::open_archive(&self.word_file)?;
        let xml = package::read_entry_lossy(&mut archive, package::DOCUMENT_PART).map_err(|e| {
            DocimgError::Extraction(format!("Missing {}: {e}", package::DOCUMENT_PART))
        })?;
        let scan = shapes::scan_document(&xml)?;

        let relationships = if scan.inline_shapes.is_empty() {
            HashMap::new()
        } else {
            package::document_relationships(&mut archive)?
        };
        let content_types = ContentTypes::load(&mut archive);
        let base_dir = package::rels_source_dir(package::DOCUMENT_RELS_PART);

        let mut shape_failures = 0;
        for embed in &scan.inline_shapes {
            match resolve_embedded_part(&mut archive, embed.as_deref(), &relationships, base_dir) {
                Ok((part, bytes)) => {
                    let ext = sniff::extension_for_mime(content_types.content_type_of(&part));
                    self.store_part("shape", ext, &part, bytes, outcome);
                }
                Err(e) => {
                    shape_failures += 1;
                    log::debug!("  Skipped inline shape: {e}");
                }
            }
        }

        outcome.failures += shape_failures;
        if shape_failures > 0 {
            outcome.note(format!(
                "{shape_failures} of {} inline shapes could not be extracted",
                scan.inline_shapes.len()
            ));
        }
        if scan.graphic_runs > 0 {
            log::info!("  {} runs contain embedded graphics", scan.graphic_runs);
        }

        Ok(())
    }

    // ========================================================================
    // Strategy 4: relationship files
    // ========================================================================

    fn extract_from_relationships(&mut self, outcome: &mut StrategyOutcome) -> Result<()> {
        let mut archive = package::open_archive(&self.word_file)?;
        let names = package::entry_names(&archive);
        let entries: HashSet<&str> = names.iter().map(String::as_str).collect();

        for rels_file in names.iter().filter(|n| n.ends_with(".rels")) {
            let content = match package::read_entry_lossy(&mut archive, rels_file) {
                Ok(content) => content,
                Err(e) => {
                    outcome.failures += 1;
                    log::warn!("  Could not read {rels_file}: {e}");
                    continue;
                }
            };

            let base_dir = package::rels_source_dir(rels_file);
            for part in image_targets(&content, base_dir) {
                if !entries.contains(part.as_str()) {
                    continue;
                }
                let bytes = match package::read_entry(&mut archive, &part) {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        outcome.failures += 1;
                        log::debug!("  Could not read {part}: {e}");
                        continue;
                    }
                };
                let ext = sniff::extension_of(&part)
                    .unwrap_or_else(|| sniff::DEFAULT_EXTENSION.to_string());
                self.store_part("rel", &ext, &part, bytes, outcome);
            }
        }

        Ok(())
    }
}

/// Resolve one inline shape's relationship id to its part path and bytes.
fn resolve_embedded_part(
    archive: &mut DocxArchive,
    embed: Option<&str>,
    relationships: &HashMap<String, Relationship>,
    base_dir: &str,
) -> Result<(String, Vec<u8>)> {
    let rel_id =
        embed.ok_or_else(|| DocimgError::Extraction("inline shape has no embedded image".into()))?;
    let relationship = relationships
        .get(rel_id)
        .ok_or_else(|| DocimgError::Extraction(format!("Relationship {rel_id} not found")))?;
    if relationship.external {
        return Err(DocimgError::Extraction(format!(
            "Relationship {rel_id} is linked, not embedded"
        )));
    }
    let part = package::resolve_target(base_dir, &relationship.target).ok_or_else(|| {
        DocimgError::Extraction(format!("Cannot resolve target {}", relationship.target))
    })?;
    let bytes = package::read_entry(archive, &part)?;
    Ok((part, bytes))
}

/// Image-like targets of one `.rels` part, resolved and deduplicated in order.
fn image_targets(rels_content: &str, base_dir: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    RE_IMAGE_TARGET
        .captures_iter(rels_content)
        .chain(RE_MEDIA_TARGET.captures_iter(rels_content))
        .filter_map(|caps| package::resolve_target(base_dir, &caps[1]))
        .filter(|part| seen.insert(part.clone()))
        .collect()
}
