//! DOCX package access
//!
//! DOCX files are ZIP archives following the Open Packaging Conventions:
//! - `word/document.xml`: main content
//! - `word/_rels/document.xml.rels`: relationships (rId → media path)
//! - `[Content_Types].xml`: declared MIME type per extension or per part
//! - `word/media/`, `word/embeddings/`, ...: binary parts
//!
//! Helpers here never decide policy; strategies call them and handle failures.

use docimg_core::{DocimgError, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use zip::ZipArchive;

/// Archive handle used throughout the extractor.
pub type DocxArchive = ZipArchive<BufReader<File>>;

/// Main document part.
pub const DOCUMENT_PART: &str = "word/document.xml";

/// Relationships of the main document part.
pub const DOCUMENT_RELS_PART: &str = "word/_rels/document.xml.rels";

/// Package content type declarations.
pub const CONTENT_TYPES_PART: &str = "[Content_Types].xml";

/// Open a document as a ZIP archive.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or is not a ZIP container.
pub fn open_archive(path: &Path) -> Result<DocxArchive> {
    let file = File::open(path)?;
    Ok(ZipArchive::new(BufReader::new(file))?)
}

/// All file entry names in central-directory order (directories excluded).
#[must_use]
pub fn entry_names(archive: &DocxArchive) -> Vec<String> {
    archive
        .file_names()
        .filter(|name| !name.ends_with('/'))
        .map(String::from)
        .collect()
}

/// Read one entry fully into memory.
///
/// # Errors
///
/// Returns an error if the entry is missing or cannot be decompressed.
pub fn read_entry(archive: &mut DocxArchive, name: &str) -> Result<Vec<u8>> {
    let mut entry = archive.by_name(name)?;
    let mut bytes = Vec::with_capacity(usize::try_from(entry.size()).unwrap_or(0));
    entry.read_to_end(&mut bytes)?;
    Ok(bytes)
}

/// Read one entry as text, replacing invalid UTF-8.
///
/// # Errors
///
/// Same as [`read_entry`].
pub fn read_entry_lossy(archive: &mut DocxArchive, name: &str) -> Result<String> {
    let bytes = read_entry(archive, name)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Extract an attribute value by key from an element
#[inline]
pub(crate) fn get_attr(e: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    e.attributes()
        .find(|a| a.as_ref().ok().map(|x| x.key.as_ref()) == Some(key))
        .and_then(std::result::Result::ok)
        .map(|attr| String::from_utf8_lossy(&attr.value).to_string())
}

/// Target of a relationship and whether it points outside the package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    pub target: String,
    pub external: bool,
}

/// Parse a `.rels` part into an id → relationship map.
///
/// # Errors
///
/// Returns an error on malformed XML.
pub fn parse_relationships(xml: &str) -> Result<HashMap<String, Relationship>> {
    let mut relationships = HashMap::new();
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Empty(e) | Event::Start(e) if e.name().as_ref() == b"Relationship" => {
                if let (Some(id), Some(target)) = (get_attr(&e, b"Id"), get_attr(&e, b"Target")) {
                    let external = get_attr(&e, b"TargetMode").as_deref() == Some("External");
                    relationships.insert(id, Relationship { target, external });
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(relationships)
}

/// Declared content types: per-extension defaults and per-part overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentTypes {
    defaults: HashMap<String, String>,
    overrides: HashMap<String, String>,
}

impl ContentTypes {
    /// Parse `[Content_Types].xml`.
    ///
    /// # Errors
    ///
    /// Returns an error on malformed XML.
    pub fn parse(xml: &str) -> Result<Self> {
        let mut types = Self::default();
        let mut reader = Reader::from_str(xml);
        reader.trim_text(true);

        let mut buf = Vec::new();
        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Empty(e) | Event::Start(e) => match e.name().as_ref() {
                    b"Default" => {
                        if let (Some(ext), Some(ct)) =
                            (get_attr(&e, b"Extension"), get_attr(&e, b"ContentType"))
                        {
                            types.defaults.insert(ext.to_ascii_lowercase(), ct);
                        }
                    }
                    b"Override" => {
                        if let (Some(part), Some(ct)) =
                            (get_attr(&e, b"PartName"), get_attr(&e, b"ContentType"))
                        {
                            types
                                .overrides
                                .insert(part.trim_start_matches('/').to_string(), ct);
                        }
                    }
                    _ => {}
                },
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        Ok(types)
    }

    /// Load from an archive; a missing part yields an empty table.
    #[must_use]
    pub fn load(archive: &mut DocxArchive) -> Self {
        match read_entry_lossy(archive, CONTENT_TYPES_PART) {
            Ok(xml) => Self::parse(&xml).unwrap_or_else(|e| {
                log::warn!("Ignoring unreadable {CONTENT_TYPES_PART}: {e}");
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Content type of a part (archive path without leading slash).
    #[must_use]
    pub fn content_type_of(&self, part: &str) -> Option<&str> {
        if let Some(ct) = self.overrides.get(part) {
            return Some(ct);
        }
        let ext = crate::sniff::extension_of(part)?;
        self.defaults.get(&ext).map(String::as_str)
    }
}

/// Directory of the part a `.rels` file describes.
///
/// `word/_rels/document.xml.rels` → `word`, `_rels/.rels` → `` (package root).
#[must_use]
pub fn rels_source_dir(rels_path: &str) -> &str {
    rels_path
        .rfind("_rels/")
        .map_or("", |idx| rels_path[..idx].trim_end_matches('/'))
}

/// Resolve a relationship target to an archive entry path.
///
/// Relative targets are joined to `base_dir`; a leading `/` means the package
/// root. `.` and `..` segments are normalized. Returns `None` for targets with
/// a URI scheme, which live outside the package.
///
/// ```
/// use docimg_extract::package::resolve_target;
///
/// assert_eq!(resolve_target("word", "media/image1.png").as_deref(), Some("word/media/image1.png"));
/// assert_eq!(resolve_target("word/charts", "../media/a.png").as_deref(), Some("word/media/a.png"));
/// assert_eq!(resolve_target("word", "/xl/media/b.emf").as_deref(), Some("xl/media/b.emf"));
/// assert_eq!(resolve_target("word", "https://example.com/x.png"), None);
/// ```
#[must_use]
pub fn resolve_target(base_dir: &str, target: &str) -> Option<String> {
    if target.contains("://") || target.starts_with("mailto:") {
        return None;
    }

    let (start, rest) = match target.strip_prefix('/') {
        Some(absolute) => ("", absolute),
        None => (base_dir, target),
    };

    let mut segments: Vec<&str> = start.split('/').filter(|s| !s.is_empty()).collect();
    for segment in rest.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }

    if segments.is_empty() {
        None
    } else {
        Some(segments.join("/"))
    }
}

/// Load and parse the main document's relationships.
///
/// # Errors
///
/// Returns [`DocimgError::Extraction`] if the part is missing, or an XML error.
pub fn document_relationships(
    archive: &mut DocxArchive,
) -> Result<HashMap<String, Relationship>> {
    let xml = read_entry_lossy(archive, DOCUMENT_RELS_PART).map_err(|e| {
        DocimgError::Extraction(format!("Missing {DOCUMENT_RELS_PART}: {e}"))
    })?;
    parse_relationships(&xml)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>
  <Relationship Id="rId7" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="media/image1.png"/>
  <Relationship Id="rId9" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink" Target="https://example.com" TargetMode="External"/>
</Relationships>"#;

    #[test]
    fn test_parse_relationships() {
        let rels = parse_relationships(RELS).unwrap();
        assert_eq!(rels.len(), 3);
        assert_eq!(rels["rId7"].target, "media/image1.png");
        assert!(!rels["rId7"].external);
        assert!(rels["rId9"].external);
    }

    #[test]
    fn test_parse_relationships_malformed() {
        assert!(parse_relationships("<Relationships></Relationship>").is_err());
    }

    #[test]
    fn test_content_types_override_then_default() {
        let xml = r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="png" ContentType="image/png"/>
  <Default Extension="JPEG" ContentType="image/jpeg"/>
  <Override PartName="/word/media/image2.png" ContentType="image/gif"/>
</Types>"#;
        let types = ContentTypes::parse(xml).unwrap();
        assert_eq!(types.content_type_of("word/media/image1.png"), Some("image/png"));
        assert_eq!(types.content_type_of("word/media/image2.png"), Some("image/gif"));
        assert_eq!(types.content_type_of("word/media/photo.jpeg"), Some("image/jpeg"));
        assert_eq!(types.content_type_of("word/media/blob"), None);
    }

    #[test]
    fn test_rels_source_dir() {
        assert_eq!(rels_source_dir("word/_rels/document.xml.rels"), "word");
        assert_eq!(rels_source_dir("word/charts/_rels/chart1.xml.rels"), "word/charts");
        assert_eq!(rels_source_dir("_rels/.rels"), "");
    }

    #[test]
    fn test_resolve_target_edge_cases() {
        assert_eq!(resolve_target("", "word/document.xml").as_deref(), Some("word/document.xml"));
        assert_eq!(resolve_target("word", "./media/./x.png").as_deref(), Some("word/media/x.png"));
        assert_eq!(resolve_target("word", ".."), None);
        assert_eq!(resolve_target("word", "mailto:someone@example.com"), None);
    }
}
