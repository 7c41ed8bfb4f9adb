//! Text-and-media converter
//!
//! Walks the text-bearing parts of a DOCX (headers, body, footers) into plain
//! text and dumps every `word/media/` entry into a directory. The extractor
//! only keeps the media; the text is returned for callers that want it.

use crate::package::{self, DocxArchive};
use docimg_core::Result;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::fs;
use std::path::{Path, PathBuf};

/// Folder whose entries are dumped as media.
pub(crate) const MEDIA_PREFIX: &str = "word/media/";

/// Output of one conversion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Conversion {
    pub text: String,
    /// Files written into the media directory, sorted by name
    pub media_files: Vec<PathBuf>,
}

/// Convert `docx` to text, writing its media into `media_dir`.
///
/// # Errors
///
/// Returns an error if the archive cannot be opened or a media file cannot be
/// written. Unparseable text parts are logged and skipped.
pub fn process(docx: &Path, media_dir: &Path) -> Result<Conversion> {
    let mut archive = package::open_archive(docx)?;
    let names = package::entry_names(&archive);

    let mut text = String::new();
    for part in text_parts(&names) {
        match package::read_entry_lossy(&mut archive, &part)
            .and_then(|xml| extract_text(&xml))
        {
            Ok(part_text) => text.push_str(&part_text),
            Err(e) => log::debug!("Converter skipped {part}: {e}"),
        }
    }

    fs::create_dir_all(media_dir)?;
    let mut media_files = dump_media(&mut archive, &names, media_dir)?;
    media_files.sort();

    Ok(Conversion { text, media_files })
}

/// Headers first, then the body, then footers.
fn text_parts(names: &[String]) -> Vec<String> {
    let pick = |prefix: &str| {
        let mut parts: Vec<String> = names
            .iter()
            .filter(|n| n.starts_with(prefix) && n.ends_with(".xml"))
            .cloned()
            .collect();
        parts.sort();
        parts
    };

    let mut parts = pick("word/header");
    if names.iter().any(|n| n == package::DOCUMENT_PART) {
        parts.push(package::DOCUMENT_PART.to_string());
    }
    parts.extend(pick("word/footer"));
    parts
}

fn dump_media(archive: &mut DocxArchive, names: &[String], media_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();
    for name in names.iter().filter(|n| n.starts_with(MEDIA_PREFIX)) {
        // Flatten: only the file name survives, so nothing escapes media_dir
        let Some(file_name) = name.rsplit('/').next().filter(|f| !f.is_empty() && *f != "..") else {
            continue;
        };
        let bytes = match package::read_entry(archive, name) {
            Ok(bytes) => bytes,
            Err(e) => {
                log::warn!("Converter could not read {name}: {e}");
                continue;
            }
        };
        let out = media_dir.join(file_name);
        fs::write(&out, bytes)?;
        written.push(out);
    }
    Ok(written)
}

/// Plain text of one WordprocessingML part.
///
/// Runs are concatenated, `w:tab` becomes a tab, `w:br`/`w:cr` a newline, and
/// each paragraph ends with a newline.
fn extract_text(xml: &str) -> Result<String> {
    let mut reader = Reader::from_str(xml);
    // Keep whitespace: w:t with xml:space="preserve" is significant
    reader.trim_text(false);

    let mut text = String::new();
    let mut in_text = false;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if e.name().as_ref() == b"w:t" => in_text = true,
            Event::End(e) => match e.name().as_ref() {
                b"w:t" => in_text = false,
                b"w:p" => text.push('\n'),
                _ => {}
            },
            Event::Empty(e) => match e.name().as_ref() {
                b"w:tab" => text.push('\t'),
                b"w:br" | b"w:cr" => text.push('\n'),
                b"w:p" => text.push('\n'),
                _ => {}
            },
            Event::Text(e) if in_text => {
                text.push_str(&e.unescape().unwrap_or_default());
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(text)
}
