//! Extracted image records and the name → path mapping.

use std::collections::BTreeMap;
use std::path::PathBuf;

/// Mapping from generated image name to the absolute path it was written to.
///
/// A `BTreeMap` keeps iteration lexicographic, which the suggestion scorer
/// relies on for its tie-break.
pub type ImageMapping = BTreeMap<String, PathBuf>;

/// Name prefix shared by every generated image file.
pub const IMAGE_NAME_PREFIX: &str = "img_";

/// One image pulled out of a document, before it is written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRecord {
    /// Unique output file name (`img_0001_media_a1b2c3d4.png`)
    pub generated_name: String,
    /// Where the bytes came from inside the archive (or a converter temp file)
    pub source_path: String,
    /// Raw image bytes; dropped once written
    pub bytes: Vec<u8>,
}

impl ImageRecord {
    /// Create a record for bytes found at `source_path`.
    pub fn new(
        generated_name: impl Into<String>,
        source_path: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            generated_name: generated_name.into(),
            source_path: source_path.into(),
            bytes,
        }
    }
}

/// Build a generated image name.
///
/// Produces `img_<seq>[_<hint>][_<hash>].<ext>` with `seq` zero-padded to four
/// digits. A leading dot on `ext` is tolerated.
///
/// ```
/// use docimg_core::image_name;
///
/// assert_eq!(image_name(1, None, None, "png"), "img_0001.png");
/// assert_eq!(
///     image_name(12, Some("media"), Some("a1b2c3d4"), ".jpg"),
///     "img_0012_media_a1b2c3d4.jpg"
/// );
/// ```
#[must_use]
pub fn image_name(seq: usize, hint: Option<&str>, hash: Option<&str>, ext: &str) -> String {
    let mut name = format!("{IMAGE_NAME_PREFIX}{seq:04}");
    if let Some(hint) = hint {
        name.push('_');
        name.push_str(hint);
    }
    if let Some(hash) = hash {
        name.push('_');
        name.push_str(hash);
    }
    name.push('.');
    name.push_str(ext.trim_start_matches('.'));
    name
}
