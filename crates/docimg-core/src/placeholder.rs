//! Image placeholders found in markdown and the keys used to address them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Which placeholder syntax produced a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaceholderKind {
    /// `![alt](path)`
    StandardImage,
    /// `<img src="path">`
    HtmlImgTag,
    /// `[IMAGE:name]`
    BracketPlaceholder,
    /// `<!-- IMAGE: name -->`
    CommentPlaceholder,
}

/// One placeholder occurrence in a markdown file.
///
/// Offsets are character offsets into the file content (end exclusive).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Placeholder {
    pub kind: PlaceholderKind,
    /// Identifying text (alt text, src, or placeholder name)
    pub text: String,
    pub file_path: String,
    pub start: usize,
    pub end: usize,
}

impl Placeholder {
    /// Tuple form persisted in the mapping file: `[text, start, end]`.
    #[must_use]
    pub fn to_entry(&self) -> PlaceholderEntry {
        (self.text.clone(), self.start, self.end)
    }

    /// Key used for suggestions and manual mappings.
    #[must_use]
    pub fn key(&self) -> MappingKey {
        MappingKey::new(&self.file_path, &self.text)
    }
}

/// `(placeholder_text, start_offset, end_offset)`
pub type PlaceholderEntry = (String, usize, usize);

/// Placeholder findings keyed by markdown file path.
pub type PlaceholderMap = BTreeMap<String, Vec<PlaceholderEntry>>;

/// `"<file>:<placeholder>"` → generated image name.
pub type Mappings = BTreeMap<String, String>;

/// Addresses one placeholder text within one markdown file.
///
/// Serialized as `"<file_path>:<placeholder_text>"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MappingKey {
    pub file_path: String,
    pub placeholder: String,
}

/// Extensions that mark the end of the file part of a key.
const KEY_FILE_SUFFIXES: &[&str] = &[".md:", ".markdown:", ".MD:", ".Markdown:"];

impl MappingKey {
    pub fn new(file_path: impl Into<String>, placeholder: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
            placeholder: placeholder.into(),
        }
    }

    /// Split a serialized key back into file and placeholder.
    ///
    /// File paths may themselves contain `:` (Windows drives), so the split
    /// happens right after the first markdown extension when one is present,
    /// and at the first `:` otherwise. Returns `None` if there is no `:` at all.
    ///
    /// ```
    /// use docimg_core::MappingKey;
    ///
    /// let key = MappingKey::parse("C:/docs/intro.md:Figure: overview").unwrap();
    /// assert_eq!(key.file_path, "C:/docs/intro.md");
    /// assert_eq!(key.placeholder, "Figure: overview");
    /// ```
    #[must_use]
    pub fn parse(key: &str) -> Option<Self> {
        let split_at = KEY_FILE_SUFFIXES
            .iter()
            .filter_map(|suffix| key.find(suffix).map(|pos| pos + suffix.len() - 1))
            .min()
            .or_else(|| key.find(':'))?;
        Some(Self::new(&key[..split_at], &key[split_at + 1..]))
    }
}

impl std::fmt::Display for MappingKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.file_path, self.placeholder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_display_roundtrip() {
        let key = MappingKey::new("docs/a.md", "diagram1");
        assert_eq!(key.to_string(), "docs/a.md:diagram1");
        assert_eq!(MappingKey::parse(&key.to_string()), Some(key));
    }

    #[test]
    fn test_key_parse_placeholder_with_colon() {
        let key = MappingKey::parse("docs/a.md:Step 2: configure").unwrap();
        assert_eq!(key.file_path, "docs/a.md");
        assert_eq!(key.placeholder, "Step 2: configure");
    }

    #[test]
    fn test_key_parse_markdown_extension() {
        let key = MappingKey::parse("notes/b.markdown:x").unwrap();
        assert_eq!(key.file_path, "notes/b.markdown");
        assert_eq!(key.placeholder, "x");
    }

    #[test]
    fn test_key_parse_fallback_first_colon() {
        let key = MappingKey::parse("README.txt:logo").unwrap();
        assert_eq!(key.file_path, "README.txt");
        assert_eq!(key.placeholder, "logo");
    }

    #[test]
    fn test_key_parse_without_colon() {
        assert_eq!(MappingKey::parse("no separator"), None);
    }

    #[test]
    fn test_placeholder_entry_and_key() {
        let p = Placeholder {
            kind: PlaceholderKind::BracketPlaceholder,
            text: "diagram1".into(),
            file_path: "a.md".into(),
            start: 4,
            end: 20,
        };
        assert_eq!(p.to_entry(), ("diagram1".to_string(), 4, 20));
        assert_eq!(p.key().to_string(), "a.md:diagram1");
    }
}
