//! Markdown placeholder mapper
//!
//! Finds image placeholders across a directory of markdown files, suggests
//! an extracted image for each, and rewrites the files once mappings are
//! confirmed.

use crate::patterns::analyze_text;
use crate::rewrite::{rewrite_placeholder, ApplyReport};
use crate::similarity::{calculate_similarity, DEFAULT_THRESHOLD};
use docimg_core::{
    DocimgError, ImageMapping, MappingKey, Mappings, Placeholder, PlaceholderMap, Result,
};
use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Recognized markdown extensions (compared case-insensitively).
const MARKDOWN_EXTENSIONS: &[&str] = &["md", "markdown"];

/// Suffix appended to a file name for its backup copy.
const BACKUP_SUFFIX: &str = ".bak";

fn is_markdown(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| MARKDOWN_EXTENSIONS.iter().any(|m| ext.eq_ignore_ascii_case(m)))
}

/// Backup path for a markdown file: `guide.md` → `guide.md.bak`.
#[must_use]
pub fn backup_path(md_file: &Path) -> PathBuf {
    let mut name = md_file.as_os_str().to_owned();
    name.push(BACKUP_SUFFIX);
    PathBuf::from(name)
}

/// Maps extracted images onto placeholders in a markdown tree.
#[derive(Debug, Clone)]
pub struct MarkdownImageMapper {
    md_directory: PathBuf,
    image_mapping: ImageMapping,
    threshold: f64,
}

impl MarkdownImageMapper {
    pub fn new(md_directory: impl AsRef<Path>, image_mapping: ImageMapping) -> Self {
        Self {
            md_directory: md_directory.as_ref().to_path_buf(),
            image_mapping,
            threshold: DEFAULT_THRESHOLD,
        }
    }

    /// Minimum score a suggestion must strictly exceed.
    #[must_use]
    pub const fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    #[must_use]
    pub const fn threshold(&self) -> f64 {
        self.threshold
    }

    #[must_use]
    pub fn md_directory(&self) -> &Path {
        &self.md_directory
    }

    /// All `.md` / `.markdown` files under the directory, sorted.
    ///
    /// Unreadable subdirectories are logged and skipped.
    #[must_use]
    pub fn find_markdown_files(&self) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = WalkDir::new(&self.md_directory)
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    log::warn!("Skipping unreadable path: {e}");
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file() && is_markdown(entry.path()))
            .map(walkdir::DirEntry::into_path)
            .collect();
        files.sort();
        files
    }

    /// Placeholders of every markdown file, as typed records.
    ///
    /// Files that cannot be read (or are not UTF-8) are logged and skipped.
    #[must_use]
    pub fn analyze_file_placeholders(&self) -> Vec<Placeholder> {
        let md_files = self.find_markdown_files();
        log::info!("Analyzing {} markdown files...", md_files.len());

        let mut found = Vec::new();
        for md_file in &md_files {
            let content = match fs::read_to_string(md_file) {
                Ok(content) => content,
                Err(e) => {
                    log::warn!("  Could not read {}: {e}", md_file.display());
                    continue;
                }
            };

            let placeholders = analyze_text(&md_file.display().to_string(), &content);
            if !placeholders.is_empty() {
                log::info!(
                    "  Found {} placeholders in: {}",
                    placeholders.len(),
                    md_file.file_name().map_or_else(
                        || md_file.display().to_string(),
                        |n| n.to_string_lossy().to_string()
                    )
                );
            }
            found.extend(placeholders);
        }
        found
    }

    /// Placeholders grouped by file, in the persisted tuple form.
    ///
    /// Files without placeholders are omitted.
    #[must_use]
    pub fn analyze_placeholders(&self) -> PlaceholderMap {
        let mut map = PlaceholderMap::new();
        for placeholder in self.analyze_file_placeholders() {
            map.entry(placeholder.file_path.clone())
                .or_default()
                .push(placeholder.to_entry());
        }
        map
    }

    /// Best-scoring image for one placeholder text, if it clears the threshold.
    ///
    /// Images are visited in name order and only a strictly higher score
    /// replaces the current best, so ties go to the smallest name.
    #[must_use]
    pub fn best_match(&self, placeholder_text: &str) -> Option<(&str, f64)> {
        let mut best: Option<(&str, f64)> = None;
        for name in self.image_mapping.keys() {
            let score = calculate_similarity(placeholder_text, name);
            if score > best.map_or(0.0, |(_, s)| s) {
                best = Some((name.as_str(), score));
            }
        }
        best.filter(|(_, score)| *score > self.threshold)
    }

    /// Suggest an image for every placeholder that matches one well enough.
    #[must_use]
    pub fn suggest_mappings(&self, placeholder_map: &PlaceholderMap) -> Mappings {
        log::info!("Suggesting image mappings...");

        let mut suggestions = Mappings::new();
        for (md_file, placeholders) in placeholder_map {
            for (text, _, _) in placeholders {
                if let Some((image, score)) = self.best_match(text) {
                    log::info!("  Suggested: '{text}' -> {image}");
                    log::debug!("    score {score:.3}");
                    suggestions.insert(MappingKey::new(md_file, text).to_string(), image.to_string());
                }
            }
        }
        suggestions
    }

    /// Rewrite markdown files according to `mappings`.
    ///
    /// Keys are `"file:placeholder"`. Each file is handled independently: an
    /// I/O failure is logged and recorded, and the remaining files still run.
    pub fn apply_mappings(&self, mappings: &Mappings, backup: bool) -> ApplyReport {
        log::info!("Applying mappings to markdown files...");
        let mut report = ApplyReport::default();

        let mut by_file: BTreeMap<String, Vec<(String, PathBuf)>> = BTreeMap::new();
        for (key, image) in mappings {
            let Some(key) = MappingKey::parse(key) else {
                log::warn!("  Skipping malformed mapping key: {key}");
                report.skipped_entries += 1;
                continue;
            };
            let Some(image_path) = self.image_mapping.get(image) else {
                log::warn!("  Skipping '{}': image {image} was not extracted", key.placeholder);
                report.skipped_entries += 1;
                continue;
            };
            by_file
                .entry(key.file_path)
                .or_default()
                .push((key.placeholder, image_path.clone()));
        }

        for (md_file, placeholders) in &by_file {
            let md_path = Path::new(md_file);
            match apply_to_file(md_path, placeholders, backup, &mut report) {
                Ok(()) => report.files_updated += 1,
                Err(e) => {
                    log::warn!("  Could not update {}: {e}", md_path.display());
                    report.failed_files.push(md_file.clone());
                }
            }
        }

        report
    }
}

/// Copy `md_file` to its backup path and flush the copy to disk.
///
/// # Errors
///
/// Returns an error if the copy or the sync fails.
pub fn write_backup(md_file: &Path) -> Result<PathBuf> {
    let backup = backup_path(md_file);
    fs::copy(md_file, &backup)?;
    OpenOptions::new().write(true).open(&backup)?.sync_all()?;
    Ok(backup)
}

fn apply_to_file(
    md_file: &Path,
    placeholders: &[(String, PathBuf)],
    backup: bool,
    report: &mut ApplyReport,
) -> Result<()> {
    if !md_file.is_file() {
        return Err(DocimgError::InvalidInput(format!(
            "{} is not a file",
            md_file.display()
        )));
    }

    if backup {
        let backup_file = write_backup(md_file)?;
        report.backups_written += 1;
        log::info!("  Created backup: {}", backup_file.display());
    }

    let mut content = fs::read_to_string(md_file)?;
    for (placeholder, image_path) in placeholders {
        let (updated, count) =
            rewrite_placeholder(&content, placeholder, &image_path.display().to_string())?;
        content = updated;
        report.replacements += count;
    }

    fs::write(md_file, content)?;
    log::info!("  Updated: {}", md_file.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use docimg_core::PlaceholderKind;
    use tempfile::TempDir;

    fn images(names: &[&str], dir: &Path) -> ImageMapping {
        names
            .iter()
            .map(|n| ((*n).to_string(), dir.join(n)))
            .collect()
    }

    fn write(dir: &Path, rel: &str, content: &str) -> PathBuf {
        let path = dir.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_find_markdown_files_recursive_and_sorted() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "b.md", "");
        write(dir.path(), "a/nested.markdown", "");
        write(dir.path(), "a/deeper/c.MD", "");
        write(dir.path(), "notes.txt", "");

        let mapper = MarkdownImageMapper::new(dir.path(), ImageMapping::new());
        let files = mapper.find_markdown_files();
        let rel: Vec<_> = files
            .iter()
            .map(|f| f.strip_prefix(dir.path()).unwrap().to_string_lossy().replace('\\', "/"))
            .collect();
        assert_eq!(rel, vec!["a/deeper/c.MD", "a/nested.markdown", "b.md"]);
    }

    #[test]
    fn test_analyze_omits_files_without_placeholders() {
        let dir = TempDir::new().unwrap();
        let guide = write(dir.path(), "guide.md", "Intro\n[IMAGE:diagram1]\n![Login](x.png)\n");
        write(dir.path(), "plain.md", "nothing here");

        let mapper = MarkdownImageMapper::new(dir.path(), ImageMapping::new());
        let map = mapper.analyze_placeholders();
        assert_eq!(map.len(), 1);

        let entries = &map[&guide.display().to_string()];
        assert_eq!(entries[0], ("diagram1".to_string(), 6, 22));
        assert_eq!(entries[1].0, "Login");

        let typed = mapper.analyze_file_placeholders();
        assert_eq!(typed[0].kind, PlaceholderKind::BracketPlaceholder);
        assert_eq!(typed[1].kind, PlaceholderKind::StandardImage);
    }

    #[test]
    fn test_analyze_skips_non_utf8_file() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("bad.md"), [0xff, 0xfe, 0x00, 0x5b]).unwrap();
        write(dir.path(), "good.md", "[IMAGE:x]");

        let mapper = MarkdownImageMapper::new(dir.path(), ImageMapping::new());
        assert_eq!(mapper.analyze_placeholders().len(), 1);
    }

    #[test]
    fn test_suggest_requires_score_above_threshold() {
        let dir = TempDir::new().unwrap();
        let mapper = MarkdownImageMapper::new(
            dir.path(),
            images(&["img_0001_diagram_a1b2c3d4.png"], dir.path()),
        );
        let mut map = PlaceholderMap::new();
        map.insert("a.md".into(), vec![("diagram one".into(), 0, 10)]);

        // 1/6 does not clear 0.3
        assert!(mapper.suggest_mappings(&map).is_empty());

        let lenient = mapper.with_threshold(0.1);
        let suggestions = lenient.suggest_mappings(&map);
        assert_eq!(
            suggestions.get("a.md:diagram one").map(String::as_str),
            Some("img_0001_diagram_a1b2c3d4.png")
        );
    }

    #[test]
    fn test_best_match_tie_goes_to_smallest_name() {
        let dir = TempDir::new().unwrap();
        let mapper = MarkdownImageMapper::new(
            dir.path(),
            images(&["img_0002_media_x.png", "img_0001_media_x.png"], dir.path()),
        )
        .with_threshold(0.0);

        // Both names share {img, media, x, png}; the sequence token differs
        let (name, _) = mapper.best_match("img media x png").unwrap();
        assert_eq!(name, "img_0001_media_x.png");
    }

    #[test]
    fn test_best_match_zero_scores_never_match() {
        let dir = TempDir::new().unwrap();
        let mapper = MarkdownImageMapper::new(dir.path(), images(&["img_0001.png"], dir.path()))
            .with_threshold(0.0);
        assert!(mapper.best_match("unrelated words").is_none());
    }

    #[test]
    fn test_apply_roundtrip_with_backup() {
        let dir = TempDir::new().unwrap();
        let original = "# Guide\n[IMAGE:diagram1]\n<!-- IMAGE: login -->\n";
        let guide = write(dir.path(), "docs/guide.md", original);
        let image_dir = dir.path().join("out");
        let mapper = MarkdownImageMapper::new(
            dir.path(),
            images(&["img_0001.png", "img_0002.png"], &image_dir),
        );

        let key = |p: &str| MappingKey::new(guide.display().to_string(), p).to_string();
        let mut mappings = Mappings::new();
        mappings.insert(key("diagram1"), "img_0001.png".into());
        mappings.insert(key("login"), "img_0002.png".into());

        let report = mapper.apply_mappings(&mappings, true);
        assert_eq!(report.files_updated, 1);
        assert_eq!(report.backups_written, 1);
        assert_eq!(report.replacements, 2);
        assert!(report.failed_files.is_empty());

        let updated = fs::read_to_string(&guide).unwrap();
        assert_eq!(
            updated,
            format!(
                "# Guide\n![diagram1]({})\n![login]({})\n",
                image_dir.join("img_0001.png").display(),
                image_dir.join("img_0002.png").display()
            )
        );

        let backup = backup_path(&guide);
        assert!(backup.to_string_lossy().ends_with("guide.md.bak"));
        assert_eq!(fs::read(&backup).unwrap(), original.as_bytes());
    }

    #[test]
    fn test_apply_without_backup() {
        let dir = TempDir::new().unwrap();
        let guide = write(dir.path(), "guide.md", "[IMAGE:x]");
        let mapper = MarkdownImageMapper::new(dir.path(), images(&["img_0001.png"], dir.path()));

        let mut mappings = Mappings::new();
        mappings.insert(format!("{}:x", guide.display()), "img_0001.png".into());
        let report = mapper.apply_mappings(&mappings, false);

        assert_eq!(report.backups_written, 0);
        assert!(!backup_path(&guide).exists());
    }

    #[test]
    fn test_apply_skips_unknown_images_and_bad_keys() {
        let dir = TempDir::new().unwrap();
        let original = "[IMAGE:x]";
        let guide = write(dir.path(), "guide.md", original);
        let mapper = MarkdownImageMapper::new(dir.path(), ImageMapping::new());

        let mut mappings = Mappings::new();
        mappings.insert(format!("{}:x", guide.display()), "img_0404.png".into());
        mappings.insert("no-separator".into(), "img_0001.png".into());
        let report = mapper.apply_mappings(&mappings, true);

        assert_eq!(report.skipped_entries, 2);
        assert_eq!(report.files_updated, 0);
        // Untouched: no entry survived for the file
        assert_eq!(fs::read_to_string(&guide).unwrap(), original);
        assert!(!backup_path(&guide).exists());
    }

    #[test]
    fn test_apply_missing_file_fails_only_that_file() {
        let dir = TempDir::new().unwrap();
        let guide = write(dir.path(), "guide.md", "[IMAGE:x]");
        let missing = dir.path().join("gone.md");
        let mapper = MarkdownImageMapper::new(dir.path(), images(&["img_0001.png"], dir.path()));

        let mut mappings = Mappings::new();
        mappings.insert(format!("{}:x", missing.display()), "img_0001.png".into());
        mappings.insert(format!("{}:x", guide.display()), "img_0001.png".into());
        let report = mapper.apply_mappings(&mappings, true);

        assert_eq!(report.files_updated, 1);
        assert_eq!(report.failed_files, vec![missing.display().to_string()]);
        assert!(fs::read_to_string(&guide).unwrap().starts_with("![x]("));
    }

    #[test]
    fn test_backup_path_appends_suffix() {
        assert_eq!(backup_path(Path::new("docs/a.markdown")), PathBuf::from("docs/a.markdown.bak"));
    }
}
