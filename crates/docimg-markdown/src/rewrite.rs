//! In-place placeholder replacement.

use docimg_core::Result;
use regex::{Captures, Regex};

/// Counts from one [`crate::MarkdownImageMapper::apply_mappings`] run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyReport {
    /// Markdown files written back
    pub files_updated: usize,
    /// `.bak` copies written
    pub backups_written: usize,
    /// Placeholder occurrences replaced, across all files
    pub replacements: usize,
    /// Entries skipped (unparseable key or unknown image)
    pub skipped_entries: usize,
    /// Files that could not be backed up, read, or written
    pub failed_files: Vec<String>,
}

/// Replace every occurrence of `placeholder` in `content` with standard
/// image markup pointing at `image_path`.
///
/// Matching is case-insensitive and treats `placeholder` literally:
///
/// - `![placeholder](anything)` → `![placeholder](image_path)`
/// - `![alt](placeholder)` → `![alt](image_path)`
/// - `[IMAGE:placeholder]` → `![placeholder](image_path)`
/// - `<!-- IMAGE: placeholder -->` → `![placeholder](image_path)`
///
/// Returns the new content and the number of replacements.
///
/// # Errors
///
/// Returns an error if a pattern cannot be compiled (placeholder far too long).
pub fn rewrite_placeholder(
    content: &str,
    placeholder: &str,
    image_path: &str,
) -> Result<(String, usize)> {
    let escaped = regex::escape(placeholder);
    let markup = format!("![{placeholder}]({image_path})");
    let mut count = 0;

    let alt_rule = Regex::new(&format!(r"(?i)!\[{escaped}\]\([^)]*\)"))?;
    let content = alt_rule.replace_all(content, |_: &Captures<'_>| {
        count += 1;
        markup.clone()
    });

    let path_rule = Regex::new(&format!(r"(?i)!\[([^\]]*)\]\({escaped}\)"))?;
    let content = path_rule.replace_all(&content, |caps: &Captures<'_>| {
        count += 1;
        format!("![{}]({image_path})", &caps[1])
    });

    let bracket_rule = Regex::new(&format!(r"(?i)\[IMAGE:{escaped}\]"))?;
    let content = bracket_rule.replace_all(&content, |_: &Captures<'_>| {
        count += 1;
        markup.clone()
    });

    let comment_rule = Regex::new(&format!(r"(?i)<!-- *IMAGE: *{escaped} *-->"))?;
    let content = comment_rule.replace_all(&content, |_: &Captures<'_>| {
        count += 1;
        markup.clone()
    });

    Ok((content.into_owned(), count))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rewrite_bracket_and_comment() {
        let content = "A [IMAGE:diagram1]\nB <!-- IMAGE: diagram1 -->\n";
        let (out, n) = rewrite_placeholder(content, "diagram1", "/out/img_0001.png").unwrap();
        assert_eq!(
            out,
            "A ![diagram1](/out/img_0001.png)\nB ![diagram1](/out/img_0001.png)\n"
        );
        assert_eq!(n, 2);
    }

    #[test]
    fn test_rewrite_standard_alt_replaces_path() {
        let (out, n) =
            rewrite_placeholder("![Login](old/path.png)", "Login", "/out/img_0002.png").unwrap();
        assert_eq!(out, "![Login](/out/img_0002.png)");
        assert_eq!(n, 1);
    }

    #[test]
    fn test_rewrite_standard_path_keeps_alt() {
        let (out, _) =
            rewrite_placeholder("![](fig.png) ![Flow](fig.png)", "fig.png", "/out/img_0003.png")
                .unwrap();
        assert_eq!(out, "![](/out/img_0003.png) ![Flow](/out/img_0003.png)");
    }

    #[test]
    fn test_rewrite_is_case_insensitive() {
        let (out, n) = rewrite_placeholder("[image:Diagram1]", "diagram1", "/x.png").unwrap();
        assert_eq!(out, "![diagram1](/x.png)");
        assert_eq!(n, 1);
    }

    #[test]
    fn test_placeholder_is_literal() {
        let content = "[IMAGE:fig (a)+b] [IMAGE:fig aab]";
        let (out, n) = rewrite_placeholder(content, "fig (a)+b", "/x.png").unwrap();
        assert_eq!(out, "![fig (a)+b](/x.png) [IMAGE:fig aab]");
        assert_eq!(n, 1);
    }

    #[test]
    fn test_dollar_in_path_is_not_expanded() {
        let (out, _) = rewrite_placeholder("[IMAGE:x]", "x", "/cost$1/img.png").unwrap();
        assert_eq!(out, "![x](/cost$1/img.png)");
    }

    #[test]
    fn test_rewritten_bracket_reads_back_as_standard_image() {
        use crate::analyze_text;
        use docimg_core::PlaceholderKind;

        for image_path in ["/abs/out (1)/img_0001_media_a1b2c3d4.png", "/abs/my images/img_0001.png"] {
            let (out, n) = rewrite_placeholder("Intro [IMAGE:diagram1] end", "diagram1", image_path).unwrap();
            assert_eq!(n, 1);

            let found: Vec<_> = analyze_text("a.md", &out)
                .into_iter()
                .map(|p| (p.kind, p.text))
                .collect();
            assert_eq!(
                found,
                vec![(PlaceholderKind::StandardImage, "diagram1".to_string())],
                "re-analysing {out}"
            );
        }
    }

    #[test]
    fn test_unrelated_content_untouched() {
        let content = "No placeholders here. [IMAGE:other]";
        let (out, n) = rewrite_placeholder(content, "diagram1", "/x.png").unwrap();
        assert_eq!(out, content);
        assert_eq!(n, 0);
    }
}
