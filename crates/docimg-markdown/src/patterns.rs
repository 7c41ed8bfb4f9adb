//! Placeholder recognition.

use docimg_core::{Placeholder, PlaceholderKind};
use regex::{Captures, Regex};
use std::sync::LazyLock;

/// One alternation per placeholder syntax; group order decides the kind.
///
/// 1-2: `![alt](path)`, 3: `<img src="...">`, 4: `[IMAGE:name]`,
/// 5: `<!-- IMAGE: name -->`
static RE_PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"!\[([^\]]*)\]\(([^\)]*)\)",
        r#"|<img[^>]*src=["']([^"']*)["'][^>]*>"#,
        r"|\[IMAGE:([^\]]*)\]",
        r"|<!-- *IMAGE: *([^-]*) *-->",
    ))
    .expect("valid placeholder regex")
});

fn kind_of_group(group: usize) -> PlaceholderKind {
    match group {
        1 | 2 => PlaceholderKind::StandardImage,
        3 => PlaceholderKind::HtmlImgTag,
        4 => PlaceholderKind::BracketPlaceholder,
        _ => PlaceholderKind::CommentPlaceholder,
    }
}

/// First non-empty group, with comment captures trimmed.
fn identifying_text(caps: &Captures<'_>) -> Option<(PlaceholderKind, String)> {
    (1..=5).find_map(|group| {
        let text = caps.get(group)?.as_str();
        let text = if group == 5 { text.trim() } else { text };
        (!text.is_empty()).then(|| (kind_of_group(group), text.to_string()))
    })
}

/// Every placeholder in `content`, in document order.
///
/// `file_path` is copied into each result. Offsets count characters (Unicode
/// scalar values), not bytes.
///
/// ```
/// use docimg_core::PlaceholderKind;
/// use docimg_markdown::analyze_text;
///
/// let found = analyze_text("a.md", "See [IMAGE:overview] and ![](fig.png)");
/// assert_eq!(found[0].kind, PlaceholderKind::BracketPlaceholder);
/// assert_eq!(found[0].text, "overview");
/// assert_eq!(found[1].text, "fig.png");
/// ```
#[must_use]
pub fn analyze_text(file_path: &str, content: &str) -> Vec<Placeholder> {
    // Matches arrive in order, so byte positions only move forward
    let (mut byte_pos, mut char_pos) = (0, 0);
    let mut char_offset = |byte: usize| {
        char_pos += content[byte_pos..byte].chars().count();
        byte_pos = byte;
        char_pos
    };

    let mut found = Vec::new();
    for caps in RE_PLACEHOLDER.captures_iter(content) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        let Some((kind, text)) = identifying_text(&caps) else {
            continue;
        };
        let start = char_offset(whole.start());
        let end = char_offset(whole.end());
        found.push(Placeholder {
            kind,
            text,
            file_path: file_path.to_string(),
            start,
            end,
        });
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recognizes_all_four_forms() {
        let content = "Intro\n\
            ![System diagram](images/sys.png)\n\
            <img alt=\"x\" src='figures/flow.jpg' width=\"200\">\n\
            [IMAGE:diagram1]\n\
            <!-- IMAGE: screenshot_login -->\n";
        let found = analyze_text("guide.md", content);

        let kinds: Vec<_> = found.iter().map(|p| p.kind).collect();
        assert_eq!(
            kinds,
            vec![
                PlaceholderKind::StandardImage,
                PlaceholderKind::HtmlImgTag,
                PlaceholderKind::BracketPlaceholder,
                PlaceholderKind::CommentPlaceholder,
            ]
        );
        let texts: Vec<_> = found.iter().map(|p| p.text.as_str()).collect();
        assert_eq!(
            texts,
            vec!["System diagram", "figures/flow.jpg", "diagram1", "screenshot_login"]
        );
        assert!(found.iter().all(|p| p.file_path == "guide.md"));
    }

    #[test]
    fn test_offsets_cover_whole_match() {
        let content = "ab [IMAGE:x] cd";
        let found = analyze_text("a.md", content);
        assert_eq!(found.len(), 1);
        assert_eq!(&content[found[0].start..found[0].end], "[IMAGE:x]");
    }

    #[test]
    fn test_offsets_count_characters_after_multibyte_text() {
        let content = "é [IMAGE:x] ünd ![日本](a.png)";
        let found = analyze_text("a.md", content);
        assert_eq!((found[0].start, found[0].end), (2, 11));
        assert_eq!((found[1].start, found[1].end), (16, 29));
        let chars: Vec<char> = content.chars().collect();
        let second: String = chars[found[1].start..found[1].end].iter().collect();
        assert_eq!(second, "![日本](a.png)");
    }

    #[test]
    fn test_empty_alt_falls_back_to_path() {
        let found = analyze_text("a.md", "![](media/pic.png)");
        assert_eq!(found[0].kind, PlaceholderKind::StandardImage);
        assert_eq!(found[0].text, "media/pic.png");
    }

    #[test]
    fn test_all_empty_groups_are_ignored() {
        assert!(analyze_text("a.md", "![]() [IMAGE:] <!-- IMAGE:   -->").is_empty());
    }

    #[test]
    fn test_comment_capture_is_trimmed() {
        let found = analyze_text("a.md", "<!--IMAGE:   login page   -->");
        assert_eq!(found[0].text, "login page");
    }

    #[test]
    fn test_plain_links_are_not_placeholders() {
        assert!(analyze_text("a.md", "[docs](https://example.com) and [IMAGE] text").is_empty());
    }
}
