//! Token-set similarity between placeholder text and image names.

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

/// Default minimum score a suggestion must exceed.
pub const DEFAULT_THRESHOLD: f64 = 0.3;

static RE_NOT_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9\s]").expect("valid cleanup regex"));

/// Words of a placeholder: lowercased, punctuation stripped, split on whitespace.
///
/// Stripping joins the pieces around punctuation, so `screenshot_login`
/// is one token.
#[must_use]
pub fn placeholder_tokens(text: &str) -> HashSet<String> {
    let lowered = text.to_lowercase();
    RE_NOT_WORD
        .replace_all(lowered.trim(), "")
        .split_whitespace()
        .map(String::from)
        .collect()
}

/// Parts of a generated image name, split on anything that is not a letter or digit.
#[must_use]
pub fn image_name_tokens(name: &str) -> HashSet<String> {
    name.to_lowercase()
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(String::from)
        .collect()
}

/// Jaccard index; 0.0 when either set is empty.
#[must_use]
pub fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.union(b).count();
    intersection as f64 / union as f64
}

/// Score a placeholder text against an image name.
///
/// ```
/// use docimg_markdown::calculate_similarity;
///
/// let score = calculate_similarity("diagram one", "img_0001_diagram_a1b2c3d4.png");
/// assert!((score - 1.0 / 6.0).abs() < 1e-9);
/// ```
#[must_use]
pub fn calculate_similarity(placeholder: &str, image_name: &str) -> f64 {
    jaccard(&placeholder_tokens(placeholder), &image_name_tokens(image_name))
}
