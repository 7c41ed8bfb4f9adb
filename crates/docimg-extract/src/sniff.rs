//! Image type detection: extension sets, magic bytes, and MIME mapping.

// ========== Image MIME Type Constants ==========

/// MIME type for PNG images.
pub const MIME_IMAGE_PNG: &str = "image/png";

/// MIME type for JPEG images.
pub const MIME_IMAGE_JPEG: &str = "image/jpeg";

/// MIME type for GIF images.
pub const MIME_IMAGE_GIF: &str = "image/gif";

/// MIME type for BMP images.
pub const MIME_IMAGE_BMP: &str = "image/bmp";

/// MIME type for TIFF images.
pub const MIME_IMAGE_TIFF: &str = "image/tiff";

/// Extensions the text-and-media converter output is filtered by.
pub const CONVERTER_IMAGE_EXTENSIONS: &[&str] =
    &["png", "jpg", "jpeg", "gif", "bmp", "tiff", "wmf", "emf"];

/// Extensions that mark an archive entry as image-like during the archive scan.
pub const SCAN_IMAGE_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "bmp", "tiff", "tif", "wmf", "emf", "svg", "ico", "webp", "jfif",
    "pjpeg", "pjp",
];

/// Extensions counted as "potential images" in the extraction report.
pub const REPORT_IMAGE_EXTENSIONS: &[&str] = CONVERTER_IMAGE_EXTENSIONS;

/// Fallback extension when nothing better is known.
pub const DEFAULT_EXTENSION: &str = "png";

/// Lowercased extension of an archive path, without the dot.
///
/// Only the last path segment is considered, so `word/media.d/file` has none.
#[must_use]
pub fn extension_of(path: &str) -> Option<String> {
    let file_name = path.rsplit('/').next().unwrap_or(path);
    let (stem, ext) = file_name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// True if `ext` (lowercase, no dot) is in `set`.
#[inline]
#[must_use]
pub fn is_in(set: &[&str], ext: &str) -> bool {
    set.contains(&ext)
}

/// Infer an extension from the first bytes of a file.
///
/// Recognizes PNG, JPEG, GIF and BMP. Anything else is `None`.
///
/// ```
/// use docimg_extract::sniff::sniff_extension;
///
/// assert_eq!(sniff_extension(b"\x89PNG\r\n\x1a\n"), Some("png"));
/// assert_eq!(sniff_extension(b"\xff\xd8\xff\xe0"), Some("jpg"));
/// assert_eq!(sniff_extension(b"GIF89a"), Some("gif"));
/// assert_eq!(sniff_extension(b"BM6\x00"), Some("bmp"));
/// assert_eq!(sniff_extension(b"PK\x03\x04"), None);
/// ```
#[must_use]
pub fn sniff_extension(data: &[u8]) -> Option<&'static str> {
    if data.starts_with(b"\x89PNG") {
        Some("png")
    } else if data.starts_with(b"\xff\xd8") {
        Some("jpg")
    } else if data.starts_with(b"GIF8") {
        Some("gif")
    } else if data.starts_with(b"BM") {
        Some("bmp")
    } else {
        None
    }
}

/// Map a declared content type to a file extension.
///
/// Unknown or missing types default to `png`.
#[must_use]
pub fn extension_for_mime(content_type: Option<&str>) -> &'static str {
    let Some(content_type) = content_type else {
        return DEFAULT_EXTENSION;
    };
    match content_type.trim().to_ascii_lowercase().as_str() {
        MIME_IMAGE_JPEG | "image/jpg" => "jpg",
        MIME_IMAGE_GIF => "gif",
        MIME_IMAGE_BMP => "bmp",
        MIME_IMAGE_TIFF => "tiff",
        _ => DEFAULT_EXTENSION,
    }
}
