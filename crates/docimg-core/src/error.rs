//! Error types for extraction and mapping operations.

use thiserror::Error;

/// Error types that can occur while extracting images or rewriting markdown.
///
/// Most failures inside the extractor never surface as a `DocimgError`: they are
/// recorded per item or per strategy and the run continues. The variants below
/// are what callers see when a whole operation cannot proceed.
///
/// # Examples
///
/// ```rust,ignore
/// use docimg_core::DocimgError;
/// use docimg_extract::{ExtractOptions, ImageExtractor};
///
/// match ImageExtractor::new("guide.docx", "out", ExtractOptions::default()) {
///     Err(DocimgError::Precondition(msg)) => eprintln!("Cannot start: {msg}"),
///     Err(e) => eprintln!("Other error: {e}"),
///     Ok(mut extractor) => {
///         extractor.extract_all_images();
///     }
/// }
/// ```
#[derive(Error, Debug)]
pub enum DocimgError {
    /// File I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The document could not be read as a ZIP container.
    #[error("Invalid ZIP archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// An XML part of the document could not be parsed.
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Mapping file could not be serialized or parsed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A substitution pattern failed to compile.
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    /// Input was syntactically valid but semantically unusable.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A single extraction step failed.
    #[error("Extraction error: {0}")]
    Extraction(String),

    /// A required precondition does not hold; nothing was attempted.
    #[error("Precondition failed: {0}")]
    Precondition(String),
}

/// Result type alias for docimg operations.
pub type Result<T> = std::result::Result<T, DocimgError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: DocimgError = io.into();
        assert!(matches!(err, DocimgError::Io(_)));
        assert_eq!(err.to_string(), "IO error: gone");
    }

    #[test]
    fn test_precondition_display() {
        let err = DocimgError::Precondition("word file missing".to_string());
        assert_eq!(err.to_string(), "Precondition failed: word file missing");
    }

    #[test]
    fn test_json_error_conversion() {
        let parse = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: DocimgError = parse.into();
        assert!(err.to_string().starts_with("JSON error:"));
    }
}
