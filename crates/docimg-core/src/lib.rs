//! # docimg core
//!
//! Types shared by the image extractor, the markdown mapper, and the CLI:
//!
//! - [`ImageMapping`] / [`ImageRecord`]: what the extractor produces
//! - [`Placeholder`] / [`PlaceholderKind`]: what the mapper finds in markdown
//! - [`MappingKey`] / [`Mappings`]: `"file:placeholder"` → image name
//! - [`MappingConfigFile`]: the reviewable JSON written between runs
//! - [`DocimgError`] / [`Result`]

pub mod error;
pub mod image;
pub mod mapping_file;
pub mod placeholder;

pub use error::{DocimgError, Result};
pub use image::{image_name, ImageMapping, ImageRecord, IMAGE_NAME_PREFIX};
pub use mapping_file::{MappingConfigFile, DEFAULT_MAPPING_FILE, MAPPING_INSTRUCTIONS};
pub use placeholder::{
    MappingKey, Mappings, Placeholder, PlaceholderEntry, PlaceholderKind, PlaceholderMap,
};
