//! # docimg markdown
//!
//! The markdown side of docimg: recognize image placeholders, score them
//! against extracted image names, and rewrite them to real image links.
//!
//! Recognized placeholder forms:
//!
//! | Form | Example | Identifying text |
//! |------|---------|------------------|
//! | standard image | `![Login screen](old.png)` | alt text, else the path |
//! | HTML image | `<img src="figs/flow.jpg">` | `src` |
//! | bracket | `[IMAGE:diagram1]` | `diagram1` |
//! | comment | `<!-- IMAGE: diagram1 -->` | `diagram1` |

pub mod mapper;
pub mod patterns;
pub mod rewrite;
pub mod similarity;

pub use mapper::{backup_path, write_backup, MarkdownImageMapper};
pub use patterns::analyze_text;
pub use rewrite::{rewrite_placeholder, ApplyReport};
pub use similarity::{calculate_similarity, DEFAULT_THRESHOLD};
