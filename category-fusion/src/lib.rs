//! Fusion of per-pixel category sources into one authoritative category map.
pub mod error;
pub mod fusion;
pub mod labels;
pub mod paint;
pub mod strategy;

pub use error::{FusionError, KeywordError};
pub use fusion::{CategoryFusion, Fusion, FusionOptions, FusionOracles};
pub use labels::{label_to_category, parse_category_keywords, static_keywords, CategoryKeywords};
pub use paint::{PaintKey, Stroke};
pub use strategy::{CoarseSource, Strategy};
