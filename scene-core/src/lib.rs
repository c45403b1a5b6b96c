//! Shared data model for the image → point cloud pipeline.
//!
//! Dense per-pixel grids (scalar field, category map, masks), the resampling
//! used to align them with the source image, and the oracle traits that stand
//! in for external inference.
pub mod error;
pub mod oracle;
pub mod resample;
pub mod scene;

pub use error::SceneError;
pub use image::RgbImage;
pub use scene::{Category, CategoryMap, Detection, Mask, ScalarField};
