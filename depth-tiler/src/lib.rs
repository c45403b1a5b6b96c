//! Depth-field estimation for images larger than the oracle's native input.
//!
//! The image is cut into overlapping tiles, the oracle runs on each tile in
//! turn, and the results are stitched with feathered weights so tile seams
//! do not show up in the final field.
pub mod error;
pub mod estimator;
pub mod feather;
pub mod tile;

pub use error::TilingError;
pub use estimator::TiledEstimator;
pub use feather::FeatherMask;
pub use tile::{plan_tiles, Tile, TilingOptions};
