use std::path::PathBuf;

use category_fusion::{FusionError, KeywordError};
use cloud_packer::{TransportError, WireError};
use depth_tiler::TilingError;
use scene_core::oracle::OracleError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid config {path}: {message}")]
    Config { path: PathBuf, message: String },
    #[error(transparent)]
    Oracle(#[from] OracleError),
    #[error("depth estimation failed: {0}")]
    Tiling(#[from] TilingError),
    #[error("category fusion failed: {0}")]
    Fusion(#[from] FusionError),
    #[error("invalid category keywords: {0}")]
    Keywords(#[from] KeywordError),
    #[error("wire encoding failed: {0}")]
    Wire(#[from] WireError),
    #[error("chunked transport failed: {0}")]
    Transport(#[from] TransportError),
    #[error("no generation with id {0}")]
    NotFound(String),
    #[error("{0}")]
    Usage(String),
    #[error("rendered map of {actual} pixels does not fit {width}x{height}")]
    Render {
        width: usize,
        height: usize,
        actual: usize,
    },
}
