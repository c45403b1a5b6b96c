use scene_core::oracle::OracleError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TilingError {
    #[error("invalid tiling options: {0}")]
    InvalidOptions(String),
    #[error(transparent)]
    Oracle(#[from] OracleError),
}
