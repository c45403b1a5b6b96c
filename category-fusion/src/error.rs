use scene_core::oracle::OracleError;
use thiserror::Error;

use crate::strategy::Strategy;

#[derive(Debug, Error)]
pub enum FusionError {
    #[error(transparent)]
    Oracle(#[from] OracleError),
    #[error("{strategy} fusion failed ({primary}), label-map fallback failed ({fallback})")]
    Exhausted {
        strategy: Strategy,
        primary: OracleError,
        fallback: OracleError,
    },
}

#[derive(Debug, Error)]
pub enum KeywordError {
    #[error("keyword hints are not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("keyword hints must be a JSON object keyed by category id")]
    NotAnObject,
    #[error("invalid category id `{0}` in keyword hints")]
    InvalidCategory(String),
}
