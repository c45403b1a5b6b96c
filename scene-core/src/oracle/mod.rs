//! Boundary to external inference.
//!
//! Oracles are opaque: the pipeline only relies on the shapes below. Each
//! oracle is a stateful, exclusive resource, so every method takes `&mut self`
//! and callers reach it through an [`OracleHandle`].
mod handle;

pub use handle::OracleHandle;

use thiserror::Error;

use crate::{
    scene::{Mask, ScalarField},
    RgbImage,
};

#[derive(Debug, Clone, Error, PartialEq)]
pub enum OracleError {
    #[error("oracle `{0}` is not loaded")]
    Unavailable(String),
    #[error("oracle `{0}` is poisoned by an earlier panic")]
    Poisoned(String),
    #[error("oracle `{name}` failed: {message}")]
    Failed { name: String, message: String },
}

impl OracleError {
    pub fn failed(name: impl Into<String>, message: impl ToString) -> Self {
        OracleError::Failed {
            name: name.into(),
            message: message.to_string(),
        }
    }
}

/// A free-text labelled region from a semantic labeler.
#[derive(Debug, Clone)]
pub struct LabeledMask {
    pub mask: Mask,
    pub label: String,
    pub score: f32,
}

/// An unlabelled instance region with its predicted quality.
#[derive(Debug, Clone)]
pub struct InstanceMask {
    pub mask: Mask,
    /// Pixel area as reported by the segmenter
    pub area: usize,
    pub quality: f32,
}

/// A region returned for one text prompt.
#[derive(Debug, Clone)]
pub struct PromptDetection {
    pub mask: Mask,
    pub score: f32,
}

/// Maps an image (or tile) to a same-extent scalar field of arbitrary range
/// and resolution.
pub trait DepthOracle: Send {
    fn infer(&mut self, image: &RgbImage) -> Result<ScalarField, OracleError>;
}

pub trait SemanticLabeler: Send {
    fn label(&mut self, image: &RgbImage) -> Result<Vec<LabeledMask>, OracleError>;
}

pub trait InstanceSegmenter: Send {
    fn segment(&mut self, image: &RgbImage) -> Result<Vec<InstanceMask>, OracleError>;
}

/// Open-vocabulary labeler queried once per prompt.
pub trait PromptedLabeler: Send {
    fn detect(&mut self, image: &RgbImage, prompt: &str)
        -> Result<Vec<PromptDetection>, OracleError>;
}

impl<F> DepthOracle for F
where
    F: FnMut(&RgbImage) -> Result<ScalarField, OracleError> + Send,
{
    fn infer(&mut self, image: &RgbImage) -> Result<ScalarField, OracleError> {
        self(image)
    }
}

impl<F> SemanticLabeler for F
where
    F: FnMut(&RgbImage) -> Result<Vec<LabeledMask>, OracleError> + Send,
{
    fn label(&mut self, image: &RgbImage) -> Result<Vec<LabeledMask>, OracleError> {
        self(image)
    }
}

impl<F> InstanceSegmenter for F
where
    F: FnMut(&RgbImage) -> Result<Vec<InstanceMask>, OracleError> + Send,
{
    fn segment(&mut self, image: &RgbImage) -> Result<Vec<InstanceMask>, OracleError> {
        self(image)
    }
}

impl<F> PromptedLabeler for F
where
    F: FnMut(&RgbImage, &str) -> Result<Vec<PromptDetection>, OracleError> + Send,
{
    fn detect(
        &mut self,
        image: &RgbImage,
        prompt: &str,
    ) -> Result<Vec<PromptDetection>, OracleError> {
        self(image, prompt)
    }
}

pub type DepthHandle = OracleHandle<Box<dyn DepthOracle>>;
pub type LabelerHandle = OracleHandle<Box<dyn SemanticLabeler>>;
pub type InstanceHandle = OracleHandle<Box<dyn InstanceSegmenter>>;
pub type PromptedHandle = OracleHandle<Box<dyn PromptedLabeler>>;
