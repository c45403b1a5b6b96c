use std::time::Instant;

use scene_core::{
    oracle::{InstanceHandle, LabelerHandle, OracleError, PromptedHandle},
    CategoryMap, Detection, RgbImage,
};
use serde::{Deserialize, Serialize};

use crate::{
    error::FusionError,
    labels::CategoryKeywords,
    strategy::{self, CoarseSource, Strategy},
};

pub const DEFAULT_MIN_SCORE: f32 = 0.3;
pub const DEFAULT_MIN_PROMPT_PIXELS: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionOptions {
    pub strategy: Strategy,
    pub coarse: CoarseSource,
    /// Regions scored below this are ignored
    pub min_score: f32,
    /// Prompted regions with fewer pixels are ignored
    pub min_prompt_pixels: usize,
}

impl Default for FusionOptions {
    fn default() -> Self {
        Self {
            strategy: Strategy::default(),
            coarse: CoarseSource::default(),
            min_score: DEFAULT_MIN_SCORE,
            min_prompt_pixels: DEFAULT_MIN_PROMPT_PIXELS,
        }
    }
}

/// The labeling oracles available to a fusion pass. Handles that were never
/// loaded simply make their strategy unavailable.
#[derive(Clone, Copy)]
pub struct FusionOracles<'a> {
    pub labeler: &'a LabelerHandle,
    pub instances: &'a InstanceHandle,
    pub prompted: &'a PromptedHandle,
}

#[derive(Debug, Clone)]
pub struct Fusion {
    pub categories: CategoryMap,
    pub detections: Vec<Detection>,
    /// Strategy that actually produced the map
    pub strategy: Strategy,
}

#[derive(Debug, Clone, Default)]
pub struct CategoryFusion {
    options: FusionOptions,
}

impl CategoryFusion {
    pub fn new(options: FusionOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &FusionOptions {
        &self.options
    }

    /// Build one category map for `image`.
    ///
    /// When the hybrid strategy fails, the label-map strategy runs instead;
    /// only if that fails too is the request failed.
    pub fn fuse(
        &self,
        image: &RgbImage,
        hints: &CategoryKeywords,
        oracles: FusionOracles,
    ) -> Result<Fusion, FusionError> {
        let start = Instant::now();
        let fusion = match self.options.strategy {
            Strategy::LabelMap => self.run(Strategy::LabelMap, image, hints, oracles)?,
            Strategy::Hybrid => match self.run(Strategy::Hybrid, image, hints, oracles) {
                Ok(fusion) => fusion,
                Err(primary) => {
                    log::warn!("hybrid fusion failed ({primary}), using the label map");
                    self.run(Strategy::LabelMap, image, hints, oracles)
                        .map_err(|fallback| FusionError::Exhausted {
                            strategy: Strategy::Hybrid,
                            primary,
                            fallback,
                        })?
                }
            },
        };

        log::info!(
            "fusion: {} regions via {} in {:?}",
            fusion.detections.len(),
            fusion.strategy,
            start.elapsed()
        );
        Ok(fusion)
    }

    fn run(
        &self,
        strategy: Strategy,
        image: &RgbImage,
        hints: &CategoryKeywords,
        oracles: FusionOracles,
    ) -> Result<Fusion, OracleError> {
        let (categories, detections) = match strategy {
            Strategy::LabelMap => strategy::label_map(image, &oracles, &self.options)?,
            Strategy::Hybrid => strategy::hybrid(image, hints, &oracles, &self.options)?,
        };
        Ok(Fusion {
            categories,
            detections,
            strategy,
        })
    }
}
