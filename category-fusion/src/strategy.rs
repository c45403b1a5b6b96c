use std::{fmt, str::FromStr};

use scene_core::{
    oracle::{InstanceMask, LabeledMask, OracleError},
    CategoryMap, Detection, RgbImage,
};
use serde::{Deserialize, Serialize};

use crate::{
    fusion::{FusionOptions, FusionOracles},
    labels::{label_to_category, static_keywords, CategoryKeywords},
    paint::{paint_strokes, PaintKey, Stroke},
};

/// Fusion strategy selected by configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Semantic labeler only
    #[default]
    LabelMap,
    /// Instance masks classified by a coarse category field
    Hybrid,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::LabelMap => f.write_str("label_map"),
            Strategy::Hybrid => f.write_str("hybrid"),
        }
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "label_map" | "label-map" | "labelmap" | "maskformer" => Ok(Strategy::LabelMap),
            "hybrid" | "sam2" => Ok(Strategy::Hybrid),
            other => Err(format!("unknown fusion strategy: {other}")),
        }
    }
}

/// Where the hybrid strategy takes its coarse category field from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoarseSource {
    #[default]
    LabelMap,
    /// Text-prompted labeler queried once per category keyword
    Prompted,
}

impl fmt::Display for CoarseSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoarseSource::LabelMap => f.write_str("label_map"),
            CoarseSource::Prompted => f.write_str("prompted"),
        }
    }
}

impl FromStr for CoarseSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "label_map" | "label-map" | "labelmap" => Ok(CoarseSource::LabelMap),
            "prompted" => Ok(CoarseSource::Prompted),
            other => Err(format!("unknown coarse source: {other}")),
        }
    }
}

fn image_size(image: &RgbImage) -> (usize, usize) {
    (image.width() as usize, image.height() as usize)
}

fn label_strokes(
    labeled: Vec<LabeledMask>,
    (width, height): (usize, usize),
    min_score: f32,
) -> Vec<Stroke> {
    labeled
        .into_iter()
        .filter(|labeled| labeled.score >= min_score)
        .map(|labeled| Stroke {
            key: PaintKey::Confidence(labeled.score),
            mask: labeled.mask.fit_to(width, height),
            category: label_to_category(&labeled.label),
            label: labeled.label,
            confidence: labeled.score,
        })
        .collect()
}

/// Paint the semantic labeler's regions, most confident last.
pub(crate) fn label_map(
    image: &RgbImage,
    oracles: &FusionOracles,
    options: &FusionOptions,
) -> Result<(CategoryMap, Vec<Detection>), OracleError> {
    let size = image_size(image);
    let labeled = oracles.labeler.with(|labeler| labeler.label(image))?;
    log::info!("labeler: {} regions", labeled.len());

    let mut categories = CategoryMap::new(size.0, size.1);
    let detections = paint_strokes(
        &mut categories,
        label_strokes(labeled, size, options.min_score),
    );
    Ok((categories, detections))
}

/// Query the prompted labeler once per keyword. Keywords come from `hints`
/// when any are given, else from the label dictionary.
fn prompt_strokes(
    image: &RgbImage,
    oracles: &FusionOracles,
    hints: &CategoryKeywords,
    options: &FusionOptions,
) -> Result<Vec<Stroke>, OracleError> {
    let (width, height) = image_size(image);
    let fallback;
    let keywords = if hints.is_empty() {
        fallback = static_keywords();
        &fallback
    } else {
        hints
    };

    oracles.prompted.with(|oracle| {
        let mut strokes = Vec::new();
        for (&category, words) in keywords {
            for (keyword, word) in words.iter().enumerate() {
                for detection in oracle.detect(image, word)? {
                    if detection.score < options.min_score {
                        continue;
                    }
                    let mask = detection.mask.fit_to(width, height);
                    if mask.count() < options.min_prompt_pixels {
                        continue;
                    }
                    strokes.push(Stroke {
                        key: PaintKey::Prompt { category, keyword },
                        mask,
                        category,
                        label: word.clone(),
                        confidence: detection.score,
                    });
                }
            }
        }
        log::info!("prompted labeler: {} regions kept", strokes.len());
        Ok(strokes)
    })
}

/// Classify each instance by majority vote of `coarse` inside its mask.
fn instance_strokes(instances: Vec<InstanceMask>, coarse: &CategoryMap) -> Vec<Stroke> {
    let (width, height) = coarse.dimensions();
    instances
        .into_iter()
        .filter_map(|instance| {
            let mask = instance.mask.fit_to(width, height);
            let category = coarse.dominant_within(&mask)?;
            Some(Stroke {
                key: PaintKey::Area(instance.area),
                mask,
                category,
                label: format!("region→{}", category.name()),
                confidence: instance.quality,
            })
        })
        .collect()
}

/// Instance masks painted largest first with the dominant coarse category.
pub(crate) fn hybrid(
    image: &RgbImage,
    hints: &CategoryKeywords,
    oracles: &FusionOracles,
    options: &FusionOptions,
) -> Result<(CategoryMap, Vec<Detection>), OracleError> {
    let (width, height) = image_size(image);
    let instances = oracles
        .instances
        .with(|segmenter| segmenter.segment(image))?;
    log::info!("instance segmenter: {} masks", instances.len());

    let (coarse, mut categories, mut detections) = match options.coarse {
        CoarseSource::LabelMap => {
            let (coarse, _) = label_map(image, oracles, options)?;
            (coarse, CategoryMap::new(width, height), Vec::new())
        }
        CoarseSource::Prompted => {
            // prompt regions are painted directly as well; instances go on top
            let mut coarse = CategoryMap::new(width, height);
            let strokes = prompt_strokes(image, oracles, hints, options)?;
            let detections = paint_strokes(&mut coarse, strokes);
            (coarse.clone(), coarse, detections)
        }
    };

    let strokes = instance_strokes(instances, &coarse);
    detections.extend(paint_strokes(&mut categories, strokes));
    Ok((categories, detections))
}
