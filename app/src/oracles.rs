//! File-backed stand-ins for the inference oracles, so the pipeline runs
//! without a model server.
use std::{
    collections::BTreeMap,
    fmt, fs,
    path::{Path, PathBuf},
    str::FromStr,
    sync::Arc,
};

use category_fusion::FusionOracles;
use scene_core::{
    oracle::{
        DepthHandle, DepthOracle, InstanceHandle, InstanceMask, InstanceSegmenter, LabeledMask,
        LabelerHandle, OracleError, OracleHandle, PromptDetection, PromptedHandle, PromptedLabeler,
        SemanticLabeler,
    },
    Mask, RgbImage, ScalarField,
};
use serde::Deserialize;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DepthSource {
    /// Brighter pixels are nearer
    #[default]
    Luminance,
    /// Darker pixels are nearer
    InverseLuminance,
}

impl fmt::Display for DepthSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DepthSource::Luminance => f.write_str("luminance"),
            DepthSource::InverseLuminance => f.write_str("inverse-luminance"),
        }
    }
}

impl FromStr for DepthSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "luminance" => Ok(DepthSource::Luminance),
            "inverse-luminance" | "inverse_luminance" => Ok(DepthSource::InverseLuminance),
            other => Err(format!("unknown depth oracle: {other}")),
        }
    }
}

/// Rec.601 luma of every pixel as a depth proxy.
#[derive(Debug, Clone, Copy, Default)]
pub struct LuminanceDepth {
    invert: bool,
}

impl LuminanceDepth {
    pub fn new(source: DepthSource) -> Self {
        Self {
            invert: source == DepthSource::InverseLuminance,
        }
    }
}

impl DepthOracle for LuminanceDepth {
    fn infer(&mut self, image: &RgbImage) -> Result<ScalarField, OracleError> {
        let invert = self.invert;
        let (width, height) = (image.width() as usize, image.height() as usize);
        Ok(ScalarField::from_fn(width, height, |x, y| {
            let [r, g, b] = image.get_pixel(x as u32, y as u32).0;
            let luma = (0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32) / 255.0;
            if invert {
                1.0 - luma
            } else {
                luma
            }
        }))
    }
}

fn full_score() -> f32 {
    1.0
}

#[derive(Debug, Clone, Deserialize)]
pub struct LabelEntry {
    pub mask: PathBuf,
    pub label: String,
    #[serde(default = "full_score")]
    pub score: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InstanceEntry {
    pub mask: PathBuf,
    /// Counted from the mask when absent
    #[serde(default)]
    pub area: Option<usize>,
    #[serde(default = "full_score")]
    pub quality: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PromptEntry {
    pub mask: PathBuf,
    #[serde(default = "full_score")]
    pub score: f32,
}

/// Precomputed oracle answers. Mask paths are relative to the manifest.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Manifest {
    pub labels: Option<Vec<LabelEntry>>,
    pub instances: Option<Vec<InstanceEntry>>,
    pub prompts: Option<BTreeMap<String, Vec<PromptEntry>>>,
}

/// Answers the labeler, instance and prompted queries from a [`Manifest`].
/// Masks are read from disk on every query.
#[derive(Debug, Clone)]
pub struct ManifestOracles {
    base: PathBuf,
    manifest: Arc<Manifest>,
}

impl ManifestOracles {
    pub fn new(base: impl Into<PathBuf>, manifest: Manifest) -> Self {
        Self {
            base: base.into(),
            manifest: Arc::new(manifest),
        }
    }

    pub fn load(path: &Path) -> Result<Self, AppError> {
        let manifest: Manifest = serde_json::from_str(&fs::read_to_string(path)?)?;
        let base = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Ok(Self::new(base, manifest))
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    fn read_mask(&self, oracle: &str, path: &Path) -> Result<Mask, OracleError> {
        let path = self.base.join(path);
        let gray = image::open(&path)
            .map_err(|e| {
                OracleError::failed(oracle, format!("{}: {e}", path.display()))
            })?
            .to_luma8();
        Ok(Mask::from_luma(&gray))
    }
}

impl SemanticLabeler for ManifestOracles {
    fn label(&mut self, _image: &RgbImage) -> Result<Vec<LabeledMask>, OracleError> {
        let entries = self.manifest.labels.as_deref().unwrap_or_default();
        entries
            .iter()
            .map(|entry| {
                Ok(LabeledMask {
                    mask: self.read_mask("labeler", &entry.mask)?,
                    label: entry.label.clone(),
                    score: entry.score,
                })
            })
            .collect()
    }
}

impl InstanceSegmenter for ManifestOracles {
    fn segment(&mut self, _image: &RgbImage) -> Result<Vec<InstanceMask>, OracleError> {
        let entries = self.manifest.instances.as_deref().unwrap_or_default();
        entries
            .iter()
            .map(|entry| {
                let mask = self.read_mask("instances", &entry.mask)?;
                Ok(InstanceMask {
                    area: entry.area.unwrap_or_else(|| mask.count()),
                    mask,
                    quality: entry.quality,
                })
            })
            .collect()
    }
}

impl PromptedLabeler for ManifestOracles {
    fn detect(
        &mut self,
        _image: &RgbImage,
        prompt: &str,
    ) -> Result<Vec<PromptDetection>, OracleError> {
        let Some(prompts) = &self.manifest.prompts else {
            return Ok(Vec::new());
        };
        let entries = prompts
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(prompt))
            .map(|(_, entries)| entries.as_slice())
            .unwrap_or_default();
        entries
            .iter()
            .map(|entry| {
                Ok(PromptDetection {
                    mask: self.read_mask("prompted", &entry.mask)?,
                    score: entry.score,
                })
            })
            .collect()
    }
}

fn install<T>(handle: &OracleHandle<T>, oracle: T) {
    if let Err(e) = handle.load(oracle) {
        log::warn!("could not load oracle `{}`: {e}", handle.name());
    }
}

/// Every oracle handle the pipeline needs, built once at startup.
pub struct Oracles {
    pub depth: DepthHandle,
    pub labeler: LabelerHandle,
    pub instances: InstanceHandle,
    pub prompted: PromptedHandle,
}

impl Oracles {
    /// Sections missing from the manifest leave their handle unloaded.
    pub fn new(depth: DepthSource, manifest: Option<ManifestOracles>) -> Self {
        let oracles = Self {
            depth: OracleHandle::new(
                "depth",
                Box::new(LuminanceDepth::new(depth)) as Box<dyn DepthOracle>,
            ),
            labeler: OracleHandle::empty("labeler"),
            instances: OracleHandle::empty("instances"),
            prompted: OracleHandle::empty("prompted"),
        };
        let Some(manifest) = manifest else {
            return oracles;
        };

        if manifest.manifest().labels.is_some() {
            install(
                &oracles.labeler,
                Box::new(manifest.clone()) as Box<dyn SemanticLabeler>,
            );
        }
        if manifest.manifest().instances.is_some() {
            install(
                &oracles.instances,
                Box::new(manifest.clone()) as Box<dyn InstanceSegmenter>,
            );
        }
        if manifest.manifest().prompts.is_some() {
            install(
                &oracles.prompted,
                Box::new(manifest) as Box<dyn PromptedLabeler>,
            );
        }
        oracles
    }

    pub fn fusion(&self) -> FusionOracles<'_> {
        FusionOracles {
            labeler: &self.labeler,
            instances: &self.instances,
            prompted: &self.prompted,
        }
    }
}
