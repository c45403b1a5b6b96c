use std::{
    fs::{self, File},
    io::{BufWriter, Write as _},
    path::{Path, PathBuf},
    time::{Duration, Instant},
};

use category_fusion::{CategoryFusion, CategoryKeywords, Strategy};
use cloud_packer::{
    chunk_payload, encode_wire, needs_chunking, PackedCloud, PointCloudPacker, Projection,
    WireMetadata,
};
use depth_tiler::TiledEstimator;
use scene_core::{scene::summarize, CategoryMap, Detection, RgbImage, ScalarField};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{config::PipelineConfig, error::AppError, oracles::Oracles};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timing {
    pub depth_ms: u64,
    pub segmentation_ms: u64,
    pub pointcloud_ms: u64,
    pub total_ms: u64,
}

/// Everything recorded about one generation; also the free-form part of the
/// wire header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation_id: Option<String>,
    pub prompt: String,
    /// `standard` or `panorama`
    pub mode: String,
    pub width: usize,
    pub height: usize,
    pub point_count: usize,
    pub projection: Projection,
    pub stride: usize,
    pub fusion_strategy: Strategy,
    pub extracted_keywords: CategoryKeywords,
    pub segments_detected: Vec<String>,
    pub timing: Timing,
}

const RESERVED_KEYS: [&str; 4] = ["width", "height", "point_count", "projection"];

impl GenerationMetadata {
    pub fn wire_metadata(&self) -> Result<WireMetadata, AppError> {
        let mut extra = match serde_json::to_value(self)? {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        for key in RESERVED_KEYS {
            extra.remove(key);
        }
        Ok(WireMetadata {
            width: self.width,
            height: self.height,
            point_count: self.point_count,
            projection: self.projection,
            extra,
        })
    }
}

fn request_mode(projection: Projection) -> &'static str {
    match projection {
        Projection::Planar => "standard",
        Projection::Equirectangular => "panorama",
    }
}

#[derive(Debug, Clone, Default)]
pub struct Request {
    pub prompt: String,
    /// Category hints for the prompted labeler
    pub keywords: CategoryKeywords,
}

#[derive(Debug, Clone)]
pub struct Generation {
    pub image: RgbImage,
    pub depth: ScalarField,
    pub categories: CategoryMap,
    pub detections: Vec<Detection>,
    pub cloud: PackedCloud,
    pub metadata: GenerationMetadata,
}

impl Generation {
    pub fn wire(&self) -> Result<Vec<u8>, AppError> {
        let metadata = self.metadata.wire_metadata()?;
        Ok(encode_wire(&metadata, &self.cloud.bytes)?)
    }
}

fn timed<T>(f: impl FnOnce() -> T) -> (T, Duration) {
    let start = Instant::now();
    let value = f();
    (value, start.elapsed())
}

fn millis(duration: Duration) -> u64 {
    duration.as_millis().try_into().unwrap_or(u64::MAX)
}

/// Image → depth field and category map → packed cloud.
pub struct Pipeline<'a> {
    oracles: &'a Oracles,
    estimator: TiledEstimator,
    fusion: CategoryFusion,
    packer: PointCloudPacker,
}

impl<'a> Pipeline<'a> {
    pub fn new(config: &PipelineConfig, oracles: &'a Oracles) -> Result<Self, AppError> {
        Ok(Self {
            oracles,
            estimator: TiledEstimator::new(config.tiling)?,
            fusion: CategoryFusion::new(config.fusion),
            packer: PointCloudPacker::new(config.projection, config.stride),
        })
    }

    pub fn run(&self, image: RgbImage, request: &Request) -> Result<Generation, AppError> {
        let start = Instant::now();
        let (width, height) = (image.width() as usize, image.height() as usize);

        log::info!(
            "start depth estimation and category fusion ({}x{})...",
            width,
            height
        );
        let oracles = self.oracles.fusion();
        let estimate = || timed(|| self.estimator.estimate(&image, &self.oracles.depth));
        let fuse = || timed(|| self.fusion.fuse(&image, &request.keywords, oracles));
        let ((depth, depth_time), (fusion, fusion_time)) = rayon::join(estimate, fuse);
        let depth = depth?;
        let fusion = fusion?;
        log::info!("Finish depth estimation in {:?}", depth_time);
        log::info!("Finish category fusion in {:?}", fusion_time);

        log::info!("start packing...");
        let (cloud, pack_time) = timed(|| self.packer.pack(&image, &depth, &fusion.categories));
        log::info!("Finish packing in {:?}", pack_time);

        let segments_detected = summarize(&fusion.detections);
        for segment in &segments_detected {
            log::debug!("segment: {segment}");
        }

        let metadata = GenerationMetadata {
            generation_id: None,
            prompt: request.prompt.clone(),
            mode: request_mode(cloud.projection).to_string(),
            width,
            height,
            point_count: cloud.point_count,
            projection: cloud.projection,
            stride: self.packer.stride().get(),
            fusion_strategy: fusion.strategy,
            extracted_keywords: request.keywords.clone(),
            segments_detected,
            timing: Timing {
                depth_ms: millis(depth_time),
                segmentation_ms: millis(fusion_time),
                pointcloud_ms: millis(pack_time),
                total_ms: millis(start.elapsed()),
            },
        };

        Ok(Generation {
            image,
            depth,
            categories: fusion.categories,
            detections: fusion.detections,
            cloud,
            metadata,
        })
    }
}

/// Write the wire payload to `path`, or its chunks as JSON lines next to it
/// when the payload exceeds the transport limit. Returns the written path.
pub fn write_output(
    path: &Path,
    generation: &Generation,
    config: &PipelineConfig,
) -> Result<PathBuf, AppError> {
    let wire = generation.wire()?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    if !needs_chunking(wire.len(), config.transport_limit) {
        fs::write(path, &wire)?;
        log::info!("write {} wire bytes: {:?}", wire.len(), path);
        return Ok(path.to_path_buf());
    }

    let header = serde_json::to_value(generation.metadata.wire_metadata()?)?;
    let chunks = chunk_payload(&wire, header, config.chunk_size)?;
    let path = path.with_extension("chunks.jsonl");
    let mut writer = BufWriter::new(File::create(&path)?);
    for chunk in &chunks {
        serde_json::to_writer(&mut writer, chunk)?;
        writeln!(writer)?;
    }
    writer.flush()?;
    log::info!("write {} chunks: {:?}", chunks.len(), path);
    Ok(path)
}
