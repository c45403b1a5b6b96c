//! Pipeline configuration: defaults, then an optional JSON file, then CLI flags.
use std::{
    fs,
    num::NonZeroUsize,
    path::{Path, PathBuf},
};

use category_fusion::{CoarseSource, FusionOptions, Strategy};
use cloud_packer::{Projection, DEFAULT_CHUNK_SIZE};
use depth_tiler::TilingOptions;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

pub const DEFAULT_STRIDE: NonZeroUsize = match NonZeroUsize::new(2) {
    Some(stride) => stride,
    None => NonZeroUsize::MIN,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub tiling: TilingOptions,
    pub fusion: FusionOptions,
    pub projection: Projection,
    /// Pixel subsampling step for the point cloud
    pub stride: NonZeroUsize,
    /// Base64 characters per transport chunk
    pub chunk_size: usize,
    /// Wire payloads larger than this many bytes are sent chunked
    pub transport_limit: usize,
    /// Root of the generation store
    pub data_dir: PathBuf,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            tiling: TilingOptions::default(),
            fusion: FusionOptions::default(),
            projection: Projection::default(),
            stride: DEFAULT_STRIDE,
            chunk_size: DEFAULT_CHUNK_SIZE,
            transport_limit: DEFAULT_CHUNK_SIZE,
            data_dir: PathBuf::from("./data"),
        }
    }
}

/// Values given on the command line or through `SV_*` variables.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub projection: Option<Projection>,
    pub stride: Option<NonZeroUsize>,
    pub strategy: Option<Strategy>,
    pub coarse: Option<CoarseSource>,
    pub chunk_size: Option<usize>,
    pub transport_limit: Option<usize>,
    pub data_dir: Option<PathBuf>,
}

impl PipelineConfig {
    pub fn from_file(path: &Path) -> Result<Self, AppError> {
        let text = fs::read_to_string(path)?;
        serde_json::from_str(&text).map_err(|e| AppError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Defaults, overlaid by `path` when given.
    pub fn load(path: Option<&Path>) -> Result<Self, AppError> {
        match path {
            Some(path) => {
                log::info!("loading config: {}", path.display());
                Self::from_file(path)
            }
            None => Ok(Self::default()),
        }
    }

    pub fn apply(mut self, overrides: Overrides) -> Self {
        if let Some(projection) = overrides.projection {
            self.projection = projection;
        }
        if let Some(stride) = overrides.stride {
            self.stride = stride;
        }
        if let Some(strategy) = overrides.strategy {
            self.fusion.strategy = strategy;
        }
        if let Some(coarse) = overrides.coarse {
            self.fusion.coarse = coarse;
        }
        if let Some(chunk_size) = overrides.chunk_size {
            self.chunk_size = chunk_size;
        }
        if let Some(limit) = overrides.transport_limit {
            self.transport_limit = limit;
        }
        if let Some(dir) = overrides.data_dir {
            self.data_dir = dir;
        }
        self
    }

    pub fn validate(&self) -> Result<(), AppError> {
        self.tiling.validate()?;
        if self.chunk_size == 0 {
            return Err(AppError::Transport(
                cloud_packer::TransportError::InvalidChunkSize,
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;

    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "projection": "equirectangular",
                "tiling": {{"tile_size": 256}},
                "fusion": {{"strategy": "hybrid"}}
            }}"#
        )
        .unwrap();

        let config = PipelineConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.projection, Projection::Equirectangular);
        assert_eq!(config.tiling.tile_size, 256);
        assert_eq!(config.tiling.overlap, TilingOptions::default().overlap);
        assert_eq!(config.fusion.strategy, Strategy::Hybrid);
        assert_eq!(config.fusion.coarse, CoarseSource::LabelMap);
        assert_eq!(config.stride, DEFAULT_STRIDE);
        assert_eq!(config.data_dir, PathBuf::from("./data"));
    }

    #[test]
    fn flags_override_file_values() {
        let config = PipelineConfig {
            stride: NonZeroUsize::new(4).unwrap(),
            chunk_size: 100,
            ..Default::default()
        }
        .apply(Overrides {
            stride: NonZeroUsize::new(1),
            strategy: Some(Strategy::Hybrid),
            data_dir: Some(PathBuf::from("/tmp/gen")),
            ..Default::default()
        });
        assert_eq!(config.stride.get(), 1);
        assert_eq!(config.chunk_size, 100);
        assert_eq!(config.fusion.strategy, Strategy::Hybrid);
        assert_eq!(config.data_dir, PathBuf::from("/tmp/gen"));
    }

    #[test]
    fn bad_files_are_reported() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"stride": 0}}"#).unwrap();
        assert!(matches!(
            PipelineConfig::load(Some(file.path())),
            Err(AppError::Config { .. })
        ));

        let config = PipelineConfig {
            chunk_size: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
