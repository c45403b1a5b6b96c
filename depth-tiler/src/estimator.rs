use std::time::Instant;

use image::imageops;
use scene_core::{
    oracle::{DepthHandle, DepthOracle, OracleError},
    RgbImage, ScalarField,
};

use crate::{
    error::TilingError,
    feather::FeatherMask,
    tile::{plan_tiles, Tile, TilingOptions},
};

/// Floor applied to the blend weights before dividing.
const WEIGHT_FLOOR: f32 = 1e-6;

/// Produces one normalized depth field for a whole image.
#[derive(Debug, Clone)]
pub struct TiledEstimator {
    options: TilingOptions,
}

impl Default for TiledEstimator {
    fn default() -> Self {
        Self {
            options: TilingOptions::default(),
        }
    }
}

impl TiledEstimator {
    pub fn new(options: TilingOptions) -> Result<Self, TilingError> {
        options.validate()?;
        Ok(Self { options })
    }

    pub fn options(&self) -> &TilingOptions {
        &self.options
    }

    /// Estimate through a shared handle. The oracle stays locked for the
    /// whole estimate so tiles of one image are never interleaved with
    /// another caller's.
    pub fn estimate(
        &self,
        image: &RgbImage,
        oracle: &DepthHandle,
    ) -> Result<ScalarField, TilingError> {
        oracle.with(|oracle| self.estimate_with(image, oracle.as_mut()))
    }

    /// Estimate with exclusive access to `oracle`.
    ///
    /// Returns a field with the image's dimensions and values in [0, 1]
    /// (1 = nearest). Any oracle failure aborts the estimate.
    pub fn estimate_with(
        &self,
        image: &RgbImage,
        oracle: &mut dyn DepthOracle,
    ) -> Result<ScalarField, TilingError> {
        let (width, height) = (image.width() as usize, image.height() as usize);
        if width == 0 || height == 0 {
            return Ok(ScalarField::new(width, height));
        }

        if self.options.fits_single_pass(width, height) {
            return self.single_pass(image, oracle);
        }

        let tiles = plan_tiles(width, height, &self.options);
        if tiles.is_empty() {
            log::warn!(
                "depth: no viable {}px tiles for {}x{} image, using a single pass",
                self.options.tile_size,
                width,
                height
            );
            return self.single_pass(image, oracle);
        }

        self.blend_tiles(image, &tiles, oracle)
    }

    fn single_pass(
        &self,
        image: &RgbImage,
        oracle: &mut dyn DepthOracle,
    ) -> Result<ScalarField, TilingError> {
        let (width, height) = (image.width() as usize, image.height() as usize);
        let raw = infer_checked(oracle, image)?;
        let mut field = raw.resize_bilinear(width, height);
        field.normalize();
        Ok(field)
    }

    fn blend_tiles(
        &self,
        image: &RgbImage,
        tiles: &[Tile],
        oracle: &mut dyn DepthOracle,
    ) -> Result<ScalarField, TilingError> {
        let (width, height) = (image.width() as usize, image.height() as usize);
        log::info!(
            "depth: processing {} tiles for {}x{} image",
            tiles.len(),
            width,
            height
        );
        let start = Instant::now();

        let mut accumulated = vec![0.0f32; width * height];
        let mut weights = vec![0.0f32; width * height];

        // one tile at a time: the oracle does not tolerate concurrent calls
        for (index, tile) in tiles.iter().enumerate() {
            let (tw, th) = (tile.width(), tile.height());
            let crop =
                imageops::crop_imm(image, tile.x1 as u32, tile.y1 as u32, tw as u32, th as u32)
                    .to_image();
            let depth = infer_checked(oracle, &crop)?.resize_bilinear(tw, th);
            let mask = FeatherMask::new(th, tw, self.options.overlap);

            for ty in 0..th {
                let offset = (tile.y1 + ty) * width + tile.x1;
                let values = depth.row(ty);
                for (tx, &value) in values.iter().enumerate() {
                    let weight = mask.weight(tx, ty);
                    accumulated[offset + tx] += value * weight;
                    weights[offset + tx] += weight;
                }
            }
            log::debug!(
                "depth: tile {}/{} {:?} blended",
                index + 1,
                tiles.len(),
                tile
            );
        }

        let data = accumulated
            .iter()
            .zip(&weights)
            .map(|(value, weight)| value / weight.max(WEIGHT_FLOOR))
            .collect();
        let mut field = ScalarField {
            width,
            height,
            data,
        };
        field.normalize();

        log::info!(
            "depth: blended {} tiles in {:?}",
            tiles.len(),
            start.elapsed()
        );
        Ok(field)
    }
}

fn infer_checked(
    oracle: &mut dyn DepthOracle,
    image: &RgbImage,
) -> Result<ScalarField, OracleError> {
    let field = oracle.infer(image)?;
    if field.is_empty() || field.data.len() != field.width * field.height {
        return Err(OracleError::failed(
            "depth",
            format!(
                "malformed {}x{} field with {} values",
                field.width,
                field.height,
                field.data.len()
            ),
        ));
    }
    Ok(field)
}
