use serde::{Deserialize, Serialize};

use crate::error::TilingError;

pub const DEFAULT_TILE_SIZE: usize = 512;
pub const DEFAULT_OVERLAP: usize = 64;
pub const DEFAULT_MIN_TILE: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TilingOptions {
    /// Native input size of the oracle; larger images are tiled
    pub tile_size: usize,
    /// Band shared by neighbouring tiles, also the feathering width
    pub overlap: usize,
    /// Tiles narrower or shorter than this are skipped
    pub min_tile: usize,
}

impl Default for TilingOptions {
    fn default() -> Self {
        Self {
            tile_size: DEFAULT_TILE_SIZE,
            overlap: DEFAULT_OVERLAP,
            min_tile: DEFAULT_MIN_TILE,
        }
    }
}

impl TilingOptions {
    pub fn validate(&self) -> Result<(), TilingError> {
        if self.tile_size == 0 {
            return Err(TilingError::InvalidOptions(
                "tile_size must be positive".to_string(),
            ));
        }
        if self.overlap >= self.tile_size {
            return Err(TilingError::InvalidOptions(format!(
                "overlap ({}) must be smaller than tile_size ({})",
                self.overlap, self.tile_size
            )));
        }
        Ok(())
    }

    pub fn step(&self) -> usize {
        self.tile_size.saturating_sub(self.overlap)
    }

    /// Whether an image fits the oracle in one pass.
    pub fn fits_single_pass(&self, width: usize, height: usize) -> bool {
        width <= self.tile_size && height <= self.tile_size
    }
}

/// Half-open pixel rectangle `[x1, x2) × [y1, y2)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tile {
    pub x1: usize,
    pub y1: usize,
    pub x2: usize,
    pub y2: usize,
}

impl Tile {
    pub fn width(&self) -> usize {
        self.x2 - self.x1
    }

    pub fn height(&self) -> usize {
        self.y2 - self.y1
    }
}

/// Overlapping tiles covering a `width × height` image, row-major from the
/// top-left. Edge tiles are clipped to the image; tiles below `min_tile` on
/// either axis are dropped (the previous tile already covers them).
pub fn plan_tiles(width: usize, height: usize, options: &TilingOptions) -> Vec<Tile> {
    let step = options.step().max(1);
    let mut tiles = Vec::new();

    for y1 in (0..height).step_by(step) {
        for x1 in (0..width).step_by(step) {
            let tile = Tile {
                x1,
                y1,
                x2: (x1 + options.tile_size).min(width),
                y2: (y1 + options.tile_size).min(height),
            };
            if tile.width() < options.min_tile || tile.height() < options.min_tile {
                continue;
            }
            tiles.push(tile);
        }
    }

    tiles
}
