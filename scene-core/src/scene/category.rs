use std::fmt;

use serde::{Deserialize, Serialize};

use super::mask::Mask;
use crate::{error::SceneError, resample};

/// Coarse semantic bucket driving the audio-reactive renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
#[repr(u8)]
pub enum Category {
    BassSubject = 0,
    MidOrganic = 1,
    HighSky = 2,
    BeatGround = 3,
    MidStructure = 4,
    #[default]
    LowAmbient = 5,
}

impl Category {
    pub const COUNT: usize = 6;

    pub const ALL: [Category; Self::COUNT] = [
        Category::BassSubject,
        Category::MidOrganic,
        Category::HighSky,
        Category::BeatGround,
        Category::MidStructure,
        Category::LowAmbient,
    ];

    pub fn id(self) -> u8 {
        self as u8
    }

    /// Ids outside 0..=5 fall back to `LowAmbient`.
    pub fn from_id(id: u8) -> Self {
        match id {
            0 => Category::BassSubject,
            1 => Category::MidOrganic,
            2 => Category::HighSky,
            3 => Category::BeatGround,
            4 => Category::MidStructure,
            _ => Category::LowAmbient,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Category::BassSubject => "BASS_SUBJECT",
            Category::MidOrganic => "MID_ORGANIC",
            Category::HighSky => "HIGH_SKY",
            Category::BeatGround => "BEAT_GROUND",
            Category::MidStructure => "MID_STRUCTURE",
            Category::LowAmbient => "LOW_AMBIENT",
        }
    }
}

impl From<u8> for Category {
    fn from(id: u8) -> Self {
        Category::from_id(id)
    }
}

impl From<Category> for u8 {
    fn from(category: Category) -> Self {
        category.id()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Dense per-pixel category ids, row-major. Every cell holds an id in 0..=5.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryMap {
    pub width: usize,
    pub height: usize,
    data: Vec<u8>,
}

impl CategoryMap {
    /// A map with every pixel set to `LowAmbient`.
    pub fn new(width: usize, height: usize) -> Self {
        Self::filled(width, height, Category::LowAmbient)
    }

    pub fn filled(width: usize, height: usize, category: Category) -> Self {
        Self {
            width,
            height,
            data: vec![category.id(); width * height],
        }
    }

    /// Build from raw ids; out-of-range ids are clamped to `LowAmbient`.
    pub fn from_ids(width: usize, height: usize, ids: Vec<u8>) -> Result<Self, SceneError> {
        if ids.len() != width * height {
            return Err(SceneError::ShapeMismatch {
                width,
                height,
                actual: ids.len(),
            });
        }
        let data = ids
            .into_iter()
            .map(|id| Category::from_id(id).id())
            .collect();
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> Category {
        Category::from_id(self.data[y * self.width + x])
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, category: Category) {
        self.data[y * self.width + x] = category.id();
    }

    pub fn as_ids(&self) -> &[u8] {
        &self.data
    }

    pub fn row(&self, y: usize) -> &[u8] {
        let start = y * self.width;
        &self.data[start..start + self.width]
    }

    /// Overwrite every pixel inside `mask` with `category`. Returns the number
    /// of pixels written.
    pub fn paint(&mut self, mask: &Mask, category: Category) -> usize {
        debug_assert_eq!(mask.dimensions(), self.dimensions());
        let id = category.id();
        let mut painted = 0;
        for (cell, &inside) in self.data.iter_mut().zip(mask.as_slice()) {
            if inside {
                *cell = id;
                painted += 1;
            }
        }
        painted
    }

    /// Per-category pixel counts restricted to `mask`.
    pub fn histogram_within(&self, mask: &Mask) -> [usize; Category::COUNT] {
        let mut counts = [0usize; Category::COUNT];
        for (&id, &inside) in self.data.iter().zip(mask.as_slice()) {
            if inside {
                counts[Category::from_id(id).id() as usize] += 1;
            }
        }
        counts
    }

    /// Most frequent category inside `mask`; ties go to the lowest id.
    /// `None` when the mask selects no pixels.
    pub fn dominant_within(&self, mask: &Mask) -> Option<Category> {
        let counts = self.histogram_within(mask);
        let (best, &count) = counts
            .iter()
            .enumerate()
            .rev()
            .max_by_key(|&(_, count)| count)?;
        (count > 0).then(|| Category::from_id(best as u8))
    }

    /// Nearest-neighbour resize; never introduces ids that are not already present.
    pub fn resize_nearest(&self, width: usize, height: usize) -> Self {
        if self.data.is_empty() {
            return Self::new(width, height);
        }
        Self {
            width,
            height,
            data: resample::nearest(&self.data, self.width, self.height, width, height),
        }
    }
}
