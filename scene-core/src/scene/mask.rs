use image::GrayImage;

use crate::{error::SceneError, resample};

/// Dense boolean grid marking the pixels an oracle attributes to one region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mask {
    width: usize,
    height: usize,
    data: Vec<bool>,
}

impl Mask {
    pub fn filled(width: usize, height: usize, value: bool) -> Self {
        Self {
            width,
            height,
            data: vec![value; width * height],
        }
    }

    pub fn from_vec(width: usize, height: usize, data: Vec<bool>) -> Result<Self, SceneError> {
        if data.len() != width * height {
            return Err(SceneError::ShapeMismatch {
                width,
                height,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn from_fn(width: usize, height: usize, f: impl Fn(usize, usize) -> bool) -> Self {
        let mut data = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                data.push(f(x, y));
            }
        }
        Self {
            width,
            height,
            data,
        }
    }

    /// Any non-zero gray level is inside the mask.
    pub fn from_luma(image: &GrayImage) -> Self {
        Self {
            width: image.width() as usize,
            height: image.height() as usize,
            data: image.as_raw().iter().map(|&v| v != 0).collect(),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn as_slice(&self) -> &[bool] {
        &self.data
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> bool {
        self.data[y * self.width + x]
    }

    /// Number of pixels inside the mask.
    pub fn count(&self) -> usize {
        self.data.iter().filter(|&&v| v).count()
    }

    /// Share of the grid covered by the mask, in percent.
    pub fn coverage_pct(&self) -> f32 {
        if self.data.is_empty() {
            return 0.0;
        }
        (self.count() as f64 / self.data.len() as f64 * 100.0) as f32
    }

    pub fn resize_nearest(&self, width: usize, height: usize) -> Self {
        if self.data.is_empty() {
            return Self::filled(width, height, false);
        }
        Self {
            width,
            height,
            data: resample::nearest(&self.data, self.width, self.height, width, height),
        }
    }

    /// Resize only when the dimensions differ.
    pub fn fit_to(self, width: usize, height: usize) -> Self {
        if self.dimensions() == (width, height) {
            self
        } else {
            self.resize_nearest(width, height)
        }
    }
}
