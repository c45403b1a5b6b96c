//! Owned single-channel f32 field in row-major layout.
//!
//! Produced by the depth estimator with values in [0, 1], where 1 is the
//! nearest surface and 0 the farthest.
use crate::{error::SceneError, resample};

#[derive(Debug, Clone, PartialEq)]
pub struct ScalarField {
    /// Field width in pixels
    pub width: usize,
    /// Field height in pixels
    pub height: usize,
    /// Backing storage in row-major order
    pub data: Vec<f32>,
}

impl ScalarField {
    /// Construct a zero-initialized field of size `width × height`.
    pub fn new(width: usize, height: usize) -> Self {
        Self::filled(width, height, 0.0)
    }

    pub fn filled(width: usize, height: usize, value: f32) -> Self {
        Self {
            width,
            height,
            data: vec![value; width * height],
        }
    }

    pub fn from_vec(width: usize, height: usize, data: Vec<f32>) -> Result<Self, SceneError> {
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

    pub fn from_fn(width: usize, height: usize, f: impl Fn(usize, usize) -> f32) -> Self {
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

    #[inline]
    pub fn idx(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.data[self.idx(x, y)]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, v: f32) {
        let i = self.idx(x, y);
        self.data[i] = v;
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn row(&self, y: usize) -> &[f32] {
        let start = y * self.width;
        &self.data[start..start + self.width]
    }

    /// Minimum and maximum over the finite values, `None` if there are none.
    pub fn min_max(&self) -> Option<(f32, f32)> {
        self.data
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }

    /// Min-max normalize into [0, 1].
    ///
    /// Non-finite samples are mapped to 0. A flat field (max == min) has no
    /// range to stretch and is reset to all zeros.
    pub fn normalize(&mut self) {
        let Some((lo, hi)) = self.min_max() else {
            self.data.iter_mut().for_each(|v| *v = 0.0);
            return;
        };
        if hi > lo {
            let inv = 1.0 / (hi - lo);
            for v in self.data.iter_mut() {
                *v = if v.is_finite() {
                    ((*v - lo) * inv).clamp(0.0, 1.0)
                } else {
                    0.0
                };
            }
        } else {
            self.data.iter_mut().for_each(|v| *v = 0.0);
        }
    }

    /// Bilinear resize to `width × height`.
    pub fn resize_bilinear(&self, width: usize, height: usize) -> Self {
        if self.is_empty() {
            return Self::new(width, height);
        }
        Self {
            width,
            height,
            data: resample::bilinear(&self.data, self.width, self.height, width, height),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_vec_rejects_wrong_length() {
        assert!(ScalarField::from_vec(3, 2, vec![0.0; 5]).is_err());
        assert!(ScalarField::from_vec(3, 2, vec![0.0; 6]).is_ok());
    }

    #[test]
    fn normalize_stretches_to_unit_range() {
        let mut field = ScalarField::from_vec(4, 1, vec![2.0, 4.0, 6.0, 10.0]).unwrap();
        field.normalize();
        assert_eq!(field.data, vec![0.0, 0.25, 0.5, 1.0]);
    }

    #[test]
    fn normalize_flat_field_is_zero() {
        let mut field = ScalarField::filled(3, 3, 7.5);
        field.normalize();
        assert!(field.data.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn normalize_drops_non_finite() {
        let mut field =
            ScalarField::from_vec(4, 1, vec![f32::NAN, 1.0, f32::INFINITY, 3.0]).unwrap();
        field.normalize();
        assert_eq!(field.data, vec![0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn resize_keeps_requested_dimensions() {
        let field = ScalarField::from_fn(5, 3, |x, y| (x + y) as f32);
        let resized = field.resize_bilinear(11, 8);
        assert_eq!(resized.dimensions(), (11, 8));
        assert_eq!(resized.data.len(), 88);
    }
}
