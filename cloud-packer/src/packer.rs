use std::{borrow::Cow, num::NonZeroUsize, time::Instant};

use rayon::prelude::*;
use scene_core::{CategoryMap, RgbImage, ScalarField};

use crate::{
    projection::{Projection, Projector},
    record::{PointRecord, POINT_STRIDE},
};

/// Packed point buffer plus what a reader needs to interpret it.
#[derive(Debug, Clone, PartialEq)]
pub struct PackedCloud {
    /// `point_count * POINT_STRIDE` bytes, row-major scan order
    pub bytes: Vec<u8>,
    pub point_count: usize,
    /// Source image width before subsampling
    pub width: usize,
    /// Source image height before subsampling
    pub height: usize,
    pub projection: Projection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointCloudPacker {
    projection: Projection,
    stride: NonZeroUsize,
}

impl Default for PointCloudPacker {
    fn default() -> Self {
        Self {
            projection: Projection::Planar,
            stride: NonZeroUsize::MIN,
        }
    }
}

impl PointCloudPacker {
    pub fn new(projection: Projection, stride: NonZeroUsize) -> Self {
        Self { projection, stride }
    }

    pub fn projection(&self) -> Projection {
        self.projection
    }

    pub fn stride(&self) -> NonZeroUsize {
        self.stride
    }

    /// Number of points produced for a `width × height` image.
    pub fn point_count(&self, width: usize, height: usize) -> usize {
        let stride = self.stride.get();
        width.div_ceil(stride) * height.div_ceil(stride)
    }

    /// Project every `stride`-th pixel of every `stride`-th row and pack the
    /// results. `field` and `categories` are resized to the image first when
    /// their dimensions differ.
    pub fn pack(
        &self,
        image: &RgbImage,
        field: &ScalarField,
        categories: &CategoryMap,
    ) -> PackedCloud {
        let (width, height) = (image.width() as usize, image.height() as usize);
        let stride = self.stride.get();
        let point_count = self.point_count(width, height);
        let mut bytes = vec![0u8; point_count * POINT_STRIDE];

        if point_count > 0 {
            let start = Instant::now();
            let field = fit_field(field, width, height);
            let categories = fit_categories(categories, width, height);
            let projector = Projector::new(self.projection, width, height);
            let row_bytes = width.div_ceil(stride) * POINT_STRIDE;

            bytes
                .par_chunks_mut(row_bytes)
                .enumerate()
                .for_each(|(row, out)| {
                    let y = row * stride;
                    let depths = field.row(y);
                    let ids = categories.row(y);
                    for (col, buffer) in out.chunks_exact_mut(POINT_STRIDE).enumerate() {
                        let x = col * stride;
                        let pixel = image.get_pixel(x as u32, y as u32);
                        PointRecord::new(projector.position(x, y, depths[x]), pixel.0, ids[x])
                            .write_to(buffer);
                    }
                });

            log::info!(
                "packed {} {} points from {}x{} (stride {}) in {:?}",
                point_count,
                self.projection,
                width,
                height,
                stride,
                start.elapsed()
            );
        }

        PackedCloud {
            bytes,
            point_count,
            width,
            height,
            projection: self.projection,
        }
    }
}

fn fit_field(field: &ScalarField, width: usize, height: usize) -> Cow<'_, ScalarField> {
    if field.dimensions() == (width, height) {
        Cow::Borrowed(field)
    } else {
        log::debug!(
            "resizing {}x{} field to {}x{}",
            field.width,
            field.height,
            width,
            height
        );
        Cow::Owned(field.resize_bilinear(width, height))
    }
}

fn fit_categories(categories: &CategoryMap, width: usize, height: usize) -> Cow<'_, CategoryMap> {
    if categories.dimensions() == (width, height) {
        Cow::Borrowed(categories)
    } else {
        log::debug!(
            "resizing {}x{} category map to {}x{}",
            categories.width,
            categories.height,
            width,
            height
        );
        Cow::Owned(categories.resize_nearest(width, height))
    }
}

#[cfg(test)]
mod tests {
    use image::Rgb;
    use scene_core::Category;

    use super::*;
    use crate::record::decode_points;

    fn stride(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    #[test]
    fn flat_black_scene() {
        let image = RgbImage::new(4, 4);
        let field = ScalarField::filled(4, 4, 1.0);
        let categories = CategoryMap::filled(4, 4, Category::BeatGround);
        let cloud = PointCloudPacker::default().pack(&image, &field, &categories);

        assert_eq!(cloud.point_count, 16);
        assert_eq!(cloud.bytes.len(), 320);
        for point in decode_points(&cloud.bytes).unwrap() {
            assert_eq!(point.color, [0, 0, 0]);
            assert_eq!(point.category, 3);
            assert_eq!(point.position[2], -3.0);
            assert_eq!(point.padding, [0; 4]);
        }
    }

    #[test]
    fn stride_counts() {
        let image = RgbImage::new(7, 5);
        let field = ScalarField::new(7, 5);
        let categories = CategoryMap::new(7, 5);
        for (s, expected) in [(1, 35), (2, 12), (3, 6), (5, 2), (10, 1)] {
            let packer = PointCloudPacker::new(Projection::Planar, stride(s));
            let cloud = packer.pack(&image, &field, &categories);
            assert_eq!(cloud.point_count, expected, "stride {s}");
            assert_eq!(cloud.bytes.len(), expected * POINT_STRIDE);
        }
    }

    #[test]
    fn stride_samples_from_origin() {
        let image = RgbImage::from_fn(5, 3, |x, y| Rgb([x as u8, y as u8, 0]));
        let field = ScalarField::new(5, 3);
        let categories = CategoryMap::new(5, 3);
        let cloud = PointCloudPacker::new(Projection::Planar, stride(2))
            .pack(&image, &field, &categories);
        let colors: Vec<_> = decode_points(&cloud.bytes)
            .unwrap()
            .iter()
            .map(|p| [p.color[0], p.color[1]])
            .collect();
        assert_eq!(
            colors,
            vec![[0, 0], [2, 0], [4, 0], [0, 2], [2, 2], [4, 2]]
        );
    }

    #[test]
    fn mismatched_grids_are_resized() {
        let image = RgbImage::new(8, 6);
        let field = ScalarField::filled(4, 3, 1.0);
        let categories = CategoryMap::filled(2, 2, Category::HighSky);
        let cloud = PointCloudPacker::default().pack(&image, &field, &categories);
        assert_eq!(cloud.point_count, 48);
        let points = decode_points(&cloud.bytes).unwrap();
        assert!(points
            .iter()
            .all(|p| p.category == 2 && p.position[2] == -3.0));
    }

    #[test]
    fn empty_image_packs_nothing() {
        let cloud = PointCloudPacker::default().pack(
            &RgbImage::new(0, 0),
            &ScalarField::new(0, 0),
            &CategoryMap::new(0, 0),
        );
        assert_eq!(cloud.point_count, 0);
        assert!(cloud.bytes.is_empty());
    }
}
