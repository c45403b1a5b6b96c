//! On-disk store of finished generations: `<data_dir>/generations/<uuid>/`.
use std::{
    fs::{self, File},
    io::{BufReader, BufWriter, Write as _},
    path::{Path, PathBuf},
};

use image::GrayImage;
use scene_core::{Category, CategoryMap, RgbImage, ScalarField};
use uuid::Uuid;

use crate::{error::AppError, pipeline::GenerationMetadata};

/// The only files served out of a generation directory.
pub const ASSET_NAMES: [&str; 4] = ["image.png", "depth.png", "segments.png", "metadata.json"];

const PALETTE: [[u8; 3]; Category::COUNT] = [
    [220, 50, 50],
    [50, 180, 50],
    [100, 180, 255],
    [180, 140, 60],
    [160, 100, 200],
    [128, 128, 128],
];

fn generation_dir(data_dir: &Path, id: &str) -> PathBuf {
    data_dir.join("generations").join(id)
}

fn depth_image(field: &ScalarField) -> Result<GrayImage, AppError> {
    let pixels = field
        .data
        .iter()
        .map(|v| (v.clamp(0.0, 1.0) * 255.0) as u8)
        .collect();
    let mismatch = AppError::Render {
        width: field.width,
        height: field.height,
        actual: field.data.len(),
    };
    let (width, height) = (field.width as u32, field.height as u32);
    GrayImage::from_raw(width, height, pixels).ok_or(mismatch)
}

fn segment_image(categories: &CategoryMap) -> Result<RgbImage, AppError> {
    let pixels = categories
        .as_ids()
        .iter()
        .flat_map(|&id| PALETTE[Category::from_id(id).id() as usize])
        .collect();
    let mismatch = AppError::Render {
        width: categories.width,
        height: categories.height,
        actual: categories.as_ids().len(),
    };
    let (width, height) = (categories.width as u32, categories.height as u32);
    RgbImage::from_raw(width, height, pixels).ok_or(mismatch)
}

/// Write the source image, renders of the depth field and category map, and
/// the metadata under a fresh id. `metadata.generation_id` is set to that id.
pub fn save_generation(
    data_dir: &Path,
    image: &RgbImage,
    depth: &ScalarField,
    categories: &CategoryMap,
    metadata: &mut GenerationMetadata,
) -> Result<String, AppError> {
    let id = Uuid::new_v4().to_string();
    let dir = generation_dir(data_dir, &id);
    fs::create_dir_all(&dir)?;

    image.save(dir.join("image.png"))?;
    depth_image(depth)?.save(dir.join("depth.png"))?;
    segment_image(categories)?.save(dir.join("segments.png"))?;

    metadata.generation_id = Some(id.clone());
    let mut writer = BufWriter::new(File::create(dir.join("metadata.json"))?);
    serde_json::to_writer_pretty(&mut writer, metadata)?;
    writer.flush()?;

    log::info!("saved generation {} to {:?}", id, dir);
    Ok(id)
}

/// Metadata of a stored generation, `None` when there is no such generation.
pub fn load_generation(data_dir: &Path, id: &str) -> Result<Option<GenerationMetadata>, AppError> {
    let Some(path) = asset_path(data_dir, id, "metadata.json") else {
        return Ok(None);
    };
    if !path.is_file() {
        return Ok(None);
    }
    let metadata = serde_json::from_reader(BufReader::new(File::open(path)?))?;
    Ok(Some(metadata))
}

/// Path of one asset of a generation. Unknown names and ids that are not
/// UUIDs give `None`.
pub fn asset_path(data_dir: &Path, id: &str, name: &str) -> Option<PathBuf> {
    if !ASSET_NAMES.contains(&name) || Uuid::parse_str(id).is_err() {
        return None;
    }
    Some(generation_dir(data_dir, id).join(name))
}

#[cfg(test)]
mod tests {
    use category_fusion::Strategy;
    use cloud_packer::Projection;

    use super::*;
    use crate::pipeline::Timing;

    fn metadata() -> GenerationMetadata {
        GenerationMetadata {
            generation_id: None,
            prompt: "a quiet harbor".to_string(),
            mode: "standard".to_string(),
            width: 4,
            height: 2,
            point_count: 8,
            projection: Projection::Planar,
            stride: 1,
            fusion_strategy: Strategy::LabelMap,
            extracted_keywords: [(Category::HighSky, vec!["sky".to_string()])]
                .into_iter()
                .collect(),
            segments_detected: vec!["sky→cat2(50.0%)".to_string()],
            timing: Timing::default(),
        }
    }

    #[test]
    fn saved_generations_load_back() {
        let dir = tempfile::tempdir().unwrap();
        let image = RgbImage::new(4, 2);
        let depth = ScalarField::from_fn(4, 2, |x, _| x as f32 / 3.0);
        let categories = CategoryMap::from_ids(4, 2, vec![2, 2, 2, 2, 0, 1, 3, 9]).unwrap();
        let mut meta = metadata();

        let id = save_generation(dir.path(), &image, &depth, &categories, &mut meta).unwrap();
        assert_eq!(meta.generation_id.as_deref(), Some(id.as_str()));
        for name in ASSET_NAMES {
            assert!(
                asset_path(dir.path(), &id, name).unwrap().is_file(),
                "{name}"
            );
        }

        let loaded = load_generation(dir.path(), &id).unwrap().unwrap();
        assert_eq!(loaded, meta);

        let depth_png = image::open(asset_path(dir.path(), &id, "depth.png").unwrap())
            .unwrap()
            .to_luma8();
        assert_eq!(depth_png.get_pixel(0, 0).0, [0]);
        assert_eq!(depth_png.get_pixel(3, 0).0, [255]);

        let segments = image::open(asset_path(dir.path(), &id, "segments.png").unwrap())
            .unwrap()
            .to_rgb8();
        assert_eq!(segments.get_pixel(0, 0).0, [100, 180, 255]);
        assert_eq!(segments.get_pixel(0, 1).0, [220, 50, 50]);
        // out-of-range ids render as LOW_AMBIENT
        assert_eq!(segments.get_pixel(3, 1).0, [128, 128, 128]);
    }

    #[test]
    fn unknown_generations_and_assets() {
        let dir = tempfile::tempdir().unwrap();
        let id = Uuid::new_v4().to_string();
        assert!(load_generation(dir.path(), &id).unwrap().is_none());
        assert!(load_generation(dir.path(), "../../etc").unwrap().is_none());
        assert!(asset_path(dir.path(), &id, "secrets.txt").is_none());
        assert!(asset_path(dir.path(), "..", "image.png").is_none());
        assert_eq!(
            asset_path(dir.path(), &id, "image.png").unwrap(),
            dir.path().join("generations").join(&id).join("image.png")
        );
    }
}
