use approx::assert_abs_diff_eq;
use depth_tiler::{plan_tiles, TiledEstimator, TilingOptions};
use image::Rgb;
use rand::{rngs::StdRng, Rng, SeedableRng};
use scene_core::{oracle::OracleError, RgbImage, ScalarField};

fn random_image(rng: &mut StdRng, width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |_, _| Rgb([rng.gen(), rng.gen(), rng.gen()]))
}

/// Noisy oracle answering at a fixed coarse resolution with an arbitrary range.
fn coarse_noise(seed: u64) -> impl FnMut(&RgbImage) -> Result<ScalarField, OracleError> + Send {
    let mut rng = StdRng::seed_from_u64(seed);
    move |_| {
        let data = (0..24 * 16)
            .map(|_| rng.gen_range(-50.0f32..300.0))
            .collect();
        Ok(ScalarField {
            width: 24,
            height: 16,
            data,
        })
    }
}

#[test]
fn random_inputs_stay_normalized() {
    let mut rng = StdRng::seed_from_u64(7);
    let estimator = TiledEstimator::default();
    for (width, height) in [(17, 9), (512, 512), (513, 200), (1100, 700), (640, 1300)] {
        let image = random_image(&mut rng, width, height);
        let mut oracle = coarse_noise(width as u64 * 31 + height as u64);
        let field = estimator.estimate_with(&image, &mut oracle).unwrap();

        assert_eq!(field.dimensions(), (width as usize, height as usize));
        let (min, max) = field.min_max().unwrap();
        assert!(field.data.iter().all(|v| v.is_finite()));
        assert_abs_diff_eq!(min, 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(max, 1.0, epsilon = 1e-6);
    }
}

#[test]
fn oracle_runs_once_per_planned_tile() {
    let options = TilingOptions {
        tile_size: 128,
        overlap: 16,
        min_tile: 16,
    };
    let estimator = TiledEstimator::new(options).unwrap();
    let image = random_image(&mut StdRng::seed_from_u64(1), 300, 260);

    let mut sizes = Vec::new();
    let mut oracle = |tile: &RgbImage| -> Result<ScalarField, OracleError> {
        sizes.push((tile.width() as usize, tile.height() as usize));
        Ok(ScalarField::filled(4, 4, sizes.len() as f32))
    };
    estimator.estimate_with(&image, &mut oracle).unwrap();

    let planned: Vec<_> = plan_tiles(300, 260, &options)
        .iter()
        .map(|t| (t.width(), t.height()))
        .collect();
    assert_eq!(sizes, planned);
}

#[test]
fn invalid_options_are_rejected() {
    let options = TilingOptions {
        tile_size: 32,
        overlap: 40,
        min_tile: 8,
    };
    assert!(TiledEstimator::new(options).is_err());
}
