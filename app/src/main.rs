mod config;
mod error;
mod oracles;
mod pipeline;
mod storage;

use std::io::Write;
use std::{
    fs,
    num::NonZeroUsize,
    path::{Path, PathBuf},
};

use category_fusion::{parse_category_keywords, CategoryKeywords, CoarseSource, Strategy};
use chrono::Local;
use clap::Parser;
use cloud_packer::Projection;
use env_logger::Builder;
use log::LevelFilter;

use config::{Overrides, PipelineConfig};
use error::AppError;
use oracles::{DepthSource, ManifestOracles, Oracles};
use pipeline::{write_output, Pipeline, Request};
use storage::{asset_path, load_generation, save_generation, ASSET_NAMES};

#[derive(Parser, Debug)]
#[command(
    name = "Point Cloud Generator",
    about = "A tool for turning an image into a categorized 3D point cloud",
    author = "MIERUNE Inc.",
    version = "0.0.1"
)]
struct Cli {
    #[arg(short, long, value_name = "FILE", required_unless_present = "inspect")]
    image: Option<PathBuf>,

    #[arg(short, long, value_name = "FILE", required_unless_present = "inspect")]
    output: Option<PathBuf>,

    /// Print the stored metadata of a generation and exit
    #[arg(long, value_name = "ID")]
    inspect: Option<String>,

    #[arg(short, long, value_name = "FILE", env = "SV_CONFIG")]
    config: Option<PathBuf>,

    /// standard | panorama
    #[arg(short, long, env = "SV_MODE")]
    mode: Option<Projection>,

    #[arg(long, env = "SV_STRIDE")]
    stride: Option<NonZeroUsize>,

    /// label_map | hybrid
    #[arg(long, env = "SV_SEG_MODEL")]
    seg_strategy: Option<Strategy>,

    /// Coarse category source for the hybrid strategy: label_map | prompted
    #[arg(long, env = "SV_COARSE")]
    coarse: Option<CoarseSource>,

    #[arg(long, default_value_t = DepthSource::Luminance, env = "SV_DEPTH_ORACLE")]
    depth_oracle: DepthSource,

    /// JSON manifest of precomputed labeler, instance and prompt masks
    #[arg(long, value_name = "FILE", env = "SV_ORACLES")]
    oracles: Option<PathBuf>,

    /// JSON object of category id → keywords for the prompted labeler
    #[arg(short, long, value_name = "FILE")]
    keywords: Option<PathBuf>,

    #[arg(long)]
    chunk_size: Option<usize>,

    #[arg(long)]
    transport_limit: Option<usize>,

    #[arg(long, value_name = "DIR", env = "SV_DATA_DIR")]
    save_dir: Option<PathBuf>,

    #[arg(long)]
    no_save: bool,

    #[arg(short, long, default_value = "")]
    prompt: String,

    #[arg(short, long)]
    verbose: bool,
}

fn init_logger(verbose: bool) {
    let mut builder = Builder::new();
    builder
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] - {}",
                Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .filter(
            None,
            if verbose {
                LevelFilter::Debug
            } else {
                LevelFilter::Info
            },
        );
    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }
    builder.init();
}

fn read_keywords(path: Option<&Path>) -> Result<CategoryKeywords, AppError> {
    match path {
        Some(path) => Ok(parse_category_keywords(&fs::read_to_string(path)?)?),
        None => Ok(CategoryKeywords::new()),
    }
}

fn inspect(data_dir: &Path, id: &str) -> Result<(), AppError> {
    let metadata =
        load_generation(data_dir, id)?.ok_or_else(|| AppError::NotFound(id.to_string()))?;
    println!("{}", serde_json::to_string_pretty(&metadata)?);
    for name in ASSET_NAMES {
        if let Some(path) = asset_path(data_dir, id, name) {
            log::info!("{}: {:?}", name, path);
        }
    }
    Ok(())
}

fn run(args: Cli) -> Result<(), AppError> {
    let config = PipelineConfig::load(args.config.as_deref())?.apply(Overrides {
        projection: args.mode,
        stride: args.stride,
        strategy: args.seg_strategy,
        coarse: args.coarse,
        chunk_size: args.chunk_size,
        transport_limit: args.transport_limit,
        data_dir: args.save_dir,
    });
    config.validate()?;

    if let Some(id) = args.inspect.as_deref() {
        return inspect(&config.data_dir, id);
    }
    let (Some(image_path), Some(output)) = (args.image, args.output) else {
        return Err(AppError::Usage(
            "--image and --output are required".to_string(),
        ));
    };
    log::info!("input image: {:?}", image_path);
    log::info!("output file: {:?}", output);
    log::info!("projection: {}", config.projection);
    log::info!("stride: {}", config.stride);
    log::info!(
        "fusion: {} (coarse: {})",
        config.fusion.strategy,
        config.fusion.coarse
    );
    log::info!("depth oracle: {}", args.depth_oracle);

    let start = std::time::Instant::now();

    let keywords = read_keywords(args.keywords.as_deref())?;
    let manifest = args
        .oracles
        .as_deref()
        .map(ManifestOracles::load)
        .transpose()?;
    let oracles = Oracles::new(args.depth_oracle, manifest);

    log::info!("start loading image...");
    let start_local = std::time::Instant::now();
    let image = image::open(&image_path)?.to_rgb8();
    log::info!(
        "Finish loading {}x{} image in {:?}",
        image.width(),
        image.height(),
        start_local.elapsed()
    );

    let pipeline = Pipeline::new(&config, &oracles)?;
    let request = Request {
        prompt: args.prompt,
        keywords,
    };
    let mut generation = pipeline.run(image, &request)?;
    log::info!(
        "{} points, {} regions detected",
        generation.cloud.point_count,
        generation.detections.len()
    );

    if !args.no_save {
        save_generation(
            &config.data_dir,
            &generation.image,
            &generation.depth,
            &generation.categories,
            &mut generation.metadata,
        )?;
    }

    write_output(&output, &generation, &config)?;

    log::info!("Elapsed: {:?}", start.elapsed());
    log::info!("Finish processing");
    Ok(())
}

fn main() {
    let args = Cli::parse();
    init_logger(args.verbose);

    if let Err(e) = run(args) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}
