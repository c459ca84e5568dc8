//! Groundsift CLI - bare-earth DTM extraction from LiDAR surface models

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use groundsift_algorithms::classification::{
    classify_ground, classify_non_ground, fill_inside_buildings, GroundParams, NonGroundParams,
};
use groundsift_core::io::{read_class_tiff, read_height_tiff, write_class_tiff, write_height_tiff};
use groundsift_core::Raster;

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "groundsift")]
#[command(author, version, about = "Bare-earth DTM extraction and object classification", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show information about a height raster
    Info {
        /// Input raster file
        input: PathBuf,
        /// Height units per metre when reading float rasters
        #[arg(long, default_value = "10.0")]
        scale: f64,
    },
    /// Derive a bare-earth DTM from a DSM
    Dtm {
        /// Input DSM file
        input: PathBuf,
        /// Output DTM file
        output: PathBuf,
        /// Also write the 0/1 non-ground mask here
        #[arg(long)]
        labels: Option<PathBuf>,
        /// Boundary stencil stride in pixels (default: about 3 m on the ground)
        #[arg(long)]
        edge_resolution: Option<usize>,
        /// Minimum object height step, in height units
        #[arg(long, default_value = "10")]
        dz: u16,
        /// Number of label-and-remove iterations
        #[arg(long, default_value = "5")]
        iterations: usize,
        /// Height units per metre when reading float rasters
        #[arg(long, default_value = "10.0")]
        scale: f64,
    },
    /// Full pipeline: DSM to DTM plus cleaned non-ground object mask
    Classify {
        /// Input DSM file
        input: PathBuf,
        /// Output object mask file (0 = ground, 1 = object)
        output: PathBuf,
        /// Also write the DTM here
        #[arg(long)]
        dtm: Option<PathBuf>,
        /// Boundary stencil stride in pixels
        #[arg(long)]
        edge_resolution: Option<usize>,
        /// Minimum object height step, in height units
        #[arg(long, default_value = "10")]
        dz: u16,
        /// Minimum height above terrain, in height units
        #[arg(long, default_value = "20")]
        agl: u16,
        /// Minimum object footprint, in square metres
        #[arg(long, default_value = "50.0")]
        min_area: f64,
        /// Number of label-and-remove iterations
        #[arg(long, default_value = "5")]
        iterations: usize,
        /// Height units per metre when reading float rasters
        #[arg(long, default_value = "10.0")]
        scale: f64,
    },
    /// Reclassify vegetation regions fully enclosed by building pixels
    FillBuildings {
        /// Input class raster (ASPRS LAS classes)
        input: PathBuf,
        /// Output class raster
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber).context("setting tracing subscriber")?;

    match cli.command {
        Commands::Info { input, scale } => run_info(&input, scale),
        Commands::Dtm {
            input,
            output,
            labels,
            edge_resolution,
            dz,
            iterations,
            scale,
        } => run_dtm(&input, &output, labels.as_deref(), edge_resolution, dz, iterations, scale),
        Commands::Classify {
            input,
            output,
            dtm,
            edge_resolution,
            dz,
            agl,
            min_area,
            iterations,
            scale,
        } => run_classify(
            &input,
            &output,
            dtm.as_deref(),
            edge_resolution,
            dz,
            agl,
            min_area,
            iterations,
            scale,
        ),
        Commands::FillBuildings { input, output } => run_fill_buildings(&input, &output),
    }
}

fn spinner(message: &'static str) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner} {msg} [{elapsed}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    bar.set_message(message);
    bar.enable_steady_tick(std::time::Duration::from_millis(120));
    bar
}

fn ground_params(gsd: f64, edge_resolution: Option<usize>, dz: u16, iterations: usize) -> GroundParams {
    let mut params = GroundParams::for_gsd(gsd);
    if let Some(stride) = edge_resolution {
        params.edge_resolution = stride;
    }
    params.dz = dz;
    params.iterations = iterations;
    params
}

fn run_info(input: &std::path::Path, scale: f64) -> Result<()> {
    let raster = read_height_tiff(input, scale)
        .with_context(|| format!("reading {}", input.display()))?;

    let (rows, cols) = raster.shape();
    let (min_x, min_y, max_x, max_y) = raster.transform().bounds(cols, rows);
    let voids = raster.data().iter().filter(|&&v| v == 0).count();
    let max = raster.data().iter().copied().max().unwrap_or(0);

    println!("File:    {}", input.display());
    println!("Size:    {} cols x {} rows", cols, rows);
    println!("GSD:     {} m/pixel", raster.gsd());
    println!("Bounds:  ({:.2}, {:.2}) - ({:.2}, {:.2})", min_x, min_y, max_x, max_y);
    println!("Voids:   {} of {} cells", voids, rows * cols);
    println!("Max:     {} height units", max);

    Ok(())
}

fn run_dtm(
    input: &std::path::Path,
    output: &std::path::Path,
    labels_out: Option<&std::path::Path>,
    edge_resolution: Option<usize>,
    dz: u16,
    iterations: usize,
    scale: f64,
) -> Result<()> {
    let start = Instant::now();
    let dsm = read_height_tiff(input, scale)
        .with_context(|| format!("reading {}", input.display()))?;
    info!(rows = dsm.rows(), cols = dsm.cols(), gsd = dsm.gsd(), "loaded DSM");

    let params = ground_params(dsm.gsd(), edge_resolution, dz, iterations);
    info!(
        edge_resolution = params.edge_resolution,
        dz = params.dz,
        iterations = params.iterations,
        "classifying ground"
    );

    let bar = spinner("extracting bare earth");
    let result = classify_ground(&dsm, &params).context("ground classification failed")?;
    bar.finish_and_clear();

    write_height_tiff(&result.dtm, output)
        .with_context(|| format!("writing {}", output.display()))?;
    if let Some(path) = labels_out {
        write_class_tiff(&label_mask(&result.labels), path)
            .with_context(|| format!("writing {}", path.display()))?;
    }

    info!(elapsed = ?start.elapsed(), "done");
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn run_classify(
    input: &std::path::Path,
    output: &std::path::Path,
    dtm_out: Option<&std::path::Path>,
    edge_resolution: Option<usize>,
    dz: u16,
    agl: u16,
    min_area: f64,
    iterations: usize,
    scale: f64,
) -> Result<()> {
    let start = Instant::now();
    let dsm = read_height_tiff(input, scale)
        .with_context(|| format!("reading {}", input.display()))?;
    info!(rows = dsm.rows(), cols = dsm.cols(), gsd = dsm.gsd(), "loaded DSM");

    let params = ground_params(dsm.gsd(), edge_resolution, dz, iterations);
    let bar = spinner("extracting bare earth");
    let result = classify_ground(&dsm, &params).context("ground classification failed")?;
    bar.finish_and_clear();

    let nonground = NonGroundParams { dz, agl, min_area };
    let bar = spinner("cleaning object mask");
    let mut labels = result.labels;
    classify_non_ground(&dsm, &result.dtm, &mut labels, &nonground)
        .context("non-ground classification failed")?;
    bar.finish_and_clear();

    let objects = labels.data().iter().filter(|&&v| v != 0).count();
    info!(objects, "object pixels in final mask");

    write_class_tiff(&label_mask(&labels), output)
        .with_context(|| format!("writing {}", output.display()))?;
    if let Some(path) = dtm_out {
        write_height_tiff(&result.dtm, path)
            .with_context(|| format!("writing {}", path.display()))?;
    }

    info!(elapsed = ?start.elapsed(), "done");
    Ok(())
}

fn run_fill_buildings(input: &std::path::Path, output: &std::path::Path) -> Result<()> {
    let start = Instant::now();
    let mut classes = read_class_tiff(input)
        .with_context(|| format!("reading {}", input.display()))?;

    let before = count_class(&classes, groundsift_algorithms::classification::LAS_BUILDING);
    fill_inside_buildings(&mut classes);
    let after = count_class(&classes, groundsift_algorithms::classification::LAS_BUILDING);
    info!(filled = after - before, "vegetation pixels reclassified");

    write_class_tiff(&classes, output)
        .with_context(|| format!("writing {}", output.display()))?;

    info!(elapsed = ?start.elapsed(), "done");
    Ok(())
}

fn label_mask(labels: &Raster<u32>) -> Raster<u8> {
    let (rows, cols) = labels.shape();
    let mut mask: Raster<u8> = labels.with_same_meta(rows, cols);
    for row in 0..rows {
        for col in 0..cols {
            if unsafe { labels.get_unchecked(row, col) } != 0 {
                unsafe { mask.set_unchecked(row, col, 1) };
            }
        }
    }
    mask
}

fn count_class(classes: &Raster<u8>, class: u8) -> usize {
    classes.data().iter().filter(|&&v| v == class).count()
}
