//! BAWS CLI - weekly bloom composites and bloom area reports

mod settings;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use baws_algorithms::area::{AreaAggregator, ShapeProfile};
use baws_algorithms::composite::{FileSetSelector, RasterCompositor};
use baws_algorithms::editing::{class_geometry_ids, shape_output_path};
use baws_algorithms::validity::{GeometryValidityFilter, ValidAreaPolicy};
use baws_core::io::{
    read_geotiff, DirectoryLister, GeoJsonIo, GeoTiffIo, GeometrySink, GeometrySource,
};
use baws_core::{FeatureCollection, Raster};

use settings::Settings;

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "baws")]
#[command(author, version, about = "Baltic algal bloom map curation", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show information about a daily or weekly bloom raster
    Info {
        /// Input raster file
        input: PathBuf,
    },
    /// Build the weekly bloom-day composite for the current working date
    Composite {
        /// Settings file (TOML)
        #[arg(short, long)]
        settings: PathBuf,
        /// Output file (default: last daily map with `_daymap_` -> `_weekmap_`)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Report bloom area per class
    Area {
        /// Input polygon layer (GeoJSON)
        input: PathBuf,
        /// Class grouping: daily or weekly
        #[arg(short, long, default_value = "daily")]
        profile: String,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Drop invalid polygons and export the layer in the profile's CRS
    Clean {
        /// Input polygon layer (GeoJSON)
        input: PathBuf,
        /// Output file (default: `{prefix}{date}.geojson` in the production directory)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Settings file providing valid-area thresholds
        #[arg(short, long)]
        settings: Option<PathBuf>,
        /// Class grouping: daily or weekly
        #[arg(short, long, default_value = "daily")]
        profile: String,
        /// Also drop every polygon of these classes
        #[arg(long, value_delimiter = ',')]
        drop_class: Vec<i64>,
    },
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("warning: a global tracing subscriber was already set");
    }
}

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

fn parse_profile(name: &str) -> Result<ShapeProfile> {
    match ShapeProfile::from_name(name) {
        Some(profile) => Ok(profile),
        None => bail!("Unknown profile: {}. Use: daily, weekly", name),
    }
}

fn read_shapes(path: &Path) -> Result<FeatureCollection> {
    let pb = spinner("Reading shapes...");
    let shapes = GeoJsonIo::default()
        .read(path)
        .with_context(|| format!("Failed to read shapes from {}", path.display()))?;
    pb.finish_and_clear();
    info!("Input: {} feature(s)", shapes.len());
    Ok(shapes)
}

fn done(name: &str, path: &Path, elapsed: std::time::Duration) {
    println!("{} saved to: {}", name, path.display());
    println!("  Processing time: {:.2?}", elapsed);
}

// ─── Commands ───────────────────────────────────────────────────────────

fn run_info(input: &Path) -> Result<()> {
    let raster: Raster<u8> = read_geotiff(input).context("Failed to read raster")?;
    let (rows, cols) = raster.shape();
    let (min_x, min_y, max_x, max_y) = raster.bounds();
    let gt = raster.transform();

    println!("File: {}", input.display());
    println!("Dimensions: {} x {} ({} cells)", cols, rows, raster.len());
    println!("Cell size: {} x {}", gt.pixel_width, gt.pixel_height.abs());
    println!("Bounds: ({:.3}, {:.3}) - ({:.3}, {:.3})", min_x, min_y, max_x, max_y);
    match raster.crs() {
        Some(crs) => println!("CRS: {}", crs),
        None => println!("CRS: unknown"),
    }
    if let Some(nodata) = raster.nodata() {
        println!("NoData: {}", nodata);
    }
    println!("Values:");
    for (value, count) in raster.value_counts() {
        println!("  {:>3}: {}", value, count);
    }
    Ok(())
}

fn run_composite(settings_path: &Path, output: Option<PathBuf>) -> Result<()> {
    let settings = Settings::load(settings_path)?;
    let window = settings.window()?;
    let params = settings.selection_params();
    info!(
        "Window: {} day(s) ending {}",
        window.len(),
        window.current()
    );

    let selection = FileSetSelector::new(&DirectoryLister, &params)
        .select(&window)
        .context("Failed to list daily maps")?;
    if selection.current.is_none() {
        warn!(
            "No production map for {} in {}",
            window.current(),
            params.production_dir.display()
        );
    }

    let start = Instant::now();
    let pb = spinner("Compositing...");
    let composite = RasterCompositor::new(&GeoTiffIo, settings.composite_params())
        .composite(&selection.files)
        .context("Failed to build weekly composite")?;
    pb.finish_and_clear();

    let Some(mut composite) = composite else {
        println!("No daily maps found for the window ending {}", window.current());
        return Ok(());
    };
    if let Some(path) = output {
        composite.output_path = path;
    }
    composite.write(&GeoTiffIo).context("Failed to write weekly composite")?;
    let elapsed = start.elapsed();

    println!(
        "Composite of {} of {} day(s)",
        composite.days(),
        window.len()
    );
    done("Weekly composite", &composite.output_path, elapsed);
    Ok(())
}

fn run_area(input: &Path, profile: &str, json: bool) -> Result<()> {
    let profile = parse_profile(profile)?;
    let shapes = read_shapes(input)?;

    let Some(report) = AreaAggregator::new(profile).aggregate(Some(&shapes)) else {
        println!("No shapes loaded");
        return Ok(());
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for (label, km2) in report.iter() {
            println!("{:<20} {:>10.1} km²", label, km2);
        }
    }
    Ok(())
}

fn run_clean(
    input: &Path,
    output: Option<PathBuf>,
    settings_path: Option<&Path>,
    profile: &str,
    drop_class: &[i64],
) -> Result<()> {
    let profile = parse_profile(profile)?;
    let settings = settings_path.map(Settings::load).transpose()?;
    let policy = match &settings {
        Some(s) => s.valid_area_policy()?,
        None => ValidAreaPolicy::new(),
    };
    if policy.is_empty() {
        info!("No valid-area thresholds configured, checking integrity only");
    }

    let output = match (output, &settings) {
        (Some(path), _) => path,
        (None, Some(s)) => shape_output_path(
            &s.production_dir,
            &format!("{}_", s.naming.day_prefix),
            &s.date_token(),
            ".geojson",
        ),
        (None, None) => bail!("Either --output or --settings is required"),
    };

    let start = Instant::now();
    let mut shapes = read_shapes(input)?;

    if !drop_class.is_empty() {
        let ids = class_geometry_ids(&shapes, drop_class);
        let removed = shapes.remove_features(&ids);
        info!("Dropped {} feature(s) of class {:?}", removed, drop_class);
    }

    let removed = GeometryValidityFilter::with_policy(&policy).remove_invalid(&mut shapes);
    println!("Removed {} invalid feature(s), {} kept", removed, shapes.len());

    let pb = spinner("Writing shapes...");
    GeoJsonIo::exporting_to(profile.export_crs())
        .write(&shapes, &output)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    pb.finish_and_clear();

    done("Cleaned layer", &output, start.elapsed());
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match cli.command {
        Commands::Info { input } => run_info(&input),
        Commands::Composite { settings, output } => run_composite(&settings, output),
        Commands::Area {
            input,
            profile,
            json,
        } => run_area(&input, &profile, json),
        Commands::Clean {
            input,
            output,
            settings,
            profile,
            drop_class,
        } => run_clean(&input, output, settings.as_deref(), &profile, &drop_class),
    }
}
