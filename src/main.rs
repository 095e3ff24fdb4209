use clap::{Parser, Subcommand};
use reefmap::imaging::{self, ImageProcessOptions};
use reefmap::{batch, config, geo, output, sites};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "reefmap")]
#[command(about = "Dive-site map clustering and upload image normalization")]
#[command(long_about = "\
Dive-site map clustering and upload image normalization

Clustering reads a JSON array of dive sites:

  [{\"id\": \"liberty\", \"name\": \"USAT Liberty\", \"latitude\": -8.27,
    \"longitude\": 115.59, \"location\": \"Tulamben, Bali, Indonesia\"}]

Zoom tiers (km between a cluster's seed and its members):
  zoom <= 2  → 2000 km
  zoom <= 3  → 1500 km
  zoom <  5  → 1000 km
  zoom >= 5  → no clustering

Image normalization keeps the detected format family (PNG, WebP, AVIF;
everything else becomes JPEG), applies EXIF orientation and scales down to
fit the bounding box. By default files are rewritten in place.

Set RUST_LOG=info (or debug) for diagnostics.
Run 'reefmap gen-config' to generate a documented reefmap.toml.")]
#[command(version)]
struct Cli {
    /// Directory holding reefmap.toml
    #[arg(long, default_value = ".", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Group dive sites into regional clusters for a zoom level
    Cluster {
        /// JSON file with an array of dive sites
        #[arg(long)]
        sites: PathBuf,
        /// Map zoom level
        #[arg(long)]
        zoom: f64,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the bounding box of a set of dive sites
    Bounds {
        /// JSON file with an array of dive sites
        #[arg(long)]
        sites: PathBuf,
    },
    /// Normalize one or more images
    Optimize {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        #[arg(long)]
        max_width: Option<u32>,
        #[arg(long)]
        max_height: Option<u32>,
        /// Base quality, clamped to 40-90
        #[arg(long)]
        quality: Option<u32>,
        /// Output path (single input only; default overwrites the input)
        #[arg(long)]
        output: Option<PathBuf>,
        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },
    /// Normalize every image under a directory, in place
    Batch {
        dir: PathBuf,
        /// Ignore the ledger and re-normalize every image
        #[arg(long)]
        no_cache: bool,
    },
    /// Print a stock reefmap.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    match cli.command {
        Command::Cluster {
            sites: sites_path,
            zoom,
            json,
        } => {
            let sites = sites::load_sites(&sites_path)?;
            let result = geo::cluster_sites(&sites, zoom);
            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                output::print_cluster_output(&result, zoom);
            }
        }
        Command::Bounds { sites: sites_path } => {
            let sites = sites::load_sites(&sites_path)?;
            output::print_bounds_output(&geo::region_bounds(&sites));
        }
        Command::Optimize {
            files,
            max_width,
            max_height,
            quality,
            output: output_path,
            json,
        } => {
            if output_path.is_some() && files.len() > 1 {
                return Err("--output needs exactly one input file".into());
            }
            let app_config = config::load_config(&cli.config)?;
            let defaults = app_config.images.to_options();
            let options = ImageProcessOptions {
                max_width: max_width.or(defaults.max_width),
                max_height: max_height.or(defaults.max_height),
                quality: quality.or(defaults.quality),
                output_path,
            };

            let mut results = Vec::new();
            for file in &files {
                let result = imaging::optimize_image(file, &options)?;
                if !json {
                    output::print_optimize_result(&result);
                }
                results.push(result);
            }
            if json {
                println!("{}", serde_json::to_string_pretty(&results)?);
            }
        }
        Command::Batch { dir, no_cache } => {
            let app_config = config::load_config(&cli.config)?;
            init_thread_pool(&app_config.processing);
            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    for line in output::format_batch_event(&event) {
                        println!("{}", line);
                    }
                }
            });
            let summary = batch::batch_normalize(
                &dir,
                &app_config.images.to_options(),
                !no_cache,
                Some(tx),
            )?;
            printer.join().map_err(|_| "output thread panicked")?;
            output::print_batch_summary(&summary);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores: the user can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
