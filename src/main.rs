//! postdecode - Australian postcode map
//!
//! Commands:
//!   prepare   Build postdecode.json, scribbles.geojson and postcodes.bin
//!   query     Apply one selection and print the resulting frame
//!   session   Interactive selection loop on stdin
//!   locate    Look up a postcode centroid in the binary index

use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::LevelFilter;

use postdecode::config::{self, Paths, RenderConfig, Variant};
use postdecode::controller::Controller;
use postdecode::dataset;
use postdecode::postcode_index;
use postdecode::prepare::{self, PrepareOptions};
use postdecode::session;
use postdecode::surface::{Format, Surface};
use postdecode::DEFAULT_SHAPE_KEY;

#[derive(Parser, Debug)]
#[clap(name = "postdecode", version, about = "Australian postcode map")]
struct Cli {
    #[clap(subcommand)]
    command: Commands,

    #[clap(long, short, global = true, default_value = "info")]
    log_level: String,

    #[clap(long, global = true, help = "INI config file (default ~/.config/postdecode/config.ini)")]
    config: Option<PathBuf>,

    #[clap(long, global = true, default_value = "normalized", value_parser = parse_variant)]
    variant: Variant,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Join postcodes against postal-area shapes and write derived data
    Prepare {
        #[clap(long, help = "Postcode/locality CSV")]
        postcodes: PathBuf,
        #[clap(long, help = "Postal-area GeoJSON feature collection")]
        shapes: PathBuf,
        #[clap(long, default_value = ".")]
        out_dir: PathBuf,
        #[clap(long, default_value = DEFAULT_SHAPE_KEY)]
        shape_key: String,
    },
    /// Apply one selection and print the frame
    Query {
        prefix: String,
        #[clap(long, help = "Dataset file (default postdecode.json, or postcodes.csv for legacy)")]
        data: Option<PathBuf>,
        #[clap(long, help = "Disable fit-to-selection")]
        no_fit: bool,
        #[clap(long, default_value = "text")]
        output: Format,
    },
    /// Interactive selection loop reading stdin
    Session {
        #[clap(long, help = "Dataset file (default postdecode.json, or postcodes.csv for legacy)")]
        data: Option<PathBuf>,
        #[clap(long, default_value = "text")]
        output: Format,
    },
    /// Look up a postcode centroid in the binary index
    Locate {
        postcode: String,
        #[clap(long, default_value = prepare::INDEX_FILE)]
        index: PathBuf,
    },
}

fn parse_variant(s: &str) -> std::result::Result<Variant, String> {
    s.parse()
        .map_err(|_| format!("unknown variant '{}' (legacy|normalized)", s))
}

fn init_logging(level: &str) {
    let filter = level.parse().unwrap_or(LevelFilter::Info);
    env_logger::Builder::new()
        .filter_level(filter)
        .parse_default_env()
        .format_timestamp(None)
        .init();
}

fn load_render_config(cli: &Cli, paths: Option<&Paths>) -> Result<RenderConfig> {
    let path = match (&cli.config, paths) {
        (Some(path), _) => path.clone(),
        (None, Some(paths)) => paths.config_file.clone(),
        (None, None) => return Ok(RenderConfig::preset(cli.variant)),
    };
    config::load_config(&path, cli.variant)
        .with_context(|| format!("loading config {}", path.display()))
}

/// `--data`, or the default file for the configured format.
fn data_path(data: Option<&Path>, config: &RenderConfig) -> PathBuf {
    data.map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(dataset::default_path(config.data_format)))
}

fn main() {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    if let Err(e) = run(&cli) {
        eprintln!("postdecode: {:#}", e);
        process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    let paths = match Paths::init() {
        Ok(p) => Some(p),
        Err(e) => {
            log::warn!("[config] {}; using built-in defaults", e);
            None
        }
    };

    match &cli.command {
        Commands::Prepare {
            postcodes,
            shapes,
            out_dir,
            shape_key,
        } => cmd_prepare(PrepareOptions {
            postcodes: postcodes.clone(),
            shapes: shapes.clone(),
            out_dir: out_dir.clone(),
            shape_key: shape_key.clone(),
        }),
        Commands::Query {
            prefix,
            data,
            no_fit,
            output,
        } => {
            let mut config = load_render_config(cli, paths.as_ref())?;
            if *no_fit {
                config.fit_enabled = false;
            }
            let data = data_path(data.as_deref(), &config);
            cmd_query(prefix, &data, config, *output)
        }
        Commands::Session { data, output } => {
            let config = load_render_config(cli, paths.as_ref())?;
            let data = data_path(data.as_deref(), &config);
            cmd_session(&data, config, *output)
        }
        Commands::Locate { postcode, index } => cmd_locate(postcode, index),
    }
}

fn cmd_prepare(opts: PrepareOptions) -> Result<()> {
    let summary = prepare::run(&opts).context("preprocessing failed")?;
    println!(
        "{} postcodes from {} shapes, {} scribble segments -> {}",
        summary.postcodes,
        summary.shapes,
        summary.segments,
        opts.out_dir.display()
    );
    Ok(())
}

fn cmd_query(prefix: &str, data: &Path, config: RenderConfig, output: Format) -> Result<()> {
    let points = dataset::load(data, config.data_format)?;
    let mut controller = Controller::new(&points, config);
    let mut surface = Surface::stdout(output);
    let frame = controller.set_selection(prefix);
    surface.apply(&frame)?;
    Ok(())
}

fn cmd_session(data: &Path, config: RenderConfig, output: Format) -> Result<()> {
    let points = dataset::load(data, config.data_format)?;
    let mut controller = Controller::new(&points, config);
    let mut surface = Surface::stdout(output);
    log::info!(
        "[session] {} points, {} output; type digits, '<', 'fit', 'quit'",
        points.len(),
        surface.backend_name()
    );

    let stdin = std::io::stdin();
    let frames = session::run(&mut controller, &mut surface, stdin.lock())?;
    log::debug!("[session] {} frames applied", frames);
    Ok(())
}

fn cmd_locate(postcode: &str, index: &Path) -> Result<()> {
    let digits = postcode.chars().all(|c| c.is_ascii_digit());
    if postcode.len() != postdecode::POSTCODE_LEN || !digits {
        anyhow::bail!("invalid postcode '{}': must be 4 digits", postcode);
    }

    match postcode_index::lookup(index, postcode)? {
        Some((lon, lat)) => {
            println!("{} -> {:.4}, {:.4}", postcode, lon, lat);
            Ok(())
        }
        None => anyhow::bail!("postcode {} not found in {}", postcode, index.display()),
    }
}
