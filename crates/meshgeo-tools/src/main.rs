//! `mesh2geo`: converts Wavefront OBJ files into `.geo` documents.
//!
//! ```text
//! mesh2geo scene.obj props/*.obj --out-dir export --tolerance 0.0001 --prune
//! ```
//!
//! Every object of every input is exported as `<object>_<index>.geo`. A
//! failing input or object is reported and the remaining ones still run;
//! the exit status is non-zero when anything failed.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{ArgAction, Parser, ValueEnum};
use log::LevelFilter;
use meshgeo_core::{ConvertOptions, WeldStrategy};
use meshgeo_io::{export_objects, FileSink, ObjReader, SceneObject};
use thiserror::Error;

#[derive(Parser, Debug)]
#[command(name = "mesh2geo", version, about = "Convert OBJ meshes to .geo documents", long_about = None)]
struct Cli {
    /// OBJ files to convert
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Directory receiving the .geo files
    #[arg(short, long)]
    out_dir: PathBuf,

    /// Weld positions closer than this on every axis
    #[arg(long, conflicts_with = "naive")]
    tolerance: Option<f32>,

    /// One point per source vertex, no welding
    #[arg(long)]
    naive: bool,

    #[arg(long, value_enum)]
    strategy: Option<StrategyArg>,

    /// Apply object transforms before export. OBJ files carry no object
    /// transforms, so OBJ objects are always exported in local space.
    #[arg(long)]
    world_space: bool,

    /// Also write shadowCastingMode per primitive
    #[arg(long)]
    primitive_shadow_mode: bool,

    /// JSON file with conversion options; flags override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Delete .geo files in the output directory that this run did not write
    #[arg(long)]
    prune: bool,

    /// More output (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Errors only
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum StrategyArg {
    Linear,
    SpatialHash,
}

impl From<StrategyArg> for WeldStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Linear => WeldStrategy::LinearScan,
            StrategyArg::SpatialHash => WeldStrategy::SpatialHash,
        }
    }
}

#[derive(Debug, Error)]
enum CliError {
    #[error("cannot read config {}: {source}", .path.display())]
    ConfigRead { path: PathBuf, source: std::io::Error },

    #[error("invalid config {}: {source}", .path.display())]
    ConfigParse { path: PathBuf, source: serde_json::Error },

    #[error("{0}")]
    Schema(meshgeo_core::GeoError),

    #[error("cannot use output directory {}: {source}", .path.display())]
    OutputDir { path: PathBuf, source: std::io::Error },

    #[error("pruning stale files failed: {0}")]
    Prune(std::io::Error),
}

impl Cli {
    fn level(&self) -> LevelFilter {
        match (self.quiet, self.verbose) {
            (true, _) => LevelFilter::Error,
            (false, 0) => LevelFilter::Info,
            (false, 1) => LevelFilter::Debug,
            (false, _) => LevelFilter::Trace,
        }
    }

    /// Config file first, then flags.
    fn options(&self) -> Result<ConvertOptions, CliError> {
        let mut options = match &self.config {
            Some(path) => load_options(path)?,
            None => ConvertOptions::default(),
        };
        if self.naive {
            options = options.naive();
        }
        if let Some(tolerance) = self.tolerance {
            options = options.with_tolerance(tolerance);
        }
        if let Some(strategy) = self.strategy {
            options = options.with_weld_strategy(strategy.into());
        }
        if self.world_space {
            options = options.with_world_space(true);
        }
        if self.primitive_shadow_mode {
            options = options.with_primitive_shadow_mode(true);
        }
        options.material_schema.validate().map_err(CliError::Schema)?;
        Ok(options)
    }
}

fn load_options(path: &Path) -> Result<ConvertOptions, CliError> {
    let text = fs::read_to_string(path).map_err(|source| CliError::ConfigRead { path: path.to_path_buf(), source })?;
    serde_json::from_str(&text).map_err(|source| CliError::ConfigParse { path: path.to_path_buf(), source })
}

/// Reads every input, skipping (and counting) the ones that fail.
fn read_inputs(inputs: &[PathBuf]) -> (Vec<SceneObject>, usize) {
    let mut objects = Vec::new();
    let mut failed = 0;
    for input in inputs {
        match ObjReader::open(input).and_then(|mut reader| reader.read_objects()) {
            Ok(read) => {
                log::debug!("{}: {} objects", input.display(), read.len());
                objects.extend(read);
            }
            Err(e) => {
                log::error!("{}: {}", input.display(), e);
                failed += 1;
            }
        }
    }
    (objects, failed)
}

/// Returns whether every input and object succeeded.
fn run(cli: &Cli) -> Result<bool, CliError> {
    let options = cli.options()?;
    let (objects, failed_inputs) = read_inputs(&cli.inputs);

    let mut sink = FileSink::new(&cli.out_dir).map_err(|source| CliError::OutputDir { path: cli.out_dir.clone(), source })?;
    let report = export_objects(&objects, &options, &mut sink);

    if cli.prune {
        let removed = sink.prune_stale().map_err(CliError::Prune)?;
        if !removed.is_empty() {
            log::info!("removed {} stale files", removed.len());
        }
    }
    Ok(failed_inputs == 0 && report.is_success())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(cli.level().as_str())).init();

    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            log::error!("{e}");
            ExitCode::from(2)
        }
    }
}
