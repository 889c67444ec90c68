//! `ptz-field`: calibration diagnostics for PTZ cameras on a field.
//!
//! Every subcommand prints one JSON document on stdout. Failures print
//! `{"error": "..."}` and exit with a non-zero status.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};
use ptz_field::camera::{ConfigError, SelfCheckError};
use ptz_field::core::FieldError;
use ptz_field::{report, Camera, CheckCalibrationParams, Field, RigConfig};
use serde_json::{json, Value};

#[derive(thiserror::Error, Debug)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Field(#[from] FieldError),
    #[error(transparent)]
    SelfCheck(#[from] SelfCheckError),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

#[derive(Parser)]
#[command(name = "ptz-field")]
#[command(about = "Landmark lookup and calibration checks for PTZ cameras on a field")]
#[command(version)]
struct Cli {
    /// Operational overlay (camera id → mode/role/status) merged into the config.
    #[arg(long, global = true)]
    overlay: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Pan/tilt of every landmark the camera can reach.
    Landmarks {
        /// Rig config (JSON).
        #[arg(long)]
        config: PathBuf,

        /// Camera id, e.g. `1` or `camera1`.
        #[arg(long)]
        camera: String,

        /// List all landmarks with an `in_range` flag instead of only the
        /// reachable ones.
        #[arg(long)]
        all: bool,
    },
    /// Spread of the calibration refitted from random landmark pairs.
    CheckCalibration {
        #[arg(long)]
        config: PathBuf,

        #[arg(long)]
        camera: String,

        #[arg(long, default_value_t = 100)]
        trials: usize,

        /// Draw pairs from the first N calibration readings only.
        #[arg(long)]
        pool: Option<usize>,

        /// Seed for reproducible pair selection.
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Landmark positions of a field.
    Field {
        #[arg(long, default_value_t = 105.0)]
        width: f64,

        #[arg(long, default_value_t = 68.0)]
        height: f64,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    ptz_field::init_logging(cli.verbose);

    match run(&cli) {
        Ok(value) => {
            println!("{value}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("{e}");
            println!("{}", json!({ "error": e.to_string() }));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<Value, CliError> {
    match &cli.command {
        Commands::Landmarks {
            config,
            camera,
            all,
        } => {
            let cam = load_camera(config, cli.overlay.as_deref(), camera)?;
            if *all {
                Ok(serde_json::to_value(cam.landmark_pan_tilt_table())?)
            } else {
                Ok(serde_json::to_value(report::landmark_report(&cam))?)
            }
        }
        Commands::CheckCalibration {
            config,
            camera,
            trials,
            pool,
            seed,
        } => {
            let cam = load_camera(config, cli.overlay.as_deref(), camera)?;
            let params = CheckCalibrationParams {
                trials: *trials,
                pool_size: *pool,
            };
            let spread = report::check_calibration(&cam, &params, *seed)?;
            Ok(serde_json::to_value(spread)?)
        }
        Commands::Field { width, height } => {
            let field = Field::new(*width, *height)?;
            Ok(serde_json::to_value(report::field_report(&field))?)
        }
    }
}

fn load_camera(config: &Path, overlay: Option<&Path>, camera: &str) -> Result<Camera, CliError> {
    let rig = RigConfig::load_with_overlay(config, overlay)?;
    Ok(rig.build_camera(camera)?)
}
