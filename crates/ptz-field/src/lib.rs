//! Facade crate for the `ptz-field-*` workspace.
//!
//! This crate provides:
//! - re-exports of the field model (`ptz_field::core`) and the camera engine
//!   (`ptz_field::camera`)
//! - JSON report builders shared by the `ptz-field` binary
//! - logging setup for binaries
//!
//! ## Quickstart
//!
//! ```no_run
//! use ptz_field::camera::RigConfig;
//! use ptz_field::report;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let rig = RigConfig::load_json("rig.json")?;
//! let camera = rig.build_camera("1")?;
//! let table = report::landmark_report(&camera);
//! println!("{}", serde_json::to_string_pretty(&table)?);
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - `ptz_field::core`: field dimensions, landmarks, lines and intersections.
//! - `ptz_field::camera`: calibration, world/device transforms, boundary
//!   adjustment, servo steps, self-check and config loading.
//! - `ptz_field::report`: serializable views for tooling.

pub use ptz_field_camera as camera;
pub use ptz_field_core as core;

pub use ptz_field_camera::{Camera, CameraId, CheckCalibrationParams, RigConfig};
pub use ptz_field_core::{Field, Landmark};

pub mod report;

/// Install the process-wide logger for a binary.
///
/// With the `tracing` feature a `tracing` subscriber is installed and
/// `RUST_LOG` picks the level; otherwise `verbosity` (the `-v` count) does.
#[cfg(not(feature = "tracing"))]
pub fn init_logging(verbosity: u8) {
    let level = ptz_field_core::level_from_verbosity(verbosity);
    if let Err(e) = ptz_field_core::init_with_level(level) {
        eprintln!("logger already installed: {e}");
    }
}

#[cfg(feature = "tracing")]
pub fn init_logging(_verbosity: u8) {
    ptz_field_core::init_tracing(false);
}
