//! PTZ camera engine on a calibrated field.
//!
//! A [`Camera`] converts between world points on the pitch and device
//! pan/tilt readings using a two-landmark linear calibration, fences
//! projections to the field boundary, limits commands to the device ranges
//! and computes visual-servo corrections from a tracked bounding box.
//!
//! ```no_run
//! use ptz_field_camera::{CheckCalibrationParams, RigConfig};
//! use ptz_field_core::Landmark;
//!
//! let rig = RigConfig::load_json("rig.json")?;
//! let camera = rig.build_camera("1")?;
//! let center = camera.landmark_pan_tilt(Landmark::CenterSpot);
//! let spread = camera.check_calibration_seeded(&CheckCalibrationParams::default(), 0)?;
//! println!("{center:?} {spread:?}");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod calibration;
mod camera;
mod config;
mod io;
mod lut;
mod ptz;

pub use calibration::{
    bearing_deg, elevation_deg, Axis, CalibrationError, CalibrationFit, CalibrationPoint,
    CalibrationSample,
};
pub use camera::{
    smooth_error, BoundaryAdjustment, CalibrationSpread, Camera, CameraBuilder, CameraError,
    CheckCalibrationParams, DeviceAngles, LandmarkPanTilt, SelfCheckError, ServoParams,
    ServoState, ServoStep, WorldProjection,
};
pub use config::{
    CameraConfig, CameraId, ConfigError, OperationalOverlay, OverlayConfig, RigConfig,
};
pub use io::IoError;
pub use lut::{LensTable, LinearInterp, LutError, ZoomLut};
pub use ptz::{BoundingBox, BoundingBoxError, DeviceRange, PanTilt, Ptz, RangeError};
