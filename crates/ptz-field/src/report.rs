//! Serializable views of engine results for tooling.

use std::collections::BTreeMap;

use ptz_field_camera::{Camera, CalibrationSpread, CheckCalibrationParams, SelfCheckError};
use ptz_field_core::{Field, Landmark};
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Pan/tilt rounded for display.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoundedPanTilt {
    pub pan: f64,
    pub tilt: f64,
}

#[inline]
pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Reachable landmarks keyed by their 1-based number, angles rounded to
/// two decimals.
#[cfg_attr(feature = "tracing", instrument(level = "info", skip(camera), fields(camera = %camera.id())))]
pub fn landmark_report(camera: &Camera) -> BTreeMap<usize, RoundedPanTilt> {
    let table = camera.landmark_pan_tilt_table();
    let report: BTreeMap<usize, RoundedPanTilt> = table
        .iter()
        .filter(|row| row.in_range)
        .map(|row| {
            (
                row.number,
                RoundedPanTilt {
                    pan: round2(row.pan),
                    tilt: round2(row.tilt),
                },
            )
        })
        .collect();
    log::info!(
        "camera {}: {} of {} landmarks within device range",
        camera.id(),
        report.len(),
        table.len()
    );
    report
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LandmarkPosition {
    pub number: usize,
    pub landmark: Landmark,
    pub x: f64,
    pub y: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldReport {
    pub width: f64,
    pub height: f64,
    pub landmarks: Vec<LandmarkPosition>,
}

pub fn field_report(field: &Field) -> FieldReport {
    FieldReport {
        width: field.width(),
        height: field.height(),
        landmarks: field
            .named_landmarks()
            .map(|(landmark, p)| LandmarkPosition {
                number: landmark.number(),
                landmark,
                x: p.x,
                y: p.y,
            })
            .collect(),
    }
}

/// Run the self-check with a fixed seed, or the thread RNG when `seed` is
/// `None`.
pub fn check_calibration(
    camera: &Camera,
    params: &CheckCalibrationParams,
    seed: Option<u64>,
) -> Result<CalibrationSpread, SelfCheckError> {
    match seed {
        Some(seed) => camera.check_calibration_seeded(params, seed),
        None => camera.check_calibration(params, &mut rand::rng()),
    }
}
