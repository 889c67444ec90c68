//! Visual-servo step: turn the subject's offset in frame into a pan/tilt
//! correction.

use serde::{Deserialize, Serialize};

use super::Camera;
use crate::ptz::{BoundingBox, Ptz};

/// Where in the frame the subject should sit, and how errors are shaped.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServoParams {
    /// Normalized horizontal target for the box center.
    pub target_x: f64,
    /// Normalized vertical target for the box bottom edge.
    pub target_y: f64,
    /// Quadratically compress errors and lower the vertical target when
    /// zoomed out.
    pub smooth: bool,
    /// Largest downward shift of the vertical target, at zoom 0.
    pub max_shift: f64,
}

impl Default for ServoParams {
    fn default() -> Self {
        Self {
            target_x: 0.5,
            target_y: 0.5,
            smooth: false,
            max_shift: 0.1,
        }
    }
}

/// One servo correction and the errors it was computed from.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ServoStep {
    pub ptz: Ptz,
    pub error_x: f64,
    pub error_y: f64,
}

/// Errors of the last applied servo step.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ServoState {
    pub last_error_x: f64,
    pub last_error_y: f64,
}

/// Soft clip: `e` is limited to `[-range, range]`, then mapped to
/// `sign(e)·range·(|e|/range)²`. A non-positive range yields 0.
pub fn smooth_error(error: f64, range: f64) -> f64 {
    if !(range > 0.0) {
        return 0.0;
    }
    let e = error.clamp(-range, range);
    e.signum() * range * (e.abs() / range).powi(2)
}

impl Camera {
    /// Correction that moves the subject toward the target point.
    ///
    /// The horizontal error uses the box center, the vertical one the box
    /// bottom edge. Errors are scaled by the field of view at the current
    /// zoom; zoom is left unchanged.
    pub fn servo_step(&self, current: Ptz, target: &BoundingBox, params: &ServoParams) -> ServoStep {
        let raw_x = target.center_x() - params.target_x;
        let (error_x, error_y) = if params.smooth {
            let zmax = self.zoom_range.max();
            let zoom_ratio = if zmax != 0.0 { current.zoom / zmax } else { 0.0 };
            let shift = params.max_shift * (1.0 - zoom_ratio);
            let raw_y = target.bottom() - (params.target_y + shift);
            (
                smooth_error(raw_x, params.target_x),
                smooth_error(raw_y, params.target_y - shift),
            )
        } else {
            (raw_x, target.bottom() - params.target_y)
        };

        let pan_fov = self.lut.pan_fov(current.zoom);
        let tilt_fov = self.lut.tilt_fov(current.zoom);
        ServoStep {
            ptz: Ptz::new(
                current.pan + error_x * pan_fov,
                current.tilt - error_y * tilt_fov,
                current.zoom,
            ),
            error_x,
            error_y,
        }
    }

    /// [`Camera::servo_step`], recording its errors as the servo state.
    pub fn transform_ptz(&mut self, current: Ptz, target: &BoundingBox, params: &ServoParams) -> Ptz {
        let step = self.servo_step(current, target, params);
        self.servo = ServoState {
            last_error_x: step.error_x,
            last_error_y: step.error_y,
        };
        log::trace!(
            "camera {}: servo error ({:.4}, {:.4}) -> pan {:.3} tilt {:.3}",
            self.id,
            step.error_x,
            step.error_y,
            step.ptz.pan,
            step.ptz.tilt
        );
        step.ptz
    }

    #[inline]
    pub fn servo_state(&self) -> ServoState {
        self.servo
    }
}
