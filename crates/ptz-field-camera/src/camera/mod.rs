//! Calibrated PTZ camera placed on a field.
//!
//! A [`Camera`] is built once from its config record and the shared
//! [`Field`]. Construction fits the linear calibration, builds the zoom
//! lookup tables and selects the boundary lines used for fencing. All
//! per-frame conversions are `&self`; only [`Camera::transform_ptz`] writes
//! the servo state.

mod boundary;
mod self_check;
mod servo;
mod transform;

pub use boundary::BoundaryAdjustment;
pub use self_check::{CalibrationSpread, CheckCalibrationParams, SelfCheckError};
pub use servo::{smooth_error, ServoParams, ServoState, ServoStep};
pub use transform::{DeviceAngles, WorldProjection};

use std::sync::Arc;

use nalgebra::Point2;
use ptz_field_core::{Field, FieldSide, Landmark, Line};
use serde::{Deserialize, Serialize};

use crate::calibration::{CalibrationError, CalibrationFit, CalibrationSample};
use crate::config::CameraId;
use crate::lut::{LensTable, LutError, ZoomLut};
use crate::ptz::{DeviceRange, PanTilt, Ptz, RangeError};

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum CameraError {
    #[error("camera {id}: missing {what}")]
    MissingField { id: CameraId, what: &'static str },
    #[error("camera height must be finite and positive, got {0}")]
    InvalidHeight(f64),
    #[error("camera position ({x}, {y}) is not finite")]
    InvalidPosition { x: f64, y: f64 },
    #[error("zoom multiplier must be finite and positive, got {0}")]
    InvalidMultiplier(f64),
    #[error("calibration failed: {0}")]
    Calibration(#[from] CalibrationError),
    #[error("zoom lookup table: {0}")]
    Lut(#[from] LutError),
    #[error(transparent)]
    Range(#[from] RangeError),
}

/// Device angles of one landmark, with a flag telling whether the device can
/// actually reach them.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LandmarkPanTilt {
    pub landmark: Landmark,
    /// 1-based number used in configs.
    pub number: usize,
    pub pan: f64,
    pub tilt: f64,
    pub in_range: bool,
}

#[derive(Clone, Debug)]
pub struct Camera {
    id: CameraId,
    field: Arc<Field>,
    position: Point2<f64>,
    height: f64,
    pan_range: DeviceRange,
    tilt_range: DeviceRange,
    zoom_range: DeviceRange,
    calibration: CalibrationFit,
    sample: CalibrationSample,
    lut: ZoomLut,
    side_lines: Vec<(FieldSide, Line)>,
    reset_position: Ptz,
    zoom_multiplier: f64,
    servo: ServoState,
}

impl Camera {
    pub fn builder(id: CameraId, field: Arc<Field>) -> CameraBuilder {
        CameraBuilder::new(id, field)
    }

    #[inline]
    pub fn id(&self) -> &CameraId {
        &self.id
    }

    #[inline]
    pub fn field(&self) -> &Field {
        &self.field
    }

    #[inline]
    pub fn position(&self) -> Point2<f64> {
        self.position
    }

    /// Mounting height above the pitch, meters.
    #[inline]
    pub fn height(&self) -> f64 {
        self.height
    }

    #[inline]
    pub fn pan_range(&self) -> DeviceRange {
        self.pan_range
    }

    #[inline]
    pub fn tilt_range(&self) -> DeviceRange {
        self.tilt_range
    }

    #[inline]
    pub fn zoom_range(&self) -> DeviceRange {
        self.zoom_range
    }

    #[inline]
    pub fn calibration(&self) -> &CalibrationFit {
        &self.calibration
    }

    #[inline]
    pub fn calibration_sample(&self) -> &CalibrationSample {
        &self.sample
    }

    #[inline]
    pub fn lut(&self) -> &ZoomLut {
        &self.lut
    }

    /// Boundary lines used for fencing, nearest first.
    #[inline]
    pub fn side_lines(&self) -> &[(FieldSide, Line)] {
        &self.side_lines
    }

    #[inline]
    pub fn reset_position(&self) -> Ptz {
        self.reset_position
    }

    #[inline]
    pub fn zoom_multiplier(&self) -> f64 {
        self.zoom_multiplier
    }

    /// Pan/tilt that points the device at `landmark`.
    pub fn landmark_pan_tilt(&self, landmark: Landmark) -> PanTilt {
        let a = self.xy_to_pt(self.field.landmark(landmark));
        PanTilt::new(a.pan, a.tilt)
    }

    /// Pan/tilt for every landmark, in landmark order.
    pub fn landmark_pan_tilt_table(&self) -> Vec<LandmarkPanTilt> {
        Landmark::ALL
            .iter()
            .map(|&landmark| {
                let PanTilt { pan, tilt } = self.landmark_pan_tilt(landmark);
                LandmarkPanTilt {
                    landmark,
                    number: landmark.number(),
                    pan,
                    tilt,
                    in_range: self.pan_range.contains(pan) && self.tilt_range.contains(tilt),
                }
            })
            .collect()
    }

    /// Scale `base_zoom` by the active framing multiplier, within the zoom range.
    pub fn framing_zoom(&self, base_zoom: f64) -> f64 {
        self.zoom_range.clamp(base_zoom * self.zoom_multiplier)
    }
}

/// Fallible constructor for [`Camera`].
#[derive(Clone, Debug)]
pub struct CameraBuilder {
    id: CameraId,
    field: Arc<Field>,
    position: Option<Point2<f64>>,
    height: Option<f64>,
    pan_range: Option<DeviceRange>,
    tilt_range: Option<DeviceRange>,
    zoom_range: Option<DeviceRange>,
    lens: Option<LensTable>,
    sample: CalibrationSample,
    reset_position: Ptz,
    zoom_multiplier: f64,
}

impl CameraBuilder {
    pub fn new(id: CameraId, field: Arc<Field>) -> Self {
        Self {
            id,
            field,
            position: None,
            height: None,
            pan_range: None,
            tilt_range: None,
            zoom_range: None,
            lens: None,
            sample: CalibrationSample::default(),
            reset_position: Ptz::default(),
            zoom_multiplier: 1.0,
        }
    }

    pub fn position(mut self, position: Point2<f64>) -> Self {
        self.position = Some(position);
        self
    }

    pub fn height(mut self, height: f64) -> Self {
        self.height = Some(height);
        self
    }

    pub fn pan_range(mut self, range: DeviceRange) -> Self {
        self.pan_range = Some(range);
        self
    }

    pub fn tilt_range(mut self, range: DeviceRange) -> Self {
        self.tilt_range = Some(range);
        self
    }

    /// Defaults to the span of the lens breakpoints when not set.
    pub fn zoom_range(mut self, range: DeviceRange) -> Self {
        self.zoom_range = Some(range);
        self
    }

    pub fn lens(mut self, lens: LensTable) -> Self {
        self.lens = Some(lens);
        self
    }

    pub fn calibration(mut self, sample: CalibrationSample) -> Self {
        self.sample = sample;
        self
    }

    pub fn reset_position(mut self, ptz: Ptz) -> Self {
        self.reset_position = ptz;
        self
    }

    pub fn zoom_multiplier(mut self, multiplier: f64) -> Self {
        self.zoom_multiplier = multiplier;
        self
    }

    pub fn build(self) -> Result<Camera, CameraError> {
        let missing = |what| CameraError::MissingField {
            id: self.id.clone(),
            what,
        };
        let position = self.position.ok_or_else(|| missing("position"))?;
        let height = self.height.ok_or_else(|| missing("height"))?;
        let pan_range = self.pan_range.ok_or_else(|| missing("panrange"))?;
        let tilt_range = self.tilt_range.ok_or_else(|| missing("tiltrange"))?;
        let lens = self.lens.as_ref().ok_or_else(|| missing("zoom lookup table"))?;

        if !(position.x.is_finite() && position.y.is_finite()) {
            return Err(CameraError::InvalidPosition {
                x: position.x,
                y: position.y,
            });
        }
        if !(height.is_finite() && height > 0.0) {
            return Err(CameraError::InvalidHeight(height));
        }
        if !(self.zoom_multiplier.is_finite() && self.zoom_multiplier > 0.0) {
            return Err(CameraError::InvalidMultiplier(self.zoom_multiplier));
        }

        let lut = ZoomLut::from_table(lens)?;
        let zoom_range = match self.zoom_range {
            Some(r) => r,
            None => {
                let (lo, hi) = lut.zoom_bounds();
                DeviceRange::new(lo, hi)?
            }
        };
        let calibration = CalibrationFit::from_sample(&self.field, position, height, &self.sample)?;
        let side_lines = transform::filter_side_lines(&self.field, position);

        log::info!(
            "camera {}: {} calibration samples, pan factor {:.4}, tilt factor {:.4}, {} fencing lines",
            self.id,
            self.sample.len(),
            calibration.pan_delta_factor,
            calibration.tilt_delta_factor,
            side_lines.len()
        );

        Ok(Camera {
            id: self.id,
            field: self.field,
            position,
            height,
            pan_range,
            tilt_range,
            zoom_range,
            calibration,
            sample: self.sample,
            lut,
            side_lines,
            reset_position: self.reset_position,
            zoom_multiplier: self.zoom_multiplier,
            servo: ServoState::default(),
        })
    }
}
