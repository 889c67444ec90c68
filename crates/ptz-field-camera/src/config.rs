//! Rig configuration records and their conversion into a [`Field`] and
//! [`Camera`]s.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use nalgebra::Point2;
use ptz_field_core::{Field, FieldDimensions, FieldError, FieldMarkings};
use serde::{Deserialize, Serialize};

use crate::calibration::CalibrationSample;
use crate::camera::{Camera, CameraError};
use crate::io::IoError;
use crate::lut::LensTable;
use crate::ptz::{DeviceRange, Ptz};

/// Camera identifier. Configs use plain numbers or strings; both are kept as
/// text.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "RawCameraId", into = "String")]
pub struct CameraId(String);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawCameraId {
    Number(i64),
    Text(String),
}

impl From<RawCameraId> for CameraId {
    fn from(raw: RawCameraId) -> Self {
        match raw {
            RawCameraId::Number(n) => CameraId(n.to_string()),
            RawCameraId::Text(s) => CameraId(s),
        }
    }
}

impl From<CameraId> for String {
    fn from(id: CameraId) -> Self {
        id.0
    }
}

impl CameraId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Compare against a user-supplied id; `"camera3"` matches id `3`.
    pub fn matches(&self, query: &str) -> bool {
        let strip = |s: &str| {
            let s = s.trim();
            s.strip_prefix("camera").unwrap_or(s).to_owned()
        };
        strip(&self.0) == strip(query)
    }
}

impl fmt::Display for CameraId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("config has no {0} section")]
    MissingField(&'static str),
    #[error("camera {0} not found in config")]
    MissingCamera(String),
    #[error(transparent)]
    Field(#[from] FieldError),
    #[error(transparent)]
    Camera(#[from] CameraError),
    #[error(transparent)]
    Io(#[from] IoError),
}

/// Operational state maintained outside the rig config, keyed by camera id.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OperationalOverlay {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation_mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub framing_mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl OperationalOverlay {
    /// Fields set in `other` replace ours.
    pub fn merge(&mut self, other: &OperationalOverlay) {
        let fields = [
            (&mut self.operation_mode, &other.operation_mode),
            (&mut self.framing_mode, &other.framing_mode),
            (&mut self.role, &other.role),
            (&mut self.status, &other.status),
        ];
        for (dst, src) in fields {
            if src.is_some() {
                dst.clone_from(src);
            }
        }
    }
}

/// Overlay file: camera id → operational state.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OverlayConfig {
    pub cameras: BTreeMap<CameraId, OperationalOverlay>,
}

impl OverlayConfig {
    pub fn get(&self, id: &CameraId) -> Option<&OperationalOverlay> {
        self.cameras
            .get(id)
            .or_else(|| self.cameras.iter().find(|(k, _)| k.matches(id.as_str())).map(|(_, v)| v))
    }
}

/// One camera record of the rig config.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CameraConfig {
    #[serde(alias = "id")]
    pub camera_id: CameraId,
    pub position: [f64; 2],
    pub height: f64,
    pub panrange: DeviceRange,
    pub tiltrange: DeviceRange,
    /// Defaults to the span of `zoombreakpoints`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zoomrange: Option<DeviceRange>,
    #[serde(flatten)]
    pub lens: LensTable,
    #[serde(default)]
    pub calibration_data: CalibrationSample,
    #[serde(default)]
    pub reset_position: Ptz,
    /// Zoom multiplier per framing mode.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub framing_zoom_multipliers: BTreeMap<String, f64>,
    #[serde(flatten)]
    pub overlay: OperationalOverlay,
}

impl CameraConfig {
    /// Multiplier of the active framing mode; 1 when no mode is set or the
    /// mode has no entry.
    pub fn zoom_multiplier(&self) -> f64 {
        let Some(mode) = self.overlay.framing_mode.as_deref() else {
            return 1.0;
        };
        match self.framing_zoom_multipliers.get(mode) {
            Some(&m) => m,
            None => {
                log::warn!(
                    "camera {}: no zoom multiplier for framing mode {mode:?}, using 1",
                    self.camera_id
                );
                1.0
            }
        }
    }

    pub fn build_camera(&self, field: Arc<Field>) -> Result<Camera, CameraError> {
        let mut builder = Camera::builder(self.camera_id.clone(), field)
            .position(Point2::new(self.position[0], self.position[1]))
            .height(self.height)
            .pan_range(self.panrange)
            .tilt_range(self.tiltrange)
            .lens(self.lens.clone())
            .calibration(self.calibration_data.clone())
            .reset_position(self.reset_position)
            .zoom_multiplier(self.zoom_multiplier());
        if let Some(zoomrange) = self.zoomrange {
            builder = builder.zoom_range(zoomrange);
        }
        builder.build()
    }
}

/// Whole rig: the field and every camera on it.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RigConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<FieldDimensions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_markings: Option<FieldMarkings>,
    #[serde(default)]
    pub camera_config: Vec<CameraConfig>,
}

impl RigConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::Io(IoError::Json(e)))
    }

    /// Merge overlay entries into the matching camera records.
    pub fn apply_overlay(&mut self, overlay: &OverlayConfig) {
        for cam in &mut self.camera_config {
            if let Some(entry) = overlay.get(&cam.camera_id) {
                cam.overlay.merge(entry);
            }
        }
    }

    pub fn build_field(&self) -> Result<Field, ConfigError> {
        let dims = self.field.ok_or(ConfigError::MissingField("field"))?;
        let field = match self.field_markings {
            Some(markings) => Field::with_markings(dims.width, dims.height, markings)?,
            None => Field::from_dimensions(dims)?,
        };
        Ok(field)
    }

    pub fn camera(&self, id: &str) -> Result<&CameraConfig, ConfigError> {
        self.camera_config
            .iter()
            .find(|c| c.camera_id.matches(id))
            .ok_or_else(|| ConfigError::MissingCamera(id.to_owned()))
    }

    /// Build the field and one camera on it.
    pub fn build_camera(&self, id: &str) -> Result<Camera, ConfigError> {
        let record = self.camera(id)?;
        let field = Arc::new(self.build_field()?);
        Ok(record.build_camera(field)?)
    }

    /// Build every camera, sharing one field.
    pub fn build_cameras(&self) -> Result<Vec<Camera>, ConfigError> {
        if self.camera_config.is_empty() {
            return Err(ConfigError::MissingField("camera_config"));
        }
        let field = Arc::new(self.build_field()?);
        self.camera_config
            .iter()
            .map(|c| c.build_camera(Arc::clone(&field)).map_err(ConfigError::from))
            .collect()
    }
}
