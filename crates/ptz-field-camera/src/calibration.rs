//! Linear pan/tilt calibration from two known landmarks.
//!
//! The device is modelled as `bearing = pan·pan_delta_factor + pan_offset`
//! and `elevation = tilt·tilt_delta_factor + tilt_offset`, both in degrees.
//! Two landmarks with measured readings determine the model exactly.

use nalgebra::Point2;
use ptz_field_core::{Field, Landmark};
use serde::de::{Error as DeError, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::ptz::PanTilt;

/// Device axis named in calibration errors.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    Pan,
    Tilt,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::Pan => f.write_str("pan"),
            Axis::Tilt => f.write_str("tilt"),
        }
    }
}

/// Reasons a calibration fit is rejected.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum CalibrationError {
    #[error("calibration needs at least 2 samples, got {found}")]
    TooFewSamples { found: usize },
    #[error("calibration landmarks coincide")]
    CoincidentLandmarks,
    #[error("both calibration readings have the same {axis} value")]
    CoincidentReadings { axis: Axis },
    #[error("calibration landmarks have no {axis} separation as seen from the camera")]
    DegenerateGeometry { axis: Axis },
    #[error("calibration input or result is not finite")]
    NonFinite,
}

/// Horizontal bearing from `camera` to `p` in degrees, unwrapped to ±180°.
///
/// `asin` only covers ±90°, so points behind the camera (`p.y < camera.y`)
/// are folded: `180 - raw` for `raw >= 0`, `-(180 - |raw|)` otherwise.
/// Points level with the camera (`p.y == camera.y`) keep the raw value.
pub fn bearing_deg(camera: Point2<f64>, p: Point2<f64>) -> f64 {
    let d = (p - camera).norm();
    if d == 0.0 {
        return 0.0;
    }
    let raw = ((p.x - camera.x) / d).clamp(-1.0, 1.0).asin().to_degrees();
    if p.y >= camera.y {
        raw
    } else if raw >= 0.0 {
        180.0 - raw
    } else {
        -(180.0 - raw.abs())
    }
}

/// Elevation `atan(distance / height)` in degrees.
#[inline]
pub fn elevation_deg(distance: f64, height: f64) -> f64 {
    (distance / height).atan().to_degrees()
}

/// One measured reading: the device pointed at `landmark` read `(pan, tilt)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CalibrationPoint {
    pub landmark: Landmark,
    pub pan: f64,
    pub tilt: f64,
}

impl CalibrationPoint {
    pub fn new(landmark: Landmark, pan: f64, tilt: f64) -> Self {
        Self {
            landmark,
            pan,
            tilt,
        }
    }

    #[inline]
    pub fn reading(&self) -> PanTilt {
        PanTilt::new(self.pan, self.tilt)
    }
}

/// Ordered calibration readings.
///
/// In JSON this is a map from 1-based landmark number to `[pan, tilt]`; the
/// map order is kept because the first two entries drive the fit.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CalibrationSample {
    points: Vec<CalibrationPoint>,
}

impl CalibrationSample {
    pub fn new(points: Vec<CalibrationPoint>) -> Self {
        Self { points }
    }

    #[inline]
    pub fn points(&self) -> &[CalibrationPoint] {
        &self.points
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// The two readings used for the closed-form fit.
    pub fn primary_pair(&self) -> Result<(CalibrationPoint, CalibrationPoint), CalibrationError> {
        match self.points.as_slice() {
            [a, b, ..] => Ok((*a, *b)),
            other => Err(CalibrationError::TooFewSamples { found: other.len() }),
        }
    }
}

impl FromIterator<CalibrationPoint> for CalibrationSample {
    fn from_iter<T: IntoIterator<Item = CalibrationPoint>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl Serialize for CalibrationSample {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.points.len()))?;
        for p in &self.points {
            map.serialize_entry(&p.landmark.number().to_string(), &[p.pan, p.tilt])?;
        }
        map.end()
    }
}

struct SampleVisitor;

impl<'de> Visitor<'de> for SampleVisitor {
    type Value = CalibrationSample;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map from 1-based landmark number to [pan, tilt]")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut points = Vec::with_capacity(access.size_hint().unwrap_or(0));
        while let Some((key, [pan, tilt])) = access.next_entry::<String, [f64; 2]>()? {
            let landmark = key
                .trim()
                .parse::<usize>()
                .ok()
                .and_then(Landmark::from_number)
                .ok_or_else(|| {
                    <A::Error as DeError>::custom(format!("unknown landmark number {key:?}"))
                })?;
            points.push(CalibrationPoint::new(landmark, pan, tilt));
        }
        Ok(CalibrationSample::new(points))
    }
}

impl<'de> Deserialize<'de> for CalibrationSample {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(SampleVisitor)
    }
}

/// Fitted linear model between device readings and geometric angles.
///
/// Deserialization rejects non-finite values and non-positive delta factors.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCalibrationFit")]
pub struct CalibrationFit {
    pub pan_delta_factor: f64,
    pub pan_offset: f64,
    /// Degrees of bearing per meter between the two references; diagnostic only.
    pub pan_per_meter: f64,
    pub tilt_delta_factor: f64,
    pub tilt_offset: f64,
    /// Degrees of elevation per meter between the two references; diagnostic only.
    pub tilt_per_meter: f64,
}

#[derive(Deserialize)]
struct RawCalibrationFit {
    pan_delta_factor: f64,
    pan_offset: f64,
    #[serde(default)]
    pan_per_meter: f64,
    tilt_delta_factor: f64,
    tilt_offset: f64,
    #[serde(default)]
    tilt_per_meter: f64,
}

impl TryFrom<RawCalibrationFit> for CalibrationFit {
    type Error = CalibrationError;

    fn try_from(raw: RawCalibrationFit) -> Result<Self, Self::Error> {
        let fit = CalibrationFit {
            pan_delta_factor: raw.pan_delta_factor,
            pan_offset: raw.pan_offset,
            pan_per_meter: raw.pan_per_meter,
            tilt_delta_factor: raw.tilt_delta_factor,
            tilt_offset: raw.tilt_offset,
            tilt_per_meter: raw.tilt_per_meter,
        };
        if !fit.is_finite() {
            return Err(CalibrationError::NonFinite);
        }
        if fit.pan_delta_factor <= 0.0 {
            return Err(CalibrationError::DegenerateGeometry { axis: Axis::Pan });
        }
        if fit.tilt_delta_factor <= 0.0 {
            return Err(CalibrationError::DegenerateGeometry { axis: Axis::Tilt });
        }
        Ok(fit)
    }
}

impl CalibrationFit {
    /// Fit from the first two readings of `sample`.
    pub fn from_sample(
        field: &Field,
        camera: Point2<f64>,
        height: f64,
        sample: &CalibrationSample,
    ) -> Result<Self, CalibrationError> {
        let (a, b) = sample.primary_pair()?;
        Self::from_pair(
            camera,
            height,
            (field.landmark(a.landmark), a.reading()),
            (field.landmark(b.landmark), b.reading()),
        )
    }

    /// Fit from two world points and the readings measured at them.
    pub fn from_pair(
        camera: Point2<f64>,
        height: f64,
        (p1, r1): (Point2<f64>, PanTilt),
        (p2, r2): (Point2<f64>, PanTilt),
    ) -> Result<Self, CalibrationError> {
        let inputs = [
            camera.x, camera.y, height, p1.x, p1.y, p2.x, p2.y, r1.pan, r1.tilt, r2.pan, r2.tilt,
        ];
        if inputs.iter().any(|v| !v.is_finite()) {
            return Err(CalibrationError::NonFinite);
        }
        let separation = (p1 - p2).norm();
        if separation == 0.0 {
            return Err(CalibrationError::CoincidentLandmarks);
        }

        let theta = [bearing_deg(camera, p1), bearing_deg(camera, p2)];
        let phi = [
            elevation_deg((p1 - camera).norm(), height),
            elevation_deg((p2 - camera).norm(), height),
        ];

        let (pan_delta_factor, pan_offset) = fit_axis(Axis::Pan, theta, [r1.pan, r2.pan])?;
        let (tilt_delta_factor, tilt_offset) = fit_axis(Axis::Tilt, phi, [r1.tilt, r2.tilt])?;

        let fit = Self {
            pan_delta_factor,
            pan_offset,
            pan_per_meter: (theta[0] - theta[1]).abs() / separation,
            tilt_delta_factor,
            tilt_offset,
            tilt_per_meter: (phi[0] - phi[1]).abs() / separation,
        };
        if !fit.is_finite() {
            return Err(CalibrationError::NonFinite);
        }
        Ok(fit)
    }

    fn is_finite(&self) -> bool {
        [
            self.pan_delta_factor,
            self.pan_offset,
            self.pan_per_meter,
            self.tilt_delta_factor,
            self.tilt_offset,
            self.tilt_per_meter,
        ]
        .iter()
        .all(|v| v.is_finite())
    }

    #[inline]
    pub fn pan_to_bearing(&self, pan: f64) -> f64 {
        pan * self.pan_delta_factor + self.pan_offset
    }

    #[inline]
    pub fn bearing_to_pan(&self, bearing: f64) -> f64 {
        (bearing - self.pan_offset) / self.pan_delta_factor
    }

    #[inline]
    pub fn tilt_to_elevation(&self, tilt: f64) -> f64 {
        tilt * self.tilt_delta_factor + self.tilt_offset
    }

    #[inline]
    pub fn elevation_to_tilt(&self, elevation: f64) -> f64 {
        (elevation - self.tilt_offset) / self.tilt_delta_factor
    }
}

/// Spans at or below this fraction of the values' magnitude count as zero.
const SPAN_EPS: f64 = 1e-9;

fn negligible_span(v: [f64; 2]) -> bool {
    let scale = v[0].abs().max(v[1].abs()).max(1.0);
    (v[0] - v[1]).abs() <= SPAN_EPS * scale
}

/// `factor = |g1 - g2| / |r1 - r2|`, `offset = mean(g_i - r_i·factor)`.
fn fit_axis(axis: Axis, geo: [f64; 2], reading: [f64; 2]) -> Result<(f64, f64), CalibrationError> {
    if negligible_span(reading) {
        return Err(CalibrationError::CoincidentReadings { axis });
    }
    if negligible_span(geo) {
        return Err(CalibrationError::DegenerateGeometry { axis });
    }
    let reading_span = (reading[0] - reading[1]).abs();
    let geo_span = (geo[0] - geo[1]).abs();
    let factor = geo_span / reading_span;
    let offset = ((geo[0] - reading[0] * factor) + (geo[1] - reading[1] * factor)) / 2.0;
    Ok((factor, offset))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn p(x: f64, y: f64) -> Point2<f64> {
        Point2::new(x, y)
    }

    #[test]
    fn bearing_ahead_uses_raw_asin() {
        let c = p(0.0, 0.0);
        assert_abs_diff_eq!(bearing_deg(c, p(1.0, 1.0)), 45.0, epsilon = 1e-12);
        assert_abs_diff_eq!(bearing_deg(c, p(-1.0, 1.0)), -45.0, epsilon = 1e-12);
        assert_abs_diff_eq!(bearing_deg(c, p(0.0, 5.0)), 0.0);
    }

    #[test]
    fn bearing_on_boundary_row_is_not_folded() {
        let c = p(10.0, 4.0);
        assert_abs_diff_eq!(bearing_deg(c, p(15.0, 4.0)), 90.0, epsilon = 1e-12);
        assert_abs_diff_eq!(bearing_deg(c, p(5.0, 4.0)), -90.0, epsilon = 1e-12);
        // Approaching the row from behind converges to the same ±90°.
        assert_abs_diff_eq!(bearing_deg(c, p(15.0, 4.0 - 1e-9)), 90.0, epsilon = 1e-6);
        assert_abs_diff_eq!(bearing_deg(c, p(5.0, 4.0 - 1e-9)), -90.0, epsilon = 1e-6);
    }

    #[test]
    fn bearing_behind_is_folded() {
        let c = p(0.0, 0.0);
        assert_abs_diff_eq!(bearing_deg(c, p(1.0, -1.0)), 135.0, epsilon = 1e-12);
        assert_abs_diff_eq!(bearing_deg(c, p(-1.0, -1.0)), -135.0, epsilon = 1e-12);
        assert_abs_diff_eq!(bearing_deg(c, p(0.0, -3.0)), 180.0, epsilon = 1e-12);
        assert_abs_diff_eq!(bearing_deg(c, p(-1e-9, -3.0)), -180.0, epsilon = 1e-6);
    }

    #[test]
    fn fit_recovers_synthetic_model_exactly() {
        let camera = p(52.5, -8.0);
        let height = 12.0;
        let (a, b) = (p(10.0, 20.0), p(80.0, 50.0));
        let (pan_f, pan_o, tilt_f, tilt_o) = (1.7, -3.5, 0.9, 62.0);
        let reading = |q: Point2<f64>| {
            PanTilt::new(
                (bearing_deg(camera, q) - pan_o) / pan_f,
                (elevation_deg((q - camera).norm(), height) - tilt_o) / tilt_f,
            )
        };
        let fit = CalibrationFit::from_pair(camera, height, (a, reading(a)), (b, reading(b)))
            .expect("fit");
        assert_abs_diff_eq!(fit.pan_delta_factor, pan_f, epsilon = 1e-9);
        assert_abs_diff_eq!(fit.pan_offset, pan_o, epsilon = 1e-9);
        assert_abs_diff_eq!(fit.tilt_delta_factor, tilt_f, epsilon = 1e-9);
        assert_abs_diff_eq!(fit.tilt_offset, tilt_o, epsilon = 1e-9);
        let sep = (a - b).norm();
        let dtheta = (bearing_deg(camera, a) - bearing_deg(camera, b)).abs();
        assert_abs_diff_eq!(fit.pan_per_meter, dtheta / sep, epsilon = 1e-12);
    }

    #[test]
    fn degenerate_inputs_are_rejected() {
        let c = p(0.0, -5.0);
        let q = p(3.0, 4.0);
        let err = CalibrationFit::from_pair(
            c,
            10.0,
            (q, PanTilt::new(1.0, 2.0)),
            (q, PanTilt::new(3.0, 4.0)),
        );
        assert_eq!(err, Err(CalibrationError::CoincidentLandmarks));

        let err = CalibrationFit::from_pair(
            c,
            10.0,
            (q, PanTilt::new(1.0, 2.0)),
            (p(8.0, 9.0), PanTilt::new(1.0, 4.0)),
        );
        assert_eq!(
            err,
            Err(CalibrationError::CoincidentReadings { axis: Axis::Pan })
        );

        // Same bearing, different range: no pan separation.
        let err = CalibrationFit::from_pair(
            c,
            10.0,
            (p(0.0, 5.0), PanTilt::new(1.0, 2.0)),
            (p(0.0, 15.0), PanTilt::new(2.0, 4.0)),
        );
        assert_eq!(
            err,
            Err(CalibrationError::DegenerateGeometry { axis: Axis::Pan })
        );

        let err = CalibrationFit::from_pair(
            c,
            f64::NAN,
            (q, PanTilt::new(1.0, 2.0)),
            (p(8.0, 9.0), PanTilt::new(3.0, 4.0)),
        );
        assert_eq!(err, Err(CalibrationError::NonFinite));
    }

    #[test]
    fn sample_json_keeps_config_order() {
        let json = r#"{"32": [10.5, -3.0], "7": [0.0, -8.0], "1": [-40.0, -2.0]}"#;
        let sample: CalibrationSample = serde_json::from_str(json).unwrap();
        let lms: Vec<Landmark> = sample.points().iter().map(|p| p.landmark).collect();
        assert_eq!(
            lms,
            vec![
                Landmark::LeftPenaltySpot,
                Landmark::CenterSpot,
                Landmark::TopLeftCorner
            ]
        );
        let (a, b) = sample.primary_pair().unwrap();
        assert_eq!(a.pan, 10.5);
        assert_eq!(b.tilt, -8.0);

        let back = serde_json::to_string(&sample).unwrap();
        assert!(back.starts_with("{\"32\":[10.5,-3.0]"));
    }

    #[test]
    fn sample_json_rejects_unknown_landmarks() {
        assert!(serde_json::from_str::<CalibrationSample>(r#"{"0": [1, 2]}"#).is_err());
        assert!(serde_json::from_str::<CalibrationSample>(r#"{"36": [1, 2]}"#).is_err());
        assert!(serde_json::from_str::<CalibrationSample>(r#"{"x": [1, 2]}"#).is_err());
    }

    #[test]
    fn one_sample_is_too_few() {
        let s: CalibrationSample = [CalibrationPoint::new(Landmark::CenterSpot, 0.0, 0.0)]
            .into_iter()
            .collect();
        assert_eq!(
            s.primary_pair(),
            Err(CalibrationError::TooFewSamples { found: 1 })
        );
    }

    #[test]
    fn fit_json_rejects_degenerate_factors() {
        let fit: CalibrationFit = serde_json::from_str(
            r#"{"pan_delta_factor": 1.1, "pan_offset": 0.5, "tilt_delta_factor": 0.75, "tilt_offset": 60}"#,
        )
        .unwrap();
        assert_eq!(fit.tilt_delta_factor, 0.75);
        let back: CalibrationFit =
            serde_json::from_str(&serde_json::to_string(&fit).unwrap()).unwrap();
        assert_eq!(back, fit);

        let zero_pan =
            r#"{"pan_delta_factor": 0, "pan_offset": 0.5, "tilt_delta_factor": 0.75, "tilt_offset": 60}"#;
        let err = serde_json::from_str::<CalibrationFit>(zero_pan).unwrap_err();
        assert!(err.to_string().contains("pan"), "{err}");
        let negative_tilt =
            r#"{"pan_delta_factor": 1, "pan_offset": 0.5, "tilt_delta_factor": -2, "tilt_offset": 60}"#;
        assert!(serde_json::from_str::<CalibrationFit>(negative_tilt).is_err());
    }
}
