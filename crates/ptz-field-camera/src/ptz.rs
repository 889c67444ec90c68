//! Plain value types shared by the camera engine.

use serde::{Deserialize, Serialize};

/// Pan/tilt/zoom triple, either a device reading or a command.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Ptz {
    pub pan: f64,
    pub tilt: f64,
    pub zoom: f64,
}

impl Ptz {
    pub fn new(pan: f64, tilt: f64, zoom: f64) -> Self {
        Self { pan, tilt, zoom }
    }

}

/// Pan/tilt pair without zoom.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PanTilt {
    pub pan: f64,
    pub tilt: f64,
}

impl PanTilt {
    pub fn new(pan: f64, tilt: f64) -> Self {
        Self { pan, tilt }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[error("invalid device range [{min}, {max}]: bounds must be finite with min < max")]
pub struct RangeError {
    pub min: f64,
    pub max: f64,
}

/// Closed interval `[min, max]` of a device axis.
///
/// Serialized as a two-element array, matching the `panrange`/`tiltrange`
/// config entries.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "[f64; 2]", into = "[f64; 2]")]
pub struct DeviceRange {
    min: f64,
    max: f64,
}

impl DeviceRange {
    pub fn new(min: f64, max: f64) -> Result<Self, RangeError> {
        if !(min.is_finite() && max.is_finite()) || min >= max {
            return Err(RangeError { min, max });
        }
        Ok(Self { min, max })
    }

    #[inline]
    pub fn min(&self) -> f64 {
        self.min
    }

    #[inline]
    pub fn max(&self) -> f64 {
        self.max
    }

    #[inline]
    pub fn contains(&self, v: f64) -> bool {
        (self.min..=self.max).contains(&v)
    }

    #[inline]
    pub fn clamp(&self, v: f64) -> f64 {
        v.clamp(self.min, self.max)
    }

    /// The bound closest to `v`.
    pub fn nearest_bound(&self, v: f64) -> f64 {
        if (v - self.min).abs() <= (v - self.max).abs() {
            self.min
        } else {
            self.max
        }
    }
}

impl TryFrom<[f64; 2]> for DeviceRange {
    type Error = RangeError;

    fn try_from([min, max]: [f64; 2]) -> Result<Self, Self::Error> {
        Self::new(min, max)
    }
}

impl From<DeviceRange> for [f64; 2] {
    fn from(r: DeviceRange) -> Self {
        [r.min, r.max]
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[error("bounding box ({x1}, {y1}, {x2}, {y2}) must be normalized with x1 <= x2 and y1 <= y2")]
pub struct BoundingBoxError {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

/// Normalized bounding box of the tracked subject, `[0, 1]` in both axes.
///
/// Serialized as `[x1, y1, x2, y2]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "[f64; 4]", into = "[f64; 4]")]
pub struct BoundingBox {
    x1: f64,
    y1: f64,
    x2: f64,
    y2: f64,
}

impl TryFrom<[f64; 4]> for BoundingBox {
    type Error = BoundingBoxError;

    fn try_from([x1, y1, x2, y2]: [f64; 4]) -> Result<Self, Self::Error> {
        Self::new(x1, y1, x2, y2)
    }
}

impl From<BoundingBox> for [f64; 4] {
    fn from(b: BoundingBox) -> Self {
        [b.x1, b.y1, b.x2, b.y2]
    }
}

impl BoundingBox {
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Result<Self, BoundingBoxError> {
        let unit = 0.0..=1.0;
        let valid = [x1, y1, x2, y2].iter().all(|v| unit.contains(v)) && x1 <= x2 && y1 <= y2;
        if !valid {
            return Err(BoundingBoxError { x1, y1, x2, y2 });
        }
        Ok(Self { x1, y1, x2, y2 })
    }

    #[inline]
    pub fn center_x(&self) -> f64 {
        (self.x1 + self.x2) / 2.0
    }

    /// Bottom edge; the servo tracks the subject's feet rather than its centroid.
    #[inline]
    pub fn bottom(&self) -> f64 {
        self.y2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_round_trips_through_json_array() {
        let r: DeviceRange = serde_json::from_str("[-55, 55]").unwrap();
        assert_eq!(r.min(), -55.0);
        assert_eq!(serde_json::to_string(&r).unwrap(), "[-55.0,55.0]");
        assert!(serde_json::from_str::<DeviceRange>("[5, 1]").is_err());
    }

    #[test]
    fn range_clamp_and_nearest_bound() {
        let r = DeviceRange::new(-20.0, 20.0).unwrap();
        assert_eq!(r.clamp(25.0), 20.0);
        assert_eq!(r.clamp(-30.0), -20.0);
        assert_eq!(r.nearest_bound(-21.0), -20.0);
        assert_eq!(r.nearest_bound(3.0), 20.0);
        assert!(r.contains(20.0));
    }

    #[test]
    fn bounding_box_validation() {
        let b = BoundingBox::new(0.2, 0.1, 0.4, 0.7).unwrap();
        assert!((b.center_x() - 0.3).abs() < 1e-12);
        assert_eq!(b.bottom(), 0.7);
        assert!(BoundingBox::new(0.5, 0.1, 0.4, 0.7).is_err());
        assert!(BoundingBox::new(0.1, 0.1, 1.2, 0.7).is_err());
        assert!(BoundingBox::new(f64::NAN, 0.1, 0.2, 0.7).is_err());
    }

    #[test]
    fn bounding_box_json_is_validated() {
        let b: BoundingBox = serde_json::from_str("[0.2, 0.1, 0.4, 0.7]").unwrap();
        assert_eq!(<[f64; 4]>::from(b), [0.2, 0.1, 0.4, 0.7]);
        assert_eq!(serde_json::to_string(&b).unwrap(), "[0.2,0.1,0.4,0.7]");
        assert!(serde_json::from_str::<BoundingBox>("[0.5, 0.1, 0.4, 0.7]").is_err());
        assert!(serde_json::from_str::<BoundingBox>("[0.1, 0.1, 1.5, 0.7]").is_err());
        assert!(serde_json::from_str::<BoundingBox>("[0.1, 0.1, 0.2]").is_err());
    }
}
