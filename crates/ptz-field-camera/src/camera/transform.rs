//! World ↔ device conversions with boundary fencing.

use nalgebra::{Point2, Vector2};
use ptz_field_core::{Field, FieldSide, Line};
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

use super::Camera;
use crate::calibration::{bearing_deg, elevation_deg};

/// Device angles that point the camera at a world point.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DeviceAngles {
    pub pan: f64,
    pub tilt: f64,
    /// Ground distance from the camera foot point, meters.
    pub distance: f64,
}

/// Ground point hit by a device pointing, after fencing.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorldProjection {
    pub point: Point2<f64>,
    /// Distance actually used for `point`.
    pub distance: f64,
    /// `|tan φ|·height` before clamping and fencing.
    pub raw_distance: f64,
    /// Elevation used for `distance`, degrees; differs from the calibrated
    /// one when the projection was fenced.
    pub elevation: f64,
}

impl WorldProjection {
    /// True if fencing or the diagonal clamp shortened the projection.
    pub fn was_limited(&self) -> bool {
        self.distance < self.raw_distance
    }
}

impl Camera {
    /// Bearing from this camera to `p`, degrees.
    #[inline]
    pub fn bearing(&self, p: Point2<f64>) -> f64 {
        bearing_deg(self.position, p)
    }

    pub fn xy_to_pt(&self, p: Point2<f64>) -> DeviceAngles {
        let distance = (p - self.position).norm();
        let theta = self.bearing(p);
        let phi = elevation_deg(distance, self.height);
        DeviceAngles {
            pan: self.calibration.bearing_to_pan(theta),
            tilt: self.calibration.elevation_to_tilt(phi),
            distance,
        }
    }

    #[cfg_attr(feature = "tracing", instrument(level = "debug", skip(self, points), fields(n = points.len())))]
    pub fn xy_to_pt_batch(&self, points: &[Point2<f64>]) -> Vec<DeviceAngles> {
        points.iter().map(|&p| self.xy_to_pt(p)).collect()
    }

    /// Project a device pointing onto the ground.
    ///
    /// The distance is clamped to the field diagonal. If the elevation
    /// exceeds the elevation of the nearest boundary crossing in the pointing
    /// direction, it is reflected about that limit so the point folds back
    /// inside the field.
    pub fn pt_to_xy(&self, pan: f64, tilt: f64) -> WorldProjection {
        let phi = self.calibration.tilt_to_elevation(tilt);
        let theta = self.calibration.pan_to_bearing(pan).to_radians();
        let diagonal = self.field.diagonal();
        let dir = Vector2::new(theta.sin(), theta.cos());

        let raw_distance = self.ground_distance(phi);
        let mut distance = raw_distance.clamp(0.0, diagonal);
        let mut elevation = phi;

        if let Some(limit) = self.boundary_distance(dir) {
            let phi_max = elevation_deg(limit, self.height);
            let excess = phi - phi_max;
            if excess > 0.0 {
                elevation = phi_max - excess;
                distance = self.ground_distance(elevation).clamp(0.0, diagonal);
                log::trace!(
                    "camera {}: fenced elevation {phi:.3} -> {elevation:.3} (limit {phi_max:.3})",
                    self.id
                );
            }
        }

        WorldProjection {
            point: self.position + dir * distance,
            distance,
            raw_distance,
            elevation,
        }
    }

    #[cfg_attr(feature = "tracing", instrument(level = "debug", skip(self, readings), fields(n = readings.len())))]
    pub fn pt_to_xy_batch(&self, readings: &[(f64, f64)]) -> Vec<WorldProjection> {
        readings
            .iter()
            .map(|&(pan, tilt)| self.pt_to_xy(pan, tilt))
            .collect()
    }

    #[inline]
    fn ground_distance(&self, elevation: f64) -> f64 {
        elevation.to_radians().tan().abs() * self.height
    }

    /// Distance to the nearest fencing line crossed by the ray from the
    /// camera along `dir`. Crossings behind the camera are ignored.
    fn boundary_distance(&self, dir: Vector2<f64>) -> Option<f64> {
        let ray = Line::through(self.position, self.position + dir);
        self.side_lines
            .iter()
            .filter_map(|(_, line)| ray.intersect(line))
            .map(|q| q - self.position)
            .filter(|v| v.dot(&dir) > 0.0)
            .map(|v| v.norm())
            .min_by(f64::total_cmp)
    }
}

/// Boundary lines usable for fencing from `camera`, nearest first.
///
/// Lines the camera has already crossed are dropped: a camera behind the
/// top touchline cannot fence against it.
pub(crate) fn filter_side_lines(field: &Field, camera: Point2<f64>) -> Vec<(FieldSide, Line)> {
    let (lo, hi) = field.bounds();
    let crossed = |side: FieldSide| match side {
        FieldSide::Top => camera.y < lo.y,
        FieldSide::Bottom => camera.y > hi.y,
        FieldSide::Left => camera.x < lo.x,
        FieldSide::Right => camera.x > hi.x,
    };
    let mut lines: Vec<(FieldSide, Line, f64)> = field
        .side_lines()
        .into_iter()
        .filter(|&(side, _)| !crossed(side))
        .map(|(side, line)| {
            let d = line.distance_to(camera).unwrap_or(f64::INFINITY);
            (side, line, d)
        })
        .collect();
    lines.sort_by(|a, b| a.2.total_cmp(&b.2));
    lines.into_iter().map(|(side, line, _)| (side, line)).collect()
}

#[cfg(test)]
mod tests {
    use crate::camera::test_support::camera_at;
    use super::*;
    use approx::assert_abs_diff_eq;

    fn sides(lines: &[(FieldSide, Line)]) -> Vec<FieldSide> {
        lines.iter().map(|(s, _)| *s).collect()
    }

    #[test]
    fn side_lines_drop_crossed_boundaries() {
        let field = Field::new(105.0, 68.0).unwrap();

        let inside = filter_side_lines(&field, Point2::new(30.0, 20.0));
        assert_eq!(inside.len(), 4);

        let behind_top = filter_side_lines(&field, Point2::new(52.5, -8.0));
        assert_eq!(behind_top.len(), 3);
        assert!(!sides(&behind_top).contains(&FieldSide::Top));

        let corner = filter_side_lines(&field, Point2::new(-4.0, -6.0));
        assert_eq!(corner.len(), 2);
        assert!(!sides(&corner).contains(&FieldSide::Left));
    }

    #[test]
    fn side_lines_are_sorted_nearest_first() {
        let field = Field::new(105.0, 68.0).unwrap();
        let lines = filter_side_lines(&field, Point2::new(30.0, 20.0));
        assert_eq!(
            sides(&lines),
            vec![
                FieldSide::Top,
                FieldSide::Left,
                FieldSide::Bottom,
                FieldSide::Right
            ]
        );
        let corner = filter_side_lines(&field, Point2::new(-4.0, -6.0));
        assert_eq!(sides(&corner), vec![FieldSide::Bottom, FieldSide::Right]);
    }

    #[test]
    fn round_trip_inside_the_field() {
        let cam = camera_at(Point2::new(52.5, 34.0), 15.0);
        for &(x, y) in &[(10.0, 10.0), (90.0, 60.0), (52.5, 5.0), (20.0, 50.0), (100.0, 3.0)] {
            let p = Point2::new(x, y);
            let a = cam.xy_to_pt(p);
            let back = cam.pt_to_xy(a.pan, a.tilt);
            assert_abs_diff_eq!(back.point.x, x, epsilon = 1e-6);
            assert_abs_diff_eq!(back.point.y, y, epsilon = 1e-6);
            assert_abs_diff_eq!(back.distance, a.distance, epsilon = 1e-6);
        }
    }

    #[test]
    fn round_trip_from_behind_the_touchline() {
        let cam = camera_at(Point2::new(52.5, -8.0), 12.0);
        for &(x, y) in &[(10.0, 10.0), (90.0, 60.0), (52.5, 34.0), (1.0, 67.0)] {
            let a = cam.xy_to_pt(Point2::new(x, y));
            let back = cam.pt_to_xy(a.pan, a.tilt);
            assert_abs_diff_eq!(back.point.x, x, epsilon = 1e-6);
            assert_abs_diff_eq!(back.point.y, y, epsilon = 1e-6);
        }
    }

    #[test]
    fn points_beyond_the_far_touchline_are_fenced_back() {
        let cam = camera_at(Point2::new(52.5, -8.0), 12.0);
        // 20 m past the bottom touchline, straight ahead.
        let a = cam.xy_to_pt(Point2::new(52.5, 88.0));
        let proj = cam.pt_to_xy(a.pan, a.tilt);
        assert!(proj.was_limited());
        assert!(proj.point.y < 68.0);
        assert!(proj.elevation < elevation_deg(76.0, 12.0));
        assert_abs_diff_eq!(proj.point.x, 52.5, epsilon = 1e-6);

        let phi = elevation_deg(96.0, 12.0);
        let phi_max = elevation_deg(76.0, 12.0);
        let expected = (2.0 * phi_max - phi).to_radians().tan() * 12.0;
        assert_abs_diff_eq!(proj.distance, expected, epsilon = 1e-6);
    }

    #[test]
    fn projection_never_exceeds_the_diagonal() {
        let cam = camera_at(Point2::new(52.5, 34.0), 15.0);
        let tilt = cam.calibration().elevation_to_tilt(89.999);
        let proj = cam.pt_to_xy(0.0, tilt);
        assert!(proj.raw_distance > cam.field().diagonal());
        assert!(proj.distance <= cam.field().diagonal());
    }

    #[test]
    fn pointing_away_from_the_field_is_not_fenced() {
        let cam = camera_at(Point2::new(52.5, -8.0), 12.0);
        let pan = cam.calibration().bearing_to_pan(180.0);

        let phi = elevation_deg(30.0, 12.0);
        let proj = cam.pt_to_xy(pan, cam.calibration().elevation_to_tilt(phi));
        assert!(!proj.was_limited());
        assert_abs_diff_eq!(proj.elevation, phi, epsilon = 1e-9);
        assert_abs_diff_eq!(proj.point.x, 52.5, epsilon = 1e-6);
        assert_abs_diff_eq!(proj.point.y, -38.0, epsilon = 1e-6);

        let steep = cam.calibration().elevation_to_tilt(89.999);
        let proj = cam.pt_to_xy(pan, steep);
        let diagonal = cam.field().diagonal();
        assert!(proj.raw_distance > diagonal);
        assert_abs_diff_eq!(proj.distance, diagonal, epsilon = 1e-9);
        assert_abs_diff_eq!(proj.elevation, 89.999, epsilon = 1e-9);
    }

    #[test]
    fn batches_match_single_calls() {
        let cam = camera_at(Point2::new(52.5, 34.0), 15.0);
        let pts = [Point2::new(3.0, 4.0), Point2::new(70.0, 30.0)];
        let angles = cam.xy_to_pt_batch(&pts);
        assert_eq!(angles[1], cam.xy_to_pt(pts[1]));
        let readings: Vec<(f64, f64)> = angles.iter().map(|a| (a.pan, a.tilt)).collect();
        let back = cam.pt_to_xy_batch(&readings);
        assert_eq!(back.len(), 2);
        assert_abs_diff_eq!(back[0].point.x, 3.0, epsilon = 1e-6);
    }
}
