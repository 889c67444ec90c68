use serde::{Deserialize, Serialize};

use super::Camera;
use crate::ptz::Ptz;

/// Command after device-range limiting, with flags telling what changed.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundaryAdjustment {
    pub ptz: Ptz,
    pub pan_clamped: bool,
    pub tilt_clamped: bool,
    /// Zoom was changed, either by the zoom range or by the pan-boundary
    /// zoom-out.
    pub zoom_limited: bool,
}

impl BoundaryAdjustment {
    pub fn is_adjusted(&self) -> bool {
        self.pan_clamped || self.tilt_clamped || self.zoom_limited
    }
}

/// Widening applied to the field of view needed to keep a subject past the
/// pan limit in frame.
const BOUNDARY_FOV_GAIN: f64 = 1.5;

impl Camera {
    /// Bring a requested command inside the device ranges.
    ///
    /// Tilt is clamped. When pan overshoots its range, the camera cannot
    /// follow, so it zooms out instead: the field of view grows by the
    /// overshoot (relative to the half-FOV at `current_zoom`) and the zoom
    /// is capped at the level that gives that field of view.
    pub fn adjust_for_boundary(
        &self,
        pan: f64,
        tilt: f64,
        zoom: f64,
        current_zoom: f64,
    ) -> BoundaryAdjustment {
        let new_tilt = self.tilt_range.clamp(tilt);
        let (zmin, zmax) = (self.zoom_range.min(), self.zoom_range.max());

        let (new_pan, new_zoom) = if self.pan_range.contains(pan) {
            (pan, self.zoom_range.clamp(zoom))
        } else {
            let current_fov = self.lut.pan_fov(current_zoom);
            let pan_diff = (pan - self.pan_range.nearest_bound(pan)).abs();
            let diff_fov = current_fov / 2.0 - pan_diff;
            let (fov_min, fov_max) = self.lut.pan_fov_bounds();
            let new_fov = ((current_fov - diff_fov) * BOUNDARY_FOV_GAIN).clamp(fov_min, fov_max);
            let boundary_zoom = self.lut.zoom_for_pan_fov(new_fov);
            // Lower bound first so an upper bound below `zmin` wins.
            let zoom = zoom.max(zmin).min(boundary_zoom.min(zmax));
            (self.pan_range.clamp(pan), zoom)
        };

        let adj = BoundaryAdjustment {
            ptz: Ptz::new(new_pan, new_tilt, new_zoom),
            pan_clamped: new_pan != pan,
            tilt_clamped: new_tilt != tilt,
            zoom_limited: new_zoom != zoom,
        };
        if adj.is_adjusted() {
            log::debug!(
                "camera {}: boundary adjustment ({pan:.2}, {tilt:.2}, {zoom:.0}) -> ({:.2}, {:.2}, {:.0})",
                self.id,
                new_pan,
                new_tilt,
                new_zoom
            );
        }
        adj
    }
}

#[cfg(test)]
mod tests {
    use crate::camera::test_support::builder_at;
    use crate::camera::Camera;
    use crate::ptz::DeviceRange;
    use approx::assert_abs_diff_eq;
    use nalgebra::Point2;

    fn narrow_camera() -> Camera {
        builder_at(Point2::new(52.5, -8.0), 12.0)
            .pan_range(DeviceRange::new(-50.0, 50.0).unwrap())
            .tilt_range(DeviceRange::new(-20.0, 40.0).unwrap())
            .build()
            .unwrap()
    }

    #[test]
    fn in_range_command_only_clamps_zoom() {
        let cam = narrow_camera();
        let adj = cam.adjust_for_boundary(10.0, 5.0, 20000.0, 4000.0);
        assert_eq!(adj.ptz.pan, 10.0);
        assert_eq!(adj.ptz.tilt, 5.0);
        assert_eq!(adj.ptz.zoom, 16000.0);
        assert!(adj.zoom_limited && !adj.pan_clamped && !adj.tilt_clamped);

        let adj = cam.adjust_for_boundary(10.0, 5.0, 3000.0, 4000.0);
        assert!(!adj.is_adjusted());
    }

    #[test]
    fn tilt_is_clamped_to_range() {
        let cam = narrow_camera();
        let adj = cam.adjust_for_boundary(0.0, 55.0, 1000.0, 1000.0);
        assert_eq!(adj.ptz.tilt, 40.0);
        assert!(adj.tilt_clamped);
    }

    #[test]
    fn pan_overshoot_zooms_out_to_keep_the_subject() {
        let cam = narrow_camera();
        // FOV 16.5° at 8000; 2° past the limit gives (16.5 - 6.25)·1.5 = 15.375°.
        let adj = cam.adjust_for_boundary(52.0, 0.0, 12000.0, 8000.0);
        assert_eq!(adj.ptz.pan, 50.0);
        assert!(adj.pan_clamped && adj.zoom_limited);
        assert_abs_diff_eq!(adj.ptz.zoom, 8600.0, epsilon = 1e-9);
    }

    #[test]
    fn pan_outside_always_lands_inside_without_zooming_in() {
        let cam = narrow_camera();
        for i in 0..40 {
            let pan = if i % 2 == 0 { 50.5 + i as f64 } else { -50.5 - i as f64 };
            for &zoom in &[0.0, 2500.0, 8000.0, 16000.0] {
                for &current in &[0.0, 6000.0, 16000.0] {
                    let adj = cam.adjust_for_boundary(pan, 0.0, zoom, current);
                    assert!(cam.pan_range().contains(adj.ptz.pan));
                    assert!(adj.ptz.zoom <= zoom, "{pan} {zoom} {current}: {adj:?}");
                    assert!(adj.ptz.zoom >= cam.zoom_range().min());
                }
            }
        }
    }
}
