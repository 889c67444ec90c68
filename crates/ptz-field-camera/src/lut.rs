//! Zoom ↔ field-of-view lookup tables.
//!
//! Lens data comes as parallel breakpoint arrays (`zoombreakpoints`, `xfov`,
//! `yfov`). Each direction is a piecewise-linear interpolant; queries outside
//! the sampled range extrapolate linearly from the end segment.

use serde::{Deserialize, Serialize};

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum LutError {
    #[error("lookup table arrays differ in length ({xs} vs {ys})")]
    LengthMismatch { xs: usize, ys: usize },
    #[error("lookup table needs at least 2 breakpoints, got {found}")]
    TooFewBreakpoints { found: usize },
    #[error("lookup table contains a non-finite value")]
    NonFinite,
    #[error("lookup table {what} is not strictly monotone")]
    NotMonotone { what: &'static str },
}

/// Piecewise-linear interpolant over strictly increasing abscissae.
#[derive(Clone, Debug, PartialEq)]
pub struct LinearInterp {
    xs: Vec<f64>,
    ys: Vec<f64>,
}

impl LinearInterp {
    /// `xs` must be strictly monotone in either direction; decreasing input is
    /// reversed so lookups can binary-search.
    pub fn new(mut xs: Vec<f64>, mut ys: Vec<f64>) -> Result<Self, LutError> {
        if xs.len() != ys.len() {
            return Err(LutError::LengthMismatch {
                xs: xs.len(),
                ys: ys.len(),
            });
        }
        if xs.len() < 2 {
            return Err(LutError::TooFewBreakpoints { found: xs.len() });
        }
        if xs.iter().chain(ys.iter()).any(|v| !v.is_finite()) {
            return Err(LutError::NonFinite);
        }
        if xs[0] > xs[1] {
            xs.reverse();
            ys.reverse();
        }
        if xs.windows(2).any(|w| w[0] >= w[1]) {
            return Err(LutError::NotMonotone { what: "abscissa" });
        }
        Ok(Self { xs, ys })
    }

    /// `(min, max)` of the sampled abscissae.
    #[inline]
    pub fn domain(&self) -> (f64, f64) {
        (self.xs[0], self.xs[self.xs.len() - 1])
    }

    pub fn eval(&self, x: f64) -> f64 {
        let n = self.xs.len();
        // Index of the segment's left breakpoint, pinned to the end segments
        // so out-of-range queries extrapolate.
        let i = self
            .xs
            .partition_point(|&v| v <= x)
            .saturating_sub(1)
            .min(n - 2);
        let (x0, x1) = (self.xs[i], self.xs[i + 1]);
        let (y0, y1) = (self.ys[i], self.ys[i + 1]);
        y0 + (y1 - y0) * (x - x0) / (x1 - x0)
    }
}

/// Lens breakpoints as they appear in a camera config record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LensTable {
    #[serde(rename = "zoombreakpoints")]
    pub zoom: Vec<f64>,
    #[serde(rename = "xfov")]
    pub pan_fov: Vec<f64>,
    #[serde(rename = "yfov")]
    pub tilt_fov: Vec<f64>,
}

/// The four zoom/FOV interpolants of one lens.
#[derive(Clone, Debug, PartialEq)]
pub struct ZoomLut {
    zoom_to_pan: LinearInterp,
    pan_to_zoom: LinearInterp,
    zoom_to_tilt: LinearInterp,
    tilt_to_zoom: LinearInterp,
}

impl ZoomLut {
    pub fn new(zoom: &[f64], pan_fov: &[f64], tilt_fov: &[f64]) -> Result<Self, LutError> {
        for fov in [pan_fov, tilt_fov] {
            if fov.len() != zoom.len() {
                return Err(LutError::LengthMismatch {
                    xs: zoom.len(),
                    ys: fov.len(),
                });
            }
        }
        let lut = Self {
            zoom_to_pan: LinearInterp::new(zoom.to_vec(), pan_fov.to_vec())?,
            pan_to_zoom: LinearInterp::new(pan_fov.to_vec(), zoom.to_vec())
                .map_err(|e| rename_monotone(e, "xfov"))?,
            zoom_to_tilt: LinearInterp::new(zoom.to_vec(), tilt_fov.to_vec())?,
            tilt_to_zoom: LinearInterp::new(tilt_fov.to_vec(), zoom.to_vec())
                .map_err(|e| rename_monotone(e, "yfov"))?,
        };
        log::debug!(
            "zoom lut: {} breakpoints, zoom {:?}, pan fov {:?}",
            zoom.len(),
            lut.zoom_bounds(),
            lut.pan_fov_bounds()
        );
        Ok(lut)
    }

    pub fn from_table(table: &LensTable) -> Result<Self, LutError> {
        Self::new(&table.zoom, &table.pan_fov, &table.tilt_fov)
    }

    /// Horizontal field of view in degrees at `zoom`.
    #[inline]
    pub fn pan_fov(&self, zoom: f64) -> f64 {
        self.zoom_to_pan.eval(zoom)
    }

    #[inline]
    pub fn zoom_for_pan_fov(&self, fov: f64) -> f64 {
        self.pan_to_zoom.eval(fov)
    }

    /// Vertical field of view in degrees at `zoom`.
    #[inline]
    pub fn tilt_fov(&self, zoom: f64) -> f64 {
        self.zoom_to_tilt.eval(zoom)
    }

    #[inline]
    pub fn zoom_for_tilt_fov(&self, fov: f64) -> f64 {
        self.tilt_to_zoom.eval(fov)
    }

    #[inline]
    pub fn zoom_bounds(&self) -> (f64, f64) {
        self.zoom_to_pan.domain()
    }

    /// `(narrowest, widest)` sampled horizontal field of view.
    #[inline]
    pub fn pan_fov_bounds(&self) -> (f64, f64) {
        self.pan_to_zoom.domain()
    }

    #[inline]
    pub fn tilt_fov_bounds(&self) -> (f64, f64) {
        self.tilt_to_zoom.domain()
    }
}

fn rename_monotone(err: LutError, what: &'static str) -> LutError {
    match err {
        LutError::NotMonotone { .. } => LutError::NotMonotone { what },
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn lens() -> ZoomLut {
        ZoomLut::new(
            &[0.0, 4000.0, 8000.0, 12000.0, 16000.0],
            &[60.0, 31.0, 16.5, 9.0, 4.2],
            &[34.0, 17.5, 9.3, 5.1, 2.4],
        )
        .unwrap()
    }

    #[test]
    fn interpolates_between_breakpoints() {
        let lut = lens();
        assert_abs_diff_eq!(lut.pan_fov(2000.0), 45.5, epsilon = 1e-12);
        assert_abs_diff_eq!(lut.tilt_fov(8000.0), 9.3, epsilon = 1e-12);
        assert_abs_diff_eq!(lut.zoom_for_pan_fov(16.5), 8000.0, epsilon = 1e-9);
    }

    #[test]
    fn inverse_recovers_zoom_on_sampled_range() {
        let lut = lens();
        for i in 0..=160 {
            let z = i as f64 * 100.0;
            assert_abs_diff_eq!(lut.zoom_for_pan_fov(lut.pan_fov(z)), z, epsilon = 1e-6);
            assert_abs_diff_eq!(lut.zoom_for_tilt_fov(lut.tilt_fov(z)), z, epsilon = 1e-6);
        }
    }

    #[test]
    fn extrapolates_linearly_past_the_ends() {
        let lut = lens();
        // Slope of the last segment is (4.2 - 9.0) / 4000.
        assert_abs_diff_eq!(lut.pan_fov(20000.0), 4.2 - 4.8, epsilon = 1e-9);
        assert_abs_diff_eq!(lut.pan_fov(-4000.0), 89.0, epsilon = 1e-9);
        assert_abs_diff_eq!(lut.zoom_for_pan_fov(70.0), -1379.3103448, epsilon = 1e-4);
    }

    #[test]
    fn bounds_report_sorted_extents() {
        let lut = lens();
        assert_eq!(lut.zoom_bounds(), (0.0, 16000.0));
        assert_eq!(lut.pan_fov_bounds(), (4.2, 60.0));
        assert_eq!(lut.tilt_fov_bounds(), (2.4, 34.0));
    }

    #[test]
    fn invalid_tables_are_rejected() {
        assert_eq!(
            ZoomLut::new(&[0.0, 1.0], &[3.0], &[1.0, 0.5]),
            Err(LutError::LengthMismatch { xs: 2, ys: 1 })
        );
        assert_eq!(
            ZoomLut::new(&[0.0], &[3.0], &[1.0]),
            Err(LutError::TooFewBreakpoints { found: 1 })
        );
        assert_eq!(
            ZoomLut::new(&[0.0, f64::NAN], &[3.0, 2.0], &[1.0, 0.5]),
            Err(LutError::NonFinite)
        );
        assert_eq!(
            ZoomLut::new(&[0.0, 1.0, 2.0], &[3.0, 2.0, 2.0], &[1.0, 0.5, 0.2]),
            Err(LutError::NotMonotone { what: "xfov" })
        );
        assert_eq!(
            ZoomLut::new(&[0.0, 2.0, 1.0], &[3.0, 2.0, 1.0], &[1.0, 0.5, 0.2]),
            Err(LutError::NotMonotone { what: "abscissa" })
        );
    }

    #[test]
    fn lens_table_reads_config_names() {
        let t: LensTable = serde_json::from_str(
            r#"{"zoombreakpoints": [0, 10], "xfov": [50, 5], "yfov": [30, 3]}"#,
        )
        .unwrap();
        let lut = ZoomLut::from_table(&t).unwrap();
        assert_abs_diff_eq!(lut.pan_fov(5.0), 27.5, epsilon = 1e-12);
    }
}
