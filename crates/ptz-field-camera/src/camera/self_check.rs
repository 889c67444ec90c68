//! Calibration self-consistency check.
//!
//! Refits the linear model from random pairs of calibration readings and
//! reports how much the fitted parameters move. A device that is linear
//! everywhere gives (near) zero spread.

use rand::prelude::IndexedRandom;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

use super::Camera;
use crate::calibration::{CalibrationError, CalibrationFit, CalibrationPoint};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckCalibrationParams {
    /// Number of random pairs to refit.
    pub trials: usize,
    /// Only the first `pool_size` calibration readings are drawn from;
    /// `None` uses all of them.
    pub pool_size: Option<usize>,
}

impl Default for CheckCalibrationParams {
    fn default() -> Self {
        Self {
            trials: 100,
            pool_size: None,
        }
    }
}

/// Population standard deviation of each refitted parameter.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CalibrationSpread {
    pub pan_factor_std: f64,
    pub tilt_factor_std: f64,
    pub pan_offset_std: f64,
    pub tilt_offset_std: f64,
    /// Trials that produced a fit; degenerate pairs are skipped.
    pub trials: usize,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SelfCheckError {
    #[error("self-check needs at least 2 calibration readings in the pool, got {found}")]
    PoolTooSmall { found: usize },
    #[error("self-check needs at least one trial")]
    NoTrials,
    #[error("all {trials} self-check trials drew degenerate pairs")]
    AllTrialsDegenerate { trials: usize },
}

impl Camera {
    #[cfg_attr(feature = "tracing", instrument(level = "info", skip(self, rng), fields(camera = %self.id)))]
    pub fn check_calibration<R: Rng + ?Sized>(
        &self,
        params: &CheckCalibrationParams,
        rng: &mut R,
    ) -> Result<CalibrationSpread, SelfCheckError> {
        if params.trials == 0 {
            return Err(SelfCheckError::NoTrials);
        }
        let points = self.sample.points();
        let pool = &points[..params.pool_size.map_or(points.len(), |n| n.min(points.len()))];
        if pool.len() < 2 {
            return Err(SelfCheckError::PoolTooSmall { found: pool.len() });
        }

        let mut fits = Vec::with_capacity(params.trials);
        for _ in 0..params.trials {
            let mut pair = pool.choose_multiple(&mut *rng, 2);
            let (Some(a), Some(b)) = (pair.next(), pair.next()) else {
                continue;
            };
            match self.refit(a, b) {
                Ok(fit) => fits.push(fit),
                Err(e) => log::debug!(
                    "camera {}: skipping pair {} / {}: {e}",
                    self.id,
                    a.landmark,
                    b.landmark
                ),
            }
        }
        if fits.is_empty() {
            return Err(SelfCheckError::AllTrialsDegenerate {
                trials: params.trials,
            });
        }

        let spread = CalibrationSpread {
            pan_factor_std: std_dev(fits.iter().map(|f| f.pan_delta_factor)),
            tilt_factor_std: std_dev(fits.iter().map(|f| f.tilt_delta_factor)),
            pan_offset_std: std_dev(fits.iter().map(|f| f.pan_offset)),
            tilt_offset_std: std_dev(fits.iter().map(|f| f.tilt_offset)),
            trials: fits.len(),
        };
        log::info!(
            "camera {}: self-check over {} pairs, pan factor std {:.3e}, tilt factor std {:.3e}",
            self.id,
            spread.trials,
            spread.pan_factor_std,
            spread.tilt_factor_std
        );
        Ok(spread)
    }

    /// [`Camera::check_calibration`] with a reproducible `StdRng`.
    pub fn check_calibration_seeded(
        &self,
        params: &CheckCalibrationParams,
        seed: u64,
    ) -> Result<CalibrationSpread, SelfCheckError> {
        let mut rng = StdRng::seed_from_u64(seed);
        self.check_calibration(params, &mut rng)
    }

    fn refit(
        &self,
        a: &CalibrationPoint,
        b: &CalibrationPoint,
    ) -> Result<CalibrationFit, CalibrationError> {
        CalibrationFit::from_pair(
            self.position,
            self.height,
            (self.field.landmark(a.landmark), a.reading()),
            (self.field.landmark(b.landmark), b.reading()),
        )
    }
}

fn std_dev(values: impl Iterator<Item = f64> + Clone) -> f64 {
    let n = values.clone().count() as f64;
    let mean = values.clone().sum::<f64>() / n;
    (values.map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::CalibrationSample;
    use crate::camera::test_support::{builder_at, camera_at};
    use nalgebra::Point2;
    use ptz_field_core::Landmark;

    #[test]
    fn linear_device_has_no_spread() {
        let cam = camera_at(Point2::new(40.0, -8.0), 12.0);
        let spread = cam
            .check_calibration_seeded(&CheckCalibrationParams::default(), 7)
            .unwrap();
        assert!(spread.trials > 0 && spread.trials <= 100);
        assert!(spread.pan_factor_std < 1e-9, "{spread:?}");
        assert!(spread.tilt_factor_std < 1e-9, "{spread:?}");
        assert!(spread.pan_offset_std < 1e-7, "{spread:?}");
        assert!(spread.tilt_offset_std < 1e-7, "{spread:?}");
    }

    #[test]
    fn same_seed_same_report() {
        let cam = camera_at(Point2::new(40.0, -8.0), 12.0);
        let params = CheckCalibrationParams {
            trials: 25,
            pool_size: Some(4),
        };
        let a = cam.check_calibration_seeded(&params, 42).unwrap();
        let b = cam.check_calibration_seeded(&params, 42).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn perturbed_reading_shows_up_as_spread() {
        let base = camera_at(Point2::new(40.0, -8.0), 12.0);
        let mut points = base.calibration_sample().points().to_vec();
        points[4].pan += 3.0;
        points[4].tilt -= 2.0;
        let cam = builder_at(Point2::new(40.0, -8.0), 12.0)
            .calibration(CalibrationSample::new(points))
            .build()
            .unwrap();
        let spread = cam
            .check_calibration_seeded(&CheckCalibrationParams::default(), 1)
            .unwrap();
        assert!(spread.pan_factor_std > 1e-3, "{spread:?}");
    }

    #[test]
    fn invalid_parameters_are_reported() {
        let cam = camera_at(Point2::new(40.0, -8.0), 12.0);
        let none = CheckCalibrationParams {
            trials: 0,
            pool_size: None,
        };
        assert_eq!(
            cam.check_calibration_seeded(&none, 0),
            Err(SelfCheckError::NoTrials)
        );
        let tiny = CheckCalibrationParams {
            trials: 10,
            pool_size: Some(1),
        };
        assert_eq!(
            cam.check_calibration_seeded(&tiny, 0),
            Err(SelfCheckError::PoolTooSmall { found: 1 })
        );
    }

    #[test]
    fn degenerate_pairs_are_skipped() {
        // The third reading repeats the second one's pan value.
        let base = camera_at(Point2::new(40.0, -8.0), 12.0);
        let mut points = base.calibration_sample().points()[..3].to_vec();
        points[2] = CalibrationPoint::new(Landmark::CenterSpot, points[1].pan, 5.0);
        let cam = builder_at(Point2::new(40.0, -8.0), 12.0)
            .calibration(CalibrationSample::new(points))
            .build()
            .unwrap();
        let params = CheckCalibrationParams {
            trials: 30,
            pool_size: None,
        };
        let spread = cam.check_calibration_seeded(&params, 3).unwrap();
        assert!(spread.trials > 0 && spread.trials < 30, "{spread:?}");
    }
}
