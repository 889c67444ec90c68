//! JSON loading for rig and overlay configs.

use std::fs;
use std::path::Path;

use crate::config::{ConfigError, OverlayConfig, RigConfig};

#[derive(thiserror::Error, Debug)]
pub enum IoError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl RigConfig {
    /// Load a rig config from disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, IoError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)?;
        let rig: Self = serde_json::from_str(&raw)?;
        log::debug!(
            "loaded {} camera records from {}",
            rig.camera_config.len(),
            path.display()
        );
        Ok(rig)
    }

    /// Load a rig config and merge an optional overlay file into it.
    pub fn load_with_overlay(
        path: impl AsRef<Path>,
        overlay: Option<&Path>,
    ) -> Result<Self, ConfigError> {
        let mut rig = Self::load_json(path)?;
        if let Some(overlay) = overlay {
            rig.apply_overlay(&OverlayConfig::load_json(overlay)?);
        }
        Ok(rig)
    }
}

impl OverlayConfig {
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, IoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = RigConfig::load_json(dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, IoError::Io(_)));
    }

    #[test]
    fn malformed_json_is_a_json_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"{\"camera_config\": [").unwrap();
        let err = RigConfig::load_json(file.path()).unwrap_err();
        assert!(matches!(err, IoError::Json(_)));
    }

    #[test]
    fn overlay_is_merged_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let rig_path = dir.path().join("rig.json");
        let overlay_path = dir.path().join("overlay.json");
        fs::write(
            &rig_path,
            r#"{"field": {"width": 100, "height": 60}, "camera_config": [{
                "camera_id": 2, "position": [50, -5], "height": 9,
                "panrange": [-80, 80], "tiltrange": [-10, 80],
                "zoombreakpoints": [0, 10], "xfov": [50, 5], "yfov": [30, 3],
                "calibration_data": {"7": [0, 60], "1": [-40, 70]}
            }]}"#,
        )
        .unwrap();
        fs::write(&overlay_path, r#"{"camera2": {"status": "live"}}"#).unwrap();

        let rig = RigConfig::load_with_overlay(&rig_path, Some(overlay_path.as_path())).unwrap();
        assert_eq!(
            rig.camera("2").unwrap().overlay.status.as_deref(),
            Some("live")
        );
    }
}
