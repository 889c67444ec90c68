//! Field model and planar geometry for PTZ camera calibration.
//!
//! This crate is purely geometric: it knows the pitch and its landmarks,
//! and how to build and intersect lines on it. Camera-specific logic lives
//! in `ptz-field-camera`.

mod field;
mod landmark;
mod line;
mod logger;

pub use field::{Field, FieldDimensions, FieldError, FieldMarkings, FieldSide};
pub use landmark::{Landmark, LANDMARK_COUNT};
pub use line::{
    circle_line_intersection, intersect_all, lines_through, CircleLineIntersection, Line,
};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::{init_with_level, level_from_verbosity};
