//! Pitch model: field dimensions, marking constants and landmark placement.

use crate::landmark::{Landmark, LANDMARK_COUNT};
use crate::line::{circle_line_intersection, CircleLineIntersection, Line};
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Field extent as read from configuration (meters).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldDimensions {
    pub width: f64,
    pub height: f64,
}

/// Standard pitch-marking constants, in meters before scaling.
///
/// Every length (and the field extent itself) is multiplied by `scale`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldMarkings {
    pub scale: f64,
    pub center_circle_radius: f64,
    pub penalty_spot_offset: f64,
    pub goal_width: f64,
    pub goal_depth: f64,
    pub penalty_area_offset: f64,
    pub goal_area_offset: f64,
    /// Margin added to every coordinate, e.g. to leave room for goals at `x < 0`.
    pub field_offset: f64,
}

impl Default for FieldMarkings {
    fn default() -> Self {
        Self {
            scale: 1.0,
            center_circle_radius: 9.1440,
            penalty_spot_offset: 10.9728,
            goal_width: 7.3152,
            goal_depth: 2.7432,
            penalty_area_offset: 16.4592,
            goal_area_offset: 5.4864,
            field_offset: 0.0,
        }
    }
}

impl FieldMarkings {
    fn scaled(&self) -> Self {
        let s = self.scale;
        Self {
            scale: 1.0,
            center_circle_radius: self.center_circle_radius * s,
            penalty_spot_offset: self.penalty_spot_offset * s,
            goal_width: self.goal_width * s,
            goal_depth: self.goal_depth * s,
            penalty_area_offset: self.penalty_area_offset * s,
            goal_area_offset: self.goal_area_offset * s,
            field_offset: self.field_offset * s,
        }
    }

    fn lengths(&self) -> [f64; 7] {
        [
            self.center_circle_radius,
            self.penalty_spot_offset,
            self.goal_width,
            self.goal_depth,
            self.penalty_area_offset,
            self.goal_area_offset,
            self.field_offset,
        ]
    }
}

/// Field construction errors.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum FieldError {
    #[error("field dimensions must be finite and > 0 (width={width}, height={height})")]
    InvalidDimensions { width: f64, height: f64 },
    #[error("marking scale must be finite and > 0, lengths finite and >= 0")]
    InvalidMarkings,
    #[error("penalty arc around {center} misses the line {from} -> {to}")]
    ArcIntersection {
        center: Landmark,
        from: Landmark,
        to: Landmark,
    },
}

/// One of the four boundary lines of the pitch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldSide {
    Top,
    Bottom,
    Left,
    Right,
}

impl FieldSide {
    pub const ALL: [FieldSide; 4] = [
        FieldSide::Top,
        FieldSide::Bottom,
        FieldSide::Left,
        FieldSide::Right,
    ];
}

/// Immutable pitch model with its 35 landmarks.
#[derive(Clone, Debug, PartialEq)]
pub struct Field {
    width: f64,
    height: f64,
    markings: FieldMarkings,
    landmarks: [Point2<f64>; LANDMARK_COUNT],
}

impl Field {
    /// Build a standard pitch of the given size.
    pub fn new(width: f64, height: f64) -> Result<Self, FieldError> {
        Self::with_markings(width, height, FieldMarkings::default())
    }

    pub fn from_dimensions(dims: FieldDimensions) -> Result<Self, FieldError> {
        Self::new(dims.width, dims.height)
    }

    /// Build a pitch with custom marking constants.
    #[cfg_attr(feature = "tracing", instrument(level = "debug", skip(markings)))]
    pub fn with_markings(
        width: f64,
        height: f64,
        markings: FieldMarkings,
    ) -> Result<Self, FieldError> {
        if !markings.scale.is_finite()
            || markings.scale <= 0.0
            || markings.lengths().iter().any(|v| !v.is_finite() || *v < 0.0)
        {
            return Err(FieldError::InvalidMarkings);
        }
        let width_s = width * markings.scale;
        let height_s = height * markings.scale;
        if !(width_s.is_finite() && height_s.is_finite()) || width_s <= 0.0 || height_s <= 0.0 {
            return Err(FieldError::InvalidDimensions { width, height });
        }

        let m = markings.scaled();
        let mut pts = [Point2::origin(); LANDMARK_COUNT];
        place_outline(&mut pts, width_s, height_s, &m);
        place_penalty_boxes(&mut pts, width_s, height_s, &m);
        place_goal_areas(&mut pts, width_s, height_s, &m);
        place_goal_posts(&mut pts, width_s, height_s, &m);
        place_penalty_arc(
            &mut pts,
            m.center_circle_radius,
            Landmark::LeftPenaltySpot,
            (Landmark::LeftPenaltyBoxTopRight, Landmark::LeftPenaltyBoxBottomRight),
            (Landmark::LeftPenaltyArcTop, Landmark::LeftPenaltyArcBottom),
        )?;
        place_penalty_arc(
            &mut pts,
            m.center_circle_radius,
            Landmark::RightPenaltySpot,
            (Landmark::RightPenaltyBoxTopLeft, Landmark::RightPenaltyBoxBottomLeft),
            (Landmark::RightPenaltyArcTop, Landmark::RightPenaltyArcBottom),
        )?;

        log::debug!("generated field {width_s}x{height_s} with {LANDMARK_COUNT} landmarks");

        Ok(Self {
            width: width_s,
            height: height_s,
            markings,
            landmarks: pts,
        })
    }

    /// Scaled field width.
    #[inline]
    pub fn width(&self) -> f64 {
        self.width
    }

    /// Scaled field height.
    #[inline]
    pub fn height(&self) -> f64 {
        self.height
    }

    #[inline]
    pub fn markings(&self) -> &FieldMarkings {
        &self.markings
    }

    #[inline]
    pub fn landmark(&self, landmark: Landmark) -> Point2<f64> {
        self.landmarks[landmark.index()]
    }

    /// All landmarks in index order.
    #[inline]
    pub fn landmarks(&self) -> &[Point2<f64>; LANDMARK_COUNT] {
        &self.landmarks
    }

    /// Landmarks paired with their names.
    pub fn named_landmarks(&self) -> impl Iterator<Item = (Landmark, Point2<f64>)> + '_ {
        Landmark::ALL.iter().map(move |&lm| (lm, self.landmark(lm)))
    }

    #[inline]
    pub fn center(&self) -> Point2<f64> {
        self.landmark(Landmark::CenterSpot)
    }

    /// Length of the field diagonal, the largest distance any fenced
    /// projection may reach.
    #[inline]
    pub fn diagonal(&self) -> f64 {
        self.width.hypot(self.height)
    }

    /// Minimum and maximum corners of the playing area.
    pub fn bounds(&self) -> (Point2<f64>, Point2<f64>) {
        (
            self.landmark(Landmark::TopLeftCorner),
            self.landmark(Landmark::BottomRightCorner),
        )
    }

    /// True if `p` lies inside the playing area (boundary included).
    pub fn contains(&self, p: Point2<f64>) -> bool {
        let (lo, hi) = self.bounds();
        (lo.x..=hi.x).contains(&p.x) && (lo.y..=hi.y).contains(&p.y)
    }

    pub fn side_line(&self, side: FieldSide) -> Line {
        let (a, b) = match side {
            FieldSide::Top => (Landmark::TopLeftCorner, Landmark::TopRightCorner),
            FieldSide::Bottom => (Landmark::BottomLeftCorner, Landmark::BottomRightCorner),
            FieldSide::Left => (Landmark::TopLeftCorner, Landmark::BottomLeftCorner),
            FieldSide::Right => (Landmark::TopRightCorner, Landmark::BottomRightCorner),
        };
        Line::through(self.landmark(a), self.landmark(b))
    }

    /// The four boundary lines: top, bottom, left, right.
    pub fn side_lines(&self) -> [(FieldSide, Line); 4] {
        FieldSide::ALL.map(|side| (side, self.side_line(side)))
    }
}

fn set(pts: &mut [Point2<f64>; LANDMARK_COUNT], lm: Landmark, x: f64, y: f64) {
    pts[lm.index()] = Point2::new(x, y);
}

fn place_outline(pts: &mut [Point2<f64>; LANDMARK_COUNT], w: f64, h: f64, m: &FieldMarkings) {
    let o = m.field_offset;
    let (cx, cy) = (w / 2.0 + o, h / 2.0 + o);
    set(pts, Landmark::TopLeftCorner, o, o);
    set(pts, Landmark::MidfieldTop, cx, o);
    set(pts, Landmark::TopRightCorner, w + o, o);
    set(pts, Landmark::BottomLeftCorner, o, h + o);
    set(pts, Landmark::MidfieldBottom, cx, h + o);
    set(pts, Landmark::BottomRightCorner, w + o, h + o);
    set(pts, Landmark::CenterSpot, cx, cy);
    set(pts, Landmark::CenterCircleTop, cx, cy - m.center_circle_radius);
    set(pts, Landmark::CenterCircleBottom, cx, cy + m.center_circle_radius);
}

/// Top and bottom `y` of a box that extends `depth` beyond the goal mouth.
fn box_rows(h: f64, m: &FieldMarkings, depth: f64) -> (f64, f64) {
    let o = m.field_offset;
    let half_goal = m.goal_width / 2.0;
    (
        h / 2.0 - half_goal - depth + o,
        h / 2.0 + half_goal + depth + o,
    )
}

fn place_penalty_boxes(
    pts: &mut [Point2<f64>; LANDMARK_COUNT],
    w: f64,
    h: f64,
    m: &FieldMarkings,
) {
    let o = m.field_offset;
    let pa = m.penalty_area_offset;
    let (top, bottom) = box_rows(h, m, pa);

    set(pts, Landmark::LeftPenaltyBoxTopLeft, o, top);
    set(pts, Landmark::LeftPenaltyBoxTopRight, o + pa, top);
    set(pts, Landmark::LeftPenaltyBoxBottomLeft, o, bottom);
    set(pts, Landmark::LeftPenaltyBoxBottomRight, o + pa, bottom);
    set(pts, Landmark::LeftPenaltySpot, m.penalty_spot_offset + o, h / 2.0 + o);

    set(pts, Landmark::RightPenaltyBoxTopLeft, w - pa + o, top);
    set(pts, Landmark::RightPenaltyBoxTopRight, w + o, top);
    set(pts, Landmark::RightPenaltyBoxBottomLeft, w - pa + o, bottom);
    set(pts, Landmark::RightPenaltyBoxBottomRight, w + o, bottom);
    set(pts, Landmark::RightPenaltySpot, w - m.penalty_spot_offset + o, h / 2.0 + o);
}

fn place_goal_areas(pts: &mut [Point2<f64>; LANDMARK_COUNT], w: f64, h: f64, m: &FieldMarkings) {
    let o = m.field_offset;
    let ga = m.goal_area_offset;
    let (top, bottom) = box_rows(h, m, ga);

    set(pts, Landmark::LeftGoalAreaTopLeft, o, top);
    set(pts, Landmark::LeftGoalAreaTopRight, o + ga, top);
    set(pts, Landmark::LeftGoalAreaBottomLeft, o, bottom);
    set(pts, Landmark::LeftGoalAreaBottomRight, o + ga, bottom);

    set(pts, Landmark::RightGoalAreaTopLeft, w - ga + o, top);
    set(pts, Landmark::RightGoalAreaTopRight, w + o, top);
    set(pts, Landmark::RightGoalAreaBottomLeft, w - ga + o, bottom);
    set(pts, Landmark::RightGoalAreaBottomRight, w + o, bottom);
}

/// Posts sit on the goal line; the goal depth only affects the (untracked)
/// back corners of the net.
fn place_goal_posts(pts: &mut [Point2<f64>; LANDMARK_COUNT], w: f64, h: f64, m: &FieldMarkings) {
    let (top, bottom) = box_rows(h, m, 0.0);
    let o = m.field_offset;
    set(pts, Landmark::LeftGoalPostTop, o, top);
    set(pts, Landmark::LeftGoalPostBottom, o, bottom);
    set(pts, Landmark::RightGoalPostTop, w + o, top);
    set(pts, Landmark::RightGoalPostBottom, w + o, bottom);
}

/// Intersect the arc of radius `radius` around `center` with the line through
/// `edge`. The `+` root lands on the second slot of `slots`, the `−` root on
/// the first.
fn place_penalty_arc(
    pts: &mut [Point2<f64>; LANDMARK_COUNT],
    radius: f64,
    center: Landmark,
    edge: (Landmark, Landmark),
    slots: (Landmark, Landmark),
) -> Result<(), FieldError> {
    let hit = circle_line_intersection(
        pts[center.index()],
        radius,
        pts[edge.0.index()],
        pts[edge.1.index()],
    );
    let (top, bottom) = match hit {
        CircleLineIntersection::Secant(plus, minus) => (minus, plus),
        CircleLineIntersection::Tangent(t) => {
            log::warn!("penalty arc around {center} is tangent to its box edge");
            (t, t)
        }
        CircleLineIntersection::None => {
            return Err(FieldError::ArcIntersection {
                center,
                from: edge.0,
                to: edge.1,
            })
        }
    };
    pts[slots.0.index()] = top;
    pts[slots.1.index()] = bottom;
    Ok(())
}
