//! Named field landmarks.
//!
//! The discriminant of every variant is its slot in the landmark array, and
//! that order is a public contract: calibration configs refer to landmarks
//! by number (1-based) and the array index (0-based) is derived from it.

use serde::{Deserialize, Serialize};

/// Number of landmarks generated for every field.
pub const LANDMARK_COUNT: usize = 35;

/// One of the 35 fixed reference points of the pitch.
///
/// "Top" is the `y = 0` touchline, "left" the `x = 0` goal line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Landmark {
    TopLeftCorner = 0,
    MidfieldTop = 1,
    TopRightCorner = 2,
    BottomLeftCorner = 3,
    MidfieldBottom = 4,
    BottomRightCorner = 5,
    CenterSpot = 6,
    CenterCircleTop = 7,
    CenterCircleBottom = 8,
    LeftPenaltyBoxTopLeft = 9,
    LeftPenaltyBoxTopRight = 10,
    LeftPenaltyBoxBottomLeft = 11,
    LeftPenaltyBoxBottomRight = 12,
    LeftGoalAreaTopLeft = 13,
    LeftGoalAreaTopRight = 14,
    LeftGoalAreaBottomLeft = 15,
    LeftGoalAreaBottomRight = 16,
    RightPenaltyBoxTopLeft = 17,
    RightPenaltyBoxTopRight = 18,
    RightPenaltyBoxBottomLeft = 19,
    RightPenaltyBoxBottomRight = 20,
    RightGoalAreaTopLeft = 21,
    RightGoalAreaTopRight = 22,
    RightGoalAreaBottomLeft = 23,
    RightGoalAreaBottomRight = 24,
    LeftPenaltyArcTop = 25,
    LeftPenaltyArcBottom = 26,
    RightPenaltyArcTop = 27,
    RightPenaltyArcBottom = 28,
    LeftGoalPostTop = 29,
    LeftGoalPostBottom = 30,
    LeftPenaltySpot = 31,
    RightPenaltySpot = 32,
    RightGoalPostTop = 33,
    RightGoalPostBottom = 34,
}

impl Landmark {
    /// All landmarks in index order.
    pub const ALL: [Landmark; LANDMARK_COUNT] = [
        Landmark::TopLeftCorner,
        Landmark::MidfieldTop,
        Landmark::TopRightCorner,
        Landmark::BottomLeftCorner,
        Landmark::MidfieldBottom,
        Landmark::BottomRightCorner,
        Landmark::CenterSpot,
        Landmark::CenterCircleTop,
        Landmark::CenterCircleBottom,
        Landmark::LeftPenaltyBoxTopLeft,
        Landmark::LeftPenaltyBoxTopRight,
        Landmark::LeftPenaltyBoxBottomLeft,
        Landmark::LeftPenaltyBoxBottomRight,
        Landmark::LeftGoalAreaTopLeft,
        Landmark::LeftGoalAreaTopRight,
        Landmark::LeftGoalAreaBottomLeft,
        Landmark::LeftGoalAreaBottomRight,
        Landmark::RightPenaltyBoxTopLeft,
        Landmark::RightPenaltyBoxTopRight,
        Landmark::RightPenaltyBoxBottomLeft,
        Landmark::RightPenaltyBoxBottomRight,
        Landmark::RightGoalAreaTopLeft,
        Landmark::RightGoalAreaTopRight,
        Landmark::RightGoalAreaBottomLeft,
        Landmark::RightGoalAreaBottomRight,
        Landmark::LeftPenaltyArcTop,
        Landmark::LeftPenaltyArcBottom,
        Landmark::RightPenaltyArcTop,
        Landmark::RightPenaltyArcBottom,
        Landmark::LeftGoalPostTop,
        Landmark::LeftGoalPostBottom,
        Landmark::LeftPenaltySpot,
        Landmark::RightPenaltySpot,
        Landmark::RightGoalPostTop,
        Landmark::RightGoalPostBottom,
    ];

    /// 0-based slot in the landmark array.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// 1-based landmark number as used in calibration configs.
    #[inline]
    pub fn number(self) -> usize {
        self.index() + 1
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Inverse of [`Landmark::number`].
    pub fn from_number(number: usize) -> Option<Self> {
        number.checked_sub(1).and_then(Self::from_index)
    }
}

impl std::fmt::Display for Landmark {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}#{}", self, self.number())
    }
}
