//! Implicit 2D lines and their intersections.
//!
//! Lines are stored as `A·x + B·y + C = 0` without normalization, so the
//! coefficients produced by [`Line::through`] keep the scale of the input
//! points. Singular solves are reported as `None` instead of NaN/Inf.

use nalgebra::{Matrix2, Point2, Vector2};
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Relative determinant threshold below which two lines count as parallel.
const PARALLEL_EPS: f64 = 1e-12;

/// Implicit line `a·x + b·y + c = 0`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub a: f64,
    pub b: f64,
    pub c: f64,
}

impl Line {
    pub fn new(a: f64, b: f64, c: f64) -> Self {
        Self { a, b, c }
    }

    /// Line through two points.
    ///
    /// `(A, B, C) = (y2 - y1, x1 - x2, y1·x2 - x1·y2)`. Coincident points give
    /// the degenerate line `(0, 0, 0)`.
    #[inline]
    pub fn through(p1: Point2<f64>, p2: Point2<f64>) -> Self {
        Self {
            a: p2.y - p1.y,
            b: p1.x - p2.x,
            c: p1.y * p2.x - p1.x * p2.y,
        }
    }

    #[inline]
    pub fn coefficients(&self) -> [f64; 3] {
        [self.a, self.b, self.c]
    }

    /// True when `a` and `b` are both zero, i.e. the line has no direction.
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.a == 0.0 && self.b == 0.0
    }

    /// Evaluate `a·x + b·y + c` at `p`.
    #[inline]
    pub fn eval(&self, p: Point2<f64>) -> f64 {
        self.a * p.x + self.b * p.y + self.c
    }

    /// Euclidean distance from `p` to the line, `None` for a degenerate line.
    pub fn distance_to(&self, p: Point2<f64>) -> Option<f64> {
        let norm = self.a.hypot(self.b);
        if norm == 0.0 {
            return None;
        }
        Some(self.eval(p).abs() / norm)
    }

    /// Solve `[[a1, b1], [a2, b2]]·[x, y]ᵗ = [-c1, -c2]ᵗ`.
    ///
    /// Returns `None` for parallel, coincident or degenerate lines.
    pub fn intersect(&self, other: &Line) -> Option<Point2<f64>> {
        let scale = self.a.hypot(self.b) * other.a.hypot(other.b);
        if scale == 0.0 {
            return None;
        }
        let det = self.a * other.b - other.a * self.b;
        if det.abs() <= PARALLEL_EPS * scale {
            return None;
        }

        let m = Matrix2::new(self.a, self.b, other.a, other.b);
        let rhs = Vector2::new(-self.c, -other.c);
        let sol = m.lu().solve(&rhs)?;
        if !(sol.x.is_finite() && sol.y.is_finite()) {
            return None;
        }
        Some(Point2::new(sol.x, sol.y))
    }
}

/// Vectorised [`Line::through`] over paired point sequences.
///
/// Returns `None` when the sequences differ in length.
pub fn lines_through(p1: &[Point2<f64>], p2: &[Point2<f64>]) -> Option<Vec<Line>> {
    if p1.len() != p2.len() {
        return None;
    }
    Some(
        p1.iter()
            .zip(p2)
            .map(|(&a, &b)| Line::through(a, b))
            .collect(),
    )
}

/// Intersect every line of `lines_a` with every line of `lines_b`.
///
/// `out[i][j]` is the intersection of `lines_a[i]` and `lines_b[j]`, or `None`
/// when that pair is singular. A singular pair never affects the others.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "trace", skip_all, fields(rows = lines_a.len(), cols = lines_b.len()))
)]
pub fn intersect_all(lines_a: &[Line], lines_b: &[Line]) -> Vec<Vec<Option<Point2<f64>>>> {
    lines_a
        .iter()
        .map(|la| lines_b.iter().map(|lb| la.intersect(lb)).collect())
        .collect()
}

/// Outcome of intersecting a circle with an infinite line.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CircleLineIntersection {
    /// Negative discriminant (or degenerate line): the line misses the circle.
    None,
    /// Zero discriminant: the line touches the circle once.
    Tangent(Point2<f64>),
    /// Positive discriminant. Points are ordered by the `+` then the `−` root.
    Secant(Point2<f64>, Point2<f64>),
}

impl CircleLineIntersection {
    pub fn len(&self) -> usize {
        match self {
            Self::None => 0,
            Self::Tangent(_) => 1,
            Self::Secant(..) => 2,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::None)
    }

    pub fn points(&self) -> Vec<Point2<f64>> {
        match *self {
            Self::None => Vec::new(),
            Self::Tangent(p) => vec![p],
            Self::Secant(p, q) => vec![p, q],
        }
    }
}

/// Intersect the circle `(center, radius)` with the line through `p1`, `p2`.
///
/// Non-vertical lines are written as `y = m·x + k` and substituted into the
/// circle equation, giving `a = 1 + m²`, `b = 2(m(k - yc) - xc)`,
/// `c = xc² + (k - yc)² - r²`. Vertical lines substitute `x = x1` directly
/// and solve for `y`.
pub fn circle_line_intersection(
    center: Point2<f64>,
    radius: f64,
    p1: Point2<f64>,
    p2: Point2<f64>,
) -> CircleLineIntersection {
    if !radius.is_finite() || radius < 0.0 || p1 == p2 {
        return CircleLineIntersection::None;
    }
    let (xc, yc) = (center.x, center.y);

    if p1.x == p2.x {
        let x = p1.x;
        let b = -2.0 * yc;
        let c = yc * yc - radius * radius + (x - xc) * (x - xc);
        return match solve_quadratic(1.0, b, c) {
            Roots::None => CircleLineIntersection::None,
            Roots::One(y) => CircleLineIntersection::Tangent(Point2::new(x, y)),
            Roots::Two(y_plus, y_minus) => CircleLineIntersection::Secant(
                Point2::new(x, y_plus),
                Point2::new(x, y_minus),
            ),
        };
    }

    let m = (p2.y - p1.y) / (p2.x - p1.x);
    let k = p1.y - m * p1.x;
    let a = 1.0 + m * m;
    let b = 2.0 * (m * (k - yc) - xc);
    let c = xc * xc + (k - yc) * (k - yc) - radius * radius;
    let on_line = |x: f64| Point2::new(x, m * x + k);
    match solve_quadratic(a, b, c) {
        Roots::None => CircleLineIntersection::None,
        Roots::One(x) => CircleLineIntersection::Tangent(on_line(x)),
        Roots::Two(x_plus, x_minus) => {
            CircleLineIntersection::Secant(on_line(x_plus), on_line(x_minus))
        }
    }
}

enum Roots {
    None,
    One(f64),
    Two(f64, f64),
}

fn solve_quadratic(a: f64, b: f64, c: f64) -> Roots {
    let delta = b * b - 4.0 * a * c;
    if !delta.is_finite() {
        return Roots::None;
    }
    // Treat round-off around a tangent as a single root.
    let tol = 1e-12 * (b * b).max(1.0);
    if delta.abs() <= tol {
        return Roots::One(-b / (2.0 * a));
    }
    if delta < 0.0 {
        return Roots::None;
    }
    let sq = delta.sqrt();
    Roots::Two((-b + sq) / (2.0 * a), (-b - sq) / (2.0 * a))
}
