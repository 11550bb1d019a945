//! Small geometry helpers on top of `kurbo`.
//!
//! Shapes are bound through their bounding quadrilateral: the four corners
//! in scene coordinates (top-left, top-right, bottom-right, bottom-left),
//! which may be rotated relative to the axes.

use kurbo::{Point, Rect, Vec2};

/// A shape's bounding quadrilateral in a shared coordinate frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quad {
    pub corners: [Point; 4],
}

impl Quad {
    pub fn new(corners: [Point; 4]) -> Self {
        Self { corners }
    }

    /// Axis-aligned quad from a rectangle.
    pub fn from_rect(rect: Rect) -> Self {
        Self {
            corners: [
                Point::new(rect.x0, rect.y0),
                Point::new(rect.x1, rect.y0),
                Point::new(rect.x1, rect.y1),
                Point::new(rect.x0, rect.y1),
            ],
        }
    }

    /// The four edges, each from corner `i` to corner `i + 1` (wrapping).
    pub fn edges(&self) -> impl Iterator<Item = (Point, Point)> + '_ {
        (0..4).map(|i| (self.corners[i], self.corners[(i + 1) % 4]))
    }

    /// Shortest distance from `p` to any of the four edges.
    ///
    /// Points deep inside a large shape are far from every edge; only the
    /// outline counts.
    pub fn distance_to_edges(&self, p: Point) -> f64 {
        self.edges()
            .map(|(a, b)| distance_to_segment(p, a, b))
            .fold(f64::INFINITY, f64::min)
    }
}

/// Shortest distance from `p` to the segment `a`–`b`.
///
/// A zero-length segment degrades to the distance to `a`.
pub fn distance_to_segment(p: Point, a: Point, b: Point) -> f64 {
    let ab = b - a;
    let ap = p - a;
    let ab2 = ab.dot(ab);
    let t = if ab2 == 0.0 {
        0.0
    } else {
        (ap.dot(ab) / ab2).clamp(0.0, 1.0)
    };
    p.distance(a + ab * t)
}

/// Direction of `v` in radians, `0.0` for a zero vector.
pub fn direction(v: Vec2) -> f64 {
    if v.x == 0.0 && v.y == 0.0 {
        0.0
    } else {
        v.atan2()
    }
}

/// Bounding rectangle of a non-empty point sequence.
pub fn bounding_rect(points: impl IntoIterator<Item = Point>) -> Option<Rect> {
    let mut iter = points.into_iter();
    let first = iter.next()?;
    let rect = iter.fold(Rect::from_points(first, first), |r, p| {
        r.union_pt(p)
    });
    Some(rect)
}
