//! 3D polylines produced by clipping and outline generation.

use serde::{Deserialize, Serialize};
use sphereseg_math::{Point3, Transform, Vec3};

/// An ordered run of points.
///
/// A polyline is closed when it has at least three points and its last
/// point equals its first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Polyline3 {
    /// Points along the path.
    pub points: Vec<Point3>,
}

impl Polyline3 {
    /// Create a new polyline.
    pub fn new(points: Vec<Point3>) -> Self {
        Self { points }
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Total length of the polyline.
    pub fn length(&self) -> f64 {
        self.points.windows(2).map(|w| (w[1] - w[0]).norm()).sum()
    }

    /// Starting point.
    pub fn start(&self) -> Option<&Point3> {
        self.points.first()
    }

    /// Ending point.
    pub fn end(&self) -> Option<&Point3> {
        self.points.last()
    }

    /// Whether the polyline forms a loop.
    pub fn is_closed(&self) -> bool {
        self.points.len() >= 3 && self.points.first() == self.points.last()
    }

    /// Reverse the point order in place.
    pub fn reverse(&mut self) {
        self.points.reverse();
    }

    /// Remove consecutive exactly-equal points.
    pub fn dedup(&mut self) {
        self.points.dedup();
    }

    /// Copy of this polyline with every point moved by `offset`.
    pub fn translated(&self, offset: &Vec3) -> Self {
        Self::new(self.points.iter().map(|p| p + offset).collect())
    }

    /// Copy of this polyline with `t` applied to every point.
    pub fn transformed(&self, t: &Transform) -> Self {
        Self::new(self.points.iter().map(|p| t.apply_point(p)).collect())
    }
}

impl AsRef<[Point3]> for Polyline3 {
    fn as_ref(&self) -> &[Point3] {
        &self.points
    }
}

impl From<Vec<Point3>> for Polyline3 {
    fn from(points: Vec<Point3>) -> Self {
        Self::new(points)
    }
}
