#![warn(missing_docs)]

//! Math types for the sphereseg clipping library.
//!
//! Thin wrappers around nalgebra providing the types shared by the mesh
//! and clipping crates: points, vectors, affine placements and simple
//! bounding volumes.

use nalgebra::{Matrix4, Vector3};
use serde::{Deserialize, Serialize};

/// A point in 3D space.
pub type Point3 = nalgebra::Point3<f64>;

/// A vector in 3D space.
pub type Vec3 = Vector3<f64>;

/// A 4x4 affine transformation matrix placing a mesh in world space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    /// The underlying 4x4 matrix.
    pub matrix: Matrix4<f64>,
}

impl Transform {
    /// Identity transform.
    pub fn identity() -> Self {
        Self {
            matrix: Matrix4::identity(),
        }
    }

    /// Build a transform from a row-major 4x4 array, as written in job files.
    pub fn from_rows(rows: [[f64; 4]; 4]) -> Self {
        Self {
            matrix: Matrix4::from_fn(|r, c| rows[r][c]),
        }
    }

    /// Translation by `(dx, dy, dz)`.
    pub fn translation(dx: f64, dy: f64, dz: f64) -> Self {
        Self {
            matrix: Matrix4::new_translation(&Vec3::new(dx, dy, dz)),
        }
    }

    /// Transform a point.
    pub fn apply_point(&self, p: &Point3) -> Point3 {
        self.matrix.transform_point(p)
    }

    /// True when every matrix entry is finite.
    pub fn is_finite(&self) -> bool {
        self.matrix.iter().all(|v| v.is_finite())
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

/// An axis-aligned bounding box.
///
/// A freshly created box is empty (`min > max`) until a point is added.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Minimum corner.
    pub min: Point3,
    /// Maximum corner.
    pub max: Point3,
}

impl BoundingBox {
    /// An empty box.
    pub fn empty() -> Self {
        Self {
            min: Point3::new(f64::MAX, f64::MAX, f64::MAX),
            max: Point3::new(f64::MIN, f64::MIN, f64::MIN),
        }
    }

    /// Box spanning the given points, or `None` if there are none.
    pub fn from_points<'a, I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Point3>,
    {
        let mut bbox = Self::empty();
        for p in points {
            bbox.expand(p);
        }
        bbox.is_valid().then_some(bbox)
    }

    /// True once at least one point has been added.
    pub fn is_valid(&self) -> bool {
        self.min.x <= self.max.x && self.min.y <= self.max.y && self.min.z <= self.max.z
    }

    /// Grow the box to contain `p`.
    pub fn expand(&mut self, p: &Point3) {
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.min.z = self.min.z.min(p.z);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
        self.max.z = self.max.z.max(p.z);
    }

    /// Grow the box to contain `other`.
    pub fn merge(&mut self, other: &BoundingBox) {
        if other.is_valid() {
            self.expand(&other.min);
            self.expand(&other.max);
        }
    }

    /// Whether `p` lies inside or on the box.
    pub fn contains(&self, p: &Point3) -> bool {
        p.x >= self.min.x
            && p.x <= self.max.x
            && p.y >= self.min.y
            && p.y <= self.max.y
            && p.z >= self.min.z
            && p.z <= self.max.z
    }

    /// Centre of the box.
    pub fn center(&self) -> Point3 {
        nalgebra::center(&self.min, &self.max)
    }

    /// Half the diagonal length.
    pub fn radius(&self) -> f64 {
        (self.max - self.min).norm() * 0.5
    }

    /// The eight corners of the box.
    pub fn corners(&self) -> [Point3; 8] {
        let (a, b) = (self.min, self.max);
        [
            Point3::new(a.x, a.y, a.z),
            Point3::new(b.x, a.y, a.z),
            Point3::new(a.x, b.y, a.z),
            Point3::new(b.x, b.y, a.z),
            Point3::new(a.x, a.y, b.z),
            Point3::new(b.x, a.y, b.z),
            Point3::new(a.x, b.y, b.z),
            Point3::new(b.x, b.y, b.z),
        ]
    }

    /// Closest point of the box to `p`.
    pub fn closest_point(&self, p: &Point3) -> Point3 {
        Point3::new(
            p.x.clamp(self.min.x, self.max.x),
            p.y.clamp(self.min.y, self.max.y),
            p.z.clamp(self.min.z, self.max.z),
        )
    }

    /// Bounds of this box after transforming its corners.
    pub fn transformed(&self, t: &Transform) -> BoundingBox {
        let corners = self.corners().map(|c| t.apply_point(&c));
        let mut out = BoundingBox::empty();
        for c in &corners {
            out.expand(c);
        }
        out
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::empty()
    }
}

/// A bounding sphere.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingSphere {
    /// Centre of the sphere.
    pub center: Point3,
    /// Radius of the sphere.
    pub radius: f64,
}

impl BoundingSphere {
    /// Create a new bounding sphere.
    pub fn new(center: Point3, radius: f64) -> Self {
        Self { center, radius }
    }

    /// Whether `p` lies inside or on the sphere.
    pub fn contains(&self, p: &Point3) -> bool {
        (p - self.center).norm_squared() <= self.radius * self.radius
    }

    /// Whether the sphere touches the box.
    pub fn intersects_box(&self, bbox: &BoundingBox) -> bool {
        if !bbox.is_valid() {
            return false;
        }
        self.contains(&bbox.closest_point(&self.center))
    }
}
