//! Per-vertex classification against the five wedge surfaces.
//!
//! Comparisons are exact: a vertex is `Boundary` only when it lies
//! precisely on a surface.

use std::cmp::Ordering;

use sphereseg_math::Vec3;

use crate::segment::SphereSegment;

/// Position of a point relative to one bounding surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// On the wedge side of the surface.
    Inside,
    /// Exactly on the surface.
    Boundary,
    /// On the far side of the surface.
    Outside,
}

impl Classification {
    /// Classify `value` against `limit` where values below the limit are inside.
    fn below(value: f64, limit: f64) -> Self {
        match value.partial_cmp(&limit) {
            Some(Ordering::Less) => Classification::Inside,
            Some(Ordering::Equal) => Classification::Boundary,
            _ => Classification::Outside,
        }
    }

    /// Classify `value` against `limit` where values above the limit are inside.
    fn above(value: f64, limit: f64) -> Self {
        match value.partial_cmp(&limit) {
            Some(Ordering::Greater) => Classification::Inside,
            Some(Ordering::Equal) => Classification::Boundary,
            _ => Classification::Outside,
        }
    }
}

/// Wedge parameters expressed relative to the wedge centre, with the
/// trigonometry precomputed.
#[derive(Debug, Clone, Copy)]
pub struct WedgeBounds {
    /// Outer radius.
    pub radius: f64,
    /// Squared outer radius.
    pub radius2: f64,
    /// Minimum azimuth.
    pub az_min: f64,
    /// Maximum azimuth.
    pub az_max: f64,
    /// Minimum elevation.
    pub elev_min: f64,
    /// Maximum elevation.
    pub elev_max: f64,
    /// Azimuth half-planes exist.
    pub has_azimuth: bool,
    /// Azimuth span exceeds a half turn.
    pub azimuth_reflex: bool,
    /// Lower cone exists.
    pub has_lower: bool,
    /// Upper cone exists.
    pub has_upper: bool,
}

impl WedgeBounds {
    /// Capture the bounds of `segment`.
    pub fn new(segment: &SphereSegment) -> Self {
        let (az_min, az_max, elev_min, elev_max) = segment.area();
        let radius = segment.radius();
        Self {
            radius,
            radius2: radius * radius,
            az_min,
            az_max,
            elev_min,
            elev_max,
            has_azimuth: segment.has_azimuth_bounds(),
            azimuth_reflex: segment.is_azimuth_reflex(),
            has_lower: segment.has_lower_bound(),
            has_upper: segment.has_upper_bound(),
        }
    }
}

/// Classification of one vertex against every bounding surface.
///
/// Surfaces that do not exist for the wedge report `Inside`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    /// Outer sphere.
    pub radius: Classification,
    /// Half-plane at the minimum azimuth.
    pub az_min: Classification,
    /// Half-plane at the maximum azimuth.
    pub az_max: Classification,
    /// Cone at the minimum elevation.
    pub elev_min: Classification,
    /// Cone at the maximum elevation.
    pub elev_max: Classification,
}

impl Region {
    /// Classify a vertex given relative to the wedge centre.
    pub fn classify(v: &Vec3, bounds: &WedgeBounds) -> Self {
        let radius = Classification::below(v.norm_squared(), bounds.radius2);

        let (az_min, az_max) = if bounds.has_azimuth {
            let (s_min, c_min) = bounds.az_min.sin_cos();
            let (s_max, c_max) = bounds.az_max.sin_cos();
            let dot_min = c_min * v.x - s_min * v.y;
            let dot_max = c_max * v.x - s_max * v.y;
            (
                Classification::above(dot_min, 0.0),
                Classification::below(dot_max, 0.0),
            )
        } else {
            (Classification::Inside, Classification::Inside)
        };

        let length_xy = (v.x * v.x + v.y * v.y).sqrt();
        let elevation = v.z.atan2(length_xy);
        let elev_min = if bounds.has_lower {
            Classification::above(elevation, bounds.elev_min)
        } else {
            Classification::Inside
        };
        let elev_max = if bounds.has_upper {
            Classification::below(elevation, bounds.elev_max)
        } else {
            Classification::Inside
        };

        Self {
            radius,
            az_min,
            az_max,
            elev_min,
            elev_max,
        }
    }

    /// Whether the vertex is outside the azimuth range.
    ///
    /// For a reflex span the region is the union of both half-spaces, so
    /// the vertex must be outside both.
    pub fn outside_azimuth(&self, bounds: &WedgeBounds) -> bool {
        let out_min = self.az_min == Classification::Outside;
        let out_max = self.az_max == Classification::Outside;
        if bounds.azimuth_reflex {
            out_min && out_max
        } else {
            out_min || out_max
        }
    }

    /// Whether the vertex lies inside or on the wedge.
    pub fn is_inside(&self, bounds: &WedgeBounds) -> bool {
        self.radius != Classification::Outside
            && self.elev_min != Classification::Outside
            && self.elev_max != Classification::Outside
            && !self.outside_azimuth(bounds)
    }

    fn surfaces(&self) -> [Classification; 5] {
        [
            self.radius,
            self.az_min,
            self.az_max,
            self.elev_min,
            self.elev_max,
        ]
    }
}

/// Aggregate classification of a triangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriangleClass {
    /// Entirely on the far side of some surface.
    Outside,
    /// Strictly inside every surface.
    Inside,
    /// May cross at least one surface.
    Intersects,
}

/// Combine the classifications of a triangle's three vertices.
pub fn classify_triangle(regions: [&Region; 3], bounds: &WedgeBounds) -> TriangleClass {
    let all = |f: &dyn Fn(&Region) -> bool| regions.iter().all(|r| f(r));
    let outside = |c: Classification| c == Classification::Outside;

    let fully_outside = all(&|r| outside(r.radius))
        || all(&|r| outside(r.elev_min))
        || all(&|r| outside(r.elev_max))
        || if bounds.azimuth_reflex {
            all(&|r| outside(r.az_min) && outside(r.az_max))
        } else {
            all(&|r| outside(r.az_min)) || all(&|r| outside(r.az_max))
        };
    if fully_outside {
        return TriangleClass::Outside;
    }

    let inside = |c: Classification| c == Classification::Inside;
    let fully_inside = if bounds.azimuth_reflex {
        // each half-space is convex, so a triangle wholly inside one of
        // them cannot reach the other's boundary
        all(&|r| inside(r.radius) && inside(r.elev_min) && inside(r.elev_max))
            && (all(&|r| inside(r.az_min)) || all(&|r| inside(r.az_max)))
    } else {
        all(&|r| r.surfaces().iter().all(|&c| inside(c)))
    };
    if fully_inside {
        TriangleClass::Inside
    } else {
        TriangleClass::Intersects
    }
}
