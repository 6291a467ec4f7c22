//! The cutting surfaces of a wedge and their edge intersectors.
//!
//! Every surface exposes a signed distance (positive on the wedge side)
//! and an exact crossing point for a segment. Edge tests are derived from
//! the sign of the distance at the two endpoints, so a segment that
//! enters and leaves a surface between its endpoints is not reported.
//! All points are relative to the wedge centre.

use serde::{Deserialize, Serialize};
use sphereseg_math::Point3;

use crate::region::WedgeBounds;

/// Which bounding surface a curve lies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurfaceKind {
    /// The outer sphere.
    Radius,
    /// The half-plane at the minimum azimuth.
    AzimuthMin,
    /// The half-plane at the maximum azimuth.
    AzimuthMax,
    /// The cone at the minimum elevation.
    ElevationMin,
    /// The cone at the maximum elevation.
    ElevationMax,
}

impl SurfaceKind {
    /// All surfaces in pipeline order.
    pub const ALL: [SurfaceKind; 5] = [
        SurfaceKind::Radius,
        SurfaceKind::AzimuthMin,
        SurfaceKind::AzimuthMax,
        SurfaceKind::ElevationMin,
        SurfaceKind::ElevationMax,
    ];
}

/// How an edge meets a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntersectionType {
    /// The first endpoint lies on the surface.
    Point1,
    /// The second endpoint lies on the surface.
    Point2,
    /// The edge crosses the surface between its endpoints.
    MidPoint,
    /// Both endpoints lie on the surface.
    BothEnds,
}

/// A cached edge/surface intersection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeIntersection {
    /// How the edge meets the surface.
    pub kind: IntersectionType,
    /// The crossing point (the first endpoint for [`IntersectionType::BothEnds`]).
    pub point: Point3,
    /// The endpoints lie on opposite sides, counting points on the surface
    /// as inside.
    pub crosses: bool,
}

impl EdgeIntersection {
    /// Whether a curve passes through this edge.
    ///
    /// An endpoint on the surface only carries a curve when the other
    /// endpoint is outside, so runs of vertices lying on the surface are
    /// traced once, from the outside neighbours.
    pub fn is_crossing(&self) -> bool {
        self.crosses
    }
}

/// A surface that can cut edges and trim curves.
pub trait CutSurface {
    /// Signed distance-like value: positive inside, zero on the surface.
    fn distance(&self, p: &Point3) -> f64;

    /// Point where the segment `a`-`b` meets the surface.
    ///
    /// Callers guarantee the distance changes sign between `a` and `b`.
    fn intersection_point(&self, a: &Point3, b: &Point3) -> Point3;

    /// Test an edge for a crossing.
    fn intersect_edge(&self, a: &Point3, b: &Point3) -> Option<EdgeIntersection> {
        let da = self.distance(a);
        let db = self.distance(b);
        let (kind, point) = if da == 0.0 && db == 0.0 {
            (IntersectionType::BothEnds, *a)
        } else if da == 0.0 {
            (IntersectionType::Point1, *a)
        } else if db == 0.0 {
            (IntersectionType::Point2, *b)
        } else if (da < 0.0) != (db < 0.0) {
            (IntersectionType::MidPoint, self.intersection_point(a, b))
        } else {
            return None;
        };
        Some(EdgeIntersection {
            kind,
            point,
            crosses: (da < 0.0) != (db < 0.0),
        })
    }
}

/// Crossing of a linear distance field along `a`-`b`.
fn lerp_crossing(a: &Point3, b: &Point3, da: f64, db: f64) -> Point3 {
    let denom = da - db;
    if denom == 0.0 {
        return *a;
    }
    let t = (da / denom).clamp(0.0, 1.0);
    a + (b - a) * t
}

/// Solve `qa t² + qb t + qc = 0` for its real roots.
fn quadratic_roots(qa: f64, qb: f64, qc: f64) -> Vec<f64> {
    if qa.abs() < f64::EPSILON * (qb.abs() + qc.abs()).max(f64::MIN_POSITIVE) {
        if qb == 0.0 {
            return Vec::new();
        }
        return vec![-qc / qb];
    }
    let disc = (qb * qb - 4.0 * qa * qc).max(0.0);
    let sq = disc.sqrt();
    vec![(-qb - sq) / (2.0 * qa), (-qb + sq) / (2.0 * qa)]
}

/// Choose the crossing along `a`-`b` among the candidate parameters.
///
/// Parameters are clamped to the segment and the one whose point lies
/// closest to the surface wins. The linear estimate is always a candidate
/// so a crossing is returned even when round-off loses the roots.
fn best_crossing<S: CutSurface + ?Sized>(surface: &S, a: &Point3, b: &Point3, roots: &[f64]) -> Point3 {
    let da = surface.distance(a);
    let db = surface.distance(b);
    let mut best = lerp_crossing(a, b, da, db);
    let mut best_err = surface.distance(&best).abs();
    for &t in roots {
        if !t.is_finite() {
            continue;
        }
        let p = a + (b - a) * t.clamp(0.0, 1.0);
        let err = surface.distance(&p).abs();
        if err < best_err {
            best = p;
            best_err = err;
        }
    }
    best
}

/// The outer sphere.
#[derive(Debug, Clone, Copy)]
pub struct RadiusSurface {
    radius: f64,
}

impl RadiusSurface {
    /// Sphere of the given radius about the origin.
    pub fn new(radius: f64) -> Self {
        Self { radius }
    }
}

impl CutSurface for RadiusSurface {
    fn distance(&self, p: &Point3) -> f64 {
        self.radius * self.radius - p.coords.norm_squared()
    }

    fn intersection_point(&self, a: &Point3, b: &Point3) -> Point3 {
        let d = b - a;
        let qa = d.norm_squared();
        if qa == 0.0 {
            return *a;
        }
        let qb = 2.0 * a.coords.dot(&d);
        let qc = a.coords.norm_squared() - self.radius * self.radius;
        best_crossing(self, a, b, &quadratic_roots(qa, qb, qc))
    }
}

/// A half-plane through the Z axis at a fixed azimuth.
///
/// The minimum plane keeps increasing azimuth, the maximum plane keeps
/// decreasing azimuth.
#[derive(Debug, Clone, Copy)]
pub struct AzimuthSurface {
    cos_az: f64,
    sin_az: f64,
    sign: f64,
}

impl AzimuthSurface {
    /// Plane bounding the wedge at its minimum azimuth.
    pub fn min(az: f64) -> Self {
        let (sin_az, cos_az) = az.sin_cos();
        Self {
            cos_az,
            sin_az,
            sign: 1.0,
        }
    }

    /// Plane bounding the wedge at its maximum azimuth.
    pub fn max(az: f64) -> Self {
        let (sin_az, cos_az) = az.sin_cos();
        Self {
            cos_az,
            sin_az,
            sign: -1.0,
        }
    }
}

impl CutSurface for AzimuthSurface {
    fn distance(&self, p: &Point3) -> f64 {
        self.sign * (self.cos_az * p.x - self.sin_az * p.y)
    }

    fn intersection_point(&self, a: &Point3, b: &Point3) -> Point3 {
        lerp_crossing(a, b, self.distance(a), self.distance(b))
    }
}

/// Selects the half of an azimuth plane that faces the wedge.
///
/// The full plane through the Z axis contains both the azimuth `az` and
/// `az + pi`; curves traced on it are cut to the `az` side.
#[derive(Debug, Clone, Copy)]
pub struct AzimuthSideSurface {
    cos_az: f64,
    sin_az: f64,
}

impl AzimuthSideSurface {
    /// Side selector for the half-plane at `az`.
    pub fn new(az: f64) -> Self {
        let (sin_az, cos_az) = az.sin_cos();
        Self { cos_az, sin_az }
    }
}

impl CutSurface for AzimuthSideSurface {
    fn distance(&self, p: &Point3) -> f64 {
        self.sin_az * p.x + self.cos_az * p.y
    }

    fn intersection_point(&self, a: &Point3, b: &Point3) -> Point3 {
        lerp_crossing(a, b, self.distance(a), self.distance(b))
    }
}

/// A cone of constant elevation with its apex at the origin.
///
/// The distance `z cos(e) - |xy| sin(e)` equals `r sin(elevation - e)`,
/// so it changes sign exactly on the cone's own nappe.
#[derive(Debug, Clone, Copy)]
pub struct ElevationSurface {
    cos_e: f64,
    sin_e: f64,
    sign: f64,
}

impl ElevationSurface {
    /// Cone bounding the wedge from below.
    pub fn lower(elev: f64) -> Self {
        let (sin_e, cos_e) = elev.sin_cos();
        Self {
            cos_e,
            sin_e,
            sign: 1.0,
        }
    }

    /// Cone bounding the wedge from above.
    pub fn upper(elev: f64) -> Self {
        let (sin_e, cos_e) = elev.sin_cos();
        Self {
            cos_e,
            sin_e,
            sign: -1.0,
        }
    }
}

impl CutSurface for ElevationSurface {
    fn distance(&self, p: &Point3) -> f64 {
        let length_xy = (p.x * p.x + p.y * p.y).sqrt();
        self.sign * (p.z * self.cos_e - length_xy * self.sin_e)
    }

    fn intersection_point(&self, a: &Point3, b: &Point3) -> Point3 {
        if self.sin_e == 0.0 {
            // flat cone: the plane z = 0
            return lerp_crossing(a, b, a.z, b.z);
        }
        // z² cos²e = (x² + y²) sin²e, then reject roots on the mirrored nappe
        let d = b - a;
        let c2 = self.cos_e * self.cos_e;
        let s2 = self.sin_e * self.sin_e;
        let qa = c2 * d.z * d.z - s2 * (d.x * d.x + d.y * d.y);
        let qb = 2.0 * (c2 * a.z * d.z - s2 * (a.x * d.x + a.y * d.y));
        let qc = c2 * a.z * a.z - s2 * (a.x * a.x + a.y * a.y);
        let roots: Vec<f64> = quadratic_roots(qa, qb, qc)
            .into_iter()
            .filter(|&t| (a.z + t * d.z) * self.sin_e >= 0.0)
            .collect();
        best_crossing(self, a, b, &roots)
    }
}

/// Build the surface for `kind` from wedge angles.
pub(crate) fn surface_for(kind: SurfaceKind, bounds: &WedgeBounds) -> Box<dyn CutSurface + Send + Sync> {
    match kind {
        SurfaceKind::Radius => Box::new(RadiusSurface::new(bounds.radius)),
        SurfaceKind::AzimuthMin => Box::new(AzimuthSurface::min(bounds.az_min)),
        SurfaceKind::AzimuthMax => Box::new(AzimuthSurface::max(bounds.az_max)),
        SurfaceKind::ElevationMin => Box::new(ElevationSurface::lower(bounds.elev_min)),
        SurfaceKind::ElevationMax => Box::new(ElevationSurface::upper(bounds.elev_max)),
    }
}
