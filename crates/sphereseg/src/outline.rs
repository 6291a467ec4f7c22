//! Geometry describing the wedge itself: its spherical patch, the edges
//! of that patch, the flat and conical sides, and the spokes from the
//! centre to the corners.
//!
//! Everything is sampled at the wedge's density and returned in world
//! coordinates. Meshes are wound so their normals face out of the wedge.

use std::f64::consts::FRAC_PI_2;
use std::ops::BitOr;

use sphereseg_math::{Point3, Vec3};
use sphereseg_mesh::TriangleMesh;

use crate::line::Polyline3;
use crate::segment::{direction, SphereSegment};

/// Which family of side a [`SphereSegment::side_mesh`] call builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SideOrientation {
    /// A flat sector at constant azimuth.
    Azimuth,
    /// A conical sector at constant elevation.
    Elevation,
}

/// Selects the lower or upper limit of an angular range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundaryAngle {
    /// The minimum angle.
    Min,
    /// The maximum angle.
    Max,
}

/// A set of outline parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Parts(u8);

impl Parts {
    /// The spherical patch.
    pub const SURFACE: Parts = Parts(0b0001);
    /// The four edges of the patch.
    pub const EDGE_LINE: Parts = Parts(0b0010);
    /// The flat and conical sides.
    pub const SIDES: Parts = Parts(0b0100);
    /// Lines from the centre to the corners.
    pub const SPOKES: Parts = Parts(0b1000);
    /// Every part.
    pub const ALL: Parts = Parts(0b1111);
    /// No parts.
    pub const NONE: Parts = Parts(0);

    /// Whether every part in `other` is selected.
    pub fn contains(self, other: Parts) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for Parts {
    type Output = Parts;

    fn bitor(self, rhs: Parts) -> Parts {
        Parts(self.0 | rhs.0)
    }
}

impl Default for Parts {
    fn default() -> Self {
        Parts::ALL
    }
}

/// Generated outline geometry.
#[derive(Debug, Clone, Default)]
pub struct Outline {
    /// Surface patch and sides.
    pub meshes: Vec<TriangleMesh>,
    /// Edge lines and spokes.
    pub lines: Vec<Polyline3>,
}

impl Outline {
    /// All meshes merged into one.
    pub fn merged_mesh(&self) -> TriangleMesh {
        let mut mesh = TriangleMesh::new();
        for m in &self.meshes {
            mesh.merge(m);
        }
        mesh
    }
}

/// Build a fan from `apex` over `rim`, flipping the winding when its
/// normal does not point along `outward`.
fn fan(apex: &Point3, rim: &[Point3], outward: &Vec3) -> TriangleMesh {
    let mut mesh = TriangleMesh::new();
    let a = mesh.push_vertex(apex);
    let rim_ids: Vec<u32> = rim.iter().map(|p| mesh.push_vertex(p)).collect();

    let normal: Vec3 = rim
        .windows(2)
        .map(|w| (w[0] - apex).cross(&(w[1] - apex)))
        .sum();
    let flip = normal.dot(outward) < 0.0;

    for w in rim_ids.windows(2) {
        if flip {
            mesh.push_triangle(a, w[1], w[0]);
        } else {
            mesh.push_triangle(a, w[0], w[1]);
        }
    }
    mesh
}

impl SphereSegment {
    fn steps(&self) -> u32 {
        self.density().max(1)
    }

    fn azimuth_samples(&self) -> impl Iterator<Item = f64> + '_ {
        let (az_min, az_max, _, _) = self.area();
        let n = self.steps();
        (0..=n).map(move |i| az_min + (az_max - az_min) * i as f64 / n as f64)
    }

    fn elevation_samples(&self) -> impl Iterator<Item = f64> + '_ {
        let (_, _, elev_min, elev_max) = self.area();
        let n = self.steps();
        (0..=n).map(move |j| elev_min + (elev_max - elev_min) * j as f64 / n as f64)
    }

    fn angle(&self, orientation: SideOrientation, which: BoundaryAngle) -> f64 {
        let (az_min, az_max, elev_min, elev_max) = self.area();
        match (orientation, which) {
            (SideOrientation::Azimuth, BoundaryAngle::Min) => az_min,
            (SideOrientation::Azimuth, BoundaryAngle::Max) => az_max,
            (SideOrientation::Elevation, BoundaryAngle::Min) => elev_min,
            (SideOrientation::Elevation, BoundaryAngle::Max) => elev_max,
        }
    }

    /// The spherical patch as a grid of `density` by `density` quads.
    pub fn surface_mesh(&self) -> TriangleMesh {
        let n = self.steps();
        let mut mesh = TriangleMesh::new();
        for elev in self.elevation_samples() {
            for az in self.azimuth_samples() {
                mesh.push_vertex(&self.point_at(az, elev));
            }
        }
        let row = n + 1;
        for j in 0..n {
            for i in 0..n {
                let p00 = j * row + i;
                let p10 = p00 + 1;
                let p01 = p00 + row;
                let p11 = p01 + 1;
                mesh.push_triangle(p00, p11, p10);
                mesh.push_triangle(p00, p01, p11);
            }
        }
        mesh
    }

    /// The top, bottom, left and right edges of the patch, in that order.
    pub fn edge_lines(&self) -> Vec<Polyline3> {
        let (az_min, az_max, elev_min, elev_max) = self.area();
        let along_az = |elev: f64| {
            Polyline3::new(self.azimuth_samples().map(|az| self.point_at(az, elev)).collect())
        };
        let along_elev = |az: f64| {
            Polyline3::new(self.elevation_samples().map(|elev| self.point_at(az, elev)).collect())
        };
        vec![
            along_az(elev_max),
            along_az(elev_min),
            along_elev(az_min),
            along_elev(az_max),
        ]
    }

    /// A side of the wedge as a fan from the centre.
    ///
    /// Azimuth sides are flat sectors; elevation sides are sectors of a
    /// cone. The fan is built whether or not the wedge is bounded by that
    /// side.
    pub fn side_mesh(&self, orientation: SideOrientation, which: BoundaryAngle) -> TriangleMesh {
        let (az_min, az_max, _, _) = self.area();
        let angle = self.angle(orientation, which);
        let sign = match which {
            BoundaryAngle::Min => -1.0,
            BoundaryAngle::Max => 1.0,
        };

        let (rim, outward): (Vec<Point3>, Vec3) = match orientation {
            SideOrientation::Azimuth => {
                let rim = self
                    .elevation_samples()
                    .map(|elev| self.point_at(angle, elev))
                    .collect();
                // direction of increasing azimuth
                let (sin_az, cos_az) = angle.sin_cos();
                (rim, Vec3::new(cos_az, -sin_az, 0.0) * sign)
            }
            SideOrientation::Elevation => {
                let rim = self
                    .azimuth_samples()
                    .map(|az| self.point_at(az, angle))
                    .collect();
                // direction of increasing elevation at the middle azimuth
                let mid = (az_min + az_max) * 0.5;
                (rim, direction(mid, angle + FRAC_PI_2) * sign)
            }
        };
        fan(&self.centre(), &rim, &outward)
    }

    /// Line from the centre to the corner at the chosen azimuth and
    /// elevation limits.
    pub fn spoke(&self, az: BoundaryAngle, elev: BoundaryAngle) -> Polyline3 {
        let a = self.angle(SideOrientation::Azimuth, az);
        let e = self.angle(SideOrientation::Elevation, elev);
        Polyline3::new(vec![self.centre(), self.point_at(a, e)])
    }

    /// Generate the selected parts.
    ///
    /// Sides are produced only for the surfaces that bound the wedge.
    pub fn outline(&self, parts: Parts) -> Outline {
        let mut out = Outline::default();
        if parts.contains(Parts::SURFACE) {
            out.meshes.push(self.surface_mesh());
        }
        if parts.contains(Parts::SIDES) {
            let sides = [
                (SideOrientation::Azimuth, BoundaryAngle::Min, self.has_azimuth_bounds()),
                (SideOrientation::Azimuth, BoundaryAngle::Max, self.has_azimuth_bounds()),
                (SideOrientation::Elevation, BoundaryAngle::Min, self.has_lower_bound()),
                (SideOrientation::Elevation, BoundaryAngle::Max, self.has_upper_bound()),
            ];
            for (orientation, which, present) in sides {
                if present {
                    out.meshes.push(self.side_mesh(orientation, which));
                }
            }
        }
        if parts.contains(Parts::EDGE_LINE) {
            out.lines.extend(self.edge_lines());
        }
        if parts.contains(Parts::SPOKES) {
            for az in [BoundaryAngle::Min, BoundaryAngle::Max] {
                for elev in [BoundaryAngle::Min, BoundaryAngle::Max] {
                    out.lines.push(self.spoke(az, elev));
                }
            }
        }
        out
    }
}
