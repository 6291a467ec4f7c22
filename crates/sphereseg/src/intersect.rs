//! The clipping pipeline: from a transformed mesh to boundary curves.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use sphereseg_math::{Point3, Transform};
use sphereseg_mesh::TriangleMesh;
use tracing::{debug, instrument};

use crate::error::{Result, SegmentError};
use crate::fuse::fuse_lines;
use crate::graph::EdgeGraph;
use crate::line::Polyline3;
use crate::region::WedgeBounds;
use crate::segment::SphereSegment;
use crate::surface::{
    surface_for, AzimuthSideSurface, AzimuthSurface, ElevationSurface, RadiusSurface, SurfaceKind,
};
use crate::trim::{trim, trim_union};
use crate::walk::{connect_intersections, intersect_edges};

/// Which wedge surfaces produce curves.
///
/// Trimming always uses every surface the wedge has; the mask only
/// decides which surfaces are traced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceMask {
    /// The outer sphere.
    pub radius: bool,
    /// The minimum azimuth half-plane.
    pub azimuth_min: bool,
    /// The maximum azimuth half-plane.
    pub azimuth_max: bool,
    /// The lower elevation cone.
    pub elevation_min: bool,
    /// The upper elevation cone.
    pub elevation_max: bool,
}

impl SurfaceMask {
    /// Trace every surface.
    pub const ALL: SurfaceMask = SurfaceMask {
        radius: true,
        azimuth_min: true,
        azimuth_max: true,
        elevation_min: true,
        elevation_max: true,
    };

    /// Trace nothing.
    pub const NONE: SurfaceMask = SurfaceMask {
        radius: false,
        azimuth_min: false,
        azimuth_max: false,
        elevation_min: false,
        elevation_max: false,
    };

    /// Whether `kind` is selected.
    pub fn contains(&self, kind: SurfaceKind) -> bool {
        match kind {
            SurfaceKind::Radius => self.radius,
            SurfaceKind::AzimuthMin => self.azimuth_min,
            SurfaceKind::AzimuthMax => self.azimuth_max,
            SurfaceKind::ElevationMin => self.elevation_min,
            SurfaceKind::ElevationMax => self.elevation_max,
        }
    }
}

impl Default for SurfaceMask {
    fn default() -> Self {
        Self::ALL
    }
}

/// Settings for [`SphereSegment::compute_intersection`].
///
/// The defaults close every curve that is still open after joining,
/// bridging its two ends with a straight chord whatever their distance.
/// A mesh that only partly covers the wedge boundary therefore comes back
/// as a loop. Set `close_loops` to `false`, or bound the chord with
/// `close_tolerance`, to keep such curves open.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntersectSettings {
    /// Ends closer than this are welded into one point (model units).
    pub fuse_tolerance: f64,
    /// Bridge the remaining gaps between fragments.
    pub join_fragments: bool,
    /// Close lines whose ends are within `close_tolerance` with a chord.
    pub close_loops: bool,
    /// Maximum end gap for closing a loop; `None` (the default) means
    /// any gap is closed.
    pub close_tolerance: Option<f64>,
    /// Surfaces to trace.
    pub surfaces: SurfaceMask,
}

impl Default for IntersectSettings {
    fn default() -> Self {
        Self {
            fuse_tolerance: 1e-6,
            join_fragments: true,
            close_loops: true,
            close_tolerance: None,
            surfaces: SurfaceMask::ALL,
        }
    }
}

impl IntersectSettings {
    /// Validate settings.
    pub fn validate(&self) -> Result<()> {
        if !self.fuse_tolerance.is_finite() || self.fuse_tolerance < 0.0 {
            return Err(SegmentError::InvalidSettings(format!(
                "fuse_tolerance must be finite and non-negative, got {}",
                self.fuse_tolerance
            )));
        }
        if let Some(t) = self.close_tolerance {
            if t.is_nan() || t < 0.0 {
                return Err(SegmentError::InvalidSettings(format!(
                    "close_tolerance must be non-negative, got {t}"
                )));
            }
        }
        Ok(())
    }
}

/// Curves traced on one surface, before joining.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfaceCurves {
    /// Surface the curves lie on.
    pub surface: SurfaceKind,
    /// Trimmed curves, in world coordinates.
    pub lines: Vec<Polyline3>,
}

fn trim_azimuth(lines: Vec<Polyline3>, bounds: &WedgeBounds) -> Vec<Polyline3> {
    if !bounds.has_azimuth {
        return lines;
    }
    let min = AzimuthSurface::min(bounds.az_min);
    let max = AzimuthSurface::max(bounds.az_max);
    if bounds.azimuth_reflex {
        trim_union(lines, &min, &max)
    } else {
        trim(trim(lines, &min), &max)
    }
}

fn trim_elevation(mut lines: Vec<Polyline3>, bounds: &WedgeBounds) -> Vec<Polyline3> {
    if bounds.has_lower {
        lines = trim(lines, &ElevationSurface::lower(bounds.elev_min));
    }
    if bounds.has_upper {
        lines = trim(lines, &ElevationSurface::upper(bounds.elev_max));
    }
    lines
}

fn surface_exists(kind: SurfaceKind, bounds: &WedgeBounds) -> bool {
    match kind {
        SurfaceKind::Radius => true,
        SurfaceKind::AzimuthMin | SurfaceKind::AzimuthMax => bounds.has_azimuth,
        SurfaceKind::ElevationMin => bounds.has_lower,
        SurfaceKind::ElevationMax => bounds.has_upper,
    }
}

/// Trace and trim the curves on one surface, in local coordinates.
fn trace_surface(graph: &EdgeGraph, bounds: &WedgeBounds, kind: SurfaceKind) -> Vec<Polyline3> {
    let surface = surface_for(kind, bounds);
    let hits = intersect_edges(graph, surface.as_ref());
    let raw = connect_intersections(graph, &hits);
    let raw_count = raw.len();

    let radius = RadiusSurface::new(bounds.radius);
    let lines = match kind {
        SurfaceKind::Radius => trim_azimuth(trim_elevation(raw, bounds), bounds),
        SurfaceKind::AzimuthMin | SurfaceKind::AzimuthMax => {
            let az = if kind == SurfaceKind::AzimuthMin {
                bounds.az_min
            } else {
                bounds.az_max
            };
            let lines = trim(raw, &AzimuthSideSurface::new(az));
            trim_elevation(trim(lines, &radius), bounds)
        }
        SurfaceKind::ElevationMin | SurfaceKind::ElevationMax => {
            trim_azimuth(trim(raw, &radius), bounds)
        }
    };

    debug!(surface = ?kind, raw = raw_count, trimmed = lines.len(), "traced surface");
    lines
}

impl SphereSegment {
    /// Build the clipping working set for `mesh` placed by `transform`.
    fn edge_graph(&self, mesh: &TriangleMesh, transform: &Transform, bounds: &WedgeBounds) -> EdgeGraph {
        let centre = self.centre();
        let local: Vec<Point3> = mesh
            .positions()
            .map(|p| Point3::from(transform.apply_point(&p) - centre))
            .collect();
        EdgeGraph::build(&local, mesh.triangles(), bounds)
    }

    fn check_inputs(
        &self,
        mesh: &TriangleMesh,
        transform: &Transform,
        settings: &IntersectSettings,
    ) -> Result<()> {
        self.validate()?;
        settings.validate()?;
        mesh.validate()?;
        if !transform.is_finite() {
            return Err(SegmentError::InvalidTransform);
        }
        Ok(())
    }

    /// Curves traced on each selected surface, trimmed to the wedge but
    /// not yet joined.
    ///
    /// Surfaces the wedge does not have are skipped. The result is in
    /// world coordinates and ordered as [`SurfaceKind::ALL`].
    #[instrument(skip_all, fields(triangles = mesh.num_triangles()))]
    pub fn compute_intersection_lines(
        &self,
        mesh: &TriangleMesh,
        transform: &Transform,
        settings: &IntersectSettings,
    ) -> Result<Vec<SurfaceCurves>> {
        self.check_inputs(mesh, transform, settings)?;
        if mesh.is_empty() {
            return Ok(Vec::new());
        }

        let bounds = WedgeBounds::new(self);
        let graph = self.edge_graph(mesh, transform, &bounds);
        if graph.triangles.is_empty() {
            debug!("no triangles straddle the wedge");
            return Ok(Vec::new());
        }

        let kinds: Vec<SurfaceKind> = SurfaceKind::ALL
            .into_iter()
            .filter(|&k| settings.surfaces.contains(k) && surface_exists(k, &bounds))
            .collect();
        let offset = self.centre().coords;

        Ok(kinds
            .par_iter()
            .map(|&kind| SurfaceCurves {
                surface: kind,
                lines: trace_surface(&graph, &bounds, kind)
                    .iter()
                    .map(|l| l.translated(&offset))
                    .collect(),
            })
            .collect())
    }

    /// Intersect `mesh`, placed in the world by `transform`, with the
    /// boundary of the wedge.
    ///
    /// Returns the joined curves in world coordinates. A mesh that does
    /// not touch the wedge yields no curves; only invalid input is an
    /// error.
    #[instrument(skip_all, fields(triangles = mesh.num_triangles()))]
    pub fn compute_intersection(
        &self,
        mesh: &TriangleMesh,
        transform: &Transform,
        settings: &IntersectSettings,
    ) -> Result<Vec<Polyline3>> {
        let curves = self.compute_intersection_lines(mesh, transform, settings)?;
        let fragments: Vec<Polyline3> = curves.into_iter().flat_map(|c| c.lines).collect();
        let count = fragments.len();
        let lines = fuse_lines(fragments, settings);
        debug!(
            fragments = count,
            lines = lines.len(),
            closed = lines.iter().filter(|l| l.is_closed()).count(),
            "joined intersection curves"
        );
        Ok(lines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::{FRAC_PI_2, PI};

    /// A square plate in the plane z = `z` spanning `[-h, h]` in X and Y,
    /// split into `n` by `n` cells.
    fn plate(h: f64, z: f64, n: u32) -> TriangleMesh {
        let mut mesh = TriangleMesh::new();
        for j in 0..=n {
            for i in 0..=n {
                let x = -h + 2.0 * h * i as f64 / n as f64;
                let y = -h + 2.0 * h * j as f64 / n as f64;
                mesh.push_vertex(&Point3::new(x, y, z));
            }
        }
        let row = n + 1;
        for j in 0..n {
            for i in 0..n {
                let a = j * row + i;
                mesh.push_triangle(a, a + 1, a + row + 1);
                mesh.push_triangle(a, a + row + 1, a + row);
            }
        }
        mesh
    }

    #[test]
    fn test_settings_validate() {
        assert!(IntersectSettings::default().validate().is_ok());
        let bad = IntersectSettings {
            fuse_tolerance: -1.0,
            ..Default::default()
        };
        assert!(bad.validate().is_err());
        let bad = IntersectSettings {
            close_tolerance: Some(f64::NAN),
            ..Default::default()
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_settings_from_partial_json() {
        let s: IntersectSettings =
            serde_json::from_str(r#"{"fuse_tolerance":0.01,"surfaces":{"radius":false}}"#).unwrap();
        assert_relative_eq!(s.fuse_tolerance, 0.01);
        assert!(s.join_fragments);
        assert!(!s.surfaces.radius);
        assert!(s.surfaces.azimuth_min);
    }

    #[test]
    fn test_empty_mesh_gives_no_curves() {
        let seg = SphereSegment::default();
        let lines = seg
            .compute_intersection(&TriangleMesh::new(), &Transform::identity(), &Default::default())
            .unwrap();
        assert!(lines.is_empty());
    }

    #[test]
    fn test_invalid_inputs_are_errors() {
        let mesh = plate(1.0, 0.0, 2);
        let settings = IntersectSettings::default();

        let mut seg = SphereSegment::default();
        seg.set_radius(-1.0);
        assert!(matches!(
            seg.compute_intersection(&mesh, &Transform::identity(), &settings),
            Err(SegmentError::InvalidSegment(_))
        ));

        let seg = SphereSegment::default();
        let nan = Transform::translation(f64::NAN, 0.0, 0.0);
        assert!(matches!(
            seg.compute_intersection(&mesh, &nan, &settings),
            Err(SegmentError::InvalidTransform)
        ));

        let mut broken = mesh.clone();
        broken.indices.push(99);
        broken.indices.push(0);
        broken.indices.push(1);
        assert!(matches!(
            seg.compute_intersection(&broken, &Transform::identity(), &settings),
            Err(SegmentError::Mesh(_))
        ));
    }

    #[test]
    fn test_far_mesh_gives_no_curves() {
        let seg = SphereSegment::default();
        let mesh = plate(1.0, 0.0, 4);
        let lines = seg
            .compute_intersection(
                &mesh,
                &Transform::translation(50.0, 50.0, 50.0),
                &Default::default(),
            )
            .unwrap();
        assert!(lines.is_empty());
    }

    #[test]
    fn test_full_sphere_cuts_plate_in_a_circle() {
        // no azimuth planes and no cones: only the outer sphere remains
        let seg = SphereSegment::new(Point3::origin(), 1.0, -PI, PI, -FRAC_PI_2, FRAC_PI_2);
        let mesh = plate(2.0, 0.5, 16);
        let lines = seg
            .compute_intersection(&mesh, &Transform::identity(), &Default::default())
            .unwrap();
        assert_eq!(lines.len(), 1);
        let ring = &lines[0];
        assert!(ring.is_closed());
        let expected = (1.0f64 - 0.25).sqrt();
        for p in &ring.points {
            assert_relative_eq!(p.z, 0.5, epsilon = 1e-12);
            assert_relative_eq!((p.x * p.x + p.y * p.y).sqrt(), expected, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_wedge_outline_on_plate() {
        // a plate just above the XY plane cuts the wedge in a sector: an
        // arc of the sphere plus two straight runs along the azimuth
        // planes, which stop at the upper cone near the axis
        let seg = SphereSegment::new(Point3::origin(), 1.0, -0.6, 0.7, -0.5, 0.5);
        let mesh = plate(2.0, 0.013, 15);
        let curves = seg
            .compute_intersection_lines(&mesh, &Transform::identity(), &Default::default())
            .unwrap();
        let kinds: Vec<SurfaceKind> = curves
            .iter()
            .filter(|c| !c.lines.is_empty())
            .map(|c| c.surface)
            .collect();
        assert!(kinds.contains(&SurfaceKind::Radius));
        assert!(kinds.contains(&SurfaceKind::AzimuthMin));
        assert!(kinds.contains(&SurfaceKind::AzimuthMax));

        let lines = seg
            .compute_intersection(&mesh, &Transform::identity(), &Default::default())
            .unwrap();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].is_closed());
        for p in &lines[0].points {
            assert!(p.coords.norm() <= 1.0 + 1e-9);
            let az = p.x.atan2(p.y);
            assert!(az >= -0.6 - 1e-6 && az <= 0.7 + 1e-6, "azimuth {az}");
        }
    }

    #[test]
    fn test_plate_vertices_on_azimuth_plane() {
        // a column of grid vertices lies exactly on the plane x = 0
        let seg = SphereSegment::new(Point3::origin(), 1.0, 0.0, 1.0, -FRAC_PI_2, FRAC_PI_2);
        let mesh = plate(2.0, 0.5, 16);
        let lines = seg
            .compute_intersection(&mesh, &Transform::identity(), &Default::default())
            .unwrap();
        assert_eq!(lines.len(), 1);
        let ring = &lines[0];
        assert!(ring.is_closed());
        // the run along the plane is traced once: no point comes back
        let points = &ring.points[..ring.len() - 1];
        for (i, p) in points.iter().enumerate() {
            for q in &points[i + 1..] {
                assert!((p - q).norm() > 1e-9, "point {p:?} visited twice");
            }
            assert!(p.x >= -1e-12);
            assert!(p.coords.norm() <= 1.0 + 1e-9);
        }
    }

    #[test]
    fn test_open_arc_closed_only_by_default() {
        // only the part of the circle with x >= 0.5 lies on the moved plate
        let seg = SphereSegment::new(Point3::origin(), 1.0, -PI, PI, -FRAC_PI_2, FRAC_PI_2);
        let mesh = plate(2.0, 0.5, 16);
        let t = Transform::translation(2.5, 0.0, 0.0);

        let lines = seg.compute_intersection(&mesh, &t, &Default::default()).unwrap();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].is_closed());

        let open = IntersectSettings {
            close_loops: false,
            ..Default::default()
        };
        let lines = seg.compute_intersection(&mesh, &t, &open).unwrap();
        assert_eq!(lines.len(), 1);
        assert!(!lines[0].is_closed());
        assert_relative_eq!(lines[0].start().unwrap().x, 0.5, epsilon = 1e-9);
        assert_relative_eq!(lines[0].end().unwrap().x, 0.5, epsilon = 1e-9);

        let short_chords = IntersectSettings {
            close_tolerance: Some(0.1),
            ..Default::default()
        };
        let lines = seg.compute_intersection(&mesh, &t, &short_chords).unwrap();
        assert!(!lines[0].is_closed());
    }

    #[test]
    fn test_transform_and_centre_are_applied() {
        let centre = Point3::new(10.0, -4.0, 2.0);
        let seg = SphereSegment::new(centre, 1.0, -PI, PI, -FRAC_PI_2, FRAC_PI_2);
        let mesh = plate(2.0, 0.0, 15);
        // lift the plate to the wedge centre
        let t = Transform::translation(10.0, -4.0, 2.0);
        let lines = seg
            .compute_intersection(&mesh, &t, &Default::default())
            .unwrap();
        assert_eq!(lines.len(), 1);
        for p in &lines[0].points {
            assert_relative_eq!((p - centre).norm(), 1.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_mask_limits_traced_surfaces() {
        let seg = SphereSegment::new(Point3::origin(), 1.0, -0.6, 0.7, -0.5, 0.5);
        let settings = IntersectSettings {
            surfaces: SurfaceMask {
                radius: false,
                ..SurfaceMask::ALL
            },
            ..Default::default()
        };
        let curves = seg
            .compute_intersection_lines(&plate(2.0, 0.013, 15), &Transform::identity(), &settings)
            .unwrap();
        assert!(curves.iter().all(|c| c.surface != SurfaceKind::Radius));
    }
}
