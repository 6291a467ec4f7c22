//! End-to-end tests for wedge clipping.
//!
//! Open tubes are pushed through the wedge boundary and the traced loops
//! are checked against the surface they should lie on.

use std::f64::consts::{PI, TAU};
use std::io::Cursor;

use approx::assert_relative_eq;
use sphereseg::{IntersectSettings, Polyline3, SphereSegment, SurfaceKind};
use sphereseg_math::{Point3, Transform, Vec3};
use sphereseg_mesh::{obj, TriangleMesh};

/// Open tube of `radius` around the segment `from`-`to`, with `sides`
/// vertices per ring and `rings` rings.
fn create_tube(from: Point3, to: Point3, radius: f64, sides: u32, rings: u32) -> TriangleMesh {
    let axis = (to - from).normalize();
    let helper = if axis.z.abs() < 0.9 { Vec3::z() } else { Vec3::x() };
    let u = axis.cross(&helper).normalize();
    let v = axis.cross(&u);

    let mut mesh = TriangleMesh::new();
    for r in 0..rings {
        let centre = from + (to - from) * (r as f64 / (rings - 1) as f64);
        for s in 0..sides {
            let a = TAU * s as f64 / sides as f64;
            mesh.push_vertex(&(centre + (u * a.cos() + v * a.sin()) * radius));
        }
    }
    for r in 0..rings - 1 {
        for s in 0..sides {
            let a = r * sides + s;
            let b = r * sides + (s + 1) % sides;
            mesh.push_triangle(a, b, b + sides);
            mesh.push_triangle(a, b + sides, a + sides);
        }
    }
    mesh
}

fn azimuth(p: &Point3) -> f64 {
    p.x.atan2(p.y)
}

fn wedge() -> SphereSegment {
    SphereSegment::new(Point3::origin(), 1.0, -0.6, 0.7, -0.5, 0.5)
}

#[test]
fn test_tube_through_outer_sphere() {
    let tube = create_tube(
        Point3::new(0.013, 0.5, 0.017),
        Point3::new(0.013, 1.6, 0.017),
        0.15,
        24,
        11,
    );
    let lines = wedge()
        .compute_intersection(&tube, &Transform::identity(), &IntersectSettings::default())
        .unwrap();

    assert_eq!(lines.len(), 1);
    let ring = &lines[0];
    assert!(ring.is_closed());
    assert!(ring.len() >= 24);
    for p in &ring.points {
        assert_relative_eq!(p.coords.norm(), 1.0, epsilon = 1e-9);
    }
}

#[test]
fn test_tube_across_both_azimuth_planes() {
    let tube = create_tube(
        Point3::new(-1.0, 0.5, 0.013),
        Point3::new(1.0, 0.5, 0.013),
        0.1,
        24,
        21,
    );
    let curves = wedge()
        .compute_intersection_lines(&tube, &Transform::identity(), &IntersectSettings::default())
        .unwrap();
    for c in &curves {
        match c.surface {
            SurfaceKind::AzimuthMin | SurfaceKind::AzimuthMax => assert_eq!(c.lines.len(), 1),
            _ => assert!(c.lines.is_empty()),
        }
    }

    let lines = wedge()
        .compute_intersection(&tube, &Transform::identity(), &IntersectSettings::default())
        .unwrap();
    assert_eq!(lines.len(), 2);
    assert!(lines.iter().all(Polyline3::is_closed));

    let mut angles: Vec<f64> = lines
        .iter()
        .map(|l| l.points.iter().map(azimuth).sum::<f64>() / l.len() as f64)
        .collect();
    angles.sort_by(f64::total_cmp);
    assert_relative_eq!(angles[0], -0.6, epsilon = 1e-9);
    assert_relative_eq!(angles[1], 0.7, epsilon = 1e-9);
}

#[test]
fn test_reflex_wedge_keeps_both_sides_of_gap() {
    // 270 degree span; the gap faces -Y and the tube stays inside the sphere
    let seg = SphereSegment::new(Point3::origin(), 1.0, -0.75 * PI, 0.75 * PI, -0.5, 0.5);
    let tube = create_tube(
        Point3::new(-0.73, -0.5, 0.013),
        Point3::new(0.77, -0.5, 0.013),
        0.1,
        24,
        16,
    );
    let lines = seg
        .compute_intersection(&tube, &Transform::identity(), &IntersectSettings::default())
        .unwrap();
    assert_eq!(lines.len(), 2);
    for line in &lines {
        assert!(line.is_closed());
        let az = azimuth(&line.points[0]).abs();
        assert_relative_eq!(az, 0.75 * PI, epsilon = 1e-9);
    }
}

#[test]
fn test_moved_wedge_and_mesh_agree() {
    let tube = create_tube(
        Point3::new(0.013, 0.5, 0.017),
        Point3::new(0.013, 1.6, 0.017),
        0.15,
        24,
        11,
    );
    let mut seg = wedge();
    seg.set_centre(Point3::new(5.0, -3.0, 2.0));
    let placed = Transform::translation(5.0, -3.0, 2.0);
    let lines = seg
        .compute_intersection(&tube, &placed, &IntersectSettings::default())
        .unwrap();
    assert_eq!(lines.len(), 1);
    for p in &lines[0].points {
        assert_relative_eq!((p - seg.centre()).norm(), 1.0, epsilon = 1e-6);
    }
}

#[test]
fn test_obj_in_obj_out() {
    let tube = create_tube(
        Point3::new(0.013, 0.5, 0.017),
        Point3::new(0.013, 1.6, 0.017),
        0.15,
        16,
        11,
    );
    let mut text = Vec::new();
    obj::write_mesh(&mut text, &tube, 0).unwrap();
    let mesh = obj::read_obj(Cursor::new(text)).unwrap();
    assert_eq!(mesh.num_triangles(), tube.num_triangles());

    let lines = wedge()
        .compute_intersection(&mesh, &Transform::identity(), &IntersectSettings::default())
        .unwrap();
    let mut out = Vec::new();
    obj::write_polylines(&mut out, &lines, 0).unwrap();
    let out = String::from_utf8(out).unwrap();
    assert_eq!(out.lines().filter(|l| l.starts_with("l ")).count(), 1);
}

#[test]
fn test_curves_serialize_to_json() {
    let tube = create_tube(
        Point3::new(0.013, 0.5, 0.017),
        Point3::new(0.013, 1.6, 0.017),
        0.15,
        16,
        11,
    );
    let curves = wedge()
        .compute_intersection_lines(&tube, &Transform::identity(), &IntersectSettings::default())
        .unwrap();
    let json = serde_json::to_string(&curves).unwrap();
    assert!(json.contains("\"radius\""));
}
