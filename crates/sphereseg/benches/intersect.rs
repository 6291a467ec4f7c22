//! Benchmarks for wedge clipping.
//!
//! Run with: cargo bench -p sphereseg

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use sphereseg::{IntersectSettings, SphereSegment};
use sphereseg_math::{Point3, Transform};
use sphereseg_mesh::TriangleMesh;

/// UV sphere of radius `r` about `centre` with `n` segments each way.
fn create_uv_sphere(centre: Point3, r: f64, n: u32) -> TriangleMesh {
    let mut mesh = TriangleMesh::new();
    for j in 0..=n {
        let theta = std::f64::consts::PI * j as f64 / n as f64;
        for i in 0..=n {
            let phi = std::f64::consts::TAU * i as f64 / n as f64;
            mesh.push_vertex(&Point3::new(
                centre.x + r * theta.sin() * phi.cos(),
                centre.y + r * theta.sin() * phi.sin(),
                centre.z + r * theta.cos(),
            ));
        }
    }
    let row = n + 1;
    for j in 0..n {
        for i in 0..n {
            let a = j * row + i;
            mesh.push_triangle(a, a + row, a + row + 1);
            mesh.push_triangle(a, a + row + 1, a + 1);
        }
    }
    mesh
}

fn bench_intersection(c: &mut Criterion) {
    let mut group = c.benchmark_group("Intersection");
    let wedge = SphereSegment::new(Point3::origin(), 1.0, -0.6, 0.7, -0.5, 0.5);
    let settings = IntersectSettings::default();

    // a ball straddling the wedge boundary, at increasing resolution
    for n in [16u32, 64, 128] {
        let mesh = create_uv_sphere(Point3::new(0.1, 0.9, 0.05), 0.4, n);
        group.throughput(Throughput::Elements(mesh.num_triangles() as u64));
        group.bench_with_input(BenchmarkId::new("ball", n), &mesh, |b, mesh| {
            b.iter(|| {
                wedge
                    .compute_intersection(black_box(mesh), &Transform::identity(), &settings)
                    .ok()
            })
        });
    }

    group.finish();
}

fn bench_outline(c: &mut Criterion) {
    let mut group = c.benchmark_group("Outline");
    for density in [10u32, 50] {
        let mut wedge = SphereSegment::default();
        wedge.set_density(density);
        group.bench_with_input(BenchmarkId::new("all_parts", density), &wedge, |b, wedge| {
            b.iter(|| wedge.outline(black_box(sphereseg::Parts::ALL)))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_intersection, bench_outline);
criterion_main!(benches);
