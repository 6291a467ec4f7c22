//! Triangle filtering, vertex merging and edge adjacency.
//!
//! Only triangles that may cross a wedge surface survive. Their vertices
//! are merged by exact position so that coincident corners from different
//! triangles share one index and the edge map sees true adjacency.

use std::collections::BTreeMap;

use sphereseg_math::Point3;
use tracing::debug;

use crate::region::{classify_triangle, Region, TriangleClass, WedgeBounds};

/// A surviving triangle with its vertex indices sorted ascending.
#[derive(Debug, Clone)]
pub struct Triangle {
    /// Vertex indices into [`EdgeGraph::vertices`].
    pub vertices: [u32; 3],
    /// Edge ids for `(v0, v1)`, `(v1, v2)` and `(v0, v2)`; `None` for a
    /// zero-length edge.
    pub edges: [Option<usize>; 3],
}

/// An undirected edge owned by one or more triangles.
#[derive(Debug, Clone)]
pub struct Edge {
    /// Smaller vertex index.
    pub p1: u32,
    /// Larger vertex index.
    pub p2: u32,
    /// Triangles touching the edge.
    pub triangles: Vec<usize>,
}

/// Counters from the triangle filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterStats {
    /// Triangles entirely outside some surface.
    pub outside: usize,
    /// Triangles entirely inside the wedge.
    pub inside: usize,
    /// Triangles kept for clipping.
    pub intersecting: usize,
    /// Candidate vertices merged away as duplicates.
    pub merged_vertices: usize,
    /// Triangles dropped as duplicates after merging.
    pub duplicate_triangles: usize,
}

/// The clipping working set: merged vertices, straddling triangles and
/// their edges.
#[derive(Debug, Clone, Default)]
pub struct EdgeGraph {
    /// Vertex positions relative to the wedge centre.
    pub vertices: Vec<Point3>,
    /// Surviving triangles.
    pub triangles: Vec<Triangle>,
    /// Unique edges.
    pub edges: Vec<Edge>,
    /// Filter counters.
    pub stats: FilterStats,
}

impl EdgeGraph {
    /// Build the working set from local vertex positions and triangles.
    pub fn build<I>(points: &[Point3], triangles: I, bounds: &WedgeBounds) -> Self
    where
        I: IntoIterator<Item = [u32; 3]>,
    {
        let regions: Vec<Region> = points
            .iter()
            .map(|p| Region::classify(&p.coords, bounds))
            .collect();

        let mut stats = FilterStats::default();
        let mut kept: Vec<[u32; 3]> = Vec::new();
        let mut candidate = vec![false; points.len()];

        for tri in triangles {
            let [a, b, c] = tri.map(|i| i as usize);
            match classify_triangle([&regions[a], &regions[b], &regions[c]], bounds) {
                TriangleClass::Outside => stats.outside += 1,
                TriangleClass::Inside => stats.inside += 1,
                TriangleClass::Intersects => {
                    stats.intersecting += 1;
                    candidate[a] = true;
                    candidate[b] = true;
                    candidate[c] = true;
                    kept.push(tri);
                }
            }
        }

        let (vertices, remap) = merge_vertices(points, &candidate);
        stats.merged_vertices = candidate.iter().filter(|&&c| c).count() - vertices.len();

        let mut merged: Vec<[u32; 3]> = kept
            .iter()
            .map(|t| {
                let mut m = t.map(|i| remap[i as usize]);
                m.sort_unstable();
                m
            })
            .collect();
        merged.sort_unstable();
        let before = merged.len();
        merged.dedup();
        stats.duplicate_triangles = before - merged.len();

        let mut graph = EdgeGraph {
            vertices,
            triangles: Vec::with_capacity(merged.len()),
            edges: Vec::new(),
            stats,
        };
        graph.build_edges(&merged);

        debug!(
            outside = stats.outside,
            inside = stats.inside,
            intersecting = stats.intersecting,
            merged_vertices = stats.merged_vertices,
            duplicate_triangles = stats.duplicate_triangles,
            edges = graph.edges.len(),
            "built edge graph"
        );
        graph
    }

    fn build_edges(&mut self, triangles: &[[u32; 3]]) {
        let mut edge_map: BTreeMap<(u32, u32), usize> = BTreeMap::new();

        for (tri_idx, &[v0, v1, v2]) in triangles.iter().enumerate() {
            let mut edges = [None; 3];
            for (slot, (a, b)) in [(v0, v1), (v1, v2), (v0, v2)].into_iter().enumerate() {
                if a == b {
                    continue;
                }
                let key = (a.min(b), a.max(b));
                let edge_idx = *edge_map.entry(key).or_insert_with(|| {
                    self.edges.push(Edge {
                        p1: key.0,
                        p2: key.1,
                        triangles: Vec::with_capacity(2),
                    });
                    self.edges.len() - 1
                });
                let owners = &mut self.edges[edge_idx].triangles;
                if owners.last() != Some(&tri_idx) {
                    owners.push(tri_idx);
                }
                edges[slot] = Some(edge_idx);
            }
            self.triangles.push(Triangle {
                vertices: [v0, v1, v2],
                edges,
            });
        }
    }

    /// Endpoints of an edge.
    pub fn edge_points(&self, edge: usize) -> (&Point3, &Point3) {
        let e = &self.edges[edge];
        (&self.vertices[e.p1 as usize], &self.vertices[e.p2 as usize])
    }
}

/// Merge candidate vertices with identical positions.
///
/// Returns the merged positions and a map from original index to merged
/// index (only meaningful for candidates).
fn merge_vertices(points: &[Point3], candidate: &[bool]) -> (Vec<Point3>, Vec<u32>) {
    let mut order: Vec<u32> = (0..points.len() as u32)
        .filter(|&i| candidate[i as usize])
        .collect();
    order.sort_by(|&a, &b| {
        let (pa, pb) = (&points[a as usize], &points[b as usize]);
        pa.x
            .total_cmp(&pb.x)
            .then(pa.y.total_cmp(&pb.y))
            .then(pa.z.total_cmp(&pb.z))
    });

    let mut remap = vec![u32::MAX; points.len()];
    let mut merged: Vec<Point3> = Vec::with_capacity(order.len());
    for idx in order {
        let p = points[idx as usize];
        if merged.last() != Some(&p) {
            merged.push(p);
        }
        remap[idx as usize] = (merged.len() - 1) as u32;
    }
    (merged, remap)
}
