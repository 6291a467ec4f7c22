//! Connect per-edge intersection points into polylines.
//!
//! A curve crosses a triangle by entering through one intersected edge
//! and leaving through another, so chains of triangles with at least two
//! intersected edges trace the curve. Each edge keeps a list of the
//! triangles still to be crossed from it; walking consumes those entries
//! until the pool of intersected edges is exhausted.

use sphereseg_math::Point3;
use tracing::trace;

use crate::graph::EdgeGraph;
use crate::line::Polyline3;
use crate::surface::{CutSurface, EdgeIntersection, IntersectionType};

/// Intersect every edge of the graph with `surface`.
pub fn intersect_edges<S: CutSurface + ?Sized>(
    graph: &EdgeGraph,
    surface: &S,
) -> Vec<Option<EdgeIntersection>> {
    (0..graph.edges.len())
        .map(|e| {
            let (a, b) = graph.edge_points(e);
            surface.intersect_edge(a, b)
        })
        .collect()
}

struct Walker<'a> {
    graph: &'a EdgeGraph,
    hits: &'a [Option<EdgeIntersection>],
    to_traverse: Vec<Vec<usize>>,
    in_pool: Vec<bool>,
}

impl Walker<'_> {
    fn point(&self, edge: usize) -> Point3 {
        self.hits[edge].map(|h| h.point).unwrap_or_else(Point3::origin)
    }

    /// Walk away from `start` through its remaining triangles.
    fn walk(&mut self, start: usize) -> Vec<Point3> {
        let mut points = Vec::new();
        let mut edge = start;
        while let Some(tri) = self.to_traverse[edge].pop() {
            let next = self.graph.triangles[tri]
                .edges
                .iter()
                .flatten()
                .copied()
                .find(|&e| e != edge && self.to_traverse[e].contains(&tri));
            let Some(next) = next else {
                break;
            };
            self.to_traverse[next].retain(|&t| t != tri);
            points.push(self.point(next));
            self.in_pool[next] = false;
            edge = next;
        }
        points
    }
}

/// Connect intersected edges into polylines.
///
/// Starts prefer edges with a single traversable triangle, which are the
/// open ends of curves. Walking from a start edge runs forward first and
/// then backward through any triangle left on the start edge, so a curve
/// entered mid-way is still traced whole. Closed curves come back to
/// their start edge and repeat its point at the end.
///
/// An edge lying on the surface becomes a two-point line only when none of
/// its triangles is crossed by a walked curve, as on a mesh border lying in
/// the surface. Otherwise the walk already passes through its endpoints.
pub fn connect_intersections(
    graph: &EdgeGraph,
    hits: &[Option<EdgeIntersection>],
) -> Vec<Polyline3> {
    let mut lines = Vec::new();
    let crossing = |e: usize| hits[e].is_some_and(|h| h.is_crossing());

    let active_count: Vec<usize> = graph
        .triangles
        .iter()
        .map(|t| t.edges.iter().flatten().filter(|&&e| crossing(e)).count())
        .collect();

    for (e, hit) in hits.iter().enumerate() {
        let on_surface = hit.is_some_and(|h| h.kind == IntersectionType::BothEnds);
        if on_surface && graph.edges[e].triangles.iter().all(|&t| active_count[t] == 0) {
            let (a, b) = graph.edge_points(e);
            lines.push(Polyline3::new(vec![*a, *b]));
        }
    }

    let pool: Vec<usize> = (0..graph.edges.len()).filter(|&e| crossing(e)).collect();
    if pool.is_empty() {
        return lines;
    }

    let mut walker = Walker {
        graph,
        hits,
        to_traverse: vec![Vec::new(); graph.edges.len()],
        in_pool: vec![false; graph.edges.len()],
    };
    for &e in &pool {
        walker.in_pool[e] = true;
        walker.to_traverse[e] = graph.edges[e]
            .triangles
            .iter()
            .copied()
            .filter(|&t| active_count[t] >= 2)
            .collect();
    }

    loop {
        let start = pool
            .iter()
            .copied()
            .find(|&e| walker.in_pool[e] && walker.to_traverse[e].len() == 1)
            .or_else(|| pool.iter().copied().find(|&e| walker.in_pool[e]));
        let Some(start) = start else {
            break;
        };
        walker.in_pool[start] = false;

        let forward = walker.walk(start);
        let backward = walker.walk(start);

        let mut points = Vec::with_capacity(forward.len() + backward.len() + 1);
        points.extend(backward.into_iter().rev());
        points.push(walker.point(start));
        points.extend(forward);

        let mut line = Polyline3::new(points);
        line.dedup();
        trace!(start, points = line.len(), "traced curve");
        if line.len() >= 2 {
            lines.push(line);
        }
    }

    lines
}
