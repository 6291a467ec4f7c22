//! Join polyline fragments whose ends meet.
//!
//! Every surface produces its own fragments, and trimming splits them
//! further, so a curve running around a wedge comes out as several
//! pieces. Ends are paired greedily in order of increasing distance.

use sphereseg_math::Point3;
use tracing::debug;

use crate::intersect::IntersectSettings;
use crate::line::Polyline3;

struct Chain {
    points: Vec<Point3>,
    start: usize,
    end: usize,
}

impl Chain {
    fn reverse(&mut self) {
        self.points.reverse();
        std::mem::swap(&mut self.start, &mut self.end);
    }
}

fn midpoint(a: &Point3, b: &Point3) -> Point3 {
    Point3::from((a.coords + b.coords) * 0.5)
}

/// Join open lines whose ends lie within `tolerance` of each other.
///
/// Closest end pairs are joined first and every end is used at most once.
/// With `fuse` the two joined points are replaced by their average,
/// otherwise both are kept and the gap is bridged by a straight segment.
/// With `allow_self` a line of three or more points whose two ends are
/// close enough is closed into a loop. Closed lines come first in the
/// result.
pub fn join_ends(
    lines: Vec<Polyline3>,
    tolerance: f64,
    fuse: bool,
    allow_self: bool,
) -> Vec<Polyline3> {
    let mut closed = Vec::new();
    let mut chains: Vec<Option<Chain>> = Vec::new();
    for line in lines {
        if line.is_closed() {
            closed.push(line);
        } else if line.len() >= 2 {
            let k = chains.len();
            chains.push(Some(Chain {
                points: line.points,
                start: 2 * k,
                end: 2 * k + 1,
            }));
        }
    }

    let ends: Vec<Point3> = chains
        .iter()
        .flatten()
        .flat_map(|c| [c.points[0], c.points[c.points.len() - 1]])
        .collect();
    let mut owner: Vec<usize> = (0..ends.len()).map(|ep| ep / 2).collect();
    let mut open = vec![true; ends.len()];

    let mut pairs: Vec<(f64, usize, usize)> = Vec::new();
    for i in 0..ends.len() {
        for j in (i + 1)..ends.len() {
            if i / 2 == j / 2 && !allow_self {
                continue;
            }
            let d = (ends[i] - ends[j]).norm();
            if d <= tolerance {
                pairs.push((d, i, j));
            }
        }
    }
    pairs.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut joins = 0usize;
    for (_, p, q) in pairs {
        if !open[p] || !open[q] {
            continue;
        }
        let (cp, cq) = (owner[p], owner[q]);

        if cp == cq {
            if !allow_self {
                continue;
            }
            let Some(chain) = chains[cp].as_mut() else {
                continue;
            };
            if chain.points.len() < 3 {
                continue;
            }
            let first = chain.points[0];
            if fuse {
                let last = chain.points.len() - 1;
                let mid = midpoint(&first, &chain.points[last]);
                chain.points[0] = mid;
                chain.points[last] = mid;
            } else {
                chain.points.push(first);
            }
            if let Some(chain) = chains[cp].take() {
                let mut line = Polyline3::new(chain.points);
                line.dedup();
                closed.push(line);
            }
        } else {
            let (Some(mut a), Some(mut b)) = (chains[cp].take(), chains[cq].take()) else {
                continue;
            };
            if a.start == p {
                a.reverse();
            }
            if b.end == q {
                b.reverse();
            }
            if fuse {
                let last = a.points.len() - 1;
                a.points[last] = midpoint(&a.points[last], &b.points[0]);
                a.points.extend(b.points.into_iter().skip(1));
            } else {
                a.points.extend(b.points);
            }
            a.end = b.end;
            owner[a.end] = cp;
            chains[cp] = Some(a);
        }
        open[p] = false;
        open[q] = false;
        joins += 1;
    }

    debug!(joins, tolerance, fuse, allow_self, "joined line ends");
    closed.extend(chains.into_iter().flatten().map(|c| {
        let mut line = Polyline3::new(c.points);
        line.dedup();
        line
    }));
    closed
}

/// Run the joining passes selected by `settings`.
///
/// The first pass welds ends that coincide up to `fuse_tolerance`. The
/// second bridges any remaining gaps between distinct fragments. The
/// third closes lines whose own ends are within `close_tolerance`.
pub fn fuse_lines(lines: Vec<Polyline3>, settings: &IntersectSettings) -> Vec<Polyline3> {
    let mut lines = join_ends(lines, settings.fuse_tolerance, true, true);
    if settings.join_fragments {
        lines = join_ends(lines, f64::INFINITY, false, false);
    }
    if settings.close_loops {
        let tolerance = settings.close_tolerance.unwrap_or(f64::INFINITY);
        lines = join_ends(lines, tolerance, false, true);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn line(points: &[[f64; 3]]) -> Polyline3 {
        Polyline3::new(points.iter().map(|p| Point3::new(p[0], p[1], p[2])).collect())
    }

    #[test]
    fn test_fuse_averages_joint() {
        let a = line(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]]);
        let b = line(&[[1.0, 1e-7, 0.0], [2.0, 0.0, 0.0]]);
        let out = join_ends(vec![a, b], 1e-6, true, true);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].len(), 3);
        assert_relative_eq!(out[0].points[1].y, 0.5e-7, epsilon = 1e-15);
    }

    #[test]
    fn test_join_reverses_as_needed() {
        // both lines end at the shared point
        let a = line(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]]);
        let b = line(&[[2.0, 0.0, 0.0], [1.0, 0.0, 0.0]]);
        let out = join_ends(vec![a, b], 1e-6, true, false);
        assert_eq!(out.len(), 1);
        let xs: Vec<f64> = out[0].points.iter().map(|p| p.x).collect();
        assert!(xs == vec![0.0, 1.0, 2.0] || xs == vec![2.0, 1.0, 0.0]);
    }

    #[test]
    fn test_out_of_tolerance_left_alone() {
        let a = line(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]]);
        let b = line(&[[1.5, 0.0, 0.0], [2.0, 0.0, 0.0]]);
        assert_eq!(join_ends(vec![a, b], 1e-6, true, true).len(), 2);
    }

    #[test]
    fn test_concatenate_keeps_both_points() {
        let a = line(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]]);
        let b = line(&[[1.5, 0.0, 0.0], [2.0, 0.0, 0.0]]);
        let out = join_ends(vec![a, b], f64::INFINITY, false, false);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].len(), 4);
        assert!(!out[0].is_closed());
    }

    #[test]
    fn test_self_join_closes_loop() {
        let open = line(&[
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 1.0, 0.0],
            [0.0, 1e-8, 0.0],
        ]);
        let out = join_ends(vec![open], 1e-6, true, true);
        assert_eq!(out.len(), 1);
        assert!(out[0].is_closed());
        assert_eq!(out[0].len(), 4);
    }

    #[test]
    fn test_two_point_line_never_self_closes() {
        let seg = line(&[[0.0, 0.0, 0.0], [1e-9, 0.0, 0.0]]);
        let out = join_ends(vec![seg], 1e-6, true, true);
        assert_eq!(out.len(), 1);
        assert!(!out[0].is_closed());
    }

    #[test]
    fn test_closest_pairs_win() {
        // c's start is nearer a's end than b's start is
        let a = line(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]]);
        let b = line(&[[1.3, 0.0, 0.0], [2.0, 0.0, 0.0]]);
        let c = line(&[[1.1, 0.0, 0.0], [1.1, 1.0, 0.0]]);
        let out = join_ends(vec![a, b, c], 0.5, false, false);
        // a joins c; b's start then only has a used end within reach
        assert_eq!(out.len(), 2);
        let joined = out.iter().find(|l| l.len() == 4).unwrap();
        let i = joined
            .points
            .iter()
            .position(|p| p.x == 1.0 && p.y == 0.0)
            .unwrap();
        let neighbours = [joined.points.get(i.wrapping_sub(1)), joined.points.get(i + 1)];
        assert!(neighbours
            .iter()
            .flatten()
            .any(|p| p.x == 1.1 && p.y == 0.0));
    }

    #[test]
    fn test_fuse_lines_closes_fragments_into_loop() {
        // three arcs of a triangle loop with small gaps
        let a = line(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]]);
        let b = line(&[[1.0, 0.0, 0.0], [0.5, 1.0, 0.0]]);
        let c = line(&[[0.5, 1.01, 0.0], [0.0, 0.01, 0.0]]);
        let out = fuse_lines(vec![a, b, c], &IntersectSettings::default());
        assert_eq!(out.len(), 1);
        assert!(out[0].is_closed());
    }
}
