//! Cut polylines back to the part that lies on the wedge side of a surface.
//!
//! A point is kept when its distance is non-negative. Where a polyline
//! leaves or re-enters the kept region the exact crossing point is
//! inserted, so trimmed pieces end on the trimming surface.

use sphereseg_math::Point3;

use crate::line::Polyline3;
use crate::surface::CutSurface;

/// Trim `lines` to the non-negative side of `surface`.
pub fn trim<S: CutSurface + ?Sized>(lines: Vec<Polyline3>, surface: &S) -> Vec<Polyline3> {
    trim_by(
        lines,
        |p| surface.distance(p) >= 0.0,
        |inside, outside| surface.intersection_point(inside, outside),
    )
}

/// Trim `lines` to the union of the non-negative sides of `a` and `b`.
///
/// Used for reflex azimuth spans, where the wedge is the union of two
/// half-spaces. At a transition every surface that changes side yields a
/// candidate crossing; the union boundary is the candidate farthest from
/// the kept endpoint.
pub fn trim_union<A, B>(lines: Vec<Polyline3>, a: &A, b: &B) -> Vec<Polyline3>
where
    A: CutSurface + ?Sized,
    B: CutSurface + ?Sized,
{
    trim_by(
        lines,
        |p| a.distance(p) >= 0.0 || b.distance(p) >= 0.0,
        |inside, outside| {
            let mut best: Option<(f64, Point3)> = None;
            let mut consider = |c: Point3| {
                let d = (c - inside).norm_squared();
                if best.map_or(true, |(bd, _)| d > bd) {
                    best = Some((d, c));
                }
            };
            if a.distance(inside) >= 0.0 {
                consider(a.intersection_point(inside, outside));
            }
            if b.distance(inside) >= 0.0 {
                consider(b.intersection_point(inside, outside));
            }
            best.map_or(*inside, |(_, p)| p)
        },
    )
}

/// Split every line into runs of kept points.
///
/// `crossing(inside, outside)` returns the boundary point between a kept
/// and a rejected point. A closed line whose first point is kept and which
/// is split has its first and last runs joined back together.
fn trim_by<V, C>(lines: Vec<Polyline3>, valid: V, crossing: C) -> Vec<Polyline3>
where
    V: Fn(&Point3) -> bool,
    C: Fn(&Point3, &Point3) -> Point3,
{
    let mut out = Vec::with_capacity(lines.len());

    for line in lines {
        if line.len() < 2 {
            continue;
        }
        let flags: Vec<bool> = line.points.iter().map(&valid).collect();
        if flags.iter().all(|&f| f) {
            out.push(line);
            continue;
        }

        let mut runs: Vec<Vec<Point3>> = Vec::new();
        let mut current: Vec<Point3> = Vec::new();
        if flags[0] {
            current.push(line.points[0]);
        }
        for (i, pair) in line.points.windows(2).enumerate() {
            let (p, q) = (&pair[0], &pair[1]);
            match (flags[i], flags[i + 1]) {
                (true, true) => current.push(*q),
                (true, false) => {
                    current.push(crossing(p, q));
                    runs.push(std::mem::take(&mut current));
                }
                (false, true) => {
                    current.push(crossing(q, p));
                    current.push(*q);
                }
                (false, false) => {}
            }
        }
        if !current.is_empty() {
            runs.push(current);
        }

        let wraps = line.is_closed() && flags[0] && runs.len() > 1;
        if wraps {
            let first = runs.remove(0);
            if let Some(last) = runs.last_mut() {
                last.extend(first.into_iter().skip(1));
            }
        }

        for run in runs {
            let mut piece = Polyline3::new(run);
            piece.dedup();
            if piece.len() >= 2 {
                out.push(piece);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{AzimuthSurface, RadiusSurface};
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    fn circle(radius: f64, z: f64, n: usize) -> Polyline3 {
        let mut points: Vec<Point3> = (0..n)
            .map(|i| {
                let a = std::f64::consts::TAU * i as f64 / n as f64;
                Point3::new(radius * a.sin(), radius * a.cos(), z)
            })
            .collect();
        points.push(points[0]);
        Polyline3::new(points)
    }

    #[test]
    fn test_trim_keeps_inside_line() {
        let line = Polyline3::new(vec![Point3::new(0.0, 0.1, 0.0), Point3::new(0.0, 0.5, 0.0)]);
        let out = trim(vec![line.clone()], &RadiusSurface::new(1.0));
        assert_eq!(out, vec![line]);
    }

    #[test]
    fn test_trim_inserts_crossing() {
        let line = Polyline3::new(vec![
            Point3::new(0.0, 0.5, 0.0),
            Point3::new(0.0, 1.5, 0.0),
            Point3::new(0.0, 2.0, 0.0),
        ]);
        let out = trim(vec![line], &RadiusSurface::new(1.0));
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].len(), 2);
        assert_relative_eq!(out[0].end().unwrap().y, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_trim_drops_outside_line() {
        let line = Polyline3::new(vec![Point3::new(0.0, 3.0, 0.0), Point3::new(0.0, 4.0, 0.0)]);
        assert!(trim(vec![line], &RadiusSurface::new(1.0)).is_empty());
    }

    #[test]
    fn test_trim_closed_loop_rejoins_across_seam() {
        // circle starting at +Y, cut by the azimuth 0 plane which keeps the
        // +X half; the start point is kept so the loop comes back as one arc
        let plane = AzimuthSurface::min(0.0);
        let out = trim(vec![circle(1.0, 0.0, 16)], &plane);
        assert_eq!(out.len(), 1);
        let arc = &out[0];
        assert!(!arc.is_closed());
        assert!(arc.points.iter().all(|p| p.x >= -1e-12));
        assert_relative_eq!(arc.start().unwrap().x, 0.0, epsilon = 1e-12);
        assert_relative_eq!(arc.end().unwrap().x, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_trim_union_keeps_either_side() {
        // one plane keeps x >= 0, the other keeps y <= 0
        let a = AzimuthSurface::min(0.0);
        let b = AzimuthSurface::max(-FRAC_PI_2);
        let out = trim_union(vec![circle(1.0, 0.0, 32)], &a, &b);
        assert_eq!(out.len(), 1);
        // only the quadrant with x < 0 and y > 0 is cut away
        for p in &out[0].points {
            assert!(!(p.x < -1e-9 && p.y > 1e-9), "kept {p:?}");
        }
    }
}
