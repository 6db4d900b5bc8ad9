use std::ops::Range;

use lyon_geom::{CubicBezierSegment, LineSegment};
use serde::{Deserialize, Serialize};

use crate::{Angle, Bounds, Distance, Line, Pt2D, FLATNESS};

// Hits closer than this (in curve parameter on both curves) are the same hit.
const DEDUPE_PARAM: f64 = 1e-5;

/// A cubic Bezier curve from `a` to `d`, with `b` and `c` as control points. The math is done by
/// lyon_geom; this keeps the curve in ground-plane types.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CubicBezier {
    pub a: Pt2D,
    pub b: Pt2D,
    pub c: Pt2D,
    pub d: Pt2D,
}

impl CubicBezier {
    pub fn new(a: Pt2D, b: Pt2D, c: Pt2D, d: Pt2D) -> CubicBezier {
        CubicBezier { a, b, c, d }
    }

    /// A curve leaving `start` heading along `start_dir` and arriving at `end` heading along
    /// `end_dir`. The arms are the distances from each endpoint to its control point.
    pub fn from_directions(
        start: Pt2D,
        start_dir: Angle,
        start_arm: Distance,
        end: Pt2D,
        end_dir: Angle,
        end_arm: Distance,
    ) -> CubicBezier {
        CubicBezier::new(
            start,
            start.project_away(start_arm, start_dir),
            end.project_away(end_arm, end_dir.opposite()),
            end,
        )
    }

    fn segment(&self) -> CubicBezierSegment<f64> {
        CubicBezierSegment {
            from: self.a.to_lyon(),
            ctrl1: self.b.to_lyon(),
            ctrl2: self.c.to_lyon(),
            to: self.d.to_lyon(),
        }
    }

    fn from_segment(seg: CubicBezierSegment<f64>) -> CubicBezier {
        CubicBezier::new(
            Pt2D::from_lyon(seg.from),
            Pt2D::from_lyon(seg.ctrl1),
            Pt2D::from_lyon(seg.ctrl2),
            Pt2D::from_lyon(seg.to),
        )
    }

    pub fn position(&self, t: f64) -> Pt2D {
        Pt2D::from_lyon(self.segment().sample(t))
    }

    /// The direction of travel at t. Where a control point sits on its endpoint, the derivative
    /// vanishes, so look a little further in.
    pub fn tangent(&self, t: f64) -> Angle {
        let seg = self.segment();
        let v = seg.derivative(t);
        if v.length() > 1e-9 {
            return Angle::from_vector(v.x, v.y);
        }
        let nudged = if t < 0.5 { t + 1e-3 } else { t - 1e-3 };
        let v = seg.derivative(nudged);
        if v.length() > 1e-12 {
            return Angle::from_vector(v.x, v.y);
        }
        self.a.angle_to(self.d)
    }

    /// The piece between t0 and t1. If t0 > t1, the result runs backwards.
    pub fn cut(&self, t0: f64, t1: f64) -> CubicBezier {
        if t0 > t1 {
            return self.cut(t1, t0).reversed();
        }
        let (t0, t1) = (t0.max(0.0), t1.min(1.0));
        if t1 <= t0 {
            let pt = self.position(t0);
            return CubicBezier::new(pt, pt, pt, pt);
        }
        CubicBezier::from_segment(self.segment().split_range(t0..t1))
    }

    pub fn reversed(&self) -> CubicBezier {
        CubicBezier::new(self.d, self.c, self.b, self.a)
    }

    /// The tight bounds of the curve itself.
    pub fn bounds(&self) -> Bounds {
        let bbox = self.segment().bounding_box();
        Bounds::from(&[Pt2D::from_lyon(bbox.min), Pt2D::from_lyon(bbox.max)])
    }

    pub fn length(&self) -> Distance {
        Distance::meters(self.segment().approximate_length(FLATNESS))
    }

    /// Evenly spaced in t, including both endpoints.
    pub fn points(&self, segments: usize) -> Vec<Pt2D> {
        let segments = segments.max(1);
        (0..=segments)
            .map(|i| self.position(i as f64 / segments as f64))
            .collect()
    }

    /// Starting from t, walk `dist` along the curve and return the new t. Stops at 1.
    pub fn travel(&self, t: f64, dist: Distance) -> f64 {
        let remaining = dist.inner_meters();
        if remaining <= 0.0 || t >= 1.0 {
            return t;
        }
        let rest = self.segment().split_range(t..1.0);
        let mut walked = 0.0;
        let mut found: Option<f64> = None;
        let mut visit = |piece: &LineSegment<f64>, range: Range<f64>| {
            if found.is_some() {
                return;
            }
            let step = piece.length();
            if walked + step >= remaining && step > 0.0 {
                let frac = (remaining - walked) / step;
                let local = range.start + (range.end - range.start) * frac;
                found = Some(t + (1.0 - t) * local);
            }
            walked += step;
        };
        rest.for_each_flattened_with_t(FLATNESS, &mut visit);
        found.unwrap_or(1.0).min(1.0)
    }

    /// Every place the curve crosses the segment, as (t along the curve, fraction along the line).
    pub fn line_intersections(&self, line: &Line) -> Vec<(f64, f64)> {
        let segment = LineSegment {
            from: line.pt1().to_lyon(),
            to: line.pt2().to_lyon(),
        };
        dedupe(
            self.segment()
                .line_segment_intersections_t(&segment)
                .into_iter()
                .collect(),
        )
    }

    /// Every place the two curves cross, as (t along self, t along other).
    pub fn intersections(&self, other: &CubicBezier) -> Vec<(f64, f64)> {
        dedupe(
            self.segment()
                .cubic_intersections_t(&other.segment())
                .into_iter()
                .collect(),
        )
    }
}

fn dedupe(mut hits: Vec<(f64, f64)>) -> Vec<(f64, f64)> {
    hits.sort_by(|x, y| x.0.total_cmp(&y.0).then(x.1.total_cmp(&y.1)));
    let mut result: Vec<(f64, f64)> = Vec::new();
    for hit in hits {
        if let Some(last) = result.last() {
            if (last.0 - hit.0).abs() < DEDUPE_PARAM && (last.1 - hit.1).abs() < DEDUPE_PARAM {
                continue;
            }
        }
        result.push(hit);
    }
    result
}

#[cfg(test)]
mod tests {
    use rand::{Rng, SeedableRng};
    use rand_xorshift::XorShiftRng;

    use super::*;

    fn quarter_turn() -> CubicBezier {
        CubicBezier::from_directions(
            Pt2D::new(0.0, 0.0),
            Angle::ZERO,
            Distance::meters(5.52),
            Pt2D::new(10.0, 10.0),
            Angle::degrees(90.0),
            Distance::meters(5.52),
        )
    }

    #[test]
    fn cut_matches_position() {
        let curve = quarter_turn();
        let piece = curve.cut(0.25, 0.75);
        for i in 0..=10 {
            let local = i as f64 / 10.0;
            let global = 0.25 + 0.5 * local;
            assert!(piece
                .position(local)
                .approx_eq(curve.position(global), Distance::meters(1e-9)));
        }
        let backwards = curve.cut(0.75, 0.25);
        assert!(backwards.a.approx_eq(piece.d, Distance::meters(1e-9)));
    }

    #[test]
    fn length_of_quarter_circle() {
        // A radius 10 quarter circle is about 15.708m; the cubic approximation is very close.
        let len = quarter_turn().length().inner_meters();
        assert!((len - 15.708).abs() < 0.02, "length {}", len);
    }

    #[test]
    fn travel_reaches_expected_distance() {
        let curve = quarter_turn();
        let t = curve.travel(0.0, Distance::meters(5.0));
        let walked = curve.cut(0.0, t).length().inner_meters();
        assert!((walked - 5.0).abs() < 0.01, "walked {}", walked);
        assert_eq!(curve.travel(0.3, Distance::meters(1000.0)), 1.0);
    }

    #[test]
    fn crossing_curves() {
        let curve = quarter_turn();
        let other = CubicBezier::from_directions(
            Pt2D::new(10.0, 0.0),
            Angle::degrees(180.0),
            Distance::meters(5.52),
            Pt2D::new(0.0, 10.0),
            Angle::degrees(90.0),
            Distance::meters(5.52),
        );
        let hits = curve.intersections(&other);
        assert_eq!(hits.len(), 1);
        let (t1, t2) = hits[0];
        assert!(curve
            .position(t1)
            .approx_eq(other.position(t2), Distance::meters(0.01)));
        // Mirror images meet at the same parameter
        assert!((t1 - t2).abs() < 1e-3);
    }

    #[test]
    fn intersections_are_symmetric() {
        let mut rng = XorShiftRng::seed_from_u64(42);
        fn random_curve(rng: &mut XorShiftRng) -> CubicBezier {
            let mut pts = Vec::new();
            for _ in 0..4 {
                pts.push(Pt2D::new(
                    rng.gen_range(-20.0..20.0),
                    rng.gen_range(-20.0..20.0),
                ));
            }
            CubicBezier::new(pts[0], pts[1], pts[2], pts[3])
        }
        for _ in 0..50 {
            let c1 = random_curve(&mut rng);
            let c2 = random_curve(&mut rng);
            for (t1, t2) in c1.intersections(&c2) {
                assert!(c1
                    .position(t1)
                    .approx_eq(c2.position(t2), Distance::meters(0.01)));
            }
            for (t2, t1) in c2.intersections(&c1) {
                assert!(c1
                    .position(t1)
                    .approx_eq(c2.position(t2), Distance::meters(0.01)));
            }
        }
    }

    #[test]
    fn line_crossing() {
        let curve = quarter_turn();
        let line = Line::new(Pt2D::new(0.0, 5.0), Pt2D::new(20.0, 5.0));
        let hits = curve.line_intersections(&line);
        assert_eq!(hits.len(), 1);
        let (t, u) = hits[0];
        assert!(curve
            .position(t)
            .approx_eq(line.percent_along(u), Distance::meters(0.01)));
    }
}
