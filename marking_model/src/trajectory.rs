use serde::{Deserialize, Serialize};

use geom::{Angle, Bounds, CubicBezier, Distance, Line, Pt2D};

use crate::{MarkupConfig, PointGeometry};

// Arm length, as a fraction of the chord, at ends that don't need to blend smoothly.
const ROUGH_SHAPE: f64 = 0.15;
const COLLINEAR_SHAPE: f64 = 1.0 / 3.0;
// Directions within this of being opposite make a line a candidate for median correction.
const THROUGH_TOLERANCE_DEGREES: f64 = 15.0;
// Segments used to draw one curve.
const CURVE_SEGMENTS: usize = 16;

/// The path a line takes between its two points. Parameterized by t in [0, 1]; a combined
/// trajectory splits that range evenly between its parts.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Trajectory {
    Straight(Line),
    Curve(CubicBezier),
    Combined(Vec<Trajectory>),
}

/// One end of a trajectory being built.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrajectoryEnd {
    pub geometry: PointGeometry,
    /// Enter and Lane points continue the lane they come from, so the curve leaves them
    /// tangentially with a circular-arc blend.
    pub smooth: bool,
    /// The entrance's corner direction, if the point sits on an entrance edge.
    pub corner_dir: Option<Angle>,
}

impl Trajectory {
    /// The path from `a` into the junction and out through `b`. Both directions point out of the
    /// junction.
    pub fn build(a: &TrajectoryEnd, b: &TrajectoryEnd, config: &MarkupConfig) -> Trajectory {
        let (start, end) = (a.geometry.position, b.geometry.position);
        let chord = Line::new(start, end);
        if start.approx_eq(end, geom::EPSILON_DIST) {
            return Trajectory::Straight(chord);
        }
        let leaving = a.geometry.direction.opposite();
        let arriving = b.geometry.direction;
        let tolerance = config.straight_tolerance_degrees;

        let corners_parallel = match (a.corner_dir, b.corner_dir) {
            (Some(x), Some(y)) => x.approx_parallel(y, tolerance),
            _ => true,
        };
        if chord.angle().approx_eq(leaving, tolerance)
            && chord.angle().approx_eq(arriving, tolerance)
            && corners_parallel
        {
            return Trajectory::Straight(chord);
        }

        if leaving.approx_eq(arriving, THROUGH_TOLERANCE_DEGREES) {
            let shift = end.dist_left_of(start, leaving).abs();
            if shift > chord.length() * config.median_ratio {
                let middle = chord.middle();
                let heading = chord.angle();
                return Trajectory::Combined(vec![
                    Trajectory::Curve(curve(
                        start,
                        leaving,
                        a.smooth,
                        middle,
                        heading,
                        true,
                        tolerance,
                    )),
                    Trajectory::Curve(curve(
                        middle,
                        heading,
                        true,
                        end,
                        arriving,
                        b.smooth,
                        tolerance,
                    )),
                ]);
            }
        }

        Trajectory::Curve(curve(start, leaving, a.smooth, end, arriving, b.smooth, tolerance))
    }

    /// A straight segment between two points, ignoring their directions.
    pub fn straight(a: Pt2D, b: Pt2D) -> Trajectory {
        Trajectory::Straight(Line::new(a, b))
    }

    pub fn is_straight(&self) -> bool {
        matches!(self, Trajectory::Straight(_))
    }

    pub fn start(&self) -> Pt2D {
        self.position(0.0)
    }

    pub fn end(&self) -> Pt2D {
        self.position(1.0)
    }

    pub fn position(&self, t: f64) -> Pt2D {
        match self {
            Trajectory::Straight(line) => line.percent_along(t),
            Trajectory::Curve(curve) => curve.position(t),
            Trajectory::Combined(parts) => {
                let (idx, local) = locate(parts.len(), t);
                parts[idx].position(local)
            }
        }
    }

    /// The direction of travel at t.
    pub fn tangent(&self, t: f64) -> Angle {
        match self {
            Trajectory::Straight(line) => line.angle(),
            Trajectory::Curve(curve) => curve.tangent(t),
            Trajectory::Combined(parts) => {
                let (idx, local) = locate(parts.len(), t);
                parts[idx].tangent(local)
            }
        }
    }

    pub fn length(&self) -> Distance {
        match self {
            Trajectory::Straight(line) => line.length(),
            Trajectory::Curve(curve) => curve.length(),
            Trajectory::Combined(parts) => parts.iter().map(|p| p.length()).sum(),
        }
    }

    pub fn reversed(&self) -> Trajectory {
        match self {
            Trajectory::Straight(line) => Trajectory::Straight(line.reversed()),
            Trajectory::Curve(curve) => Trajectory::Curve(curve.reversed()),
            Trajectory::Combined(parts) => {
                Trajectory::Combined(parts.iter().rev().map(|p| p.reversed()).collect())
            }
        }
    }

    /// The piece between two parameters. If `from` > `to`, the piece runs backwards.
    pub fn cut(&self, from: f64, to: f64) -> Trajectory {
        if from > to {
            return self.cut(to, from).reversed();
        }
        match self {
            Trajectory::Straight(line) => {
                Trajectory::Straight(Line::new(line.percent_along(from), line.percent_along(to)))
            }
            Trajectory::Curve(curve) => Trajectory::Curve(curve.cut(from, to)),
            Trajectory::Combined(parts) => {
                let n = parts.len() as f64;
                let mut pieces = Vec::new();
                for (idx, part) in parts.iter().enumerate() {
                    let lo = from.max(idx as f64 / n);
                    let hi = to.min((idx + 1) as f64 / n);
                    if hi > lo {
                        pieces.push(part.cut(lo * n - idx as f64, hi * n - idx as f64));
                    }
                }
                match pieces.len() {
                    0 => {
                        let pt = self.position(from);
                        Trajectory::Straight(Line::new(pt, pt))
                    }
                    1 => pieces.remove(0),
                    _ => Trajectory::Combined(pieces),
                }
            }
        }
    }

    /// Starting at t, move `dist` along the trajectory and return the new parameter. Stops at 1.
    pub fn travel(&self, t: f64, dist: Distance) -> f64 {
        match self {
            Trajectory::Straight(line) => (t + dist.safe_percent(line.length())).min(1.0),
            Trajectory::Curve(curve) => curve.travel(t, dist),
            Trajectory::Combined(parts) => {
                let n = parts.len();
                let (mut idx, mut local) = locate(n, t);
                let mut remaining = dist;
                loop {
                    let part = &parts[idx];
                    let next = part.travel(local, remaining);
                    if next < 1.0 || idx + 1 == n {
                        return (idx as f64 + next) / n as f64;
                    }
                    remaining -= part.cut(local, 1.0).length();
                    if remaining <= Distance::ZERO {
                        return (idx + 1) as f64 / n as f64;
                    }
                    idx += 1;
                    local = 0.0;
                }
            }
        }
    }

    /// Every crossing with another trajectory, as (t along self, t along other).
    pub fn intersections(&self, other: &Trajectory) -> Vec<(f64, f64)> {
        let mut hits: Vec<(f64, f64)> = match (self, other) {
            (Trajectory::Straight(l1), Trajectory::Straight(l2)) => {
                l1.intersection_params(l2).into_iter().collect()
            }
            (Trajectory::Straight(line), Trajectory::Curve(curve)) => curve
                .line_intersections(line)
                .into_iter()
                .map(|(t_curve, t_line)| (t_line, t_curve))
                .collect(),
            (Trajectory::Curve(curve), Trajectory::Straight(line)) => {
                curve.line_intersections(line)
            }
            (Trajectory::Curve(c1), Trajectory::Curve(c2)) => c1.intersections(c2),
            (Trajectory::Combined(parts), _) => {
                let n = parts.len() as f64;
                let mut hits = Vec::new();
                for (idx, part) in parts.iter().enumerate() {
                    for (t1, t2) in part.intersections(other) {
                        hits.push(((idx as f64 + t1) / n, t2));
                    }
                }
                hits
            }
            (_, Trajectory::Combined(_)) => other
                .intersections(self)
                .into_iter()
                .map(|(t2, t1)| (t1, t2))
                .collect(),
        };
        hits.sort_by(|a, b| a.0.total_cmp(&b.0));
        // Crossings exactly at the joint of two parts show up twice
        hits.dedup_by(|a, b| (a.0 - b.0).abs() < 1e-6 && (a.1 - b.1).abs() < 1e-6);
        hits
    }

    /// Points to draw this with.
    pub fn points(&self) -> Vec<Pt2D> {
        match self {
            Trajectory::Straight(line) => vec![line.pt1(), line.pt2()],
            Trajectory::Curve(curve) => curve.points(CURVE_SEGMENTS),
            Trajectory::Combined(parts) => {
                let mut pts: Vec<Pt2D> = Vec::new();
                for part in parts {
                    for pt in part.points() {
                        if pts
                            .last()
                            .map(|last| last.approx_eq(pt, geom::EPSILON_DIST))
                            .unwrap_or(false)
                        {
                            continue;
                        }
                        pts.push(pt);
                    }
                }
                pts
            }
        }
    }

    pub fn get_bounds(&self) -> Bounds {
        match self {
            Trajectory::Straight(line) => line.bounds(),
            Trajectory::Curve(curve) => curve.bounds(),
            Trajectory::Combined(parts) => {
                let mut bounds = Bounds::new();
                for part in parts {
                    bounds.union(part.get_bounds());
                }
                bounds
            }
        }
    }
}

/// Which part of an evenly split trajectory t falls in, and where within it.
fn locate(parts: usize, t: f64) -> (usize, f64) {
    let n = parts as f64;
    let idx = ((t * n).floor().max(0.0) as usize).min(parts - 1);
    (idx, t * n - idx as f64)
}

fn curve(
    start: Pt2D,
    leaving: Angle,
    start_smooth: bool,
    end: Pt2D,
    arriving: Angle,
    end_smooth: bool,
    tolerance: f64,
) -> CubicBezier {
    let chord = start.dist_to(end);
    let turn = leaving
        .shortest_rotation_towards(arriving)
        .signed_degrees()
        .abs();
    let shape = |smooth: bool| {
        if !smooth {
            ROUGH_SHAPE
        } else if turn <= tolerance {
            COLLINEAR_SHAPE
        } else {
            arc_shape(turn.to_radians())
        }
    };
    CubicBezier::from_directions(
        start,
        leaving,
        chord * shape(start_smooth),
        end,
        arriving,
        chord * shape(end_smooth),
    )
}

/// Control arm length, relative to the chord, of a cubic approximating a circular arc that turns
/// by `theta` radians.
fn arc_shape(theta: f64) -> f64 {
    let half_sin = (theta / 2.0).sin();
    if half_sin.abs() < 1e-6 {
        return COLLINEAR_SHAPE;
    }
    4.0 / 3.0 * (theta / 4.0).tan() / (2.0 * half_sin)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn end(x: f64, y: f64, degrees: f64) -> TrajectoryEnd {
        TrajectoryEnd {
            geometry: PointGeometry {
                position: Pt2D::new(x, y),
                direction: Angle::degrees(degrees),
            },
            smooth: true,
            corner_dir: None,
        }
    }

    #[test]
    fn collinear_is_straight() {
        let t = Trajectory::build(
            &end(10.0, 0.0, 0.0),
            &end(-10.0, 0.0, 180.0),
            &MarkupConfig::default(),
        );
        assert!(t.is_straight());
        assert!(t
            .position(0.5)
            .approx_eq(Pt2D::new(0.0, 0.0), Distance::meters(1e-9)));
    }

    #[test]
    fn quarter_turn_is_an_arc() {
        // Leave (10, -3) heading west, leave the junction heading south at (-3, -10)
        let t = Trajectory::build(
            &end(10.0, -3.0, 0.0),
            &end(-3.0, -10.0, 270.0),
            &MarkupConfig::default(),
        );
        assert!(!t.is_straight());
        assert!(t.tangent(0.0).approx_eq(Angle::degrees(180.0), 1e-6));
        assert!(t.tangent(1.0).approx_eq(Angle::degrees(270.0), 1e-6));
        assert!(t.end().approx_eq(Pt2D::new(-3.0, -10.0), Distance::meters(1e-9)));
    }

    #[test]
    fn arc_shape_limits() {
        assert!((arc_shape(1e-9) - 1.0 / 3.0).abs() < 1e-9);
        assert!((arc_shape(1e-3) - 1.0 / 3.0).abs() < 1e-3);
        // A quarter circle of radius 1 has arms of 0.5523 and a chord of sqrt(2)
        let expected = 0.5523 / 2.0_f64.sqrt();
        assert!((arc_shape(std::f64::consts::FRAC_PI_2) - expected).abs() < 1e-3);
    }

    #[test]
    fn median_correction() {
        // A through line shifted sideways by 6m over 20m
        let t = Trajectory::build(
            &end(10.0, 3.0, 0.0),
            &end(-10.0, -3.0, 180.0),
            &MarkupConfig::default(),
        );
        match t {
            Trajectory::Combined(ref parts) => assert_eq!(parts.len(), 2),
            _ => panic!("expected a combined trajectory, got {:?}", t),
        }
        assert!(t
            .position(0.5)
            .approx_eq(Pt2D::new(0.0, 0.0), Distance::meters(1e-9)));
        let chord = Pt2D::new(10.0, 3.0).angle_to(Pt2D::new(-10.0, -3.0));
        assert!(t.tangent(0.5).approx_eq(chord, 1e-6));

        let mut config = MarkupConfig::default();
        config.median_ratio = 0.5;
        assert!(matches!(
            Trajectory::build(&end(10.0, 3.0, 0.0), &end(-10.0, -3.0, 180.0), &config),
            Trajectory::Curve(_)
        ));
    }

    #[test]
    fn cut_and_travel() {
        let line = Trajectory::straight(Pt2D::new(0.0, 0.0), Pt2D::new(10.0, 0.0));
        let piece = line.cut(0.8, 0.2);
        assert!(piece.start().approx_eq(Pt2D::new(8.0, 0.0), Distance::meters(1e-9)));
        assert!(piece.end().approx_eq(Pt2D::new(2.0, 0.0), Distance::meters(1e-9)));
        assert!((line.travel(0.1, Distance::meters(3.0)) - 0.4).abs() < 1e-9);
        assert_eq!(line.travel(0.9, Distance::meters(3.0)), 1.0);

        let combined = Trajectory::Combined(vec![
            Trajectory::straight(Pt2D::new(0.0, 0.0), Pt2D::new(10.0, 0.0)),
            Trajectory::straight(Pt2D::new(10.0, 0.0), Pt2D::new(10.0, 10.0)),
        ]);
        assert_eq!(combined.length(), Distance::meters(20.0));
        assert!((combined.travel(0.25, Distance::meters(10.0)) - 0.75).abs() < 1e-9);
        let middle = combined.cut(0.25, 0.75);
        assert!(middle.start().approx_eq(Pt2D::new(5.0, 0.0), Distance::meters(1e-9)));
        assert!(middle.end().approx_eq(Pt2D::new(10.0, 5.0), Distance::meters(1e-9)));
        assert_eq!(middle.length(), Distance::meters(10.0));
    }

    #[test]
    fn crossing_parameters() {
        let a = Trajectory::straight(Pt2D::new(0.0, 0.0), Pt2D::new(10.0, 0.0));
        let b = Trajectory::straight(Pt2D::new(4.0, -7.0), Pt2D::new(4.0, 3.0));
        let hits = a.intersections(&b);
        assert_eq!(hits.len(), 1);
        assert!((hits[0].0 - 0.4).abs() < 1e-9);
        assert!((hits[0].1 - 0.7).abs() < 1e-9);
        let swapped = b.intersections(&a);
        assert!((swapped[0].0 - 0.7).abs() < 1e-9);
        assert!((swapped[0].1 - 0.4).abs() < 1e-9);
    }
}
