use serde::{Deserialize, Serialize};

use crate::{Angle, Bounds, Distance, Pt2D, PARAM_EPSILON};

/// A line segment. Unlike most geometry here, a zero-length segment is allowed; it just never
/// intersects anything.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Line(Pt2D, Pt2D);

impl Line {
    pub fn new(pt1: Pt2D, pt2: Pt2D) -> Line {
        Line(pt1, pt2)
    }

    pub fn pt1(&self) -> Pt2D {
        self.0
    }

    pub fn pt2(&self) -> Pt2D {
        self.1
    }

    pub fn length(&self) -> Distance {
        self.0.dist_to(self.1)
    }

    pub fn angle(&self) -> Angle {
        self.0.angle_to(self.1)
    }

    pub fn reversed(&self) -> Line {
        Line(self.1, self.0)
    }

    pub fn middle(&self) -> Pt2D {
        self.0.lerp(self.1, 0.5)
    }

    /// The point at some fraction of the way from pt1 to pt2. Doesn't clamp.
    pub fn percent_along(&self, t: f64) -> Pt2D {
        self.0.lerp(self.1, t)
    }

    pub fn bounds(&self) -> Bounds {
        Bounds::from(&[self.0, self.1])
    }

    /// Where the two segments cross, expressed as the fraction along self and along other. Parallel
    /// and collinear segments never cross.
    pub fn intersection_params(&self, other: &Line) -> Option<(f64, f64)> {
        let (t, u) = self.infinite_intersection_params(other)?;
        let inside = |x: f64| (-PARAM_EPSILON..=1.0 + PARAM_EPSILON).contains(&x);
        if inside(t) && inside(u) {
            Some((t.clamp(0.0, 1.0), u.clamp(0.0, 1.0)))
        } else {
            None
        }
    }

    /// Like `intersection_params`, but treats both segments as infinite lines.
    pub fn infinite_intersection_params(&self, other: &Line) -> Option<(f64, f64)> {
        let (x1, y1) = (self.0.x(), self.0.y());
        let (dx1, dy1) = (self.1.x() - x1, self.1.y() - y1);
        let (x2, y2) = (other.0.x(), other.0.y());
        let (dx2, dy2) = (other.1.x() - x2, other.1.y() - y2);

        let denom = dx1 * dy2 - dy1 * dx2;
        let scale = (dx1.hypot(dy1) * dx2.hypot(dy2)).max(f64::MIN_POSITIVE);
        if (denom / scale).abs() < 1e-12 {
            return None;
        }
        let t = ((x2 - x1) * dy2 - (y2 - y1) * dx2) / denom;
        let u = ((x2 - x1) * dy1 - (y2 - y1) * dx1) / denom;
        Some((t, u))
    }

    pub fn intersection(&self, other: &Line) -> Option<Pt2D> {
        self.intersection_params(other)
            .map(|(t, _)| self.percent_along(t))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crossing_params() {
        let a = Line::new(Pt2D::new(0.0, 0.0), Pt2D::new(10.0, 0.0));
        let b = Line::new(Pt2D::new(4.0, -7.0), Pt2D::new(4.0, 3.0));
        let (t, u) = a.intersection_params(&b).unwrap();
        assert!((t - 0.4).abs() < 1e-12);
        assert!((u - 0.7).abs() < 1e-12);
        let (u2, t2) = b.intersection_params(&a).unwrap();
        assert_eq!((t, u), (t2, u2));
    }

    #[test]
    fn parallel_and_missing() {
        let a = Line::new(Pt2D::new(0.0, 0.0), Pt2D::new(10.0, 0.0));
        let b = Line::new(Pt2D::new(0.0, 1.0), Pt2D::new(10.0, 1.0));
        assert!(a.intersection_params(&b).is_none());
        let c = Line::new(Pt2D::new(11.0, -1.0), Pt2D::new(11.0, 1.0));
        assert!(a.intersection_params(&c).is_none());
        assert!(a.infinite_intersection_params(&c).is_some());
    }

    #[test]
    fn shared_endpoint_counts() {
        let a = Line::new(Pt2D::new(0.0, 0.0), Pt2D::new(10.0, 0.0));
        let b = Line::new(Pt2D::new(10.0, 0.0), Pt2D::new(10.0, 5.0));
        let (t, u) = a.intersection_params(&b).unwrap();
        assert_eq!((t, u), (1.0, 0.0));
    }
}
