use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Angle, Distance};

/// This represents world-space in meters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pt2D {
    x: f64,
    y: f64,
}

impl Pt2D {
    pub fn new(x: f64, y: f64) -> Pt2D {
        if !x.is_finite() || !y.is_finite() {
            panic!("Bad Pt2D {}, {}", x, y);
        }
        Pt2D { x, y }
    }

    pub fn x(self) -> f64 {
        self.x
    }

    pub fn y(self) -> f64 {
        self.y
    }

    /// Negative distances project the opposite way.
    pub fn project_away(self, dist: Distance, theta: Angle) -> Pt2D {
        let (cos, sin) = theta.unit();
        let dist = dist.inner_meters();
        Pt2D::new(self.x + dist * cos, self.y + dist * sin)
    }

    pub fn angle_to(self, to: Pt2D) -> Angle {
        Angle::from_vector(to.x - self.x, to.y - self.y)
    }

    pub fn dist_to(self, to: Pt2D) -> Distance {
        Distance::meters(self.raw_dist_to(to))
    }

    pub(crate) fn raw_dist_to(self, to: Pt2D) -> f64 {
        ((self.x - to.x).powi(2) + (self.y - to.y).powi(2)).sqrt()
    }

    pub fn approx_eq(self, other: Pt2D, threshold: Distance) -> bool {
        self.raw_dist_to(other) <= threshold.inner_meters()
    }

    /// Linear interpolation; t = 0 is self, t = 1 is other.
    pub fn lerp(self, other: Pt2D, t: f64) -> Pt2D {
        Pt2D::new(
            self.x + (other.x - self.x) * t,
            self.y + (other.y - self.y) * t,
        )
    }

    pub(crate) fn to_lyon(self) -> lyon_geom::Point<f64> {
        lyon_geom::point(self.x, self.y)
    }

    pub(crate) fn from_lyon(pt: lyon_geom::Point<f64>) -> Pt2D {
        Pt2D::new(pt.x, pt.y)
    }

    /// Signed distance of this point to the left of the ray starting at `origin` and pointing
    /// along `dir`.
    pub fn dist_left_of(self, origin: Pt2D, dir: Angle) -> Distance {
        let (cos, sin) = dir.unit();
        Distance::meters(cos * (self.y - origin.y) - sin * (self.x - origin.x))
    }
}

impl fmt::Display for Pt2D {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Pt2D({0}, {1})", self.x, self.y)
    }
}
