use std::f64::consts::PI;
use std::fmt;

use serde::{Deserialize, Serialize};

/// An angle, stored in radians. Directions on the ground plane are represented this way, measured
/// counterclockwise from the positive x axis.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Angle(f64);

impl Angle {
    pub const ZERO: Angle = Angle(0.0);

    pub fn new_rads(rads: f64) -> Angle {
        if !rads.is_finite() {
            panic!("Bad Angle {}", rads);
        }
        Angle(rads)
    }

    pub fn degrees(degs: f64) -> Angle {
        Angle::new_rads(degs.to_radians())
    }

    /// The direction of a vector. A zero vector points along the x axis.
    pub fn from_vector(dx: f64, dy: f64) -> Angle {
        Angle::new_rads(dy.atan2(dx))
    }

    pub fn opposite(self) -> Angle {
        Angle(self.0 + PI)
    }

    pub fn rotate_degs(self, degrees: f64) -> Angle {
        Angle(self.0 + degrees.to_radians())
    }

    /// In [0, 2pi)
    pub fn normalized_radians(self) -> f64 {
        self.0.rem_euclid(2.0 * PI)
    }

    /// In [0, 360)
    pub fn normalized_degrees(self) -> f64 {
        self.normalized_radians().to_degrees()
    }

    /// The unit vector (cos, sin) pointing this way.
    pub fn unit(self) -> (f64, f64) {
        (self.0.cos(), self.0.sin())
    }

    /// How far to rotate from self to reach other, in (-180, 180] degrees. Positive is
    /// counterclockwise.
    pub fn shortest_rotation_towards(self, other: Angle) -> Angle {
        let mut delta = (other.0 - self.0).rem_euclid(2.0 * PI);
        if delta > PI {
            delta -= 2.0 * PI;
        }
        Angle(delta)
    }

    /// Signed degrees, for rotations produced by `shortest_rotation_towards`.
    pub fn signed_degrees(self) -> f64 {
        self.0.to_degrees()
    }

    pub fn approx_eq(self, other: Angle, within_degrees: f64) -> bool {
        self.shortest_rotation_towards(other).0.abs().to_degrees() <= within_degrees
    }

    /// True if the two angles point the same or exactly opposite ways.
    pub fn approx_parallel(self, other: Angle, within_degrees: f64) -> bool {
        self.approx_eq(other, within_degrees) || self.approx_eq(other.opposite(), within_degrees)
    }

    /// The sine of the rotation from self to other.
    pub fn sin_between(self, other: Angle) -> f64 {
        (other.0 - self.0).sin()
    }

    /// Averages directions as unit vectors, so 350 and 10 degrees average to 0. Panics on an empty
    /// list.
    pub fn average(angles: &[Angle]) -> Angle {
        if angles.is_empty() {
            panic!("Can't average zero angles");
        }
        let (mut dx, mut dy) = (0.0, 0.0);
        for a in angles {
            let (x, y) = a.unit();
            dx += x;
            dy += y;
        }
        if dx.abs() < 1e-12 && dy.abs() < 1e-12 {
            // Exactly opposing directions; just keep the first.
            return angles[0];
        }
        Angle::from_vector(dx, dy)
    }
}

impl fmt::Display for Angle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Angle({} degrees)", self.normalized_degrees())
    }
}
