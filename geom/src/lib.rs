//! Geometry primitives for road markings: points, angles and distances on the ground plane,
//! straight segments, cubic curves, and closed outlines.

#[macro_use]
extern crate anyhow;

mod angle;
mod bezier;
mod bounds;
mod distance;
mod line;
mod pt;
mod ring;

pub use crate::angle::Angle;
pub use crate::bezier::CubicBezier;
pub use crate::bounds::Bounds;
pub use crate::distance::Distance;
pub use crate::line::Line;
pub use crate::pt::Pt2D;
pub use crate::ring::Ring;

/// Two points closer than this are considered the same.
pub const EPSILON_DIST: Distance = Distance::const_meters(0.0001);

/// Curve pieces whose control points stay this close to their chord are treated as straight.
pub(crate) const FLATNESS: f64 = 0.001;

/// Parameters along a segment are allowed to miss [0, 1] by this much before a hit is rejected.
pub(crate) const PARAM_EPSILON: f64 = 1e-9;
