//! The read-only snapshot of road geometry that markings are derived from. Whoever owns the road
//! network fills these in; nothing here is ever written back.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use geom::{Angle, Bounds, CubicBezier, Distance, Line, Pt2D};

use crate::EntranceID;

/// Who travels on a lane. Only matters for deciding which lanes get anchor points.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NetworkClass {
    Car,
    Bus,
    Tram,
    Trolleybus,
    Bicycle,
    Pedestrian,
}

impl NetworkClass {
    /// Sidewalks are never marked.
    pub fn is_drive(self) -> bool {
        self != NetworkClass::Pedestrian
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LaneInput {
    /// Signed distance of the lane center from the road center. Grows towards the right corner.
    pub center_offset: Distance,
    pub half_width: Distance,
    /// The lane geometry's tangent where it meets the junction, oriented towards the start node
    /// of the road segment. This is independent of the direction of travel.
    pub direction: Angle,
    pub network: NetworkClass,
}

/// One road meeting the junction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConnectionInput {
    pub id: EntranceID,
    /// True if the road segment starts at this junction.
    pub is_start_side: bool,
    pub lanes: Vec<LaneInput>,
    /// Left and right are as seen when looking out of the junction along the road.
    pub left_corner: Pt2D,
    pub right_corner: Pt2D,
    /// Tangents of the road edges at the corners, oriented like `LaneInput::direction`.
    pub left_corner_dir: Angle,
    pub right_corner_dir: Angle,
}

impl ConnectionInput {
    /// Lanes that can carry markings, ordered from the left corner to the right one.
    pub fn drive_lanes(&self) -> Vec<&LaneInput> {
        let mut lanes: Vec<&LaneInput> = self
            .lanes
            .iter()
            .filter(|l| l.network.is_drive())
            .collect();
        lanes.sort_by_key(|l| l.center_offset);
        lanes
    }
}

/// One piece of the junction's outline.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ContourCurve {
    Straight { a: Pt2D, b: Pt2D },
    Curve { a: Pt2D, b: Pt2D, c: Pt2D, d: Pt2D },
}

impl ContourCurve {
    /// Where this piece crosses the segment, as the distance along the segment from its start.
    pub fn crossings(&self, ray: &Line) -> Vec<Distance> {
        let length = ray.length();
        match self {
            ContourCurve::Straight { a, b } => {
                if a.approx_eq(*b, geom::EPSILON_DIST) {
                    return Vec::new();
                }
                ray.intersection_params(&Line::new(*a, *b))
                    .map(|(t, _)| vec![length * t])
                    .unwrap_or_default()
            }
            ContourCurve::Curve { a, b, c, d } => CubicBezier::new(*a, *b, *c, *d)
                .line_intersections(ray)
                .into_iter()
                .map(|(_, t)| length * t)
                .collect(),
        }
    }

    pub fn get_bounds(&self) -> Bounds {
        match self {
            ContourCurve::Straight { a, b } => Bounds::from(&[*a, *b]),
            ContourCurve::Curve { a, b, c, d } => Bounds::from(&[*a, *b, *c, *d]),
        }
    }
}

/// Everything known about one junction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JunctionInput {
    /// Listed counterclockwise around the junction.
    pub connections: Vec<ConnectionInput>,
    pub contour: Vec<ContourCurve>,
}

impl JunctionInput {
    pub fn load(path: &str) -> Result<JunctionInput> {
        let junction: JunctionInput = abstutil::read_json(path)?;
        junction.validate()?;
        Ok(junction)
    }

    pub fn validate(&self) -> Result<()> {
        let mut seen = std::collections::BTreeSet::new();
        for conn in &self.connections {
            if !seen.insert(conn.id) {
                bail!("{} appears twice in the junction", conn.id);
            }
            if conn.left_corner.approx_eq(conn.right_corner, geom::EPSILON_DIST) {
                bail!("{} has zero width", conn.id);
            }
            for lane in &conn.lanes {
                if lane.half_width <= Distance::ZERO {
                    bail!("{} has a lane with width {}", conn.id, lane.half_width * 2.0);
                }
            }
        }
        Ok(())
    }
}
