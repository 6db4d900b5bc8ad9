//! A geometric model of the road markings painted inside one junction: points along each entrance,
//! lines between them, where those lines cross, and filled regions outlined by them.

#[macro_use]
extern crate anyhow;
#[macro_use]
extern crate log;

mod config;
mod deps;
pub mod host;
mod intersection;
mod lane_frame;
mod markup;
mod objects;
mod persist;
mod point_source;
mod styles;
mod trajectory;

pub use crate::config::MarkupConfig;
pub use crate::deps::{DependencyGraph, Node};
pub use crate::intersection::{must_intersect, IntersectionEngine, LineIntersection, LinePair};
pub use crate::lane_frame::LaneFrame;
pub use crate::markup::Markup;
pub use crate::objects::entrance::{Entrance, EntranceID, EntranceUpdate};
pub use crate::objects::filler::{
    edge_between, ContourEdge, ContourStatus, Filler, FillerContour, FillerID, FillerVertex,
};
pub use crate::objects::line::{
    nearest_crosswalk_cut, LineEdge, LineKind, LineRule, MarkingLine, RuleSpan,
};
pub use crate::objects::point::{
    MarkingPoint, PointGeometry, PointID, PointKind, PointOrigin, PointPair,
};
pub use crate::persist::{
    EdgeRecord, FillerRecord, LineKindRecord, LineRecord, LoadReport, MarkupDocument,
    ObjectsMap, PointRecord, RuleRecord, VertexRecord, DOCUMENT_VERSION,
};
pub use crate::point_source::{LaneSlot, PointLocation, PointSource};
pub use crate::styles::{CrosswalkStyle, FillerStyle, LineStyle};
pub use crate::trajectory::{Trajectory, TrajectoryEnd};

#[cfg(test)]
pub(crate) mod fixtures {
    use geom::{Angle, Distance, Pt2D};

    use crate::host::{ConnectionInput, ContourCurve, JunctionInput, LaneInput, NetworkClass};
    use crate::EntranceID;

    /// A plain four-way crossroads. Entrances 1 to 4 face east, north, west and south, each 10m
    /// from the center with two 3m lanes.
    pub fn crossroads() -> JunctionInput {
        let mut connections = Vec::new();
        for (i, degrees) in [0.0, 90.0, 180.0, 270.0].into_iter().enumerate() {
            let outward = Angle::degrees(degrees);
            let center = Pt2D::new(0.0, 0.0).project_away(Distance::meters(10.0), outward);
            let corner_dir = outward.rotate_degs(-90.0);
            let left_corner = center.project_away(Distance::meters(-3.0), corner_dir);
            let right_corner = center.project_away(Distance::meters(3.0), corner_dir);
            let lanes = [-1.5, 1.5]
                .into_iter()
                .map(|offset| LaneInput {
                    center_offset: Distance::meters(offset),
                    half_width: Distance::meters(1.5),
                    direction: outward.opposite(),
                    network: NetworkClass::Car,
                })
                .collect();
            connections.push(ConnectionInput {
                id: EntranceID(i as u16 + 1),
                is_start_side: true,
                lanes,
                left_corner,
                right_corner,
                left_corner_dir: outward.opposite(),
                right_corner_dir: outward.opposite(),
            });
        }

        let mut contour = Vec::new();
        for i in 0..connections.len() {
            let this = &connections[i];
            let next = &connections[(i + 1) % connections.len()];
            contour.push(ContourCurve::Straight {
                a: this.right_corner,
                b: this.left_corner,
            });
            // The curb from this entrance's left corner to the next one's right
            contour.push(ContourCurve::Straight {
                a: this.left_corner,
                b: next.right_corner,
            });
        }
        JunctionInput {
            connections,
            contour,
        }
    }
}
