use std::fmt;

use serde::{Deserialize, Serialize};

use geom::{Angle, Bounds, Distance, Line, Pt2D};

use crate::host::{ConnectionInput, ContourCurve};
use crate::{
    LaneFrame, LaneSlot, MarkingPoint, MarkupConfig, PointGeometry, PointID, PointKind,
    PointOrigin, PointSource,
};

// The outward ray of a Normal point starts this far outside the entrance edge, so that the edge
// itself is always the first crossing.
const NORMAL_RAY_LEAD: Distance = Distance::const_meters(1.0);
// Crossings closer than this are one crossing, like a corner shared by two contour pieces.
const SAME_CROSSING: Distance = Distance::const_meters(0.01);

/// Identifies a connection; stable across edits to its lanes.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntranceID(pub u16);

impl fmt::Display for EntranceID {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Entrance #{}", self.0)
    }
}

/// What changed when an entrance was refreshed from new road data.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntranceUpdate {
    /// Same lane layout; every point kept its identity and offset.
    Geometry,
    /// The lanes were added, removed or regrouped. All points were rebuilt with zero offsets.
    Topology,
}

/// All marking points where one road meets the junction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Entrance {
    pub id: EntranceID,
    pub is_start_side: bool,
    pub frame: LaneFrame,
    lanes: Vec<LaneSlot>,
    enter: Vec<MarkingPoint>,
    crosswalk: Vec<MarkingPoint>,
    normal: Vec<MarkingPoint>,
    lane: Vec<MarkingPoint>,
    /// Indices of the Enter points, sorted by where they currently sit across the road.
    order: Vec<u8>,
}

impl Entrance {
    pub fn new(conn: &ConnectionInput) -> Entrance {
        let mut entrance = Entrance {
            id: conn.id,
            is_start_side: conn.is_start_side,
            frame: LaneFrame::new(conn),
            lanes: Vec::new(),
            enter: Vec::new(),
            crosswalk: Vec::new(),
            normal: Vec::new(),
            lane: Vec::new(),
            order: Vec::new(),
        };
        let lanes = LaneSlot::from_lanes(&conn.drive_lanes());
        let sources = PointSource::classify(&lanes, conn.is_start_side);
        entrance.rebuild_points(lanes, sources);
        entrance
    }

    /// Refreshes the frame and lanes. Points survive when the lane layout is unchanged.
    pub fn update(&mut self, conn: &ConnectionInput) -> EntranceUpdate {
        assert_eq!(self.id, conn.id);
        let lanes = LaneSlot::from_lanes(&conn.drive_lanes());
        let sources = PointSource::classify(&lanes, conn.is_start_side);
        self.frame = LaneFrame::new(conn);

        let same_layout = conn.is_start_side == self.is_start_side
            && sources.len() == self.enter.len()
            && self.enter.iter().zip(sources.iter()).all(|(pt, src)| match pt.origin {
                PointOrigin::Lanes(ref old) => old.layout() == src.layout(),
                _ => false,
            });
        if same_layout {
            for (pt, src) in self.enter.iter_mut().zip(sources) {
                pt.origin = PointOrigin::Lanes(src);
            }
            self.lanes = lanes;
            self.recalculate_order();
            EntranceUpdate::Geometry
        } else {
            self.is_start_side = conn.is_start_side;
            self.rebuild_points(lanes, sources);
            EntranceUpdate::Topology
        }
    }

    fn rebuild_points(&mut self, lanes: Vec<LaneSlot>, sources: Vec<PointSource>) {
        if sources.len() > u8::MAX as usize {
            panic!("{} has {} anchor points; too many to index", self.id, sources.len());
        }
        let id = self.id;
        let count = sources.len() as u8;

        self.enter = sources
            .into_iter()
            .enumerate()
            .map(|(idx, src)| {
                MarkingPoint::new(
                    PointID::new(id, idx as u8 + 1, PointKind::Enter),
                    PointOrigin::Lanes(src),
                )
            })
            .collect();
        self.crosswalk = (1..=count)
            .map(|idx| {
                MarkingPoint::new(
                    PointID::new(id, idx, PointKind::Crosswalk),
                    PointOrigin::Enter(idx),
                )
            })
            .collect();
        self.normal = (1..=count)
            .map(|idx| {
                MarkingPoint::new(
                    PointID::new(id, idx, PointKind::Normal),
                    PointOrigin::Enter(idx),
                )
            })
            .collect();

        // Which Enter points sit on the left and right edge of each lane
        let mut left_edge = vec![None; lanes.len()];
        let mut right_edge = vec![None; lanes.len()];
        for pt in &self.enter {
            if let PointOrigin::Lanes(ref src) = pt.origin {
                if let Some(ref r) = src.right {
                    left_edge[r.index] = Some(pt.id.index);
                }
                if let Some(ref l) = src.left {
                    right_edge[l.index] = Some(pt.id.index);
                }
            }
        }
        self.lane = lanes
            .iter()
            .filter_map(|slot| match (left_edge[slot.index], right_edge[slot.index]) {
                (Some(a), Some(b)) => Some(MarkingPoint::new(
                    PointID::new(id, slot.index as u8 + 1, PointKind::Lane),
                    PointOrigin::EnterPair(a, b),
                )),
                _ => None,
            })
            .collect();

        self.lanes = lanes;
        self.recalculate_order();
    }

    fn recalculate_order(&mut self) -> bool {
        let mut order: Vec<(Distance, u8)> = self
            .enter
            .iter()
            .map(|pt| match pt.origin {
                PointOrigin::Lanes(ref src) => (src.lateral() + pt.offset, pt.id.index),
                _ => unreachable!(),
            })
            .collect();
        order.sort();
        let order: Vec<u8> = order.into_iter().map(|(_, idx)| idx).collect();
        let changed = order != self.order;
        self.order = order;
        changed
    }

    pub fn lanes(&self) -> &Vec<LaneSlot> {
        &self.lanes
    }

    pub fn points_of(&self, kind: PointKind) -> &Vec<MarkingPoint> {
        match kind {
            PointKind::Enter => &self.enter,
            PointKind::Crosswalk => &self.crosswalk,
            PointKind::Normal => &self.normal,
            PointKind::Lane => &self.lane,
        }
    }

    pub fn all_points(&self) -> impl Iterator<Item = &MarkingPoint> {
        self.enter
            .iter()
            .chain(self.crosswalk.iter())
            .chain(self.normal.iter())
            .chain(self.lane.iter())
    }

    pub fn point(&self, id: PointID) -> Option<&MarkingPoint> {
        if id.entrance != self.id {
            return None;
        }
        self.points_of(id.kind).iter().find(|pt| pt.id == id)
    }

    /// Returns true if the left-to-right order of the Enter points changed. Panics if the point
    /// doesn't belong here.
    pub fn set_offset(&mut self, id: PointID, offset: Distance) -> bool {
        let list = match id.kind {
            PointKind::Enter => &mut self.enter,
            PointKind::Crosswalk => &mut self.crosswalk,
            PointKind::Normal => &mut self.normal,
            PointKind::Lane => &mut self.lane,
        };
        match list.iter_mut().find(|pt| pt.id == id) {
            Some(pt) => {
                pt.offset = offset;
            }
            None => panic!("{} doesn't have {}", self.id, id),
        }
        if id.kind == PointKind::Enter {
            self.recalculate_order()
        } else {
            false
        }
    }

    pub fn order(&self) -> &Vec<u8> {
        &self.order
    }

    /// Where an Enter point ranks from the left. None for other kinds of points.
    pub fn order_position(&self, id: PointID) -> Option<usize> {
        if id.entrance != self.id || id.kind != PointKind::Enter {
            return None;
        }
        self.order.iter().position(|idx| *idx == id.index)
    }

    pub fn first_in_order(&self) -> Option<PointID> {
        self.order
            .first()
            .map(|idx| PointID::new(self.id, *idx, PointKind::Enter))
    }

    pub fn last_in_order(&self) -> Option<PointID> {
        self.order
            .last()
            .map(|idx| PointID::new(self.id, *idx, PointKind::Enter))
    }

    pub fn enter_geometry(&self, index: u8) -> Option<PointGeometry> {
        let pt = self.enter.get((index as usize).checked_sub(1)?)?;
        match pt.origin {
            PointOrigin::Lanes(ref src) => Some(PointGeometry {
                position: src.position(&self.frame, pt.offset),
                direction: src.direction(),
            }),
            _ => None,
        }
    }

    /// Derives where a point of this entrance currently is.
    pub fn point_geometry(
        &self,
        id: PointID,
        contour: &[ContourCurve],
        config: &MarkupConfig,
    ) -> Option<PointGeometry> {
        let pt = self.point(id)?;
        match (id.kind, &pt.origin) {
            (PointKind::Enter, _) => self.enter_geometry(id.index),
            (PointKind::Crosswalk, PointOrigin::Enter(idx)) => {
                let enter = self.enter_geometry(*idx)?;
                let shift = self.frame.along_edge(config.crosswalk_shift + pt.offset);
                Some(PointGeometry {
                    position: enter.position.project_away(shift, enter.direction.opposite()),
                    direction: enter.direction,
                })
            }
            (PointKind::Normal, PointOrigin::Enter(idx)) => {
                let enter = self.enter_geometry(*idx)?;
                Some(normal_projection(id, enter, contour, pt.offset))
            }
            (PointKind::Lane, PointOrigin::EnterPair(a, b)) => {
                let left = self.enter_geometry(*a)?;
                let right = self.enter_geometry(*b)?;
                Some(PointGeometry {
                    position: left
                        .position
                        .lerp(right.position, 0.5)
                        .project_away(self.frame.along_edge(pt.offset), self.frame.corner_dir),
                    direction: Angle::average(&[left.direction, right.direction]),
                })
            }
            _ => panic!("{} has a mismatched origin {:?}", id, pt.origin),
        }
    }
}

/// Follows the Enter point's ray through the junction. The first crossing is the entrance edge
/// itself, so the second one is where the ray leaves the junction on the far side.
fn normal_projection(
    id: PointID,
    enter: PointGeometry,
    contour: &[ContourCurve],
    offset: Distance,
) -> PointGeometry {
    let inward = enter.direction.opposite();
    let start = enter.position.project_away(NORMAL_RAY_LEAD, enter.direction);
    let mut bounds = Bounds::from(&[start]);
    for curve in contour {
        bounds.union(curve.get_bounds());
    }
    let ray = Line::new(
        start,
        start.project_away(bounds.diagonal() + NORMAL_RAY_LEAD * 2.0, inward),
    );

    let mut crossings: Vec<Distance> = contour
        .iter()
        .flat_map(|curve| curve.crossings(&ray))
        .collect();
    crossings.sort();
    let mut merged: Vec<Distance> = Vec::new();
    for dist in crossings {
        if merged
            .last()
            .map(|last| dist - *last < SAME_CROSSING)
            .unwrap_or(false)
        {
            continue;
        }
        merged.push(dist);
    }

    let position = match merged.len() {
        0 => {
            warn!("{} doesn't cross the junction contour; leaving it at the entrance", id);
            enter.position
        }
        1 => {
            warn!("{} crosses the junction contour only once", id);
            start.project_away(merged[0], inward)
        }
        _ => start.project_away(merged[1], inward),
    };
    PointGeometry {
        position: position.project_away(offset, inward.rotate_degs(-90.0)),
        direction: inward,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{LaneInput, NetworkClass};

    fn conn(offsets: &[f64]) -> ConnectionInput {
        ConnectionInput {
            id: EntranceID(1),
            is_start_side: true,
            lanes: offsets
                .iter()
                .map(|offset| LaneInput {
                    center_offset: Distance::meters(*offset),
                    half_width: Distance::meters(1.5),
                    direction: Angle::degrees(180.0),
                    network: NetworkClass::Car,
                })
                .collect(),
            left_corner: Pt2D::new(10.0, 3.0),
            right_corner: Pt2D::new(10.0, -3.0),
            left_corner_dir: Angle::degrees(180.0),
            right_corner_dir: Angle::degrees(180.0),
        }
    }

    fn pt(index: u8, kind: PointKind) -> PointID {
        PointID::new(EntranceID(1), index, kind)
    }

    #[test]
    fn builds_all_kinds() {
        let entrance = Entrance::new(&conn(&[-1.5, 1.5]));
        assert_eq!(entrance.points_of(PointKind::Enter).len(), 3);
        assert_eq!(entrance.points_of(PointKind::Crosswalk).len(), 3);
        assert_eq!(entrance.points_of(PointKind::Normal).len(), 3);
        assert_eq!(entrance.points_of(PointKind::Lane).len(), 2);
        assert_eq!(
            entrance.point(pt(2, PointKind::Lane)).unwrap().sources(),
            vec![pt(2, PointKind::Enter), pt(3, PointKind::Enter)]
        );
        assert_eq!(entrance.order(), &vec![1, 2, 3]);
        let first = entrance.enter_geometry(1).unwrap();
        assert!(first
            .position
            .approx_eq(Pt2D::new(10.0, 3.0), Distance::meters(1e-9)));
        assert!(first.direction.approx_eq(Angle::ZERO, 1e-6));
    }

    #[test]
    fn reorder_only_when_order_changes() {
        let mut entrance = Entrance::new(&conn(&[-1.5, 1.5]));
        // Moving the middle point a little keeps the order
        assert!(!entrance.set_offset(pt(2, PointKind::Enter), Distance::meters(1.0)));
        // Past the right edge, it swaps with point 3
        assert!(entrance.set_offset(pt(2, PointKind::Enter), Distance::meters(4.0)));
        assert_eq!(entrance.order(), &vec![1, 3, 2]);
        assert_eq!(entrance.last_in_order(), Some(pt(2, PointKind::Enter)));
        // Derived points never reorder
        assert!(!entrance.set_offset(pt(1, PointKind::Normal), Distance::meters(4.0)));
    }

    #[test]
    fn geometry_update_keeps_offsets() {
        let mut entrance = Entrance::new(&conn(&[-1.5, 1.5]));
        entrance.set_offset(pt(1, PointKind::Enter), Distance::meters(0.5));

        let mut moved = conn(&[-1.5, 1.5]);
        moved.left_corner = Pt2D::new(12.0, 3.0);
        moved.right_corner = Pt2D::new(12.0, -3.0);
        assert_eq!(entrance.update(&moved), EntranceUpdate::Geometry);
        assert_eq!(
            entrance.point(pt(1, PointKind::Enter)).unwrap().offset,
            Distance::meters(0.5)
        );
        assert!(entrance
            .enter_geometry(1)
            .unwrap()
            .position
            .approx_eq(Pt2D::new(12.0, 2.5), Distance::meters(1e-9)));

        assert_eq!(
            entrance.update(&conn(&[-2.0, 0.0, 2.0])),
            EntranceUpdate::Topology
        );
        assert_eq!(
            entrance.point(pt(1, PointKind::Enter)).unwrap().offset,
            Distance::ZERO
        );
    }

    #[test]
    fn normal_crosses_to_far_side() {
        let entrance = Entrance::new(&conn(&[0.0]));
        let square = vec![
            ContourCurve::Straight {
                a: Pt2D::new(10.0, -10.0),
                b: Pt2D::new(10.0, 10.0),
            },
            ContourCurve::Straight {
                a: Pt2D::new(10.0, 10.0),
                b: Pt2D::new(-10.0, 10.0),
            },
            ContourCurve::Straight {
                a: Pt2D::new(-10.0, 10.0),
                b: Pt2D::new(-10.0, -10.0),
            },
            ContourCurve::Straight {
                a: Pt2D::new(-10.0, -10.0),
                b: Pt2D::new(10.0, -10.0),
            },
        ];
        let config = MarkupConfig::default();
        let normal = entrance
            .point_geometry(pt(1, PointKind::Normal), &square, &config)
            .unwrap();
        // Enter point 1 is the lane's left edge, at (10, 1.5)
        assert!(normal
            .position
            .approx_eq(Pt2D::new(-10.0, 1.5), Distance::meters(1e-6)));
        assert!(normal.direction.approx_eq(Angle::degrees(180.0), 1e-6));

        let crosswalk = entrance
            .point_geometry(pt(1, PointKind::Crosswalk), &square, &config)
            .unwrap();
        assert!(crosswalk
            .position
            .approx_eq(Pt2D::new(9.5, 1.5), Distance::meters(1e-9)));
    }

    #[test]
    fn normal_without_a_far_side() {
        let entrance = Entrance::new(&conn(&[0.0]));
        let config = MarkupConfig::default();
        let id = pt(1, PointKind::Normal);

        // No contour at all: the point stays on its Enter point
        let stranded = entrance.point_geometry(id, &[], &config).unwrap();
        assert!(stranded
            .position
            .approx_eq(Pt2D::new(10.0, 1.5), Distance::meters(1e-9)));
        assert!(stranded.direction.approx_eq(Angle::degrees(180.0), 1e-6));

        // Only the far edge: its one crossing is used
        let far_edge = vec![ContourCurve::Straight {
            a: Pt2D::new(-10.0, 10.0),
            b: Pt2D::new(-10.0, -10.0),
        }];
        let once = entrance.point_geometry(id, &far_edge, &config).unwrap();
        assert!(once
            .position
            .approx_eq(Pt2D::new(-10.0, 1.5), Distance::meters(1e-6)));
    }
}
