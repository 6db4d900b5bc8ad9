use serde::{Deserialize, Serialize};

use geom::{Angle, Distance, Pt2D};

use crate::host::LaneInput;
use crate::LaneFrame;

/// Where an anchor sits relative to the drive lanes around it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PointLocation {
    None,
    /// The left edge of the lane to the right of the anchor.
    LeftEdge,
    /// The right edge of the lane to the left of the anchor.
    RightEdge,
    /// Shared between two lanes close enough to need only one anchor.
    Between,
}

/// A drive lane, numbered from the left corner.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LaneSlot {
    pub index: usize,
    pub center: Distance,
    pub half_width: Distance,
    pub direction: Angle,
}

impl LaneSlot {
    pub fn from_lanes(lanes: &[&LaneInput]) -> Vec<LaneSlot> {
        lanes
            .iter()
            .enumerate()
            .map(|(index, l)| LaneSlot {
                index,
                center: l.center_offset,
                half_width: l.half_width,
                direction: l.direction,
            })
            .collect()
    }

    fn left_edge(&self) -> Distance {
        self.center - self.half_width
    }

    fn right_edge(&self) -> Distance {
        self.center + self.half_width
    }
}

/// Everything needed to place one Enter point, before its user offset is applied.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PointSource {
    pub location: PointLocation,
    pub left: Option<LaneSlot>,
    pub right: Option<LaneSlot>,
    is_start_side: bool,
}

impl PointSource {
    /// Walks the gaps between neighbouring lanes, including both road edges, and decides how many
    /// anchors each gap needs. `lanes` must be sorted from left to right.
    pub fn classify(lanes: &[LaneSlot], is_start_side: bool) -> Vec<PointSource> {
        let mut sources = Vec::new();
        let make = |location, left: Option<&LaneSlot>, right: Option<&LaneSlot>| PointSource {
            location,
            left: left.cloned(),
            right: right.cloned(),
            is_start_side,
        };
        for idx in 0..=lanes.len() {
            let left = if idx == 0 { None } else { lanes.get(idx - 1) };
            let right = lanes.get(idx);
            match (left, right) {
                (None, None) => {}
                (None, Some(_)) => sources.push(make(PointLocation::LeftEdge, None, right)),
                (Some(_), None) => sources.push(make(PointLocation::RightEdge, left, None)),
                (Some(l), Some(r)) => {
                    let gap = r.left_edge() - l.right_edge();
                    let average_half_width = (l.half_width + r.half_width) / 2.0;
                    if gap >= average_half_width * 0.5 {
                        sources.push(make(PointLocation::RightEdge, left, None));
                        sources.push(make(PointLocation::LeftEdge, None, right));
                    } else {
                        sources.push(make(PointLocation::Between, left, right));
                    }
                }
            }
        }
        sources
    }

    /// Distance from the road center, before any offset.
    pub fn lateral(&self) -> Distance {
        match (self.location, &self.left, &self.right) {
            (PointLocation::LeftEdge, _, Some(r)) => r.left_edge(),
            (PointLocation::RightEdge, Some(l), _) => l.right_edge(),
            (PointLocation::Between, Some(l), Some(r)) => {
                let weight = l.half_width.safe_percent(l.half_width + r.half_width);
                l.center + (r.center - l.center) * weight
            }
            _ => panic!(
                "Malformed point source {:?} with lanes {:?} and {:?}",
                self.location, self.left, self.right
            ),
        }
    }

    /// Pointing out of the junction.
    pub fn direction(&self) -> Angle {
        let mut dirs = Vec::new();
        if let Some(ref l) = self.left {
            dirs.push(l.direction);
        }
        if let Some(ref r) = self.right {
            dirs.push(r.direction);
        }
        if dirs.is_empty() || self.location == PointLocation::None {
            panic!("Point source {:?} has no lanes", self.location);
        }
        let dir = Angle::average(&dirs);
        if self.is_start_side {
            dir.opposite()
        } else {
            dir
        }
    }

    pub fn position(&self, frame: &LaneFrame, offset: Distance) -> Pt2D {
        frame.world_pos(self.lateral(), offset)
    }

    /// Which lanes this anchor borders, by index. Two sources with the same layout describe the
    /// same anchor, even if the lanes moved or changed width.
    pub fn layout(&self) -> (PointLocation, Option<usize>, Option<usize>) {
        (
            self.location,
            self.left.as_ref().map(|l| l.index),
            self.right.as_ref().map(|r| r.index),
        )
    }
}
