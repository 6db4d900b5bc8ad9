use serde::{Deserialize, Serialize};

use geom::{Angle, Distance, Pt2D};

use crate::host::ConnectionInput;

// Keeps lateral offsets finite on connections meeting the junction almost tangentially.
const MIN_TRANSFORM_COEFFICIENT: f64 = 0.05;

/// The local reference frame of one connection at the junction. Lateral offsets are measured
/// perpendicular to the road; the entrance edge between the two corners may be skewed, so turning
/// a lateral offset into a position along the edge divides by the transform coefficient.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LaneFrame {
    /// Midway between the two corners.
    pub position: Pt2D,
    /// From the left corner towards the right corner.
    pub corner_dir: Angle,
    /// Along the road, pointing out of the junction.
    pub normal_dir: Angle,
    /// The sine of the angle between the corner and normal directions. Always positive.
    pub transform_coefficient: f64,
    /// Half of the road's width, measured perpendicular to the road.
    pub half_width: Distance,
}

impl LaneFrame {
    pub fn new(conn: &ConnectionInput) -> LaneFrame {
        let position = conn.left_corner.lerp(conn.right_corner, 0.5);
        let corner_dir = conn.left_corner.angle_to(conn.right_corner);
        let mut normal_dir = Angle::average(&[conn.left_corner_dir, conn.right_corner_dir]);
        if conn.is_start_side {
            normal_dir = normal_dir.opposite();
        }
        let transform_coefficient = corner_dir
            .sin_between(normal_dir)
            .abs()
            .max(MIN_TRANSFORM_COEFFICIENT);
        let half_width = conn.left_corner.dist_to(conn.right_corner) * transform_coefficient / 2.0;
        LaneFrame {
            position,
            corner_dir,
            normal_dir,
            transform_coefficient,
            half_width,
        }
    }

    /// Where a lateral offset from the road center lands on the entrance edge.
    pub fn world_pos(&self, lateral: Distance, offset: Distance) -> Pt2D {
        self.position
            .project_away((lateral + offset) / self.transform_coefficient, self.corner_dir)
    }

    /// Converts a distance across the road into a distance along the skewed entrance edge.
    pub fn along_edge(&self, lateral: Distance) -> Distance {
        lateral / self.transform_coefficient
    }

    pub fn corners_parallel(&self, other: &LaneFrame, within_degrees: f64) -> bool {
        self.corner_dir.approx_parallel(other.corner_dir, within_degrees)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn skewed_connection(is_start_side: bool) -> ConnectionInput {
        // The road runs along +x, but the entrance edge is cut at 45 degrees.
        let road_dir = if is_start_side {
            Angle::degrees(180.0)
        } else {
            Angle::ZERO
        };
        ConnectionInput {
            id: crate::EntranceID(1),
            is_start_side,
            lanes: Vec::new(),
            left_corner: Pt2D::new(0.0, 3.0),
            right_corner: Pt2D::new(6.0, -3.0),
            left_corner_dir: road_dir,
            right_corner_dir: road_dir,
        }
    }

    #[test]
    fn skewed_edge() {
        for is_start_side in [true, false] {
            let frame = LaneFrame::new(&skewed_connection(is_start_side));
            assert!(frame.normal_dir.approx_eq(Angle::ZERO, 1e-6));
            assert!((frame.transform_coefficient - 0.5_f64.sqrt()).abs() < 1e-9);
            // The edge is 6 * sqrt(2) long, but the road is only 6 wide.
            assert!((frame.half_width.inner_meters() - 3.0).abs() < 1e-9);
            let edge_pt = frame.world_pos(Distance::meters(3.0), Distance::ZERO);
            assert!(edge_pt.approx_eq(Pt2D::new(6.0, -3.0), Distance::meters(1e-9)));
        }
    }

    #[test]
    fn offset_adds_to_lateral() {
        let frame = LaneFrame::new(&skewed_connection(true));
        let a = frame.world_pos(Distance::meters(1.0), Distance::meters(0.5));
        let b = frame.world_pos(Distance::meters(1.5), Distance::ZERO);
        assert!(a.approx_eq(b, Distance::meters(1e-9)));
    }
}
