//! How markings look. Only the parameters live here; turning them into paint is the renderer's
//! job.

use serde::{Deserialize, Serialize};

use geom::{Angle, Distance};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum LineStyle {
    Solid {
        width: Distance,
    },
    Dashed {
        width: Distance,
        dash_length: Distance,
        space_length: Distance,
    },
    DoubleSolid {
        width: Distance,
        gap: Distance,
    },
    DoubleDashed {
        width: Distance,
        dash_length: Distance,
        space_length: Distance,
        gap: Distance,
    },
    /// A solid line beside a dashed one; which side is solid is seen from the line's start.
    SolidAndDashed {
        width: Distance,
        dash_length: Distance,
        space_length: Distance,
        gap: Distance,
        solid_on_left: bool,
    },
    /// A row of triangles, for give-way lines.
    SharkTeeth {
        base: Distance,
        height: Distance,
        space: Distance,
    },
}

impl LineStyle {
    pub fn stop_line() -> LineStyle {
        LineStyle::Solid {
            width: Distance::const_meters(0.3),
        }
    }

    /// How wide the painted band is, across all of its strokes.
    pub fn total_width(&self) -> Distance {
        match self {
            LineStyle::Solid { width } | LineStyle::Dashed { width, .. } => *width,
            LineStyle::DoubleSolid { width, gap }
            | LineStyle::DoubleDashed { width, gap, .. }
            | LineStyle::SolidAndDashed { width, gap, .. } => *width * 2.0 + *gap,
            LineStyle::SharkTeeth { height, .. } => *height,
        }
    }
}

impl Default for LineStyle {
    fn default() -> LineStyle {
        LineStyle::Dashed {
            width: Distance::const_meters(0.15),
            dash_length: Distance::const_meters(1.5),
            space_length: Distance::const_meters(1.5),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum CrosswalkStyle {
    Zebra {
        width: Distance,
        dash_length: Distance,
        space_length: Distance,
    },
    /// Two lines bounding the crossing, without stripes.
    ParallelLines {
        width: Distance,
        line_width: Distance,
    },
    Ladder {
        width: Distance,
        dash_length: Distance,
        space_length: Distance,
        line_width: Distance,
    },
}

impl CrosswalkStyle {
    /// How far the crossing reaches across the road, measured along the crosswalk's direction.
    pub fn width(&self) -> Distance {
        match self {
            CrosswalkStyle::Zebra { width, .. }
            | CrosswalkStyle::ParallelLines { width, .. }
            | CrosswalkStyle::Ladder { width, .. } => *width,
        }
    }
}

impl Default for CrosswalkStyle {
    fn default() -> CrosswalkStyle {
        CrosswalkStyle::Zebra {
            width: Distance::const_meters(3.0),
            dash_length: Distance::const_meters(0.4),
            space_length: Distance::const_meters(0.6),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum FillerStyle {
    Solid,
    Stripe {
        width: Distance,
        step: Distance,
        angle: Angle,
    },
    Grid {
        width: Distance,
        step: Distance,
        angle: Angle,
    },
    Chevron {
        width: Distance,
        step: Distance,
        angle_between: Angle,
    },
}

impl Default for FillerStyle {
    fn default() -> FillerStyle {
        FillerStyle::Stripe {
            width: Distance::const_meters(0.15),
            step: Distance::const_meters(1.0),
            angle: Angle::degrees(45.0),
        }
    }
}
