use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use geom::Distance;

use crate::{CrosswalkStyle, LineStyle, PointID, PointKind, PointPair, Trajectory};

/// What a line is for. Each kind only carries what it needs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum LineKind {
    /// Runs across the junction between Enter or Normal points. Split into rules, each drawn in its
    /// own style.
    Regular { rules: Vec<LineRule> },
    /// Across the lanes of one entrance.
    Stop { style: LineStyle },
    /// Between two Crosswalk points of one entrance.
    Crosswalk { style: CrosswalkStyle },
    /// Follows a lane from one entrance to another.
    Lane { style: LineStyle },
    /// The junction's own boundary: an entrance edge, or the curb between two neighbouring
    /// entrances. Derived on demand and never stored.
    Enter,
}

impl LineKind {
    /// The usual kind of line for two points, or None if nothing can join them.
    pub fn default_for(pair: PointPair) -> Option<LineKind> {
        let candidates = [
            LineKind::Stop {
                style: LineStyle::stop_line(),
            },
            LineKind::Crosswalk {
                style: CrosswalkStyle::default(),
            },
            LineKind::Lane {
                style: LineStyle::default(),
            },
            LineKind::Regular { rules: Vec::new() },
        ];
        candidates.into_iter().find(|kind| kind.allows(pair))
    }

    /// Can this kind of line join these two points?
    pub fn allows(&self, pair: PointPair) -> bool {
        let (a, b) = (pair.first.kind, pair.second.kind);
        match self {
            LineKind::Regular { .. } => {
                let ok = |k: PointKind| k == PointKind::Enter || k == PointKind::Normal;
                ok(a)
                    && ok(b)
                    && !pair.both(PointKind::Normal)
                    && !(pair.both(PointKind::Enter) && pair.is_same_entrance())
            }
            LineKind::Stop { .. } => pair.both(PointKind::Enter) && pair.is_same_entrance(),
            LineKind::Crosswalk { .. } => {
                pair.both(PointKind::Crosswalk) && pair.is_same_entrance()
            }
            LineKind::Lane { .. } => pair.both(PointKind::Lane) && !pair.is_same_entrance(),
            LineKind::Enter => pair.both(PointKind::Enter),
        }
    }

    /// How wide the painted band is. Regular lines vary rule by rule, and enter lines aren't
    /// painted.
    pub fn width(&self) -> Option<Distance> {
        match self {
            LineKind::Stop { style } | LineKind::Lane { style } => Some(style.total_width()),
            LineKind::Crosswalk { style } => Some(style.width()),
            LineKind::Regular { .. } | LineKind::Enter => None,
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            LineKind::Regular { .. } => "regular",
            LineKind::Stop { .. } => "stop",
            LineKind::Crosswalk { .. } => "crosswalk",
            LineKind::Lane { .. } => "lane",
            LineKind::Enter => "enter",
        }
    }
}

/// Where a rule starts or ends along its line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LineEdge {
    /// One of the line's own endpoints.
    Point(PointID),
    /// Where another line crosses this one.
    Line(PointPair),
}

/// A span of a regular line drawn in one style.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LineRule {
    pub from: LineEdge,
    pub to: LineEdge,
    pub style: LineStyle,
}

/// A stored line: a pair of points and what to draw between them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MarkingLine {
    pub id: PointPair,
    pub kind: LineKind,
}

impl MarkingLine {
    /// Panics if the kind can't join the pair, or for the implicit Enter kind.
    pub fn new(id: PointPair, kind: LineKind) -> MarkingLine {
        if kind == LineKind::Enter {
            panic!("{} can't be stored as an enter line", id);
        }
        if !kind.allows(id) {
            panic!("A {} line can't join {}", kind.describe(), id);
        }
        MarkingLine { id, kind }
    }

    pub fn rules(&self) -> &[LineRule] {
        match self.kind {
            LineKind::Regular { ref rules } => rules,
            _ => &[],
        }
    }

    pub(crate) fn rules_mut(&mut self) -> Option<&mut Vec<LineRule>> {
        match self.kind {
            LineKind::Regular { ref mut rules } => Some(rules),
            _ => None,
        }
    }

    pub fn is_regular(&self) -> bool {
        matches!(self.kind, LineKind::Regular { .. })
    }

    pub fn is_crosswalk(&self) -> bool {
        matches!(self.kind, LineKind::Crosswalk { .. })
    }

    /// Other lines that rule edges are cut by.
    pub fn edge_lines(&self) -> BTreeSet<PointPair> {
        let mut lines = BTreeSet::new();
        for rule in self.rules() {
            for edge in [rule.from, rule.to] {
                if let LineEdge::Line(other) = edge {
                    lines.insert(other);
                }
            }
        }
        lines
    }
}

/// A rule resolved against the current geometry, ready to be drawn.
#[derive(Clone, Debug, PartialEq)]
pub struct RuleSpan {
    pub style: LineStyle,
    pub from_t: f64,
    pub to_t: f64,
    pub trajectory: Trajectory,
}

/// Picks the crosswalk that should cut off a rule next to a point. `hits` are crosswalks crossing
/// the line and where they cross it. Near the line's start, the smallest parameter wins; near its
/// end, the largest.
pub fn nearest_crosswalk_cut(at_start: bool, hits: &[(PointPair, f64)]) -> Option<PointPair> {
    let best = if at_start {
        hits.iter().min_by(|a, b| a.1.total_cmp(&b.1))
    } else {
        hits.iter().max_by(|a, b| a.1.total_cmp(&b.1))
    };
    best.map(|(line, _)| *line)
}
