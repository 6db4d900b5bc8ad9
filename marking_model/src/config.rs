use anyhow::Result;
use serde::{Deserialize, Serialize};

use geom::Distance;

/// Tunable policy for how markings are derived. Any field missing from a JSON file falls back to
/// its default.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkupConfig {
    /// New rules on regular lines stop at a crossing crosswalk of the same entrance, instead of
    /// running all the way to the entrance edge.
    pub cut_by_crosswalk: bool,
    /// How far crosswalk points sit inside the junction, measured from the entrance edge.
    pub crosswalk_shift: Distance,
    /// Through lines whose ends are shifted sideways by more than this fraction of their length
    /// bend around the midpoint instead of forming one long S-curve.
    pub median_ratio: f64,
    /// Lines whose chord deviates from both end directions by less than this are straight.
    pub straight_tolerance_degrees: f64,
}

impl Default for MarkupConfig {
    fn default() -> MarkupConfig {
        MarkupConfig {
            cut_by_crosswalk: true,
            crosswalk_shift: Distance::const_meters(0.5),
            median_ratio: 0.1,
            straight_tolerance_degrees: 5.0,
        }
    }
}

impl MarkupConfig {
    pub fn load(path: &str) -> Result<MarkupConfig> {
        abstutil::read_json(path)
    }
}
