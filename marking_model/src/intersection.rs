use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{PointPair, Trajectory};

/// Two lines, in canonical order. Identifies where they cross.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LinePair {
    pub first: PointPair,
    pub second: PointPair,
}

impl LinePair {
    pub fn new(a: PointPair, b: PointPair) -> LinePair {
        if a <= b {
            LinePair {
                first: a,
                second: b,
            }
        } else {
            LinePair {
                first: b,
                second: a,
            }
        }
    }

    pub fn contains(self, line: PointPair) -> bool {
        self.first == line || self.second == line
    }

    /// Panics if `line` isn't part of the pair.
    pub fn other(self, line: PointPair) -> PointPair {
        if self.first == line {
            self.second
        } else if self.second == line {
            self.first
        } else {
            panic!("{} isn't part of {}", line, self);
        }
    }

    /// The line both pairs go through, if any.
    pub fn shared_line(self, other: LinePair) -> Option<PointPair> {
        if other.contains(self.first) {
            Some(self.first)
        } else if other.contains(self.second) {
            Some(self.second)
        } else {
            None
        }
    }

    pub fn is_degenerate(self) -> bool {
        self.first == self.second
    }
}

impl fmt::Display for LinePair {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "crossing of [{}] and [{}]", self.first, self.second)
    }
}

/// Where two lines cross, as a parameter along each of them.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LineIntersection {
    pub pair: LinePair,
    pub first_t: f64,
    pub second_t: f64,
    pub is_intersect: bool,
}

impl LineIntersection {
    fn none(pair: LinePair) -> LineIntersection {
        LineIntersection {
            pair,
            first_t: -1.0,
            second_t: -1.0,
            is_intersect: false,
        }
    }

    /// The parameter of the crossing along `line`. Panics if `line` isn't part of the pair.
    pub fn t_for(&self, line: PointPair) -> f64 {
        if self.pair.first == line {
            self.first_t
        } else if self.pair.second == line {
            self.second_t
        } else {
            panic!("{} isn't part of {}", line, self.pair);
        }
    }
}

/// Cheap checks that settle whether two lines cross without touching their geometry. `None` means
/// the geometry has to decide.
pub fn must_intersect(
    a: PointPair,
    a_trajectory: &Trajectory,
    b: PointPair,
    b_trajectory: &Trajectory,
) -> Option<bool> {
    if a == b || a.shares_point(b) {
        return Some(false);
    }
    // Stop lines and crosswalks of one entrance run side by side
    if a_trajectory.is_straight()
        && b_trajectory.is_straight()
        && a.is_same_entrance()
        && b.is_same_entrance()
        && a.first.entrance == b.first.entrance
    {
        return Some(false);
    }
    None
}

/// Remembers every crossing computed so far, until one of the lines changes.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct IntersectionEngine {
    cache: BTreeMap<LinePair, LineIntersection>,
}

impl IntersectionEngine {
    pub fn new() -> IntersectionEngine {
        IntersectionEngine::default()
    }

    /// Uses the cached answer if there is one. When the lines cross more than once, the crossing
    /// nearest the start of the canonically first line wins.
    pub fn calculate(
        &mut self,
        a: PointPair,
        a_trajectory: &Trajectory,
        b: PointPair,
        b_trajectory: &Trajectory,
    ) -> LineIntersection {
        let pair = LinePair::new(a, b);
        if let Some(cached) = self.cache.get(&pair) {
            return *cached;
        }

        let result = if must_intersect(a, a_trajectory, b, b_trajectory) == Some(false) {
            LineIntersection::none(pair)
        } else {
            let (first, second) = if pair.first == a {
                (a_trajectory, b_trajectory)
            } else {
                (b_trajectory, a_trajectory)
            };
            match first
                .intersections(second)
                .into_iter()
                .min_by(|x, y| x.0.total_cmp(&y.0))
            {
                Some((first_t, second_t)) => LineIntersection {
                    pair,
                    first_t,
                    second_t,
                    is_intersect: true,
                },
                None => LineIntersection::none(pair),
            }
        };
        self.cache.insert(pair, result);
        result
    }

    pub fn get(&self, a: PointPair, b: PointPair) -> Option<&LineIntersection> {
        self.cache.get(&LinePair::new(a, b))
    }

    /// Forgets everything about one line.
    pub fn invalidate(&mut self, line: PointPair) {
        self.cache.retain(|pair, _| !pair.contains(line));
    }

    /// Every known crossing of one line.
    pub fn of_line(&self, line: PointPair) -> Vec<&LineIntersection> {
        self.cache
            .values()
            .filter(|i| i.is_intersect && i.pair.contains(line))
            .collect()
    }

    pub fn all(&self) -> impl Iterator<Item = &LineIntersection> {
        self.cache.values().filter(|i| i.is_intersect)
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    pub fn clear(&mut self) {
        self.cache.clear();
    }
}

#[cfg(test)]
mod tests {
    use geom::Pt2D;

    use super::*;
    use crate::{EntranceID, PointID, PointKind};

    fn line(e1: u16, e2: u16) -> PointPair {
        PointPair::new(
            PointID::new(EntranceID(e1), 1, PointKind::Enter),
            PointID::new(EntranceID(e2), 2, PointKind::Enter),
        )
    }

    #[test]
    fn symmetric_and_cached() {
        let a = line(1, 3);
        let b = line(2, 4);
        let a_traj = Trajectory::straight(Pt2D::new(0.0, 0.0), Pt2D::new(10.0, 0.0));
        let b_traj = Trajectory::straight(Pt2D::new(4.0, -7.0), Pt2D::new(4.0, 3.0));

        let mut engine = IntersectionEngine::new();
        let forwards = engine.calculate(a, &a_traj, b, &b_traj);
        assert!(forwards.is_intersect);
        assert!((forwards.t_for(a) - 0.4).abs() < 1e-9);
        assert!((forwards.t_for(b) - 0.7).abs() < 1e-9);
        assert_eq!(engine.len(), 1);

        let mut fresh = IntersectionEngine::new();
        let backwards = fresh.calculate(b, &b_traj, a, &a_traj);
        assert_eq!(forwards, backwards);

        assert_eq!(engine.of_line(a).len(), 1);
        engine.invalidate(b);
        assert!(engine.is_empty());
    }

    #[test]
    fn shared_points_never_cross() {
        let a = line(1, 3);
        let b = PointPair::new(a.first, PointID::new(EntranceID(2), 1, PointKind::Enter));
        let traj = Trajectory::straight(Pt2D::new(0.0, 0.0), Pt2D::new(10.0, 0.0));
        assert_eq!(must_intersect(a, &traj, b, &traj), Some(false));
        assert_eq!(must_intersect(a, &traj, a, &traj), Some(false));
        assert_eq!(must_intersect(a, &traj, line(2, 4), &traj), None);

        let mut engine = IntersectionEngine::new();
        assert!(!engine.calculate(a, &traj, b, &traj).is_intersect);
    }
}
