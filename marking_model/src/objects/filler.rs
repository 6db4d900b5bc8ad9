use std::collections::BTreeSet;
use std::fmt;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use geom::{Pt2D, Ring};

use crate::{FillerStyle, LinePair, Markup, PointID, PointKind, PointPair};

// Parameters this close together are the same place on a line.
const T_EPSILON: f64 = 1e-6;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FillerID(pub usize);

impl fmt::Display for FillerID {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Filler #{}", self.0)
    }
}

/// A corner of a filled region.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FillerVertex {
    Point(PointID),
    /// Where two lines cross.
    Intersect(LinePair),
}

impl fmt::Display for FillerVertex {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FillerVertex::Point(pt) => write!(f, "{}", pt),
            FillerVertex::Intersect(pair) => write!(f, "{}", pair),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContourStatus {
    Open,
    Complete,
}

/// One side of a contour, between two consecutive vertices.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum ContourEdge {
    /// Follows a stored line between two parameters.
    Along {
        line: PointPair,
        from_t: f64,
        to_t: f64,
    },
    /// Follows the junction boundary between two Enter points.
    Boundary { from: PointID, to: PointID },
}

/// The vertices of a region being outlined. The first vertex is not repeated at the end; once
/// closed, an edge joins the last vertex back to the first.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FillerContour {
    vertices: Vec<FillerVertex>,
    closed: bool,
}

impl FillerContour {
    pub fn new() -> FillerContour {
        FillerContour::default()
    }

    /// Builds a closed contour from its distinct vertices, in order.
    pub fn from_vertices(vertices: Vec<FillerVertex>) -> Result<FillerContour> {
        if vertices.len() < 3 {
            bail!("A contour needs at least 3 vertices, not {}", vertices.len());
        }
        let mut seen = BTreeSet::new();
        for v in &vertices {
            if !seen.insert(*v) {
                bail!("{} appears twice in the contour", v);
            }
            if let FillerVertex::Intersect(pair) = v {
                if pair.is_degenerate() {
                    bail!("{} is a line crossing itself", pair);
                }
            }
        }
        let first = vertices[0];
        let mut contour = FillerContour::new();
        for v in vertices {
            contour.add(v);
        }
        contour.add(first);
        Ok(contour)
    }

    /// Appends a vertex, or closes the contour when given its first vertex again. Panics if the
    /// contour is already closed, the vertex is already used, or closing would leave fewer than 3
    /// vertices.
    pub fn add(&mut self, vertex: FillerVertex) -> ContourStatus {
        if self.closed {
            panic!("Can't add {} to a closed contour", vertex);
        }
        if self.vertices.first() == Some(&vertex) {
            if self.vertices.len() < 3 {
                panic!(
                    "Can't close a contour with only {} vertices",
                    self.vertices.len()
                );
            }
            self.closed = true;
            return ContourStatus::Complete;
        }
        if self.vertices.contains(&vertex) {
            panic!("{} is already part of the contour", vertex);
        }
        if let FillerVertex::Intersect(pair) = vertex {
            if pair.is_degenerate() {
                panic!("{} is a line crossing itself", pair);
            }
        }
        self.vertices.push(vertex);
        ContourStatus::Open
    }

    /// Undoes the last `add`. Reopens a closed contour without dropping a vertex.
    pub fn remove_last(&mut self) -> Option<FillerVertex> {
        if self.closed {
            self.closed = false;
            return self.vertices.first().cloned();
        }
        self.vertices.pop()
    }

    pub fn vertices(&self) -> &Vec<FillerVertex> {
        &self.vertices
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn first(&self) -> Option<FillerVertex> {
        self.vertices.first().cloned()
    }

    pub fn last(&self) -> Option<FillerVertex> {
        self.vertices.last().cloned()
    }

    /// Every side, including the closing one once the contour is closed. Fails if two consecutive
    /// vertices aren't joined by a line or the junction boundary.
    pub fn edges(&self, markup: &Markup) -> Result<Vec<ContourEdge>> {
        let mut edges = Vec::new();
        for (a, b) in self.vertex_pairs() {
            match edge_between(markup, a, b) {
                Some(edge) => edges.push(edge),
                None => bail!("Nothing joins {} and {}", a, b),
            }
        }
        Ok(edges)
    }

    fn vertex_pairs(&self) -> Vec<(FillerVertex, FillerVertex)> {
        let mut pairs: Vec<(FillerVertex, FillerVertex)> = self
            .vertices
            .windows(2)
            .map(|pair| (pair[0], pair[1]))
            .collect();
        if self.closed {
            if let (Some(last), Some(first)) = (self.last(), self.first()) {
                pairs.push((last, first));
            }
        }
        pairs
    }

    /// The stored lines this contour depends on.
    pub fn lines(&self, markup: &Markup) -> BTreeSet<PointPair> {
        let mut lines = BTreeSet::new();
        for v in &self.vertices {
            if let FillerVertex::Intersect(pair) = v {
                lines.insert(pair.first);
                lines.insert(pair.second);
            }
        }
        for (a, b) in self.vertex_pairs() {
            if let Some(ContourEdge::Along { line, .. }) = edge_between(markup, a, b) {
                lines.insert(line);
            }
        }
        lines
    }

    pub fn points(&self) -> BTreeSet<PointID> {
        self.vertices
            .iter()
            .filter_map(|v| match v {
                FillerVertex::Point(pt) => Some(*pt),
                FillerVertex::Intersect(_) => None,
            })
            .collect()
    }

    /// The range of parameters along `line` that the contour can still reach from `t` without
    /// crossing or touching itself. Starts wide open at (-1, 2), so both endpoints are reachable.
    pub fn min_max_t(&self, markup: &Markup, line: PointPair, t: f64) -> (f64, f64) {
        let mut min: f64 = -1.0;
        let mut max: f64 = 2.0;
        for (a, b) in self.vertex_pairs() {
            let edge = match edge_between(markup, a, b) {
                Some(edge) => edge,
                None => continue,
            };
            match edge {
                ContourEdge::Along {
                    line: other,
                    from_t,
                    to_t,
                } => {
                    let (lo, hi) = (from_t.min(to_t), from_t.max(to_t));
                    if other == line {
                        if hi <= t + T_EPSILON {
                            min = min.max(hi);
                        } else if lo >= t - T_EPSILON {
                            max = max.min(lo);
                        } else {
                            // Already inside a used span; nowhere to go
                            min = t;
                            max = t;
                        }
                        continue;
                    }
                    let crossing = match markup.intersection(line, other) {
                        Some(crossing) => crossing,
                        None => continue,
                    };
                    let on_edge = crossing.t_for(other);
                    if on_edge < lo - T_EPSILON || on_edge > hi + T_EPSILON {
                        continue;
                    }
                    let x = crossing.t_for(line);
                    if x < t - T_EPSILON {
                        min = min.max(x);
                    } else if x > t + T_EPSILON {
                        max = max.min(x);
                    }
                }
                ContourEdge::Boundary { from, to } => {
                    if boundary_covers(markup, from, to, line.first) {
                        min = min.max(0.0);
                    }
                    if boundary_covers(markup, from, to, line.second) {
                        max = max.min(1.0);
                    }
                }
            }
        }
        (min, max)
    }

    /// The vertices that can come next while keeping the outline simple. Once the contour has 3
    /// vertices, its first vertex is offered whenever it's reachable, to close it.
    pub fn next_candidates(&self, markup: &Markup) -> Vec<FillerVertex> {
        if self.closed {
            return Vec::new();
        }
        let last = match self.last() {
            Some(v) => v,
            None => return all_vertices(markup),
        };
        let prev = if self.vertices.len() >= 2 {
            Some(self.vertices[self.vertices.len() - 2])
        } else {
            None
        };

        let mut offers = Offers::new(self);
        match last {
            FillerVertex::Point(pt) => {
                if pt.kind == PointKind::Enter {
                    self.offer_entrance(markup, pt, prev, &mut offers);
                }
                for line in markup.lines_through(pt) {
                    if let Some(t) = line.t_of(pt) {
                        self.offer_along(markup, line, t, &mut offers);
                    }
                }
            }
            FillerVertex::Intersect(pair) => {
                let lines = match prev.and_then(|p| edge_between(markup, p, last)) {
                    Some(ContourEdge::Along { line, .. }) if pair.contains(line) => {
                        vec![pair.other(line)]
                    }
                    _ => vec![pair.first, pair.second],
                };
                if let Some(crossing) = markup.intersection(pair.first, pair.second) {
                    for line in lines {
                        self.offer_along(markup, line, crossing.t_for(line), &mut offers);
                    }
                }
            }
        }
        offers.result
    }

    // Other points of the same entrance, and the curb neighbours.
    fn offer_entrance(
        &self,
        markup: &Markup,
        pt: PointID,
        prev: Option<FillerVertex>,
        offers: &mut Offers,
    ) {
        let entrance = match markup.entrance(pt.entrance) {
            Some(e) => e,
            None => return,
        };
        let pos = match entrance.order_position(pt) {
            Some(pos) => pos as isize,
            None => return,
        };

        let prev_on_entrance = matches!(
            prev,
            Some(FillerVertex::Point(q)) if q.entrance == pt.entrance && q.kind == PointKind::Enter
        );
        if !prev_on_entrance {
            let mut lo = -1;
            let mut hi = entrance.order().len() as isize;
            for v in &self.vertices {
                if let FillerVertex::Point(q) = v {
                    if *q == pt {
                        continue;
                    }
                    if let Some(other) = entrance.order_position(*q) {
                        let other = other as isize;
                        if other < pos {
                            lo = lo.max(other);
                        } else {
                            hi = hi.min(other);
                        }
                    }
                }
            }
            for (i, idx) in entrance.order().iter().enumerate() {
                let v = FillerVertex::Point(PointID::new(entrance.id, *idx, PointKind::Enter));
                let i = i as isize;
                offers.consider(v, lo < i && i < hi, lo <= i && i <= hi);
            }
        }

        if let Some((prev_entrance, next_entrance)) = markup.neighbours(entrance.id) {
            if entrance.first_in_order() == Some(pt) {
                if let Some(q) = next_entrance.last_in_order() {
                    offers.consider(FillerVertex::Point(q), true, true);
                }
            }
            if entrance.last_in_order() == Some(pt) {
                if let Some(q) = prev_entrance.first_in_order() {
                    offers.consider(FillerVertex::Point(q), true, true);
                }
            }
        }
    }

    // Endpoints and crossings of one line, within the reachable range.
    fn offer_along(&self, markup: &Markup, line: PointPair, t: f64, offers: &mut Offers) {
        let (min, max) = self.min_max_t(markup, line, t);
        let strict = |x: f64| x > min + T_EPSILON && x < max - T_EPSILON;
        let inclusive = |x: f64| x >= min - T_EPSILON && x <= max + T_EPSILON;
        for (pt, x) in [(line.first, 0.0), (line.second, 1.0)] {
            offers.consider(FillerVertex::Point(pt), strict(x), inclusive(x));
        }
        for crossing in markup.line_intersections(line) {
            let x = crossing.t_for(line);
            offers.consider(
                FillerVertex::Intersect(crossing.pair),
                strict(x),
                inclusive(x),
            );
        }
    }

    /// The closed outline, following every edge's actual path.
    pub fn outline(&self, markup: &Markup) -> Result<Ring> {
        if !self.closed {
            bail!("Can't outline an open contour");
        }
        let mut pts: Vec<Pt2D> = Vec::new();
        for edge in self.edges(markup)? {
            let trajectory = match edge {
                ContourEdge::Along { line, from_t, to_t } => match markup.trajectory(line) {
                    Some(t) => t.cut(from_t, to_t),
                    None => bail!("{} has no trajectory", line),
                },
                ContourEdge::Boundary { from, to } => match markup.enter_trajectory(from, to) {
                    Some(t) => t,
                    None => bail!("No boundary between {} and {}", from, to),
                },
            };
            pts.extend(trajectory.points());
        }
        Ring::closed_from(&pts)
    }
}

/// Collects candidates in the order found, without repeats. Vertices already in the contour are
/// only offered again to close it.
struct Offers {
    used: BTreeSet<FillerVertex>,
    first: Option<FillerVertex>,
    can_close: bool,
    result: Vec<FillerVertex>,
}

impl Offers {
    fn new(contour: &FillerContour) -> Offers {
        Offers {
            used: contour.vertices.iter().cloned().collect(),
            first: contour.first(),
            can_close: contour.len() >= 3,
            result: Vec::new(),
        }
    }

    fn consider(&mut self, v: FillerVertex, strictly_inside: bool, inside: bool) {
        if self.result.contains(&v) {
            return;
        }
        let ok = if Some(v) == self.first {
            self.can_close && inside
        } else {
            strictly_inside && !self.used.contains(&v)
        };
        if ok {
            self.result.push(v);
        }
    }
}

/// How two consecutive vertices are joined, if they can be.
pub fn edge_between(markup: &Markup, a: FillerVertex, b: FillerVertex) -> Option<ContourEdge> {
    match (a, b) {
        (FillerVertex::Point(p), FillerVertex::Point(q)) => {
            if p == q {
                return None;
            }
            let pair = PointPair::new(p, q);
            if pair.both(PointKind::Enter) && pair.is_same_entrance() {
                return Some(ContourEdge::Boundary { from: p, to: q });
            }
            if markup.line(pair).is_some() {
                return Some(ContourEdge::Along {
                    line: pair,
                    from_t: pair.t_of(p)?,
                    to_t: pair.t_of(q)?,
                });
            }
            if markup.is_boundary(pair) {
                return Some(ContourEdge::Boundary { from: p, to: q });
            }
            None
        }
        (FillerVertex::Point(p), FillerVertex::Intersect(pair)) => {
            let line = [pair.first, pair.second]
                .into_iter()
                .find(|l| l.contains(p))?;
            let crossing = markup.intersection(pair.first, pair.second)?;
            Some(ContourEdge::Along {
                line,
                from_t: line.t_of(p)?,
                to_t: crossing.t_for(line),
            })
        }
        (FillerVertex::Intersect(_), FillerVertex::Point(_)) => {
            match edge_between(markup, b, a)? {
                ContourEdge::Along { line, from_t, to_t } => Some(ContourEdge::Along {
                    line,
                    from_t: to_t,
                    to_t: from_t,
                }),
                ContourEdge::Boundary { .. } => None,
            }
        }
        (FillerVertex::Intersect(p1), FillerVertex::Intersect(p2)) => {
            if p1 == p2 {
                return None;
            }
            let line = p1.shared_line(p2)?;
            let x1 = markup.intersection(p1.first, p1.second)?;
            let x2 = markup.intersection(p2.first, p2.second)?;
            Some(ContourEdge::Along {
                line,
                from_t: x1.t_for(line),
                to_t: x2.t_for(line),
            })
        }
    }
}

/// Does a boundary edge run over (or end at) this Enter point?
fn boundary_covers(markup: &Markup, from: PointID, to: PointID, pt: PointID) -> bool {
    if pt.kind != PointKind::Enter {
        return false;
    }
    if pt == from || pt == to {
        return true;
    }
    if from.entrance != to.entrance || pt.entrance != from.entrance {
        return false;
    }
    let entrance = match markup.entrance(pt.entrance) {
        Some(e) => e,
        None => return false,
    };
    match (
        entrance.order_position(from),
        entrance.order_position(to),
        entrance.order_position(pt),
    ) {
        (Some(a), Some(b), Some(x)) => a.min(b) <= x && x <= a.max(b),
        _ => false,
    }
}

// Where an empty contour may start.
fn all_vertices(markup: &Markup) -> Vec<FillerVertex> {
    let mut result = Vec::new();
    let mut seen = BTreeSet::new();
    let mut push = |v: FillerVertex| {
        if seen.insert(v) {
            result.push(v);
        }
    };
    for entrance in markup.entrances() {
        for pt in entrance.points_of(PointKind::Enter) {
            push(FillerVertex::Point(pt.id));
        }
    }
    for line in markup.lines() {
        push(FillerVertex::Point(line.id.first));
        push(FillerVertex::Point(line.id.second));
    }
    for crossing in markup.all_intersections() {
        push(FillerVertex::Intersect(crossing.pair));
    }
    result
}

/// A closed region painted in one style.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Filler {
    pub id: FillerID,
    pub contour: FillerContour,
    pub style: FillerStyle,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::crossroads;
    use crate::{EntranceID, LineKind, MarkupConfig};

    fn pt(index: u8) -> FillerVertex {
        FillerVertex::Point(PointID::new(EntranceID(1), index, PointKind::Enter))
    }

    #[test]
    fn closes_on_first_vertex() {
        let mut contour = FillerContour::new();
        assert!(contour.is_empty());
        assert_eq!(contour.add(pt(1)), ContourStatus::Open);
        assert_eq!(contour.add(pt(2)), ContourStatus::Open);
        assert_eq!(contour.add(pt(3)), ContourStatus::Open);
        assert!(!contour.is_closed());
        assert_eq!(contour.add(pt(1)), ContourStatus::Complete);
        assert!(contour.is_closed());
        assert_eq!(contour.len(), 3);

        assert_eq!(contour.remove_last(), Some(pt(1)));
        assert!(!contour.is_closed());
        assert_eq!(contour.remove_last(), Some(pt(3)));
        assert_eq!(contour.len(), 2);
    }

    #[test]
    #[should_panic]
    fn too_small_to_close() {
        let mut contour = FillerContour::new();
        contour.add(pt(1));
        contour.add(pt(2));
        contour.add(pt(1));
    }

    #[test]
    #[should_panic]
    fn no_repeats() {
        let mut contour = FillerContour::new();
        contour.add(pt(1));
        contour.add(pt(2));
        contour.add(pt(2));
    }

    #[test]
    fn crossing_turns_onto_the_other_line() {
        let enter = |e: u16, i: u8| PointID::new(EntranceID(e), i, PointKind::Enter);
        let mut markup = Markup::new(&crossroads(), MarkupConfig::default());
        // East-west through the center, north-south through the center, and north-south 3m west
        let a = PointPair::new(enter(1, 2), enter(3, 2));
        let b = PointPair::new(enter(2, 2), enter(4, 2));
        let c = PointPair::new(enter(2, 1), enter(4, 3));
        for line in [a, b, c] {
            markup.add_line(line, LineKind::Regular { rules: Vec::new() });
        }
        assert!(markup.intersection(a, c).unwrap().is_intersect);

        let mut contour = FillerContour::new();
        contour.add(FillerVertex::Point(enter(1, 2)));
        contour.add(FillerVertex::Intersect(LinePair::new(a, b)));
        let next = markup.filler_candidates(&contour);
        assert!(next.contains(&FillerVertex::Point(enter(2, 2))));
        assert!(next.contains(&FillerVertex::Point(enter(4, 2))));
        // Nothing further along the line the contour arrived on
        assert!(!next.contains(&FillerVertex::Point(enter(3, 2))));
        assert!(!next.contains(&FillerVertex::Intersect(LinePair::new(a, c))));
    }

    #[test]
    fn from_vertices_validates() {
        let contour = FillerContour::from_vertices(vec![pt(1), pt(2), pt(3)]).unwrap();
        assert!(contour.is_closed());
        assert!(FillerContour::from_vertices(vec![pt(1), pt(2)]).is_err());
        assert!(FillerContour::from_vertices(vec![pt(1), pt(2), pt(1)]).is_err());
    }
}
