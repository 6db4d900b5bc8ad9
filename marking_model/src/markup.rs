use std::collections::{BTreeMap, BTreeSet};

use anyhow::Result;

use abstutil::wraparound_get;
use geom::{Distance, Pt2D, Ring};

use crate::deps::{DependencyGraph, Node};
use crate::host::{ContourCurve, JunctionInput};
use crate::{
    nearest_crosswalk_cut, Entrance, EntranceID, EntranceUpdate, Filler, FillerContour, FillerID,
    FillerStyle, FillerVertex, IntersectionEngine, LineEdge, LineIntersection, LineKind,
    LineRule, LineStyle, MarkingLine, MarkingPoint, MarkupConfig, PointGeometry, PointID,
    PointKind, PointPair, RuleSpan, Trajectory, TrajectoryEnd,
};

/// All the markings of one junction, along with everything derived from them. Every mutation
/// recalculates whatever it made stale before returning.
pub struct Markup {
    config: MarkupConfig,
    /// Counterclockwise around the junction, like the host lists them.
    entrances: Vec<Entrance>,
    contour: Vec<ContourCurve>,
    lines: BTreeMap<PointPair, MarkingLine>,
    fillers: BTreeMap<FillerID, Filler>,
    next_filler: usize,

    point_geometry: BTreeMap<PointID, PointGeometry>,
    trajectories: BTreeMap<PointPair, Trajectory>,
    intersections: IntersectionEngine,
    outlines: BTreeMap<FillerID, Ring>,
    deps: DependencyGraph,
}

impl Markup {
    pub fn new(junction: &JunctionInput, config: MarkupConfig) -> Markup {
        let mut markup = Markup {
            config,
            entrances: junction.connections.iter().map(Entrance::new).collect(),
            contour: junction.contour.clone(),
            lines: BTreeMap::new(),
            fillers: BTreeMap::new(),
            next_filler: 0,
            point_geometry: BTreeMap::new(),
            trajectories: BTreeMap::new(),
            intersections: IntersectionEngine::new(),
            outlines: BTreeMap::new(),
            deps: DependencyGraph::new(),
        };
        let ids: Vec<_> = markup.entrances.iter().map(|e| e.id).collect();
        for id in ids {
            markup.wire_entrance(id);
            markup.deps.mark_dirty(Node::Entrance(id));
        }
        markup.recalculate();
        markup
    }

    fn wire_entrance(&mut self, id: EntranceID) {
        let mut edges = Vec::new();
        if let Some(entrance) = self.entrance(id) {
            for pt in entrance.all_points() {
                edges.push((Node::Entrance(id), Node::point(pt.id)));
                for src in pt.sources() {
                    edges.push((Node::point(src), Node::point(pt.id)));
                }
            }
        }
        for (upstream, downstream) in edges {
            self.deps.add_edge(upstream, downstream);
        }
    }

    fn unwire_points(&mut self, points: Vec<PointID>) {
        for pt in points {
            self.deps.remove_node(Node::point(pt));
            self.point_geometry.remove(&pt);
        }
    }

    fn wire_line(&mut self, id: PointPair) {
        self.deps.add_edge(Node::point(id.first), Node::Line(id));
        self.deps.add_edge(Node::point(id.second), Node::Line(id));
    }

    fn wire_filler(&mut self, id: FillerID, contour: &FillerContour) {
        for pt in contour.points() {
            self.deps.add_edge(Node::point(pt), Node::Filler(id));
        }
        for line in contour.lines(self) {
            self.deps.add_edge(Node::Line(line), Node::Filler(id));
        }
    }

    /// Refreshes everything from new road data. Entrances whose lane layout survived keep their
    /// point offsets; lines and fillers that lost a point are dropped.
    pub fn update_junction(&mut self, junction: &JunctionInput) {
        let mut old: BTreeMap<_, Entrance> = std::mem::take(&mut self.entrances)
            .into_iter()
            .map(|e| (e.id, e))
            .collect();
        let mut rewire = Vec::new();
        let mut rebuilt = 0;
        for conn in &junction.connections {
            match old.remove(&conn.id) {
                Some(mut entrance) => {
                    let old_points: Vec<PointID> = entrance.all_points().map(|p| p.id).collect();
                    if entrance.update(conn) == EntranceUpdate::Topology {
                        rebuilt += 1;
                        self.unwire_points(old_points);
                        rewire.push(conn.id);
                    }
                    self.entrances.push(entrance);
                }
                None => {
                    self.entrances.push(Entrance::new(conn));
                    rewire.push(conn.id);
                }
            }
        }
        for (id, entrance) in old {
            self.unwire_points(entrance.all_points().map(|p| p.id).collect());
            self.deps.remove_node(Node::Entrance(id));
        }
        for id in rewire {
            self.wire_entrance(id);
        }
        self.contour = junction.contour.clone();

        let lost_lines: Vec<PointPair> = self
            .lines
            .keys()
            .filter(|id| self.point(id.first).is_none() || self.point(id.second).is_none())
            .cloned()
            .collect();
        for id in &lost_lines {
            self.remove_line_inner(*id);
        }
        let lost_fillers: Vec<FillerID> = self
            .fillers
            .values()
            .filter(|f| f.contour.points().into_iter().any(|pt| self.point(pt).is_none()))
            .map(|f| f.id)
            .collect();
        for id in &lost_fillers {
            self.remove_filler_inner(*id);
        }

        // Point nodes may have been replaced, so wire everything downstream again
        let line_ids: Vec<PointPair> = self.lines.keys().cloned().collect();
        for id in line_ids {
            self.wire_line(id);
        }
        let fillers: Vec<(FillerID, FillerContour)> = self
            .fillers
            .values()
            .map(|f| (f.id, f.contour.clone()))
            .collect();
        for (id, contour) in fillers {
            self.wire_filler(id, &contour);
        }

        // The contour moved too, which Normal points depend on
        let ids: Vec<_> = self.entrances.iter().map(|e| e.id).collect();
        for id in ids {
            self.deps.mark_dirty(Node::Entrance(id));
        }
        info!(
            "Updated junction: {} entrances rebuilt, {} lines and {} fillers dropped",
            rebuilt,
            lost_lines.len(),
            lost_fillers.len()
        );
        self.recalculate();
    }

    /// Returns true if this changed the left-to-right order of the entrance's points. Panics if
    /// the point doesn't exist.
    pub fn set_point_offset(&mut self, id: PointID, offset: Distance) -> bool {
        let reordered = match self.entrances.iter_mut().find(|e| e.id == id.entrance) {
            Some(entrance) => entrance.set_offset(id, offset),
            None => panic!("No entrance for {}", id),
        };
        if reordered {
            debug!("Points of {} changed order", id.entrance);
        }
        self.deps.mark_dirty(Node::point(id));
        self.recalculate();
        reordered
    }

    /// Returns false if the line already exists. Panics if either point is missing or the kind
    /// can't join them. Regular lines given no rules get one spanning the whole line.
    pub fn add_line(&mut self, id: PointPair, kind: LineKind) -> bool {
        if self.lines.contains_key(&id) {
            return false;
        }
        for pt in [id.first, id.second] {
            if self.point(pt).is_none() {
                panic!("Can't add {}; {} doesn't exist", id, pt);
            }
        }
        let line = MarkingLine::new(id, kind);
        self.insert_line(line);
        self.recalculate();
        self.ensure_default_rule(id);
        true
    }

    pub(crate) fn insert_line(&mut self, line: MarkingLine) {
        let id = line.id;
        self.lines.insert(id, line);
        self.wire_line(id);
        self.deps.mark_dirty(Node::Line(id));
    }

    pub(crate) fn ensure_default_rule(&mut self, id: PointPair) {
        let empty = self
            .lines
            .get(&id)
            .map(|l| l.is_regular() && l.rules().is_empty())
            .unwrap_or(false);
        if empty {
            let rule = self.default_rule(id, LineStyle::default());
            self.push_rule(id, rule);
        }
    }

    /// Also drops fillers outlined along the line and resets rule edges cut by it.
    pub fn remove_line(&mut self, id: PointPair) -> Option<MarkingLine> {
        let line = self.remove_line_inner(id)?;
        self.recalculate();
        Some(line)
    }

    fn remove_line_inner(&mut self, id: PointPair) -> Option<MarkingLine> {
        let line = self.lines.remove(&id)?;
        let fillers: Vec<FillerID> = self
            .deps
            .dependents_of(Node::Line(id))
            .iter()
            .filter_map(|node| match node {
                Node::Filler(f) => Some(*f),
                _ => None,
            })
            .collect();
        for filler in fillers {
            self.remove_filler_inner(filler);
        }
        self.deps.remove_node(Node::Line(id));
        self.trajectories.remove(&id);
        self.intersections.invalidate(id);

        let cut_by: Vec<PointPair> = self
            .lines
            .values()
            .filter(|l| l.edge_lines().contains(&id))
            .map(|l| l.id)
            .collect();
        for other in cut_by {
            let start = self.default_edge(other, true);
            let end = self.default_edge(other, false);
            if let Some(rules) = self.lines.get_mut(&other).and_then(|l| l.rules_mut()) {
                for rule in rules.iter_mut() {
                    if rule.from == LineEdge::Line(id) {
                        rule.from = start;
                    }
                    if rule.to == LineEdge::Line(id) {
                        rule.to = end;
                    }
                }
            }
            self.sort_rules(other);
        }
        Some(line)
    }

    /// Adds a rule bounded by the default edges at both ends. Panics if the line isn't regular.
    pub fn add_rule(&mut self, line: PointPair, style: LineStyle) {
        let rule = self.default_rule(line, style);
        self.push_rule(line, rule);
    }

    /// Adds a rule between explicit edges. Fails if either edge doesn't lie on the line.
    pub fn add_rule_between(
        &mut self,
        line: PointPair,
        from: LineEdge,
        to: LineEdge,
        style: LineStyle,
    ) -> Result<()> {
        for edge in [from, to] {
            if self.edge_t(line, edge).is_none() {
                bail!("{:?} doesn't bound anything on {}", edge, line);
            }
        }
        self.push_rule(line, LineRule { from, to, style });
        Ok(())
    }

    /// Removing the last rule of a regular line restores the default one.
    pub fn remove_rule(&mut self, line: PointPair, index: usize) -> Option<LineRule> {
        let rules = self.lines.get_mut(&line)?.rules_mut()?;
        if index >= rules.len() {
            return None;
        }
        let rule = rules.remove(index);
        self.ensure_default_rule(line);
        Some(rule)
    }

    fn default_rule(&self, line: PointPair, style: LineStyle) -> LineRule {
        LineRule {
            from: self.default_edge(line, true),
            to: self.default_edge(line, false),
            style,
        }
    }

    fn push_rule(&mut self, line: PointPair, rule: LineRule) {
        match self.lines.get_mut(&line).and_then(|l| l.rules_mut()) {
            Some(rules) => rules.push(rule),
            None => panic!("{} doesn't take rules", line),
        }
        self.sort_rules(line);
    }

    /// A rule normally runs to the line's own point. With crosswalk cutting on, a rule ending at an
    /// Enter point stops at the nearest crosswalk of that entrance instead.
    pub fn default_edge(&self, line: PointPair, at_start: bool) -> LineEdge {
        let pt = if at_start { line.first } else { line.second };
        if self.config.cut_by_crosswalk && pt.kind == PointKind::Enter {
            let hits: Vec<(PointPair, f64)> = self
                .lines
                .values()
                .filter(|l| l.is_crosswalk() && l.id.first.entrance == pt.entrance)
                .filter_map(|l| {
                    self.intersection(line, l.id)
                        .map(|crossing| (l.id, crossing.t_for(line)))
                })
                .collect();
            if let Some(crosswalk) = nearest_crosswalk_cut(at_start, &hits) {
                return LineEdge::Line(crosswalk);
            }
        }
        LineEdge::Point(pt)
    }

    /// Where an edge sits along a line, if it currently does.
    pub fn edge_t(&self, line: PointPair, edge: LineEdge) -> Option<f64> {
        match edge {
            LineEdge::Point(pt) => line.t_of(pt),
            LineEdge::Line(other) => self
                .intersection(line, other)
                .map(|crossing| crossing.t_for(line)),
        }
    }

    fn sort_rules(&mut self, line: PointPair) {
        let keys: Vec<f64> = self
            .lines
            .get(&line)
            .map(|l| {
                l.rules()
                    .iter()
                    .map(|r| {
                        let a = self.edge_t(line, r.from).unwrap_or(0.0);
                        let b = self.edge_t(line, r.to).unwrap_or(0.0);
                        a.min(b)
                    })
                    .collect()
            })
            .unwrap_or_default();
        if let Some(rules) = self.lines.get_mut(&line).and_then(|l| l.rules_mut()) {
            let mut keyed: Vec<(f64, LineRule)> = keys.into_iter().zip(rules.drain(..)).collect();
            keyed.sort_by(|a, b| a.0.total_cmp(&b.0));
            rules.extend(keyed.into_iter().map(|(_, r)| r));
        }
    }

    /// Each rule of a line cut to its current span, in order along the line. Rules whose edge no
    /// longer crosses the line are skipped.
    pub fn rule_spans(&self, line: PointPair) -> Vec<RuleSpan> {
        let (marking, trajectory) = match (self.lines.get(&line), self.trajectories.get(&line)) {
            (Some(m), Some(t)) => (m, t),
            _ => return Vec::new(),
        };
        let mut spans = Vec::new();
        for rule in marking.rules() {
            match (self.edge_t(line, rule.from), self.edge_t(line, rule.to)) {
                (Some(from_t), Some(to_t)) => spans.push(RuleSpan {
                    style: rule.style.clone(),
                    from_t,
                    to_t,
                    trajectory: trajectory.cut(from_t, to_t),
                }),
                _ => debug!("A rule on {} lost one of its edges", line),
            }
        }
        spans
    }

    /// The band a lane line follows, between the Enter points on either side of the lane at both
    /// ends.
    pub fn lane_corridor(&self, line: PointPair) -> Option<Ring> {
        if !matches!(self.lines.get(&line)?.kind, LineKind::Lane { .. }) {
            return None;
        }
        let edges = |pt: PointID| -> Option<(TrajectoryEnd, TrajectoryEnd)> {
            let sources = self.point(pt)?.sources();
            Some((
                self.trajectory_end(*sources.first()?)?,
                self.trajectory_end(*sources.last()?)?,
            ))
        };
        let (a_left, a_right) = edges(line.first)?;
        let (b_left, b_right) = edges(line.second)?;
        // Looking out of each entrance, the left edge of one continues into the right edge of
        // the other.
        let side1 = Trajectory::build(&a_left, &b_right, &self.config);
        let side2 = Trajectory::build(&a_right, &b_left, &self.config);
        let mut pts = side1.points();
        pts.extend(side2.reversed().points());
        match Ring::closed_from(&pts) {
            Ok(ring) => Some(ring),
            Err(err) => {
                warn!("Corridor of {} is degenerate: {}", line, err);
                None
            }
        }
    }

    /// The contour must be closed, with every edge following a line or the junction boundary.
    pub fn add_filler(&mut self, contour: FillerContour, style: FillerStyle) -> Result<FillerID> {
        if !contour.is_closed() {
            bail!("Can't fill an open contour");
        }
        contour.outline(self)?;
        let id = FillerID(self.next_filler);
        self.next_filler += 1;
        self.wire_filler(id, &contour);
        self.fillers.insert(id, Filler { id, contour, style });
        self.deps.mark_dirty(Node::Filler(id));
        self.recalculate();
        Ok(id)
    }

    pub fn remove_filler(&mut self, id: FillerID) -> Option<Filler> {
        self.remove_filler_inner(id)
    }

    fn remove_filler_inner(&mut self, id: FillerID) -> Option<Filler> {
        self.deps.remove_node(Node::Filler(id));
        self.outlines.remove(&id);
        self.fillers.remove(&id)
    }

    /// What can be added next to a contour under construction.
    pub fn filler_candidates(&self, contour: &FillerContour) -> Vec<FillerVertex> {
        contour.next_candidates(self)
    }

    pub fn filler_outline(&self, id: FillerID) -> Option<&Ring> {
        self.outlines.get(&id)
    }

    /// Removes every line and filler. Entrances and point offsets stay.
    pub fn clear(&mut self) {
        let fillers: Vec<FillerID> = self.fillers.keys().cloned().collect();
        for id in fillers {
            self.remove_filler_inner(id);
        }
        let lines: Vec<PointPair> = self.lines.keys().cloned().collect();
        for id in lines {
            self.deps.remove_node(Node::Line(id));
        }
        self.lines.clear();
        self.trajectories.clear();
        self.intersections.clear();
    }

    /// Brings every stale point, line and filler up to date, in dependency order.
    pub fn recalculate(&mut self) {
        let dirty = self.deps.take_dirty();
        if dirty.is_empty() {
            return;
        }

        let mut num_points = 0;
        let mut lines = Vec::new();
        let mut fillers = Vec::new();
        for node in &dirty {
            match node {
                Node::Entrance(_) => {}
                Node::EnterPoint(id) | Node::DerivedPoint(id) => {
                    num_points += 1;
                    let geometry = self
                        .entrance(id.entrance)
                        .and_then(|e| e.point_geometry(*id, &self.contour, &self.config));
                    match geometry {
                        Some(g) => {
                            self.point_geometry.insert(*id, g);
                        }
                        None => {
                            self.point_geometry.remove(id);
                        }
                    }
                }
                Node::Line(id) => lines.push(*id),
                Node::Filler(id) => fillers.push(*id),
            }
        }

        for id in &lines {
            match self.lines.get(id).and_then(|l| self.build_trajectory(l)) {
                Some(t) => {
                    self.trajectories.insert(*id, t);
                }
                None => {
                    warn!("{} has no trajectory; one of its points is missing", id);
                    self.trajectories.remove(id);
                }
            }
            self.intersections.invalidate(*id);
        }
        let all_lines: Vec<PointPair> = self.trajectories.keys().cloned().collect();
        for id in &lines {
            let a = match self.trajectories.get(id) {
                Some(a) => a,
                None => continue,
            };
            for other in &all_lines {
                if other == id {
                    continue;
                }
                if let Some(b) = self.trajectories.get(other) {
                    self.intersections.calculate(*id, a, *other, b);
                }
            }
        }

        let changed: BTreeSet<PointPair> = lines.iter().cloned().collect();
        let cut = self.apply_crosswalk_cuts(&changed);
        let resort: Vec<PointPair> = self
            .lines
            .values()
            .filter(|l| {
                changed.contains(&l.id)
                    || cut.contains(&l.id)
                    || l.edge_lines().iter().any(|e| changed.contains(e))
            })
            .map(|l| l.id)
            .collect();
        for id in resort {
            self.sort_rules(id);
        }

        for id in &fillers {
            let outline = self.fillers.get(id).map(|f| f.contour.outline(self));
            match outline {
                Some(Ok(ring)) => {
                    self.outlines.insert(*id, ring);
                }
                Some(Err(err)) => {
                    warn!("{} can't be outlined anymore: {}", id, err);
                    self.outlines.remove(id);
                }
                None => {
                    self.outlines.remove(id);
                }
            }
        }

        debug!(
            "Recalculated {} points, {} lines, {} fillers",
            num_points,
            lines.len(),
            fillers.len()
        );
    }

    // Rules that run to an Enter point stop at a crosswalk of that entrance instead, even when the
    // crosswalk appears after the rule. Returns the lines whose rules changed.
    fn apply_crosswalk_cuts(&mut self, changed: &BTreeSet<PointPair>) -> BTreeSet<PointPair> {
        let mut touched = BTreeSet::new();
        if !self.config.cut_by_crosswalk {
            return touched;
        }
        let mut candidates: BTreeSet<PointPair> = BTreeSet::new();
        for id in changed {
            match self.lines.get(id) {
                Some(line) if line.is_crosswalk() => {
                    for crossing in self.intersections.of_line(*id) {
                        candidates.insert(crossing.pair.other(*id));
                    }
                }
                Some(line) if line.is_regular() => {
                    candidates.insert(*id);
                }
                _ => {}
            }
        }

        for id in candidates {
            let (start, end) = (self.default_edge(id, true), self.default_edge(id, false));
            let rules = match self.lines.get_mut(&id).and_then(|l| l.rules_mut()) {
                Some(rules) => rules,
                None => continue,
            };
            for rule in rules.iter_mut() {
                for edge in [&mut rule.from, &mut rule.to] {
                    let replacement = match *edge {
                        LineEdge::Point(pt) if pt == id.first => start,
                        LineEdge::Point(pt) if pt == id.second => end,
                        _ => continue,
                    };
                    if *edge != replacement {
                        *edge = replacement;
                        touched.insert(id);
                    }
                }
            }
        }
        touched
    }

    fn build_trajectory(&self, line: &MarkingLine) -> Option<Trajectory> {
        let a = self.trajectory_end(line.id.first)?;
        let b = self.trajectory_end(line.id.second)?;
        match line.kind {
            LineKind::Stop { .. } | LineKind::Crosswalk { .. } => Some(Trajectory::straight(
                a.geometry.position,
                b.geometry.position,
            )),
            _ => Some(Trajectory::build(&a, &b, &self.config)),
        }
    }

    fn trajectory_end(&self, pt: PointID) -> Option<TrajectoryEnd> {
        let geometry = self.point_geometry(pt)?;
        let corner_dir = match pt.kind {
            PointKind::Enter | PointKind::Crosswalk => {
                Some(self.entrance(pt.entrance)?.frame.corner_dir)
            }
            PointKind::Normal | PointKind::Lane => None,
        };
        Some(TrajectoryEnd {
            geometry,
            smooth: matches!(pt.kind, PointKind::Enter | PointKind::Lane),
            corner_dir,
        })
    }

    /// The implicit boundary line between two Enter points, oriented from `from` to `to`. Straight
    /// along an entrance edge, curved along the curb between neighbouring entrances.
    pub fn enter_trajectory(&self, from: PointID, to: PointID) -> Option<Trajectory> {
        if from == to || !self.is_boundary(PointPair::new(from, to)) {
            return None;
        }
        let a = self.trajectory_end(from)?;
        let b = self.trajectory_end(to)?;
        if from.entrance == to.entrance {
            Some(Trajectory::straight(a.geometry.position, b.geometry.position))
        } else {
            Some(Trajectory::build(&a, &b, &self.config))
        }
    }

    /// Is this pair an implicit boundary line: two Enter points of one entrance, or the points on
    /// either side of the curb between neighbouring entrances?
    pub fn is_boundary(&self, pair: PointPair) -> bool {
        if !pair.both(PointKind::Enter)
            || self.point(pair.first).is_none()
            || self.point(pair.second).is_none()
        {
            return false;
        }
        if pair.is_same_entrance() {
            return true;
        }
        let curb = |p: PointID, q: PointID| {
            let entrance = match self.entrance(p.entrance) {
                Some(e) => e,
                None => return false,
            };
            match self.neighbours(p.entrance) {
                Some((_, next)) => {
                    entrance.first_in_order() == Some(p)
                        && next.id == q.entrance
                        && next.last_in_order() == Some(q)
                }
                None => false,
            }
        };
        curb(pair.first, pair.second) || curb(pair.second, pair.first)
    }

    pub fn config(&self) -> &MarkupConfig {
        &self.config
    }

    pub fn contour(&self) -> &Vec<ContourCurve> {
        &self.contour
    }

    pub fn entrances(&self) -> &Vec<Entrance> {
        &self.entrances
    }

    pub fn entrance(&self, id: EntranceID) -> Option<&Entrance> {
        self.entrances.iter().find(|e| e.id == id)
    }

    /// The entrances before and after this one, counterclockwise.
    pub fn neighbours(&self, id: EntranceID) -> Option<(&Entrance, &Entrance)> {
        if self.entrances.len() < 2 {
            return None;
        }
        let idx = self.entrances.iter().position(|e| e.id == id)? as isize;
        Some((
            wraparound_get(&self.entrances, idx - 1),
            wraparound_get(&self.entrances, idx + 1),
        ))
    }

    pub fn point(&self, id: PointID) -> Option<&MarkingPoint> {
        self.entrance(id.entrance)?.point(id)
    }

    pub fn point_geometry(&self, id: PointID) -> Option<PointGeometry> {
        self.point_geometry.get(&id).cloned()
    }

    pub fn lines(&self) -> impl Iterator<Item = &MarkingLine> {
        self.lines.values()
    }

    pub fn line(&self, id: PointPair) -> Option<&MarkingLine> {
        self.lines.get(&id)
    }

    /// Stored lines ending at this point.
    pub fn lines_through(&self, pt: PointID) -> Vec<PointPair> {
        self.lines.keys().filter(|l| l.contains(pt)).cloned().collect()
    }

    pub fn trajectory(&self, line: PointPair) -> Option<&Trajectory> {
        self.trajectories.get(&line)
    }

    pub fn fillers(&self) -> impl Iterator<Item = &Filler> {
        self.fillers.values()
    }

    pub fn filler(&self, id: FillerID) -> Option<&Filler> {
        self.fillers.get(&id)
    }

    /// Where two stored lines cross, if they do.
    pub fn intersection(&self, a: PointPair, b: PointPair) -> Option<&LineIntersection> {
        self.intersections.get(a, b).filter(|i| i.is_intersect)
    }

    pub fn line_intersections(&self, line: PointPair) -> Vec<&LineIntersection> {
        self.intersections.of_line(line)
    }

    pub fn all_intersections(&self) -> impl Iterator<Item = &LineIntersection> {
        self.intersections.all()
    }

    pub fn vertex_position(&self, vertex: FillerVertex) -> Option<Pt2D> {
        match vertex {
            FillerVertex::Point(pt) => self.point_geometry(pt).map(|g| g.position),
            FillerVertex::Intersect(pair) => {
                let crossing = self.intersection(pair.first, pair.second)?;
                Some(self.trajectory(pair.first)?.position(crossing.first_t))
            }
        }
    }
}
