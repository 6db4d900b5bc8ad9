use std::collections::BTreeSet;

use abstutil::MultiMap;

use crate::{EntranceID, FillerID, PointID, PointPair};

/// Anything whose derived geometry can go stale. The variant order is a topological order: nothing
/// depends on something that sorts after it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Node {
    Entrance(EntranceID),
    EnterPoint(PointID),
    /// Crosswalk, Normal and Lane points, which follow Enter points.
    DerivedPoint(PointID),
    Line(PointPair),
    Filler(FillerID),
}

impl Node {
    pub fn point(id: PointID) -> Node {
        if id.kind == crate::PointKind::Enter {
            Node::EnterPoint(id)
        } else {
            Node::DerivedPoint(id)
        }
    }
}

/// Who has to be recalculated when something changes.
#[derive(Clone, Debug, Default)]
pub struct DependencyGraph {
    dependents: MultiMap<Node, Node>,
    dirty: BTreeSet<Node>,
}

impl DependencyGraph {
    pub fn new() -> DependencyGraph {
        DependencyGraph::default()
    }

    /// `downstream` is derived from `upstream`.
    pub fn add_edge(&mut self, upstream: Node, downstream: Node) {
        assert!(
            upstream < downstream,
            "{:?} can't depend on {:?}",
            downstream,
            upstream
        );
        self.dependents.insert(upstream, downstream);
    }

    /// Forgets a node and every edge touching it.
    pub fn remove_node(&mut self, node: Node) {
        self.dependents.remove_key(&node);
        let upstreams: Vec<Node> = self
            .dependents
            .keys()
            .filter(|k| self.dependents.get(**k).contains(&node))
            .cloned()
            .collect();
        for upstream in upstreams {
            self.dependents.remove(upstream, node);
        }
        self.dirty.remove(&node);
    }

    pub fn dependents_of(&self, node: Node) -> &BTreeSet<Node> {
        self.dependents.get(node)
    }

    /// Marks the node and everything derived from it, transitively.
    pub fn mark_dirty(&mut self, node: Node) {
        let mut queue = vec![node];
        while let Some(current) = queue.pop() {
            if self.dirty.insert(current) {
                queue.extend(self.dependents.get(current).iter().cloned());
            }
        }
    }

    pub fn is_dirty(&self, node: Node) -> bool {
        self.dirty.contains(&node)
    }

    /// Everything stale, in an order safe to recalculate in.
    pub fn take_dirty(&mut self) -> BTreeSet<Node> {
        std::mem::take(&mut self.dirty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PointKind;

    #[test]
    fn dirty_marks_propagate_in_order() {
        let entrance = EntranceID(1);
        let enter = PointID::new(entrance, 1, PointKind::Enter);
        let normal = PointID::new(entrance, 1, PointKind::Normal);
        let line = PointPair::new(enter, PointID::new(EntranceID(2), 1, PointKind::Enter));
        let filler = FillerID(0);

        let mut graph = DependencyGraph::new();
        graph.add_edge(Node::Entrance(entrance), Node::point(enter));
        graph.add_edge(Node::point(enter), Node::point(normal));
        graph.add_edge(Node::point(enter), Node::Line(line));
        graph.add_edge(Node::Line(line), Node::Filler(filler));

        graph.mark_dirty(Node::point(enter));
        assert!(!graph.is_dirty(Node::Entrance(entrance)));
        let dirty: Vec<Node> = graph.take_dirty().into_iter().collect();
        assert_eq!(
            dirty,
            vec![
                Node::EnterPoint(enter),
                Node::DerivedPoint(normal),
                Node::Line(line),
                Node::Filler(filler)
            ]
        );

        graph.remove_node(Node::Line(line));
        graph.mark_dirty(Node::Entrance(entrance));
        assert!(!graph.is_dirty(Node::Filler(filler)));
        assert!(graph.dependents_of(Node::point(enter)).contains(&Node::point(normal)));
    }
}
