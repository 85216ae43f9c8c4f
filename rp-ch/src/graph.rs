//! Array-indexed directed multigraph that the contraction mutates in place.
//!
//! The graph is backed by a [`petgraph::Graph`]. Nothing is ever deleted from it: contracted
//! vertices are flagged `processed` and superseded edges are flagged `removed`, so every id handed
//! out stays valid for the whole run (simulation results and the path combiner rely on that).
use anyhow::Result;
use itertools::Itertools;
use petgraph::dot::Dot;
use petgraph::graph::{
    EdgeIndex,
    NodeIndex,
};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use tracing::instrument;

use crate::errors::ContractionError;
use crate::model::{
    Edge,
    EdgeId,
    RawGraph,
    Vertex,
    VertexId,
    Weight,
};

/// The mutable routing graph.
#[derive(Clone, Debug, Default)]
pub struct Graph {
    /// Vertex and edge payloads; petgraph indices double as our dense ids.
    inner: petgraph::Graph<Vertex, Edge>,
}

impl Graph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a graph from extraction output, rejecting dangling ids and negative weights.
    #[instrument(skip(raw), fields(vertices = raw.vertices.len(), edges = raw.edges.len()))]
    pub fn from_raw(raw: &RawGraph) -> Result<Self> {
        let mut graph = Self {
            inner: petgraph::Graph::with_capacity(raw.vertices.len(), raw.edges.len()),
        };
        for vertex in &raw.vertices {
            graph.add_vertex(vertex.lat, vertex.lon);
        }
        for (id, edge) in raw.edges.iter().enumerate() {
            let weight = Weight::try_from(edge.weight).map_err(|_| {
                ContractionError::graph_consistency(format!("edge {id} has negative weight {}", edge.weight))
            })?;
            graph.add_edge(edge.source, edge.target, weight, edge.bidirectional)?;
        }
        Ok(graph)
    }

    /// Appends a vertex and returns its id.
    pub fn add_vertex(&mut self, lat: f64, lon: f64) -> VertexId {
        let id = self.inner.node_count();
        self.inner.add_node(Vertex::new(id, lat, lon)).index()
    }

    /// Appends an input edge and returns its id.
    pub fn add_edge(&mut self, source: VertexId, target: VertexId, weight: Weight, bidirectional: bool) -> Result<EdgeId> {
        self.push_edge(source, target, weight, 1, None, bidirectional)
    }

    /// Appends a shortcut bypassing `represented_pair` and returns its id.
    pub fn add_shortcut_edge(
        &mut self,
        source: VertexId,
        target: VertexId,
        weight: Weight,
        original_edge_count: u32,
        represented_pair: (EdgeId, EdgeId),
        bidirectional: bool,
    ) -> Result<EdgeId> {
        let (first, second) = represented_pair;
        self.check_edge(first)?;
        self.check_edge(second)?;
        self.push_edge(source, target, weight, original_edge_count, Some(represented_pair), bidirectional)
    }

    /// Appends an edge after checking its endpoints and original-edge count.
    fn push_edge(
        &mut self,
        source: VertexId,
        target: VertexId,
        weight: Weight,
        original_edge_count: u32,
        represented_pair: Option<(EdgeId, EdgeId)>,
        bidirectional: bool,
    ) -> Result<EdgeId> {
        let id = self.inner.edge_count();
        self.check_vertex(source)
            .and_then(|()| self.check_vertex(target))
            .map_err(|err| ContractionError::graph_consistency(format!("edge {id}: {err}")))?;
        if original_edge_count == 0 {
            return Err(ContractionError::graph_consistency(format!("edge {id} represents no input edge")));
        }

        let edge = Edge {
            id,
            source,
            target,
            weight,
            original_edge_count,
            bidirectional,
            represented_pair,
            removed: false,
        };
        Ok(self.inner.add_edge(NodeIndex::new(source), NodeIndex::new(target), edge).index())
    }

    /// Flags an edge as deleted. Removing an edge twice is a bug in the caller.
    pub fn mark_edge_removed(&mut self, edge: EdgeId) -> Result<()> {
        self.check_edge(edge)?;
        let data = &mut self.inner[EdgeIndex::new(edge)];
        if data.removed {
            return Err(ContractionError::invariant_violation(format!("edge {edge} removed twice")));
        }
        data.removed = true;
        Ok(())
    }

    /// Flags a vertex as contracted in `round`. Processing a vertex twice is a bug in the caller.
    pub fn mark_processed(&mut self, vertex: VertexId, round: usize) -> Result<()> {
        self.check_vertex(vertex)?;
        let data = &mut self.inner[NodeIndex::new(vertex)];
        if data.processed {
            return Err(ContractionError::invariant_violation(format!("vertex {vertex} processed twice")));
        }
        data.processed = true;
        data.round = Some(round);
        Ok(())
    }

    /// Sets the contraction priority of a vertex.
    pub fn set_priority(&mut self, vertex: VertexId, priority: f64) {
        self.inner[NodeIndex::new(vertex)].priority = priority;
    }

    /// Raises the hierarchy depth of `vertex` to at least `depth`.
    pub fn raise_hierarchy_depth(&mut self, vertex: VertexId, depth: u32) {
        let data = &mut self.inner[NodeIndex::new(vertex)];
        data.hierarchy_depth = data.hierarchy_depth.max(depth);
    }

    /// Number of vertices.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.inner.node_count()
    }

    /// Number of edges, removed ones included.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.inner.edge_count()
    }

    /// # Panics
    /// If `vertex` is not a valid id.
    #[must_use]
    pub fn vertex(&self, vertex: VertexId) -> &Vertex {
        &self.inner[NodeIndex::new(vertex)]
    }

    /// # Panics
    /// If `edge` is not a valid id.
    #[must_use]
    pub fn edge(&self, edge: EdgeId) -> &Edge {
        &self.inner[EdgeIndex::new(edge)]
    }

    /// All vertices in id order.
    pub fn vertices(&self) -> impl Iterator<Item = &Vertex> + '_ {
        self.inner.node_weights()
    }

    /// All edges in id order, removed ones included.
    pub fn edges(&self) -> impl Iterator<Item = &Edge> + '_ {
        self.inner.edge_weights()
    }

    /// Ids of the vertices not contracted yet, ascending.
    pub fn unprocessed_vertices(&self) -> impl Iterator<Item = VertexId> + '_ {
        self.vertices().filter(|v| !v.processed).map(|v| v.id)
    }

    /// Live edges that can be traversed into `vertex`, ascending by id.
    #[must_use]
    pub fn ingoing_edges(&self, vertex: VertexId) -> Vec<EdgeId> {
        self.adjacent(vertex, Direction::Incoming)
    }

    /// Live edges that can be traversed out of `vertex`, ascending by id.
    #[must_use]
    pub fn outgoing_edges(&self, vertex: VertexId) -> Vec<EdgeId> {
        self.adjacent(vertex, Direction::Outgoing)
    }

    /// Live edges usable in `direction` at `vertex`, ascending.
    fn adjacent(&self, vertex: VertexId, direction: Direction) -> Vec<EdgeId> {
        let node = NodeIndex::new(vertex);
        // bidirectional edges stored the other way round also count
        let reversed = self
            .inner
            .edges_directed(node, direction.opposite())
            .filter(|e| e.weight().bidirectional);
        self.inner
            .edges_directed(node, direction)
            .chain(reversed)
            .filter(|e| !e.weight().removed)
            .map(|e| e.id().index())
            .sorted_unstable()
            .dedup()
            .collect()
    }

    /// Endpoints of live edges incident to `vertex`, direction-agnostic, without `vertex` itself.
    #[must_use]
    pub fn neighbors(&self, vertex: VertexId) -> Vec<VertexId> {
        self.inner
            .neighbors_undirected(NodeIndex::new(vertex))
            .map(NodeIndex::index)
            .filter(|&n| n != vertex)
            .sorted_unstable()
            .dedup()
            .filter(|&n| {
                self.inner
                    .edges_connecting(NodeIndex::new(vertex), NodeIndex::new(n))
                    .chain(self.inner.edges_connecting(NodeIndex::new(n), NodeIndex::new(vertex)))
                    .any(|e| !e.weight().removed)
            })
            .collect()
    }

    /// The endpoint of `edge` that is not `known`.
    #[must_use]
    pub fn other_vertex(&self, edge: EdgeId, known: VertexId) -> VertexId {
        let data = self.edge(edge);
        if data.source == known {
            data.target
        } else {
            data.source
        }
    }

    /// Length of `edge`.
    #[must_use]
    pub fn weight(&self, edge: EdgeId) -> Weight {
        self.edge(edge).weight
    }

    /// Number of input edges `edge` stands for.
    #[must_use]
    pub fn original_edge_count(&self, edge: EdgeId) -> u32 {
        self.edge(edge).original_edge_count
    }

    /// Expands `edge` into the input edges it represents, in driving order from its source.
    #[must_use]
    pub fn unpack_edge(&self, edge: EdgeId) -> Vec<EdgeId> {
        let mut unpacked = Vec::with_capacity(self.original_edge_count(edge) as usize);
        let mut stack = vec![(edge, self.edge(edge).source)];
        while let Some((current, from)) = stack.pop() {
            let data = self.edge(current);
            let Some((first, second)) = data.represented_pair else {
                unpacked.push(current);
                continue;
            };
            let via = self.other_vertex(first, data.source);
            if from == data.source {
                stack.push((second, via));
                stack.push((first, data.source));
            } else {
                stack.push((first, via));
                stack.push((second, data.target));
            }
        }
        unpacked
    }

    /// Graphviz rendering of the live part of the graph.
    #[must_use]
    pub fn to_dot(&self) -> String {
        let graphable = self.inner.filter_map(
            |i, v| Some(format!("{} d={} r={:?}", i.index(), v.hierarchy_depth, v.round)),
            |i, e| {
                (!e.removed).then(|| {
                    let kind = if e.is_shortcut() { "S" } else { "E" };
                    let arrow = if e.bidirectional { "<>" } else { ">" };
                    format!("{}{} {} w={}", kind, i.index(), arrow, e.weight)
                })
            },
        );
        format!("{}", Dot::new(&graphable))
    }

    /// Fails with `GraphConsistency` for an unknown vertex id.
    fn check_vertex(&self, vertex: VertexId) -> Result<()> {
        if vertex < self.vertex_count() {
            Ok(())
        } else {
            Err(ContractionError::graph_consistency(format!("unknown vertex {vertex}")))
        }
    }

    /// Fails with `GraphConsistency` for an unknown edge id.
    fn check_edge(&self, edge: EdgeId) -> Result<()> {
        if edge < self.edge_count() {
            Ok(())
        } else {
            Err(ContractionError::graph_consistency(format!("unknown edge {edge}")))
        }
    }
}

#[cfg(test)]
mod tests {
    use assertables::*;
    use rstest::*;

    use super::*;
    use crate::model::{
        RawEdge,
        RawVertex,
    };

    //   0 --> 1 <-> 2 --> 3
    #[fixture]
    fn line() -> Graph {
        let mut graph = Graph::new();
        for _ in 0..4 {
            graph.add_vertex(0.0, 0.0);
        }
        graph.add_edge(0, 1, 3, false).unwrap();
        graph.add_edge(1, 2, 4, true).unwrap();
        graph.add_edge(2, 3, 5, false).unwrap();
        graph
    }

    #[rstest]
    fn test_adjacency_respects_bidirectional_edges(line: Graph) {
        assert_eq!(line.ingoing_edges(1), vec![0, 1]);
        assert_eq!(line.outgoing_edges(1), vec![1]);
        assert_eq!(line.ingoing_edges(2), vec![1]);
        assert_eq!(line.outgoing_edges(2), vec![1, 2]);
        assert_eq!(line.neighbors(1), vec![0, 2]);
    }

    #[rstest]
    fn test_other_vertex(line: Graph) {
        assert_eq!(line.other_vertex(1, 1), 2);
        assert_eq!(line.other_vertex(1, 2), 1);
    }

    #[rstest]
    fn test_removed_edges_leave_adjacency(mut line: Graph) {
        line.mark_edge_removed(0).unwrap();
        assert_eq!(line.ingoing_edges(1), vec![1]);
        assert_eq!(line.neighbors(1), vec![2]);
        assert_eq!(line.edge_count(), 3);
    }

    #[rstest]
    fn test_remove_twice_is_an_invariant_violation(mut line: Graph) {
        line.mark_edge_removed(2).unwrap();
        let err = line.mark_edge_removed(2).unwrap_err();
        assert!(matches!(err.downcast_ref::<ContractionError>(), Some(ContractionError::InvariantViolation(_))));
    }

    #[rstest]
    fn test_process_twice_is_an_invariant_violation(mut line: Graph) {
        line.mark_processed(3, 0).unwrap();
        assert_eq!(line.vertex(3).round, Some(0));
        assert!(line.mark_processed(3, 1).is_err());
        assert_eq!(line.unprocessed_vertices().collect::<Vec<_>>(), vec![0, 1, 2]);
    }

    #[rstest]
    fn test_shortcut_ids_are_appended(mut line: Graph) {
        let id = line.add_shortcut_edge(0, 2, 7, 2, (0, 1), false).unwrap();
        assert_eq!(id, 3);
        assert!(line.edge(id).is_shortcut());
        assert_eq!(line.original_edge_count(id), 2);
        assert_eq!(line.outgoing_edges(0), vec![0, 3]);
    }

    #[rstest]
    fn test_shortcut_with_unknown_pair_is_rejected(mut line: Graph) {
        assert!(line.add_shortcut_edge(0, 2, 7, 2, (0, 17), false).is_err());
    }

    #[rstest]
    fn test_unpack_nested_shortcut(mut line: Graph) {
        // 0 -> 2 via 1, then 0 -> 3 via 2
        let inner = line.add_shortcut_edge(0, 2, 7, 2, (0, 1), false).unwrap();
        let outer = line.add_shortcut_edge(0, 3, 12, 3, (inner, 2), false).unwrap();
        assert_eq!(line.unpack_edge(outer), vec![0, 1, 2]);
    }

    #[test]
    fn test_unpack_reversed_bidirectional_constituent() {
        //   0 <-> 1 <-> 2 <-- 3
        let mut graph = Graph::new();
        for _ in 0..4 {
            graph.add_vertex(0.0, 0.0);
        }
        let e0 = graph.add_edge(0, 1, 1, true).unwrap();
        let e1 = graph.add_edge(1, 2, 1, true).unwrap();
        let e2 = graph.add_edge(3, 2, 1, false).unwrap();
        let both = graph.add_shortcut_edge(0, 2, 2, 2, (e0, e1), true).unwrap();
        // 3 -> 2 -> 0 drives the bidirectional shortcut against its stored orientation
        let down = graph.add_shortcut_edge(3, 0, 3, 3, (e2, both), false).unwrap();
        assert_eq!(graph.unpack_edge(both), vec![e0, e1]);
        assert_eq!(graph.unpack_edge(down), vec![e2, e1, e0]);
    }

    #[test]
    fn test_from_raw_rejects_bad_input() {
        let raw = RawGraph {
            vertices: vec![RawVertex { lat: 0.0, lon: 0.0 }; 2],
            edges: vec![RawEdge { source: 0, target: 1, weight: -1, bidirectional: false }],
        };
        let err = Graph::from_raw(&raw).unwrap_err();
        assert_contains!(err.to_string(), "negative weight");

        let raw = RawGraph {
            vertices: vec![RawVertex { lat: 0.0, lon: 0.0 }; 2],
            edges: vec![RawEdge { source: 0, target: 5, weight: 1, bidirectional: false }],
        };
        let err = Graph::from_raw(&raw).unwrap_err();
        assert!(matches!(err.downcast_ref::<ContractionError>(), Some(ContractionError::GraphConsistency(_))));
    }

    #[rstest]
    fn test_dot_skips_removed_edges(mut line: Graph) {
        line.mark_edge_removed(1).unwrap();
        let dot = line.to_dot();
        assert_contains!(dot, "E0");
        assert_not_contains!(dot, "E1 ");
    }
}
