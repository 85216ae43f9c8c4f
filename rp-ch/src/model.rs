//! Data models for the routing graph and its contraction state.
use serde::{
    Deserialize,
    Serialize,
};

/// Dense, 0-based vertex identifier.
pub type VertexId = usize;
/// Dense, 0-based edge identifier. Ids are never reused, not even after an edge is removed.
pub type EdgeId = usize;
/// Non-negative edge length.
pub type Weight = u64;

/// A road-network vertex together with the bookkeeping the contraction needs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    /// Position of the vertex in the graph's vertex array.
    pub id: VertexId,
    /// Latitude in degrees, carried through untouched for the downstream writers.
    pub lat: f64,
    /// Longitude in degrees.
    pub lon: f64,
    /// Current contraction priority; lower contracts earlier.
    pub priority: f64,
    /// Number of hierarchy levels below this vertex.
    pub hierarchy_depth: u32,
    /// Whether the vertex has been contracted.
    pub processed: bool,
    /// Contraction round in which the vertex was processed.
    pub round: Option<usize>,
}

impl Vertex {
    pub(crate) const fn new(id: VertexId, lat: f64, lon: f64) -> Self {
        Self {
            id,
            lat,
            lon,
            priority: 0.0,
            hierarchy_depth: 0,
            processed: false,
            round: None,
        }
    }
}

/// A directed (or bidirectional) edge; shortcuts remember the two edges they bypass.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    /// Position of the edge in the graph's edge array.
    pub id: EdgeId,
    /// Tail of the edge. For a bidirectional edge this is just the endpoint it was created from.
    pub source: VertexId,
    /// Head of the edge.
    pub target: VertexId,
    /// Length of the edge, equal to the length of the path it stands for.
    pub weight: Weight,
    /// Number of input edges this edge represents (1 for input edges).
    pub original_edge_count: u32,
    /// Bidirectional edges appear in both adjacency directions of both endpoints.
    pub bidirectional: bool,
    /// For shortcuts: `(first, second)` where `first` joins `source` with the contracted vertex
    /// and `second` joins the contracted vertex with `target`.
    pub represented_pair: Option<(EdgeId, EdgeId)>,
    /// Logically deleted; kept so ids held elsewhere stay valid.
    pub removed: bool,
}

impl Edge {
    /// Whether this edge was created by a contraction.
    #[must_use]
    pub const fn is_shortcut(&self) -> bool {
        self.represented_pair.is_some()
    }

    /// Whether the edge can be traversed from `from`.
    #[must_use]
    pub const fn leaves(&self, from: VertexId) -> bool {
        self.source == from || (self.bidirectional && self.target == from)
    }
}

/// Vertex as produced by the extraction pipeline.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawVertex {
    /// Latitude in degrees.
    #[serde(default)]
    pub lat: f64,
    /// Longitude in degrees.
    #[serde(default)]
    pub lon: f64,
}

/// Edge as produced by the extraction pipeline. The weight is signed so that broken input can be
/// reported instead of failing inside the deserializer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEdge {
    /// Tail vertex id.
    pub source: usize,
    /// Head vertex id.
    pub target: usize,
    /// Edge length.
    pub weight: i64,
    /// Whether the road can be driven in both directions.
    #[serde(default)]
    pub bidirectional: bool,
}

/// The routing graph handed over by the extraction pipeline.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RawGraph {
    /// Vertices, indexed by their dense id.
    pub vertices: Vec<RawVertex>,
    /// Edges, indexed by their dense id.
    pub edges: Vec<RawEdge>,
}
