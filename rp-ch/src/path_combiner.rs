//! Shrinks shortcut expansion data by storing paths that occur inside other paths only once.
//!
//! Every shortcut expands into a sequence of original edge ids. Many of those sequences are
//! verbatim subsequences of others: a shortcut bypassing two shortcuts expands into both of their
//! sequences. The [`PathCombiner`] repeatedly folds a path into a path containing it, biggest
//! overlap first, until no path is contained in another. Each original path stays addressable
//! through its key as a `(path id, offset)` [`PathLocation`].
use std::cmp::Reverse;
use std::collections::{
    BTreeMap,
    BinaryHeap,
};

use serde::Serialize;
use tracing::{
    debug,
    info,
    instrument,
};

use crate::graph::Graph;
use crate::model::EdgeId;
use crate::queue::PriorityQueueItem;

/// Identifies one original path; [`PathCombiner::from_graph`] uses the shortcut's edge id.
pub type PathKey = usize;
/// Identifies a combined path. Ids are never reused.
pub type PathId = usize;

/// Where an original path lives after combining.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct PathLocation {
    /// Combined path holding the original path.
    pub path_id: PathId,
    /// Index of the original path's first edge inside the combined path.
    pub offset: usize,
}

/// Serializable result of a combining run: the surviving paths and where every key ended up.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HopIndices {
    /// Combined paths by id.
    pub paths: BTreeMap<PathId, Vec<EdgeId>>,
    /// Location of every original path.
    pub locations: BTreeMap<PathKey, PathLocation>,
}

/// A stored path and the original paths it holds.
#[derive(Clone, Debug)]
struct CombinedPath {
    /// Edge ids.
    edges: Vec<EdgeId>,
    /// Original path keys, ascending.
    keys: Vec<PathKey>,
}

/// Folds `contained` into `container`, whose edges hold all of `contained`'s at `offset`.
#[derive(Clone, Copy, Debug)]
struct Candidate {
    /// Path that disappears.
    contained: PathId,
    /// Path that holds it.
    container: PathId,
    /// Where `contained` starts inside `container`.
    offset: usize,
}

/// Largest overlap first, then the lowest `(contained, container)` pair.
type CandidatePriority = (Reverse<usize>, PathId, PathId);

/// Merges paths that are subsequences of one another.
#[derive(Debug)]
pub struct PathCombiner {
    /// Paths as passed in.
    originals: BTreeMap<PathKey, Vec<EdgeId>>,
    /// Current combined paths.
    paths: BTreeMap<PathId, CombinedPath>,
    /// Current location of every original path.
    locations: BTreeMap<PathKey, PathLocation>,
    /// Candidates, possibly referring to retired paths.
    queue: BinaryHeap<PriorityQueueItem<CandidatePriority, Candidate>>,
    /// Id of the next combined path.
    next_id: PathId,
}

impl PathCombiner {
    /// Creates a combiner with one path per key; path ids are handed out in key order, starting
    /// at 0. All combinable pairs are queued right away.
    #[must_use]
    pub fn new(originals: BTreeMap<PathKey, Vec<EdgeId>>) -> Self {
        let mut combiner = Self {
            paths: BTreeMap::new(),
            locations: BTreeMap::new(),
            queue: BinaryHeap::new(),
            next_id: 0,
            originals: BTreeMap::new(),
        };
        for (&key, edges) in &originals {
            let id = combiner.next_id;
            combiner.next_id += 1;
            combiner.paths.insert(id, CombinedPath { edges: edges.clone(), keys: vec![key] });
            combiner.locations.insert(key, PathLocation { path_id: id, offset: 0 });
        }
        combiner.originals = originals;

        let ids: Vec<_> = combiner.paths.keys().copied().collect();
        for (i, &a) in ids.iter().enumerate() {
            for &b in &ids[i + 1..] {
                combiner.queue_pair(a, b);
            }
        }
        combiner
    }

    /// Creates a combiner with one path per live shortcut of `graph`, keyed by the shortcut's
    /// edge id and holding its original edges.
    #[must_use]
    pub fn from_graph(graph: &Graph) -> Self {
        let originals = graph
            .edges()
            .filter(|e| e.is_shortcut() && !e.removed)
            .map(|e| (e.id, graph.unpack_edge(e.id)))
            .collect();
        Self::new(originals)
    }

    /// Merges paths until none is contained in another and returns the number of merges.
    #[instrument(skip_all, fields(paths = self.paths.len()))]
    pub fn combine(&mut self) -> usize {
        let before = self.total_len();
        let mut merges = 0;
        while let Some(PriorityQueueItem { payload: candidate, .. }) = self.queue.pop() {
            if !self.paths.contains_key(&candidate.contained) || !self.paths.contains_key(&candidate.container) {
                continue;
            }
            self.merge(candidate);
            merges += 1;
        }
        info!(merges, paths = self.paths.len(), before, after = self.total_len(), "paths combined");
        merges
    }

    /// Replaces both paths of `candidate` by a new combined path and queues its candidates.
    fn merge(&mut self, candidate: Candidate) {
        let Some(contained) = self.paths.remove(&candidate.contained) else { return };
        let Some(container) = self.paths.remove(&candidate.container) else { return };

        let id = self.next_id;
        self.next_id += 1;
        debug!(id, contained = candidate.contained, container = candidate.container, offset = candidate.offset, "merging");

        for key in &contained.keys {
            if let Some(location) = self.locations.get_mut(key) {
                location.path_id = id;
                location.offset += candidate.offset;
            }
        }
        for key in &container.keys {
            if let Some(location) = self.locations.get_mut(key) {
                location.path_id = id;
            }
        }

        let mut keys = contained.keys;
        keys.extend(container.keys);
        keys.sort_unstable();
        // contained lies entirely inside container, so the merged content is the container's
        let merged = CombinedPath { edges: container.edges, keys };

        let others: Vec<_> = self.paths.keys().copied().collect();
        self.paths.insert(id, merged);
        for other in others {
            self.queue_pair(other, id);
        }
    }

    /// Queues `a` into `b` and `b` into `a`, where possible.
    fn queue_pair(&mut self, a: PathId, b: PathId) {
        let (Some(path_a), Some(path_b)) = (self.paths.get(&a), self.paths.get(&b)) else { return };
        let a_in_b = containment_offset(&path_a.edges, &path_b.edges).map(|offset| (offset, path_a.edges.len()));
        let b_in_a = containment_offset(&path_b.edges, &path_a.edges).map(|offset| (offset, path_b.edges.len()));
        if let Some((offset, shared)) = a_in_b {
            self.push(Candidate { contained: a, container: b, offset }, shared);
        }
        if let Some((offset, shared)) = b_in_a {
            self.push(Candidate { contained: b, container: a, offset }, shared);
        }
    }

    /// Queues `candidate` with `shared` edges in common.
    fn push(&mut self, candidate: Candidate, shared: usize) {
        let priority = (Reverse(shared), candidate.contained, candidate.container);
        self.queue.push(PriorityQueueItem::new(priority, candidate));
    }

    /// Edges of combined path `id`.
    #[must_use]
    pub fn get_path(&self, id: PathId) -> Option<&[EdgeId]> {
        self.paths.get(&id).map(|p| p.edges.as_slice())
    }

    /// Original path keys stored in combined path `id`, ascending.
    #[must_use]
    pub fn get_path_keys_by_path_id(&self, id: PathId) -> Option<&[PathKey]> {
        self.paths.get(&id).map(|p| p.keys.as_slice())
    }

    /// Where the original path `key` lives now.
    #[must_use]
    pub fn location(&self, key: PathKey) -> Option<PathLocation> {
        self.locations.get(&key).copied()
    }

    /// The original path `key` as passed in.
    #[must_use]
    pub fn original_path(&self, key: PathKey) -> Option<&[EdgeId]> {
        self.originals.get(&key).map(Vec::as_slice)
    }

    /// Ids of the current combined paths, ascending.
    pub fn path_ids(&self) -> impl Iterator<Item = PathId> + '_ {
        self.paths.keys().copied()
    }

    /// Number of edge ids stored over all current combined paths.
    #[must_use]
    pub fn total_len(&self) -> usize {
        self.paths.values().map(|p| p.edges.len()).sum()
    }

    /// Snapshot of the current paths and locations.
    #[must_use]
    pub fn hop_indices(&self) -> HopIndices {
        HopIndices {
            paths: self.paths.iter().map(|(&id, p)| (id, p.edges.clone())).collect(),
            locations: self.locations.clone(),
        }
    }
}

/// Index at which `needle` occurs in `haystack`, if it does. Empty paths are never contained.
fn containment_offset(needle: &[EdgeId], haystack: &[EdgeId]) -> Option<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }
    haystack
        .iter()
        .enumerate()
        .filter(|&(_, &edge)| edge == needle[0])
        .map(|(idx, _)| idx)
        .find(|&idx| haystack[idx..].starts_with(needle))
}
