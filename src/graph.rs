//! In-memory vertex/edge store with neighbour sets and a vertex↔edge index
//! (spec.md §4.3). Grounded in `original_source/src/graph.cpp`'s
//! `osm_vertex_t`/`osm_edge_t`/`vert2edge_map_t`, re-expressed with id
//! indirection instead of C++ value copies (spec.md §9's copy-vs-reference
//! design note).

use indexmap::{IndexMap, IndexSet};
use std::fmt;

/// Opaque, stable, value-typed vertex identifier as given by the caller.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, serde::Serialize, serde::Deserialize)]
pub struct VertexId(pub String);

impl fmt::Display for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for VertexId {
    fn from(s: &str) -> Self {
        VertexId(s.to_string())
    }
}

impl From<i64> for VertexId {
    fn from(n: i64) -> Self {
        VertexId(n.to_string())
    }
}

/// Monotonically allocated edge identifier, unique within a single
/// `GraphStore`. Never reused across requests (spec.md §9's global-counter
/// design note: the allocator is scoped to the store, not a process-global).
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, serde::Serialize, serde::Deserialize)]
pub struct EdgeId(pub u64);

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Debug)]
pub struct Vertex {
    pub lat: f64,
    pub lon: f64,
    pub in_neighbours: IndexSet<VertexId>,
    pub out_neighbours: IndexSet<VertexId>,
}

impl Vertex {
    fn new(lat: f64, lon: f64) -> Self {
        Self {
            lat,
            lon,
            in_neighbours: IndexSet::new(),
            out_neighbours: IndexSet::new(),
        }
    }

    pub fn degree_in(&self) -> usize {
        self.in_neighbours.len()
    }

    pub fn degree_out(&self) -> usize {
        self.out_neighbours.len()
    }

    /// Union of `in` and `out` neighbour ids.
    pub fn all_neighbours(&self) -> IndexSet<VertexId> {
        let mut all = self.in_neighbours.clone();
        all.extend(self.out_neighbours.iter().cloned());
        all
    }
}

#[derive(Clone, Debug)]
pub struct Edge {
    pub id: EdgeId,
    pub from: VertexId,
    pub to: VertexId,
    pub d: f64,
    pub d_weighted: f64,
    pub highway: String,
    pub in_original: bool,
    pub replaced_by_compact: bool,
    pub replacing_edges: IndexSet<EdgeId>,
}

/// Vertex/edge store plus the vertex→edge index and the edge replacement
/// map, all kept consistent by `insert_edge`/`erase_edge`/`erase_vertex`.
///
/// Uses `IndexMap`/`IndexSet` rather than the hash-based containers the
/// store's C++ ancestor used: iteration order must be stable across runs
/// for a given input order (spec.md §5), since it determines which
/// concrete ids the contractor assigns to synthetic edges.
#[derive(Debug, Default)]
pub struct GraphStore {
    pub vertices: IndexMap<VertexId, Vertex>,
    pub edges: IndexMap<EdgeId, Edge>,
    pub vertex_to_edges: IndexMap<VertexId, IndexSet<EdgeId>>,
    pub replacement_map: IndexMap<EdgeId, IndexSet<EdgeId>>,
    next_edge_id: u64,
}

impl GraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure_vertex(&mut self, id: &VertexId, lat: f64, lon: f64) {
        self.vertices
            .entry(id.clone())
            .or_insert_with(|| Vertex::new(lat, lon));
    }

    fn index_edge(&mut self, v: &VertexId, eid: EdgeId) {
        self.vertex_to_edges
            .entry(v.clone())
            .or_insert_with(IndexSet::new)
            .insert(eid);
    }

    fn deindex_edge(&mut self, v: &VertexId, eid: EdgeId) {
        if let Some(set) = self.vertex_to_edges.get_mut(v) {
            set.shift_remove(&eid);
        }
    }

    /// Creates `from`/`to` vertices lazily on first sighting, updates
    /// neighbour sets and the vertex-to-edge index, and assigns a fresh
    /// edge id.
    #[allow(clippy::too_many_arguments)]
    pub fn insert_edge(
        &mut self,
        from: VertexId,
        from_lat: f64,
        from_lon: f64,
        to: VertexId,
        to_lat: f64,
        to_lon: f64,
        d: f64,
        d_weighted: f64,
        highway: String,
        in_original: bool,
        replacing_edges: IndexSet<EdgeId>,
    ) -> EdgeId {
        self.ensure_vertex(&from, from_lat, from_lon);
        self.ensure_vertex(&to, to_lat, to_lon);

        self.vertices
            .get_mut(&from)
            .expect("just inserted")
            .out_neighbours
            .insert(to.clone());
        self.vertices
            .get_mut(&to)
            .expect("just inserted")
            .in_neighbours
            .insert(from.clone());

        let id = EdgeId(self.next_edge_id);
        self.next_edge_id += 1;

        self.index_edge(&from, id);
        self.index_edge(&to, id);

        self.edges.insert(
            id,
            Edge {
                id,
                from,
                to,
                d,
                d_weighted,
                highway,
                in_original,
                replaced_by_compact: false,
                replacing_edges,
            },
        );
        id
    }

    /// If `old` is a neighbour of `v` (in either direction), replaces it
    /// with `new`. No-op if `old` is absent.
    pub fn replace_neighbour(&mut self, v: &VertexId, old: &VertexId, new: &VertexId) {
        if let Some(vtx) = self.vertices.get_mut(v) {
            if vtx.in_neighbours.shift_remove(old) {
                vtx.in_neighbours.insert(new.clone());
            }
            if vtx.out_neighbours.shift_remove(old) {
                vtx.out_neighbours.insert(new.clone());
            }
        }
    }

    pub fn erase_edge(&mut self, eid: EdgeId) -> Option<Edge> {
        let edge = self.edges.shift_remove(&eid)?;
        self.deindex_edge(&edge.from, eid);
        self.deindex_edge(&edge.to, eid);
        Some(edge)
    }

    pub fn erase_vertex(&mut self, vid: &VertexId) -> Option<Vertex> {
        self.vertex_to_edges.shift_remove(vid);
        self.vertices.shift_remove(vid)
    }

    pub fn get_vertex(&self, vid: &VertexId) -> Option<&Vertex> {
        self.vertices.get(vid)
    }

    pub fn incident_edges(&self, vid: &VertexId) -> IndexSet<EdgeId> {
        self.vertex_to_edges.get(vid).cloned().unwrap_or_default()
    }

    /// `|in| = 1 ∧ |out| = 1 ∧ |in ∪ out| = 2`: a through-vertex on a
    /// one-directional chain.
    pub fn is_intermediate_single(&self, vid: &VertexId) -> bool {
        match self.vertices.get(vid) {
            Some(v) => v.degree_in() == 1 && v.degree_out() == 1 && v.all_neighbours().len() == 2,
            None => false,
        }
    }

    /// `|in| = 2 ∧ |out| = 2 ∧ |in ∪ out| = 2`: a through-vertex on a
    /// bidirectional chain.
    pub fn is_intermediate_double(&self, vid: &VertexId) -> bool {
        match self.vertices.get(vid) {
            Some(v) => v.degree_in() == 2 && v.degree_out() == 2 && v.all_neighbours().len() == 2,
            None => false,
        }
    }

    /// Live (non-`replaced_by_compact`) edges, in store order.
    pub fn live_edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values().filter(|e| !e.replaced_by_compact)
    }

    /// Records that `compact` subsumes every id in `originals`, in both
    /// directions at once: `R(compact)` gains every original, and each
    /// original's `R` gains `compact`. Called with an already-flattened
    /// `originals` set (true ingestion-time ids, never an intermediate
    /// synthetic id), so the map stays transitively closed from the
    /// outset rather than cascading on edge-id ordering (spec.md §9).
    pub fn record_replacement(&mut self, compact: EdgeId, originals: &IndexSet<EdgeId>) {
        self.replacement_map
            .entry(compact)
            .or_insert_with(IndexSet::new)
            .extend(originals.iter().copied());
        for o in originals {
            self.replacement_map
                .entry(*o)
                .or_insert_with(IndexSet::new)
                .insert(compact);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vid(s: &str) -> VertexId {
        VertexId::from(s)
    }

    #[test]
    fn insert_edge_updates_neighbours_and_index() {
        let mut g = GraphStore::new();
        let e = g.insert_edge(
            vid("a"),
            0.0,
            0.0,
            vid("b"),
            1.0,
            1.0,
            1.0,
            1.0,
            "residential".into(),
            true,
            IndexSet::new(),
        );
        assert!(g.vertices[&vid("a")].out_neighbours.contains(&vid("b")));
        assert!(g.vertices[&vid("b")].in_neighbours.contains(&vid("a")));
        assert!(g.vertex_to_edges[&vid("a")].contains(&e));
        assert!(g.vertex_to_edges[&vid("b")].contains(&e));
    }

    #[test]
    fn replace_neighbour_rewrites_both_sides() {
        let mut g = GraphStore::new();
        g.insert_edge(
            vid("a"),
            0.0,
            0.0,
            vid("b"),
            0.0,
            0.0,
            1.0,
            1.0,
            "residential".into(),
            true,
            IndexSet::new(),
        );
        g.replace_neighbour(&vid("a"), &vid("b"), &vid("c"));
        assert!(g.vertices[&vid("a")].out_neighbours.contains(&vid("c")));
        assert!(!g.vertices[&vid("a")].out_neighbours.contains(&vid("b")));
    }

    #[test]
    fn intermediate_single_detects_through_vertex() {
        let mut g = GraphStore::new();
        g.insert_edge(
            vid("a"),
            0.0,
            0.0,
            vid("b"),
            0.0,
            0.0,
            1.0,
            1.0,
            "r".into(),
            true,
            IndexSet::new(),
        );
        g.insert_edge(
            vid("b"),
            0.0,
            0.0,
            vid("c"),
            0.0,
            0.0,
            1.0,
            1.0,
            "r".into(),
            true,
            IndexSet::new(),
        );
        assert!(g.is_intermediate_single(&vid("b")));
        assert!(!g.is_intermediate_double(&vid("b")));
    }

    #[test]
    fn intermediate_double_detects_bidirectional_through_vertex() {
        let mut g = GraphStore::new();
        g.insert_edge(
            vid("a"),
            0.0,
            0.0,
            vid("b"),
            0.0,
            0.0,
            1.0,
            1.0,
            "r".into(),
            true,
            IndexSet::new(),
        );
        g.insert_edge(
            vid("b"),
            0.0,
            0.0,
            vid("a"),
            0.0,
            0.0,
            1.0,
            1.0,
            "r".into(),
            true,
            IndexSet::new(),
        );
        g.insert_edge(
            vid("b"),
            0.0,
            0.0,
            vid("c"),
            0.0,
            0.0,
            1.0,
            1.0,
            "r".into(),
            true,
            IndexSet::new(),
        );
        g.insert_edge(
            vid("c"),
            0.0,
            0.0,
            vid("b"),
            0.0,
            0.0,
            1.0,
            1.0,
            "r".into(),
            true,
            IndexSet::new(),
        );
        assert!(g.is_intermediate_double(&vid("b")));
        assert!(!g.is_intermediate_single(&vid("b")));
    }

    #[test]
    fn y_junction_is_not_intermediate() {
        let mut g = GraphStore::new();
        g.insert_edge(
            vid("a"),
            0.0,
            0.0,
            vid("c"),
            0.0,
            0.0,
            1.0,
            1.0,
            "r".into(),
            true,
            IndexSet::new(),
        );
        g.insert_edge(
            vid("b"),
            0.0,
            0.0,
            vid("c"),
            0.0,
            0.0,
            1.0,
            1.0,
            "r".into(),
            true,
            IndexSet::new(),
        );
        g.insert_edge(
            vid("c"),
            0.0,
            0.0,
            vid("d"),
            0.0,
            0.0,
            1.0,
            1.0,
            "r".into(),
            true,
            IndexSet::new(),
        );
        assert!(!g.is_intermediate_single(&vid("c")));
        assert!(!g.is_intermediate_double(&vid("c")));
    }
}
