//! Single-source shortest paths over a `GraphStore` (spec.md §4.7), grounded
//! in `original_source/src/router-mp.h`'s `Dijkstra`/`GetShortestPathTo` and
//! the teacher's `BinaryHeap<Sortable<_>>` priority-queue pattern from
//! `isochrone.rs`.

use crate::graph::{GraphStore, VertexId};
use crate::sortable::Sortable;
use indexmap::IndexMap;
use ordered_float::OrderedFloat;
use std::collections::BinaryHeap;

/// A full single-source shortest-path tree: a distance to every vertex
/// reached, and enough predecessor links to reconstruct any path to them.
#[derive(Debug)]
pub struct ShortestPaths {
    pub source: VertexId,
    pub distance: IndexMap<VertexId, f64>,
    pub predecessor: IndexMap<VertexId, VertexId>,
}

impl ShortestPaths {
    /// Reconstructs the path from the source to `target`, source first.
    /// Empty if `target` was never reached.
    pub fn path_to(&self, target: &VertexId) -> Vec<VertexId> {
        if !self.distance.contains_key(target) {
            return Vec::new();
        }
        let mut path = vec![target.clone()];
        let mut cur = target.clone();
        while let Some(prev) = self.predecessor.get(&cur) {
            path.push(prev.clone());
            cur = prev.clone();
        }
        path.reverse();
        path
    }
}

/// Runs Dijkstra from `source` over every live edge in `graph`. Distances are
/// finite only for vertices reachable from `source`; everything else is
/// simply absent from `distance` rather than stored as infinity.
pub fn dijkstra(graph: &GraphStore, source: &VertexId) -> ShortestPaths {
    let mut distance: IndexMap<VertexId, f64> = IndexMap::new();
    let mut predecessor: IndexMap<VertexId, VertexId> = IndexMap::new();
    let mut heap: BinaryHeap<Sortable<OrderedFloat<f64>, VertexId>> = BinaryHeap::new();

    distance.insert(source.clone(), 0.0);
    heap.push(Sortable::new(OrderedFloat(0.0), source.clone()));

    while let Some(entry) = heap.pop() {
        let d_u = entry.key().0;
        let u = entry.into_val();

        if d_u > *distance.get(&u).unwrap_or(&f64::INFINITY) {
            continue; // stale entry; a shorter one already settled u
        }

        for eid in graph.incident_edges(&u) {
            let edge = match graph.edges.get(&eid) {
                Some(e) if e.from == u && !e.replaced_by_compact => e,
                _ => continue,
            };
            let candidate = d_u + edge.d_weighted;
            let improves = distance
                .get(&edge.to)
                .map(|&cur| candidate < cur)
                .unwrap_or(true);
            if improves {
                distance.insert(edge.to.clone(), candidate);
                predecessor.insert(edge.to.clone(), u.clone());
                heap.push(Sortable::new(OrderedFloat(candidate), edge.to.clone()));
            }
        }
    }

    ShortestPaths {
        source: source.clone(),
        distance,
        predecessor,
    }
}

/// Convenience wrapper for a single source/target pair: the distance (or
/// `f64::INFINITY` if unreachable) and the vertex sequence (empty if
/// unreachable).
pub fn shortest_path(graph: &GraphStore, source: &VertexId, target: &VertexId) -> (f64, Vec<VertexId>) {
    let sp = dijkstra(graph, source);
    match sp.distance.get(target) {
        Some(&d) => (d, sp.path_to(target)),
        None => (f64::INFINITY, Vec::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use indexmap::IndexSet;

    fn edge(g: &mut GraphStore, from: &str, to: &str, d: f64) {
        g.insert_edge(
            from.into(),
            0.0,
            0.0,
            to.into(),
            0.0,
            0.0,
            d,
            d,
            "r".into(),
            true,
            IndexSet::new(),
        );
    }

    #[test]
    fn shortest_path_picks_the_cheaper_route() {
        let mut g = GraphStore::new();
        edge(&mut g, "a", "b", 5.0);
        edge(&mut g, "a", "c", 1.0);
        edge(&mut g, "c", "b", 1.0);

        let (d, path) = shortest_path(&g, &VertexId::from("a"), &VertexId::from("b"));
        assert_relative_eq!(d, 2.0);
        assert_eq!(
            path,
            vec![VertexId::from("a"), VertexId::from("c"), VertexId::from("b")]
        );
    }

    #[test]
    fn unreachable_target_yields_empty_path_without_error() {
        let mut g = GraphStore::new();
        edge(&mut g, "a", "b", 1.0);
        edge(&mut g, "x", "y", 1.0);

        let (d, path) = shortest_path(&g, &VertexId::from("a"), &VertexId::from("y"));
        assert!(d.is_infinite());
        assert!(path.is_empty());
    }

    #[test]
    fn source_to_itself_is_zero_length_path() {
        let mut g = GraphStore::new();
        edge(&mut g, "a", "b", 1.0);
        let (d, path) = shortest_path(&g, &VertexId::from("a"), &VertexId::from("a"));
        assert_relative_eq!(d, 0.0);
        assert_eq!(path, vec![VertexId::from("a")]);
    }

    #[test]
    fn dijkstra_reaches_every_vertex_in_a_connected_graph() {
        let mut g = GraphStore::new();
        edge(&mut g, "a", "b", 1.0);
        edge(&mut g, "b", "c", 1.0);
        edge(&mut g, "c", "d", 1.0);

        let sp = dijkstra(&g, &VertexId::from("a"));
        assert_eq!(sp.distance.len(), 4);
        assert_relative_eq!(sp.distance[&VertexId::from("d")], 3.0);
    }
}
