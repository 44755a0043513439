//! Weakly-connected component finder and pruner (spec.md §4.4/§4.5),
//! grounded in `original_source/src/graph.cpp`'s
//! `get_largest_graph_component`/`remove_small_graph_components`.

use crate::graph::{GraphStore, VertexId};
use indexmap::{IndexMap, IndexSet};
use std::collections::VecDeque;

/// Vertex → component index map, plus the index of the largest component
/// (ties broken by the lowest component index, matching the original's
/// `std::max_element` first-match behaviour).
#[derive(Debug)]
pub struct Components {
    pub membership: IndexMap<VertexId, usize>,
    pub largest: usize,
}

/// Flood-fills the undirected neighbour union from an arbitrary unvisited
/// vertex, seeding a new component every time the frontier empties while
/// unvisited vertices remain. Linear in the total graph size.
pub fn find_components(graph: &GraphStore) -> Components {
    let mut membership: IndexMap<VertexId, usize> = IndexMap::new();
    let mut unvisited: IndexSet<VertexId> = graph.vertices.keys().cloned().collect();
    let mut component_sizes: Vec<usize> = Vec::new();

    while let Some(seed) = unvisited.iter().next().cloned() {
        let component_index = component_sizes.len();
        let mut frontier: VecDeque<VertexId> = VecDeque::new();
        frontier.push_back(seed.clone());
        unvisited.shift_remove(&seed);
        let mut size = 0usize;

        while let Some(v) = frontier.pop_front() {
            membership.insert(v.clone(), component_index);
            size += 1;

            if let Some(vtx) = graph.get_vertex(&v) {
                for n in vtx.all_neighbours() {
                    if unvisited.shift_remove(&n) {
                        frontier.push_back(n);
                    }
                }
            }
        }
        component_sizes.push(size);
    }

    let largest = component_sizes
        .iter()
        .enumerate()
        .max_by_key(|(idx, size)| (**size, std::cmp::Reverse(*idx)))
        .map(|(idx, _)| idx)
        .unwrap_or(0);

    Components { membership, largest }
}

/// Removes every vertex whose component differs from the largest, and
/// every edge with either endpoint no longer present. Restores the
/// store's invariants at exit.
pub fn prune_to_largest_component(graph: &mut GraphStore, components: &Components) {
    let to_remove: Vec<VertexId> = components
        .membership
        .iter()
        .filter(|(_, comp)| **comp != components.largest)
        .map(|(v, _)| v.clone())
        .collect();

    for vid in &to_remove {
        graph.erase_vertex(vid);
    }

    let dangling: Vec<_> = graph
        .edges
        .values()
        .filter(|e| !graph.vertices.contains_key(&e.from) || !graph.vertices.contains_key(&e.to))
        .map(|e| e.id)
        .collect();
    for eid in dangling {
        graph.erase_edge(eid);
    }
}
