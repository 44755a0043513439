//! Collapses degree-2 chains of intermediate vertices into synthetic edges
//! (spec.md §4.6), grounded directly in
//! `original_source/src/graph.cpp`'s `contract_graph`.

use crate::graph::{EdgeId, GraphStore, VertexId};
use indexmap::IndexSet;
use log::debug;

/// Repeatedly contracts intermediate-single/-double vertices until a full
/// pass over the live vertex set makes no change.
///
/// Idempotent: calling this again on an already-contracted graph is a
/// no-op, since no vertex left standing satisfies either intermediate
/// predicate with a matching incident-edge count.
pub fn contract(graph: &mut GraphStore) {
    loop {
        let verts: Vec<VertexId> = graph.vertices.keys().cloned().collect();
        let mut changed = false;

        for vid in verts {
            if !graph.vertices.contains_key(&vid) {
                continue; // erased by an earlier contraction this pass
            }
            if try_contract_vertex(graph, &vid) {
                changed = true;
            }
        }

        if !changed {
            break;
        }
    }
}

/// Attempts to contract a single vertex; returns whether it was removed.
fn try_contract_vertex(graph: &mut GraphStore, vid: &VertexId) -> bool {
    let is_single = graph.is_intermediate_single(vid);
    let is_double = graph.is_intermediate_double(vid);
    if !is_single && !is_double {
        return false;
    }

    let incident = graph.incident_edges(vid);
    let expected = if is_double { 4 } else { 2 };
    if incident.len() != expected {
        // self-loops / duplicated neighbours: leave untouched.
        return false;
    }

    let neighbours: Vec<VertexId> = graph.get_vertex(vid).unwrap().all_neighbours().into_iter().collect();
    if neighbours.len() != 2 {
        return false;
    }
    let (a, b) = (neighbours[0].clone(), neighbours[1].clone());

    graph.replace_neighbour(&a, vid, &b);
    graph.replace_neighbour(&b, vid, &a);

    // Partition incident edges by direction relative to (a, b): "toward b"
    // (a->v or v->b) accumulates d_to/wt_to, "toward a" accumulates
    // d_from/wt_from.
    let mut d_to = 0.0;
    let mut wt_to = 0.0;
    let mut d_from = 0.0;
    let mut wt_from = 0.0;
    let mut highway = String::new();
    // Flattened to true original edge ids: an incident edge that is itself
    // synthetic contributes the originals it already subsumes rather than
    // its own id, so a multi-hop chain's final edge points straight at the
    // ingestion-time ids instead of at intermediate synthetic ones.
    let mut replacing: IndexSet<EdgeId> = IndexSet::new();

    for eid in &incident {
        let edge = graph.edges.get(eid).expect("incident edge must exist").clone();
        highway = edge.highway.clone();
        if edge.from == a || edge.to == b {
            d_to += edge.d;
            wt_to += edge.d_weighted;
        } else if edge.from == b || edge.to == a {
            d_from += edge.d;
            wt_from += edge.d_weighted;
        }
        if edge.replacing_edges.is_empty() {
            replacing.insert(edge.id);
        } else {
            replacing.extend(edge.replacing_edges.iter().copied());
        }
    }

    for eid in &incident {
        if let Some(e) = graph.edges.get_mut(eid) {
            e.replaced_by_compact = true;
        }
        graph.erase_edge(*eid);
    }

    let mut new_ids = Vec::new();
    if d_to > 0.0 {
        let (a_lat, a_lon) = vertex_coords(graph, &a);
        let (b_lat, b_lon) = vertex_coords(graph, &b);
        let id = graph.insert_edge(
            a.clone(),
            a_lat,
            a_lon,
            b.clone(),
            b_lat,
            b_lon,
            d_to,
            wt_to,
            highway.clone(),
            false,
            replacing.clone(),
        );
        new_ids.push(id);
    }
    if d_from > 0.0 {
        let (a_lat, a_lon) = vertex_coords(graph, &a);
        let (b_lat, b_lon) = vertex_coords(graph, &b);
        let id = graph.insert_edge(
            b.clone(),
            b_lat,
            b_lon,
            a.clone(),
            a_lat,
            a_lon,
            d_from,
            wt_from,
            highway,
            false,
            replacing.clone(),
        );
        new_ids.push(id);
    }

    for new_id in &new_ids {
        graph.record_replacement(*new_id, &replacing);
    }

    graph.erase_vertex(vid);
    debug!(
        "contracted vertex {} into {} synthetic edge(s) between {} and {}",
        vid,
        new_ids.len(),
        a,
        b
    );
    true
}

fn vertex_coords(graph: &GraphStore, vid: &VertexId) -> (f64, f64) {
    let v = graph.get_vertex(vid).expect("endpoint must exist");
    (v.lat, v.lon)
}
