//! Thin row-oriented glue realizing the four external interfaces of
//! spec.md §6 over `csv`/`serde`, grounded in the teacher's own
//! `RawEdge`/`csv::Reader::deserialize` pattern (`graph.rs`'s former
//! `Graph::from_path`). Marshalling only: no routing logic lives here.

use crate::component::{find_components, prune_to_largest_component};
use crate::contract::contract;
use crate::dijkstra;
use crate::error::{Error, Result};
use crate::graph::{EdgeId, GraphStore, VertexId};
use crate::rsp::{self, RspConfig};
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

/// One row of `make_compact_graph`'s `raw_edges` input.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawEdgeRow {
    pub from_id: String,
    pub to_id: String,
    pub from_lon: f64,
    pub from_lat: f64,
    pub to_lon: f64,
    pub to_lat: f64,
    pub edge_id: u64,
    pub d: f64,
    pub d_weighted: f64,
    pub highway: String,
}

/// One row of the `compact`/`original` output tables.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EdgeRow {
    pub edge_id: u64,
    pub from_id: String,
    pub to_id: String,
    pub d: f64,
    pub d_weighted: f64,
    pub highway: String,
}

/// One row of the `map` output table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReplacementRow {
    pub id_compact: u64,
    pub id_original: u64,
}

#[derive(Debug)]
pub struct CompactGraphResult {
    pub compact: Vec<EdgeRow>,
    pub original: Vec<EdgeRow>,
    pub map: Vec<ReplacementRow>,
}

/// `from_id, to_id, d_weighted` — the minimal routing-ready edge list
/// `route_dijkstra`/`route_prob` consume.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WeightedEdgeRow {
    pub from_id: String,
    pub to_id: String,
    pub d_weighted: f64,
}

fn edge_row(edge_id: u64, e: &crate::graph::Edge) -> EdgeRow {
    EdgeRow {
        edge_id,
        from_id: e.from.to_string(),
        to_id: e.to.to_string(),
        d: e.d,
        d_weighted: e.d_weighted,
        highway: e.highway.clone(),
    }
}

/// Ingests `raw_edges` into a `GraphStore`, prunes to the largest weakly
/// connected component, and contracts degree-2 chains. Returns the
/// `compact`/`original`/`map` triple of spec.md §6.
pub fn make_compact_graph(raw_edges: &[RawEdgeRow]) -> Result<CompactGraphResult> {
    if raw_edges.is_empty() {
        return Err(Error::EmptyGraph);
    }

    let mut graph = GraphStore::new();
    let mut caller_id: IndexMap<EdgeId, u64> = IndexMap::new();

    for row in raw_edges {
        let id = graph.insert_edge(
            VertexId::from(row.from_id.as_str()),
            row.from_lat,
            row.from_lon,
            VertexId::from(row.to_id.as_str()),
            row.to_lat,
            row.to_lon,
            row.d,
            row.d_weighted,
            row.highway.clone(),
            true,
            IndexSet::new(),
        );
        caller_id.insert(id, row.edge_id);
    }

    let original: Vec<EdgeRow> = graph
        .edges
        .values()
        .map(|e| edge_row(caller_id[&e.id], e))
        .collect();

    let components = find_components(&graph);
    prune_to_largest_component(&mut graph, &components);
    contract(&mut graph);

    let compact: Vec<EdgeRow> = graph.live_edges().map(|e| edge_row(e.id.0, e)).collect();

    let map: Vec<ReplacementRow> = graph
        .live_edges()
        .flat_map(|e| {
            let id_compact = e.id.0;
            e.replacing_edges
                .iter()
                .map(move |o| ReplacementRow {
                    id_compact,
                    id_original: caller_id[o],
                })
        })
        .collect();

    Ok(CompactGraphResult {
        compact,
        original,
        map,
    })
}

fn build_weighted_graph(edges: &[WeightedEdgeRow]) -> Result<GraphStore> {
    if edges.is_empty() {
        return Err(Error::EmptyGraph);
    }
    let mut graph = GraphStore::new();
    for row in edges {
        graph.insert_edge(
            VertexId::from(row.from_id.as_str()),
            0.0,
            0.0,
            VertexId::from(row.to_id.as_str()),
            0.0,
            0.0,
            row.d_weighted,
            row.d_weighted,
            String::new(),
            true,
            IndexSet::new(),
        );
    }
    Ok(graph)
}

/// Classical Dijkstra over `edges`. Empty output signals an unreachable
/// target, not an error.
pub fn route_dijkstra(edges: &[WeightedEdgeRow], start: &str, end: &str) -> Result<Vec<VertexId>> {
    let graph = build_weighted_graph(edges)?;
    let start_v = VertexId::from(start);
    let end_v = VertexId::from(end);
    if !graph.vertices.contains_key(&start_v) {
        return Err(Error::UnknownVertex(start_v));
    }
    if !graph.vertices.contains_key(&end_v) {
        return Err(Error::UnknownVertex(end_v));
    }
    let (_, path) = dijkstra::shortest_path(&graph, &start_v, &end_v);
    Ok(path)
}

/// RSP traversal probabilities for `edges`, one entry per input row in
/// input order.
pub fn route_prob(edges: &[WeightedEdgeRow], start: &str, end: &str, eta: f64) -> Result<Vec<f64>> {
    let graph = build_weighted_graph(edges)?;
    let start_v = VertexId::from(start);
    let end_v = VertexId::from(end);
    let result = rsp::route_probabilities(&graph, &start_v, &end_v, eta, &RspConfig::default())?;
    Ok(edges
        .iter()
        .map(|row| {
            result
                .edge_probability(&VertexId::from(row.from_id.as_str()), &VertexId::from(row.to_id.as_str()))
                .unwrap_or(0.0)
        })
        .collect())
}

/// Reads `raw_edges` from a CSV source instead of an in-memory `Vec`.
pub fn make_compact_graph_csv<R: Read>(reader: R) -> Result<CompactGraphResult> {
    let mut rdr = csv::Reader::from_reader(reader);
    let rows: std::result::Result<Vec<RawEdgeRow>, csv::Error> = rdr.deserialize().collect();
    make_compact_graph(&rows?)
}

/// Reads a routing-ready edge list from a CSV source.
pub fn weighted_edges_csv<R: Read>(reader: R) -> Result<Vec<WeightedEdgeRow>> {
    let mut rdr = csv::Reader::from_reader(reader);
    let rows: std::result::Result<Vec<WeightedEdgeRow>, csv::Error> = rdr.deserialize().collect();
    Ok(rows?)
}

/// Writes `rows` to a CSV sink, headers included.
pub fn write_csv<T: Serialize, W: Write>(rows: &[T], writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}
