//! Converts a collection of geospatial polyline features into a directed
//! edge list (spec.md §4.2), grounded in
//! `original_source/src/lines-as-network.cpp`'s `rcpp_lines_as_network`.

use crate::error::{Error, Result};
use crate::geo_primitives::haversine;
use crate::graph::VertexId;

/// One input polyline: an ordered sequence of (lon, lat) points sharing a
/// parallel sequence of per-vertex ids, plus the oneway attributes OSM
/// attaches to a way.
#[derive(Debug, Clone)]
pub struct LineFeature {
    /// Per-vertex stable ids, same length as `geometry`.
    pub osm_id: Vec<VertexId>,
    /// (lon, lat) points in degrees, in line order.
    pub geometry: Vec<(f64, f64)>,
    /// Recognised values: `"yes"` or `"-1"` mean one-way; anything else
    /// (including empty/missing) means two-way.
    pub oneway: String,
    /// Carried through untouched; bicycle-specific routing is out of scope.
    pub oneway_bicycle: Option<String>,
}

impl LineFeature {
    fn is_oneway(&self) -> bool {
        matches!(self.oneway.as_str(), "yes" | "-1")
    }
}

/// One row of the numeric output matrix: `from.lon, from.lat, to.lon,
/// to.lat, d`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumericEdgeRow {
    pub from_lon: f64,
    pub from_lat: f64,
    pub to_lon: f64,
    pub to_lat: f64,
    pub d: f64,
}

/// The parallel row of endpoint identifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdEdgeRow {
    pub from_id: VertexId,
    pub to_id: VertexId,
}

/// Converts `features` into two parallel matrices, one row per directed
/// edge: every consecutive pair of points in a polyline emits a directed
/// edge, and non-oneway polylines additionally emit the reverse edge with
/// identical distance.
pub fn lines_as_network(features: &[LineFeature]) -> Result<(Vec<NumericEdgeRow>, Vec<IdEdgeRow>)> {
    let mut numeric = Vec::new();
    let mut ids = Vec::new();

    for feature in features {
        if feature.geometry.is_empty() || feature.osm_id.is_empty() {
            return Err(Error::MalformedInput(
                "feature is missing geometry or osm_id".into(),
            ));
        }
        if feature.geometry.len() != feature.osm_id.len() {
            return Err(Error::MalformedInput(format!(
                "geometry has {} points but osm_id has {} entries",
                feature.geometry.len(),
                feature.osm_id.len()
            )));
        }

        for w in feature.geometry.windows(2).zip(feature.osm_id.windows(2)) {
            let ((from, to), (from_id, to_id)) = ((w.0[0], w.0[1]), (&w.1[0], &w.1[1]));
            let d = haversine(from.0, from.1, to.0, to.1);

            numeric.push(NumericEdgeRow {
                from_lon: from.0,
                from_lat: from.1,
                to_lon: to.0,
                to_lat: to.1,
                d,
            });
            ids.push(IdEdgeRow {
                from_id: from_id.clone(),
                to_id: to_id.clone(),
            });

            if !feature.is_oneway() {
                numeric.push(NumericEdgeRow {
                    from_lon: to.0,
                    from_lat: to.1,
                    to_lon: from.0,
                    to_lat: from.1,
                    d,
                });
                ids.push(IdEdgeRow {
                    from_id: to_id.clone(),
                    to_id: from_id.clone(),
                });
            }
        }
    }

    Ok((numeric, ids))
}
