//! Randomised-shortest-path (RSP) engine (spec.md §4.8): Saerens-style
//! entropy-regularised traversal probabilities. Grounded in
//! `original_source/src/router-mp.h`'s `Graphmp` (`d_mat`/`q_mat`/`n_mat`/
//! `h_vec`/`x_vec`/`v_vec`), re-expressed over `ndarray` with a hand-written
//! Gauss-Jordan inverse in place of the original's Armadillo/LAPACK
//! dependency (see DESIGN.md).

use crate::error::{Error, Result};
use crate::graph::{GraphStore, VertexId};
use indexmap::IndexMap;
use log::{debug, trace};
use ndarray::Array2;

/// Convergence parameters for the fixed-point iteration, with the spec's
/// documented defaults.
#[derive(Debug, Clone, Copy)]
pub struct RspConfig {
    pub tol: f64,
    pub max_iter: usize,
}

impl Default for RspConfig {
    fn default() -> Self {
        Self {
            tol: 1e-6,
            max_iter: 1_000_000,
        }
    }
}

/// The converged (or cap-exhausted) transition matrix, trimmed of the
/// virtual source row/column, plus the vertex↔index mapping needed to read
/// individual edge probabilities out of it.
#[derive(Debug)]
pub struct RspResult {
    /// Row/column `i` is vertex `i` for `i < vertex_index.len()`; the last
    /// row/column is the virtual absorbing sink.
    pub q: Array2<f64>,
    pub vertex_index: IndexMap<VertexId, usize>,
    pub iterations: usize,
    pub residual: f64,
}

impl RspResult {
    /// `Q[from, to]`, or `None` if either vertex is unknown.
    pub fn edge_probability(&self, from: &VertexId, to: &VertexId) -> Option<f64> {
        let i = *self.vertex_index.get(from)?;
        let j = *self.vertex_index.get(to)?;
        Some(self.q[[i, j]])
    }
}

/// Runs the RSP fixed point for `source` -> `target` at entropy weight
/// `eta`, over every live edge of `graph`.
pub fn route_probabilities(
    graph: &GraphStore,
    source: &VertexId,
    target: &VertexId,
    eta: f64,
    config: &RspConfig,
) -> Result<RspResult> {
    if graph.vertices.is_empty() {
        return Err(Error::EmptyGraph);
    }
    if !graph.vertices.contains_key(source) {
        return Err(Error::UnknownVertex(source.clone()));
    }
    if !graph.vertices.contains_key(target) {
        return Err(Error::UnknownVertex(target.clone()));
    }

    let vertex_index: IndexMap<VertexId, usize> = graph
        .vertices
        .keys()
        .cloned()
        .enumerate()
        .map(|(i, v)| (v, i))
        .collect();
    let n = vertex_index.len();
    let source_idx = vertex_index[source];
    let target_idx = vertex_index[target];
    // Augmented layout: 0 = virtual source, 1..=n = real vertices, n+1 =
    // virtual absorbing sink.
    let size = n + 2;

    let d = build_d_matrix(graph, &vertex_index, source_idx, size);
    let q0 = build_q_matrix(graph, &vertex_index, source_idx, target, target_idx, n, size);
    let identity = Array2::<f64>::eye(size);
    let n_mat = invert(&(&identity - &q0))?;

    let mut q = q0;
    let mut iterations = 0usize;
    let mut residual = f64::INFINITY;

    loop {
        let h = h_vector(&q);
        let x = n_mat.dot(&h);
        let dq = row_weighted_sum(&q, &d);
        let v = n_mat.dot(&dq);

        let q_next = fixed_point_update(&q, &v, &x, eta);
        residual = (&q_next - &q).mapv(f64::abs).sum();
        q = q_next;
        iterations += 1;

        trace!("rsp iteration {iterations}: residual {residual}");

        if residual < config.tol {
            break;
        }
        if iterations >= config.max_iter {
            return Err(Error::NonConvergence {
                residual,
                max_iter: config.max_iter,
            });
        }
    }

    debug!("rsp converged after {iterations} iterations, residual {residual}");

    // Trim the virtual source row/column (index 0); re-index 1..=n+1 to
    // 0..=n so vertex_index stays valid against the trimmed matrix.
    let trimmed = q.slice(ndarray::s![1.., 1..]).to_owned();

    Ok(RspResult {
        q: trimmed,
        vertex_index,
        iterations,
        residual,
    })
}

fn build_d_matrix(
    graph: &GraphStore,
    vertex_index: &IndexMap<VertexId, usize>,
    source_idx: usize,
    size: usize,
) -> Array2<f64> {
    let mut d = Array2::<f64>::from_elem((size, size), f64::INFINITY);
    for k in 0..size {
        d[[k, k]] = 0.0;
    }
    for edge in graph.live_edges() {
        let i = vertex_index[&edge.from] + 1;
        let j = vertex_index[&edge.to] + 1;
        d[[i, j]] = edge.d_weighted;
    }
    for j in 0..size {
        d[[0, j]] = f64::INFINITY;
    }
    d[[0, source_idx + 1]] = 1.0;
    d
}

fn build_q_matrix(
    graph: &GraphStore,
    vertex_index: &IndexMap<VertexId, usize>,
    source_idx: usize,
    target: &VertexId,
    target_idx: usize,
    n: usize,
    size: usize,
) -> Array2<f64> {
    let mut q = Array2::<f64>::zeros((size, size));
    q[[0, source_idx + 1]] = 1.0;

    for (vid, &vi) in vertex_index {
        let vtx = graph.get_vertex(vid).expect("indexed vertex must exist");
        let k_i = vtx.degree_out();
        if k_i == 0 {
            continue;
        }
        let share = 1.0 / k_i as f64;
        for nb in &vtx.out_neighbours {
            let j = vertex_index[nb] + 1;
            q[[vi + 1, j]] = share;
        }
    }

    let k_end = graph
        .get_vertex(target)
        .expect("target vertex must exist")
        .degree_out();
    let scale = k_end as f64 / (k_end as f64 + 1.0);
    for j in 0..size {
        q[[target_idx + 1, j]] *= scale;
    }
    q[[target_idx + 1, n + 1]] = 1.0 / (k_end as f64 + 1.0);

    q
}

/// `h_i = -Σ_j Q[i,j] log Q[i,j]`, with `0 log 0 = 0`.
fn h_vector(q: &Array2<f64>) -> ndarray::Array1<f64> {
    q.map_axis(ndarray::Axis(1), |row| {
        -row.iter()
            .map(|&p| if p > 0.0 { p * p.ln() } else { 0.0 })
            .sum::<f64>()
    })
}

/// `diag(Q Dᵀ)[i] = Σ_j Q[i,j] D[i,j]`, treating non-finite `D` entries as 0.
fn row_weighted_sum(q: &Array2<f64>, d: &Array2<f64>) -> ndarray::Array1<f64> {
    let n = q.nrows();
    let mut out = ndarray::Array1::<f64>::zeros(n);
    for i in 0..n {
        let mut acc = 0.0;
        for j in 0..n {
            let dij = d[[i, j]];
            if dij.is_finite() {
                acc += q[[i, j]] * dij;
            }
        }
        out[i] = acc;
    }
    out
}

fn fixed_point_update(q: &Array2<f64>, v: &ndarray::Array1<f64>, x: &ndarray::Array1<f64>, eta: f64) -> Array2<f64> {
    let n = q.nrows();
    let mut next = Array2::<f64>::zeros((n, n));
    for r in 0..n {
        let mut row_sum = 0.0;
        for j in 0..n {
            let val = ((q[[r, j]] + v[j]) / eta + x[j]).exp();
            next[[r, j]] = val;
            row_sum += val;
        }
        if row_sum > 0.0 {
            for j in 0..n {
                next[[r, j]] /= row_sum;
            }
        }
    }
    next
}

/// Gauss-Jordan elimination with partial pivoting. `O(n^3)`, fine for the
/// per-request matrix sizes this engine deals with; avoids pulling in a
/// LAPACK-backed crate for a single inversion (see DESIGN.md).
fn invert(mat: &Array2<f64>) -> Result<Array2<f64>> {
    let n = mat.nrows();
    let mut aug = Array2::<f64>::zeros((n, 2 * n));
    aug.slice_mut(ndarray::s![.., ..n]).assign(mat);
    for i in 0..n {
        aug[[i, n + i]] = 1.0;
    }

    for col in 0..n {
        let pivot_row = (col..n)
            .max_by(|&a, &b| aug[[a, col]].abs().partial_cmp(&aug[[b, col]].abs()).unwrap())
            .unwrap();
        if aug[[pivot_row, col]].abs() < 1e-12 {
            return Err(Error::SingularTransition);
        }
        if pivot_row != col {
            for j in 0..2 * n {
                aug.swap([col, j], [pivot_row, j]);
            }
        }
        let pivot = aug[[col, col]];
        for j in 0..2 * n {
            aug[[col, j]] /= pivot;
        }
        for row in 0..n {
            if row == col {
                continue;
            }
            let factor = aug[[row, col]];
            if factor == 0.0 {
                continue;
            }
            for j in 0..2 * n {
                aug[[row, j]] -= factor * aug[[col, j]];
            }
        }
    }

    Ok(aug.slice(ndarray::s![.., n..]).to_owned())
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
    fn gauss_jordan_inverse_satisfies_n_times_i_minus_q() {
        let mat = ndarray::arr2(&[[2.0, 0.0], [0.0, 4.0]]);
        let inv = invert(&mat).unwrap();
        let identity = Array2::<f64>::eye(2);
        let product = inv.dot(&mat);
        for ((i, j), &v) in product.indexed_iter() {
            assert_relative_eq!(v, identity[[i, j]], epsilon = 1e-9);
        }
    }

    #[test]
    fn singular_matrix_is_rejected() {
        let mat = ndarray::arr2(&[[1.0, 2.0], [2.0, 4.0]]);
        assert!(matches!(invert(&mat), Err(Error::SingularTransition)));
    }

    #[test]
    fn row_sums_are_valid_probability_distributions() {
        let mut g = GraphStore::new();
        edge(&mut g, "a", "b", 1.0);
        edge(&mut g, "a", "c", 1.0);
        edge(&mut g, "b", "d", 1.0);
        edge(&mut g, "c", "d", 1.0);

        let config = RspConfig::default();
        let result = route_probabilities(&g, &VertexId::from("a"), &VertexId::from("d"), 1.0, &config).unwrap();

        for row in result.q.rows() {
            let sum: f64 = row.sum();
            assert!(sum.abs() < 1e-6 || (sum - 1.0).abs() < 10.0 * config.tol);
        }
    }

    #[test]
    fn unknown_vertex_is_an_error() {
        let mut g = GraphStore::new();
        edge(&mut g, "a", "b", 1.0);
        let config = RspConfig::default();
        let result = route_probabilities(&g, &VertexId::from("a"), &VertexId::from("z"), 1.0, &config);
        assert!(matches!(result, Err(Error::UnknownVertex(_))));
    }

    #[test]
    fn empty_graph_is_an_error() {
        let g = GraphStore::new();
        let config = RspConfig::default();
        let result = route_probabilities(&g, &VertexId::from("a"), &VertexId::from("b"), 1.0, &config);
        assert!(matches!(result, Err(Error::EmptyGraph)));
    }

    #[test]
    fn non_convergence_reports_the_residual() {
        let mut g = GraphStore::new();
        edge(&mut g, "a", "b", 1.0);
        edge(&mut g, "b", "c", 1.0);
        let config = RspConfig { tol: 1e-12, max_iter: 1 };
        let result = route_probabilities(&g, &VertexId::from("a"), &VertexId::from("c"), 1.0, &config);
        match result {
            Err(Error::NonConvergence { max_iter, .. }) => assert_eq!(max_iter, 1),
            other => panic!("expected NonConvergence, got {other:?}"),
        }
    }
}
