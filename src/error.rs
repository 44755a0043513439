use crate::graph::VertexId;

/// Errors surfaced at the crate's API boundary (spec.md §7).
///
/// Every top-level operation fails fast with one of these variants and never
/// partially commits state to the caller: validation errors (`MalformedInput`,
/// `EmptyGraph`, `UnknownVertex`) are the caller's fault, the rest are
/// internal invariant violations that should never occur on a well-formed,
/// component-pruned graph.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("malformed input: {0}")]
    MalformedInput(String),

    #[error("graph has no vertices or no edges")]
    EmptyGraph,

    #[error("vertex {0} is not present in the graph")]
    UnknownVertex(VertexId),

    #[error("(I - Q) is not invertible; this is an internal invariant violation")]
    SingularTransition,

    #[error("RSP iteration did not converge within {max_iter} iterations (final residual {residual})")]
    NonConvergence { residual: f64, max_iter: usize },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
