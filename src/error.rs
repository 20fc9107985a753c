//! Error types for the screening pipeline.

use thiserror::Error;

/// Errors that can occur during a near-column scan.
#[derive(Debug, Error)]
pub enum ScanError {
    /// A caller-supplied argument was rejected before any computation.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The matrix shape cannot support a rank-p factorization, even after
    /// the automatic rank reduction for small column counts.
    #[error("rank {rank} incompatible with {nrows}x{ncols} matrix")]
    Dimension {
        /// Rank requested by the caller
        rank: usize,
        /// Matrix row count
        nrows: usize,
        /// Matrix column count
        ncols: usize,
    },

    /// The SVD of the projected core did not converge. Not retried: the
    /// caller must adjust the rank or the solver tolerance.
    #[error("svd did not converge within {max_niter} iterations")]
    NumericFailure {
        /// Iteration cap the solver was given
        max_niter: usize,
    },
}
