//! nearcols: find all pairs of near-duplicate matrix columns at or below a
//! distance threshold, without the full O(n²) pairwise distance matrix.
//! Assumptions:
//! - `a` is dense, real-valued; columns are the unit of comparison.
//! Pipeline (Halko–Martinsson–Tropp range finder + small SVD core):
//! 1) Q = subspace_iteration_full(A, rank = p + oversample, nbiter = q)   (annembed/lax)
//! 2) B = Qᵀ * A                  (sketch × n core)
//! 3) Small SVD (nalgebra):  B = U Σ Vᵀ   (Σ sorted ↓), truncate to p
//! 4) Coordinates = (Σ_p Vᵀ_p)ᵀ   (n × p; row distances never exceed true l2 distances)
//! 5) normlim = t²; sort columns by the leading coordinate
//! 6) Windowed scan emits candidate pairs within the projected bound
//! 7) Exact re-check of candidates on the full columns (serial or rayon)
//!
//! Every pair with true distance ≤ t survives to the output: the projected
//! gate only ever over-admits, and the exact re-check removes the excess.

use ndarray::parallel::prelude::*;
use ndarray::{Array2, Axis};
use std::time::Instant;

use log::debug;

mod error;
mod project;
mod scan;
mod verify;

pub use error::ScanError;
pub use project::{project_columns, Projection, SvdParams};
pub use verify::{Filter, Method, NearPair};

/// Options for a near-column scan.
#[derive(Clone, Copy, Debug)]
pub struct ScanOptions {
    /// Distance threshold; pairs at or below it are reported. `None`
    /// derives the minimum per-column norm under the selected metric.
    pub threshold: Option<f64>,
    /// Projected rank p (reduced automatically for tiny matrices).
    pub rank: usize,
    /// Verification strategy.
    pub filter: Filter,
    /// Distance metric.
    pub method: Method,
    /// Pass-through parameters for the factorization stage.
    pub svd: SvdParams,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            threshold: None,
            rank: 10,
            filter: Filter::Distributed,
            method: Method::Euclidean,
            svd: SvdParams::default(),
        }
    }
}

/// Result of a scan: verified pairs plus screening diagnostics.
#[derive(Clone, Debug)]
pub struct ScanResult {
    /// Verified pairs (i < j) with their true distances.
    pub pairs: Vec<NearPair>,
    /// Longest stretch of sort-adjacent columns within the projected bound
    /// of their immediate neighbor; a clustering diagnostic.
    pub longest_run: usize,
    /// Number of candidate pairs that survived the projected-space gate.
    pub candidates: usize,
    /// Wall time of the factorization stage, seconds.
    pub svd_time: f64,
    /// Wall time of the whole call, seconds.
    pub total_time: f64,
}

impl ScanResult {
    /// Verified pairs as a k×3 table: column index, column index, distance.
    pub fn indices(&self) -> Array2<f64> {
        let mut out = Array2::<f64>::zeros((self.pairs.len(), 3));
        for (r, p) in self.pairs.iter().enumerate() {
            out[[r, 0]] = p.i as f64;
            out[[r, 1]] = p.j as f64;
            out[[r, 2]] = p.distance;
        }
        out
    }
}

/// Find all pairs of columns of `a` within `opts.threshold` of each other
/// under `opts.method`.
///
/// The projected gate is a necessary condition only, so it may admit pairs
/// the exact re-check rejects, but it never drops a pair whose true
/// distance meets the threshold.
pub fn near_columns(a: &Array2<f64>, opts: &ScanOptions) -> Result<ScanResult, ScanError> {
    let start = Instant::now();

    if opts.rank == 0 {
        return Err(ScanError::InvalidArgument("rank must be > 0".into()));
    }
    if let Some(t) = opts.threshold {
        if !(t > 0.0) {
            return Err(ScanError::InvalidArgument(format!(
                "threshold must be > 0, got {t}"
            )));
        }
    }
    let threshold = opts
        .threshold
        .unwrap_or_else(|| min_column_norm(a, opts.method));

    let svd_start = Instant::now();
    let projection = project_columns(a, opts.rank, &opts.svd)?;
    let svd_time = svd_start.elapsed().as_secs_f64();

    let normlim = scan::projected_bound(opts.method, threshold);
    let outcome = scan::scan_candidates(&projection.coordinates, normlim);
    debug!(
        "screened {} columns at t = {threshold}: {} candidates, longest run {}",
        a.ncols(),
        outcome.candidates.len(),
        outcome.longest_run
    );

    let pairs = verify::verify_pairs(a, &outcome.candidates, opts.method, threshold, opts.filter);
    debug!(
        "{} of {} candidates verified",
        pairs.len(),
        outcome.candidates.len()
    );

    Ok(ScanResult {
        pairs,
        longest_run: outcome.longest_run,
        candidates: outcome.candidates.len(),
        svd_time,
        total_time: start.elapsed().as_secs_f64(),
    })
}

/// Minimum per-column norm under `method`, the derived threshold default.
/// Parallelized by columns.
fn min_column_norm(a: &Array2<f64>, method: Method) -> f64 {
    a.axis_iter(Axis(1))
        .into_par_iter()
        .map(|col| method.norm(col))
        .reduce(|| f64::INFINITY, f64::min)
}
