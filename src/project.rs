//! Rank-p projection of matrix columns via randomized truncated SVD.

use ndarray::{s, Array1, Array2, Axis};

use log::debug;

// randomized subspace iteration (range finder) from annembed (uses lax under the hood)
use annembed::tools::svdapprox::subspace_iteration_full;

// small SVD core (fast, the core has only `sketch` rows)
use nalgebra as na;

use crate::error::ScanError;

/// Pass-through parameters for the factorization stage.
#[derive(Clone, Copy, Debug)]
pub struct SvdParams {
    /// Oversampling added to the rank when sketching, typically >= 2.
    pub oversample: usize,
    /// Number of subspace (power) iterations q (QR steps). Typical: 1–3.
    pub nbiter: usize,
    /// Convergence tolerance for the small-core SVD.
    pub eps: f64,
    /// Iteration cap for the small-core SVD; 0 means uncapped.
    pub max_niter: usize,
}

impl Default for SvdParams {
    fn default() -> Self {
        Self {
            oversample: 8,
            nbiter: 2,
            eps: f64::EPSILON,
            max_niter: 0,
        }
    }
}

/// Rank-p image of the input columns.
#[derive(Debug)]
pub struct Projection {
    /// Retained singular values, sorted descending.
    pub singular_values: Array1<f64>,
    /// Left singular vectors: (m × p).
    pub u: Array2<f64>,
    /// Per-column coordinates in the retained subspace: (n × p), row j for
    /// column j. Rows are an orthogonal image of `Qᵀ·column`, so distances
    /// between rows never exceed the true Euclidean column distances.
    pub coordinates: Array2<f64>,
}

/// Shrink a requested rank to fit a matrix with `ncols` columns.
/// Tiny matrices get a reduced-rank approximation rather than an error.
pub(crate) fn effective_rank(rank: usize, ncols: usize) -> usize {
    if ncols < rank {
        (ncols / 2).saturating_sub(1).max(1)
    } else {
        rank
    }
}

/// Factorize `a` at (reduced) rank p and lay the columns out in the
/// retained subspace.
///
/// Pipeline: range finder sketch `Q` (m × r), small core `B = Qᵀ·A`
/// (r × n), SVD of the core with nalgebra, truncate to p, coordinates
/// `(Σ_p Vᵀ_p)ᵀ`.
pub fn project_columns(
    a: &Array2<f64>,
    rank: usize,
    params: &SvdParams,
) -> Result<Projection, ScanError> {
    let (m, n) = a.dim();
    let dim = m.min(n);
    if dim == 0 {
        return Err(ScanError::Dimension {
            rank,
            nrows: m,
            ncols: n,
        });
    }

    let p = effective_rank(rank, n).min(dim);
    if p != rank {
        debug!("rank reduced from {rank} to {p} for a {m}x{n} matrix");
    }
    let sketch = (p + params.oversample).min(dim).max(p);

    // Q: (m × sketch), orthonormal columns spanning an approximate range of A
    let q = subspace_iteration_full::<f64>(a, sketch, params.nbiter);

    // small core: its SVD completes the factorization of A ≈ Q·B
    let b = q.t().dot(a);
    let (sigma, u_small, vt) = small_svd(&b, params)?;

    // truncate to the requested rank
    let k = p.min(sigma.len());
    let sigma_k = sigma.slice_move(s![..k]);
    let u_small_k = u_small.slice_move(s![.., ..k]);
    let vt_k = vt.slice_move(s![..k, ..]);

    // U ≈ Q * U_small  => (m × k)
    let u_left = q.dot(&u_small_k);

    // Coordinates = (Σ_k Vᵀ_k)ᵀ  => (n × k)
    let mut coords = vt_k.t().to_owned();
    for (mut col, sv) in coords.axis_iter_mut(Axis(1)).zip(sigma_k.iter()) {
        col *= *sv;
    }

    Ok(Projection {
        singular_values: sigma_k,
        u: u_left,
        coordinates: coords,
    })
}

/// SVD of the small core using nalgebra, singular values descending.
/// Returns (σ, U columns, Vᵀ rows).
fn small_svd(
    b: &Array2<f64>,
    params: &SvdParams,
) -> Result<(Array1<f64>, Array2<f64>, Array2<f64>), ScanError> {
    let (r, n) = b.dim();

    // nalgebra expects column-major DMatrix; build from row slice is fine.
    let dm = na::DMatrix::<f64>::from_row_slice(r, n, b.as_slice().expect("contiguous"));
    let svd = na::SVD::try_new(dm, true, true, params.eps, params.max_niter).ok_or(
        ScanError::NumericFailure {
            max_niter: params.max_niter,
        },
    )?;
    let u = svd.u.expect("svd u");
    let v_t = svd.v_t.expect("svd vt");
    let k = svd.singular_values.len();

    // Copy out
    let mut sigma = Array1::<f64>::zeros(k);
    for i in 0..k {
        sigma[i] = svd.singular_values[i];
    }
    let mut u_nd = Array2::<f64>::zeros((r, k));
    for c in 0..k {
        for row in 0..r {
            u_nd[[row, c]] = u[(row, c)];
        }
    }
    let mut vt_nd = Array2::<f64>::zeros((k, n));
    for c in 0..n {
        for row in 0..k {
            vt_nd[[row, c]] = v_t[(row, c)];
        }
    }
    Ok((sigma, u_nd, vt_nd))
}
