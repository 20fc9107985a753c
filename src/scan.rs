//! Candidate generation: projected-space bound and windowed scan.

use std::cmp::Ordering;

use ndarray::Array2;

use crate::verify::Method;

/// Projected squared-distance gate: a pair whose projected squared distance
/// exceeds this cannot meet the true threshold.
///
/// Orthogonal projection cannot increase Euclidean distance, so a true
/// Euclidean distance ≤ t caps the projected squared distance at t². The
/// same gate holds for Manhattan because ‖z‖₂ ≤ ‖z‖₁: a pair within t in
/// l1 is within t in l2 as well. Loose for Manhattan (extra candidates),
/// never lossy.
pub(crate) fn projected_bound(method: Method, threshold: f64) -> f64 {
    match method {
        Method::Euclidean => threshold * threshold,
        Method::Manhattan => threshold * threshold,
    }
}

/// Candidate pairs plus the longest-run diagnostic.
pub(crate) struct ScanOutcome {
    /// Index pairs (i < j) surviving the projected gate.
    pub candidates: Vec<(usize, usize)>,
    /// Longest stretch of sort-adjacent columns within the bound of their
    /// immediate neighbor; counted in columns.
    pub longest_run: usize,
}

/// Windowed scan over columns sorted by their leading coordinate.
///
/// `coords` is (n × p), row per column. A single coordinate's squared
/// difference can never exceed the full projected squared distance, so the
/// leading-coordinate gap is a valid pre-filter: once the gap alone breaks
/// the bound, sortedness makes every later column strictly worse and the
/// window closes. Ties sort by original index, keeping the scan
/// deterministic.
pub(crate) fn scan_candidates(coords: &Array2<f64>, normlim: f64) -> ScanOutcome {
    let n = coords.nrows();
    let lead = coords.column(0);

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_unstable_by(|&i, &j| {
        lead[i]
            .partial_cmp(&lead[j])
            .unwrap_or(Ordering::Equal)
            .then(i.cmp(&j))
    });

    let mut candidates = Vec::new();
    for a in 0..n {
        let i = order[a];
        for &j in &order[a + 1..] {
            let gap = lead[j] - lead[i];
            if gap * gap > normlim {
                break;
            }
            if projected_sq_dist(coords, i, j) <= normlim {
                candidates.push(if i < j { (i, j) } else { (j, i) });
            }
        }
    }

    let mut longest = usize::from(n > 0);
    let mut run = longest;
    for w in 1..n {
        if projected_sq_dist(coords, order[w - 1], order[w]) <= normlim {
            run += 1;
        } else {
            run = 1;
        }
        longest = longest.max(run);
    }

    ScanOutcome {
        candidates,
        longest_run: longest,
    }
}

#[inline]
fn projected_sq_dist(coords: &Array2<f64>, i: usize, j: usize) -> f64 {
    coords
        .row(i)
        .iter()
        .zip(coords.row(j).iter())
        .map(|(a, b)| {
            let d = a - b;
            d * d
        })
        .sum()
}
