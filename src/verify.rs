//! Exact verification of candidate pairs against the original columns.

use std::str::FromStr;

use ndarray::{Array2, ArrayView1};
use rayon::prelude::*;

use crate::error::ScanError;

/// Distance metric applied to full-dimensional columns.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    /// Root of summed squared differences.
    Euclidean,
    /// Summed absolute differences.
    Manhattan,
}

impl Method {
    /// True distance between two columns.
    pub fn distance(self, x: ArrayView1<'_, f64>, y: ArrayView1<'_, f64>) -> f64 {
        match self {
            Method::Euclidean => x
                .iter()
                .zip(y.iter())
                .map(|(a, b)| {
                    let d = a - b;
                    d * d
                })
                .sum::<f64>()
                .sqrt(),
            Method::Manhattan => x.iter().zip(y.iter()).map(|(a, b)| (a - b).abs()).sum(),
        }
    }

    /// Norm of a single column under this metric.
    pub fn norm(self, x: ArrayView1<'_, f64>) -> f64 {
        match self {
            Method::Euclidean => x.iter().map(|a| a * a).sum::<f64>().sqrt(),
            Method::Manhattan => x.iter().map(|a| a.abs()).sum(),
        }
    }
}

impl FromStr for Method {
    type Err = ScanError;

    /// Unambiguous-prefix match: any non-empty prefix of "euclidean" or
    /// "manhattan", case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim().to_ascii_lowercase();
        let eu = !token.is_empty() && "euclidean".starts_with(&token);
        let man = !token.is_empty() && "manhattan".starts_with(&token);
        match (eu, man) {
            (true, false) => Ok(Method::Euclidean),
            (false, true) => Ok(Method::Manhattan),
            _ => Err(ScanError::InvalidArgument(format!(
                "unrecognized method '{s}' (expected a prefix of 'euclidean' or 'manhattan')"
            ))),
        }
    }
}

/// Verification strategy: how candidate pairs are re-checked.
///
/// Both strategies produce the same verified set; `Distributed` fans the
/// candidate slice out over rayon workers sharing a read-only view of the
/// matrix, and is the wrong choice only when the matrix cannot be shared
/// in-process.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Filter {
    /// One candidate at a time, in generation order.
    Local,
    /// Candidates partitioned across rayon workers.
    Distributed,
}

impl FromStr for Filter {
    type Err = ScanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim().to_ascii_lowercase();
        let loc = !token.is_empty() && "local".starts_with(&token);
        let dist = !token.is_empty() && "distributed".starts_with(&token);
        match (loc, dist) {
            (true, false) => Ok(Filter::Local),
            (false, true) => Ok(Filter::Distributed),
            _ => Err(ScanError::InvalidArgument(format!(
                "unrecognized filter '{s}' (expected a prefix of 'local' or 'distributed')"
            ))),
        }
    }
}

/// A verified pair of column indices (`i < j`) with its true distance.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NearPair {
    /// Lower column index.
    pub i: usize,
    /// Higher column index.
    pub j: usize,
    /// True distance under the scan's metric.
    pub distance: f64,
}

/// Re-check candidates on the full columns, keeping pairs at or below the
/// threshold. The rayon collect is index-preserving, so both strategies
/// return the same pairs in the same order.
pub(crate) fn verify_pairs(
    a: &Array2<f64>,
    candidates: &[(usize, usize)],
    method: Method,
    threshold: f64,
    filter: Filter,
) -> Vec<NearPair> {
    let check = |&(i, j): &(usize, usize)| -> Option<NearPair> {
        let d = method.distance(a.column(i), a.column(j));
        (d <= threshold).then(|| NearPair { i, j, distance: d })
    };
    match filter {
        Filter::Local => candidates.iter().filter_map(check).collect(),
        Filter::Distributed => candidates.par_iter().filter_map(check).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr2;

    #[test]
    fn euclidean_distance() {
        let a = arr2(&[[0.0, 3.0], [0.0, 4.0]]);
        let d = Method::Euclidean.distance(a.column(0), a.column(1));
        assert!((d - 5.0).abs() < 1e-12);
    }

    #[test]
    fn manhattan_distance() {
        let a = arr2(&[[0.0, 3.0], [0.0, -4.0]]);
        let d = Method::Manhattan.distance(a.column(0), a.column(1));
        assert!((d - 7.0).abs() < 1e-12);
    }

    #[test]
    fn norms() {
        let a = arr2(&[[3.0], [-4.0]]);
        assert!((Method::Euclidean.norm(a.column(0)) - 5.0).abs() < 1e-12);
        assert!((Method::Manhattan.norm(a.column(0)) - 7.0).abs() < 1e-12);
    }

    #[test]
    fn method_prefix_parse() {
        assert_eq!("euclidean".parse::<Method>().unwrap(), Method::Euclidean);
        assert_eq!("E".parse::<Method>().unwrap(), Method::Euclidean);
        assert_eq!("man".parse::<Method>().unwrap(), Method::Manhattan);
        assert!("".parse::<Method>().is_err());
        assert!("minkowski".parse::<Method>().is_err());
    }

    #[test]
    fn filter_prefix_parse() {
        assert_eq!("l".parse::<Filter>().unwrap(), Filter::Local);
        assert_eq!("dist".parse::<Filter>().unwrap(), Filter::Distributed);
        assert!("remote".parse::<Filter>().is_err());
        assert!("  ".parse::<Filter>().is_err());
    }

    #[test]
    fn strategies_agree_on_fixed_candidates() {
        let a = arr2(&[
            [0.0, 0.1, 5.0, 0.05],
            [1.0, 1.0, -2.0, 1.1],
            [2.0, 2.2, 0.0, 2.0],
        ]);
        let candidates = [(0, 1), (0, 2), (0, 3), (1, 3), (2, 3)];
        let local = verify_pairs(&a, &candidates, Method::Euclidean, 0.5, Filter::Local);
        let dist = verify_pairs(&a, &candidates, Method::Euclidean, 0.5, Filter::Distributed);
        assert_eq!(local, dist);
        assert!(local.iter().all(|p| p.distance <= 0.5));
        assert!(local.iter().any(|p| (p.i, p.j) == (0, 1)));
        assert!(!local.iter().any(|p| (p.i, p.j) == (0, 2)));
    }
}
