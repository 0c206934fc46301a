//! K-means with k-means++ seeding and Lloyd iterations.
//!
//! Every random choice is drawn from a `StdRng` seeded with the caller's seed, so a
//! fit is a pure function of `(data, k, seed)` and the configured limits.

use super::traits::{Clustering, ClusteringResult};
use super::util::{euclidean, nearest_center};
use crate::error::{Error, Result};
use crate::matrix::Matrix;
use log::trace;
use rand::prelude::*;
use serde::{Deserialize, Serialize};

/// K-means clusterer parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Kmeans {
    /// Maximum number of Lloyd iterations.
    pub max_iter: usize,
    /// Convergence threshold on the largest center shift (Euclidean).
    pub tol: f64,
    /// Treat hitting `max_iter` without converging as an error.
    pub require_convergence: bool,
}

/// Output of [`Kmeans::fit`].
#[derive(Clone, Debug)]
pub struct KmeansFit {
    /// Final centers, one per cluster.
    pub centers: Vec<Vec<f64>>,
    /// Nearest-center label per point.
    pub labels: Vec<usize>,
    /// Sum of squared distances from points to their centers.
    pub inertia: f64,
    /// Lloyd iterations performed.
    pub n_iter: usize,
    /// Whether the stopping criterion was met before `max_iter`.
    pub converged: bool,
}

impl Default for Kmeans {
    fn default() -> Self {
        Self {
            max_iter: 300,
            tol: 1e-4,
            require_convergence: false,
        }
    }
}

impl Kmeans {
    /// Create a k-means clusterer with default limits (`max_iter = 300`, `tol = 1e-4`).
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the iteration limit.
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Set the convergence tolerance.
    pub fn with_tol(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }

    /// Fail with [`Error::NotConverged`] instead of returning an unconverged fit.
    pub fn with_require_convergence(mut self, require: bool) -> Self {
        self.require_convergence = require;
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.max_iter == 0 {
            return Err(Error::InvalidParameter {
                name: "max_iter",
                message: "must be at least 1",
            });
        }
        if !self.tol.is_finite() || self.tol < 0.0 {
            return Err(Error::InvalidParameter {
                name: "tol",
                message: "must be finite and non-negative",
            });
        }
        Ok(())
    }

    /// Fit `k` clusters to `data`.
    pub fn fit(&self, data: &Matrix, k: usize, seed: u64) -> Result<KmeansFit> {
        self.validate()?;
        let n = data.n_rows();
        if k == 0 || k > n {
            return Err(Error::InvalidClusterCount {
                requested: k,
                n_items: n,
            });
        }

        let mut rng = StdRng::seed_from_u64(seed);
        let mut centers = kmeans_plus_plus(data, k, &mut rng)?;

        // usize::MAX forces the first pass to register as a change.
        let mut labels = vec![usize::MAX; n];
        let mut converged = false;
        let mut n_iter = 0;

        for iter in 0..self.max_iter {
            n_iter = iter + 1;

            let mut changed = false;
            for (label, point) in labels.iter_mut().zip(data.rows()) {
                let (nearest, _) = nearest_center(point, &centers);
                if *label != nearest {
                    *label = nearest;
                    changed = true;
                }
            }
            if !changed {
                converged = true;
                break;
            }

            let max_shift = update_centers(data, &labels, &mut centers);
            trace!("k-means k={k} iter={n_iter} max_shift={max_shift:.3e}");
            if max_shift <= self.tol {
                converged = true;
                break;
            }
        }

        if !converged && self.require_convergence {
            return Err(Error::NotConverged {
                k,
                max_iter: self.max_iter,
            });
        }

        // Relabel against the final centers so every point sits with its nearest one.
        let mut inertia = 0.0;
        for (label, point) in labels.iter_mut().zip(data.rows()) {
            let (nearest, dist) = nearest_center(point, &centers);
            *label = nearest;
            inertia += dist * dist;
        }

        Ok(KmeansFit {
            centers,
            labels,
            inertia,
            n_iter,
            converged,
        })
    }
}

impl Clustering for Kmeans {
    fn cluster(&self, data: &Matrix, k: usize, seed: u64) -> Result<ClusteringResult> {
        let fit = self.fit(data, k, seed)?;
        Ok(ClusteringResult {
            assignment: fit.labels,
            centers: fit.centers,
        })
    }
}

/// Pick `k` initial centers with D² weighting.
///
/// Weights are taken relative to the farthest point, so they stay finite at any data
/// scale. Once every remaining point coincides with a chosen center the weights are
/// all zero; the lowest-index point not yet chosen is taken instead.
fn kmeans_plus_plus(data: &Matrix, k: usize, rng: &mut StdRng) -> Result<Vec<Vec<f64>>> {
    let n = data.n_rows();
    let mut chosen = vec![false; n];
    let mut centers = Vec::with_capacity(k);

    let first = rng.random_range(0..n);
    chosen[first] = true;
    centers.push(data.row(first).to_vec());

    let mut min_dist: Vec<f64> = data.rows().map(|p| euclidean(p, &centers[0])).collect();

    while centers.len() < k {
        let farthest = min_dist.iter().copied().fold(0.0, f64::max);
        let next = if farthest > 0.0 && farthest.is_finite() {
            let weights: Vec<f64> = min_dist
                .iter()
                .map(|&d| {
                    let r = d / farthest;
                    r * r
                })
                .collect();
            let total: f64 = weights.iter().sum();
            let mut target = rng.random::<f64>() * total;
            let mut pick = None;
            for (idx, &w) in weights.iter().enumerate() {
                if w <= 0.0 {
                    continue;
                }
                pick = Some(idx);
                if target < w {
                    break;
                }
                target -= w;
            }
            pick
        } else {
            chosen.iter().position(|&c| !c)
        }
        .ok_or(Error::InvalidClusterCount {
            requested: k,
            n_items: n,
        })?;

        chosen[next] = true;
        centers.push(data.row(next).to_vec());
        let center = data.row(next);
        for (d, p) in min_dist.iter_mut().zip(data.rows()) {
            *d = d.min(euclidean(p, center));
        }
    }

    Ok(centers)
}

/// Move each center to the mean of its points and return the largest shift.
/// Empty clusters keep their previous center.
fn update_centers(data: &Matrix, labels: &[usize], centers: &mut [Vec<f64>]) -> f64 {
    let k = centers.len();
    let d = data.n_cols();
    let mut sums = vec![vec![0.0; d]; k];
    let mut counts = vec![0usize; k];

    for (&label, point) in labels.iter().zip(data.rows()) {
        counts[label] += 1;
        for (s, x) in sums[label].iter_mut().zip(point) {
            *s += x;
        }
    }

    let mut max_shift: f64 = 0.0;
    for ((center, sum), &count) in centers.iter_mut().zip(sums).zip(&counts) {
        if count == 0 {
            continue;
        }
        let mean: Vec<f64> = sum.into_iter().map(|s| s / count as f64).collect();
        max_shift = max_shift.max(euclidean(center, &mean));
        *center = mean;
    }
    max_shift
}
