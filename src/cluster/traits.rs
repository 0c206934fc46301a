use crate::error::{Error, Result};
use crate::matrix::Matrix;

/// Hard assignment of points to `k` centers, as produced by a [`Clustering`].
#[derive(Clone, Debug, PartialEq)]
pub struct ClusteringResult {
    /// Cluster index per point, each in `[0, k)`.
    pub assignment: Vec<usize>,
    /// One center per cluster, each with the dataset's dimensionality.
    pub centers: Vec<Vec<f64>>,
}

impl ClusteringResult {
    /// Number of clusters.
    pub fn k(&self) -> usize {
        self.centers.len()
    }

    /// Check the result against the dataset shape and the requested `k`.
    pub fn validate(&self, n_items: usize, dim: usize, k: usize) -> Result<()> {
        if self.centers.len() != k {
            return Err(Error::InvalidParameter {
                name: "centers",
                message: "center count differs from requested k",
            });
        }
        if self.assignment.len() != n_items {
            return Err(Error::DimensionMismatch {
                expected: n_items,
                found: self.assignment.len(),
            });
        }
        if let Some(center) = self.centers.iter().find(|c| c.len() != dim) {
            return Err(Error::DimensionMismatch {
                expected: dim,
                found: center.len(),
            });
        }
        if self.assignment.iter().any(|&label| label >= k) {
            return Err(Error::InvalidParameter {
                name: "assignment",
                message: "label out of range [0, k)",
            });
        }
        Ok(())
    }
}

/// A clustering algorithm that partitions a dataset into a requested number of clusters.
///
/// Implementations must be deterministic for a fixed `(data, k, seed)` and must
/// return an error rather than a partial or invalid result.
pub trait Clustering: Sync {
    /// Partition `data` into `k` clusters using `seed` for any randomness.
    fn cluster(&self, data: &Matrix, k: usize, seed: u64) -> Result<ClusteringResult>;
}
