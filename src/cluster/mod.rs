//! The clustering collaborator behind the estimator.
//!
//! The estimator only needs a hard assignment of points to `k` centers plus the
//! centers themselves. [`Clustering`] captures that contract and
//! [`ClusteringResult`] is its output; any algorithm that can honor it can be
//! plugged in.
//!
//! ## K-means
//!
//! [`Kmeans`] is the built-in implementation: assign each point to the nearest
//! centroid, move each centroid to the mean of its points, repeat.
//!
//! **Objective**: minimize within-cluster sum of squares:
//!
//! ```text
//! J = Σ_k Σ_{x ∈ C_k} ||x - μ_k||²
//! ```
//!
//! Seeding uses k-means++ (Arthur & Vassilvitskii, 2007), drawing from a
//! `StdRng` seeded with the caller's seed. There is no hidden global RNG, so a
//! fit is reproducible from `(data, k, seed)` alone.
//!
//! ## Usage
//!
//! ```rust
//! use mdlk::cluster::{Clustering, Kmeans};
//! use mdlk::Matrix;
//!
//! let data = Matrix::from_rows(vec![
//!     vec![0.0, 0.0],
//!     vec![0.1, 0.1],
//!     vec![10.0, 10.0],
//!     vec![10.1, 10.1],
//! ])
//! .unwrap();
//!
//! let result = Kmeans::new().cluster(&data, 2, 42).unwrap();
//! assert_eq!(result.assignment[0], result.assignment[1]); // First two together
//! assert_ne!(result.assignment[0], result.assignment[2]); // Separate from last two
//! ```

mod kmeans;
mod traits;
pub(crate) mod util;

pub use kmeans::{Kmeans, KmeansFit};
pub use traits::{Clustering, ClusteringResult};
