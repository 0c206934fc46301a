//! Cluster-count selection by approximate description length.
//!
//! `mdlk` scores candidate cluster counts for k-means with a crude two-part MDL
//! cost: the bits needed to store the cluster centers plus the cost of encoding
//! every point relative to its center. The candidate with the smallest total is
//! the estimate.
//!
//! - [`Matrix`]: the dataset, rows of equal length.
//! - [`cluster`]: the clustering contract and a seeded k-means implementation.
//! - [`ComplexityEstimator`]: runs the clusterer per candidate and scores it.
//! - [`ComplexityTable`]: the per-candidate results and [`ComplexityTable::best_k`].
//!
//! ```rust
//! use mdlk::{ComplexityEstimator, Matrix, ModelUnit};
//!
//! let data = Matrix::from_rows(vec![
//!     vec![0.0, 0.0],
//!     vec![0.2, 0.1],
//!     vec![9.8, 10.0],
//!     vec![10.0, 10.1],
//! ])
//! .unwrap();
//!
//! let table = ComplexityEstimator::new()
//!     .with_model_unit(ModelUnit::Bytes)
//!     .estimate(&data, &[1, 2, 3], 42)
//!     .unwrap();
//! println!("{table}");
//! assert_eq!(table.best_k(), Some(2));
//! ```

#![forbid(unsafe_code)]

pub mod cluster;
pub mod config;
pub mod error;
pub mod estimate;
pub mod matrix;
pub mod quantize;
pub mod table;

pub use cluster::{Clustering, ClusteringResult, Kmeans, KmeansFit};
pub use config::EstimatorConfig;
pub use error::{Error, Result};
pub use estimate::{
    model_complexity, points_complexity, ComplexityEstimator, FailurePolicy, LabelCost, LogBase,
    ModelUnit,
};
pub use matrix::Matrix;
pub use quantize::{encode_centers, FloatPrecision};
pub use table::{ComplexityRecord, ComplexityTable, SkippedK};
