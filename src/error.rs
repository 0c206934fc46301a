use thiserror::Error;

/// Errors returned by this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// Dataset has no rows or no columns.
    #[error("empty input")]
    EmptyInput,

    /// No candidate cluster counts were supplied.
    #[error("no candidate cluster counts")]
    EmptyCandidates,

    /// Invalid parameter value.
    #[error("invalid parameter {name}: {message}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Human-readable explanation.
        message: &'static str,
    },

    /// Requested cluster count is incompatible with the dataset.
    #[error("invalid cluster count: requested {requested}, but dataset has {n_items} items")]
    InvalidClusterCount {
        /// Requested number of clusters.
        requested: usize,
        /// Number of items in the dataset.
        n_items: usize,
    },

    /// Points in a dataset have inconsistent dimensionality.
    #[error("dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch {
        /// Expected dimensionality.
        expected: usize,
        /// Found dimensionality.
        found: usize,
    },

    /// Dataset contains NaN or an infinity.
    #[error("non-finite value at row {row}, column {col}")]
    NonFiniteValue {
        /// Row index of the offending value.
        row: usize,
        /// Column index of the offending value.
        col: usize,
    },

    /// K-means hit its iteration limit while convergence was required.
    #[error("k-means with k={k} did not converge within {max_iter} iterations")]
    NotConverged {
        /// Requested number of clusters.
        k: usize,
        /// Iteration limit that was reached.
        max_iter: usize,
    },

    /// The clustering collaborator failed for one candidate cluster count.
    #[error("clustering failed for k={k}: {source}")]
    ClusteringFailed {
        /// Candidate cluster count that failed.
        k: usize,
        /// Underlying collaborator error.
        #[source]
        source: Box<Error>,
    },

    /// The caller raised the cancellation flag.
    #[error("estimation cancelled")]
    Cancelled,

    /// Reading a configuration file failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// A configuration document could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_yaml::Error),
}

impl Error {
    /// True for malformed arguments detected before any clustering happens.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            Error::EmptyInput
                | Error::EmptyCandidates
                | Error::InvalidParameter { .. }
                | Error::InvalidClusterCount { .. }
                | Error::DimensionMismatch { .. }
                | Error::NonFiniteValue { .. }
        )
    }
}

/// Result type used by this crate.
pub type Result<T> = std::result::Result<T, Error>;
