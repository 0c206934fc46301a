use crate::cluster::Kmeans;
use crate::error::Result;
use crate::estimate::{FailurePolicy, LabelCost, LogBase, ModelUnit};
use crate::quantize::FloatPrecision;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Settings for a [`ComplexityEstimator`](crate::ComplexityEstimator) backed by [`Kmeans`].
///
/// Every field is optional in YAML; missing fields take their defaults.
///
/// ```yaml
/// float_precision_bits: 32
/// log_base: e
/// label_cost: uniform
/// model_unit: bits
/// on_failure: skip
/// parallel: true
/// kmeans:
///   max_iter: 100
///   tol: 1.0e-6
///   require_convergence: true
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorConfig {
    /// Width of each stored center coordinate: 16, 32 or 64.
    pub float_precision_bits: FloatPrecision,
    /// `e` or `two`.
    pub log_base: LogBase,
    /// `index`, `uniform` or `none`.
    pub label_cost: LabelCost,
    /// `bits` or `bytes`.
    pub model_unit: ModelUnit,
    /// `abort` or `skip`.
    pub on_failure: FailurePolicy,
    /// Evaluate candidates in parallel.
    pub parallel: bool,
    /// K-means limits.
    pub kmeans: Kmeans,
}

impl EstimatorConfig {
    /// Parse and validate a YAML document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: EstimatorConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Reject settings the estimator cannot run with.
    pub fn validate(&self) -> Result<()> {
        self.kmeans.validate()
    }
}

impl fmt::Display for EstimatorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Estimator configuration:")?;
        writeln!(
            f,
            "  Float precision: {} bits",
            self.float_precision_bits.bits()
        )?;
        writeln!(f, "  Log base: {:?}", self.log_base)?;
        writeln!(f, "  Label cost: {:?}", self.label_cost)?;
        writeln!(f, "  Model unit: {:?}", self.model_unit)?;
        writeln!(f, "  On failure: {:?}", self.on_failure)?;
        writeln!(f, "  Parallel: {}", self.parallel)?;
        writeln!(
            f,
            "  K-means: max_iter={} tol={} require_convergence={}",
            self.kmeans.max_iter, self.kmeans.tol, self.kmeans.require_convergence
        )
    }
}
