//! Description-length estimates over a range of cluster counts.
//!
//! For each candidate `k` the dataset is clustered once and scored as
//!
//! ```text
//! points(k) = Σ_i [ label_cost(label_i) + d · log(1 + ‖x_i − c_label_i‖) ]
//! model(k)  = k · d · bits_per_value          (divided by 8 with ModelUnit::Bytes)
//! total(k)  = points(k) + model(k)
//! ```
//!
//! `log1p` keeps both terms finite when a label is 0 or a point sits exactly on its
//! center. With [`LogBase::Two`] (the default) both terms are in bits.
//!
//! The label term charges `log(1 + label)`, so it depends on the order in which the
//! clusterer numbers its clusters. It is a heuristic, not a code length;
//! [`LabelCost::Uniform`] swaps in the `log(k)` cost of a uniform code.

use crate::cluster::util::euclidean;
use crate::cluster::{Clustering, ClusteringResult, Kmeans};
use crate::config::EstimatorConfig;
use crate::error::{Error, Result};
use crate::matrix::Matrix;
use crate::quantize::{encode_centers, FloatPrecision};
use crate::table::{ComplexityRecord, ComplexityTable, SkippedK};
use log::{debug, info, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::f64::consts::LN_2;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Logarithm base for the points term.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogBase {
    /// Natural log (nats).
    E,
    /// Base 2 (bits).
    #[default]
    Two,
}

impl LogBase {
    /// `log(1 + x)` in this base.
    #[inline]
    pub fn log1p(self, x: f64) -> f64 {
        match self {
            Self::E => x.ln_1p(),
            Self::Two => x.ln_1p() / LN_2,
        }
    }

    /// `log(x)` in this base.
    #[inline]
    pub fn log(self, x: f64) -> f64 {
        match self {
            Self::E => x.ln(),
            Self::Two => x.log2(),
        }
    }
}

/// Per-point cost of naming the assigned cluster.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelCost {
    /// `log(1 + label)`, using the clusterer's 0-based label.
    #[default]
    Index,
    /// `log(k)`: a uniform code over the `k` clusters.
    Uniform,
    /// No label cost.
    None,
}

impl LabelCost {
    /// Cost of naming `label` out of `k` clusters.
    #[inline]
    pub fn cost(self, label: usize, k: usize, base: LogBase) -> f64 {
        match self {
            Self::Index => base.log1p(label as f64),
            Self::Uniform => base.log(k as f64),
            Self::None => 0.0,
        }
    }
}

/// Unit in which the model term counts the stored centers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelUnit {
    /// `k · d · bits_per_value`.
    #[default]
    Bits,
    /// `k · d · bits_per_value / 8`, the byte size of the stored centers.
    Bytes,
}

/// What to do when clustering fails for one candidate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Return the first failure (in candidate order) and no table.
    #[default]
    Abort,
    /// Leave the candidate out of the table and list it in [`ComplexityTable::skipped`].
    Skip,
}

/// Points term of the description length for one clustering.
///
/// # Errors
///
/// Returns the error of [`ClusteringResult::validate`] if `result` does not fit
/// `data`: an assignment of the wrong length, centers of the wrong dimension, or a
/// label with no center.
pub fn points_complexity(
    data: &Matrix,
    result: &ClusteringResult,
    log_base: LogBase,
    label_cost: LabelCost,
) -> Result<f64> {
    result.validate(data.n_rows(), data.n_cols(), result.k())?;
    Ok(score_points(data, result, log_base, label_cost).0)
}

/// Model term of the description length: size of `centers` stored at `precision`.
pub fn model_complexity(
    centers: &[Vec<f64>],
    precision: FloatPrecision,
    unit: ModelUnit,
) -> f64 {
    let bytes = encode_centers(centers, precision).len();
    match unit {
        ModelUnit::Bits => (bytes * 8) as f64,
        ModelUnit::Bytes => bytes as f64,
    }
}

/// Returns `(points_complexity, inertia)`. `result` must already be validated.
fn score_points(
    data: &Matrix,
    result: &ClusteringResult,
    log_base: LogBase,
    label_cost: LabelCost,
) -> (f64, f64) {
    let d = data.n_cols() as f64;
    let k = result.k();
    let mut points = 0.0;
    let mut inertia = 0.0;
    for (point, &label) in data.rows().zip(&result.assignment) {
        let dist = euclidean(point, &result.centers[label]);
        points += label_cost.cost(label, k, log_base) + d * log_base.log1p(dist);
        inertia += dist * dist;
    }
    (points, inertia)
}

/// Scores candidate cluster counts by approximate description length.
///
/// ```rust
/// use mdlk::{ComplexityEstimator, Matrix};
///
/// let data = Matrix::from_rows(vec![vec![0.0], vec![0.0], vec![10.0], vec![10.0]]).unwrap();
/// let table = ComplexityEstimator::new().estimate(&data, &[1, 2], 42).unwrap();
///
/// assert_eq!(table.records.len(), 2);
/// // Two 1-d centers at 16 bits each.
/// assert_eq!(table.get(2).unwrap().model_complexity, 32.0);
/// ```
#[derive(Clone, Debug)]
pub struct ComplexityEstimator<C = Kmeans> {
    clusterer: C,
    precision: FloatPrecision,
    log_base: LogBase,
    label_cost: LabelCost,
    model_unit: ModelUnit,
    on_failure: FailurePolicy,
    parallel: bool,
    cancel: Option<Arc<AtomicBool>>,
}

impl ComplexityEstimator<Kmeans> {
    /// Estimator backed by [`Kmeans`] with default settings.
    pub fn new() -> Self {
        Self::with_clusterer(Kmeans::default())
    }

    /// Estimator backed by [`Kmeans`], configured from `config`.
    pub fn from_config(config: &EstimatorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::with_clusterer(config.kmeans.clone())
            .with_precision(config.float_precision_bits)
            .with_log_base(config.log_base)
            .with_label_cost(config.label_cost)
            .with_model_unit(config.model_unit)
            .with_failure_policy(config.on_failure)
            .with_parallel(config.parallel))
    }
}

impl Default for ComplexityEstimator<Kmeans> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clustering> ComplexityEstimator<C> {
    /// Estimator backed by an arbitrary clustering collaborator.
    pub fn with_clusterer(clusterer: C) -> Self {
        Self {
            clusterer,
            precision: FloatPrecision::default(),
            log_base: LogBase::default(),
            label_cost: LabelCost::default(),
            model_unit: ModelUnit::default(),
            on_failure: FailurePolicy::default(),
            parallel: false,
            cancel: None,
        }
    }

    /// Set the center quantization width.
    pub fn with_precision(mut self, precision: FloatPrecision) -> Self {
        self.precision = precision;
        self
    }

    /// Set the log base of the points term.
    pub fn with_log_base(mut self, log_base: LogBase) -> Self {
        self.log_base = log_base;
        self
    }

    /// Set the per-point label cost.
    pub fn with_label_cost(mut self, label_cost: LabelCost) -> Self {
        self.label_cost = label_cost;
        self
    }

    /// Set the unit of the model term.
    pub fn with_model_unit(mut self, unit: ModelUnit) -> Self {
        self.model_unit = unit;
        self
    }

    /// Set how clustering failures are handled.
    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.on_failure = policy;
        self
    }

    /// Evaluate candidates on the rayon thread pool.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Abort with [`Error::Cancelled`] once `flag` is set. Checked before each candidate.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// The clustering collaborator.
    pub fn clusterer(&self) -> &C {
        &self.clusterer
    }

    /// Score every candidate in `candidate_ks`, keeping their order.
    ///
    /// # Errors
    ///
    /// - [`Error::EmptyCandidates`] if `candidate_ks` is empty.
    /// - [`Error::InvalidClusterCount`] if any `k` is 0 or exceeds the number of points.
    /// - [`Error::NonFiniteValue`] if `data` holds NaN or an infinity.
    /// - [`Error::ClusteringFailed`] for the first failing `k` under [`FailurePolicy::Abort`].
    /// - [`Error::Cancelled`] if the cancel flag was raised.
    ///
    /// Input errors are reported before any clustering runs.
    pub fn estimate(
        &self,
        data: &Matrix,
        candidate_ks: &[usize],
        seed: u64,
    ) -> Result<ComplexityTable> {
        validate_inputs(data, candidate_ks)?;
        let started = Instant::now();

        let table = if self.parallel {
            let outcomes: Vec<Result<ComplexityRecord>> = candidate_ks
                .par_iter()
                .map(|&k| self.evaluate_candidate(data, k, seed))
                .collect();
            self.collect_table(candidate_ks.iter().copied().zip(outcomes))?
        } else {
            self.collect_table(
                candidate_ks
                    .iter()
                    .map(|&k| (k, self.evaluate_candidate(data, k, seed))),
            )?
        };

        info!(
            "scored {} of {} candidates on {}x{} data in {:?}; best k = {:?}",
            table.records.len(),
            candidate_ks.len(),
            data.n_rows(),
            data.n_cols(),
            started.elapsed(),
            table.best_k()
        );
        Ok(table)
    }

    /// Score a single cluster count.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidClusterCount`] if `k` is 0 or exceeds the number of points.
    /// - [`Error::NonFiniteValue`] if `data` holds NaN or an infinity.
    /// - [`Error::ClusteringFailed`] for collaborator errors and invalid clustering
    ///   results.
    pub fn evaluate(&self, data: &Matrix, k: usize, seed: u64) -> Result<ComplexityRecord> {
        validate_k(data.n_rows(), k)?;
        validate_finite(data)?;
        self.score_candidate(data, k, seed)
    }

    /// Cluster and score `k` on inputs that already passed validation.
    fn score_candidate(&self, data: &Matrix, k: usize, seed: u64) -> Result<ComplexityRecord> {
        let n = data.n_rows();
        let d = data.n_cols();
        let failed = |source: Error| Error::ClusteringFailed {
            k,
            source: Box::new(source),
        };

        let result = self.clusterer.cluster(data, k, seed).map_err(failed)?;
        result.validate(n, d, k).map_err(failed)?;

        let (points, inertia) = score_points(data, &result, self.log_base, self.label_cost);
        let record = ComplexityRecord {
            k,
            points_complexity: points,
            model_complexity: model_complexity(&result.centers, self.precision, self.model_unit),
            inertia,
        };
        debug!(
            "k={} points={:.3} model={:.0} total={:.3}",
            k,
            record.points_complexity,
            record.model_complexity,
            record.total_complexity()
        );
        Ok(record)
    }

    fn evaluate_candidate(&self, data: &Matrix, k: usize, seed: u64) -> Result<ComplexityRecord> {
        if self
            .cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
        {
            return Err(Error::Cancelled);
        }
        debug!("clustering with k={k}");
        self.score_candidate(data, k, seed)
    }

    fn collect_table(
        &self,
        outcomes: impl Iterator<Item = (usize, Result<ComplexityRecord>)>,
    ) -> Result<ComplexityTable> {
        let mut table = ComplexityTable::default();
        for (k, outcome) in outcomes {
            match outcome {
                Ok(record) => table.records.push(record),
                Err(Error::Cancelled) => return Err(Error::Cancelled),
                Err(err) => match self.on_failure {
                    FailurePolicy::Abort => return Err(err),
                    FailurePolicy::Skip => {
                        let reason = match &err {
                            Error::ClusteringFailed { source, .. } => source.to_string(),
                            other => other.to_string(),
                        };
                        warn!("skipping k={k}: {reason}");
                        table.skipped.push(SkippedK { k, reason });
                    }
                },
            }
        }
        Ok(table)
    }
}

fn validate_inputs(data: &Matrix, candidate_ks: &[usize]) -> Result<()> {
    if candidate_ks.is_empty() {
        return Err(Error::EmptyCandidates);
    }
    let n = data.n_rows();
    candidate_ks.iter().try_for_each(|&k| validate_k(n, k))?;
    validate_finite(data)
}

fn validate_k(n_items: usize, k: usize) -> Result<()> {
    if k == 0 || k > n_items {
        return Err(Error::InvalidClusterCount {
            requested: k,
            n_items,
        });
    }
    Ok(())
}

fn validate_finite(data: &Matrix) -> Result<()> {
    match data.first_non_finite() {
        Some((row, col)) => Err(Error::NonFiniteValue { row, col }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_clusters() -> Matrix {
        Matrix::from_rows(vec![vec![0.0], vec![0.0], vec![10.0], vec![10.0]]).unwrap()
    }

    /// Fails for the configured `k`s, delegates to k-means otherwise.
    struct FailsAt(&'static [usize]);

    impl Clustering for FailsAt {
        fn cluster(&self, data: &Matrix, k: usize, seed: u64) -> Result<ClusteringResult> {
            if self.0.contains(&k) {
                return Err(Error::NotConverged { k, max_iter: 1 });
            }
            Kmeans::new().cluster(data, k, seed)
        }
    }

    /// Returns a result with the wrong number of centers.
    struct Malformed;

    impl Clustering for Malformed {
        fn cluster(&self, data: &Matrix, _k: usize, _seed: u64) -> Result<ClusteringResult> {
            Ok(ClusteringResult {
                assignment: vec![0; data.n_rows()],
                centers: vec![data.row(0).to_vec()],
            })
        }
    }

    #[test]
    fn log_bases() {
        assert_eq!(LogBase::Two.log1p(0.0), 0.0);
        assert!((LogBase::Two.log1p(1.0) - 1.0).abs() < 1e-12);
        assert!((LogBase::E.log1p(1.0) - LN_2).abs() < 1e-12);
        assert!((LogBase::Two.log(8.0) - 3.0).abs() < 1e-12);
    }

    #[test]
    fn label_costs() {
        let base = LogBase::Two;
        assert_eq!(LabelCost::Index.cost(0, 4, base), 0.0);
        assert!((LabelCost::Index.cost(3, 4, base) - 2.0).abs() < 1e-12);
        assert!((LabelCost::Uniform.cost(0, 4, base) - 2.0).abs() < 1e-12);
        assert_eq!(LabelCost::Uniform.cost(0, 1, base), 0.0);
        assert_eq!(LabelCost::None.cost(3, 4, base), 0.0);
    }

    #[test]
    fn points_term_matches_hand_computation() {
        let data = two_clusters();
        let result = ClusteringResult {
            assignment: vec![0, 0, 0, 0],
            centers: vec![vec![5.0]],
        };
        let points = points_complexity(&data, &result, LogBase::E, LabelCost::Index).unwrap();
        assert!((points - 4.0 * 6f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn points_term_rejects_results_that_do_not_fit_the_data() {
        let single = Matrix::from_rows(vec![vec![0.0]]).unwrap();
        let unknown_label = ClusteringResult {
            assignment: vec![3],
            centers: vec![vec![0.0]],
        };
        assert!(matches!(
            points_complexity(&single, &unknown_label, LogBase::Two, LabelCost::Index),
            Err(Error::InvalidParameter {
                name: "assignment",
                ..
            })
        ));

        let short = ClusteringResult {
            assignment: vec![0],
            centers: vec![vec![5.0]],
        };
        assert!(matches!(
            points_complexity(&two_clusters(), &short, LogBase::Two, LabelCost::Index),
            Err(Error::DimensionMismatch {
                expected: 4,
                found: 1
            })
        ));
    }

    #[test]
    fn huge_magnitudes_keep_the_points_term_finite() {
        let data = Matrix::from_rows(vec![vec![-1e200], vec![1e200]]).unwrap();
        let table = ComplexityEstimator::new().estimate(&data, &[1, 2], 0).unwrap();

        // k=1: the center sits at 0, both points 1e200 away.
        let k1 = table.get(1).unwrap().points_complexity;
        assert!(k1.is_finite());
        assert!((k1 - 2.0 * 1e200f64.log2()).abs() < 1e-6);
        // k=2: both points on their centers, labels 0 and 1.
        assert!((table.get(2).unwrap().points_complexity - 1.0).abs() < 1e-12);
    }

    #[test]
    fn model_term_is_k_times_d_times_bits() {
        let centers = vec![vec![0.0, 1.0, 2.0]; 4];
        let bits = |p| model_complexity(&centers, p, ModelUnit::Bits);
        assert_eq!(bits(FloatPrecision::Half), 4.0 * 3.0 * 16.0);
        assert_eq!(bits(FloatPrecision::Single), 4.0 * 3.0 * 32.0);
        assert_eq!(
            model_complexity(&centers, FloatPrecision::Half, ModelUnit::Bytes),
            4.0 * 3.0 * 2.0
        );
    }

    #[test]
    fn abort_policy_names_failing_k() {
        let data = two_clusters();
        let est = ComplexityEstimator::with_clusterer(FailsAt(&[2]));
        let err = est.estimate(&data, &[1, 2, 3], 0).unwrap_err();
        match err {
            Error::ClusteringFailed { k, ref source } => {
                assert_eq!(k, 2);
                assert!(matches!(**source, Error::NotConverged { .. }));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn skip_policy_omits_failing_k() {
        let data = two_clusters();
        let est = ComplexityEstimator::with_clusterer(FailsAt(&[2]))
            .with_failure_policy(FailurePolicy::Skip);
        let table = est.estimate(&data, &[1, 2, 3], 0).unwrap();

        let ks: Vec<usize> = table.records.iter().map(|r| r.k).collect();
        assert_eq!(ks, vec![1, 3]);
        assert!(!table.is_complete());
        assert_eq!(table.skipped.len(), 1);
        assert_eq!(table.skipped[0].k, 2);
        assert!(table.skipped[0].reason.contains("did not converge"));
    }

    #[test]
    fn malformed_collaborator_output_is_a_clustering_failure() {
        let data = two_clusters();
        let est = ComplexityEstimator::with_clusterer(Malformed);
        assert!(est.estimate(&data, &[1], 0).is_ok());
        assert!(matches!(
            est.estimate(&data, &[2], 0),
            Err(Error::ClusteringFailed { k: 2, .. })
        ));
    }

    #[test]
    fn raised_cancel_flag_stops_estimation() {
        let data = two_clusters();
        let flag = Arc::new(AtomicBool::new(true));
        let est = ComplexityEstimator::new()
            .with_failure_policy(FailurePolicy::Skip)
            .with_cancel_flag(flag.clone());
        assert!(matches!(
            est.estimate(&data, &[1, 2], 0),
            Err(Error::Cancelled)
        ));

        flag.store(false, Ordering::Relaxed);
        assert!(est.estimate(&data, &[1, 2], 0).is_ok());
    }

    #[test]
    fn inputs_are_checked_before_clustering() {
        let data = two_clusters();
        // Any run that reaches clustering with k=1 fails.
        let est = ComplexityEstimator::with_clusterer(FailsAt(&[1]));
        assert!(matches!(
            est.estimate(&data, &[], 0),
            Err(Error::EmptyCandidates)
        ));
        assert!(matches!(
            est.estimate(&data, &[1, 5], 0),
            Err(Error::InvalidClusterCount {
                requested: 5,
                n_items: 4
            })
        ));
        assert!(matches!(
            est.estimate(&data, &[0], 0),
            Err(Error::InvalidClusterCount { requested: 0, .. })
        ));

        let nan = Matrix::from_rows(vec![vec![0.0], vec![f64::NAN]]).unwrap();
        assert!(matches!(
            est.estimate(&nan, &[1], 0),
            Err(Error::NonFiniteValue { row: 1, col: 0 })
        ));
    }

    #[test]
    fn single_k_evaluation_checks_its_inputs() {
        let data = two_clusters();
        // Any run that reaches clustering with k=0 or k=5 fails.
        let est = ComplexityEstimator::with_clusterer(FailsAt(&[0, 5]));

        let too_many = est.evaluate(&data, 5, 0).unwrap_err();
        assert!(matches!(
            too_many,
            Error::InvalidClusterCount {
                requested: 5,
                n_items: 4
            }
        ));
        assert!(too_many.is_invalid_input());
        assert!(matches!(
            est.evaluate(&data, 0, 0),
            Err(Error::InvalidClusterCount { requested: 0, .. })
        ));

        let nan = Matrix::from_rows(vec![vec![0.0], vec![f64::NAN]]).unwrap();
        let err = est.evaluate(&nan, 1, 0).unwrap_err();
        assert!(matches!(err, Error::NonFiniteValue { row: 1, col: 0 }));
        assert!(err.is_invalid_input());

        let record = est.evaluate(&data, 2, 0).unwrap();
        assert_eq!(record.k, 2);
    }

    #[test]
    fn parallel_abort_reports_earliest_failing_candidate() {
        let data = two_clusters();
        for parallel in [false, true] {
            let est =
                ComplexityEstimator::with_clusterer(FailsAt(&[1, 3])).with_parallel(parallel);
            match est.estimate(&data, &[2, 3, 4, 1], 0).unwrap_err() {
                Error::ClusteringFailed { k, .. } => assert_eq!(k, 3),
                other => panic!("unexpected error: {other}"),
            }
        }
    }

    #[test]
    fn parallel_skip_policy_keeps_candidate_order() {
        let data = two_clusters();
        let est = ComplexityEstimator::with_clusterer(FailsAt(&[2, 4]))
            .with_failure_policy(FailurePolicy::Skip)
            .with_parallel(true);
        let table = est.estimate(&data, &[4, 3, 2, 1], 0).unwrap();

        let ks: Vec<usize> = table.records.iter().map(|r| r.k).collect();
        assert_eq!(ks, vec![3, 1]);
        let skipped: Vec<usize> = table.skipped.iter().map(|s| s.k).collect();
        assert_eq!(skipped, vec![4, 2]);
        assert!(table
            .skipped
            .iter()
            .all(|s| s.reason.contains("did not converge")));

        let sequential = ComplexityEstimator::with_clusterer(FailsAt(&[2, 4]))
            .with_failure_policy(FailurePolicy::Skip)
            .estimate(&data, &[4, 3, 2, 1], 0)
            .unwrap();
        assert_eq!(table, sequential);
    }

    #[test]
    fn raised_cancel_flag_stops_parallel_estimation() {
        let data = two_clusters();
        let flag = Arc::new(AtomicBool::new(true));
        let est = ComplexityEstimator::new()
            .with_parallel(true)
            .with_failure_policy(FailurePolicy::Skip)
            .with_cancel_flag(flag.clone());
        assert!(matches!(
            est.estimate(&data, &[1, 2, 3, 4], 0),
            Err(Error::Cancelled)
        ));

        flag.store(false, Ordering::Relaxed);
        assert_eq!(est.estimate(&data, &[1, 2, 3, 4], 0).unwrap().records.len(), 4);
    }
}
