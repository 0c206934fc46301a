use serde::{Deserialize, Serialize};
use std::fmt;

/// Description-length estimate for one candidate cluster count.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ComplexityRecord {
    /// Candidate cluster count.
    pub k: usize,
    /// Cost of naming each point's cluster plus encoding its offset from the center.
    pub points_complexity: f64,
    /// Storage cost of the quantized centers, in bits.
    pub model_complexity: f64,
    /// K-means objective (sum of squared distances) of the underlying fit.
    pub inertia: f64,
}

impl ComplexityRecord {
    /// `points_complexity + model_complexity`.
    #[inline]
    pub fn total_complexity(&self) -> f64 {
        self.points_complexity + self.model_complexity
    }
}

/// A candidate that was dropped from the table because clustering failed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedK {
    /// Candidate cluster count.
    pub k: usize,
    /// Rendered collaborator error.
    pub reason: String,
}

/// Estimates for every evaluated candidate, in the order the candidates were given.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ComplexityTable {
    /// One record per successfully evaluated candidate.
    pub records: Vec<ComplexityRecord>,
    /// Candidates omitted because their clustering failed.
    pub skipped: Vec<SkippedK>,
}

impl ComplexityTable {
    /// True when no candidate was skipped.
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }

    /// Record for cluster count `k`, if it was evaluated.
    pub fn get(&self, k: usize) -> Option<&ComplexityRecord> {
        self.records.iter().find(|r| r.k == k)
    }

    /// The `k` with the smallest total complexity; ties go to the smaller `k`.
    pub fn best_k(&self) -> Option<usize> {
        self.records
            .iter()
            .min_by(|a, b| {
                a.total_complexity()
                    .total_cmp(&b.total_complexity())
                    .then(a.k.cmp(&b.k))
            })
            .map(|r| r.k)
    }
}

impl fmt::Display for ComplexityTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:>5}  {:>14}  {:>14}  {:>14}",
            "k", "points", "model", "total"
        )?;
        for r in &self.records {
            writeln!(
                f,
                "{:>5}  {:>14.3}  {:>14.1}  {:>14.3}",
                r.k,
                r.points_complexity,
                r.model_complexity,
                r.total_complexity()
            )?;
        }
        for s in &self.skipped {
            writeln!(f, "{:>5}  skipped: {}", s.k, s.reason)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(k: usize, points: f64, model: f64) -> ComplexityRecord {
        ComplexityRecord {
            k,
            points_complexity: points,
            model_complexity: model,
            inertia: 0.0,
        }
    }

    #[test]
    fn best_k_picks_minimum_total() {
        let table = ComplexityTable {
            records: vec![
                record(1, 100.0, 16.0),
                record(2, 10.0, 32.0),
                record(3, 9.0, 48.0),
            ],
            skipped: vec![],
        };
        assert_eq!(table.best_k(), Some(2));
        assert!(table.is_complete());
    }

    #[test]
    fn best_k_breaks_ties_toward_smaller_k() {
        // Unsorted on purpose: the tie-break is on k, not on position.
        let table = ComplexityTable {
            records: vec![record(4, 20.0, 0.0), record(2, 4.0, 16.0), record(3, 30.0, 0.0)],
            skipped: vec![],
        };
        assert_eq!(table.best_k(), Some(2));
    }

    #[test]
    fn empty_table_has_no_best_k() {
        let table = ComplexityTable {
            records: vec![],
            skipped: vec![SkippedK {
                k: 2,
                reason: "boom".into(),
            }],
        };
        assert_eq!(table.best_k(), None);
        assert!(!table.is_complete());
    }

    #[test]
    fn display_lists_records_and_skips() {
        let table = ComplexityTable {
            records: vec![record(1, 3.5, 16.0)],
            skipped: vec![SkippedK {
                k: 2,
                reason: "did not converge".into(),
            }],
        };
        let text = table.to_string();
        assert!(text.contains("total"));
        assert!(text.contains("19.500"));
        assert!(text.contains("skipped: did not converge"));
    }
}
