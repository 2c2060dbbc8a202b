use crate::Result;
use ohno::bail;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumCount, EnumIter, IntoEnumIterator};

/// Tolerance used when checking that stage weights add up to one.
const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// A phase of the monitored job, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, EnumIter, EnumCount, Display, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Initialization,
    Collection,
    Processing,
    Analysis,
    Reporting,
    Cleanup,
}

impl Stage {
    /// Position in declared order.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// The stage after this one, if any.
    #[must_use]
    pub fn next(self) -> Option<Self> {
        Self::iter().nth(self.index() + 1)
    }
}

/// The current stage and how far along it is.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StageProgress {
    pub stage: Stage,

    /// Fraction of the stage completed, in `[0, 1]`.
    pub fraction: f64,
}

/// Relative weight of every stage in the overall fraction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StageWeights {
    weights: [f64; Stage::COUNT],
}

impl StageWeights {
    /// Build a custom weight table, indexed in declared stage order.
    ///
    /// # Errors
    ///
    /// Returns an error if any weight is negative or not finite, or if the weights
    /// don't add up to 1.0.
    pub fn new(weights: [f64; Stage::COUNT]) -> Result<Self> {
        for (stage, weight) in Stage::iter().zip(weights) {
            if !weight.is_finite() || weight < 0.0 {
                bail!("weight for stage {stage} must be a finite, non-negative number, got {weight}");
            }
        }

        let sum: f64 = weights.iter().sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            bail!("stage weights must add up to 1.0, got {sum}");
        }

        Ok(Self { weights })
    }

    #[must_use]
    pub const fn weight(&self, stage: Stage) -> f64 {
        self.weights[stage.index()]
    }

    /// Weighted overall fraction for a job that is `fraction` of the way through `current`.
    ///
    /// Every stage before `current` counts as complete, every stage after it as not started.
    #[must_use]
    pub fn overall(&self, current: Stage, fraction: f64) -> f64 {
        let completed: f64 = Stage::iter()
            .take_while(|&stage| stage < current)
            .map(|stage| self.weight(stage))
            .sum();

        (completed + self.weight(current) * fraction).clamp(0.0, 1.0)
    }
}

impl Default for StageWeights {
    fn default() -> Self {
        Self {
            weights: [0.05, 0.30, 0.20, 0.30, 0.10, 0.05],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    #[test]
    fn test_stage_order() {
        let stages: Vec<_> = Stage::iter().collect();
        assert_eq!(stages.len(), 6);
        assert!(stages.windows(2).all(|pair| pair[0] < pair[1]));
        assert_eq!(Stage::Initialization.next(), Some(Stage::Collection));
        assert_eq!(Stage::Cleanup.next(), None);
    }

    #[test]
    fn test_default_weights_sum_to_one() {
        let weights = StageWeights::default();
        let sum: f64 = Stage::iter().map(|s| weights.weight(s)).sum();
        assert!((sum - 1.0).abs() < EPSILON);
        assert!(StageWeights::new(weights.weights).is_ok());
    }

    #[test]
    fn test_new_rejects_bad_sum() {
        assert!(StageWeights::new([0.1, 0.1, 0.1, 0.1, 0.1, 0.1]).is_err());
    }

    #[test]
    fn test_new_rejects_negative_weight() {
        assert!(StageWeights::new([-0.1, 0.3, 0.3, 0.3, 0.1, 0.1]).is_err());
    }

    #[test]
    fn test_new_rejects_nan() {
        assert!(StageWeights::new([f64::NAN, 0.2, 0.2, 0.2, 0.2, 0.2]).is_err());
    }

    #[test]
    fn test_overall_counts_earlier_stages_complete() {
        let weights = StageWeights::new([0.1, 0.3, 0.0, 0.5, 0.1, 0.0]).unwrap();
        assert!((weights.overall(Stage::Initialization, 1.0) - 0.1).abs() < EPSILON);
        assert!((weights.overall(Stage::Collection, 0.5) - 0.25).abs() < EPSILON);
        assert!((weights.overall(Stage::Analysis, 0.0) - 0.4).abs() < EPSILON);
        assert!((weights.overall(Stage::Cleanup, 1.0) - 1.0).abs() < EPSILON);
    }

    #[test]
    fn test_overall_at_start_is_zero() {
        assert!(StageWeights::default().overall(Stage::Initialization, 0.0).abs() < EPSILON);
    }
}
