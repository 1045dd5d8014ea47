//! # Grading Scale
//!
//! The score scale used for pre-thesis grading and thesis final grades.
//! The default deployment grades on 0 to 10 with 5.0 passing, but the scale
//! is carried as a value rather than hard-coded so a deployment on a
//! different scale only has to construct the engine differently.

use serde::{Deserialize, Serialize};

use crate::error::WorkflowError;

/// An inclusive score scale with a passing threshold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GradingScale {
    /// Lowest admissible score.
    pub min: f64,
    /// Highest admissible score.
    pub max: f64,
    /// Scores at or above this threshold pass.
    pub passing: f64,
}

impl Default for GradingScale {
    fn default() -> Self {
        Self {
            min: 0.0,
            max: 10.0,
            passing: 5.0,
        }
    }
}

impl GradingScale {
    /// Construct a scale, validating that the bounds are ordered and the
    /// passing threshold lies within them.
    pub fn new(min: f64, max: f64, passing: f64) -> Result<Self, WorkflowError> {
        if !min.is_finite() || !max.is_finite() || !passing.is_finite() {
            return Err(WorkflowError::Validation(
                "grading scale bounds must be finite".to_string(),
            ));
        }
        if min >= max {
            return Err(WorkflowError::Validation(format!(
                "grading scale min ({min}) must be below max ({max})"
            )));
        }
        if passing < min || passing > max {
            return Err(WorkflowError::Validation(format!(
                "passing threshold ({passing}) must lie within [{min}, {max}]"
            )));
        }
        Ok(Self { min, max, passing })
    }

    /// Validate a submitted score against the scale bounds.
    pub fn validate(&self, score: f64) -> Result<(), WorkflowError> {
        if !score.is_finite() || score < self.min || score > self.max {
            return Err(WorkflowError::Validation(format!(
                "score {score} is outside the grading scale [{}, {}]",
                self.min, self.max
            )));
        }
        Ok(())
    }

    /// Whether a score meets the passing threshold.
    pub fn is_passing(&self, score: f64) -> bool {
        score >= self.passing
    }
}

/// Round to two decimal places, the precision final grades are stored at.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Arithmetic mean of submitted scores, rounded to two decimals.
///
/// Returns `None` for an empty slice; a final grade is never computed from
/// zero evaluations.
pub fn mean_score(scores: &[f64]) -> Option<f64> {
    if scores.is_empty() {
        return None;
    }
    let sum: f64 = scores.iter().sum();
    Some(round2(sum / scores.len() as f64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_default_scale() {
        let scale = GradingScale::default();
        assert_eq!(scale.min, 0.0);
        assert_eq!(scale.max, 10.0);
        assert_eq!(scale.passing, 5.0);
    }

    #[test]
    fn test_validate_accepts_in_range() {
        let scale = GradingScale::default();
        assert!(scale.validate(0.0).is_ok());
        assert!(scale.validate(5.0).is_ok());
        assert!(scale.validate(10.0).is_ok());
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        let scale = GradingScale::default();
        assert!(scale.validate(-0.1).is_err());
        assert!(scale.validate(10.1).is_err());
        assert!(scale.validate(f64::NAN).is_err());
        assert!(scale.validate(f64::INFINITY).is_err());
    }

    #[test]
    fn test_passing_threshold_is_inclusive() {
        let scale = GradingScale::default();
        assert!(scale.is_passing(5.0));
        assert!(scale.is_passing(9.9));
        assert!(!scale.is_passing(4.99));
    }

    #[test]
    fn test_new_rejects_inverted_bounds() {
        assert!(GradingScale::new(10.0, 0.0, 5.0).is_err());
        assert!(GradingScale::new(5.0, 5.0, 5.0).is_err());
    }

    #[test]
    fn test_new_rejects_threshold_outside_bounds() {
        assert!(GradingScale::new(0.0, 10.0, 11.0).is_err());
        assert!(GradingScale::new(0.0, 10.0, -1.0).is_err());
    }

    #[test]
    fn test_new_accepts_alternate_scale() {
        // A 0-100 deployment with 50 passing.
        let scale = GradingScale::new(0.0, 100.0, 50.0).unwrap();
        assert!(scale.validate(72.5).is_ok());
        assert!(scale.is_passing(50.0));
    }

    #[test]
    fn test_mean_score_rounds_to_two_decimals() {
        assert_eq!(mean_score(&[8.0, 7.0]), Some(7.5));
        assert_eq!(mean_score(&[10.0, 10.0, 5.0]), Some(8.33));
        assert_eq!(mean_score(&[7.0]), Some(7.0));
    }

    #[test]
    fn test_mean_score_empty_is_none() {
        assert_eq!(mean_score(&[]), None);
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(7.499), 7.5);
        assert_eq!(round2(7.494), 7.49);
        assert_eq!(round2(0.005), 0.01);
    }

    proptest! {
        #[test]
        fn prop_mean_stays_within_bounds(scores in prop::collection::vec(0.0f64..=10.0, 1..20)) {
            let m = mean_score(&scores).unwrap();
            prop_assert!(m >= 0.0);
            prop_assert!(m <= 10.0);
        }

        #[test]
        fn prop_round2_is_idempotent(v in -1000.0f64..1000.0) {
            let once = round2(v);
            prop_assert_eq!(once, round2(once));
        }
    }
}
