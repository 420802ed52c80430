// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Ensemble aggregation: the weighted arithmetic mean of member score
//! vectors, per candidate position.
//!
//! ```text
//! score[j] = Σ_i w_i · s_i[j] / Σ_i w_i
//! ```
//!
//! taken over members with `w_i > 0` whose vectors are usable. A member is
//! unusable when its backend failed, or when its vector has the wrong length
//! or a non-finite entry; it is excluded and the remaining weights
//! renormalised. Members with non-positive weight never contribute but must
//! still report, so the outcome count always equals the ensemble size.
//!
//! The result is not normalised to sum to 1.

use crate::config::TaskProfile;
use crate::errors::{BackendFailure, ExecutionError, ShapeError};
use crate::observability::messages::backend::BackendFailed;
use crate::observability::messages::engine::{EnsembleExhausted, TaskAggregated};
use crate::observability::messages::StructuredLog;

#[derive(Debug, Clone, PartialEq)]
pub struct Aggregate {
    pub scores: Vec<f64>,
    /// Each member's usable vector, in ensemble order; `None` where excluded
    /// for failure.
    pub votes: Vec<Option<Vec<f64>>>,
    /// Failures that excluded a member, paired with its ensemble index.
    pub failures: Vec<(usize, BackendFailure)>,
}

/// Combine one outcome per ensemble member into a single score vector of
/// length `candidate_count`.
pub fn aggregate(
    task_index: usize,
    task_profile: &TaskProfile,
    outcomes: &[Result<Vec<f64>, BackendFailure>],
    candidate_count: usize,
) -> Result<Aggregate, ExecutionError> {
    let members = &task_profile.ensemble.llms;
    if task_profile.profile.len() != members.len() {
        return Err(ShapeError::WeightCountMismatch {
            task_index,
            weights: task_profile.profile.len(),
            backends: members.len(),
        }
        .into());
    }
    if outcomes.len() != members.len() {
        return Err(ShapeError::OutcomeCountMismatch {
            task_index,
            expected: members.len(),
            found: outcomes.len(),
        }
        .into());
    }

    let mut sums = vec![0.0; candidate_count];
    let mut total_weight = 0.0;
    let mut contributing = 0;
    let mut votes = Vec::with_capacity(outcomes.len());
    let mut failures = Vec::new();

    for (index, (outcome, weight)) in outcomes.iter().zip(&task_profile.profile).enumerate() {
        let model = &members[index].model;
        let usable = outcome
            .clone()
            .and_then(|scores| check_vector(model, scores, candidate_count));

        match usable {
            Ok(scores) => {
                if *weight > 0.0 {
                    for (sum, score) in sums.iter_mut().zip(&scores) {
                        *sum += weight * score;
                    }
                    total_weight += weight;
                    contributing += 1;
                }
                votes.push(Some(scores));
            }
            Err(failure) => {
                BackendFailed {
                    task_index,
                    model,
                    error: &failure,
                }
                .log();
                failures.push((index, failure));
                votes.push(None);
            }
        }
    }

    if contributing == 0 {
        EnsembleExhausted {
            task_index,
            failures: failures.len(),
        }
        .log();
        return Err(ExecutionError::EnsembleFailed {
            task_index,
            failures: failures.into_iter().map(|(_, f)| f).collect(),
        });
    }

    TaskAggregated {
        task_index,
        candidate_count,
        contributing,
        excluded: failures.len(),
    }
    .log();

    Ok(Aggregate {
        scores: sums.into_iter().map(|s| s / total_weight).collect(),
        votes,
        failures,
    })
}

fn check_vector(
    model: &str,
    scores: Vec<f64>,
    candidate_count: usize,
) -> Result<Vec<f64>, BackendFailure> {
    if scores.len() != candidate_count {
        return Err(BackendFailure::Malformed {
            model: model.to_string(),
            expected: candidate_count,
            found: scores.len(),
        });
    }
    if scores.iter().any(|s| !s.is_finite()) {
        return Err(BackendFailure::NonFinite {
            model: model.to_string(),
        });
    }
    Ok(scores)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn profile(weights: &[f64]) -> TaskProfile {
        let llms: Vec<_> = (0..weights.len())
            .map(|i| json!({"model": format!("m{}", i)}))
            .collect();
        serde_json::from_value(json!({"ensemble": {"llms": llms}, "profile": weights})).unwrap()
    }

    fn unavailable(i: usize) -> Result<Vec<f64>, BackendFailure> {
        Err(BackendFailure::Unavailable {
            model: format!("m{}", i),
            reason: "down".into(),
        })
    }

    #[test]
    fn test_weighted_mean_law() {
        let result = aggregate(
            0,
            &profile(&[1.0, 1.0]),
            &[Ok(vec![1.0, 0.0, 0.0]), Ok(vec![0.0, 1.0, 0.0])],
            3,
        )
        .unwrap();
        assert_eq!(result.scores, vec![0.5, 0.5, 0.0]);
        assert!(result.failures.is_empty());
    }

    #[test]
    fn test_unequal_weights() {
        let result = aggregate(
            0,
            &profile(&[3.0, 1.0]),
            &[Ok(vec![1.0, 0.0]), Ok(vec![0.0, 1.0])],
            2,
        )
        .unwrap();
        assert_eq!(result.scores, vec![0.75, 0.25]);
    }

    #[test]
    fn test_failed_member_renormalised() {
        let result = aggregate(
            1,
            &profile(&[1.0, 1.0, 2.0]),
            &[Ok(vec![1.0, 0.0]), unavailable(1), Ok(vec![0.0, 1.0])],
            2,
        )
        .unwrap();
        let expected = [1.0 / 3.0, 2.0 / 3.0];
        for (got, want) in result.scores.iter().zip(expected) {
            assert!((got - want).abs() < 1e-12);
        }
        assert_eq!(result.votes[1], None);
        assert_eq!(result.failures.len(), 1);
        assert_eq!(result.failures[0].0, 1);
    }

    #[test]
    fn test_malformed_and_non_finite_vectors_excluded() {
        let result = aggregate(
            0,
            &profile(&[1.0, 1.0, 1.0]),
            &[Ok(vec![1.0, 0.0]), Ok(vec![0.5]), Ok(vec![f64::NAN, 1.0])],
            2,
        )
        .unwrap();
        assert_eq!(result.scores, vec![1.0, 0.0]);
        assert!(matches!(
            result.failures[0].1,
            BackendFailure::Malformed { expected: 2, found: 1, .. }
        ));
        assert!(matches!(result.failures[1].1, BackendFailure::NonFinite { .. }));
    }

    #[test]
    fn test_non_positive_weights_contribute_nothing() {
        let result = aggregate(
            0,
            &profile(&[0.0, -1.0, 2.0]),
            &[Ok(vec![1.0, 0.0]), Ok(vec![1.0, 0.0]), Ok(vec![0.0, 1.0])],
            2,
        )
        .unwrap();
        assert_eq!(result.scores, vec![0.0, 1.0]);
        assert_eq!(result.votes.iter().filter(|v| v.is_some()).count(), 3);
    }

    #[test]
    fn test_all_members_failed_is_fatal() {
        let err = aggregate(2, &profile(&[1.0, 1.0]), &[unavailable(0), unavailable(1)], 2)
            .unwrap_err();
        assert!(matches!(
            err,
            ExecutionError::EnsembleFailed { task_index: 2, ref failures } if failures.len() == 2
        ));
    }

    #[test]
    fn test_only_non_positive_survivors_is_fatal() {
        let err = aggregate(0, &profile(&[0.0, 1.0]), &[Ok(vec![1.0]), unavailable(1)], 1)
            .unwrap_err();
        assert!(matches!(err, ExecutionError::EnsembleFailed { .. }));
    }

    #[test]
    fn test_outcome_count_mismatch_is_shape_error() {
        let err = aggregate(0, &profile(&[1.0, 1.0]), &[Ok(vec![1.0])], 1).unwrap_err();
        assert_eq!(
            err,
            ExecutionError::Shape(ShapeError::OutcomeCountMismatch {
                task_index: 0,
                expected: 2,
                found: 1
            })
        );
    }
}
