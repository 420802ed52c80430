// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Cross-document validation of a function and its profile.
//!
//! Expressions are already parsed by the time a definition exists, so this
//! pass only checks structure that spans documents or fields:
//!
//! 1. **Task alignment**: the profile has one entry per function task
//! 2. **Ensembles**: non-empty, one finite weight per member
//! 3. **Input maps**: integer `map` references point at a declared map
//! 4. **Split/merge**: `input_split` and `input_merge` come as a pair
//!
//! Every violation is collected so a broken definition can be fixed in one
//! pass. Non-positive weights are legal and reported separately as warnings.
//!
//! # Example
//! ```rust
//! use the_ensemble::config::{validate_definitions, FunctionDefinition, ProfileDefinition};
//! use serde_json::json;
//!
//! let function: FunctionDefinition = serde_json::from_value(json!({
//!     "input_schema": {"type": "string"},
//!     "tasks": [],
//!     "output": [],
//!     "output_length": 0
//! })).unwrap();
//! let profile: ProfileDefinition = serde_json::from_value(json!({"tasks": []})).unwrap();
//!
//! assert!(validate_definitions(&function, &profile).is_ok());
//! ```

use crate::config::definitions::{FunctionDefinition, ProfileDefinition, TaskMap};
use crate::errors::ShapeError;

/// Validate a function/profile pair, returning every shape error found.
pub fn validate_definitions(
    function: &FunctionDefinition,
    profile: &ProfileDefinition,
) -> Result<(), Vec<ShapeError>> {
    let mut errors = validate_function(function);

    if function.tasks.len() != profile.tasks.len() {
        errors.push(ShapeError::TaskCountMismatch {
            function_tasks: function.tasks.len(),
            profile_tasks: profile.tasks.len(),
        });
    }

    for (task_index, task) in profile.tasks.iter().enumerate() {
        let backends = task.ensemble.llms.len();
        if backends == 0 {
            errors.push(ShapeError::EmptyEnsemble { task_index });
        }
        if task.profile.len() != backends {
            errors.push(ShapeError::WeightCountMismatch {
                task_index,
                weights: task.profile.len(),
                backends,
            });
        }
        for (backend_index, weight) in task.profile.iter().enumerate() {
            if !weight.is_finite() {
                errors.push(ShapeError::InvalidWeight {
                    task_index,
                    backend_index,
                    weight: *weight,
                });
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Checks that need only the function document.
pub fn validate_function(function: &FunctionDefinition) -> Vec<ShapeError> {
    let mut errors = Vec::new();
    let available = function.input_maps.as_ref().map(Vec::len).unwrap_or(0);

    for (task_index, task) in function.tasks.iter().enumerate() {
        if let Some(TaskMap::Index(map_index)) = task.map {
            if map_index >= available {
                errors.push(ShapeError::InputMapOutOfRange {
                    task_index,
                    map_index,
                    available,
                });
            }
        }
    }

    if function.input_split.is_some() != function.input_merge.is_some() {
        errors.push(ShapeError::IncompleteSplitMerge);
    }

    errors
}

/// `(task_index, backend_index, weight)` for every weight that is finite but
/// not positive.
pub fn non_positive_weights(profile: &ProfileDefinition) -> Vec<(usize, usize, f64)> {
    profile
        .tasks
        .iter()
        .enumerate()
        .flat_map(|(task_index, task)| {
            task.profile
                .iter()
                .enumerate()
                .filter(|(_, w)| w.is_finite() && **w <= 0.0)
                .map(move |(backend_index, w)| (task_index, backend_index, *w))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn function(extra: serde_json::Value) -> FunctionDefinition {
        let mut base = json!({
            "input_schema": {"type": "object"},
            "tasks": [{
                "messages": [{"role": "user", "content": "hi"}],
                "responses": ["a", "b"]
            }],
            "output": {"$jmespath": "tasks[0].scores"},
            "output_length": 2
        });
        if let (Some(base), Some(extra)) = (base.as_object_mut(), extra.as_object()) {
            for (k, v) in extra {
                base.insert(k.clone(), v.clone());
            }
        }
        serde_json::from_value(base).unwrap()
    }

    fn profile(weights: serde_json::Value, members: usize) -> ProfileDefinition {
        let llms: Vec<_> = (0..members).map(|i| json!({"model": format!("m{}", i)})).collect();
        serde_json::from_value(json!({
            "tasks": [{"ensemble": {"llms": llms}, "profile": weights}]
        }))
        .unwrap()
    }

    #[test]
    fn test_valid_pair() {
        assert!(validate_definitions(&function(json!({})), &profile(json!([1.0, 1.0]), 2)).is_ok());
    }

    #[test]
    fn test_task_count_mismatch() {
        let empty: ProfileDefinition = serde_json::from_value(json!({"tasks": []})).unwrap();
        let errors = validate_definitions(&function(json!({})), &empty).unwrap_err();
        assert_eq!(
            errors,
            vec![ShapeError::TaskCountMismatch {
                function_tasks: 1,
                profile_tasks: 0
            }]
        );
    }

    #[test]
    fn test_errors_are_accumulated() {
        let f = function(json!({
            "input_split": {"$jmespath": "input"},
            "tasks": [{"map": 3, "messages": [], "responses": ["a"]}]
        }));
        let errors = validate_definitions(&f, &profile(json!([1.0]), 2)).unwrap_err();
        assert!(errors.contains(&ShapeError::IncompleteSplitMerge));
        assert!(errors.contains(&ShapeError::InputMapOutOfRange {
            task_index: 0,
            map_index: 3,
            available: 0
        }));
        assert!(errors.contains(&ShapeError::WeightCountMismatch {
            task_index: 0,
            weights: 1,
            backends: 2
        }));
    }

    #[test]
    fn test_empty_ensemble() {
        let errors = validate_definitions(&function(json!({})), &profile(json!([]), 0)).unwrap_err();
        assert_eq!(errors, vec![ShapeError::EmptyEnsemble { task_index: 0 }]);
    }

    #[test]
    fn test_non_positive_weights_are_warnings_only() {
        let p = profile(json!([0.0, -1.0, 2.0]), 3);
        assert!(validate_definitions(&function(json!({})), &p).is_ok());
        assert_eq!(non_positive_weights(&p), vec![(0, 0, 0.0), (0, 1, -1.0)]);
    }
}
