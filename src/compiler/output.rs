// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Output resolution: evaluate `output` and `output_length` once every task
//! has been scored, and hold them to each other.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::tasks::resolve_output_length;
use crate::config::FunctionDefinition;
use crate::errors::{ConsistencyError, ExecutionError};
use crate::expression::type_name;

/// Aggregated result of one payload's ensemble.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredCall {
    pub scores: Vec<f64>,
    pub responses: Vec<String>,
    /// Per ensemble member, in ensemble order; `None` where the member
    /// failed.
    pub votes: Vec<Option<Vec<f64>>>,
}

/// What `tasks[i]` looks like to the `output` expression: `null` when
/// skipped, an object when compiled, an array of objects when mapped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TaskOutput {
    Skipped,
    Scored(ScoredCall),
    Mapped(Vec<ScoredCall>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedOutput {
    pub output: Value,
    pub output_length: usize,
}

/// Evaluate `output` and `output_length` against `{input, tasks}`.
///
/// `output` must be an array whose length equals `output_length`; anything
/// else is a [`ConsistencyError`]. The output is never padded or truncated.
pub fn resolve_output(
    function: &FunctionDefinition,
    input: &Value,
    tasks: &[TaskOutput],
) -> Result<ResolvedOutput, ExecutionError> {
    let context = json!({ "input": input, "tasks": tasks });

    let output = function
        .output
        .resolve(&context)
        .map_err(|e| ExecutionError::evaluation("output", e))?;
    let output_length = resolve_output_length(&function.output_length, &context)?;

    let actual = match &output {
        Value::Array(items) => items.len(),
        other => {
            return Err(ConsistencyError::OutputNotArray {
                found: type_name(other),
            }
            .into())
        }
    };
    if actual != output_length {
        return Err(ConsistencyError::LengthMismatch {
            declared: output_length,
            actual,
        }
        .into());
    }

    Ok(ResolvedOutput {
        output,
        output_length,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn function(output: Value, output_length: Value) -> FunctionDefinition {
        serde_json::from_value(json!({
            "input_schema": {"type": "object"},
            "tasks": [],
            "output": output,
            "output_length": output_length
        }))
        .unwrap()
    }

    fn scored(scores: Vec<f64>) -> TaskOutput {
        TaskOutput::Scored(ScoredCall {
            responses: (0..scores.len()).map(|i| format!("c{}", i)).collect(),
            votes: vec![Some(scores.clone())],
            scores,
        })
    }

    #[test]
    fn test_resolves_task_scores() {
        let f = function(
            json!({"$jmespath": "tasks[1].scores"}),
            json!({"$jmespath": "length(input.items)"}),
        );
        let resolved = resolve_output(
            &f,
            &json!({"items": [1, 2]}),
            &[TaskOutput::Skipped, scored(vec![0.25, 0.75])],
        )
        .unwrap();
        assert_eq!(resolved.output, json!([0.25, 0.75]));
        assert_eq!(resolved.output_length, 2);
    }

    #[test]
    fn test_skipped_task_is_null() {
        let f = function(json!({"$jmespath": "[tasks[0]]"}), json!(1));
        let resolved = resolve_output(&f, &json!({}), &[TaskOutput::Skipped]).unwrap();
        assert_eq!(resolved.output, json!([null]));
    }

    #[test]
    fn test_mapped_task_is_array() {
        let f = function(json!({"$jmespath": "tasks[0][].scores[0]"}), json!(2));
        let mapped = TaskOutput::Mapped(vec![
            ScoredCall {
                scores: vec![0.9, 0.1],
                responses: vec!["y".into(), "n".into()],
                votes: vec![None, Some(vec![0.9, 0.1])],
            },
            ScoredCall {
                scores: vec![0.2, 0.8],
                responses: vec!["y".into(), "n".into()],
                votes: vec![Some(vec![0.2, 0.8])],
            },
        ]);
        let resolved = resolve_output(&f, &json!({}), &[mapped]).unwrap();
        assert_eq!(resolved.output, json!([0.9, 0.2]));
    }

    #[test]
    fn test_length_mismatch_is_consistency_error() {
        let f = function(json!({"$jmespath": "tasks[0].scores"}), json!(3));
        let err = resolve_output(&f, &json!({}), &[scored(vec![0.5, 0.5])]).unwrap_err();
        assert_eq!(
            err,
            ExecutionError::Consistency(ConsistencyError::LengthMismatch {
                declared: 3,
                actual: 2
            })
        );
    }

    #[test]
    fn test_output_must_be_array() {
        let f = function(json!({"$jmespath": "tasks[0].scores[0]"}), json!(1));
        let err = resolve_output(&f, &json!({}), &[scored(vec![1.0])]).unwrap_err();
        assert_eq!(
            err,
            ExecutionError::Consistency(ConsistencyError::OutputNotArray { found: "number" })
        );
    }

    #[test]
    fn test_negative_output_length_rejected() {
        let f = function(json!([]), json!({"$jmespath": "`-1`"}));
        let err = resolve_output(&f, &json!({}), &[]).unwrap_err();
        assert!(matches!(
            err,
            ExecutionError::Consistency(ConsistencyError::InvalidOutputLength { .. })
        ));
    }
}
