// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Batch decomposition: split one input into independent single-item
//! sub-inputs and merge their outputs back in original order.
//!
//! For any valid input, the merged output of the split execution has the
//! same shape and length as the output of executing the input whole.

use serde_json::{json, Value};

use super::tasks::{check_input, compile_output_length, resolve_output_length};
use crate::config::FunctionDefinition;
use crate::errors::{ConsistencyError, EvaluationError, ExecutionError, ShapeError};
use crate::expression::type_name;
use crate::observability::messages::compiler::InputSplit;
use crate::observability::messages::StructuredLog;

/// Result of merging split executions.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedOutput {
    /// The input reconstructed by `input_merge`.
    pub input: Value,
    /// Per-call outputs concatenated in sub-input order.
    pub output: Value,
}

/// Split `input` with the function's `input_split` expression.
///
/// Returns `None` when the function declares no split. Otherwise the number
/// of sub-inputs must equal the input's `output_length`, and every sub-input
/// must itself pass the input schema.
pub fn split_input(
    function: &FunctionDefinition,
    input: &Value,
) -> Result<Option<Vec<Value>>, ExecutionError> {
    let Some((split, _)) = function.split_merge() else {
        return Ok(None);
    };

    let expected = compile_output_length(function, input)?;
    let parts = match split
        .evaluate(&json!({ "input": input }))
        .map_err(|e| ExecutionError::evaluation("input_split", e))?
    {
        Value::Array(parts) => parts,
        other => {
            return Err(ExecutionError::evaluation(
                "input_split",
                EvaluationError::type_mismatch("input_split", "array", type_name(&other)),
            ))
        }
    };

    if parts.len() != expected {
        return Err(ConsistencyError::SplitCountMismatch {
            expected,
            found: parts.len(),
        }
        .into());
    }
    for part in &parts {
        check_input(function, part)?;
    }

    InputSplit {
        sub_inputs: parts.len(),
    }
    .log();

    Ok(Some(parts))
}

/// Merge `(sub_input, sub_output)` pairs, given in original index order.
pub fn merge_outputs(
    function: &FunctionDefinition,
    parts: &[(Value, Value)],
) -> Result<MergedOutput, ExecutionError> {
    let (_, merge) = function
        .split_merge()
        .ok_or(ShapeError::IncompleteSplitMerge)?;

    let sub_inputs: Vec<&Value> = parts.iter().map(|(input, _)| input).collect();
    let input = merge
        .evaluate(&json!({ "input": sub_inputs }))
        .map_err(|e| ExecutionError::evaluation("input_merge", e))?;

    let mut output = Vec::new();
    for (_, sub_output) in parts {
        match sub_output {
            Value::Array(items) => output.extend(items.iter().cloned()),
            other => {
                return Err(ConsistencyError::OutputNotArray {
                    found: type_name(other),
                }
                .into())
            }
        }
    }

    let declared = resolve_output_length(&function.output_length, &json!({ "input": &input }))?;
    if declared != output.len() {
        return Err(ConsistencyError::LengthMismatch {
            declared,
            actual: output.len(),
        }
        .into());
    }

    Ok(MergedOutput {
        input,
        output: Value::Array(output),
    })
}
