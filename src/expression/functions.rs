// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Built-in functions: `join`, `length`, `repeat`, `zip_map`.

use serde_json::Value;

use super::ast::Ast;
use super::evaluator::{evaluate, type_name};
use crate::config::consts::MAX_REPEAT_COUNT;
use crate::errors::EvaluationError;

pub(crate) enum FunctionArg<'a> {
    Value(Value),
    Expression(&'a Ast),
}

impl FunctionArg<'_> {
    fn kind(&self) -> &'static str {
        match self {
            FunctionArg::Value(v) => type_name(v),
            FunctionArg::Expression(_) => "expression",
        }
    }
}

pub(crate) fn call(name: &str, args: Vec<FunctionArg<'_>>) -> Result<Value, EvaluationError> {
    match name {
        "join" => join(args),
        "length" => length(args),
        "repeat" => repeat(args),
        "zip_map" => zip_map(args),
        other => Err(EvaluationError::UnknownFunction(other.to_string())),
    }
}

fn arity_error(function: &str, expected: usize, found: usize) -> EvaluationError {
    EvaluationError::Arity {
        function: function.to_string(),
        reason: format!("expected {} arguments, found {}", expected, found),
    }
}

fn expect_arity(function: &str, args: &[FunctionArg<'_>], expected: usize) -> Result<(), EvaluationError> {
    if args.len() != expected {
        return Err(arity_error(function, expected, args.len()));
    }
    Ok(())
}

fn two_args<'a>(function: &str, args: Vec<FunctionArg<'a>>) -> Result<[FunctionArg<'a>; 2], EvaluationError> {
    args.try_into()
        .map_err(|args: Vec<FunctionArg<'a>>| arity_error(function, 2, args.len()))
}

fn join(args: Vec<FunctionArg<'_>>) -> Result<Value, EvaluationError> {
    let [separator, items] = two_args("join", args)?;
    let separator = match separator {
        FunctionArg::Value(Value::String(s)) => s,
        other => return Err(EvaluationError::type_mismatch("join() separator", "string", other.kind())),
    };
    let items = match items {
        FunctionArg::Value(Value::Array(items)) => items,
        other => return Err(EvaluationError::type_mismatch("join() sequence", "array", other.kind())),
    };
    let mut parts = Vec::with_capacity(items.len());
    for item in items {
        match item {
            Value::String(s) => parts.push(s),
            other => {
                return Err(EvaluationError::type_mismatch(
                    "join() element",
                    "string",
                    type_name(&other),
                ))
            }
        }
    }
    Ok(Value::String(parts.join(&separator)))
}

fn length(args: Vec<FunctionArg<'_>>) -> Result<Value, EvaluationError> {
    expect_arity("length", &args, 1)?;
    match &args[0] {
        FunctionArg::Value(Value::String(s)) => Ok(Value::from(s.chars().count())),
        FunctionArg::Value(Value::Array(a)) => Ok(Value::from(a.len())),
        FunctionArg::Value(Value::Object(o)) => Ok(Value::from(o.len())),
        other => Err(EvaluationError::type_mismatch(
            "length()",
            "string, array or object",
            other.kind(),
        )),
    }
}

fn repeat(args: Vec<FunctionArg<'_>>) -> Result<Value, EvaluationError> {
    let [value, count] = two_args("repeat", args)?;
    let value = match value {
        FunctionArg::Value(v) => v,
        other => return Err(EvaluationError::type_mismatch("repeat() value", "value", other.kind())),
    };
    let count = match count {
        FunctionArg::Value(n) => non_negative_integer(&n).ok_or_else(|| {
            EvaluationError::type_mismatch("repeat() count", "non-negative integer", type_name(&n))
        })?,
        other => return Err(EvaluationError::type_mismatch("repeat() count", "non-negative integer", other.kind())),
    };
    if count > MAX_REPEAT_COUNT {
        return Err(EvaluationError::Arity {
            function: "repeat".to_string(),
            reason: format!("count {} exceeds the limit of {}", count, MAX_REPEAT_COUNT),
        });
    }
    Ok(Value::Array(vec![value; count]))
}

/// Apply `template` to each row of equal-length parallel sequences; inside the
/// template `@[i]` is the current element of the i-th sequence.
fn zip_map(args: Vec<FunctionArg<'_>>) -> Result<Value, EvaluationError> {
    let [template, sequences] = two_args("zip_map", args)?;
    let template = match template {
        FunctionArg::Expression(ast) => ast,
        other => return Err(EvaluationError::type_mismatch("zip_map() template", "expression", other.kind())),
    };
    let sequences = match &sequences {
        FunctionArg::Value(Value::Array(sequences)) => sequences,
        other => return Err(EvaluationError::type_mismatch("zip_map() sequences", "array", other.kind())),
    };

    let mut columns = Vec::with_capacity(sequences.len());
    for sequence in sequences {
        match sequence {
            Value::Array(items) => columns.push(items),
            other => {
                return Err(EvaluationError::type_mismatch(
                    "zip_map() sequence",
                    "array",
                    type_name(other),
                ))
            }
        }
    }

    let rows = columns.first().map(|c| c.len()).unwrap_or(0);
    if let Some(mismatch) = columns.iter().find(|c| c.len() != rows) {
        return Err(EvaluationError::Arity {
            function: "zip_map".to_string(),
            reason: format!(
                "parallel sequences differ in length ({} vs {})",
                rows,
                mismatch.len()
            ),
        });
    }

    let mut mapped = Vec::with_capacity(rows);
    for row in 0..rows {
        let current = Value::Array(columns.iter().map(|c| c[row].clone()).collect());
        mapped.push(evaluate(template, &current)?);
    }
    Ok(Value::Array(mapped))
}

pub(crate) fn non_negative_integer(value: &Value) -> Option<usize> {
    if let Some(n) = value.as_u64() {
        return usize::try_from(n).ok();
    }
    match value.as_f64() {
        Some(f) if f >= 0.0 && f.fract() == 0.0 && f <= usize::MAX as f64 => Some(f as usize),
        _ => None,
    }
}
