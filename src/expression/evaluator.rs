// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Recursive-descent evaluation of an [`Ast`] over `serde_json::Value`.

use serde_json::{Map, Value};

use super::ast::{Ast, Comparator};
use super::functions::{self, FunctionArg};
use crate::errors::EvaluationError;

pub(crate) fn evaluate(ast: &Ast, current: &Value) -> Result<Value, EvaluationError> {
    match ast {
        Ast::Identity => Ok(current.clone()),
        Ast::Literal(value) => Ok(value.clone()),
        Ast::Field(name) => field(name, current),
        Ast::Index(index) => element(*index, current),
        Ast::Subexpr(lhs, rhs) => {
            let left = evaluate(lhs, current)?;
            evaluate(rhs, &left)
        }
        Ast::Projection { lhs, rhs } => {
            let left = evaluate(lhs, current)?;
            match left {
                Value::Null => Ok(Value::Null),
                Value::Array(items) => {
                    let mut projected = Vec::with_capacity(items.len());
                    for item in &items {
                        let value = evaluate(rhs, item)?;
                        if !value.is_null() {
                            projected.push(value);
                        }
                    }
                    Ok(Value::Array(projected))
                }
                other => Err(EvaluationError::type_mismatch(
                    "projection",
                    "array",
                    type_name(&other),
                )),
            }
        }
        Ast::Flatten(inner) => match evaluate(inner, current)? {
            Value::Null => Ok(Value::Null),
            Value::Array(items) => {
                let mut flattened = Vec::with_capacity(items.len());
                for item in items {
                    match item {
                        Value::Array(nested) => flattened.extend(nested),
                        other => flattened.push(other),
                    }
                }
                Ok(Value::Array(flattened))
            }
            other => Err(EvaluationError::type_mismatch(
                "flatten",
                "array",
                type_name(&other),
            )),
        },
        Ast::ObjectValues(inner) => match evaluate(inner, current)? {
            Value::Null => Ok(Value::Null),
            Value::Object(map) => Ok(Value::Array(map.into_iter().map(|(_, v)| v).collect())),
            other => Err(EvaluationError::type_mismatch(
                "object wildcard",
                "object",
                type_name(&other),
            )),
        },
        Ast::MultiList(items) => {
            if current.is_null() {
                return Ok(Value::Null);
            }
            items
                .iter()
                .map(|item| evaluate(item, current))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array)
        }
        Ast::MultiHash(pairs) => {
            if current.is_null() {
                return Ok(Value::Null);
            }
            let mut map = Map::new();
            for (key, value) in pairs {
                map.insert(key.clone(), evaluate(value, current)?);
            }
            Ok(Value::Object(map))
        }
        Ast::Function { name, args } => {
            let mut resolved = Vec::with_capacity(args.len());
            for arg in args {
                match arg {
                    Ast::ExpRef(inner) => resolved.push(FunctionArg::Expression(inner)),
                    other => resolved.push(FunctionArg::Value(evaluate(other, current)?)),
                }
            }
            functions::call(name, resolved)
        }
        Ast::ExpRef(_) => Err(EvaluationError::type_mismatch(
            "expression reference",
            "function argument",
            "bare expression",
        )),
        Ast::Pipe(lhs, rhs) => {
            let left = evaluate(lhs, current)?;
            evaluate(rhs, &left)
        }
        Ast::Or(lhs, rhs) => {
            let left = evaluate(lhs, current)?;
            if is_truthy(&left) {
                Ok(left)
            } else {
                evaluate(rhs, current)
            }
        }
        Ast::And(lhs, rhs) => {
            let left = evaluate(lhs, current)?;
            if is_truthy(&left) {
                evaluate(rhs, current)
            } else {
                Ok(left)
            }
        }
        Ast::Not(inner) => Ok(Value::Bool(!is_truthy(&evaluate(inner, current)?))),
        Ast::Comparison {
            comparator,
            lhs,
            rhs,
        } => {
            let left = evaluate(lhs, current)?;
            let right = evaluate(rhs, current)?;
            compare(*comparator, &left, &right)
        }
    }
}

fn field(name: &str, current: &Value) -> Result<Value, EvaluationError> {
    match current {
        Value::Null => Ok(Value::Null),
        Value::Object(map) => map
            .get(name)
            .cloned()
            .ok_or_else(|| EvaluationError::UnknownField {
                field: name.to_string(),
            }),
        other => Err(EvaluationError::type_mismatch(
            format!("field '{}'", name),
            "object",
            type_name(other),
        )),
    }
}

fn element(index: i64, current: &Value) -> Result<Value, EvaluationError> {
    match current {
        Value::Null => Ok(Value::Null),
        Value::Array(items) => {
            let len = items.len() as i64;
            let resolved = if index < 0 { len + index } else { index };
            if resolved < 0 || resolved >= len {
                return Err(EvaluationError::UnknownField {
                    field: format!("[{}]", index),
                });
            }
            Ok(items[resolved as usize].clone())
        }
        other => Err(EvaluationError::type_mismatch(
            format!("index [{}]", index),
            "array",
            type_name(other),
        )),
    }
}

fn compare(comparator: Comparator, left: &Value, right: &Value) -> Result<Value, EvaluationError> {
    match comparator {
        Comparator::Eq => Ok(Value::Bool(left == right)),
        Comparator::Ne => Ok(Value::Bool(left != right)),
        _ => {
            let (l, r) = match (left.as_f64(), right.as_f64()) {
                (Some(l), Some(r)) => (l, r),
                (None, _) => {
                    return Err(EvaluationError::type_mismatch(
                        "comparison",
                        "number",
                        type_name(left),
                    ))
                }
                (_, None) => {
                    return Err(EvaluationError::type_mismatch(
                        "comparison",
                        "number",
                        type_name(right),
                    ))
                }
            };
            let result = match comparator {
                Comparator::Lt => l < r,
                Comparator::Lte => l <= r,
                Comparator::Gt => l > r,
                Comparator::Gte => l >= r,
                Comparator::Eq => l == r,
                Comparator::Ne => l != r,
            };
            Ok(Value::Bool(result))
        }
    }
}

/// JMESPath truthiness: empty containers, empty strings, `false` and `null`
/// are false.
pub(crate) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
        Value::Number(_) => true,
    }
}

pub(crate) fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
