// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Query expressions embedded in function definitions.
//!
//! Expressions are a JMESPath-style subset: field access, indexes,
//! projections, multi-select lists and hashes, pipes, boolean operators,
//! comparisons and four built-in functions (`join`, `length`, `repeat`,
//! `zip_map`). In definition documents an expression is written as an object
//! with a single `$jmespath` key:
//!
//! ```json
//! { "$jmespath": "input.products[].name" }
//! ```
//!
//! Source text is parsed once, when the definition is deserialised, so a
//! malformed expression fails the load rather than an execution.
//!
//! # Example
//! ```
//! use the_ensemble::expression::Expression;
//! use serde_json::json;
//!
//! let expr = Expression::parse("length(input.products)").unwrap();
//! let value = expr.evaluate(&json!({"input": {"products": [1, 2, 3]}})).unwrap();
//! assert_eq!(value, json!(3));
//! ```

mod ast;
mod evaluator;
mod functions;
mod lexer;
mod parser;

use std::fmt;

use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::errors::{EvaluationError, ParseError};

pub(crate) use evaluator::type_name;
pub(crate) use functions::non_negative_integer;

/// Key marking an object as an expression rather than a literal value.
pub const EXPRESSION_KEY: &str = "$jmespath";

/// A parsed query expression together with its source text.
#[derive(Clone)]
pub struct Expression {
    source: String,
    ast: ast::Ast,
}

impl Expression {
    pub fn parse(source: impl Into<String>) -> Result<Self, ParseError> {
        let source = source.into();
        let ast = parser::parse(&source)?;
        Ok(Self { source, ast })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Evaluate against `context`. Pure: the same context always yields the
    /// same value.
    pub fn evaluate(&self, context: &Value) -> Result<Value, EvaluationError> {
        evaluator::evaluate(&self.ast, context)
    }
}

impl fmt::Debug for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Expression").field(&self.source).finish()
    }
}

impl PartialEq for Expression {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Serialize for Expression {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = Map::with_capacity(1);
        map.insert(EXPRESSION_KEY.to_string(), Value::String(self.source.clone()));
        map.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Expression {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        match expression_source(&value) {
            Some(source) => Expression::parse(source).map_err(D::Error::custom),
            None => Err(D::Error::custom(format!(
                "expected an expression object {{\"{}\": \"...\"}}",
                EXPRESSION_KEY
            ))),
        }
    }
}

fn expression_source(value: &Value) -> Option<&str> {
    match value {
        Value::Object(map) if map.len() == 1 => map.get(EXPRESSION_KEY).and_then(Value::as_str),
        _ => None,
    }
}

/// A definition field that is either a literal `T` or an expression that
/// computes one at compile time.
#[derive(Debug, Clone, PartialEq)]
pub enum WithExpression<T> {
    Value(T),
    Expression(Expression),
}

impl<T: Serialize> Serialize for WithExpression<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            WithExpression::Value(value) => value.serialize(serializer),
            WithExpression::Expression(expr) => expr.serialize(serializer),
        }
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for WithExpression<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        if let Some(source) = expression_source(&value) {
            return Expression::parse(source)
                .map(WithExpression::Expression)
                .map_err(D::Error::custom);
        }
        serde_json::from_value(value)
            .map(WithExpression::Value)
            .map_err(D::Error::custom)
    }
}

impl<T: Serialize> WithExpression<T> {
    /// Resolve to a JSON value, evaluating against `context` when this is an
    /// expression.
    pub fn resolve(&self, context: &Value) -> Result<Value, EvaluationError> {
        match self {
            WithExpression::Value(value) => {
                serde_json::to_value(value).map_err(|e| EvaluationError::TypeMismatch {
                    context: format!("literal value ({})", e),
                    expected: "serialisable value",
                    found: "unserialisable value",
                })
            }
            WithExpression::Expression(expr) => expr.evaluate(context),
        }
    }
}
