// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Errors raised while parsing or evaluating query expressions.

use thiserror::Error;

/// Failure to turn expression source text into an AST.
///
/// Parse errors surface when definitions are loaded, never during execution.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("invalid expression at offset {offset}: {reason}")]
pub struct ParseError {
    /// Byte offset into the expression source.
    pub offset: usize,
    pub reason: String,
}

impl ParseError {
    pub fn new(offset: usize, reason: impl Into<String>) -> Self {
        Self {
            offset,
            reason: reason.into(),
        }
    }
}

/// Failure while evaluating a parsed expression against a value tree.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvaluationError {
    /// A required key is missing from an object, or an index is out of range.
    #[error("unknown field '{field}'")]
    UnknownField { field: String },

    /// An operation was applied to a value of the wrong type.
    #[error("type mismatch in {context}: expected {expected}, found {found}")]
    TypeMismatch {
        context: String,
        expected: &'static str,
        found: &'static str,
    },

    /// Wrong argument count, or parallel sequences of unequal length.
    #[error("arity error in {function}(): {reason}")]
    Arity { function: String, reason: String },

    #[error("unknown function '{0}'")]
    UnknownFunction(String),
}

impl EvaluationError {
    pub fn type_mismatch(
        context: impl Into<String>,
        expected: &'static str,
        found: &'static str,
    ) -> Self {
        Self::TypeMismatch {
            context: context.into(),
            expected,
            found,
        }
    }
}
