// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Errors that abort an execution, and their serialisable summary.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{BackendFailure, EvaluationError, SchemaError, ShapeError};

/// The resolved output disagrees with the function's own declarations.
///
/// Indicates a definition bug; output is never truncated or padded to fit.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConsistencyError {
    #[error("output_length declares {declared} items but output contains {actual}")]
    LengthMismatch { declared: usize, actual: usize },

    #[error("output must be an array, found {found}")]
    OutputNotArray { found: &'static str },

    #[error("input_split produced {found} sub-inputs for {expected} batched items")]
    SplitCountMismatch { expected: usize, found: usize },

    #[error("output_length must be a non-negative integer, found {found}")]
    InvalidOutputLength { found: String },
}

/// Any fatal failure of a compile or execute call.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExecutionError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// `location` names the definition field being evaluated,
    /// e.g. `tasks[0].messages[1].content`.
    #[error("failed to evaluate {location}: {source}")]
    Evaluation {
        location: String,
        #[source]
        source: EvaluationError,
    },

    #[error(transparent)]
    Shape(#[from] ShapeError),

    #[error("task {task_index}: no ensemble member with positive weight produced a usable score vector ({} failed)", failures.len())]
    EnsembleFailed {
        task_index: usize,
        failures: Vec<BackendFailure>,
    },

    #[error(transparent)]
    Consistency(#[from] ConsistencyError),

    #[error("execution cancelled")]
    Cancelled,

    #[error("internal error: {message}")]
    Internal { message: String },
}

impl ExecutionError {
    pub fn evaluation(location: impl Into<String>, source: EvaluationError) -> Self {
        Self::Evaluation {
            location: location.into(),
            source,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ExecutionError::Schema(_) => ErrorKind::Schema,
            ExecutionError::Evaluation { .. } => ErrorKind::Evaluation,
            ExecutionError::Shape(_) => ErrorKind::Shape,
            ExecutionError::EnsembleFailed { .. } => ErrorKind::Backend,
            ExecutionError::Consistency(_) => ErrorKind::Consistency,
            ExecutionError::Cancelled => ErrorKind::Cancelled,
            ExecutionError::Internal { .. } => ErrorKind::Internal,
        }
    }

    pub fn info(&self) -> ErrorInfo {
        ErrorInfo {
            kind: self.kind(),
            message: self.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Schema,
    Evaluation,
    Shape,
    Backend,
    Consistency,
    Cancelled,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Schema => "schema",
            ErrorKind::Evaluation => "evaluation",
            ErrorKind::Shape => "shape",
            ErrorKind::Backend => "backend",
            ErrorKind::Consistency => "consistency",
            ErrorKind::Cancelled => "cancelled",
            ErrorKind::Internal => "internal",
        }
    }
}

/// Error summary carried on an execution result instead of a raised error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub kind: ErrorKind,
    pub message: String,
}
