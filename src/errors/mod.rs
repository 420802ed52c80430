// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod backend;
mod definition;
mod evaluation;
mod execution;
mod schema;
mod shape;

pub use backend::BackendFailure;
pub use definition::{ConfigError, DefinitionError};
pub use evaluation::{EvaluationError, ParseError};
pub use execution::{ConsistencyError, ErrorInfo, ErrorKind, ExecutionError};
pub use schema::SchemaError;
pub use shape::ShapeError;
