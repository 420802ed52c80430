// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

/// The input does not satisfy the function's `input_schema`.
///
/// `path` names the first offending location found by a depth-first,
/// declaration-order walk, e.g. `input.products[1].name`.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("input failed schema validation at '{path}': {reason}")]
pub struct SchemaError {
    pub path: String,
    pub reason: String,
}

impl SchemaError {
    pub fn new(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
