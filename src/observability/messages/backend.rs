// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for ensemble member requests and failures.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// A request is about to be sent to one ensemble member.
///
/// # Log Level
/// `debug!` - Per-request detail
pub struct BackendRequestDispatched<'a> {
    pub task_index: usize,
    pub model: &'a str,
    pub output_mode: &'a str,
    pub backend: &'a str,
}

impl Display for BackendRequestDispatched<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Task {}: dispatching {} request for '{}' to {} backend",
            self.task_index, self.output_mode, self.model, self.backend
        )
    }
}

impl StructuredLog for BackendRequestDispatched<'_> {
    fn log(&self) {
        tracing::debug!(
            task_index = self.task_index,
            model = self.model,
            output_mode = self.output_mode,
            backend = self.backend,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "backend_request",
            span_name = name,
            task_index = self.task_index,
            model = self.model,
            backend = self.backend,
        )
    }
}

/// An ensemble member failed; its vote is excluded and the remaining
/// weights renormalised.
///
/// # Log Level
/// `warn!` - Recoverable failure
///
/// # Example
/// ```
/// use the_ensemble::observability::messages::backend::BackendFailed;
/// use the_ensemble::errors::BackendFailure;
///
/// let failure = BackendFailure::Malformed { model: "m".into(), expected: 3, found: 2 };
/// let msg = BackendFailed { task_index: 0, model: "m", error: &failure };
/// tracing::warn!("{}", msg);
/// ```
pub struct BackendFailed<'a> {
    pub task_index: usize,
    pub model: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for BackendFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Task {}: ensemble member '{}' excluded: {}",
            self.task_index, self.model, self.error
        )
    }
}

impl StructuredLog for BackendFailed<'_> {
    fn log(&self) {
        tracing::warn!(
            task_index = self.task_index,
            model = self.model,
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "backend_failed",
            span_name = name,
            task_index = self.task_index,
            model = self.model,
            error = %self.error,
        )
    }
}
