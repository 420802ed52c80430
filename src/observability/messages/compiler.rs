// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for the schema gate, task compilation and input splitting.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// Input rejected by the function's schema.
///
/// # Log Level
/// `warn!` - Caller error, not an engine fault
pub struct SchemaRejected<'a> {
    pub path: &'a str,
    pub reason: &'a str,
}

impl Display for SchemaRejected<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Input rejected at '{}': {}", self.path, self.reason)
    }
}

impl StructuredLog for SchemaRejected<'_> {
    fn log(&self) {
        tracing::warn!(path = self.path, reason = self.reason, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "schema_rejected",
            span_name = name,
            path = self.path,
            reason = self.reason,
        )
    }
}

/// Tasks compiled for one input.
///
/// # Log Level
/// `debug!` - Per-execution detail
///
/// # Example
/// ```
/// use the_ensemble::observability::messages::compiler::TasksCompiled;
///
/// let msg = TasksCompiled { task_count: 2, skipped: 1, mapped_calls: 0 };
/// tracing::debug!("{}", msg);
/// ```
pub struct TasksCompiled {
    pub task_count: usize,
    pub skipped: usize,
    pub mapped_calls: usize,
}

impl Display for TasksCompiled {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Compiled {} tasks ({} skipped, {} mapped calls)",
            self.task_count, self.skipped, self.mapped_calls
        )
    }
}

impl StructuredLog for TasksCompiled {
    fn log(&self) {
        tracing::debug!(
            task_count = self.task_count,
            skipped = self.skipped,
            mapped_calls = self.mapped_calls,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "tasks_compiled",
            span_name = name,
            task_count = self.task_count,
            skipped = self.skipped,
            mapped_calls = self.mapped_calls,
        )
    }
}

pub struct TaskSkipped {
    pub task_index: usize,
}

impl Display for TaskSkipped {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Task {} skipped by its skip expression", self.task_index)
    }
}

impl StructuredLog for TaskSkipped {
    fn log(&self) {
        tracing::debug!(task_index = self.task_index, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("task_skipped", span_name = name, task_index = self.task_index)
    }
}

/// Duplicate candidate labels were dropped from a task's responses.
///
/// # Log Level
/// `warn!` - Definition likely produces ambiguous labels
pub struct DuplicateResponsesDropped {
    pub task_index: usize,
    pub dropped: usize,
}

impl Display for DuplicateResponsesDropped {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Task {}: dropped {} duplicate response labels",
            self.task_index, self.dropped
        )
    }
}

impl StructuredLog for DuplicateResponsesDropped {
    fn log(&self) {
        tracing::warn!(task_index = self.task_index, dropped = self.dropped, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "duplicate_responses_dropped",
            span_name = name,
            task_index = self.task_index,
            dropped = self.dropped,
        )
    }
}

/// Input split into independent sub-inputs.
///
/// # Log Level
/// `debug!` - Per-execution detail
pub struct InputSplit {
    pub sub_inputs: usize,
}

impl Display for InputSplit {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Input split into {} sub-inputs", self.sub_inputs)
    }
}

impl StructuredLog for InputSplit {
    fn log(&self) {
        tracing::debug!(sub_inputs = self.sub_inputs, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("input_split", span_name = name, sub_inputs = self.sub_inputs)
    }
}
