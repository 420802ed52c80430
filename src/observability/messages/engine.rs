// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for execution lifecycle events.
//!
//! This module contains message types for logging events related to:
//! * Execution start, completion and failure
//! * Split executions and their sub-inputs
//! * Ensemble aggregation per task
//! * Cancellation

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// Execution started.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use the_ensemble::observability::messages::engine::ExecutionStarted;
///
/// let msg = ExecutionStarted {
///     task_count: 1,
///     deterministic: true,
///     max_concurrency: 8,
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct ExecutionStarted {
    pub task_count: usize,
    pub deterministic: bool,
    pub max_concurrency: usize,
}

impl Display for ExecutionStarted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Starting execution: {} tasks, deterministic={}, max_concurrency={}",
            self.task_count, self.deterministic, self.max_concurrency
        )
    }
}

impl StructuredLog for ExecutionStarted {
    fn log(&self) {
        tracing::info!(
            task_count = self.task_count,
            deterministic = self.deterministic,
            max_concurrency = self.max_concurrency,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "execution",
            span_name = name,
            task_count = self.task_count,
            deterministic = self.deterministic,
            max_concurrency = self.max_concurrency,
        )
    }
}

/// Execution completed successfully.
///
/// # Log Level
/// `info!` - Important operational event
pub struct ExecutionCompleted {
    pub task_count: usize,
    pub output_length: usize,
    pub duration: std::time::Duration,
}

impl Display for ExecutionCompleted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Execution completed: {} tasks, {} output items in {:?}",
            self.task_count, self.output_length, self.duration
        )
    }
}

impl StructuredLog for ExecutionCompleted {
    fn log(&self) {
        tracing::info!(
            task_count = self.task_count,
            output_length = self.output_length,
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "execution_completed",
            span_name = name,
            task_count = self.task_count,
            output_length = self.output_length,
            duration = ?self.duration,
        )
    }
}

/// Execution ended with a fatal error. The error is reported on the result,
/// this message only records it.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct ExecutionFailed<'a> {
    pub kind: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for ExecutionFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Execution failed ({}): {}", self.kind, self.error)
    }
}

impl StructuredLog for ExecutionFailed<'_> {
    fn log(&self) {
        tracing::error!(
            kind = self.kind,
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "execution_failed",
            span_name = name,
            kind = self.kind,
            error = %self.error,
        )
    }
}

/// Execution was cancelled before every task finished.
///
/// # Log Level
/// `warn!` - Partial work discarded
pub struct ExecutionCancelled {
    pub completed_tasks: usize,
    pub task_count: usize,
}

impl Display for ExecutionCancelled {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Execution cancelled after {}/{} tasks; partial results discarded",
            self.completed_tasks, self.task_count
        )
    }
}

impl StructuredLog for ExecutionCancelled {
    fn log(&self) {
        tracing::warn!(
            completed_tasks = self.completed_tasks,
            task_count = self.task_count,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "execution_cancelled",
            span_name = name,
            completed_tasks = self.completed_tasks,
            task_count = self.task_count,
        )
    }
}

/// A batched input is being executed as independent sub-executions.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use the_ensemble::observability::messages::engine::SplitExecutionStarted;
///
/// let msg = SplitExecutionStarted { sub_inputs: 3 };
/// assert_eq!(msg.to_string(), "Executing split input as 3 independent sub-executions");
/// ```
pub struct SplitExecutionStarted {
    pub sub_inputs: usize,
}

impl Display for SplitExecutionStarted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Executing split input as {} independent sub-executions",
            self.sub_inputs
        )
    }
}

impl StructuredLog for SplitExecutionStarted {
    fn log(&self) {
        tracing::info!(sub_inputs = self.sub_inputs, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("split_execution", span_name = name, sub_inputs = self.sub_inputs)
    }
}

/// Votes for one task (or one mapped call) were combined.
///
/// # Log Level
/// `debug!` - Per-task detail
pub struct TaskAggregated {
    pub task_index: usize,
    pub candidate_count: usize,
    pub contributing: usize,
    pub excluded: usize,
}

impl Display for TaskAggregated {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Task {} aggregated over {} candidates: {} members contributed, {} excluded",
            self.task_index, self.candidate_count, self.contributing, self.excluded
        )
    }
}

impl StructuredLog for TaskAggregated {
    fn log(&self) {
        tracing::debug!(
            task_index = self.task_index,
            candidate_count = self.candidate_count,
            contributing = self.contributing,
            excluded = self.excluded,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "task_aggregated",
            span_name = name,
            task_index = self.task_index,
            candidate_count = self.candidate_count,
        )
    }
}

/// No ensemble member with positive weight produced a usable vector.
///
/// # Log Level
/// `error!` - Task cannot produce scores
pub struct EnsembleExhausted {
    pub task_index: usize,
    pub failures: usize,
}

impl Display for EnsembleExhausted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Task {}: every positively weighted ensemble member failed ({} failures)",
            self.task_index, self.failures
        )
    }
}

impl StructuredLog for EnsembleExhausted {
    fn log(&self) {
        tracing::error!(
            task_index = self.task_index,
            failures = self.failures,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "ensemble_exhausted",
            span_name = name,
            task_index = self.task_index,
            failures = self.failures,
        )
    }
}
