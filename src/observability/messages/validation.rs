// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for definition and configuration loading.
//!
//! This module contains message types for logging events related to:
//! * Cross-document validation of functions and profiles
//! * Weight warnings that do not fail a load
//! * Engine configuration loading

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// An ensemble member has a weight that can never contribute.
///
/// Zero and negative weights are accepted at load time; the aggregator
/// excludes them.
///
/// # Log Level
/// `warn!` - Potential issue that doesn't prevent execution
///
/// # Example
/// ```
/// use the_ensemble::observability::messages::validation::NonPositiveWeight;
///
/// let msg = NonPositiveWeight {
///     task_index: 0,
///     backend_index: 2,
///     model: "x-ai/grok-4.1-fast",
///     weight: 0.0,
/// };
///
/// tracing::warn!("{}", msg);
/// ```
pub struct NonPositiveWeight<'a> {
    pub task_index: usize,
    pub backend_index: usize,
    pub model: &'a str,
    pub weight: f64,
}

impl Display for NonPositiveWeight<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Task {}: ensemble member {} ('{}') has non-positive weight {} and will never contribute",
            self.task_index, self.backend_index, self.model, self.weight
        )
    }
}

impl StructuredLog for NonPositiveWeight<'_> {
    fn log(&self) {
        tracing::warn!(
            task_index = self.task_index,
            backend_index = self.backend_index,
            model = self.model,
            weight = self.weight,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::span!(
            tracing::Level::WARN,
            "span_name",
            name = name,
            task_index = self.task_index,
            backend_index = self.backend_index,
            model = self.model,
        )
    }
}

/// Function and profile validated together.
///
/// # Log Level
/// `info!` - Important operational event
pub struct ValidationCompleted {
    pub task_count: usize,
    pub warning_count: usize,
}

impl Display for ValidationCompleted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        if self.warning_count > 0 {
            write!(
                f,
                "Definition validation completed for {} tasks with {} warnings",
                self.task_count, self.warning_count
            )
        } else {
            write!(
                f,
                "Definition validation completed successfully for {} tasks",
                self.task_count
            )
        }
    }
}

impl StructuredLog for ValidationCompleted {
    fn log(&self) {
        tracing::info!(
            task_count = self.task_count,
            warning_count = self.warning_count,
            has_warnings = self.warning_count > 0,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::span!(
            tracing::Level::INFO,
            "span_name",
            name = name,
            task_count = self.task_count,
            warning_count = self.warning_count,
        )
    }
}

/// Definition validation failed.
///
/// # Log Level
/// `error!` - Failure requiring attention
///
/// # Example
/// ```
/// use the_ensemble::observability::messages::validation::ValidationFailed;
///
/// let msg = ValidationFailed {
///     error_count: 3,
/// };
///
/// tracing::error!("{}", msg);
/// ```
pub struct ValidationFailed {
    pub error_count: usize,
}

impl Display for ValidationFailed {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Definition validation failed with {} errors",
            self.error_count
        )
    }
}

impl StructuredLog for ValidationFailed {
    fn log(&self) {
        tracing::error!(
            error_count = self.error_count,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::span!(
            tracing::Level::ERROR,
            "span_name",
            name = name,
            error_count = self.error_count,
        )
    }
}

pub struct ConfigLoaded<'a> {
    pub path: &'a str,
    pub max_concurrency: usize,
    pub split_batches: bool,
}

impl Display for ConfigLoaded<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Loaded engine config from {}: max_concurrency={}, split_batches={}",
            self.path, self.max_concurrency, self.split_batches
        )
    }
}

impl StructuredLog for ConfigLoaded<'_> {
    fn log(&self) {
        tracing::info!(
            path = self.path,
            max_concurrency = self.max_concurrency,
            split_batches = self.split_batches,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::span!(
            tracing::Level::INFO,
            "span_name",
            name = name,
            path = self.path,
        )
    }
}
