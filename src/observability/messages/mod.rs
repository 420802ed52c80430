// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Centralized message types for structured logging.
//!
//! * `engine` - execution lifecycle and aggregation events
//! * `compiler` - schema validation, compilation and splitting
//! * `backend` - ensemble member requests and failures
//! * `validation` - definition and configuration loading
//!
//! # Usage Pattern
//!
//! ```rust
//! use the_ensemble::observability::messages::engine::ExecutionStarted;
//!
//! let msg = ExecutionStarted {
//!     task_count: 1,
//!     deterministic: true,
//!     max_concurrency: 8,
//! };
//!
//! tracing::info!("{}", msg);
//! ```

use tracing::Span;

pub mod backend;
pub mod compiler;
pub mod engine;
pub mod validation;

/// Emit a message as a tracing event, or open a span carrying its fields.
pub trait StructuredLog {
    /// Log the event at the level the message is intended for.
    fn log(&self);

    /// A span carrying the message's fields, for wrapping the work it
    /// describes.
    fn span(&self, name: &str) -> Span;
}
