// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Observability module for structured logging and tracing.
//!
//! All diagnostic output goes through typed message structs rather than ad
//! hoc format strings. Each message implements `Display` for the human
//! readable line and [`messages::StructuredLog`] for emitting the event with
//! structured fields at its intended level.
//!
//! # Architecture
//!
//! Messages are organized by subsystem:
//! * `messages::engine` - execution lifecycle, aggregation and cancellation
//! * `messages::compiler` - schema gate, task compilation and input splitting
//! * `messages::backend` - ensemble member dispatch and failures
//! * `messages::validation` - definition and config loading
//!
//! # Usage
//!
//! ```rust
//! use the_ensemble::observability::messages::backend::BackendFailed;
//! use the_ensemble::observability::messages::StructuredLog;
//! use the_ensemble::errors::BackendFailure;
//!
//! let failure = BackendFailure::NonFinite { model: "openai/gpt-4o-mini".into() };
//! BackendFailed {
//!     task_index: 0,
//!     model: "openai/gpt-4o-mini",
//!     error: &failure,
//! }
//! .log();
//! ```

pub mod messages;
