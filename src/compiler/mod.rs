// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Compile-time half of the engine: tasks, output resolution and batch
//! splitting. Nothing here calls a backend.

mod output;
mod split;
mod tasks;

pub use output::{resolve_output, ResolvedOutput, ScoredCall, TaskOutput};
pub use split::{merge_outputs, split_input, MergedOutput};
pub use tasks::{compile_output_length, compile_tasks, CompiledTask, TaskPayload};
pub(crate) use tasks::check_input;
