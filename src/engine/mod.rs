// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod aggregator;
pub mod executor;

pub use aggregator::{aggregate, Aggregate};
pub use executor::{CallReport, ExecutionResult, Executor, MemberVote, TaskReport, TaskStatus};
