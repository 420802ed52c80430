// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Configuration-level shape errors between functions, profiles and results.

use thiserror::Error;

/// A structural mismatch between a function, its profile, or the values
/// produced for them. Always fatal; most are caught at load time.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ShapeError {
    #[error("function declares {function_tasks} tasks but profile declares {profile_tasks}")]
    TaskCountMismatch {
        function_tasks: usize,
        profile_tasks: usize,
    },

    #[error("task {task_index}: profile has {weights} weights for {backends} ensemble members")]
    WeightCountMismatch {
        task_index: usize,
        weights: usize,
        backends: usize,
    },

    #[error("task {task_index}: ensemble is empty")]
    EmptyEnsemble { task_index: usize },

    #[error("task {task_index}: weight {weight} for ensemble member {backend_index} is not a finite number")]
    InvalidWeight {
        task_index: usize,
        backend_index: usize,
        weight: f64,
    },

    #[error("task {task_index}: expected {expected} backend outcomes, received {found}")]
    OutcomeCountMismatch {
        task_index: usize,
        expected: usize,
        found: usize,
    },

    #[error("task {task_index}: responses evaluated to an empty label set")]
    EmptyResponses { task_index: usize },

    #[error("task {task_index}: map refers to input_maps[{map_index}] but only {available} are declared")]
    InputMapOutOfRange {
        task_index: usize,
        map_index: usize,
        available: usize,
    },

    #[error("input_split and input_merge must be declared together")]
    IncompleteSplitMerge,
}
