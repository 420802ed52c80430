// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod definitions;
mod loader;
mod validation;

#[cfg(test)]
mod integration_tests;
pub mod consts;

pub use definitions::{
    BackendConfig, Ensemble, FunctionDefinition, FunctionKind, Message, MessageTemplate,
    OutputMode, ProfileDefinition, ReasoningConfig, Role, TaskKind, TaskMap, TaskProfile,
    TaskTemplate,
};
pub use loader::{
    load_and_validate_definitions, load_config, load_function, load_input, load_profile,
    EngineConfig, ExecutorOptions, RngConfig,
};
pub use validation::{non_positive_weights, validate_definitions, validate_function};
