// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod backends;      // scoring backends and request payloads
pub mod compiler;      // task compilation, output resolution, split/merge
pub mod config;        // definitions, engine config, loading
pub mod engine;        // executor and ensemble aggregation
pub mod errors;        // error handling
pub mod expression;    // query expression language
pub mod observability;
pub mod schema;        // input schema validation
pub mod traits;        // backend abstraction
