// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

/// Default cap on in-flight backend requests across all tasks of an execution
pub const DEFAULT_MAX_CONCURRENCY: usize = 16;
/// Default seed mixed into every deterministic RNG backend request hash
pub const DEFAULT_RNG_SEED: u64 = 0;
/// Largest count `repeat` accepts before the expression is rejected
pub const MAX_REPEAT_COUNT: usize = 1 << 20;
/// File extensions accepted for definition documents
pub const JSON_EXTENSIONS: &[&str] = &["json"];
pub const YAML_EXTENSIONS: &[&str] = &["yaml", "yml"];
pub const TOML_EXTENSIONS: &[&str] = &["toml"];
