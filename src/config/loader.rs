// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::consts::{
    DEFAULT_MAX_CONCURRENCY, DEFAULT_RNG_SEED, JSON_EXTENSIONS, TOML_EXTENSIONS, YAML_EXTENSIONS,
};
use crate::config::definitions::{FunctionDefinition, ProfileDefinition};
use crate::config::validation::{non_positive_weights, validate_definitions};
use crate::errors::{ConfigError, DefinitionError};
use crate::observability::messages::validation::{
    ConfigLoaded, NonPositiveWeight, ValidationCompleted, ValidationFailed,
};
use crate::observability::messages::StructuredLog;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::fs;
use std::path::Path;

/// Engine configuration, typically loaded from a YAML file.
///
/// Every field is optional; absent values fall back to the defaults in
/// [`crate::config::consts`].
///
/// # Example
/// ```yaml
/// executor_options:
///   max_concurrency: 8
/// rng:
///   seed: 42
/// split_batches: false
/// ```
#[derive(Debug, Default, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub executor_options: ExecutorOptions,
    #[serde(default)]
    pub rng: RngConfig,
    /// Execute functions that declare `input_split`/`input_merge` as one
    /// sub-execution per split item.
    #[serde(default)]
    pub split_batches: bool,
}

/// Executor-specific configuration options.
///
/// # Fields
/// * `max_concurrency` - Maximum number of backend requests in flight at once (optional)
#[derive(Debug, Default, Deserialize)]
pub struct ExecutorOptions {
    pub max_concurrency: Option<usize>,
}

impl ExecutorOptions {
    pub fn get_max_concurrency(&self) -> usize {
        self.max_concurrency.unwrap_or(DEFAULT_MAX_CONCURRENCY)
    }
}

/// Seed for the deterministic RNG backend.
#[derive(Debug, Default, Deserialize)]
pub struct RngConfig {
    pub seed: Option<u64>,
}

impl RngConfig {
    pub fn get_seed(&self) -> u64 {
        self.seed.unwrap_or(DEFAULT_RNG_SEED)
    }
}

/// Load engine configuration from a YAML file.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<EngineConfig, ConfigError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let cfg: EngineConfig = serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    if cfg.executor_options.max_concurrency == Some(0) {
        return Err(ConfigError::Invalid {
            field: "executor_options.max_concurrency",
            reason: "must be at least 1".to_string(),
        });
    }

    ConfigLoaded {
        path: &path.display().to_string(),
        max_concurrency: cfg.executor_options.get_max_concurrency(),
        split_batches: cfg.split_batches,
    }
    .log();

    Ok(cfg)
}

/// Deserialize a JSON, YAML or TOML document, chosen by file extension.
fn load_document<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> Result<T, DefinitionError> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    let read = || {
        fs::read_to_string(path).map_err(|source| DefinitionError::Io {
            path: path.to_path_buf(),
            source,
        })
    };

    if JSON_EXTENSIONS.contains(&extension.as_str()) {
        serde_json::from_str(&read()?).map_err(|source| DefinitionError::Json {
            path: path.to_path_buf(),
            source,
        })
    } else if YAML_EXTENSIONS.contains(&extension.as_str()) {
        serde_yaml::from_str(&read()?).map_err(|source| DefinitionError::Yaml {
            path: path.to_path_buf(),
            source,
        })
    } else if TOML_EXTENSIONS.contains(&extension.as_str()) {
        toml::from_str(&read()?).map_err(|source| DefinitionError::Toml {
            path: path.to_path_buf(),
            source,
        })
    } else {
        Err(DefinitionError::UnsupportedFormat(path.to_path_buf()))
    }
}

/// Load a function definition. Expressions are parsed here, so a malformed
/// expression fails the load.
pub fn load_function<P: AsRef<Path>>(path: P) -> Result<FunctionDefinition, DefinitionError> {
    load_document(path)
}

pub fn load_profile<P: AsRef<Path>>(path: P) -> Result<ProfileDefinition, DefinitionError> {
    load_document(path)
}

/// Load an input value from a JSON, YAML or TOML file.
pub fn load_input<P: AsRef<Path>>(path: P) -> Result<Value, DefinitionError> {
    load_document(path)
}

/// Load a function and a profile and validate them against each other.
///
/// All shape errors are reported together. Non-positive weights only warn.
pub fn load_and_validate_definitions<P: AsRef<Path>, Q: AsRef<Path>>(
    function_path: P,
    profile_path: Q,
) -> Result<(FunctionDefinition, ProfileDefinition), DefinitionError> {
    let function = load_function(function_path)?;
    let profile = load_profile(profile_path)?;

    if let Err(errors) = validate_definitions(&function, &profile) {
        ValidationFailed {
            error_count: errors.len(),
        }
        .log();
        return Err(DefinitionError::Validation(errors));
    }

    let warnings = non_positive_weights(&profile);
    for (task_index, backend_index, weight) in &warnings {
        NonPositiveWeight {
            task_index: *task_index,
            backend_index: *backend_index,
            model: &profile.tasks[*task_index].ensemble.llms[*backend_index].model,
            weight: *weight,
        }
        .log();
    }

    ValidationCompleted {
        task_count: function.tasks.len(),
        warning_count: warnings.len(),
    }
    .log();

    Ok((function, profile))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_temp(suffix: &str, content: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn parse_basic_config() {
        let yaml = r#"
executor_options:
  max_concurrency: 4
rng:
  seed: 7
split_batches: true
"#;
        let cfg: EngineConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.executor_options.get_max_concurrency(), 4);
        assert_eq!(cfg.rng.get_seed(), 7);
        assert!(cfg.split_batches);
    }

    #[test]
    fn test_config_defaults() {
        let cfg: EngineConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(cfg.executor_options.get_max_concurrency(), DEFAULT_MAX_CONCURRENCY);
        assert_eq!(cfg.rng.get_seed(), DEFAULT_RNG_SEED);
        assert!(!cfg.split_batches);
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let file = write_temp(".yaml", "executor_options:\n  max_concurrency: 0\n");
        let err = load_config(file.path()).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "executor_options.max_concurrency",
                ..
            }
        ));
    }

    #[test]
    fn test_missing_config_file() {
        let err = load_config("does/not/exist.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_load_yaml_and_toml_profiles() {
        let yaml = write_temp(
            ".yml",
            "tasks:\n  - ensemble:\n      llms:\n        - model: a\n          output_mode: tool_call\n    profile: [0.5]\n",
        );
        let profile = load_profile(yaml.path()).unwrap();
        assert_eq!(profile.tasks[0].ensemble.llms[0].model, "a");

        let toml = write_temp(
            ".toml",
            "[[tasks]]\nprofile = [1.0, 2.0]\n[[tasks.ensemble.llms]]\nmodel = \"a\"\n[[tasks.ensemble.llms]]\nmodel = \"b\"\n",
        );
        let profile = load_profile(toml.path()).unwrap();
        assert_eq!(profile.tasks[0].profile, vec![1.0, 2.0]);
        assert_eq!(profile.tasks[0].ensemble.llms.len(), 2);
    }

    #[test]
    fn test_unsupported_extension() {
        let file = write_temp(".txt", "{}");
        assert!(matches!(
            load_profile(file.path()),
            Err(DefinitionError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_malformed_expression_fails_load() {
        let file = write_temp(
            ".json",
            r#"{
                "input_schema": {"type": "string"},
                "tasks": [],
                "output": {"$jmespath": "tasks[0"},
                "output_length": 0
            }"#,
        );
        let err = load_function(file.path()).unwrap_err();
        assert!(matches!(err, DefinitionError::Json { .. }));
        assert!(err.to_string().contains("invalid expression"));
    }
}
