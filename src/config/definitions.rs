// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Function and profile definition documents.
//!
//! A *function* describes how an input becomes tasks and how task results
//! become an output. A *profile* says, for each task, which ensemble of
//! scoring backends runs it and how their votes are weighted. Both are
//! immutable once loaded and can be shared across concurrent executions.
//!
//! # Example
//! ```json
//! {
//!   "type": "vector.function",
//!   "input_schema": { "type": "object", "properties": { "need": { "type": "string" } } },
//!   "tasks": [{
//!     "type": "vector.completion",
//!     "messages": [{ "role": "user", "content": { "$jmespath": "input.need" } }],
//!     "responses": ["yes", "no"]
//!   }],
//!   "output": { "$jmespath": "tasks[0].scores" },
//!   "output_length": 2
//! }
//! ```

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::expression::{Expression, WithExpression};
use crate::schema::InputSchema;

/// Kind marker for function documents. Only vector functions exist today.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FunctionKind {
    #[default]
    #[serde(rename = "vector.function")]
    VectorFunction,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskKind {
    #[default]
    #[serde(rename = "vector.completion")]
    VectorCompletion,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDefinition {
    #[serde(rename = "type", default)]
    pub kind: FunctionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changelog: Option<String>,
    pub input_schema: InputSchema,
    /// Named sub-input lists that tasks can map over by index.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_maps: Option<Vec<Expression>>,
    pub tasks: Vec<TaskTemplate>,
    pub output: WithExpression<Value>,
    pub output_length: WithExpression<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_split: Option<Expression>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_merge: Option<Expression>,
}

impl FunctionDefinition {
    /// Split and merge expressions, when the function declares both.
    pub fn split_merge(&self) -> Option<(&Expression, &Expression)> {
        match (&self.input_split, &self.input_merge) {
            (Some(split), Some(merge)) => Some((split, merge)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskTemplate {
    #[serde(rename = "type", default)]
    pub kind: TaskKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip: Option<WithExpression<bool>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map: Option<TaskMap>,
    pub messages: Vec<MessageTemplate>,
    /// Tool definitions copied verbatim into every request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<Value>>,
    pub responses: WithExpression<Vec<String>>,
}

/// How a task fans out into several calls.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskMap {
    /// Index into the function's `input_maps`.
    Index(usize),
    /// Expression yielding the array of per-call sub-inputs.
    Expression(Expression),
}

impl Serialize for TaskMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            TaskMap::Index(index) => serializer.serialize_u64(*index as u64),
            TaskMap::Expression(expr) => expr.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for TaskMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        if let Some(index) = value.as_u64() {
            return usize::try_from(index)
                .map(TaskMap::Index)
                .map_err(D::Error::custom);
        }
        serde_json::from_value::<Expression>(value)
            .map(TaskMap::Expression)
            .map_err(|e| D::Error::custom(format!("map must be an index or an expression: {}", e)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    System,
    Developer,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageTemplate {
    pub role: Role,
    /// A literal string, an array of content parts, or an expression
    /// producing either.
    pub content: WithExpression<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// A message with its content resolved against a concrete input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: Value::String(content.into()),
            name: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changelog: Option<String>,
    pub tasks: Vec<TaskProfile>,
}

/// Ensemble and weights for one function task, matched by position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskProfile {
    pub ensemble: Ensemble,
    /// One weight per ensemble member.
    pub profile: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ensemble {
    pub llms: Vec<BackendConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendConfig {
    pub model: String,
    #[serde(default)]
    pub output_mode: OutputMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<ReasoningConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_logprobs: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
}

/// How a backend is asked to pick a candidate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputMode {
    #[default]
    JsonSchema,
    Instruction,
    ToolCall,
}

impl OutputMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputMode::JsonSchema => "json_schema",
            OutputMode::Instruction => "instruction",
            OutputMode::ToolCall => "tool_call",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReasoningConfig {
    pub enabled: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_explicit_nulls_are_accepted() {
        let function: FunctionDefinition = serde_json::from_value(json!({
            "type": "vector.function",
            "description": "d",
            "changelog": null,
            "input_schema": {"type": "string"},
            "input_maps": null,
            "tasks": [{
                "type": "vector.completion",
                "skip": null,
                "map": null,
                "messages": [{"role": "user", "content": {"$jmespath": "input"}}],
                "tools": null,
                "responses": ["a", "b"]
            }],
            "output": {"$jmespath": "tasks[0].scores"},
            "output_length": 2
        }))
        .unwrap();

        assert_eq!(function.kind, FunctionKind::VectorFunction);
        assert!(function.input_maps.is_none());
        assert!(function.tasks[0].skip.is_none());
        assert_eq!(function.output_length, WithExpression::Value(2));
        assert!(function.split_merge().is_none());
    }

    #[test]
    fn test_task_map_forms() {
        let index: TaskMap = serde_json::from_value(json!(1)).unwrap();
        assert_eq!(index, TaskMap::Index(1));

        let expr: TaskMap = serde_json::from_value(json!({"$jmespath": "input.items"})).unwrap();
        assert!(matches!(expr, TaskMap::Expression(_)));

        assert!(serde_json::from_value::<TaskMap>(json!("input.items")).is_err());
    }

    #[test]
    fn test_backend_config_defaults() {
        let backend: BackendConfig = serde_json::from_value(json!({"model": "m"})).unwrap();
        assert_eq!(backend.output_mode, OutputMode::JsonSchema);
        assert!(backend.reasoning.is_none());

        let backend: BackendConfig = serde_json::from_value(json!({
            "model": "x-ai/grok-4.1-fast",
            "output_mode": "instruction",
            "reasoning": {"enabled": false},
            "top_logprobs": 20
        }))
        .unwrap();
        assert_eq!(backend.output_mode, OutputMode::Instruction);
        assert_eq!(backend.reasoning, Some(ReasoningConfig { enabled: false }));
        assert_eq!(backend.top_logprobs, Some(20));
    }

    #[test]
    fn test_unknown_function_kind_rejected() {
        let result = serde_json::from_value::<FunctionKind>(json!("scalar.function"));
        assert!(result.is_err());
    }
}
