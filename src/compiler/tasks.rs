// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Task compilation: turn templates plus a concrete input into the payloads
//! an executor sends to backends.
//!
//! Every compile call passes the schema gate first. A task then moves from
//! pending to one of three states:
//!
//! * **Skipped** - its `skip` expression was true; no messages are resolved
//!   and no backend is called
//! * **Compiled** - one payload resolved against `{input}`
//! * **Mapped** - one payload per element of its `map` array, each resolved
//!   against `{input: element}`
//!
//! A compiled payload is self-contained: running it needs no access to the
//! function definition.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::config::{FunctionDefinition, Message, TaskMap, TaskTemplate};
use crate::errors::{ConsistencyError, EvaluationError, ExecutionError, ShapeError};
use crate::expression::{non_negative_integer, type_name, WithExpression};
use crate::observability::messages::compiler::{
    DuplicateResponsesDropped, SchemaRejected, TaskSkipped, TasksCompiled,
};
use crate::observability::messages::StructuredLog;

/// Everything needed to run one backend fan-out for a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskPayload {
    pub task_index: usize,
    /// Position within the task's map, for mapped tasks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map_index: Option<usize>,
    pub messages: Vec<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<Value>>,
    /// Ordered, de-duplicated candidate labels. Every score vector for this
    /// payload has exactly one entry per label.
    pub responses: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CompiledTask {
    Skipped,
    Compiled(TaskPayload),
    Mapped { calls: Vec<TaskPayload> },
}

impl CompiledTask {
    /// Payloads that need backend calls, in call order.
    pub fn payloads(&self) -> Vec<&TaskPayload> {
        match self {
            CompiledTask::Skipped => Vec::new(),
            CompiledTask::Compiled(payload) => vec![payload],
            CompiledTask::Mapped { calls } => calls.iter().collect(),
        }
    }

    /// Short `{type, skipped, mapped}` description, with `mapped` the call
    /// count for mapped tasks.
    pub fn summary(&self) -> Value {
        let (skipped, mapped) = match self {
            CompiledTask::Skipped => (true, Value::Null),
            CompiledTask::Compiled(_) => (false, Value::Null),
            CompiledTask::Mapped { calls } => (false, Value::from(calls.len())),
        };
        json!({
            "type": "vector.completion",
            "skipped": skipped,
            "mapped": mapped,
        })
    }
}

/// Run the function's input schema against `input`.
pub(crate) fn check_input(function: &FunctionDefinition, input: &Value) -> Result<(), ExecutionError> {
    function.input_schema.validate(input).map_err(|e| {
        SchemaRejected {
            path: &e.path,
            reason: &e.reason,
        }
        .log();
        ExecutionError::from(e)
    })
}

/// Compile every task template of `function` against `input`, in
/// declaration order.
pub fn compile_tasks(
    function: &FunctionDefinition,
    input: &Value,
) -> Result<Vec<CompiledTask>, ExecutionError> {
    check_input(function, input)?;

    let context = json!({ "input": input });
    let mut compiled = Vec::with_capacity(function.tasks.len());
    for (task_index, template) in function.tasks.iter().enumerate() {
        compiled.push(compile_task(function, task_index, template, &context)?);
    }

    TasksCompiled {
        task_count: compiled.len(),
        skipped: compiled
            .iter()
            .filter(|t| matches!(t, CompiledTask::Skipped))
            .count(),
        mapped_calls: compiled
            .iter()
            .map(|t| match t {
                CompiledTask::Mapped { calls } => calls.len(),
                _ => 0,
            })
            .sum(),
    }
    .log();

    Ok(compiled)
}

/// Evaluate the function's `output_length` against `{input}`.
pub fn compile_output_length(
    function: &FunctionDefinition,
    input: &Value,
) -> Result<usize, ExecutionError> {
    check_input(function, input)?;
    let context = json!({ "input": input });
    resolve_output_length(&function.output_length, &context)
}

pub(crate) fn resolve_output_length(
    output_length: &WithExpression<usize>,
    context: &Value,
) -> Result<usize, ExecutionError> {
    let value = output_length
        .resolve(context)
        .map_err(|e| ExecutionError::evaluation("output_length", e))?;
    non_negative_integer(&value).ok_or_else(|| {
        ConsistencyError::InvalidOutputLength {
            found: value.to_string(),
        }
        .into()
    })
}

fn compile_task(
    function: &FunctionDefinition,
    task_index: usize,
    template: &TaskTemplate,
    context: &Value,
) -> Result<CompiledTask, ExecutionError> {
    if let Some(skip) = &template.skip {
        let location = format!("tasks[{}].skip", task_index);
        match skip
            .resolve(context)
            .map_err(|e| ExecutionError::evaluation(&location, e))?
        {
            Value::Bool(true) => {
                TaskSkipped { task_index }.log();
                return Ok(CompiledTask::Skipped);
            }
            Value::Bool(false) => {}
            other => {
                return Err(ExecutionError::evaluation(
                    location,
                    EvaluationError::type_mismatch("skip", "boolean", type_name(&other)),
                ))
            }
        }
    }

    let Some(map) = &template.map else {
        let payload = compile_payload(task_index, None, template, context)?;
        return Ok(CompiledTask::Compiled(payload));
    };

    let location = format!("tasks[{}].map", task_index);
    let elements = match map {
        TaskMap::Index(map_index) => {
            let maps = function.input_maps.as_deref().unwrap_or(&[]);
            let expr = maps.get(*map_index).ok_or(ShapeError::InputMapOutOfRange {
                task_index,
                map_index: *map_index,
                available: maps.len(),
            })?;
            expr.evaluate(context)
        }
        TaskMap::Expression(expr) => expr.evaluate(context),
    }
    .map_err(|e| ExecutionError::evaluation(&location, e))?;

    let elements = match elements {
        Value::Array(elements) => elements,
        other => {
            return Err(ExecutionError::evaluation(
                location,
                EvaluationError::type_mismatch("map", "array", type_name(&other)),
            ))
        }
    };

    let mut calls = Vec::with_capacity(elements.len());
    for (map_index, element) in elements.into_iter().enumerate() {
        let mapped_context = json!({ "input": element });
        calls.push(compile_payload(
            task_index,
            Some(map_index),
            template,
            &mapped_context,
        )?);
    }
    Ok(CompiledTask::Mapped { calls })
}

fn compile_payload(
    task_index: usize,
    map_index: Option<usize>,
    template: &TaskTemplate,
    context: &Value,
) -> Result<TaskPayload, ExecutionError> {
    let mut messages = Vec::with_capacity(template.messages.len());
    for (message_index, message) in template.messages.iter().enumerate() {
        let location = format!("tasks[{}].messages[{}].content", task_index, message_index);
        let content = message
            .content
            .resolve(context)
            .map_err(|e| ExecutionError::evaluation(&location, e))?;
        if !(content.is_string() || content.is_array()) {
            return Err(ExecutionError::evaluation(
                location,
                EvaluationError::type_mismatch(
                    "message content",
                    "string or content parts",
                    type_name(&content),
                ),
            ));
        }
        messages.push(Message {
            role: message.role,
            content,
            name: message.name.clone(),
        });
    }

    let responses = resolve_responses(task_index, &template.responses, context)?;

    Ok(TaskPayload {
        task_index,
        map_index,
        messages,
        tools: template.tools.clone(),
        responses,
    })
}

fn resolve_responses(
    task_index: usize,
    responses: &WithExpression<Vec<String>>,
    context: &Value,
) -> Result<Vec<String>, ExecutionError> {
    let location = format!("tasks[{}].responses", task_index);
    let value = responses
        .resolve(context)
        .map_err(|e| ExecutionError::evaluation(&location, e))?;

    let items = match value {
        Value::Array(items) => items,
        other => {
            return Err(ExecutionError::evaluation(
                location,
                EvaluationError::type_mismatch("responses", "array", type_name(&other)),
            ))
        }
    };

    let total = items.len();
    let mut seen = HashSet::with_capacity(total);
    let mut labels = Vec::with_capacity(total);
    for item in items {
        let label = match item {
            Value::String(label) => label,
            other => {
                return Err(ExecutionError::evaluation(
                    location,
                    EvaluationError::type_mismatch(
                        "responses element",
                        "string",
                        type_name(&other),
                    ),
                ))
            }
        };
        if seen.insert(label.clone()) {
            labels.push(label);
        }
    }

    if labels.len() < total {
        DuplicateResponsesDropped {
            task_index,
            dropped: total - labels.len(),
        }
        .log();
    }
    if labels.is_empty() {
        return Err(ShapeError::EmptyResponses { task_index }.into());
    }
    Ok(labels)
}
