// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Per-member request payloads.
//!
//! A compiled task payload is model-agnostic. Each ensemble member gets its
//! own copy carrying its model settings and a response contract matching its
//! output mode:
//!
//! * `json_schema` - a strict `response_format` whose `response_key` is an
//!   enum of the candidate labels
//! * `instruction` - an extra system message spelling out the same contract
//! * `tool_call` - an extra `respond` tool whose parameters are that schema

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::compiler::TaskPayload;
use crate::config::{BackendConfig, Message, OutputMode, ReasoningConfig};

/// Name of the field a backend answers with.
pub const RESPONSE_KEY: &str = "response_key";
/// Name of the tool added for `tool_call` members.
pub const RESPONSE_TOOL: &str = "respond";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendRequest {
    pub task_index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map_index: Option<usize>,
    /// Position of the member in its ensemble.
    pub backend_index: usize,
    pub model: String,
    pub output_mode: OutputMode,
    pub messages: Vec<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_format: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<ReasoningConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_logprobs: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// Candidate labels; a score vector has one entry per label.
    pub responses: Vec<String>,
}

/// Build one request per ensemble member, in ensemble order.
pub fn build_requests(payload: &TaskPayload, llms: &[BackendConfig]) -> Vec<BackendRequest> {
    llms.iter()
        .enumerate()
        .map(|(backend_index, llm)| build_request(payload, backend_index, llm))
        .collect()
}

fn build_request(payload: &TaskPayload, backend_index: usize, llm: &BackendConfig) -> BackendRequest {
    let schema = response_schema(&payload.responses);
    let mut messages = payload.messages.clone();
    let mut tools = payload.tools.clone();
    let mut response_format = None;

    match llm.output_mode {
        OutputMode::JsonSchema => {
            response_format = Some(json!({
                "type": "json_schema",
                "json_schema": {
                    "name": "response",
                    "strict": true,
                    "schema": schema,
                }
            }));
        }
        OutputMode::Instruction => {
            messages.push(Message::system(instruction(&payload.responses)));
        }
        OutputMode::ToolCall => {
            tools.get_or_insert_with(Vec::new).push(json!({
                "type": "function",
                "function": {
                    "name": RESPONSE_TOOL,
                    "description": "Submit the selected response.",
                    "strict": true,
                    "parameters": schema,
                }
            }));
        }
    }

    BackendRequest {
        task_index: payload.task_index,
        map_index: payload.map_index,
        backend_index,
        model: llm.model.clone(),
        output_mode: llm.output_mode,
        messages,
        tools,
        response_format,
        reasoning: llm.reasoning,
        top_logprobs: llm.top_logprobs,
        temperature: llm.temperature,
        responses: payload.responses.clone(),
    }
}

fn response_schema(responses: &[String]) -> Value {
    json!({
        "type": "object",
        "properties": {
            RESPONSE_KEY: {
                "type": "string",
                "enum": responses,
            }
        },
        "required": [RESPONSE_KEY],
        "additionalProperties": false,
    })
}

fn instruction(responses: &[String]) -> String {
    let options = responses
        .iter()
        .map(|r| format!("\"{}\"", r))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "Respond with only a JSON object of the form {{\"{}\": \"<choice>\"}}, where <choice> is exactly one of: {}.",
        RESPONSE_KEY, options
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Role;

    fn payload() -> TaskPayload {
        TaskPayload {
            task_index: 0,
            map_index: None,
            messages: vec![Message {
                role: Role::User,
                content: json!("pick one"),
                name: None,
            }],
            tools: None,
            responses: vec!["A".into(), "B".into()],
        }
    }

    fn llm(mode: &str) -> BackendConfig {
        serde_json::from_value(json!({"model": format!("m-{}", mode), "output_mode": mode, "top_logprobs": 20})).unwrap()
    }

    #[test]
    fn test_json_schema_mode() {
        let requests = build_requests(&payload(), &[llm("json_schema")]);
        let request = &requests[0];
        assert_eq!(request.messages.len(), 1);
        assert!(request.tools.is_none());
        let format = request.response_format.as_ref().unwrap();
        assert_eq!(
            format["json_schema"]["schema"]["properties"][RESPONSE_KEY]["enum"],
            json!(["A", "B"])
        );
        assert_eq!(request.top_logprobs, Some(20));
    }

    #[test]
    fn test_instruction_mode_appends_system_message() {
        let requests = build_requests(&payload(), &[llm("instruction")]);
        let request = &requests[0];
        assert!(request.response_format.is_none());
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[1].role, Role::System);
        let text = request.messages[1].content.as_str().unwrap();
        assert!(text.contains("\"A\", \"B\""));
    }

    #[test]
    fn test_tool_call_mode_adds_respond_tool() {
        let requests = build_requests(&payload(), &[llm("tool_call")]);
        let tools = requests[0].tools.as_ref().unwrap();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0]["function"]["name"], json!(RESPONSE_TOOL));
    }

    #[test]
    fn test_one_request_per_member_in_order() {
        let requests = build_requests(&payload(), &[llm("json_schema"), llm("instruction"), llm("tool_call")]);
        let indexes: Vec<_> = requests.iter().map(|r| r.backend_index).collect();
        assert_eq!(indexes, vec![0, 1, 2]);
        assert!(requests.iter().all(|r| r.responses == vec!["A", "B"]));
    }
}
