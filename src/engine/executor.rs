// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The execution entry point.
//!
//! An execution runs the whole pipeline for one input:
//!
//! ```text
//! input → schema gate → compile tasks → backend fan-out → aggregate → output
//! ```
//!
//! Every backend request of every task is spawned up front as its own tokio
//! task, bounded by a semaphore shared by all executions of this executor.
//! Results are joined in task order and ensemble order, never completion
//! order, so the output is independent of scheduling.
//!
//! Fatal errors never escape: they are reported on
//! [`ExecutionResult::error`] with a `null` output and no task details.
//!
//! # Split executions
//!
//! A function that declares `input_split` and `input_merge` can be executed
//! as one independent sub-execution per split item, merged back in index
//! order. This happens for [`Executor::execute_split`], and for
//! [`Executor::execute`] when the executor was built with `split_batches`.
//!
//! # Cancellation
//!
//! [`Executor::execute_with_cancellation`] abandons outstanding backend calls
//! as soon as its token is cancelled and discards every partial result.

use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, Span};

use crate::backends::{build_requests, BackendRequest, RngBackend, UnavailableBackend};
use crate::compiler::{
    compile_tasks, merge_outputs, resolve_output, split_input, CompiledTask, ScoredCall,
    TaskOutput, TaskPayload,
};
use crate::config::consts::{DEFAULT_MAX_CONCURRENCY, DEFAULT_RNG_SEED};
use crate::config::{validate_definitions, EngineConfig, FunctionDefinition, ProfileDefinition};
use crate::engine::aggregator::aggregate;
use crate::errors::{BackendFailure, ErrorInfo, ExecutionError};
use crate::observability::messages::backend::BackendRequestDispatched;
use crate::observability::messages::engine::{
    ExecutionCancelled, ExecutionCompleted, ExecutionFailed, ExecutionStarted,
    SplitExecutionStarted,
};
use crate::observability::messages::StructuredLog;
use crate::traits::Backend;

/// Outcome of one execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// The resolved output, or `null` when `error` is set.
    pub output: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_length: Option<usize>,
    /// Per-task detail: requests sent, votes received, aggregated scores.
    pub tasks: Vec<TaskReport>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
}

impl ExecutionResult {
    fn failed(error: &ExecutionError) -> Self {
        Self {
            output: Value::Null,
            output_length: None,
            tasks: Vec::new(),
            error: Some(error.info()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Skipped,
    Compiled,
    Mapped,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskReport {
    /// Sub-execution the task belongs to, for split executions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub split_index: Option<usize>,
    pub task_index: usize,
    pub status: TaskStatus,
    pub calls: Vec<CallReport>,
}

/// One payload's fan-out: every member's request and vote, plus the
/// aggregated scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallReport {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map_index: Option<usize>,
    pub responses: Vec<String>,
    pub scores: Vec<f64>,
    pub members: Vec<MemberVote>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberVote {
    pub model: String,
    pub weight: f64,
    pub request: BackendRequest,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scores: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

struct Completed {
    output: Value,
    output_length: usize,
    tasks: Vec<TaskReport>,
}

struct PendingCall {
    payload: TaskPayload,
    requests: Vec<BackendRequest>,
    handles: Vec<JoinHandle<Result<Vec<f64>, BackendFailure>>>,
}

/// Runs executions against a live backend, or the deterministic RNG backend
/// when asked for reproducible scores.
///
/// Cheap to clone; clones share backends and the concurrency limit.
#[derive(Clone)]
pub struct Executor {
    live: Arc<dyn Backend>,
    rng: Arc<dyn Backend>,
    semaphore: Arc<Semaphore>,
    max_concurrency: usize,
    split_batches: bool,
}

impl Default for Executor {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CONCURRENCY)
    }
}

impl Executor {
    /// An executor with no live backend: non-deterministic executions fail
    /// every ensemble member until one is supplied with
    /// [`Executor::with_backend`].
    pub fn new(max_concurrency: usize) -> Self {
        let max_concurrency = max_concurrency.max(1);
        Self {
            live: Arc::new(UnavailableBackend),
            rng: Arc::new(RngBackend::new(DEFAULT_RNG_SEED)),
            semaphore: Arc::new(Semaphore::new(max_concurrency)),
            max_concurrency,
            split_batches: false,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.executor_options.get_max_concurrency())
            .with_rng_backend(Arc::new(RngBackend::new(config.rng.get_seed())))
            .with_split_batches(config.split_batches)
    }

    pub fn with_backend(mut self, backend: Arc<dyn Backend>) -> Self {
        self.live = backend;
        self
    }

    pub fn with_rng_backend(mut self, backend: Arc<dyn Backend>) -> Self {
        self.rng = backend;
        self
    }

    pub fn with_split_batches(mut self, split_batches: bool) -> Self {
        self.split_batches = split_batches;
        self
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// Concurrency permits not currently held by a backend call.
    pub fn available_permits(&self) -> usize {
        self.semaphore.available_permits()
    }

    pub async fn execute(
        &self,
        input: Value,
        function: &FunctionDefinition,
        profile: &ProfileDefinition,
        deterministic: bool,
    ) -> ExecutionResult {
        self.execute_with_cancellation(input, function, profile, deterministic, CancellationToken::new())
            .await
    }

    pub async fn execute_with_cancellation(
        &self,
        input: Value,
        function: &FunctionDefinition,
        profile: &ProfileDefinition,
        deterministic: bool,
        token: CancellationToken,
    ) -> ExecutionResult {
        let (started, span) = self.start(function, deterministic);
        let outcome = if self.split_batches && function.split_merge().is_some() {
            self.run_split(input, function, profile, deterministic, &token)
                .instrument(span)
                .await
        } else {
            self.run(&input, function, profile, deterministic, &token)
                .instrument(span)
                .await
        };
        self.finish(outcome, function.tasks.len(), started)
    }

    /// Execute as independent per-item sub-executions when the function
    /// declares a split; otherwise identical to [`Executor::execute`].
    pub async fn execute_split(
        &self,
        input: Value,
        function: &FunctionDefinition,
        profile: &ProfileDefinition,
        deterministic: bool,
    ) -> ExecutionResult {
        let (started, span) = self.start(function, deterministic);
        let outcome = self
            .run_split(input, function, profile, deterministic, &CancellationToken::new())
            .instrument(span)
            .await;
        self.finish(outcome, function.tasks.len(), started)
    }

    fn start(&self, function: &FunctionDefinition, deterministic: bool) -> (Instant, Span) {
        let started = ExecutionStarted {
            task_count: function.tasks.len(),
            deterministic,
            max_concurrency: self.max_concurrency,
        };
        started.log();
        (Instant::now(), started.span("execute"))
    }

    fn finish(
        &self,
        outcome: Result<Completed, ExecutionError>,
        task_count: usize,
        started: Instant,
    ) -> ExecutionResult {
        match outcome {
            Ok(completed) => {
                ExecutionCompleted {
                    task_count,
                    output_length: completed.output_length,
                    duration: started.elapsed(),
                }
                .log();
                ExecutionResult {
                    output: completed.output,
                    output_length: Some(completed.output_length),
                    tasks: completed.tasks,
                    error: None,
                }
            }
            Err(error) => {
                if !matches!(error, ExecutionError::Cancelled) {
                    ExecutionFailed {
                        kind: error.kind().as_str(),
                        error: &error,
                    }
                    .log();
                }
                ExecutionResult::failed(&error)
            }
        }
    }

    async fn run(
        &self,
        input: &Value,
        function: &FunctionDefinition,
        profile: &ProfileDefinition,
        deterministic: bool,
        token: &CancellationToken,
    ) -> Result<Completed, ExecutionError> {
        check_shapes(function, profile)?;
        let compiled = compile_tasks(function, input)?;
        // Every exit, including `?` returns, cancels this execution's
        // outstanding backend calls and releases their permits.
        let token = &token.child_token();
        let _abort_on_exit = token.clone().drop_guard();
        let backend = if deterministic {
            self.rng.clone()
        } else {
            self.live.clone()
        };

        let mut pending = Vec::with_capacity(compiled.len());
        for (task_index, task) in compiled.iter().enumerate() {
            let llms = &profile.tasks[task_index].ensemble.llms;
            let calls: Vec<PendingCall> = task
                .payloads()
                .into_iter()
                .map(|payload| {
                    let requests = build_requests(payload, llms);
                    let handles = requests
                        .iter()
                        .map(|request| self.dispatch(&backend, request.clone(), token.clone()))
                        .collect();
                    PendingCall {
                        payload: payload.clone(),
                        requests,
                        handles,
                    }
                })
                .collect();
            pending.push(calls);
        }

        let mut outputs = Vec::with_capacity(compiled.len());
        let mut reports = Vec::with_capacity(compiled.len());
        for (task_index, (task, calls)) in compiled.iter().zip(pending).enumerate() {
            let task_profile = &profile.tasks[task_index];
            let mut scored = Vec::with_capacity(calls.len());
            let mut call_reports = Vec::with_capacity(calls.len());

            for call in calls {
                let mut outcomes = Vec::with_capacity(call.handles.len());
                for (handle, request) in call.handles.into_iter().zip(&call.requests) {
                    let outcome = tokio::select! {
                        biased;
                        _ = token.cancelled() => {
                            ExecutionCancelled {
                                completed_tasks: task_index,
                                task_count: compiled.len(),
                            }
                            .log();
                            return Err(ExecutionError::Cancelled);
                        }
                        joined = handle => joined.unwrap_or_else(|e| {
                            Err(BackendFailure::Aborted {
                                model: request.model.clone(),
                                reason: e.to_string(),
                            })
                        }),
                    };
                    outcomes.push(outcome);
                }

                let aggregated = aggregate(
                    task_index,
                    task_profile,
                    &outcomes,
                    call.payload.responses.len(),
                )?;

                let members = call
                    .requests
                    .into_iter()
                    .zip(aggregated.votes.iter().zip(&task_profile.profile))
                    .map(|(request, (vote, weight))| MemberVote {
                        model: request.model.clone(),
                        weight: *weight,
                        error: member_error(vote, &aggregated.failures, request.backend_index),
                        scores: vote.clone(),
                        request,
                    })
                    .collect();

                call_reports.push(CallReport {
                    map_index: call.payload.map_index,
                    responses: call.payload.responses.clone(),
                    scores: aggregated.scores.clone(),
                    members,
                });
                scored.push(ScoredCall {
                    scores: aggregated.scores,
                    responses: call.payload.responses,
                    votes: aggregated.votes,
                });
            }

            let (status, output) = match task {
                CompiledTask::Skipped => (TaskStatus::Skipped, TaskOutput::Skipped),
                CompiledTask::Compiled(_) => match scored.pop() {
                    Some(call) => (TaskStatus::Compiled, TaskOutput::Scored(call)),
                    None => {
                        return Err(ExecutionError::Internal {
                            message: format!("task {} compiled without a payload", task_index),
                        })
                    }
                },
                CompiledTask::Mapped { .. } => (TaskStatus::Mapped, TaskOutput::Mapped(scored)),
            };
            outputs.push(output);
            reports.push(TaskReport {
                split_index: None,
                task_index,
                status,
                calls: call_reports,
            });
        }

        let resolved = resolve_output(function, input, &outputs)?;
        Ok(Completed {
            output: resolved.output,
            output_length: resolved.output_length,
            tasks: reports,
        })
    }

    async fn run_split(
        &self,
        input: Value,
        function: &FunctionDefinition,
        profile: &ProfileDefinition,
        deterministic: bool,
        token: &CancellationToken,
    ) -> Result<Completed, ExecutionError> {
        check_shapes(function, profile)?;
        let parts = match split_input(function, &input)? {
            Some(parts) => parts,
            None => return self.run(&input, function, profile, deterministic, token).await,
        };

        SplitExecutionStarted {
            sub_inputs: parts.len(),
        }
        .log();

        // A failed sub-execution stops its siblings.
        let token = &token.child_token();
        let _abort_on_exit = token.clone().drop_guard();

        let function = Arc::new(function.clone());
        let profile = Arc::new(profile.clone());
        let handles: Vec<_> = parts
            .into_iter()
            .map(|part| {
                let executor = self.clone();
                let function = function.clone();
                let profile = profile.clone();
                let token = token.clone();
                tokio::spawn(
                    async move {
                        let result = executor
                            .run(&part, &function, &profile, deterministic, &token)
                            .await;
                        (part, result)
                    }
                    .in_current_span(),
                )
            })
            .collect();

        let mut pairs = Vec::with_capacity(handles.len());
        let mut tasks = Vec::new();
        for (split_index, handle) in handles.into_iter().enumerate() {
            let (part, result) = handle.await.map_err(|e| ExecutionError::Internal {
                message: format!("sub-execution {} did not complete: {}", split_index, e),
            })?;
            let completed = result?;
            tasks.extend(completed.tasks.into_iter().map(|mut report| {
                report.split_index = Some(split_index);
                report
            }));
            pairs.push((part, completed.output));
        }

        let merged = merge_outputs(&function, &pairs)?;
        let output_length = merged.output.as_array().map(Vec::len).unwrap_or(0);
        Ok(Completed {
            output: merged.output,
            output_length,
            tasks,
        })
    }

    fn dispatch(
        &self,
        backend: &Arc<dyn Backend>,
        request: BackendRequest,
        token: CancellationToken,
    ) -> JoinHandle<Result<Vec<f64>, BackendFailure>> {
        let dispatched = BackendRequestDispatched {
            task_index: request.task_index,
            model: &request.model,
            output_mode: request.output_mode.as_str(),
            backend: backend.name(),
        };
        dispatched.log();
        let span = dispatched.span("score");

        let backend = backend.clone();
        let semaphore = self.semaphore.clone();
        tokio::spawn(async move {
            let model = request.model.clone();
            tokio::select! {
                biased;
                _ = token.cancelled() => Err(BackendFailure::Aborted {
                    model,
                    reason: "execution cancelled".to_string(),
                }),
                result = async {
                    let _permit = semaphore.acquire_owned().await.map_err(|e| {
                        BackendFailure::Aborted {
                            model: request.model.clone(),
                            reason: format!("failed to acquire concurrency permit: {}", e),
                        }
                    })?;
                    backend.score(request).await
                } => result,
            }
        }.instrument(span))
    }
}

/// The first cross-document shape error, if any.
fn check_shapes(
    function: &FunctionDefinition,
    profile: &ProfileDefinition,
) -> Result<(), ExecutionError> {
    if let Err(errors) = validate_definitions(function, profile) {
        if let Some(first) = errors.into_iter().next() {
            return Err(first.into());
        }
    }
    Ok(())
}

fn member_error(
    vote: &Option<Vec<f64>>,
    failures: &[(usize, BackendFailure)],
    backend_index: usize,
) -> Option<String> {
    if vote.is_some() {
        return None;
    }
    failures
        .iter()
        .find(|(index, _)| *index == backend_index)
        .map(|(_, failure)| failure.to_string())
}
