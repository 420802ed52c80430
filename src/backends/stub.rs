// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;

use crate::backends::BackendRequest;
use crate::errors::BackendFailure;
use crate::traits::Backend;

/// Member `i` casts a one-hot vote for candidate `i % n`.
pub struct FixedPermutationBackend;

#[async_trait]
impl Backend for FixedPermutationBackend {
    async fn score(&self, request: BackendRequest) -> Result<Vec<f64>, BackendFailure> {
        let count = request.responses.len();
        let choice = request.backend_index % count.max(1);
        Ok((0..count).map(|i| if i == choice { 1.0 } else { 0.0 }).collect())
    }

    fn name(&self) -> &'static str {
        "fixed_permutation"
    }
}

/// Returns a canned outcome per model; unknown models are unavailable.
pub struct ScriptedBackend {
    pub outcomes: HashMap<String, Result<Vec<f64>, BackendFailure>>,
}

impl ScriptedBackend {
    pub fn new(outcomes: Vec<(&str, Result<Vec<f64>, BackendFailure>)>) -> Self {
        Self {
            outcomes: outcomes
                .into_iter()
                .map(|(model, outcome)| (model.to_string(), outcome))
                .collect(),
        }
    }
}

#[async_trait]
impl Backend for ScriptedBackend {
    async fn score(&self, request: BackendRequest) -> Result<Vec<f64>, BackendFailure> {
        self.outcomes
            .get(&request.model)
            .cloned()
            .unwrap_or_else(|| {
                Err(BackendFailure::Unavailable {
                    model: request.model.clone(),
                    reason: "not scripted".to_string(),
                })
            })
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

/// A backend that always fails for testing failure scenarios
pub struct FailingBackend;

#[async_trait]
impl Backend for FailingBackend {
    async fn score(&self, request: BackendRequest) -> Result<Vec<f64>, BackendFailure> {
        Err(BackendFailure::Unavailable {
            model: request.model,
            reason: "simulated backend failure".to_string(),
        })
    }

    fn name(&self) -> &'static str {
        "failing"
    }
}

/// Sleeps before answering uniformly; used to exercise cancellation.
pub struct SlowBackend {
    pub delay: Duration,
}

#[async_trait]
impl Backend for SlowBackend {
    async fn score(&self, request: BackendRequest) -> Result<Vec<f64>, BackendFailure> {
        tokio::time::sleep(self.delay).await;
        let count = request.responses.len();
        Ok(vec![1.0 / count as f64; count])
    }

    fn name(&self) -> &'static str {
        "slow"
    }
}

/// Fails at once for requests matching `fail_when`; every other request
/// sleeps for `delay` before answering uniformly.
pub struct GatedBackend {
    pub fail_when: fn(&BackendRequest) -> bool,
    pub delay: Duration,
}

#[async_trait]
impl Backend for GatedBackend {
    async fn score(&self, request: BackendRequest) -> Result<Vec<f64>, BackendFailure> {
        if (self.fail_when)(&request) {
            return Err(BackendFailure::Unavailable {
                model: request.model,
                reason: "gated failure".to_string(),
            });
        }
        tokio::time::sleep(self.delay).await;
        let count = request.responses.len();
        Ok(vec![1.0 / count as f64; count])
    }

    fn name(&self) -> &'static str {
        "gated"
    }
}
