// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Deterministic stand-in backend used when an execution asks for
//! reproducible synthetic scores instead of model calls.

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::BackendRequest;
use crate::errors::BackendFailure;
use crate::traits::Backend;

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Scores each request from an RNG seeded by the request's content.
///
/// The same request always gets the same scores. Members that ask for
/// `top_logprobs` receive a probability distribution over the labels; the
/// rest cast a one-hot vote.
pub struct RngBackend {
    seed: u64,
}

impl RngBackend {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    fn rng_for(&self, request: &BackendRequest) -> Result<StdRng, BackendFailure> {
        let bytes = serde_json::to_vec(request).map_err(|e| BackendFailure::Aborted {
            model: request.model.clone(),
            reason: format!("request could not be hashed: {}", e),
        })?;
        Ok(StdRng::seed_from_u64(fnv1a(&bytes) ^ self.seed))
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(FNV_OFFSET_BASIS, |hash, byte| {
        (hash ^ u64::from(*byte)).wrapping_mul(FNV_PRIME)
    })
}

#[async_trait]
impl Backend for RngBackend {
    async fn score(&self, request: BackendRequest) -> Result<Vec<f64>, BackendFailure> {
        let count = request.responses.len();
        if count == 0 {
            return Err(BackendFailure::Unavailable {
                model: request.model,
                reason: "request carries no candidate responses".to_string(),
            });
        }

        let mut rng = self.rng_for(&request)?;
        if request.top_logprobs.is_some() {
            let raw: Vec<f64> = (0..count).map(|_| rng.gen::<f64>()).collect();
            let total: f64 = raw.iter().sum();
            if total > 0.0 {
                return Ok(raw.into_iter().map(|r| r / total).collect());
            }
            return Ok(vec![1.0 / count as f64; count]);
        }

        let choice = rng.gen_range(0..count);
        Ok((0..count).map(|i| if i == choice { 1.0 } else { 0.0 }).collect())
    }

    fn name(&self) -> &'static str {
        "rng"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputMode;

    fn request(model: &str, top_logprobs: Option<u32>) -> BackendRequest {
        BackendRequest {
            task_index: 0,
            map_index: None,
            backend_index: 0,
            model: model.to_string(),
            output_mode: OutputMode::JsonSchema,
            messages: vec![],
            tools: None,
            response_format: None,
            reasoning: None,
            top_logprobs,
            temperature: None,
            responses: vec!["a".into(), "b".into(), "c".into()],
        }
    }

    #[tokio::test]
    async fn test_same_request_same_scores() {
        let backend = RngBackend::new(42);
        let first = backend.score(request("m", None)).await.unwrap();
        let second = backend.score(request("m", None)).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_no_candidates_is_unavailable() {
        let mut empty = request("m", None);
        empty.responses.clear();
        let err = RngBackend::new(1).score(empty).await.unwrap_err();
        assert!(matches!(
            err,
            BackendFailure::Unavailable { ref reason, .. } if reason.contains("no candidate")
        ));
    }

    #[tokio::test]
    async fn test_one_hot_vote() {
        let scores = RngBackend::new(1).score(request("m", None)).await.unwrap();
        assert_eq!(scores.len(), 3);
        assert_eq!(scores.iter().filter(|s| **s == 1.0).count(), 1);
        assert_eq!(scores.iter().sum::<f64>(), 1.0);
    }

    #[tokio::test]
    async fn test_logprobs_distribution() {
        let scores = RngBackend::new(1).score(request("m", Some(20))).await.unwrap();
        assert_eq!(scores.len(), 3);
        assert!(scores.iter().all(|s| (0.0..=1.0).contains(s)));
        assert!((scores.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_fnv1a_reference_values() {
        assert_eq!(fnv1a(b""), FNV_OFFSET_BASIS);
        assert_eq!(fnv1a(b"a"), 0xaf63_dc4c_8601_ec8c);
    }
}
