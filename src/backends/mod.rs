// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Scoring backend implementations.
//!
//! Real model calls live outside this crate, behind the
//! [`Backend`](crate::traits::Backend) trait. What ships here:
//!
//! ## RNG Backend
//! Deterministic synthetic scores for reproducible executions and tests.
//! Selected by executing with `deterministic_mode` set.
//!
//! ## Unavailable Backend
//! The default live backend when none is injected. Every call fails, so an
//! execution without a real backend reports an ensemble failure instead of
//! inventing scores.
//!
//! ## Stub Backends (Test-Only)
//! Fixed-vote, scripted, failing and slow backends for executor tests.
//!
//! # Example
//! ```rust
//! use std::sync::Arc;
//! use the_ensemble::backends::RngBackend;
//! use the_ensemble::engine::Executor;
//!
//! let executor = Executor::new(4).with_rng_backend(Arc::new(RngBackend::new(7)));
//! ```

use async_trait::async_trait;

use crate::errors::BackendFailure;
use crate::traits::Backend;

pub mod request;
pub mod rng;
#[cfg(test)]
pub mod stub;

pub use request::{build_requests, BackendRequest};
pub use rng::RngBackend;

/// Live backend placeholder that refuses every request.
pub struct UnavailableBackend;

#[async_trait]
impl Backend for UnavailableBackend {
    async fn score(&self, request: BackendRequest) -> Result<Vec<f64>, BackendFailure> {
        Err(BackendFailure::Unavailable {
            model: request.model,
            reason: "no live backend configured".to_string(),
        })
    }

    fn name(&self) -> &'static str {
        "unavailable"
    }
}
