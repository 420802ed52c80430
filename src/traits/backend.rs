// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;

use crate::backends::BackendRequest;
use crate::errors::BackendFailure;

/// A scoring backend: given one ensemble member's request, return one score
/// per candidate label, in label order.
///
/// Failures are recoverable. The aggregator excludes the member and
/// renormalises the remaining weights.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn score(&self, request: BackendRequest) -> Result<Vec<f64>, BackendFailure>;

    fn name(&self) -> &'static str;
}
