// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

/// One ensemble member failed to produce a usable score vector.
///
/// Recoverable: the aggregator excludes the member and renormalises the
/// remaining weights.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BackendFailure {
    #[error("backend for '{model}' is unavailable: {reason}")]
    Unavailable { model: String, reason: String },

    #[error("backend for '{model}' returned {found} scores for {expected} candidates")]
    Malformed {
        model: String,
        expected: usize,
        found: usize,
    },

    #[error("backend for '{model}' returned a non-finite score")]
    NonFinite { model: String },

    #[error("backend task for '{model}' aborted: {reason}")]
    Aborted { model: String, reason: String },
}
