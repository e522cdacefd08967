// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Error types for decoding console payloads

use thiserror::Error;

/// Errors that can occur while translating raw payloads into typed values
#[derive(Debug, Error)]
pub enum ApiContractError {
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Dump notification {id} carries no download URL")]
    MissingDumpUrl { id: i64 },

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),
}

/// Result type alias for contract decoding
pub type ApiContractResult<T> = std::result::Result<T, ApiContractError>;
