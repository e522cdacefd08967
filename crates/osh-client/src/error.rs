// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Error types for the console client

use osh_api_contract::{ApiContractError, NotificationKind};
use serde_json::Value;
use thiserror::Error;

/// Result type alias for client operations
pub type ClientResult<T> = std::result::Result<T, ClientError>;

/// Errors that can occur while talking to the console
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected HTTP status {status} for {url}")]
    Status { status: u16, url: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("URL parsing error: {0}")]
    Url(#[from] url::ParseError),

    #[error("Payload decoding error: {0}")]
    Contract(#[from] ApiContractError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Scrape error: {0}")]
    Scrape(String),

    #[error("Missing field: {0}")]
    MissingField(String),

    /// The server answered without a `result` key, usually because the call failed
    /// or the session is not authenticated. `error` is whatever the server sent.
    #[error("RPC call {method} returned no result")]
    MissingResult { method: String, error: Option<Value> },

    #[error("The owning project was dropped")]
    ProjectDropped,

    #[error("No {kind} notification after {polls} polls")]
    NotificationNotReceived { kind: NotificationKind, polls: u32 },
}
