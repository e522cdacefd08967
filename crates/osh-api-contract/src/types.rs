// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Records returned by the console's RPC endpoints

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ApiContractError, ApiContractResult};

/// JSON blob embedded in the project page's `data-state` attribute
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectState {
    pub repository_id: i64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Result of `init_repository_data`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositoryData {
    pub access_token: String,
    pub hosting_user_id: i64,
    /// Raw notification payloads already known to the server
    #[serde(default)]
    pub notifications: Vec<Value>,
}

/// One entry of `get_branches_info`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BranchInfo {
    pub id: i64,
    pub name: String,
    pub stage: String,
}

/// One branch group of `build_per_branch`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BranchBuilds {
    #[serde(default)]
    pub builds: Vec<BuildInfo>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildInfo {
    pub id: i64,
    pub name: String,
    pub stage: String,
    /// Worker host serving this build
    #[serde(rename = "url")]
    pub worker_url: String,
}

/// One entry of the worker host's backup listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawBackupInfo")]
pub struct BackupInfo {
    pub name: String,
    pub branch: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub path: String,
    pub downloadable: bool,
    pub backup_datetime: String,
}

/// Older workers send `timestamp` instead of `backup_datetime`, some both
#[derive(Deserialize)]
struct RawBackupInfo {
    name: String,
    branch: String,
    #[serde(rename = "type")]
    kind: String,
    path: String,
    #[serde(default)]
    downloadable: bool,
    #[serde(default)]
    backup_datetime: Option<String>,
    #[serde(default)]
    timestamp: Option<String>,
}

impl TryFrom<RawBackupInfo> for BackupInfo {
    type Error = String;

    fn try_from(raw: RawBackupInfo) -> Result<Self, Self::Error> {
        let backup_datetime = raw
            .backup_datetime
            .or(raw.timestamp)
            .ok_or_else(|| format!("backup {:?} has no backup_datetime", raw.name))?;

        Ok(Self {
            name: raw.name,
            branch: raw.branch,
            kind: raw.kind,
            path: raw.path,
            downloadable: raw.downloadable,
            backup_datetime,
        })
    }
}

/// One message of a long-poll response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusMessage {
    pub id: i64,
    pub message: BusMessageBody,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusMessageBody {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub payload: Value,
}

const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
];

/// Parse a server timestamp (`2024-05-01 10:00:00`, optional fraction, `T` separator accepted)
pub fn parse_timestamp(raw: &str) -> ApiContractResult<NaiveDateTime> {
    let raw = raw.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .ok_or_else(|| ApiContractError::InvalidTimestamp(raw.to_string()))
}
