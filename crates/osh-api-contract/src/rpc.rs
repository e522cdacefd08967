// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! JSON-RPC 2.0 envelope and the fixed parameter shapes of each call

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const JSONRPC_VERSION: &str = "2.0";

/// Request envelope. The console always expects `id: null` and `method: "call"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcRequest<P> {
    pub jsonrpc: String,
    pub id: Option<u64>,
    pub method: String,
    pub params: P,
}

impl<P> RpcRequest<P> {
    pub fn call(params: P) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: None,
            method: "call".to_string(),
            params,
        }
    }
}

/// Parameters of the web client's `call_kw` route
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallKwParams {
    pub model: String,
    pub method: String,
    pub args: Vec<Value>,
    #[serde(default)]
    pub kwargs: Map<String, Value>,
}

impl CallKwParams {
    pub fn new(model: &str, method: &str, args: Vec<Value>) -> Self {
        Self {
            model: model.to_string(),
            method: method.to_string(),
            args,
            kwargs: Map::new(),
        }
    }

    pub fn kwarg(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.kwargs.insert(key.to_string(), value.into());
        self
    }
}

/// Parameters of the worker host's backup listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListBackupsParams {
    pub build_id: i64,
    pub branch: String,
    pub token: String,
}

/// Parameters of a long-poll on the notification bus
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollParams {
    pub channels: Vec<String>,
    pub last: i64,
    pub options: PollOptions,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollOptions {
    pub hosting_user_id: i64,
    pub repository_id: i64,
}

impl PollParams {
    pub fn new(hosting_user_id: i64, repository_id: i64, last: i64, timeout: Option<u64>) -> Self {
        Self {
            channels: vec![
                format!("paas_hosting_user_{}", hosting_user_id),
                format!("paas_repository_{}", repository_id),
            ],
            last,
            options: PollOptions {
                hosting_user_id,
                repository_id,
            },
            timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_shape() {
        let request = RpcRequest::call(CallKwParams::new(
            "paas.repository",
            "get_branches_info",
            vec![json!(42)],
        ));
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(
            value,
            json!({
                "jsonrpc": "2.0",
                "id": null,
                "method": "call",
                "params": {
                    "model": "paas.repository",
                    "method": "get_branches_info",
                    "args": [42],
                    "kwargs": {}
                }
            })
        );
    }

    #[test]
    fn test_call_kw_kwargs() {
        let params = CallKwParams::new("paas.build", "ask_download", vec![json!([7])])
            .kwarg("backup_datetime", "2024-05-01 10:00:00")
            .kwarg("test_dump", false)
            .kwarg("with_filestore", true);

        assert_eq!(params.kwargs["backup_datetime"], json!("2024-05-01 10:00:00"));
        assert_eq!(params.kwargs["test_dump"], json!(false));
        assert_eq!(params.kwargs["with_filestore"], json!(true));
    }

    #[test]
    fn test_poll_params_omit_missing_timeout() {
        let params = PollParams::new(3, 42, 0, None);
        let value = serde_json::to_value(&params).unwrap();

        assert!(value.get("timeout").is_none());
        assert_eq!(
            value["channels"],
            json!(["paas_hosting_user_3", "paas_repository_42"])
        );
        assert_eq!(value["options"]["repository_id"], json!(42));
    }
}
