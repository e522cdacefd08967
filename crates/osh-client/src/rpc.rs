// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! JSON-RPC calls against the console and the build workers

use osh_api_contract::{
    BackupInfo, BranchBuilds, BranchInfo, BusMessage, CallKwParams, ListBackupsParams, PollParams,
    RepositoryData, RpcRequest,
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{json, Value};
use url::Url;

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::transport::Transport;

const REPOSITORY_MODEL: &str = "paas.repository";
const BRANCH_MODEL: &str = "paas.branch";
const BUILD_MODEL: &str = "paas.build";
const BACKUPS_PATH: &str = "/paas/build/backups";

/// Thin typed wrapper over the console's RPC endpoints
///
/// Borrowed from a [`Session`](crate::Session); holds no state of its own.
pub struct RpcClient<'a> {
    transport: &'a dyn Transport,
    config: &'a ClientConfig,
}

impl<'a> RpcClient<'a> {
    pub fn new(transport: &'a dyn Transport, config: &'a ClientConfig) -> Self {
        Self { transport, config }
    }

    /// Repository bootstrap data: access token, hosting user, notifications
    pub fn init_repository_data(&self, repository_id: i64) -> ClientResult<RepositoryData> {
        self.call_kw(CallKwParams::new(
            REPOSITORY_MODEL,
            "init_repository_data",
            vec![json!(repository_id)],
        ))
    }

    pub fn get_branches_info(&self, repository_id: i64) -> ClientResult<Vec<BranchInfo>> {
        self.call_kw(CallKwParams::new(
            REPOSITORY_MODEL,
            "get_branches_info",
            vec![json!(repository_id)],
        ))
    }

    /// Most recent builds of a branch, one group per requested branch
    pub fn build_per_branch(&self, branch_id: i64, limit: u32) -> ClientResult<Vec<BranchBuilds>> {
        self.call_kw(
            CallKwParams::new(BRANCH_MODEL, "build_per_branch", vec![json!([branch_id])])
                .kwarg("limit", limit),
        )
    }

    /// Backups of a build, served by the build's own worker host
    pub fn list_backups(
        &self,
        worker_url: &Url,
        build_id: i64,
        branch: &str,
        token: &str,
    ) -> ClientResult<Vec<BackupInfo>> {
        let url = worker_url.join(BACKUPS_PATH)?;
        let params = ListBackupsParams {
            build_id,
            branch: branch.to_string(),
            token: token.to_string(),
        };

        let backups: Vec<BackupInfo> = self.call(&url, "list_backups", params)?;
        if backups.is_empty() {
            tracing::warn!(
                build_id,
                branch,
                "Worker listed no backups; the session may have expired"
            );
        }
        Ok(backups)
    }

    pub fn ask_backup(&self, build_id: i64, comment: &str) -> ClientResult<Value> {
        self.call_kw(
            CallKwParams::new(BUILD_MODEL, "ask_backup", vec![json!([build_id])])
                .kwarg("comment", comment),
        )
    }

    /// Ask the console to prepare a dump. The answer carries nothing useful;
    /// readiness is announced on the bus.
    pub fn ask_download(
        &self,
        build_id: i64,
        backup_datetime: &str,
        test_dump: bool,
        with_filestore: bool,
    ) -> ClientResult<Value> {
        self.call_kw(
            CallKwParams::new(BUILD_MODEL, "ask_download", vec![json!([build_id])])
                .kwarg("backup_datetime", backup_datetime)
                .kwarg("test_dump", test_dump)
                .kwarg("with_filestore", with_filestore),
        )
    }

    /// One long-poll on the project's bus channels
    pub fn polling(
        &self,
        hosting_user_id: i64,
        repository_id: i64,
        last: i64,
    ) -> ClientResult<Vec<BusMessage>> {
        let url = self.config.poll_url()?;
        let params = PollParams::new(hosting_user_id, repository_id, last, self.config.poll_timeout);
        self.call(&url, "polling", params)
    }

    fn call_kw<T: DeserializeOwned>(&self, params: CallKwParams) -> ClientResult<T> {
        let url = self.config.call_kw_url(&params.model, &params.method)?;
        let method = format!("{}.{}", params.model, params.method);
        self.call(&url, &method, params)
    }

    fn call<P: Serialize, T: DeserializeOwned>(
        &self,
        url: &Url,
        method: &str,
        params: P,
    ) -> ClientResult<T> {
        tracing::debug!(method, url = %url, "RPC call");

        let body = serde_json::to_value(RpcRequest::call(params))?;
        let mut response = self.transport.post_json(url, &body)?;

        let Some(result) = response.get_mut("result").map(Value::take) else {
            let error = response.get("error").cloned();
            tracing::debug!(method, ?error, "RPC call returned no result");
            return Err(ClientError::MissingResult {
                method: method.to_string(),
                error,
            });
        };

        Ok(serde_json::from_value(result)?)
    }
}
