// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

use std::path::Path;
use std::rc::Weak;

use chrono::NaiveDateTime;
use osh_api_contract::{parse_timestamp, BackupInfo};
use url::Url;

use crate::build::Build;
use crate::download::{DownloadReport, DumpDownload, DumpOptions};
use crate::error::ClientResult;
use crate::project::ProjectCore;

const DOWNLOAD_PATH: &str = "/paas/build/backups/download";

/// A backup listed by a build's worker host
pub struct Backup {
    project: Weak<ProjectCore>,
    build_id: i64,
    build_name: String,
    worker_url: Url,
    name: String,
    branch: String,
    kind: String,
    path: String,
    downloadable: bool,
    backup_datetime: String,
}

impl Backup {
    pub(crate) fn new(project: Weak<ProjectCore>, build: &Build, info: BackupInfo) -> Self {
        Self {
            project,
            build_id: build.id(),
            build_name: build.name().to_string(),
            worker_url: build.worker_url().clone(),
            name: info.name,
            branch: info.branch,
            kind: info.kind,
            path: info.path,
            downloadable: info.downloadable,
            backup_datetime: info.backup_datetime,
        }
    }

    /// Backup name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Branch the backup was taken from
    pub fn branch(&self) -> &str {
        &self.branch
    }

    /// Backup type as reported by the worker (`daily`, `manual`, ...)
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Archive path on the worker
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Whether the worker can serve the file directly, without a dump request
    pub fn downloadable(&self) -> bool {
        self.downloadable
    }

    /// Id of the build that listed this backup
    pub fn build_id(&self) -> i64 {
        self.build_id
    }

    /// Name of the build that listed this backup
    pub fn build_name(&self) -> &str {
        &self.build_name
    }

    /// Raw server timestamp
    pub fn backup_datetime(&self) -> &str {
        &self.backup_datetime
    }

    /// Parsed backup timestamp
    pub fn datetime(&self) -> ClientResult<NaiveDateTime> {
        Ok(parse_timestamp(&self.backup_datetime)?)
    }

    /// Direct download URL on the worker host. Only meaningful for
    /// downloadable backups.
    pub fn download_url(&self) -> ClientResult<Url> {
        let core = ProjectCore::upgrade(&self.project)?;
        self.download_url_with_token(&core.repository_data()?.access_token)
    }

    pub(crate) fn download_url_with_token(&self, token: &str) -> ClientResult<Url> {
        let mut url = self.worker_url.join(DOWNLOAD_PATH)?;
        url.query_pairs_mut()
            .append_pair("build_id", &self.build_id.to_string())
            .append_pair("branch", &self.branch)
            .append_pair("backup_datetime", &self.backup_datetime)
            .append_pair("token", token);
        Ok(url)
    }

    /// Download with default dump options
    pub fn download(&self, path: impl AsRef<Path>) -> ClientResult<DownloadReport> {
        self.download_with(path, DumpOptions::default())
    }

    /// Download to `path`, requesting a dump first when the backup is not
    /// directly downloadable. Blocks until the dump is ready.
    pub fn download_with(
        &self,
        path: impl AsRef<Path>,
        options: DumpOptions,
    ) -> ClientResult<DownloadReport> {
        let core = ProjectCore::upgrade(&self.project)?;
        DumpDownload::new(&core, self, options)?.run(path.as_ref())
    }
}

impl std::fmt::Debug for Backup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Backup")
            .field("name", &self.name)
            .field("branch", &self.branch)
            .field("kind", &self.kind)
            .field("downloadable", &self.downloadable)
            .field("backup_datetime", &self.backup_datetime)
            .finish_non_exhaustive()
    }
}

impl std::fmt::Display for Backup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{} {} at {}",
            self.branch, self.name, self.kind, self.backup_datetime
        )
    }
}
