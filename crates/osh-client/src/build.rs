// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

use std::cell::OnceCell;
use std::rc::Weak;

use osh_api_contract::BuildInfo;
use url::Url;

use crate::backup::Backup;
use crate::error::ClientResult;
use crate::lazy::get_or_try_init;
use crate::project::ProjectCore;

/// A build of a branch, served by its own worker host
pub struct Build {
    project: Weak<ProjectCore>,
    id: i64,
    name: String,
    stage: String,
    branch: String,
    worker_url: Url,
    backups: OnceCell<Vec<Backup>>,
}

/// Worker hosts are sometimes reported without a scheme
fn worker_url(raw: &str) -> ClientResult<Url> {
    let raw = raw.trim();
    if raw.contains("://") {
        Ok(Url::parse(raw)?)
    } else {
        Ok(Url::parse(&format!("https://{}", raw))?)
    }
}

impl Build {
    pub(crate) fn new(project: Weak<ProjectCore>, branch: &str, info: BuildInfo) -> ClientResult<Self> {
        Ok(Self {
            project,
            id: info.id,
            name: info.name,
            stage: info.stage,
            branch: branch.to_string(),
            worker_url: worker_url(&info.worker_url)?,
            backups: OnceCell::new(),
        })
    }

    /// Build id
    pub fn id(&self) -> i64 {
        self.id
    }

    /// Build name as shown in the console
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Stage of the branch when the build ran
    pub fn stage(&self) -> &str {
        &self.stage
    }

    /// Name of the branch this build belongs to
    pub fn branch(&self) -> &str {
        &self.branch
    }

    /// Worker host, always with a scheme
    pub fn worker_url(&self) -> &Url {
        &self.worker_url
    }

    /// Backups listed by the worker host
    pub fn backups(&self) -> ClientResult<&[Backup]> {
        get_or_try_init(&self.backups, || {
            let core = ProjectCore::upgrade(&self.project)?;
            let token = &core.repository_data()?.access_token;
            let infos = core
                .session
                .rpc()
                .list_backups(&self.worker_url, self.id, &self.branch, token)?;

            Ok(infos
                .into_iter()
                .map(|info| Backup::new(self.project.clone(), self, info))
                .collect())
        })
        .map(Vec::as_slice)
    }

    /// Ask the console for a fresh backup of this build. Completion is
    /// announced on the bus as a backup-ready notification.
    pub fn request_backup(&self, comment: &str) -> ClientResult<()> {
        let core = ProjectCore::upgrade(&self.project)?;
        core.session.rpc().ask_backup(self.id, comment)?;
        tracing::info!(build_id = self.id, branch = %self.branch, "Backup requested");
        Ok(())
    }
}

impl std::fmt::Debug for Build {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Build")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("branch", &self.branch)
            .field("worker_url", &self.worker_url.as_str())
            .finish_non_exhaustive()
    }
}

impl std::fmt::Display for Build {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} #{} [{}] on {}", self.name, self.id, self.stage, self.worker_url)
    }
}
