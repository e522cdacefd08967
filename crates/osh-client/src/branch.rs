// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

use std::cell::OnceCell;
use std::rc::Weak;

use osh_api_contract::BranchInfo;

use crate::build::Build;
use crate::error::ClientResult;
use crate::lazy::get_or_try_init;
use crate::project::ProjectCore;

/// A branch of a project
pub struct Branch {
    project: Weak<ProjectCore>,
    project_name: String,
    id: i64,
    name: String,
    stage: String,
    builds: OnceCell<Vec<Build>>,
}

impl Branch {
    pub(crate) fn new(project: Weak<ProjectCore>, project_name: &str, info: BranchInfo) -> Self {
        Self {
            project,
            project_name: project_name.to_string(),
            id: info.id,
            name: info.name,
            stage: info.stage,
            builds: OnceCell::new(),
        }
    }

    /// Branch id on the console
    pub fn id(&self) -> i64 {
        self.id
    }

    /// Branch name, unique within the project
    pub fn name(&self) -> &str {
        &self.name
    }

    /// `production`, `staging` or `dev`
    pub fn stage(&self) -> &str {
        &self.stage
    }

    /// Name of the owning project
    pub fn project_name(&self) -> &str {
        &self.project_name
    }

    /// Most recent builds, newest first, at most `build-limit` of them
    pub fn builds(&self) -> ClientResult<&[Build]> {
        get_or_try_init(&self.builds, || {
            let core = ProjectCore::upgrade(&self.project)?;
            let limit = core.session.config().build_limit;
            let groups = core.session.rpc().build_per_branch(self.id, limit)?;

            let infos = groups.into_iter().next().map(|group| group.builds).unwrap_or_default();
            tracing::debug!(branch = %self.name, count = infos.len(), "Loaded builds");

            infos
                .into_iter()
                .map(|info| Build::new(self.project.clone(), &self.name, info))
                .collect()
        })
        .map(Vec::as_slice)
    }
}

impl std::fmt::Debug for Branch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Branch")
            .field("project", &self.project_name)
            .field("id", &self.id)
            .field("name", &self.name)
            .field("stage", &self.stage)
            .finish_non_exhaustive()
    }
}

impl std::fmt::Display for Branch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{} [{}]", self.project_name, self.name, self.stage)
    }
}
