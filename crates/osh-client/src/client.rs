// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Entry point of the object graph

use std::cell::OnceCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::config::ClientConfig;
use crate::error::ClientResult;
use crate::lazy::get_or_try_init;
use crate::project::Project;
use crate::session::Session;
use crate::transport::Transport;

/// Logged-in view of the console
///
/// Everything below it is fetched lazily on first access and kept for the
/// lifetime of the value.
pub struct OdooSh {
    session: Rc<Session>,
    projects: OnceCell<BTreeMap<String, Project>>,
}

impl OdooSh {
    /// Log in with the default configuration
    pub fn new(login: &str, password: &str) -> ClientResult<Self> {
        Self::with_config(ClientConfig::default(), login, password)
    }

    pub fn with_config(config: ClientConfig, login: &str, password: &str) -> ClientResult<Self> {
        Ok(Self::from_session(Session::login_with_config(config, login, password)?))
    }

    /// Log in through a caller-provided transport
    pub fn with_transport(
        transport: Box<dyn Transport>,
        config: ClientConfig,
        login: &str,
        password: &str,
    ) -> ClientResult<Self> {
        Ok(Self::from_session(Session::login(transport, config, login, password)?))
    }

    pub fn from_session(session: Session) -> Self {
        Self {
            session: Rc::new(session),
            projects: OnceCell::new(),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Projects keyed by name
    pub fn projects(&self) -> ClientResult<&BTreeMap<String, Project>> {
        get_or_try_init(&self.projects, || {
            let mut projects = BTreeMap::new();
            for record in self.session.projects_data()? {
                let project = Project::from_record(Rc::clone(&self.session), record)?;
                projects.insert(project.name().to_string(), project);
            }
            tracing::debug!(count = projects.len(), "Loaded projects");
            Ok(projects)
        })
    }

    pub fn project(&self, name: &str) -> ClientResult<Option<&Project>> {
        Ok(self.projects()?.get(name))
    }

    /// Mutable access, for [`Project::reload_branches`]
    pub fn project_mut(&mut self, name: &str) -> ClientResult<Option<&mut Project>> {
        self.projects()?;
        Ok(self
            .projects
            .get_mut()
            .and_then(|projects| projects.get_mut(name)))
    }

    /// Drop the cached projects (and everything below them) and fetch again
    pub fn reload_projects(&mut self) -> ClientResult<&BTreeMap<String, Project>> {
        self.projects.take();
        self.projects()
    }
}

impl std::fmt::Debug for OdooSh {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OdooSh")
            .field("session", &self.session)
            .field("projects", &self.projects.get().map(BTreeMap::len))
            .finish()
    }
}
