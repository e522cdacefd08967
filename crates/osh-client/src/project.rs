// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Projects and the state their descendants share

use std::cell::{Cell, OnceCell, RefCell};
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

use osh_api_contract::{Notification, NotificationKind, RepositoryData};
use url::Url;

use crate::branch::Branch;
use crate::error::{ClientError, ClientResult};
use crate::html::ProjectRecord;
use crate::lazy::get_or_try_init;
use crate::poller;
use crate::session::Session;

/// The part of a project that branches, builds and backups point back to
pub(crate) struct ProjectCore {
    pub(crate) session: Rc<Session>,
    pub(crate) name: String,
    pub(crate) url: Url,
    repository_id: OnceCell<i64>,
    repository_data: OnceCell<RepositoryData>,
    /// Every notification seen so far, by id
    pub(crate) notifications: RefCell<BTreeMap<i64, Notification>>,
    /// Highest bus message id seen, sent as `last` on the next poll
    pub(crate) bus_cursor: Cell<i64>,
}

impl ProjectCore {
    fn new(session: Rc<Session>, name: String, url: Url) -> Self {
        Self {
            session,
            name,
            url,
            repository_id: OnceCell::new(),
            repository_data: OnceCell::new(),
            notifications: RefCell::new(BTreeMap::new()),
            bus_cursor: Cell::new(0),
        }
    }

    pub(crate) fn upgrade(weak: &Weak<ProjectCore>) -> ClientResult<Rc<ProjectCore>> {
        weak.upgrade().ok_or(ClientError::ProjectDropped)
    }

    pub(crate) fn repository_id(&self) -> ClientResult<i64> {
        get_or_try_init(&self.repository_id, || {
            let state = self.session.project_state(&self.url)?;
            tracing::debug!(project = %self.name, repository_id = state.repository_id, "Resolved repository");
            Ok(state.repository_id)
        })
        .copied()
    }

    pub(crate) fn repository_data(&self) -> ClientResult<&RepositoryData> {
        get_or_try_init(&self.repository_data, || {
            let repository_id = self.repository_id()?;
            let data = self.session.rpc().init_repository_data(repository_id)?;
            self.seed_notifications(&data);
            Ok(data)
        })
    }

    fn seed_notifications(&self, data: &RepositoryData) {
        let mut known = self.notifications.borrow_mut();
        for payload in &data.notifications {
            match Notification::from_payload(payload) {
                Ok(notification) => {
                    known.insert(notification.id(), notification);
                }
                Err(e) => tracing::warn!(project = %self.name, error = %e, "Skipping undecodable notification"),
            }
        }
    }
}

/// A project of the console, as listed on the project page
pub struct Project {
    core: Rc<ProjectCore>,
    version: String,
    record: ProjectRecord,
    branches: OnceCell<BTreeMap<String, Branch>>,
}

impl Project {
    pub(crate) fn from_record(session: Rc<Session>, record: ProjectRecord) -> ClientResult<Self> {
        let version = record
            .get("version")
            .ok_or_else(|| ClientError::MissingField(format!("version of project {}", record.name)))?
            .to_string();
        let url = Url::parse(&record.url)?;

        Ok(Self {
            core: Rc::new(ProjectCore::new(session, record.name.clone(), url)),
            version,
            record,
            branches: OnceCell::new(),
        })
    }

    /// Project name from the card
    pub fn name(&self) -> &str {
        &self.core.name
    }

    /// Absolute URL of the project page
    pub fn url(&self) -> &Url {
        &self.core.url
    }

    /// Odoo version from the card
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Every row of the project card
    pub fn record(&self) -> &ProjectRecord {
        &self.record
    }

    /// Repository id, read once from the project page
    pub fn repository_id(&self) -> ClientResult<i64> {
        self.core.repository_id()
    }

    /// Repository data, fetched once
    pub fn repository_data(&self) -> ClientResult<&RepositoryData> {
        self.core.repository_data()
    }

    /// Token for worker host requests
    pub fn access_token(&self) -> ClientResult<&str> {
        Ok(&self.core.repository_data()?.access_token)
    }

    /// Hosting user id, part of the bus channel names
    pub fn hosting_user_id(&self) -> ClientResult<i64> {
        Ok(self.core.repository_data()?.hosting_user_id)
    }

    /// Branches keyed by name; a later branch with the same name replaces
    /// an earlier one
    pub fn branches(&self) -> ClientResult<&BTreeMap<String, Branch>> {
        get_or_try_init(&self.branches, || {
            let repository_id = self.core.repository_id()?;
            let infos = self.core.session.rpc().get_branches_info(repository_id)?;
            tracing::debug!(project = %self.core.name, count = infos.len(), "Loaded branches");

            let weak = Rc::downgrade(&self.core);
            Ok(infos
                .into_iter()
                .map(|info| (info.name.clone(), Branch::new(weak.clone(), &self.core.name, info)))
                .collect())
        })
    }

    /// Look up one branch by name
    pub fn branch(&self, name: &str) -> ClientResult<Option<&Branch>> {
        Ok(self.branches()?.get(name))
    }

    /// Drop the cached branches; the next read fetches them again
    pub fn reload_branches(&mut self) -> ClientResult<&BTreeMap<String, Branch>> {
        self.branches.take();
        self.branches()
    }

    /// Snapshot of known notifications, ordered by id
    pub fn notifications(&self) -> Vec<Notification> {
        self.core.notifications.borrow().values().cloned().collect()
    }

    /// One long-poll; returns the notifications not seen before
    pub fn poll_notifications(&self) -> ClientResult<Vec<Notification>> {
        poller::poll(&self.core)
    }

    /// Poll until a new notification of `kind` shows up
    pub fn wait_for(&self, kind: NotificationKind, max_polls: Option<u32>) -> ClientResult<Notification> {
        poller::wait_for(&self.core, kind, max_polls).map(|(notification, _)| notification)
    }

    /// Current bus cursor
    pub fn bus_cursor(&self) -> i64 {
        self.core.bus_cursor.get()
    }
}

impl std::fmt::Debug for Project {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Project")
            .field("name", &self.core.name)
            .field("url", &self.core.url.as_str())
            .field("version", &self.version)
            .finish_non_exhaustive()
    }
}

impl std::fmt::Display for Project {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.core.name, self.core.url)
    }
}
