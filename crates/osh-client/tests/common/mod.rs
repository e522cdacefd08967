// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

#![allow(dead_code)]

use osh_client::{ClientConfig, OdooSh, Session};
use osh_client_mock::fixtures::{self, ProjectCard};
use osh_client_mock::MockTransport;
use serde_json::{json, Value};

pub const LISTING: &str = "/project";
pub const PROJECT_PAGE: &str = "/project/acme";
pub const INIT_REPOSITORY_DATA: &str = "/web/dataset/call_kw/paas.repository/init_repository_data";
pub const BRANCHES_INFO: &str = "/web/dataset/call_kw/paas.repository/get_branches_info";
pub const BUILD_PER_BRANCH: &str = "/web/dataset/call_kw/paas.branch/build_per_branch";
pub const ASK_BACKUP: &str = "/web/dataset/call_kw/paas.build/ask_backup";
pub const ASK_DOWNLOAD: &str = "/web/dataset/call_kw/paas.build/ask_download";
pub const LIST_BACKUPS: &str = "/paas/build/backups";
pub const STATIC_DOWNLOAD: &str = "/paas/build/backups/download";
pub const POLL: &str = "/longpolling/poll";

pub const REPOSITORY_ID: i64 = 42;
pub const HOSTING_USER_ID: i64 = 3;
pub const ACCESS_TOKEN: &str = "tok-abc";
pub const WORKER_HOST: &str = "acme-main-9.dev.odoo.com";
pub const BACKUP_DATETIME: &str = "2024-05-01 10:00:00";

pub fn listing() -> String {
    fixtures::project_listing(&[
        ProjectCard {
            name: "acme",
            href: PROJECT_PAGE,
            version: "17.0",
        },
        ProjectCard {
            name: "globex",
            href: "/project/globex",
            version: "saas-17.2",
        },
    ])
}

pub fn branches() -> Value {
    json!([
        {"id": 1, "name": "main", "stage": "production"},
        {"id": 2, "name": "staging-1", "stage": "staging"}
    ])
}

pub fn build_groups() -> Value {
    json!([
        {"builds": [
            {"id": 9, "name": "main-9", "stage": "production", "url": WORKER_HOST},
            {"id": 8, "name": "main-8", "stage": "production", "url": WORKER_HOST}
        ]},
        {"builds": [
            {"id": 99, "name": "other-99", "stage": "dev", "url": "other.dev.odoo.com"}
        ]}
    ])
}

pub fn backup(downloadable: bool) -> Value {
    json!({
        "name": "daily",
        "branch": "main",
        "type": "automatic",
        "path": "/backups/main/daily.zip",
        "downloadable": downloadable,
        "backup_datetime": BACKUP_DATETIME
    })
}

/// A console with one project, its branches, builds and a single backup
pub fn console(downloadable: bool, seeded: Vec<Value>) -> MockTransport {
    MockTransport::new()
        .with_page(LISTING, listing())
        .with_page(PROJECT_PAGE, fixtures::project_page(REPOSITORY_ID))
        .with_rpc_result(
            INIT_REPOSITORY_DATA,
            fixtures::repository_data(ACCESS_TOKEN, HOSTING_USER_ID, seeded),
        )
        .with_rpc_result(BRANCHES_INFO, branches())
        .with_rpc_result(BUILD_PER_BRANCH, build_groups())
        .with_rpc_result(LIST_BACKUPS, json!([backup(downloadable)]))
}

pub fn client_with(mock: &MockTransport, config: ClientConfig) -> OdooSh {
    osh_logging::init_for_test("osh-client", osh_logging::Level::DEBUG);
    let session = Session::unauthenticated(Box::new(mock.clone()), config).unwrap();
    OdooSh::from_session(session)
}

pub fn client(mock: &MockTransport) -> OdooSh {
    client_with(mock, ClientConfig::default())
}
