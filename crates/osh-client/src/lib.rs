// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Blocking client for the Odoo.sh web console
//!
//! The console has no public API. This crate drives the same endpoints the
//! web UI does: it logs in through the identity provider's form, scrapes the
//! project listing, calls the internal JSON-RPC routes for branches, builds
//! and backups, and listens on the notification bus to learn when a
//! requested database dump can be downloaded.
//!
//! ```no_run
//! use osh_client::OdooSh;
//!
//! # fn main() -> osh_client::ClientResult<()> {
//! let odoo_sh = OdooSh::new("me@example.com", "secret")?;
//! let project = odoo_sh.project("acme")?.expect("project exists");
//! let main = &project.branches()?["main"];
//! let build = &main.builds()?[0];
//! let backup = &build.backups()?[0];
//! let report = backup.download("acme.zip")?;
//! println!("{} bytes from {}", report.bytes, report.url);
//! # Ok(())
//! # }
//! ```
//!
//! The object graph uses `Rc` and is not `Send`.

pub mod backup;
pub mod branch;
pub mod build;
pub mod client;
pub mod config;
pub mod download;
pub mod error;
pub mod html;
mod lazy;
pub mod poller;
pub mod project;
pub mod rpc;
pub mod session;
pub mod transport;

pub use backup::Backup;
pub use branch::Branch;
pub use build::Build;
pub use client::OdooSh;
pub use config::ClientConfig;
pub use download::{DownloadReport, DownloadState, DumpOptions};
pub use error::{ClientError, ClientResult};
pub use project::Project;
pub use session::Session;
pub use transport::{HttpResponse, ReqwestTransport, Transport};

pub use osh_api_contract::{Notification, NotificationKind};
