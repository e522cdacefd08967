// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Authenticated console session

use std::path::Path;

use osh_api_contract::ProjectState;
use url::Url;

use crate::config::ClientConfig;
use crate::download;
use crate::error::{ClientError, ClientResult};
use crate::html::{self, ProjectRecord};
use crate::rpc::RpcClient;
use crate::transport::{ReqwestTransport, Transport};

/// A transport with its cookie jar, plus the configuration every call reads
///
/// One session is shared by the whole object graph of an [`OdooSh`](crate::OdooSh).
pub struct Session {
    transport: Box<dyn Transport>,
    config: ClientConfig,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("base_url", &self.config.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Wrap a transport whose cookie jar is already authenticated (or that
    /// needs no authentication at all)
    pub fn unauthenticated(
        transport: Box<dyn Transport>,
        config: ClientConfig,
    ) -> ClientResult<Self> {
        config.validate()?;
        Ok(Self { transport, config })
    }

    /// Log in through the identity provider's form.
    ///
    /// Rejected credentials are not detected here: the session simply stays
    /// anonymous and later calls come back empty.
    pub fn login(
        transport: Box<dyn Transport>,
        config: ClientConfig,
        login: &str,
        password: &str,
    ) -> ClientResult<Self> {
        let session = Self::unauthenticated(transport, config)?;

        let listing_url = session.config.project_list_url()?;
        let page = session.transport.get(&listing_url)?;
        let form = html::login_form(&page.body)?;

        tracing::debug!(
            login,
            password = %osh_logging::redact(password),
            login_url = %session.config.login_url,
            "Submitting login form"
        );

        let response = session.transport.post_form(
            &session.config.login_url,
            &[
                ("login", login),
                ("password", password),
                ("authenticity_token", &form.authenticity_token),
                ("commit", &form.commit),
            ],
        )?;
        tracing::debug!(status = response.status, url = %response.url, "Login round-trip finished");

        Ok(session)
    }

    /// Login with the default reqwest transport
    pub fn login_with_config(config: ClientConfig, login: &str, password: &str) -> ClientResult<Self> {
        let transport = ReqwestTransport::new(&config)?;
        Self::login(Box::new(transport), config, login, password)
    }

    pub fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn rpc(&self) -> RpcClient<'_> {
        RpcClient::new(self.transport.as_ref(), &self.config)
    }

    /// Project cards of the listing page, in page order
    pub fn projects_data(&self) -> ClientResult<impl Iterator<Item = ProjectRecord>> {
        let url = self.config.project_list_url()?;
        let page = self.fetch_page(&url)?;

        let records = html::project_records(&page, &self.config.base_url)?;
        if records.is_empty() {
            tracing::warn!(url = %url, "No project cards found; is the session logged in?");
        }
        Ok(records.into_iter())
    }

    /// The JSON state embedded in a project page
    pub fn project_state(&self, project_url: &Url) -> ClientResult<ProjectState> {
        let page = self.fetch_page(project_url)?;
        html::repository_state(&page)
    }

    /// Stream `url` into `path`, returning the number of bytes written
    pub fn download(&self, url: &Url, path: &Path) -> ClientResult<u64> {
        download::stream_to_file(self.transport(), url, path, self.config.chunk_size)
    }

    fn fetch_page(&self, url: &Url) -> ClientResult<String> {
        let response = self.transport.get(url)?;
        if !response.is_success() {
            return Err(ClientError::Status {
                status: response.status,
                url: response.url,
            });
        }
        Ok(response.body)
    }
}
