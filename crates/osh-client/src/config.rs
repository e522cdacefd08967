// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Client configuration
//!
//! Everything has a default that targets the public console, so most callers
//! never touch this. The struct deserializes from kebab-case keys so it can
//! sit inside a caller's own configuration file.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{ClientError, ClientResult};

pub const DEFAULT_BASE_URL: &str = "https://www.odoo.sh";
pub const DEFAULT_LOGIN_URL: &str = "https://github.com/session";
pub const DEFAULT_BUILD_LIMIT: u32 = 2;
pub const DEFAULT_CHUNK_SIZE: usize = 8 * 1024;

const PROJECT_LIST_PATH: &str = "/project";
const CALL_KW_PATH: &str = "/web/dataset/call_kw";
const POLL_PATH: &str = "/longpolling/poll";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ClientConfig {
    /// Console host serving pages and model RPCs
    pub base_url: Url,
    /// Identity provider endpoint receiving the login form
    pub login_url: Url,
    /// Most recent builds fetched per branch
    pub build_limit: u32,
    /// Seconds the bus may hold a long-poll open; `None` leaves it to the server
    pub poll_timeout: Option<u64>,
    /// Upper bound on long-polls while waiting for a notification; `None` waits forever
    pub max_polls: Option<u32>,
    /// Read size when streaming downloads to disk
    pub chunk_size: usize,
    pub user_agent: String,
    /// Per-request HTTP timeout in seconds; `None` blocks indefinitely
    pub http_timeout: Option<u64>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default base URL is valid"),
            login_url: Url::parse(DEFAULT_LOGIN_URL).expect("default login URL is valid"),
            build_limit: DEFAULT_BUILD_LIMIT,
            poll_timeout: None,
            max_polls: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
            user_agent: format!("osh-client/{}", env!("CARGO_PKG_VERSION")),
            http_timeout: None,
        }
    }
}

impl ClientConfig {
    pub fn validate(&self) -> ClientResult<()> {
        if self.build_limit == 0 {
            return Err(ClientError::Config("build-limit must be at least 1".to_string()));
        }
        if self.chunk_size == 0 {
            return Err(ClientError::Config("chunk-size must be at least 1".to_string()));
        }
        if self.base_url.cannot_be_a_base() {
            return Err(ClientError::Config(format!(
                "base-url {} cannot be used as a base",
                self.base_url
            )));
        }
        Ok(())
    }

    /// Resolve a link found on a console page (relative or absolute)
    pub fn resolve(&self, href: &str) -> ClientResult<Url> {
        Ok(self.base_url.join(href)?)
    }

    pub fn project_list_url(&self) -> ClientResult<Url> {
        self.resolve(PROJECT_LIST_PATH)
    }

    pub fn call_kw_url(&self, model: &str, method: &str) -> ClientResult<Url> {
        self.resolve(&format!("{}/{}/{}", CALL_KW_PATH, model, method))
    }

    pub fn poll_url(&self) -> ClientResult<Url> {
        self.resolve(POLL_PATH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();

        assert_eq!(config.base_url.as_str(), "https://www.odoo.sh/");
        assert_eq!(config.login_url.as_str(), "https://github.com/session");
        assert_eq!(config.build_limit, 2);
        assert_eq!(config.chunk_size, 8192);
        assert!(config.max_polls.is_none());
        assert!(config.http_timeout.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_endpoint_urls() {
        let config = ClientConfig::default();

        assert_eq!(
            config.project_list_url().unwrap().as_str(),
            "https://www.odoo.sh/project"
        );
        assert_eq!(
            config.call_kw_url("paas.repository", "get_branches_info").unwrap().as_str(),
            "https://www.odoo.sh/web/dataset/call_kw/paas.repository/get_branches_info"
        );
        assert_eq!(
            config.poll_url().unwrap().as_str(),
            "https://www.odoo.sh/longpolling/poll"
        );
        assert_eq!(
            config.resolve("https://cdn.example.com/x.zip").unwrap().as_str(),
            "https://cdn.example.com/x.zip"
        );
    }

    #[test]
    fn test_partial_deserialization_keeps_defaults() {
        let config: ClientConfig = serde_json::from_value(json!({
            "base-url": "http://localhost:8069",
            "max-polls": 5
        }))
        .unwrap();

        assert_eq!(config.base_url.as_str(), "http://localhost:8069/");
        assert_eq!(config.max_polls, Some(5));
        assert_eq!(config.build_limit, DEFAULT_BUILD_LIMIT);
    }

    #[test]
    fn test_validation_rejects_zero_sizes() {
        let config = ClientConfig {
            chunk_size: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ClientError::Config(_))));

        let config = ClientConfig {
            build_limit: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ClientError::Config(_))));
    }
}
