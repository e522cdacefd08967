// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! HTTP transport seam
//!
//! Everything above this module talks to the console through [`Transport`],
//! which keeps the cookie jar and hides the HTTP library. Production code
//! uses [`ReqwestTransport`]; tests plug in a scripted transport instead.

use std::io::Read;
use std::time::Duration;

use reqwest::blocking::Client as HttpClient;
use serde_json::Value;
use url::Url;

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// A fully buffered page response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    /// Final URL after redirects
    pub url: String,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Blocking HTTP operations the client needs
///
/// Implementations must carry cookies across calls: authentication is the
/// session cookie set by the login round-trip.
pub trait Transport {
    /// GET a page. Non-2xx statuses are returned, not raised.
    fn get(&self, url: &Url) -> ClientResult<HttpResponse>;

    /// POST an urlencoded form. Non-2xx statuses are returned, not raised.
    fn post_form(&self, url: &Url, form: &[(&str, &str)]) -> ClientResult<HttpResponse>;

    /// POST a JSON body and decode the JSON answer
    fn post_json(&self, url: &Url, body: &Value) -> ClientResult<Value>;

    /// GET a resource for streaming. Fails on non-2xx status.
    fn open(&self, url: &Url) -> ClientResult<Box<dyn Read>>;
}

/// [`Transport`] backed by a blocking reqwest client with a cookie store
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    http_client: HttpClient,
}

impl ReqwestTransport {
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let http_client = HttpClient::builder()
            .user_agent(config.user_agent.clone())
            .cookie_store(true)
            .timeout(config.http_timeout.map(Duration::from_secs))
            .build()?;

        Ok(Self { http_client })
    }

    fn buffer(response: reqwest::blocking::Response) -> ClientResult<HttpResponse> {
        let status = response.status().as_u16();
        let url = response.url().to_string();
        let body = response.text()?;
        Ok(HttpResponse { status, url, body })
    }
}

impl Transport for ReqwestTransport {
    fn get(&self, url: &Url) -> ClientResult<HttpResponse> {
        let response = self.http_client.get(url.clone()).send()?;
        Self::buffer(response)
    }

    fn post_form(&self, url: &Url, form: &[(&str, &str)]) -> ClientResult<HttpResponse> {
        let response = self.http_client.post(url.clone()).form(form).send()?;
        Self::buffer(response)
    }

    fn post_json(&self, url: &Url, body: &Value) -> ClientResult<Value> {
        let response = self.http_client.post(url.clone()).json(body).send()?;
        Ok(response.json()?)
    }

    fn open(&self, url: &Url) -> ClientResult<Box<dyn Read>> {
        let response = self.http_client.get(url.clone()).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(Box::new(response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_creation() {
        let transport = ReqwestTransport::new(&ClientConfig::default());
        assert!(transport.is_ok());
    }

    #[test]
    fn test_response_success_range() {
        let response = |status| HttpResponse {
            status,
            url: "https://www.odoo.sh/project".to_string(),
            body: String::new(),
        };

        assert!(response(200).is_success());
        assert!(response(204).is_success());
        assert!(!response(302).is_success());
        assert!(!response(404).is_success());
    }
}
