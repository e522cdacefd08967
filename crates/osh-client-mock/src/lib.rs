// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Scripted transport for testing the console client
//!
//! [`MockTransport`] answers requests from canned responses keyed by URL
//! path and records every request it sees. Each path holds a queue: responses
//! are served in order and the last one repeats forever. Clones share the
//! same script and log, so a test keeps one clone for assertions and hands
//! another to the client.

pub mod fixtures;

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::io::{Cursor, Read};
use std::rc::Rc;

use osh_client::{ClientError, ClientResult, HttpResponse, Transport};
use serde_json::{json, Value};
use url::Url;

/// A request seen by the mock
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedRequest {
    Get { url: Url },
    PostForm { url: Url, form: Vec<(String, String)> },
    PostJson { url: Url, body: Value },
    Open { url: Url },
}

impl RecordedRequest {
    pub fn url(&self) -> &Url {
        match self {
            RecordedRequest::Get { url }
            | RecordedRequest::PostForm { url, .. }
            | RecordedRequest::PostJson { url, .. }
            | RecordedRequest::Open { url } => url,
        }
    }
}

#[derive(Debug, Clone)]
struct FileResponse {
    status: u16,
    bytes: Vec<u8>,
}

#[derive(Debug, Default)]
struct MockState {
    pages: HashMap<String, VecDeque<(u16, String)>>,
    json: HashMap<String, VecDeque<Value>>,
    files: HashMap<String, FileResponse>,
    requests: Vec<RecordedRequest>,
}

/// Pop the next scripted response, keeping the last one in place
fn next_in<T: Clone>(queue: &mut VecDeque<T>) -> Option<T> {
    if queue.len() > 1 {
        queue.pop_front()
    } else {
        queue.front().cloned()
    }
}

#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    state: Rc<RefCell<MockState>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` with status 200 on GET and form POST to `path`
    pub fn with_page(self, path: &str, body: impl Into<String>) -> Self {
        self.with_page_status(path, 200, body)
    }

    pub fn with_page_status(self, path: &str, status: u16, body: impl Into<String>) -> Self {
        self.state
            .borrow_mut()
            .pages
            .entry(path.to_string())
            .or_default()
            .push_back((status, body.into()));
        self
    }

    /// Answer JSON posts to `path` with a raw body
    pub fn with_json(self, path: &str, body: Value) -> Self {
        self.state
            .borrow_mut()
            .json
            .entry(path.to_string())
            .or_default()
            .push_back(body);
        self
    }

    /// Answer JSON posts to `path` with a JSON-RPC envelope around `result`
    pub fn with_rpc_result(self, path: &str, result: Value) -> Self {
        self.with_json(path, rpc_result(result))
    }

    /// Serve `bytes` when `path` is opened for streaming
    pub fn with_file(self, path: &str, bytes: impl Into<Vec<u8>>) -> Self {
        self.state.borrow_mut().files.insert(
            path.to_string(),
            FileResponse {
                status: 200,
                bytes: bytes.into(),
            },
        );
        self
    }

    pub fn with_file_status(self, path: &str, status: u16) -> Self {
        self.state.borrow_mut().files.insert(
            path.to_string(),
            FileResponse {
                status,
                bytes: Vec::new(),
            },
        );
        self
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.borrow().requests.clone()
    }

    /// Number of requests of any kind whose URL path is `path`
    pub fn count(&self, path: &str) -> usize {
        self.state
            .borrow()
            .requests
            .iter()
            .filter(|request| request.url().path() == path)
            .count()
    }

    /// Bodies of the JSON posts sent to `path`, in order
    pub fn json_bodies(&self, path: &str) -> Vec<Value> {
        self.state
            .borrow()
            .requests
            .iter()
            .filter_map(|request| match request {
                RecordedRequest::PostJson { url, body } if url.path() == path => Some(body.clone()),
                _ => None,
            })
            .collect()
    }

    /// URLs opened for streaming, in order
    pub fn opened(&self) -> Vec<Url> {
        self.state
            .borrow()
            .requests
            .iter()
            .filter_map(|request| match request {
                RecordedRequest::Open { url } => Some(url.clone()),
                _ => None,
            })
            .collect()
    }

    fn record(&self, request: RecordedRequest) {
        self.state.borrow_mut().requests.push(request);
    }

    fn page(&self, url: &Url) -> HttpResponse {
        let scripted = self
            .state
            .borrow_mut()
            .pages
            .get_mut(url.path())
            .and_then(next_in);
        let (status, body) = scripted.unwrap_or((404, String::new()));
        HttpResponse {
            status,
            url: url.to_string(),
            body,
        }
    }
}

/// Wrap `result` in a JSON-RPC response envelope
pub fn rpc_result(result: Value) -> Value {
    json!({"jsonrpc": "2.0", "id": null, "result": result})
}

fn not_found(url: &Url) -> ClientError {
    ClientError::Status {
        status: 404,
        url: url.to_string(),
    }
}

impl Transport for MockTransport {
    fn get(&self, url: &Url) -> ClientResult<HttpResponse> {
        self.record(RecordedRequest::Get { url: url.clone() });
        Ok(self.page(url))
    }

    fn post_form(&self, url: &Url, form: &[(&str, &str)]) -> ClientResult<HttpResponse> {
        self.record(RecordedRequest::PostForm {
            url: url.clone(),
            form: form
                .iter()
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .collect(),
        });
        Ok(self.page(url))
    }

    fn post_json(&self, url: &Url, body: &Value) -> ClientResult<Value> {
        self.record(RecordedRequest::PostJson {
            url: url.clone(),
            body: body.clone(),
        });
        self.state
            .borrow_mut()
            .json
            .get_mut(url.path())
            .and_then(next_in)
            .ok_or_else(|| not_found(url))
    }

    fn open(&self, url: &Url) -> ClientResult<Box<dyn Read>> {
        self.record(RecordedRequest::Open { url: url.clone() });
        let file = self
            .state
            .borrow()
            .files
            .get(url.path())
            .cloned()
            .ok_or_else(|| not_found(url))?;

        if !(200..300).contains(&file.status) {
            return Err(ClientError::Status {
                status: file.status,
                url: url.to_string(),
            });
        }
        Ok(Box::new(Cursor::new(file.bytes)))
    }
}
