// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Backup downloads
//!
//! A downloadable backup is fetched straight from its worker host. Any other
//! backup first needs a dump request; the console prepares the dump in the
//! background and announces it on the notification bus with a download link.
//! The download walks that sequence as an explicit state machine:
//!
//! ```text
//! NotDownloadable -> DumpRequested -> WaitingForNotification -> Ready -> Downloading -> Done
//!                                      ^________________|
//! ```
//!
//! A downloadable backup starts in `Ready`.

use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

use osh_api_contract::NotificationKind;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use url::Url;

use crate::backup::Backup;
use crate::error::{ClientError, ClientResult};
use crate::poller;
use crate::project::ProjectCore;
use crate::transport::Transport;

/// Options of a dump request
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct DumpOptions {
    /// Neutralized dump (crons and mail servers disabled)
    pub test_dump: bool,
    /// Include the filestore in the archive
    pub with_filestore: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadState {
    NotDownloadable,
    DumpRequested,
    WaitingForNotification,
    Ready { url: Url },
    Downloading { url: Url },
    Done { bytes: u64 },
}

impl DownloadState {
    pub fn is_done(&self) -> bool {
        matches!(self, DownloadState::Done { .. })
    }
}

impl std::fmt::Display for DownloadState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DownloadState::NotDownloadable => f.write_str("not-downloadable"),
            DownloadState::DumpRequested => f.write_str("dump-requested"),
            DownloadState::WaitingForNotification => f.write_str("waiting-for-notification"),
            DownloadState::Ready { .. } => f.write_str("ready"),
            DownloadState::Downloading { .. } => f.write_str("downloading"),
            DownloadState::Done { .. } => f.write_str("done"),
        }
    }
}

/// Outcome of a finished download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadReport {
    pub url: Url,
    pub path: PathBuf,
    pub bytes: u64,
    /// Long-polls spent waiting for the dump; zero for direct downloads
    pub polls: u32,
}

pub(crate) struct DumpDownload<'a> {
    core: &'a ProjectCore,
    backup: &'a Backup,
    options: DumpOptions,
    state: DownloadState,
    url: Option<Url>,
    polls: u32,
}

impl<'a> DumpDownload<'a> {
    pub(crate) fn new(
        core: &'a ProjectCore,
        backup: &'a Backup,
        options: DumpOptions,
    ) -> ClientResult<Self> {
        let state = if backup.downloadable() {
            let token = &core.repository_data()?.access_token;
            DownloadState::Ready {
                url: backup.download_url_with_token(token)?,
            }
        } else {
            DownloadState::NotDownloadable
        };

        Ok(Self {
            core,
            backup,
            options,
            state,
            url: None,
            polls: 0,
        })
    }

    pub(crate) fn run(mut self, path: &Path) -> ClientResult<DownloadReport> {
        let span = tracing::info_span!(
            "dump_download",
            correlation_id = %osh_logging::correlation_id(),
            build_id = self.backup.build_id(),
            backup = %self.backup.name()
        );
        let _entered = span.enter();

        let bytes = loop {
            if let DownloadState::Done { bytes } = self.state {
                break bytes;
            }
            self.step(path)?;
        };
        let url = self
            .url
            .ok_or_else(|| ClientError::MissingField("download URL".to_string()))?;

        tracing::info!(url = %url, bytes, polls = self.polls, "Download finished");
        Ok(DownloadReport {
            url,
            path: path.to_path_buf(),
            bytes,
            polls: self.polls,
        })
    }

    fn step(&mut self, path: &Path) -> ClientResult<()> {
        let next = match self.state.clone() {
            DownloadState::NotDownloadable => {
                // Load the notification snapshot first so only later ones count
                self.core.repository_data()?;
                self.core.session.rpc().ask_download(
                    self.backup.build_id(),
                    self.backup.backup_datetime(),
                    self.options.test_dump,
                    self.options.with_filestore,
                )?;
                DownloadState::DumpRequested
            }
            DownloadState::DumpRequested => DownloadState::WaitingForNotification,
            DownloadState::WaitingForNotification => self.poll_once()?,
            DownloadState::Ready { url } => DownloadState::Downloading { url },
            DownloadState::Downloading { url } => {
                let bytes = self.core.session.download(&url, path)?;
                self.url = Some(url);
                DownloadState::Done { bytes }
            }
            DownloadState::Done { .. } => return Ok(()),
        };

        tracing::debug!(from = %self.state, to = %next, "Download state change");
        self.state = next;
        Ok(())
    }

    fn poll_once(&mut self) -> ClientResult<DownloadState> {
        let max_polls = self.core.session.config().max_polls;
        let ready = poller::poll_for(
            self.core,
            NotificationKind::DbDumpReady,
            &mut self.polls,
            max_polls,
        )?;

        match ready.as_ref().and_then(|notification| notification.url()) {
            Some(href) => Ok(DownloadState::Ready {
                url: self.core.session.config().resolve(href)?,
            }),
            None => Ok(DownloadState::WaitingForNotification),
        }
    }
}

/// Copy `url` to `path`, `chunk_size` bytes at a time.
///
/// The bytes land in a temporary file beside `path`, which replaces `path`
/// only once the transfer completed; a failed transfer leaves `path` as it was.
pub fn stream_to_file(
    transport: &dyn Transport,
    url: &Url,
    path: &Path,
    chunk_size: usize,
) -> ClientResult<u64> {
    let mut reader = transport.open(url)?;
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let mut file = NamedTempFile::new_in(dir)?;
    let mut buffer = vec![0u8; chunk_size.max(1)];
    let mut written = 0u64;

    loop {
        let read = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(read) => read,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => {
                tracing::warn!(url = %url, bytes = written, error = %e, "Transfer interrupted");
                return Err(e.into());
            }
        };
        file.write_all(&buffer[..read])?;
        written += read as u64;
    }
    file.flush()?;
    file.persist(path).map_err(|e| e.error)?;

    tracing::debug!(url = %url, path = %path.display(), bytes = written, "Stream written");
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::HttpResponse;
    use serde_json::Value;
    use std::io::Cursor;

    /// Serves a fixed body in reads of at most 3 bytes, optionally failing
    /// once the body is exhausted
    struct TrickleTransport {
        body: Vec<u8>,
        reset_at_end: bool,
    }

    impl TrickleTransport {
        fn new(body: Vec<u8>) -> Self {
            Self {
                body,
                reset_at_end: false,
            }
        }

        fn resetting(body: Vec<u8>) -> Self {
            Self {
                body,
                reset_at_end: true,
            }
        }
    }

    struct Trickle {
        body: Cursor<Vec<u8>>,
        reset_at_end: bool,
    }

    impl Read for Trickle {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            let len = buf.len().min(3);
            match self.body.read(&mut buf[..len])? {
                0 if self.reset_at_end => Err(std::io::Error::new(
                    ErrorKind::ConnectionReset,
                    "connection reset by peer",
                )),
                read => Ok(read),
            }
        }
    }

    impl Transport for TrickleTransport {
        fn get(&self, _url: &Url) -> ClientResult<HttpResponse> {
            unimplemented!()
        }

        fn post_form(&self, _url: &Url, _form: &[(&str, &str)]) -> ClientResult<HttpResponse> {
            unimplemented!()
        }

        fn post_json(&self, _url: &Url, _body: &Value) -> ClientResult<Value> {
            unimplemented!()
        }

        fn open(&self, _url: &Url) -> ClientResult<Box<dyn Read>> {
            Ok(Box::new(Trickle {
                body: Cursor::new(self.body.clone()),
                reset_at_end: self.reset_at_end,
            }))
        }
    }

    #[test]
    fn test_stream_to_file_keeps_byte_order() {
        let body: Vec<u8> = (0..=255u8).cycle().take(10_000).collect();
        let transport = TrickleTransport::new(body.clone());
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dump.zip");
        let url = Url::parse("https://acme.dev.odoo.com/dump.zip").unwrap();

        let written = stream_to_file(&transport, &url, &path, 8).unwrap();

        assert_eq!(written, 10_000);
        assert_eq!(std::fs::read(&path).unwrap(), body);
    }

    #[test]
    fn test_interrupted_stream_leaves_no_partial_file() {
        let transport = TrickleTransport::resetting(b"PK\x03\x04".to_vec());
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dump.zip");
        let url = Url::parse("https://acme.dev.odoo.com/dump.zip").unwrap();

        let err = stream_to_file(&transport, &url, &path, 8).unwrap_err();

        assert!(matches!(err, ClientError::Io(ref e) if e.kind() == ErrorKind::ConnectionReset));
        assert!(!path.exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_interrupted_stream_keeps_previous_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dump.zip");
        std::fs::write(&path, b"previous dump").unwrap();
        let url = Url::parse("https://acme.dev.odoo.com/dump.zip").unwrap();

        let transport = TrickleTransport::resetting(b"partial".to_vec());
        assert!(stream_to_file(&transport, &url, &path, 8).is_err());
        assert_eq!(std::fs::read(&path).unwrap(), b"previous dump");

        let transport = TrickleTransport::new(b"fresh dump".to_vec());
        assert_eq!(stream_to_file(&transport, &url, &path, 8).unwrap(), 10);
        assert_eq!(std::fs::read(&path).unwrap(), b"fresh dump");
    }

    #[test]
    fn test_state_display() {
        let url = Url::parse("https://acme.dev.odoo.com/dump.zip").unwrap();

        assert_eq!(DownloadState::NotDownloadable.to_string(), "not-downloadable");
        assert_eq!(DownloadState::Ready { url }.to_string(), "ready");
        assert!(DownloadState::Done { bytes: 3 }.is_done());
        assert!(!DownloadState::WaitingForNotification.is_done());
    }

    #[test]
    fn test_dump_options_default_to_plain_dump() {
        let options = DumpOptions::default();
        assert!(!options.test_dump);
        assert!(!options.with_filestore);

        let options: DumpOptions = serde_json::from_str(r#"{"with-filestore": true}"#).unwrap();
        assert!(options.with_filestore);
    }
}
