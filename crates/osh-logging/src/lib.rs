// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Logging setup for programs built on the console client
//!
//! The client crates never install a subscriber; they only emit `tracing`
//! events. A program picks where those go with one of the `init*`
//! functions, or describes it in its own configuration file with
//! [`LogConfig`].
//!
//! The default filter keeps the HTTP and HTML parsing stacks at `warn`:
//! at `debug` they log every connection and tokenizer step, which drowns
//! the client's own lines during a long dump wait.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub use tracing::Level;

/// Directory name used under the platform's log location
const LOG_DIR_NAME: &str = "odoosh";

/// Dependencies that are only interesting when they misbehave
const QUIET_TARGETS: &[&str] = &["reqwest", "hyper", "hyper_util", "rustls", "html5ever", "selectors"];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Plaintext,
    /// One JSON object per line
    Json,
}

impl LogFormat {
    fn as_str(self) -> &'static str {
        match self {
            LogFormat::Plaintext => "plaintext",
            LogFormat::Json => "json",
        }
    }
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [LogFormat::Plaintext, LogFormat::Json]
            .into_iter()
            .find(|format| format.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown log format {:?} (expected plaintext or json)", s))
    }
}

/// Logging section of a caller's configuration file
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct LogConfig {
    /// `error`, `warn`, `info`, `debug` or `trace`
    pub level: String,
    pub format: LogFormat,
    /// Log file; `None` logs to stdout
    pub file: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Plaintext,
            file: None,
        }
    }
}

/// `<platform log dir>/odoosh/<component>.log`
///
/// macOS uses `~/Library/Logs`; elsewhere the user data directory.
pub fn standard_log_path_for_component(component: &str) -> PathBuf {
    let base = if cfg!(target_os = "macos") {
        dirs::home_dir().map(|home| home.join("Library").join("Logs"))
    } else {
        dirs::data_dir().or_else(dirs::home_dir)
    };

    base.unwrap_or_else(std::env::temp_dir)
        .join(LOG_DIR_NAME)
        .join(format!("{}.log", component))
}

/// Log to stdout
///
/// ```rust,no_run
/// use osh_logging::{init, Level, LogFormat};
///
/// fn main() -> anyhow::Result<()> {
///     init("odoosh-backup", Level::INFO, LogFormat::Plaintext)?;
///     tracing::info!("Fetching nightly dumps");
///     Ok(())
/// }
/// ```
pub fn init(component: &str, level: Level, format: LogFormat) -> anyhow::Result<()> {
    init_with_writer(component, level, format, std::io::stdout)
}

/// Append to `log_path`, creating missing directories
pub fn init_to_file(
    component: &str,
    level: Level,
    format: LogFormat,
    log_path: &Path,
) -> anyhow::Result<()> {
    if let Some(dir) = log_path.parent() {
        fs::create_dir_all(dir)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(log_path)?;
    init_with_writer(component, level, format, file)
}

pub fn init_to_standard_file(component: &str, level: Level, format: LogFormat) -> anyhow::Result<()> {
    init_to_file(
        component,
        level,
        format,
        &standard_log_path_for_component(component),
    )
}

/// Install the subscriber described by a [`LogConfig`]
pub fn init_from_config(component: &str, config: &LogConfig) -> anyhow::Result<()> {
    let level: Level = config
        .level
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid log level {:?}", config.level))?;

    match &config.file {
        Some(path) => init_to_file(component, level, config.format, path),
        None => init(component, level, config.format),
    }
}

/// Install a subscriber writing to `writer`. A set `RUST_LOG` replaces the
/// default filter entirely.
pub fn init_with_writer<W>(
    component: &str,
    level: Level,
    format: LogFormat,
    writer: W,
) -> anyhow::Result<()>
where
    W: for<'w> fmt::MakeWriter<'w> + Send + Sync + 'static,
{
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter(component, level)))?;

    let layer = fmt::layer()
        .with_writer(writer)
        .with_file(cfg!(debug_assertions))
        .with_line_number(cfg!(debug_assertions));

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry.with(layer.json()).try_init()?,
        LogFormat::Plaintext => registry.with(layer).try_init()?,
    }
    Ok(())
}

fn default_filter(component: &str, level: Level) -> String {
    let mut directives = vec![
        level.to_string().to_lowercase(),
        format!("{}={}", component.replace('-', "_"), level.to_string().to_lowercase()),
    ];
    directives.extend(QUIET_TARGETS.iter().map(|target| format!("{}=warn", target)));
    directives.join(",")
}

/// Capture log output in memory for assertions
///
/// Only the first call in a test binary installs the subscriber; later
/// calls get a buffer nothing writes to.
#[cfg(any(test, feature = "test-utils"))]
pub fn init_for_test(component: &str, level: Level) -> std::sync::Arc<std::sync::Mutex<Vec<u8>>> {
    use std::sync::{Arc, Mutex};

    #[derive(Clone)]
    struct Capture(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for Capture {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            let mut captured = self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            captured.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    let buffer = Arc::new(Mutex::new(Vec::new()));
    let capture = Capture(Arc::clone(&buffer));
    let _ = init_with_writer(component, level, LogFormat::Plaintext, move || capture.clone());
    buffer
}

/// Stand-in for a secret in log fields
///
/// ```rust
/// let password = "hunter2";
/// tracing::debug!(password = %osh_logging::redact(password), "Submitting login form");
/// ```
pub fn redact(_secret: impl std::fmt::Display) -> &'static str {
    "[REDACTED]"
}

/// Identifier tying together the log lines of one multi-request operation,
/// such as a dump download spanning a request, several polls and a transfer
pub fn correlation_id() -> String {
    use std::sync::atomic::{AtomicU64, Ordering};

    static NEXT: AtomicU64 = AtomicU64::new(1);
    format!("{:x}-{}", std::process::id(), NEXT.fetch_add(1, Ordering::Relaxed))
}
