// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

use osh_logging::{init_to_file, Level, LogFormat};

#[test]
fn test_init_to_file_creates_missing_directories() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("logs").join("odoosh-backup.log");

    init_to_file("odoosh-backup", Level::INFO, LogFormat::Plaintext, &path).unwrap();
    tracing::info!(build_id = 9, "Dump requested");
    tracing::debug!("below the configured level");

    let written = std::fs::read_to_string(&path).unwrap();
    assert!(written.contains("Dump requested"));
    assert!(!written.contains("below the configured level"));

    // Only one global subscriber per process
    assert!(init_to_file("odoosh-backup", Level::INFO, LogFormat::Plaintext, &path).is_err());
}
