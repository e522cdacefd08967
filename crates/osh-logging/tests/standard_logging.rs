// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

#![cfg(target_os = "linux")]

use osh_logging::{init, init_to_standard_file, standard_log_path_for_component, Level, LogFormat};

#[test]
fn test_standard_file_lands_under_the_data_dir() {
    let dir = tempfile::tempdir().unwrap();
    std::env::set_var("XDG_DATA_HOME", dir.path());

    let path = standard_log_path_for_component("odoosh-sync");
    assert_eq!(path, dir.path().join("odoosh").join("odoosh-sync.log"));

    init_to_standard_file("odoosh-sync", Level::INFO, LogFormat::Plaintext).unwrap();
    tracing::info!(project = "acme", "Projects loaded");

    let written = std::fs::read_to_string(&path).unwrap();
    assert!(written.contains("Projects loaded"));

    // The stdout subscriber cannot replace the installed one
    assert!(init("odoosh-sync", Level::INFO, LogFormat::Plaintext).is_err());
}
