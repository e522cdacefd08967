// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

use osh_logging::{init_from_config, LogConfig};

#[test]
fn test_init_from_config_writes_json_lines_to_the_configured_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("odoosh.log");
    let config: LogConfig = serde_json::from_value(serde_json::json!({
        "level": "warn",
        "format": "json",
        "file": path,
    }))
    .unwrap();

    init_from_config("odoosh-backup", &config).unwrap();
    tracing::warn!(polls = 3, "Dump notification still missing");
    tracing::info!("filtered out");

    let written = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<serde_json::Value> = written
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();

    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["level"], "WARN");
    assert_eq!(lines[0]["fields"]["message"], "Dump notification still missing");
    assert_eq!(lines[0]["fields"]["polls"], 3);
}
