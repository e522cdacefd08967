// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Server-pushed notifications and the bus events that carry them
//!
//! The console discriminates notifications by their human-readable `name`
//! and bus messages by their `type`. Both are translated into tagged enums
//! here; anything unrecognised becomes an `Unknown` variant rather than an
//! error so callers can drop it quietly.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ApiContractError, ApiContractResult};
use crate::types::{parse_timestamp, BusMessage};

/// Notification name the console uses once a backup finished
pub const BACKUP_READY_NAME: &str = "Backup Ready";
/// Notification name the console uses once a requested dump can be fetched
pub const DB_DUMP_READY_NAME: &str = "Database dump ready";
/// Bus message type wrapping a notification payload
pub const NOTIFICATION_EVENT_TYPE: &str = "notification";

/// Discriminant of [`Notification`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    BackupReady,
    DbDumpReady,
    Unknown,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::BackupReady => "backup_ready",
            NotificationKind::DbDumpReady => "db_dump_ready",
            NotificationKind::Unknown => "unknown",
        }
    }

    fn from_name(name: &str) -> Self {
        match name {
            BACKUP_READY_NAME => NotificationKind::BackupReady,
            DB_DUMP_READY_NAME => NotificationKind::DbDumpReady,
            _ => NotificationKind::Unknown,
        }
    }
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Deserialize)]
struct NotificationPayload {
    id: i64,
    #[serde(default)]
    name: String,
    #[serde(default)]
    timestamp: Option<String>,
    #[serde(default)]
    create_date: Option<String>,
    #[serde(default)]
    buttons: Vec<NotificationButton>,
}

#[derive(Debug, Deserialize)]
struct NotificationButton {
    #[serde(default)]
    url: Option<String>,
}

/// A console notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notification {
    BackupReady {
        id: i64,
        timestamp: Option<String>,
    },
    DbDumpReady {
        id: i64,
        timestamp: Option<String>,
        url: String,
    },
    Unknown {
        id: i64,
        name: String,
        timestamp: Option<String>,
    },
}

impl Notification {
    /// Translate a raw notification payload.
    ///
    /// A dump notification without a usable first button is an error: the URL
    /// is the only thing that makes it actionable.
    pub fn from_payload(payload: &Value) -> ApiContractResult<Self> {
        let payload = NotificationPayload::deserialize(payload)?;
        let timestamp = payload.timestamp.or(payload.create_date);

        let notification = match NotificationKind::from_name(&payload.name) {
            NotificationKind::BackupReady => Notification::BackupReady {
                id: payload.id,
                timestamp,
            },
            NotificationKind::DbDumpReady => {
                let url = payload
                    .buttons
                    .into_iter()
                    .next()
                    .and_then(|button| button.url)
                    .filter(|url| !url.trim().is_empty())
                    .ok_or(ApiContractError::MissingDumpUrl { id: payload.id })?;
                Notification::DbDumpReady {
                    id: payload.id,
                    timestamp,
                    url,
                }
            }
            NotificationKind::Unknown => Notification::Unknown {
                id: payload.id,
                name: payload.name,
                timestamp,
            },
        };

        Ok(notification)
    }

    pub fn id(&self) -> i64 {
        match self {
            Notification::BackupReady { id, .. }
            | Notification::DbDumpReady { id, .. }
            | Notification::Unknown { id, .. } => *id,
        }
    }

    pub fn kind(&self) -> NotificationKind {
        match self {
            Notification::BackupReady { .. } => NotificationKind::BackupReady,
            Notification::DbDumpReady { .. } => NotificationKind::DbDumpReady,
            Notification::Unknown { .. } => NotificationKind::Unknown,
        }
    }

    pub fn timestamp(&self) -> Option<&str> {
        match self {
            Notification::BackupReady { timestamp, .. }
            | Notification::DbDumpReady { timestamp, .. }
            | Notification::Unknown { timestamp, .. } => timestamp.as_deref(),
        }
    }

    /// Download URL, only present on dump notifications
    pub fn url(&self) -> Option<&str> {
        match self {
            Notification::DbDumpReady { url, .. } => Some(url),
            _ => None,
        }
    }

    pub fn datetime(&self) -> Option<ApiContractResult<NaiveDateTime>> {
        self.timestamp().map(parse_timestamp)
    }
}

impl std::fmt::Display for Notification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} #{}", self.kind(), self.id())?;
        if let Some(timestamp) = self.timestamp() {
            write!(f, " at {}", timestamp)?;
        }
        Ok(())
    }
}

/// A decoded bus message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Notification {
        bus_id: i64,
        notification: Notification,
    },
    Unknown {
        bus_id: i64,
        kind: String,
    },
}

impl Event {
    pub fn from_bus_message(message: &BusMessage) -> ApiContractResult<Self> {
        if message.message.kind != NOTIFICATION_EVENT_TYPE {
            return Ok(Event::Unknown {
                bus_id: message.id,
                kind: message.message.kind.clone(),
            });
        }

        Ok(Event::Notification {
            bus_id: message.id,
            notification: Notification::from_payload(&message.message.payload)?,
        })
    }

    pub fn bus_id(&self) -> i64 {
        match self {
            Event::Notification { bus_id, .. } | Event::Unknown { bus_id, .. } => *bus_id,
        }
    }

    pub fn into_notification(self) -> Option<Notification> {
        match self {
            Event::Notification { notification, .. } => Some(notification),
            Event::Unknown { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BusMessageBody;
    use serde_json::json;

    fn bus(id: i64, kind: &str, payload: Value) -> BusMessage {
        BusMessage {
            id,
            message: BusMessageBody {
                kind: kind.to_string(),
                payload,
            },
        }
    }

    #[test]
    fn test_dump_ready_uses_first_button_url() {
        let notification = Notification::from_payload(&json!({
            "id": 12,
            "name": "Database dump ready",
            "create_date": "2024-05-01 10:00:00",
            "buttons": [
                {"name": "Download", "url": "https://acme-main-99.dev.odoo.com/dump.zip"},
                {"name": "Other", "url": "https://example.com/ignored"}
            ]
        }))
        .unwrap();

        assert_eq!(notification.kind(), NotificationKind::DbDumpReady);
        assert_eq!(notification.id(), 12);
        assert_eq!(
            notification.url(),
            Some("https://acme-main-99.dev.odoo.com/dump.zip")
        );
        assert_eq!(notification.timestamp(), Some("2024-05-01 10:00:00"));
    }

    #[test]
    fn test_dump_ready_without_url_is_rejected() {
        let err = Notification::from_payload(&json!({
            "id": 13,
            "name": "Database dump ready",
            "buttons": []
        }))
        .unwrap_err();
        assert!(matches!(err, ApiContractError::MissingDumpUrl { id: 13 }));

        let err = Notification::from_payload(&json!({
            "id": 14,
            "name": "Database dump ready",
            "buttons": [{"url": "  "}]
        }))
        .unwrap_err();
        assert!(matches!(err, ApiContractError::MissingDumpUrl { id: 14 }));
    }

    #[test]
    fn test_backup_ready_has_no_url() {
        let notification = Notification::from_payload(&json!({
            "id": 5,
            "name": "Backup Ready",
            "timestamp": "2024-05-01 09:00:00",
            "buttons": [{"url": "https://example.com/not-a-dump"}]
        }))
        .unwrap();

        assert_eq!(
            notification,
            Notification::BackupReady {
                id: 5,
                timestamp: Some("2024-05-01 09:00:00".to_string()),
            }
        );
        assert_eq!(notification.url(), None);
    }

    #[test]
    fn test_timestamp_falls_back_to_create_date() {
        let both = Notification::from_payload(&json!({
            "id": 15,
            "name": "Database dump ready",
            "timestamp": "2024-05-01 10:05:00",
            "create_date": "2024-05-01 10:00:00",
            "buttons": [{"url": "/download/15"}]
        }))
        .unwrap();
        assert_eq!(both.timestamp(), Some("2024-05-01 10:05:00"));
        assert_eq!(both.url(), Some("/download/15"));

        let legacy = Notification::from_payload(&json!({
            "id": 16,
            "name": "Backup Ready",
            "create_date": "2024-05-01 10:00:00"
        }))
        .unwrap();
        assert_eq!(legacy.timestamp(), Some("2024-05-01 10:00:00"));
    }

    #[test]
    fn test_unrecognised_name_is_unknown() {
        let notification = Notification::from_payload(&json!({
            "id": 6,
            "name": "Build failed"
        }))
        .unwrap();

        assert_eq!(notification.kind(), NotificationKind::Unknown);
        assert_eq!(notification.kind().as_str(), "unknown");
    }

    #[test]
    fn test_serialized_tag() {
        let notification = Notification::DbDumpReady {
            id: 1,
            timestamp: None,
            url: "https://example.com/dump.zip".to_string(),
        };
        let value = serde_json::to_value(&notification).unwrap();
        assert_eq!(value["type"], json!("db_dump_ready"));
    }

    #[test]
    fn test_event_translation() {
        let event = Event::from_bus_message(&bus(
            101,
            "notification",
            json!({"id": 5, "name": "Backup Ready"}),
        ))
        .unwrap();
        assert_eq!(event.bus_id(), 101);
        assert_eq!(
            event.into_notification().map(|n| n.kind()),
            Some(NotificationKind::BackupReady)
        );

        let event = Event::from_bus_message(&bus(102, "build_status", json!({"id": 1}))).unwrap();
        assert_eq!(
            event,
            Event::Unknown {
                bus_id: 102,
                kind: "build_status".to_string()
            }
        );
        assert!(event.into_notification().is_none());
    }

    #[test]
    fn test_display() {
        let notification = Notification::BackupReady {
            id: 5,
            timestamp: Some("2024-05-01 09:00:00".to_string()),
        };
        assert_eq!(notification.to_string(), "backup_ready #5 at 2024-05-01 09:00:00");
    }
}
