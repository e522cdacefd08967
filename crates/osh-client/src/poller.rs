// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Notification bus polling

use osh_api_contract::{BusMessage, Event, Notification, NotificationKind};

use crate::error::{ClientError, ClientResult};
use crate::project::ProjectCore;

/// Decode bus messages into notifications, in bus order.
///
/// Messages of other types are dropped; undecodable notifications are
/// logged and dropped.
pub fn notifications_from_bus(messages: &[BusMessage]) -> Vec<Notification> {
    messages
        .iter()
        .filter_map(|message| match Event::from_bus_message(message) {
            Ok(Event::Notification { notification, .. }) => Some(notification),
            Ok(Event::Unknown { bus_id, kind }) => {
                tracing::trace!(bus_id, kind = %kind, "Ignoring bus event");
                None
            }
            Err(e) => {
                tracing::warn!(bus_id = message.id, error = %e, "Skipping undecodable bus event");
                None
            }
        })
        .collect()
}

/// One long-poll for `core`; records and returns notifications not seen before
pub(crate) fn poll(core: &ProjectCore) -> ClientResult<Vec<Notification>> {
    let repository_id = core.repository_id()?;
    let hosting_user_id = core.repository_data()?.hosting_user_id;
    let last = core.bus_cursor.get();

    let messages = core
        .session
        .rpc()
        .polling(hosting_user_id, repository_id, last)?;

    if let Some(highest) = messages.iter().map(|message| message.id).max() {
        if highest > last {
            core.bus_cursor.set(highest);
        }
    }

    let mut known = core.notifications.borrow_mut();
    let fresh: Vec<Notification> = notifications_from_bus(&messages)
        .into_iter()
        .filter(|notification| !known.contains_key(&notification.id()))
        .collect();
    for notification in &fresh {
        known.insert(notification.id(), notification.clone());
    }

    tracing::debug!(
        project = %core.name,
        messages = messages.len(),
        fresh = fresh.len(),
        cursor = core.bus_cursor.get(),
        "Polled notification bus"
    );
    Ok(fresh)
}

/// One bounded poll for a fresh notification of `kind`.
///
/// Fails with `NotificationNotReceived` once `polls` reached `max_polls`;
/// otherwise counts the poll in `polls`.
pub(crate) fn poll_for(
    core: &ProjectCore,
    kind: NotificationKind,
    polls: &mut u32,
    max_polls: Option<u32>,
) -> ClientResult<Option<Notification>> {
    if max_polls.is_some_and(|max| *polls >= max) {
        return Err(ClientError::NotificationNotReceived {
            kind,
            polls: *polls,
        });
    }
    *polls += 1;

    Ok(poll(core)?.into_iter().find(|n| n.kind() == kind))
}

/// Poll until a fresh notification of `kind` arrives. Also returns the
/// number of polls spent.
pub(crate) fn wait_for(
    core: &ProjectCore,
    kind: NotificationKind,
    max_polls: Option<u32>,
) -> ClientResult<(Notification, u32)> {
    let mut polls = 0;
    loop {
        if let Some(found) = poll_for(core, kind, &mut polls, max_polls)? {
            return Ok((found, polls));
        }
    }
}
