// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Canned console pages and bus payloads

use serde_json::{json, Value};

/// Logged-out listing page carrying the identity provider's form
pub fn login_page(authenticity_token: &str) -> String {
    format!(
        r#"<html><body>
  <form action="/session" method="post">
    <input type="hidden" name="authenticity_token" value="{}">
    <input type="text" name="login" id="login_field">
    <input type="password" name="password" id="password">
    <input type="submit" name="commit" value="Sign in">
  </form>
</body></html>"#,
        authenticity_token
    )
}

/// A project card as rendered on the listing page
pub struct ProjectCard<'a> {
    pub name: &'a str,
    pub href: &'a str,
    pub version: &'a str,
}

pub fn project_listing(cards: &[ProjectCard<'_>]) -> String {
    let cards: String = cards
        .iter()
        .map(|card| {
            format!(
                r#"
    <div class="col-lg-4 o_project_card_container">
      <div class="card">
        <div class="card-body"><a href="{}">{}</a></div>
        <table class="table">
          <tr><th>Version</th><td>{}</td></tr>
          <tr><th>Plan</th><td>Enterprise</td></tr>
        </table>
      </div>
    </div>"#,
                card.href, card.name, card.version
            )
        })
        .collect();

    format!(r#"<html><body><div class="row">{}</div></body></html>"#, cards)
}

/// Project detail page with its embedded client state
pub fn project_page(repository_id: i64) -> String {
    format!(
        r#"<html><body><div id="wrapwrap" data-state='{{"repository_id": {}, "project_name": "acme"}}'></div></body></html>"#,
        repository_id
    )
}

pub fn repository_data(access_token: &str, hosting_user_id: i64, notifications: Vec<Value>) -> Value {
    json!({
        "access_token": access_token,
        "hosting_user_id": hosting_user_id,
        "notifications": notifications,
    })
}

pub fn backup_ready(id: i64) -> Value {
    json!({
        "id": id,
        "name": "Backup Ready",
        "create_date": "2024-05-01 09:00:00",
        "buttons": []
    })
}

pub fn dump_ready(id: i64, url: &str) -> Value {
    json!({
        "id": id,
        "name": "Database dump ready",
        "create_date": "2024-05-01 10:05:00",
        "buttons": [{"name": "Download", "url": url}]
    })
}

/// A bus message wrapping a notification payload
pub fn notification_message(bus_id: i64, payload: Value) -> Value {
    json!({"id": bus_id, "message": {"type": "notification", "payload": payload}})
}

/// A bus message the client does not care about
pub fn other_message(bus_id: i64, kind: &str) -> Value {
    json!({"id": bus_id, "message": {"type": kind, "payload": {}}})
}
