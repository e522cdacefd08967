// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Scraping of the server-rendered console pages
//!
//! Three pages matter: the project listing (project cards plus, when logged
//! out, the login form) and each project's detail page, whose root element
//! embeds the client-side state as JSON.

use std::collections::BTreeMap;

use osh_api_contract::ProjectState;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::error::{ClientError, ClientResult};

const PROJECT_CARD: &str = "div.o_project_card_container";
const STATE_ROOT: &str = "div#wrapwrap";
const STATE_ATTRIBUTE: &str = "data-state";

/// Hidden fields of the identity provider's login form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginForm {
    pub authenticity_token: String,
    pub commit: String,
}

/// One project card of the listing page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectRecord {
    pub name: String,
    /// Absolute URL of the project page
    pub url: String,
    /// Every key/value row of the card, plus `name` and `url`
    pub fields: BTreeMap<String, String>,
}

impl ProjectRecord {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }
}

fn selector(css: &str) -> ClientResult<Selector> {
    Selector::parse(css).map_err(|e| ClientError::Scrape(format!("bad selector {}: {}", css, e)))
}

fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

fn child_elements<'a>(
    element: ElementRef<'a>,
    tag: &'a str,
) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    element
        .children()
        .filter_map(ElementRef::wrap)
        .filter(move |child| child.value().name() == tag)
}

fn input_value(document: &Html, name: &str) -> ClientResult<String> {
    let input = selector(&format!("input[name=\"{}\"]", name))?;
    document
        .select(&input)
        .next()
        .and_then(|element| element.value().attr("value"))
        .map(str::to_string)
        .ok_or_else(|| ClientError::Scrape(format!("login form has no {} input", name)))
}

/// Extract the hidden login form fields from the listing page
pub fn login_form(page: &str) -> ClientResult<LoginForm> {
    let document = Html::parse_document(page);
    Ok(LoginForm {
        authenticity_token: input_value(&document, "authenticity_token")?,
        commit: input_value(&document, "commit")?,
    })
}

/// Map a two-column table to lower-cased header → lower-cased cell text
///
/// Rows without both a `th` and a `td` are skipped.
pub fn table_to_map(table: ElementRef<'_>) -> ClientResult<BTreeMap<String, String>> {
    let row = selector("tr")?;
    let header = selector("th")?;
    let cell = selector("td")?;

    let mut map = BTreeMap::new();
    for tr in table.select(&row) {
        let (Some(th), Some(td)) = (tr.select(&header).next(), tr.select(&cell).next()) else {
            continue;
        };
        map.insert(text_of(th).to_lowercase(), text_of(td).to_lowercase());
    }
    Ok(map)
}

fn card_record(card: ElementRef<'_>, base_url: &Url) -> ClientResult<Option<ProjectRecord>> {
    // Link: first div of the card's inner div; table: directly under the inner div
    let link = child_elements(card, "div").find_map(|inner| {
        child_elements(inner, "div")
            .next()
            .and_then(|first| child_elements(first, "a").next())
    });
    let table = child_elements(card, "div").find_map(|inner| child_elements(inner, "table").next());

    let (Some(link), Some(table)) = (link, table) else {
        return Ok(None);
    };
    let Some(href) = link.value().attr("href") else {
        return Ok(None);
    };

    let name = text_of(link);
    let url = base_url.join(href)?.to_string();

    let mut fields = table_to_map(table)?;
    fields.insert("name".to_string(), name.clone());
    fields.insert("url".to_string(), url.clone());

    Ok(Some(ProjectRecord { name, url, fields }))
}

/// Parse every project card of the listing page
pub fn project_records(page: &str, base_url: &Url) -> ClientResult<Vec<ProjectRecord>> {
    let document = Html::parse_document(page);
    let cards = selector(PROJECT_CARD)?;

    let mut records = Vec::new();
    for card in document.select(&cards) {
        match card_record(card, base_url)? {
            Some(record) => records.push(record),
            None => tracing::warn!("Skipping project card without link or table"),
        }
    }
    Ok(records)
}

/// Read the JSON state embedded in a project page
pub fn repository_state(page: &str) -> ClientResult<ProjectState> {
    let document = Html::parse_document(page);
    let root = selector(STATE_ROOT)?;

    let raw = document
        .select(&root)
        .next()
        .and_then(|element| element.value().attr(STATE_ATTRIBUTE))
        .ok_or_else(|| {
            ClientError::Scrape(format!("no {} on {}", STATE_ATTRIBUTE, STATE_ROOT))
        })?;

    Ok(serde_json::from_str(raw)?)
}
