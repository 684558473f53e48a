// src/services/detail.rs

//! Book detail page parser.
//!
//! Field sources, in priority order:
//! - author, publisher, publication date: the JSON-LD block
//! - description: the `og:description` preview, cut at the site delimiter
//! - categories: `keywords` meta plus visible `/categories/` links
//!
//! Parsing never fails. A malformed JSON-LD block only leaves the fields it
//! would have supplied unset.

use std::collections::BTreeSet;

use scraper::{Html, Selector};
use serde_json::Value;

use crate::error::{AppError, Result};
use crate::models::{BookDetail, SiteConfig};
use crate::services::parse_selector;

/// Outcome of decoding the embedded structured-metadata block.
#[derive(Debug, Clone, PartialEq)]
pub enum StructuredData {
    /// Present and decoded to a JSON object
    Valid(serde_json::Map<String, Value>),
    /// Present but not a decodable JSON object
    Invalid(String),
    /// No block on the page
    Absent,
}

impl StructuredData {
    /// Decode the raw contents of a JSON-LD script element.
    pub fn decode(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return Self::Absent;
        };
        match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(map)) => Self::Valid(map),
            Ok(other) => Self::Invalid(format!("expected object, found {}", json_kind(&other))),
            Err(e) => Self::Invalid(AppError::parse(e).to_string()),
        }
    }
}

/// Parser for a single book's detail page.
pub struct DetailParser {
    description_delimiter: char,
    structured_data: Selector,
    og_description: Selector,
    keywords: Selector,
    category_links: Selector,
}

impl DetailParser {
    pub fn new(site: &SiteConfig) -> Result<Self> {
        Ok(Self {
            description_delimiter: site.description_delimiter,
            structured_data: parse_selector("script[type='application/ld+json']")?,
            og_description: parse_selector("meta[property='og:description']")?,
            keywords: parse_selector("meta[name='keywords']")?,
            category_links: parse_selector("a[href^='/categories/']")?,
        })
    }

    /// Extract whatever detail fields the page offers.
    pub fn parse_detail_page(&self, html: &str) -> BookDetail {
        let document = Html::parse_document(html);
        let mut detail = BookDetail::default();

        let raw_ld: Option<String> = document
            .select(&self.structured_data)
            .next()
            .map(|script| script.text().collect());
        match StructuredData::decode(raw_ld.as_deref()) {
            StructuredData::Valid(ld) => apply_structured_data(&mut detail, &ld),
            StructuredData::Invalid(reason) => {
                log::debug!("Ignoring malformed structured data: {}", reason);
            }
            StructuredData::Absent => {}
        }

        if let Some(content) = document
            .select(&self.og_description)
            .next()
            .and_then(|meta| meta.value().attr("content"))
        {
            detail.description = Some(self.clean_description(content));
        }

        detail.categories = Some(self.collect_categories(&document));
        detail
    }

    /// Cut the description at the first delimiter, dropping the site suffix.
    fn clean_description(&self, content: &str) -> String {
        match content.split_once(self.description_delimiter) {
            Some((head, _)) => head.trim().to_string(),
            None => content.to_string(),
        }
    }

    fn collect_categories(&self, document: &Html) -> Vec<String> {
        let mut categories = BTreeSet::new();

        if let Some(content) = document
            .select(&self.keywords)
            .next()
            .and_then(|meta| meta.value().attr("content"))
        {
            categories.extend(
                content
                    .split(',')
                    .map(str::trim)
                    .filter(|kw| !kw.is_empty())
                    .map(str::to_string),
            );
        }

        for link in document.select(&self.category_links) {
            let text: String = link.text().collect::<String>().trim().to_string();
            if !text.is_empty() {
                categories.insert(text);
            }
        }

        categories.into_iter().collect()
    }
}

fn apply_structured_data(detail: &mut BookDetail, ld: &serde_json::Map<String, Value>) {
    match ld.get("author") {
        Some(Value::Array(authors)) => {
            let names: Vec<&str> = authors
                .iter()
                .filter_map(Value::as_object)
                .map(|a| a.get("name").and_then(Value::as_str).unwrap_or(""))
                .collect();
            detail.author = Some(names.join(", "));
        }
        Some(Value::Object(author)) => {
            detail.author = Some(object_name(author));
        }
        _ => {}
    }

    if let Some(Value::Object(publisher)) = ld.get("publisher") {
        detail.publisher = Some(object_name(publisher));
    }

    detail.date_published = Some(
        ld.get("datePublished")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string(),
    );
}

fn object_name(object: &serde_json::Map<String, Value>) -> String {
    object
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
