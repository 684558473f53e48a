// src/services/listing.rs

//! Recent-arrivals listing page parser.
//!
//! Extracts book summaries and the next-page link from one listing page.

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::error::Result;
use crate::models::{BookSummary, SiteConfig};
use crate::services::parse_selector;
use crate::utils::{canonical_listing_url, resolve_url};

/// One parsed listing page.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ListingPage {
    pub books: Vec<BookSummary>,
    pub next_url: Option<String>,
}

/// Parser for the recent-arrivals listing markup.
pub struct ListParser {
    base_url: Url,
    listing_path: String,
    listing_path_aliases: Vec<String>,
    entry: Selector,
    title_link: Selector,
    cover_image: Selector,
    discount: Selector,
    pricing: Selector,
    struck_price: Selector,
    next_page: Selector,
    price_pattern: Regex,
}

impl ListParser {
    pub fn new(site: &SiteConfig) -> Result<Self> {
        Ok(Self {
            base_url: Url::parse(&site.base_url)?,
            listing_path: site.listing_path.clone(),
            listing_path_aliases: site.listing_path_aliases.clone(),
            entry: parse_selector("li.single-book")?,
            title_link: parse_selector("strong.title > a")?,
            cover_image: parse_selector("a.cover > img")?,
            discount: parse_selector("a.cover > span.label-blue")?,
            pricing: parse_selector("div.pricing")?,
            struck_price: parse_selector("del")?,
            next_page: parse_selector("a.next_page")?,
            // A digit run with embedded thousand separators.
            price_pattern: Regex::new(r"\d(?:[\d,]*\d)?")?,
        })
    }

    /// Parse one listing page into ordered summaries and the next-page URL.
    pub fn parse_list_page(&self, html: &str) -> ListingPage {
        let document = Html::parse_document(html);

        let books = document
            .select(&self.entry)
            .filter_map(|entry| self.parse_entry(&entry))
            .collect();

        let next_url = document
            .select(&self.next_page)
            .next()
            .and_then(|a| a.value().attr("href"))
            .map(str::trim)
            .filter(|href| !href.is_empty())
            .and_then(|href| {
                canonical_listing_url(
                    &self.base_url,
                    href,
                    &self.listing_path,
                    &self.listing_path_aliases,
                )
            });

        ListingPage { books, next_url }
    }

    /// Extract the first digit group (with thousand separators) from `text`.
    pub fn parse_price(&self, text: &str) -> String {
        self.price_pattern
            .find(text)
            .map(|m| m.as_str().to_string())
            .unwrap_or_default()
    }

    fn parse_entry(&self, entry: &ElementRef) -> Option<BookSummary> {
        let anchor = entry.select(&self.title_link).next()?;
        let href = anchor.value().attr("href").map(str::trim).unwrap_or("");
        if href.is_empty() {
            log::debug!("Skipping listing entry without link");
            return None;
        }

        let title = anchor
            .value()
            .attr("title")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| collapse_text(&anchor));
        if title.is_empty() {
            log::debug!("Skipping listing entry without title: {}", href);
            return None;
        }

        let image = entry
            .select(&self.cover_image)
            .next()
            .and_then(|img| img.value().attr("src"))
            .unwrap_or("")
            .to_string();

        let discount = entry
            .select(&self.discount)
            .next()
            .map(|span| collapse_text(&span))
            .unwrap_or_default();

        let (original_price, sale_price) = entry
            .select(&self.pricing)
            .next()
            .map(|pricing| self.parse_pricing(&pricing))
            .unwrap_or_default();

        Some(BookSummary {
            title,
            url: resolve_url(&self.base_url, href),
            image,
            original_price,
            sale_price,
            discount,
        })
    }

    /// Returns `(original_price, sale_price)`.
    fn parse_pricing(&self, pricing: &ElementRef) -> (String, String) {
        let mut remaining = collapse_text(pricing);
        let mut original_price = String::new();

        if let Some(struck) = pricing.select(&self.struck_price).next() {
            let struck_text = collapse_text(&struck);
            original_price = self.parse_price(&struck_text);
            if !struck_text.is_empty() {
                remaining = remaining.replace(&struck_text, "");
            }
        }

        (original_price, self.parse_price(&remaining))
    }
}

/// Concatenate the element's trimmed, non-empty text nodes.
fn collapse_text(element: &ElementRef) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> ListParser {
        ListParser::new(&SiteConfig::default()).unwrap()
    }

    fn entry(href: &str, title: &str, pricing: &str) -> String {
        format!(
            r#"<li class="single-book">
                <a class="cover" href="{href}">
                    <img src="https://cdn.example.com{href}.jpg">
                    <span class="label-blue">79折</span>
                </a>
                <strong class="title"><a href="{href}" title="{title}">{title}</a></strong>
                <div class="pricing">{pricing}</div>
            </li>"#
        )
    }

    fn page(entries: &[String], next: Option<&str>) -> String {
        let next = next
            .map(|href| format!(r#"<a class="next_page" href="{href}">下一頁</a>"#))
            .unwrap_or_default();
        format!(
            "<html><body><ul>{}</ul><div class=\"pagination\">{next}</div></body></html>",
            entries.join("\n")
        )
    }

    #[test]
    fn test_parse_price() {
        let parser = parser();
        assert_eq!(parser.parse_price("NT$1,200"), "1,200");
        assert_eq!(parser.parse_price("特價 NT$980 元"), "980");
        assert_eq!(parser.parse_price("售完"), "");
        assert_eq!(parser.parse_price("原價, NT$ 450"), "450");
    }

    #[test]
    fn test_struck_price_is_original_and_rest_is_sale() {
        let html = page(
            &[entry(
                "/products/9786263335998",
                "Rust 實戰",
                "原價 <del>NT$1,200</del> 特價 NT$980",
            )],
            None,
        );
        let listing = parser().parse_list_page(&html);
        assert_eq!(listing.books.len(), 1);
        let book = &listing.books[0];
        assert_eq!(book.original_price, "1,200");
        assert_eq!(book.sale_price, "980");
        assert_eq!(book.discount, "79折");
        assert_eq!(
            book.url,
            "https://www.tenlong.com.tw/products/9786263335998"
        );
        assert_eq!(
            book.image,
            "https://cdn.example.com/products/9786263335998.jpg"
        );
    }

    #[test]
    fn test_price_without_struck_segment() {
        let html = page(&[entry("/products/1", "A", "NT$ 560")], None);
        let book = &parser().parse_list_page(&html).books[0];
        assert_eq!(book.original_price, "");
        assert_eq!(book.sale_price, "560");
    }

    #[test]
    fn test_entry_without_anchor_is_skipped() {
        let broken = r#"<li class="single-book"><strong class="title">No link</strong></li>"#;
        let html = page(
            &[
                entry("/products/1", "First", "NT$100"),
                broken.to_string(),
                entry("/products/2", "Second", "NT$200"),
            ],
            None,
        );
        let listing = parser().parse_list_page(&html);
        let titles: Vec<_> = listing.books.iter().map(|b| b.title.as_str()).collect();
        assert_eq!(titles, vec!["First", "Second"]);
    }

    #[test]
    fn test_title_falls_back_to_anchor_text() {
        let html = r#"<li class="single-book">
            <strong class="title"><a href="/products/7">  Text Title  </a></strong>
        </li>"#;
        let listing = parser().parse_list_page(html);
        assert_eq!(listing.books[0].title, "Text Title");
        assert_eq!(listing.books[0].image, "");
        assert_eq!(listing.books[0].sale_price, "");
    }

    #[test]
    fn test_next_link_alias_is_canonicalized() {
        let html = page(
            &[entry("/products/1", "A", "NT$100")],
            Some("/tw/recent?page=2"),
        );
        let listing = parser().parse_list_page(&html);
        assert_eq!(
            listing.next_url.as_deref(),
            Some("https://www.tenlong.com.tw/zh_tw/recent?page=2")
        );
    }

    #[test]
    fn test_missing_next_link_ends_listing() {
        let html = page(&[entry("/products/1", "A", "NT$100")], None);
        assert_eq!(parser().parse_list_page(&html).next_url, None);
    }
}
