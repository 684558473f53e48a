// src/pipeline/crawl.rs

//! Listing crawl: walk every page of the recent-arrivals listing.

use std::collections::HashSet;
use std::time::Duration;

use crate::error::Result;
use crate::models::BookSummary;
use crate::services::ListParser;
use crate::utils::http::PageFetcher;

/// Walk the listing from `start_url` until a page has no next link.
///
/// Summaries are returned in listing order. Requests are paced by `delay`
/// (none before the first page or after the last). Any page failure aborts
/// the whole crawl: a partial listing is never returned.
pub async fn crawl_listing(
    fetcher: &dyn PageFetcher,
    parser: &ListParser,
    start_url: &str,
    delay: Duration,
) -> Result<Vec<BookSummary>> {
    let mut books = Vec::new();
    let mut visited = HashSet::new();
    let mut next = Some(start_url.to_string());
    let mut page = 1;

    while let Some(url) = next.take() {
        if !visited.insert(url.clone()) {
            log::warn!("Next-page link loops back to {}; stopping", url);
            break;
        }
        if page > 1 && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        log::info!("Fetching listing page {}: {}", page, url);
        let html = fetcher.fetch(&url).await?;

        let listing = parser.parse_list_page(&html);
        log::info!("    {} books on page {}", listing.books.len(), page);
        books.extend(listing.books);

        next = listing.next_url;
        page += 1;
    }

    log::info!("Listing crawl found {} books", books.len());
    Ok(books)
}

#[cfg(test)]
mod tests {
    use tokio::time::Instant;

    use super::*;
    use crate::error::AppError;
    use crate::models::SiteConfig;
    use crate::utils::http::stub::StubFetcher;

    const START: &str = "https://www.tenlong.com.tw/zh_tw/recent";

    fn listing(ids: &[u32], next: Option<&str>) -> String {
        let entries: String = ids
            .iter()
            .map(|id| {
                format!(
                    r#"<li class="single-book"><strong class="title">
                       <a href="/products/{id}" title="Book {id}">Book {id}</a></strong></li>"#
                )
            })
            .collect();
        let next = next
            .map(|href| format!(r#"<a class="next_page" href="{href}">Next</a>"#))
            .unwrap_or_default();
        format!("<ul>{entries}</ul>{next}")
    }

    fn parser() -> ListParser {
        ListParser::new(&SiteConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn test_order_preserved_across_pages() {
        let fetcher = StubFetcher::new()
            .page(START, listing(&[3, 1], Some("/tw/recent?page=2")))
            .page(
                "https://www.tenlong.com.tw/zh_tw/recent?page=2",
                listing(&[2, 5], None),
            );

        let books = crawl_listing(&fetcher, &parser(), START, Duration::ZERO)
            .await
            .unwrap();
        let titles: Vec<_> = books.iter().map(|b| b.title.as_str()).collect();
        assert_eq!(titles, vec!["Book 3", "Book 1", "Book 2", "Book 5"]);
        assert_eq!(fetcher.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_page_without_next_link_ends_crawl() {
        let fetcher = StubFetcher::new().page(START, listing(&[1], None));

        let books = crawl_listing(&fetcher, &parser(), START, Duration::ZERO)
            .await
            .unwrap();
        assert_eq!(books.len(), 1);
        assert_eq!(fetcher.requests(), vec![START.to_string()]);
    }

    #[tokio::test]
    async fn test_failed_page_aborts_crawl() {
        let page2 = "https://www.tenlong.com.tw/zh_tw/recent?page=2";
        let fetcher = StubFetcher::new()
            .page(START, listing(&[1], Some("/zh_tw/recent?page=2")))
            .status(page2, 500);

        let result = crawl_listing(&fetcher, &parser(), START, Duration::ZERO).await;
        match result {
            Err(AppError::HttpStatus { url, status }) => {
                assert_eq!(url, page2);
                assert_eq!(status, 500);
            }
            other => panic!("expected HttpStatus, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_self_referencing_next_link_stops() {
        let fetcher = StubFetcher::new().page(START, listing(&[1], Some("/zh_tw/recent")));

        let books = crawl_listing(&fetcher, &parser(), START, Duration::ZERO)
            .await
            .unwrap();
        assert_eq!(books.len(), 1);
        assert_eq!(fetcher.requests().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_only_between_pages() {
        let fetcher = StubFetcher::new()
            .page(START, listing(&[1], Some("/zh_tw/recent?page=2")))
            .page(
                "https://www.tenlong.com.tw/zh_tw/recent?page=2",
                listing(&[2], Some("/zh_tw/recent?page=3")),
            )
            .page(
                "https://www.tenlong.com.tw/zh_tw/recent?page=3",
                listing(&[3], None),
            );

        let started = Instant::now();
        let books = crawl_listing(&fetcher, &parser(), START, Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(books.len(), 3);
        assert_eq!(started.elapsed(), Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_page_is_not_delayed() {
        let fetcher = StubFetcher::new().page(START, listing(&[1], None));

        let started = Instant::now();
        crawl_listing(&fetcher, &parser(), START, Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(started.elapsed(), Duration::ZERO);
    }
}
