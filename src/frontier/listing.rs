//! Paginated listing enumerator
//!
//! Listing pages are plain HTML. Items are discovered by scanning every anchor
//! whose target path contains the item pattern.

use crate::crawler::{FetchResult, Fetcher};
use crate::frontier::{Cursor, Enumerator, FrontierError, FrontierPage, ItemReference};
use crate::url::{canonical_item_url, is_item_url};
use async_trait::async_trait;
use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Enumerates a listing served at `page_url?start=<offset>&filter=`
#[derive(Debug, Clone)]
pub struct ListingEnumerator {
    page_url: Url,
    page_size: u32,
    max_offset: u32,
    item_pattern: String,
}

impl ListingEnumerator {
    pub fn new(page_url: Url, page_size: u32, max_offset: u32, item_pattern: String) -> Self {
        Self {
            page_url,
            page_size,
            max_offset,
            item_pattern,
        }
    }

    /// URL of the listing page at `cursor`
    pub fn page_url_at(&self, cursor: Cursor) -> Url {
        let mut url = self.page_url.clone();
        url.query_pairs_mut()
            .clear()
            .append_pair("start", &cursor.offset().to_string())
            .append_pair("filter", "");
        url
    }

    async fn fetch_items(
        &self,
        fetcher: &dyn Fetcher,
        cursor: Cursor,
    ) -> Result<Vec<ItemReference>, FrontierError> {
        let url = self.page_url_at(cursor);

        match fetcher.fetch(url.as_str()).await {
            FetchResult::Success {
                final_url, body, ..
            } => {
                let base = Url::parse(&final_url).unwrap_or(url);
                let html = String::from_utf8_lossy(&body);
                Ok(parse_listing(&html, &base, &self.item_pattern))
            }
            FetchResult::Failure { kind, detail } => Err(FrontierError::Transport {
                url: url.to_string(),
                detail: format!("{}: {}", kind, detail),
            }),
        }
    }
}

#[async_trait]
impl Enumerator for ListingEnumerator {
    async fn next_page(&self, fetcher: &dyn Fetcher, cursor: Cursor) -> FrontierPage {
        if cursor.offset() >= self.max_offset {
            tracing::info!(
                "Listing {} reached its ceiling at {}",
                self.page_url.path(),
                cursor
            );
            return FrontierPage::exhausted(cursor);
        }

        match self.fetch_items(fetcher, cursor).await {
            Ok(items) if items.is_empty() => {
                tracing::info!(
                    "Listing {} has no items at {}, stopping",
                    self.page_url.path(),
                    cursor
                );
                FrontierPage::exhausted(cursor)
            }
            Ok(items) => {
                tracing::debug!(
                    "Listing {} yielded {} items at {}",
                    self.page_url.path(),
                    items.len(),
                    cursor
                );
                FrontierPage::with_items(items, cursor.advance(self.page_size))
            }
            Err(e) => {
                tracing::warn!("{}; treating listing as exhausted", e);
                FrontierPage::exhausted(cursor)
            }
        }
    }
}

/// Extracts item references from a listing page
///
/// # Rules
///
/// - Only `<a href>` whose resolved path contains `item_pattern` count
/// - The display title is the anchor's text, whitespace-collapsed
/// - Anchors with an empty or single-character title are dropped (poster and
///   icon links reuse the item URL)
/// - The first remaining anchor per id wins; later duplicates are dropped
///
/// # Example
///
/// ```
/// use reel_crawl::frontier::parse_listing;
/// use url::Url;
///
/// let html = r#"<a href="/subject/1/"><img src="p.jpg"></a><a href="/subject/1/">Heat</a>"#;
/// let base = Url::parse("https://movie.example.com/top250").unwrap();
/// let items = parse_listing(html, &base, "/subject/");
/// assert_eq!(items.len(), 1);
/// assert_eq!(items[0].display_title, "Heat");
/// ```
pub fn parse_listing(html: &str, base: &Url, item_pattern: &str) -> Vec<ItemReference> {
    let document = Html::parse_document(html);
    let selector = match Selector::parse("a[href]") {
        Ok(selector) => selector,
        Err(_) => return Vec::new(),
    };

    let mut seen = HashSet::new();
    let mut items = Vec::new();

    for anchor in document.select(&selector) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };

        let url = match canonical_item_url(href, base) {
            Ok(url) => url,
            Err(e) => {
                tracing::trace!("Skipping href {}: {}", href, e);
                continue;
            }
        };

        if !is_item_url(&url, item_pattern) {
            continue;
        }

        let title = collapse_whitespace(anchor.text());
        if title.chars().count() <= 1 {
            continue;
        }

        let id = url.to_string();
        if seen.insert(id.clone()) {
            items.push(ItemReference::new(id, title));
        }
    }

    items
}

/// Joins text fragments, collapsing runs of whitespace into single spaces
pub(crate) fn collapse_whitespace<'a>(fragments: impl Iterator<Item = &'a str>) -> String {
    fragments
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn base() -> Url {
        Url::parse("https://movie.example.com/top250?start=0&filter=").unwrap()
    }

    #[test]
    fn test_extracts_item_anchors_in_order() {
        let html = r#"
            <html><body>
                <a href="https://movie.example.com/subject/1/">The Shawshank Redemption</a>
                <a href="/subject/2/">Farewell My Concubine</a>
                <a href="/celebrity/9/">Some Actor</a>
                <a href="/top250?start=25">Next</a>
            </body></html>
        "#;
        let items = parse_listing(html, &base(), "/subject/");
        assert_eq!(
            items,
            vec![
                ItemReference::new(
                    "https://movie.example.com/subject/1/",
                    "The Shawshank Redemption"
                ),
                ItemReference::new("https://movie.example.com/subject/2/", "Farewell My Concubine"),
            ]
        );
    }

    #[test]
    fn test_first_occurrence_wins() {
        let html = r#"
            <a href="/subject/1/">First title</a>
            <a href="/subject/1/">Second title</a>
        "#;
        let items = parse_listing(html, &base(), "/subject/");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].display_title, "First title");
    }

    #[test]
    fn test_decorative_links_are_dropped() {
        let html = r#"
            <a href="/subject/1/"><img src="poster.jpg" alt="poster"></a>
            <a href="/subject/2/">★</a>
            <a href="/subject/1/">
                <span class="title">肖申克的救赎</span>
                <span class="other">&nbsp;/&nbsp;The Shawshank Redemption</span>
            </a>
        "#;
        let items = parse_listing(html, &base(), "/subject/");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, "https://movie.example.com/subject/1/");
        assert_eq!(
            items[0].display_title,
            "肖申克的救赎 / The Shawshank Redemption"
        );
    }

    #[test]
    fn test_two_character_title_is_kept() {
        let html = r#"<a href="/subject/3/">活着</a>"#;
        let items = parse_listing(html, &base(), "/subject/");
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn test_fragment_variants_share_an_id() {
        let html = r#"
            <a href="/subject/1/">Heat</a>
            <a href="/subject/1/#comments">Heat reviews</a>
        "#;
        let items = parse_listing(html, &base(), "/subject/");
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn test_empty_document() {
        assert!(parse_listing("", &base(), "/subject/").is_empty());
    }

    #[test]
    fn test_page_url_at() {
        let enumerator = ListingEnumerator::new(
            Url::parse("https://movie.example.com/top250").unwrap(),
            25,
            250,
            "/subject/".to_string(),
        );
        assert_eq!(
            enumerator.page_url_at(Cursor::at(50)).as_str(),
            "https://movie.example.com/top250?start=50&filter="
        );
    }

    /// Serves canned listing pages keyed by their `start` offset
    struct CannedListing {
        pages: Vec<(u32, FetchResult)>,
        requested: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Fetcher for CannedListing {
        async fn fetch(&self, url: &str) -> FetchResult {
            self.requested.lock().unwrap().push(url.to_string());
            let parsed = Url::parse(url).unwrap();
            let start: u32 = parsed
                .query_pairs()
                .find(|(k, _)| k == "start")
                .map(|(_, v)| v.parse().unwrap())
                .unwrap();
            self.pages
                .iter()
                .find(|(offset, _)| *offset == start)
                .map(|(_, result)| result.clone())
                .unwrap_or_else(|| {
                    FetchResult::failure(crate::crawler::FailureKind::HttpStatus(404), "none")
                })
        }
    }

    fn page(ids: &[u32]) -> FetchResult {
        let body: String = ids
            .iter()
            .map(|id| format!(r#"<a href="/subject/{}/">Movie {}</a>"#, id, id))
            .collect();
        FetchResult::Success {
            final_url: "https://movie.example.com/top250".to_string(),
            status_code: 200,
            body: body.into_bytes(),
        }
    }

    fn enumerator(max_offset: u32) -> ListingEnumerator {
        ListingEnumerator::new(
            Url::parse("https://movie.example.com/top250").unwrap(),
            2,
            max_offset,
            "/subject/".to_string(),
        )
    }

    #[tokio::test]
    async fn test_failure_on_third_page_halts_source() {
        let fetcher = CannedListing {
            pages: vec![
                (0, page(&[1, 2])),
                (2, page(&[3, 4])),
                (
                    4,
                    FetchResult::failure(crate::crawler::FailureKind::Timeout, "slow"),
                ),
                (6, page(&[7, 8])),
            ],
            requested: Mutex::new(Vec::new()),
        };
        let enumerator = enumerator(100);

        let mut cursor = Cursor::start();
        let mut ids = Vec::new();
        loop {
            let page = enumerator.next_page(&fetcher, cursor).await;
            if page.exhausted {
                break;
            }
            ids.extend(page.items.into_iter().map(|i| i.id));
            cursor = page.next_cursor;
        }

        assert_eq!(ids.len(), 4);
        assert!(ids[3].ends_with("/subject/4/"));
        assert_eq!(fetcher.requested.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_ceiling_stops_without_request() {
        let fetcher = CannedListing {
            pages: vec![(0, page(&[1, 2])), (2, page(&[3, 4]))],
            requested: Mutex::new(Vec::new()),
        };
        let enumerator = enumerator(2);

        let first = enumerator.next_page(&fetcher, Cursor::start()).await;
        assert!(!first.exhausted);
        assert_eq!(first.next_cursor, Cursor::at(2));

        let second = enumerator.next_page(&fetcher, first.next_cursor).await;
        assert!(second.exhausted);
        assert!(second.items.is_empty());
        assert_eq!(fetcher.requested.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_page_without_items_exhausts() {
        let fetcher = CannedListing {
            pages: vec![(0, page(&[]))],
            requested: Mutex::new(Vec::new()),
        };
        let page = enumerator(100).next_page(&fetcher, Cursor::start()).await;
        assert!(page.exhausted);
    }
}
