//! Tag-query enumerator
//!
//! The search endpoint answers
//! `GET <search_path>?type=movie&tag=<tag>&sort=recommend&page_limit=<n>&page_start=<offset>`
//! with `{ "subjects": [{ "url", "title", "rate", "cover" }, ...] }`.

use crate::crawler::{FetchResult, Fetcher};
use crate::frontier::{Cursor, Enumerator, FrontierError, FrontierPage, ItemReference};
use crate::url::canonical_item_url;
use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

/// Decoded search endpoint response
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub subjects: Vec<SearchSubject>,
}

/// One search hit
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchSubject {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub rate: String,
    #[serde(default)]
    pub cover: String,
}

/// Enumerates search results for a single tag
#[derive(Debug, Clone)]
pub struct TagQueryEnumerator {
    endpoint: Url,
    tag: String,
    page_size: u32,
    max_pages: Option<u32>,
}

impl TagQueryEnumerator {
    pub fn new(endpoint: Url, tag: String, page_size: u32, max_pages: Option<u32>) -> Self {
        Self {
            endpoint,
            tag,
            page_size,
            max_pages,
        }
    }

    /// URL of the search request at `cursor`
    pub fn query_url_at(&self, cursor: Cursor) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .clear()
            .append_pair("type", "movie")
            .append_pair("tag", &self.tag)
            .append_pair("sort", "recommend")
            .append_pair("page_limit", &self.page_size.to_string())
            .append_pair("page_start", &cursor.offset().to_string());
        url
    }

    fn past_ceiling(&self, cursor: Cursor) -> bool {
        self.max_pages
            .map(|pages| u64::from(cursor.offset()) >= u64::from(pages) * u64::from(self.page_size))
            .unwrap_or(false)
    }

    async fn fetch_response(
        &self,
        fetcher: &dyn Fetcher,
        cursor: Cursor,
    ) -> Result<SearchResponse, FrontierError> {
        let url = self.query_url_at(cursor);

        match fetcher.fetch(url.as_str()).await {
            FetchResult::Success { body, .. } => {
                serde_json::from_slice(&body).map_err(|e| FrontierError::Decode {
                    url: url.to_string(),
                    detail: e.to_string(),
                })
            }
            FetchResult::Failure { kind, detail } => Err(FrontierError::Transport {
                url: url.to_string(),
                detail: format!("{}: {}", kind, detail),
            }),
        }
    }

    fn to_references(&self, subjects: Vec<SearchSubject>) -> Vec<ItemReference> {
        subjects
            .into_iter()
            .filter_map(|subject| {
                if subject.url.trim().is_empty() {
                    return None;
                }
                match canonical_item_url(&subject.url, &self.endpoint) {
                    Ok(url) => Some(ItemReference::new(url, subject.title.trim())),
                    Err(e) => {
                        tracing::debug!("Skipping search hit {}: {}", subject.url, e);
                        None
                    }
                }
            })
            .collect()
    }
}

#[async_trait]
impl Enumerator for TagQueryEnumerator {
    async fn next_page(&self, fetcher: &dyn Fetcher, cursor: Cursor) -> FrontierPage {
        if self.past_ceiling(cursor) {
            tracing::info!("Tag '{}' reached its page limit at {}", self.tag, cursor);
            return FrontierPage::exhausted(cursor);
        }

        match self.fetch_response(fetcher, cursor).await {
            Ok(response) if response.subjects.is_empty() => {
                tracing::info!("Tag '{}' has no more results at {}", self.tag, cursor);
                FrontierPage::exhausted(cursor)
            }
            Ok(response) => {
                let items = self.to_references(response.subjects);
                tracing::debug!(
                    "Tag '{}' yielded {} items at {}",
                    self.tag,
                    items.len(),
                    cursor
                );
                FrontierPage::with_items(items, cursor.advance(self.page_size))
            }
            Err(e) => {
                tracing::warn!("{}; treating tag '{}' as exhausted", e, self.tag);
                FrontierPage::exhausted(cursor)
            }
        }
    }
}
