//! Frontier enumerators
//!
//! An enumerator walks one source page by page and hands out references to the
//! item pages it finds there. Both strategies share the same cursor and
//! exhaustion contract so the coordinator's driving loop does not care which
//! one it is talking to:
//!
//! - [`ListingEnumerator`]: paginated HTML listing, items found by scanning anchors
//! - [`TagQueryEnumerator`]: JSON tag-search endpoint
//!
//! Enumerators hold no mutable state; the cursor is owned by the caller.

mod listing;
mod tag_query;

pub use listing::{parse_listing, ListingEnumerator};
pub use tag_query::{SearchResponse, SearchSubject, TagQueryEnumerator};

use crate::config::SiteConfig;
use crate::crawler::Fetcher;
use crate::UrlError;
use async_trait::async_trait;
use serde::Deserialize;
use std::fmt;
use thiserror::Error;

/// A candidate item discovered by an enumerator, not yet fetched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemReference {
    /// Canonical URL of the item page
    pub id: String,

    /// Title as displayed on the listing or search result
    pub display_title: String,
}

impl ItemReference {
    pub fn new(id: impl Into<String>, display_title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_title: display_title.into(),
        }
    }
}

/// Pagination state of one source: an item offset
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Cursor(u32);

impl Cursor {
    /// Cursor at the start of a source
    pub fn start() -> Self {
        Self(0)
    }

    pub fn at(offset: u32) -> Self {
        Self(offset)
    }

    pub fn offset(&self) -> u32 {
        self.0
    }

    /// Moves forward by one page
    pub fn advance(&self, step: u32) -> Self {
        Self(self.0.saturating_add(step))
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "offset {}", self.0)
    }
}

/// One page of enumeration output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontierPage {
    /// References on this page, in page order
    pub items: Vec<ItemReference>,

    /// Cursor of the following page
    pub next_cursor: Cursor,

    /// True when the source has nothing more to give; `items` is then empty
    pub exhausted: bool,
}

impl FrontierPage {
    /// A page that ends the source
    pub fn exhausted(cursor: Cursor) -> Self {
        Self {
            items: Vec::new(),
            next_cursor: cursor,
            exhausted: true,
        }
    }

    /// A page with items; more pages may follow
    pub fn with_items(items: Vec<ItemReference>, next_cursor: Cursor) -> Self {
        Self {
            items,
            next_cursor,
            exhausted: false,
        }
    }
}

fn default_listing_page_size() -> u32 {
    25
}

fn default_listing_max_offset() -> u32 {
    250
}

fn default_tag_page_size() -> u32 {
    20
}

/// Where to enumerate items from
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum SourceDescriptor {
    /// Paginated HTML listing at `base_path`, `?start=<offset>`
    #[serde(rename_all = "kebab-case")]
    Listing {
        base_path: String,
        #[serde(default = "default_listing_page_size")]
        page_size: u32,
        /// Hard ceiling on the offset
        #[serde(default = "default_listing_max_offset")]
        max_offset: u32,
    },

    /// Tag search endpoint returning `{ "subjects": [...] }`
    #[serde(rename_all = "kebab-case")]
    TagQuery {
        tag_name: String,
        #[serde(default = "default_tag_page_size")]
        page_size: u32,
        /// Pages requested before giving up on the tag; unbounded when absent
        #[serde(default)]
        max_pages: Option<u32>,
    },
}

impl SourceDescriptor {
    /// Caps the number of pages requested from this source
    pub fn with_max_pages(self, pages: u32) -> Self {
        match self {
            Self::Listing {
                base_path,
                page_size,
                max_offset,
            } => Self::Listing {
                max_offset: max_offset.min(pages.saturating_mul(page_size)),
                base_path,
                page_size,
            },
            Self::TagQuery {
                tag_name,
                page_size,
                ..
            } => Self::TagQuery {
                tag_name,
                page_size,
                max_pages: Some(pages),
            },
        }
    }
}

impl fmt::Display for SourceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Listing { base_path, .. } => write!(f, "listing {}", base_path),
            Self::TagQuery { tag_name, .. } => write!(f, "tag '{}'", tag_name),
        }
    }
}

/// Why an enumeration page could not be produced
///
/// Never leaves the enumerator: it is logged and turned into exhaustion.
#[derive(Debug, Error)]
pub enum FrontierError {
    #[error("Failed to fetch {url}: {detail}")]
    Transport { url: String, detail: String },

    #[error("Failed to decode {url}: {detail}")]
    Decode { url: String, detail: String },
}

/// Strategy that discovers item references page by page
#[async_trait]
pub trait Enumerator: Send + Sync {
    /// Produces the page at `cursor`
    ///
    /// Transport and decode failures are reported as an exhausted page.
    async fn next_page(&self, fetcher: &dyn Fetcher, cursor: Cursor) -> FrontierPage;
}

/// Builds the enumerator matching a source descriptor
pub fn enumerator_for(
    source: &SourceDescriptor,
    site: &SiteConfig,
) -> Result<Box<dyn Enumerator>, UrlError> {
    let enumerator: Box<dyn Enumerator> = match source {
        SourceDescriptor::Listing {
            base_path,
            page_size,
            max_offset,
        } => Box::new(ListingEnumerator::new(
            crate::url::site_url(&site.base_url, base_path)?,
            *page_size,
            *max_offset,
            site.item_pattern.clone(),
        )),
        SourceDescriptor::TagQuery {
            tag_name,
            page_size,
            max_pages,
        } => Box::new(TagQueryEnumerator::new(
            crate::url::site_url(&site.base_url, &site.search_path)?,
            tag_name.clone(),
            *page_size,
            *max_pages,
        )),
    };
    Ok(enumerator)
}
