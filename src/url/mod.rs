//! URL handling module for Reel-Crawl
//!
//! Item identity is the canonical URL of the item page. This module resolves
//! hrefs found on listing pages into that canonical form and builds the request
//! URLs of listing and search pages.

mod normalize;

use crate::UrlError;
use url::Url;

pub use normalize::{canonical_item_url, is_item_url};

/// Joins a site-relative path onto the configured base URL
///
/// # Examples
///
/// ```
/// use reel_crawl::url::site_url;
///
/// let url = site_url("https://movie.example.com", "/top250").unwrap();
/// assert_eq!(url.as_str(), "https://movie.example.com/top250");
/// ```
pub fn site_url(base_url: &str, path: &str) -> Result<Url, UrlError> {
    let base = Url::parse(base_url).map_err(|e| UrlError::Parse(e.to_string()))?;
    base.join(path)
        .map_err(|e| UrlError::Parse(format!("{}: {}", path, e)))
}
