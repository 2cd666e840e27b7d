use crate::UrlError;
use url::Url;

/// Tracking query parameters dropped from item identities
const TRACKING_PARAMS: &[&str] = &["fbclid", "gclid", "mc_eid", "ref", "source", "from"];

/// Turns an href found on a page into the canonical id of the item it points to
///
/// # Canonicalization Steps
///
/// 1. Resolve the href against the page it was found on (relative links allowed)
/// 2. Reject anything that is not http or https, or has no host
/// 3. Lowercase the host (done by the URL parser)
/// 4. Remove the fragment
/// 5. Remove tracking query parameters, keeping the order of the others
/// 6. Remove an empty query string
///
/// The path is kept verbatim, trailing slash included, so that ids recorded by
/// earlier runs keep matching.
///
/// # Examples
///
/// ```
/// use reel_crawl::url::canonical_item_url;
/// use url::Url;
///
/// let base = Url::parse("https://movie.example.com/top250?start=0").unwrap();
/// let id = canonical_item_url("/subject/42/?from=showing#comments", &base).unwrap();
/// assert_eq!(id.as_str(), "https://movie.example.com/subject/42/");
/// ```
pub fn canonical_item_url(href: &str, base: &Url) -> Result<Url, UrlError> {
    let href = href.trim();
    let mut url = base
        .join(href)
        .map_err(|e| UrlError::Parse(format!("{}: {}", href, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().is_none() {
        return Err(UrlError::MissingDomain);
    }

    url.set_fragment(None);

    if url.query().is_some() {
        let kept: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(key, _)| !is_tracking_param(key))
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        if kept.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut().clear().extend_pairs(kept);
        }
    }

    Ok(url)
}

/// Returns true when the URL's path marks it as an item page
pub fn is_item_url(url: &Url, item_pattern: &str) -> bool {
    url.path().contains(item_pattern)
}

/// Checks if a query parameter is a tracking parameter
fn is_tracking_param(key: &str) -> bool {
    TRACKING_PARAMS.contains(&key) || key.starts_with("utm_")
}
