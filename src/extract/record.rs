//! Structured record extracted from one item page

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Structured record for one fetched item
///
/// Every optional field is absent when the page does not carry it; absence is
/// never encoded as zero or an empty string. `id` and `source_url` are always
/// the canonical item URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedRecord {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vote_count: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub director: Option<String>,

    /// Leading cast members, at most five
    #[serde(default)]
    pub cast: Vec<String>,

    /// Genres in page order, without duplicates
    #[serde(default)]
    pub genres: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster_url: Option<String>,

    pub source_url: String,

    pub fetched_at: DateTime<Utc>,
}

impl ExtractedRecord {
    /// Creates a record with only its identity set
    pub fn new(source_url: impl Into<String>, fetched_at: DateTime<Utc>) -> Self {
        let source_url = source_url.into();
        Self {
            id: source_url.clone(),
            title: None,
            year: None,
            rating: None,
            vote_count: None,
            director: None,
            cast: Vec::new(),
            genres: Vec::new(),
            release_date: None,
            runtime: None,
            summary: None,
            poster_url: None,
            source_url,
            fetched_at,
        }
    }

    /// One-line description used in previews and logs
    pub fn headline(&self) -> String {
        let rating = self
            .rating
            .map(|r| format!("{:.1}", r))
            .unwrap_or_else(|| "N/A".to_string());
        format!(
            "{} ({}) - {}",
            self.title.as_deref().unwrap_or("N/A"),
            self.year.as_deref().unwrap_or("N/A"),
            rating
        )
    }
}
