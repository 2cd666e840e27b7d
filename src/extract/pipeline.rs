//! Extraction pipeline
//!
//! Evaluates an ordered list of [`FieldRule`]s against a parsed item page. Each
//! rule is independent: a selector that matches nothing leaves its field
//! absent, and the pipeline always yields a record.

use crate::extract::rules::{default_rules, Capture, Field, FieldRule, Take};
use crate::extract::ExtractedRecord;
use crate::{ConfigError, ConfigResult};
use chrono::{DateTime, Utc};
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;

/// A rule with its selector parsed once up front
#[derive(Debug, Clone)]
struct CompiledRule {
    rule: FieldRule,
    selector: Selector,
}

impl CompiledRule {
    /// Captured and transformed values, blank ones dropped, in document order
    fn values(&self, document: &Html) -> Vec<String> {
        let limit = match self.rule.take {
            Take::First => Some(1),
            Take::All { limit } => limit,
        };

        let captured = document
            .select(&self.selector)
            .filter_map(|element| self.capture(element))
            .filter_map(|raw| self.rule.transform.apply(&raw));

        match limit {
            Some(limit) => captured.take(limit).collect(),
            None => captured.collect(),
        }
    }

    fn capture(&self, element: ElementRef<'_>) -> Option<String> {
        match &self.rule.capture {
            Capture::Text => Some(element.text().collect()),
            Capture::Attr(name) => element.value().attr(name).map(str::to_string),
        }
    }
}

/// Maps item pages to [`ExtractedRecord`]s
#[derive(Debug, Clone)]
pub struct ExtractionPipeline {
    rules: Vec<CompiledRule>,
}

impl ExtractionPipeline {
    /// Compiles a rule list
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if a selector does not parse.
    pub fn new(rules: Vec<FieldRule>) -> ConfigResult<Self> {
        let rules = rules
            .into_iter()
            .map(|rule| {
                let selector = Selector::parse(&rule.selector).map_err(|e| {
                    ConfigError::Validation(format!(
                        "Invalid selector '{}' for field {}: {:?}",
                        rule.selector, rule.field, e
                    ))
                })?;
                Ok(CompiledRule { rule, selector })
            })
            .collect::<ConfigResult<Vec<_>>>()?;

        Ok(Self { rules })
    }

    /// Pipeline for movie subject pages
    pub fn standard() -> ConfigResult<Self> {
        Self::new(default_rules())
    }

    pub fn rules(&self) -> impl Iterator<Item = &FieldRule> {
        self.rules.iter().map(|compiled| &compiled.rule)
    }

    /// Extracts a record from raw page bytes
    ///
    /// Invalid UTF-8 is replaced rather than rejected.
    pub fn extract(
        &self,
        body: &[u8],
        source_url: &str,
        fetched_at: DateTime<Utc>,
    ) -> ExtractedRecord {
        let html = String::from_utf8_lossy(body);
        self.extract_html(&html, source_url, fetched_at)
    }

    /// Extracts a record from page markup
    pub fn extract_html(
        &self,
        html: &str,
        source_url: &str,
        fetched_at: DateTime<Utc>,
    ) -> ExtractedRecord {
        let document = Html::parse_document(html);
        let mut record = ExtractedRecord::new(source_url, fetched_at);
        let mut filled = HashSet::new();

        for compiled in &self.rules {
            let field = compiled.rule.field;
            if filled.contains(&field) {
                continue;
            }

            let values = compiled.values(&document);
            if assign(&mut record, field, values) {
                filled.insert(field);
            } else {
                tracing::trace!(
                    "No {} at {} via '{}'",
                    field,
                    source_url,
                    compiled.rule.selector
                );
            }
        }

        record
    }
}

/// Stores captured values in the record; returns true if the field is now set
fn assign(record: &mut ExtractedRecord, field: Field, values: Vec<String>) -> bool {
    let first = values.first().cloned();

    let slot = match field {
        Field::Title => &mut record.title,
        Field::Year => &mut record.year,
        Field::VoteCount => &mut record.vote_count,
        Field::Director => &mut record.director,
        Field::ReleaseDate => &mut record.release_date,
        Field::Runtime => &mut record.runtime,
        Field::Summary => &mut record.summary,
        Field::PosterUrl => &mut record.poster_url,
        Field::Rating => {
            record.rating = first.and_then(|v| v.parse().ok());
            return record.rating.is_some();
        }
        Field::Cast => {
            record.cast = values;
            return !record.cast.is_empty();
        }
        Field::Genres => {
            let mut seen = HashSet::new();
            record.genres = values
                .into_iter()
                .filter(|genre| seen.insert(genre.clone()))
                .collect();
            return !record.genres.is_empty();
        }
    };

    *slot = first;
    slot.is_some()
}
