//! Declarative field rules
//!
//! A rule names the record field it fills, a CSS selector, what to read from
//! the matched elements, how many of them to keep, and a transform applied to
//! each captured string. Several rules may target the same field; the first one
//! that produces a value wins.

use std::fmt;

/// Record field a rule fills
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Title,
    Year,
    Rating,
    VoteCount,
    Director,
    Cast,
    Genres,
    ReleaseDate,
    Runtime,
    Summary,
    PosterUrl,
}

impl Field {
    /// Serialized field name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Year => "year",
            Self::Rating => "rating",
            Self::VoteCount => "voteCount",
            Self::Director => "director",
            Self::Cast => "cast",
            Self::Genres => "genres",
            Self::ReleaseDate => "releaseDate",
            Self::Runtime => "runtime",
            Self::Summary => "summary",
            Self::PosterUrl => "posterUrl",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What is read from a matched element
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Capture {
    /// Concatenated descendant text
    Text,
    /// Value of the named attribute
    Attr(String),
}

/// How many matched elements are kept
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Take {
    First,
    All { limit: Option<usize> },
}

/// Normalization applied to each captured string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transform {
    /// Trim surrounding whitespace
    Trim,
    /// Collapse internal runs of whitespace into single spaces
    Collapse,
    /// Trim, then strip surrounding parentheses: `(1994)` -> `1994`
    StripParens,
    /// Keep only text that parses as a finite number
    Number,
}

impl Transform {
    /// Applies the transform; blank output is reported as `None`
    pub fn apply(&self, raw: &str) -> Option<String> {
        let value = match self {
            Self::Trim => raw.trim().to_string(),
            Self::Collapse => raw.split_whitespace().collect::<Vec<_>>().join(" "),
            Self::StripParens => raw
                .trim()
                .trim_start_matches(&['(', '（'][..])
                .trim_end_matches(&[')', '）'][..])
                .trim()
                .to_string(),
            Self::Number => {
                let trimmed = raw.trim();
                let number: f64 = trimmed.parse().ok()?;
                if !number.is_finite() {
                    return None;
                }
                trimmed.to_string()
            }
        };

        if value.is_empty() {
            None
        } else {
            Some(value)
        }
    }
}

/// One declarative extractor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRule {
    pub field: Field,
    pub selector: String,
    pub capture: Capture,
    pub take: Take,
    pub transform: Transform,
}

impl FieldRule {
    /// Rule reading the trimmed text of the first match
    pub fn text(field: Field, selector: &str) -> Self {
        Self {
            field,
            selector: selector.to_string(),
            capture: Capture::Text,
            take: Take::First,
            transform: Transform::Trim,
        }
    }

    /// Rule reading an attribute of the first match
    pub fn attr(field: Field, selector: &str, attribute: &str) -> Self {
        Self {
            capture: Capture::Attr(attribute.to_string()),
            ..Self::text(field, selector)
        }
    }

    /// Keeps every match, optionally capped
    pub fn all(mut self, limit: Option<usize>) -> Self {
        self.take = Take::All { limit };
        self
    }

    pub fn transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }
}

/// Rules for movie subject pages
///
/// The title prefers the item-name span, which excludes the year that the
/// surrounding `h1` also contains.
pub fn default_rules() -> Vec<FieldRule> {
    vec![
        FieldRule::text(Field::Title, "h1 span[property='v:itemreviewed']")
            .transform(Transform::Collapse),
        FieldRule::text(Field::Title, "h1").transform(Transform::Collapse),
        FieldRule::text(Field::Year, "span.year").transform(Transform::StripParens),
        FieldRule::text(Field::Rating, "strong.rating_num").transform(Transform::Number),
        FieldRule::text(Field::VoteCount, "a.rating_people"),
        FieldRule::text(Field::Director, "a[rel='v:directedBy']"),
        FieldRule::text(Field::Cast, "a[rel='v:starring']").all(Some(5)),
        FieldRule::text(Field::Genres, "span[property='v:genre']").all(None),
        FieldRule::text(Field::ReleaseDate, "span[property='v:initialReleaseDate']"),
        FieldRule::text(Field::Runtime, "span[property='v:runtime']"),
        FieldRule::text(Field::Summary, "span[property='v:summary']")
            .transform(Transform::Collapse),
        FieldRule::attr(Field::PosterUrl, "img[rel='v:image']", "src"),
    ]
}
