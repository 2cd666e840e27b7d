//! Structured extraction from item pages
//!
//! - [`record`]: the [`ExtractedRecord`] produced for every fetched item
//! - [`rules`]: declarative field rules and the rule set for subject pages
//! - [`pipeline`]: evaluates rules against a parsed document

mod pipeline;
pub mod record;
pub mod rules;

pub use pipeline::ExtractionPipeline;
pub use record::ExtractedRecord;
pub use rules::{default_rules, Capture, Field, FieldRule, Take, Transform};
