//! Markdown summary generation
//!
//! Renders dataset statistics and the record list as a human-readable
//! markdown document.

use crate::extract::ExtractedRecord;
use crate::output::stats::DatasetStatistics;
use crate::output::OutputResult;
use crate::storage::write_atomic;
use std::path::Path;

/// Writes the markdown summary of `records` to `output_path`
///
/// # Arguments
///
/// * `records` - The accumulated record set
/// * `output_path` - Path where the markdown file should be written
///
/// # Returns
///
/// * `Ok(())` - Successfully wrote markdown summary
/// * `Err(OutputError)` - Failed to write summary
pub fn generate_markdown_summary(
    records: &[ExtractedRecord],
    output_path: &Path,
) -> OutputResult<()> {
    let stats = DatasetStatistics::from_records(records);
    let markdown = format_markdown_summary(&stats, records);

    write_atomic(output_path, markdown.as_bytes())?;
    tracing::info!("Wrote summary to {}", output_path.display());

    Ok(())
}

/// Formats dataset statistics and records as markdown
pub fn format_markdown_summary(stats: &DatasetStatistics, records: &[ExtractedRecord]) -> String {
    let mut md = String::new();

    md.push_str("# Reel-Crawl Summary\n\n");

    md.push_str("## Overview\n\n");
    md.push_str(&format!("- **Records**: {}\n", stats.total));
    md.push_str(&format!("- **Rated**: {}\n", stats.rated));
    if let Some(mean) = stats.mean_rating {
        md.push_str(&format!("- **Mean Rating**: {:.2}\n", mean));
    }
    if let (Some(max), Some(min)) = (stats.max_rating, stats.min_rating) {
        md.push_str(&format!("- **Rating Range**: {:.1} to {:.1}\n", min, max));
    }
    md.push('\n');

    if !stats.top_years.is_empty() {
        md.push_str("## Top Years\n\n");
        md.push_str("| Year | Count |\n");
        md.push_str("|------|-------|\n");
        for (year, count) in &stats.top_years {
            md.push_str(&format!("| {} | {} |\n", escape_cell(year), count));
        }
        md.push('\n');
    }

    if !stats.top_genres.is_empty() {
        md.push_str("## Top Genres\n\n");
        md.push_str("| Genre | Count |\n");
        md.push_str("|-------|-------|\n");
        for (genre, count) in &stats.top_genres {
            md.push_str(&format!("| {} | {} |\n", escape_cell(genre), count));
        }
        md.push('\n');
    }

    if !records.is_empty() {
        md.push_str("## Records\n\n");
        md.push_str("| # | Title | Year | Rating | Director | Genres |\n");
        md.push_str("|---|-------|------|--------|----------|--------|\n");
        for (i, record) in records.iter().enumerate() {
            let title = record.title.as_deref().unwrap_or("N/A");
            md.push_str(&format!(
                "| {} | [{}]({}) | {} | {} | {} | {} |\n",
                i + 1,
                escape_cell(title),
                record.source_url,
                record.year.as_deref().unwrap_or("-"),
                record
                    .rating
                    .map(|r| format!("{:.1}", r))
                    .unwrap_or_else(|| "-".to_string()),
                escape_cell(record.director.as_deref().unwrap_or("-")),
                escape_cell(&record.genres.join(" / ")),
            ));
        }
        md.push('\n');
    }

    md
}

/// Keeps table cells on one row
fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}
