//! Markdown run report
//!
//! This module renders a finished run as a human-readable markdown report and
//! exposes it as an [`Aggregator`] so the coordinator can write it once the
//! pipeline has stopped.

use crate::output::{Aggregator, OutputResult, RunSummary};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Writes a markdown report of the run to a file
#[derive(Debug, Clone)]
pub struct MarkdownReport {
    path: PathBuf,
}

impl MarkdownReport {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Aggregator for MarkdownReport {
    fn name(&self) -> &str {
        "markdown-report"
    }

    fn aggregate(&self, summary: &RunSummary) -> OutputResult<()> {
        generate_markdown_summary(summary, &self.path)?;
        tracing::info!("Wrote run report to {}", self.path.display());
        Ok(())
    }
}

/// Generates a markdown summary of a run
///
/// # Arguments
///
/// * `summary` - The finished run
/// * `output_path` - Path where the markdown file should be written
///
/// # Returns
///
/// * `Ok(())` - Successfully wrote markdown summary
/// * `Err(OutputError)` - Failed to write summary
pub fn generate_markdown_summary(summary: &RunSummary, output_path: &Path) -> OutputResult<()> {
    let markdown = format_markdown_summary(summary);

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats a run summary as markdown
pub fn format_markdown_summary(summary: &RunSummary) -> String {
    let stats = &summary.stats;
    let mut md = String::new();

    md.push_str("# Targeted Crawl Summary\n\n");

    // Run metadata
    md.push_str("## Run Information\n\n");
    md.push_str(&format!("- **Started**: {}\n", summary.started_at.to_rfc3339()));
    md.push_str(&format!("- **Finished**: {}\n", summary.finished_at.to_rfc3339()));
    md.push_str(&format!(
        "- **Duration**: {:.2} seconds\n",
        summary.duration().as_secs_f64()
    ));
    md.push_str(&format!("- **Status**: {}\n", summary.status));
    if let Some(hash) = &summary.config_hash {
        md.push_str(&format!("- **Config Hash**: {}\n", hash));
    }
    md.push_str(&format!(
        "- **Workers**: {} fetch / {} extraction\n\n",
        summary.fetch_workers, summary.extraction_workers
    ));

    md.push_str("## Overall Statistics\n\n");
    md.push_str(&format!("- **Unique URLs**: {}\n", summary.input_urls));
    md.push_str(&format!("- **Domains**: {}\n", summary.domains));
    md.push_str(&format!(
        "- **Records Written**: {}\n",
        stats.records_written
    ));
    md.push_str(&format!(
        "- **Fetch Success Rate**: {:.2}%\n\n",
        summary.fetch_success_rate()
    ));

    md.push_str("## Outcome Breakdown\n\n");
    md.push_str("| Outcome | Count |\n");
    md.push_str("|---------|-------|\n");
    md.push_str(&format!("| Fetched | {} |\n", stats.fetched));
    md.push_str(&format!(
        "| Disallowed by robots.txt | {} |\n",
        stats.skipped_by_policy
    ));
    md.push_str(&format!("| Fetch Failed | {} |\n", stats.fetch_failed));
    md.push_str(&format!("| Extracted | {} |\n", stats.extracted));
    md.push_str(&format!(
        "| Field Missing | {} |\n",
        stats.extraction_failed
    ));
    md.push_str(&format!("| Dropped | {} |\n", stats.dropped));
    md.push_str(&format!("| Invalid Input | {} |\n", stats.invalid));
    md.push_str(&format!("| Duplicate Input | {} |\n\n", stats.duplicates));

    if stats.dropped > 0 {
        md.push_str("## Warnings\n\n");
        md.push_str(&format!(
            "{} fetched document(s) never reached the output file.\n\n",
            stats.dropped
        ));
    }

    md
}
