//! Output module for persisting records and reporting on runs
//!
//! This module handles:
//! - Appending extracted records to the output file
//! - Counting run events and printing the end-of-run summary
//! - Post-run aggregation hooks (log line, markdown report)

mod markdown;
mod sink;
pub mod stats;
mod traits;

pub use markdown::{format_markdown_summary, generate_markdown_summary, MarkdownReport};
pub use sink::{format_record, FileSink};
pub use stats::{print_summary, Counter, RunStatistics, StatsSnapshot};
pub use traits::{Aggregator, OutputError, OutputResult, Sink, SinkError};

use chrono::{DateTime, Utc};
use std::fmt;
use std::time::Duration;

/// Final status of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Completed,
    /// Stopped early because the sink failed
    Aborted,
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStatus::Completed => write!(f, "completed"),
            RunStatus::Aborted => write!(f, "aborted"),
        }
    }
}

/// Everything known about a finished run
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub status: RunStatus,
    pub config_hash: Option<String>,

    /// Unique, valid URLs read from the input
    pub input_urls: usize,

    /// Distinct domains among those URLs
    pub domains: usize,

    pub fetch_workers: usize,
    pub extraction_workers: usize,
    pub stats: StatsSnapshot,
}

impl RunSummary {
    pub fn duration(&self) -> Duration {
        (self.finished_at - self.started_at)
            .to_std()
            .unwrap_or(Duration::ZERO)
    }

    /// Percentage of input URLs that were fetched successfully
    pub fn fetch_success_rate(&self) -> f64 {
        if self.input_urls == 0 {
            0.0
        } else {
            (self.stats.fetched as f64 / self.input_urls as f64) * 100.0
        }
    }
}

/// Logs the run totals at `info`
#[derive(Debug, Clone, Copy, Default)]
pub struct LogAggregator;

impl Aggregator for LogAggregator {
    fn name(&self) -> &str {
        "log"
    }

    fn aggregate(&self, summary: &RunSummary) -> OutputResult<()> {
        tracing::info!(
            "Aggregation complete ({}, {:.2}s): {}",
            summary.status,
            summary.duration().as_secs_f64(),
            summary.stats
        );
        Ok(())
    }
}
