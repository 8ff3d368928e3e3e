//! Output traits and error types
//!
//! A [`Sink`] persists one record per processed document while the run is in
//! progress. An [`Aggregator`] sees the finished [`RunSummary`] once all
//! workers have stopped.

use crate::extract::ExtractedRecord;
use crate::output::RunSummary;
use thiserror::Error;

/// Errors from appending records
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("sink lock poisoned by a panicking writer")]
    Poisoned,
}

/// Errors from post-run output (reports, summaries)
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write output: {0}")]
    Write(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Destination for extracted records
///
/// Called concurrently by every extraction worker. Implementations must make
/// each `append` land as one whole record, never interleaved with another.
pub trait Sink: Send + Sync {
    /// Persists a single record
    ///
    /// # Arguments
    ///
    /// * `record` - The URL and its extracted field
    fn append(&self, record: &ExtractedRecord) -> Result<(), SinkError>;
}

/// Post-run hook over the run summary
pub trait Aggregator: Send + Sync {
    /// Short name used in log lines
    fn name(&self) -> &str;

    /// Processes the finished run
    ///
    /// # Arguments
    ///
    /// * `summary` - Counters and metadata for the run
    fn aggregate(&self, summary: &RunSummary) -> OutputResult<()>;
}
