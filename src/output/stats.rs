//! Run counters shared by all workers
//!
//! This module provides the lock-free counters the workers bump as they go,
//! and the stdout summary printed at the end of a run.

use crate::output::RunSummary;
use std::sync::atomic::{AtomicU64, Ordering};

/// Events counted during a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Counter {
    /// Document fetched and handed to the queue
    Fetched,
    /// URL disallowed by robots.txt
    SkippedByPolicy,
    /// Fetch failed (timeout, connection, status, body)
    FetchFailed,
    /// Document processed by an extraction worker
    Extracted,
    /// Extractor found nothing; sentinel written instead
    ExtractionFailed,
    /// Input line that was not a usable URL
    Invalid,
    /// Input line repeating an earlier URL
    Duplicate,
    /// Fetched document that never reached the sink
    Dropped,
    /// Line appended to the output file
    RecordWritten,
}

/// Atomic run counters
#[derive(Debug, Default)]
pub struct RunStatistics {
    fetched: AtomicU64,
    skipped_by_policy: AtomicU64,
    fetch_failed: AtomicU64,
    extracted: AtomicU64,
    extraction_failed: AtomicU64,
    invalid: AtomicU64,
    duplicates: AtomicU64,
    dropped: AtomicU64,
    records_written: AtomicU64,
}

/// Point-in-time copy of [`RunStatistics`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub fetched: u64,
    pub skipped_by_policy: u64,
    pub fetch_failed: u64,
    pub extracted: u64,
    pub extraction_failed: u64,
    pub invalid: u64,
    pub duplicates: u64,
    pub dropped: u64,
    pub records_written: u64,
}

impl RunStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn incr(&self, counter: Counter) {
        self.add(counter, 1);
    }

    pub fn add(&self, counter: Counter, n: u64) {
        self.slot(counter).fetch_add(n, Ordering::Relaxed);
    }

    pub fn get(&self, counter: Counter) -> u64 {
        self.slot(counter).load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            fetched: self.get(Counter::Fetched),
            skipped_by_policy: self.get(Counter::SkippedByPolicy),
            fetch_failed: self.get(Counter::FetchFailed),
            extracted: self.get(Counter::Extracted),
            extraction_failed: self.get(Counter::ExtractionFailed),
            invalid: self.get(Counter::Invalid),
            duplicates: self.get(Counter::Duplicate),
            dropped: self.get(Counter::Dropped),
            records_written: self.get(Counter::RecordWritten),
        }
    }

    fn slot(&self, counter: Counter) -> &AtomicU64 {
        match counter {
            Counter::Fetched => &self.fetched,
            Counter::SkippedByPolicy => &self.skipped_by_policy,
            Counter::FetchFailed => &self.fetch_failed,
            Counter::Extracted => &self.extracted,
            Counter::ExtractionFailed => &self.extraction_failed,
            Counter::Invalid => &self.invalid,
            Counter::Duplicate => &self.duplicates,
            Counter::Dropped => &self.dropped,
            Counter::RecordWritten => &self.records_written,
        }
    }
}

impl std::fmt::Display for StatsSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "fetched={} skipped_by_policy={} fetch_failed={} extracted={} \
             extraction_failed={} invalid={} duplicates={} dropped={} records_written={}",
            self.fetched,
            self.skipped_by_policy,
            self.fetch_failed,
            self.extracted,
            self.extraction_failed,
            self.invalid,
            self.duplicates,
            self.dropped,
            self.records_written
        )
    }
}

/// Prints the run summary to stdout in a formatted manner
///
/// # Arguments
///
/// * `summary` - The finished run
pub fn print_summary(summary: &RunSummary) {
    let stats = &summary.stats;

    println!("=== Crawl Summary ===\n");

    println!("Run:");
    println!("  Status: {}", summary.status);
    println!("  Started: {}", summary.started_at.to_rfc3339());
    println!("  Finished: {}", summary.finished_at.to_rfc3339());
    println!("  Duration: {:.2}s", summary.duration().as_secs_f64());
    if let Some(hash) = &summary.config_hash {
        println!("  Config hash: {}", hash);
    }
    println!();

    println!("Input:");
    println!("  Unique URLs: {}", summary.input_urls);
    println!("  Duplicates skipped: {}", stats.duplicates);
    println!("  Invalid lines: {}", stats.invalid);
    println!("  Domains: {}", summary.domains);
    println!();

    println!("Fetching:");
    println!("  Fetched: {}", stats.fetched);
    println!("  Disallowed by robots.txt: {}", stats.skipped_by_policy);
    println!("  Failed: {}", stats.fetch_failed);
    println!();

    println!("Extraction:");
    println!("  Processed: {}", stats.extracted);
    println!("  Field missing (sentinel written): {}", stats.extraction_failed);
    println!("  Records written: {}", stats.records_written);
    if stats.dropped > 0 {
        println!("  Dropped before extraction: {}", stats.dropped);
    }
    println!();

    println!(
        "Success Rate: {:.1}% ({} / {} URLs fetched)",
        summary.fetch_success_rate(),
        stats.fetched,
        summary.input_urls
    );
}
