//! Input parsing and partitioning of the URL list across fetch workers

use crate::url::parse_input_url;
use std::collections::HashSet;
use url::Url;

/// URLs read from the input, with counts of what was left out
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedInput {
    /// Unique URLs in first-seen order
    pub urls: Vec<Url>,

    /// Lines that were not absolute http(s) URLs
    pub invalid: usize,

    /// Lines repeating an earlier URL
    pub duplicates: usize,
}

/// Parses newline-delimited URLs
///
/// Lines are trimmed and blank lines ignored. Each URL is kept only the first
/// time it appears so no worker is ever handed a URL another worker owns.
pub fn parse_input(input: &str) -> ParsedInput {
    let mut parsed = ParsedInput::default();
    let mut seen = HashSet::new();

    for (index, line) in input.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match parse_input_url(line) {
            Ok(url) => {
                if seen.insert(url.clone()) {
                    parsed.urls.push(url);
                } else {
                    tracing::debug!("Skipping duplicate URL on line {}: {}", index + 1, url);
                    parsed.duplicates += 1;
                }
            }
            Err(e) => {
                tracing::warn!("Ignoring line {}: {}", index + 1, e);
                parsed.invalid += 1;
            }
        }
    }

    parsed
}

/// Splits `urls` into `workers` segments, round-robin
///
/// The URL at index `i` lands in segment `i % workers`. Always returns
/// exactly `workers` segments (some may be empty); `workers == 0` is treated
/// as 1.
pub fn segment(urls: &[Url], workers: usize) -> Vec<Vec<Url>> {
    let workers = workers.max(1);
    let mut segments = vec![Vec::new(); workers];
    for (i, url) in urls.iter().enumerate() {
        segments[i % workers].push(url.clone());
    }
    segments
}
