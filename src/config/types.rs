use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure for the crawler
///
/// Every section is optional; missing sections fall back to the defaults
/// below, which match the historical hard-coded behaviour of the tool.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub pipeline: PipelineConfig,
    pub timing: TimingConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub extraction: ExtractionConfig,
    pub output: OutputConfig,
}

/// How extraction workers decide to stop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TerminationMode {
    /// Exit once the queue has been closed by the coordinator and is empty.
    /// Items enqueued by slow fetchers are never lost.
    #[default]
    ClosedAndEmpty,

    /// Exit after `extraction-idle-timeout` with nothing to pop, even if
    /// fetchers are still running. Late items may be dropped.
    IdleTimeout,
}

/// Worker pool and queue configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Number of fetch workers (and input segments)
    #[serde(rename = "fetch-workers")]
    pub fetch_workers: usize,

    /// Number of extraction workers
    #[serde(rename = "extraction-workers")]
    pub extraction_workers: usize,

    /// Work queue capacity; 0 means unbounded
    #[serde(rename = "queue-capacity")]
    pub queue_capacity: usize,

    /// Termination strategy for extraction workers
    pub termination: TerminationMode,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            fetch_workers: 10,
            extraction_workers: 10,
            queue_capacity: 0,
            termination: TerminationMode::default(),
        }
    }
}

/// Delays and timeouts, all in seconds
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Minimum time between two requests to the same domain
    #[serde(rename = "rate-limit-delay")]
    pub rate_limit_delay: f64,

    /// Timeout for a single fetch (page or robots.txt)
    #[serde(rename = "fetch-timeout")]
    pub fetch_timeout: f64,

    /// How long an extraction worker waits on an empty queue
    #[serde(rename = "extraction-idle-timeout")]
    pub extraction_idle_timeout: f64,

    /// Whether a robots.txt Crawl-delay may raise the per-domain delay
    #[serde(rename = "respect-crawl-delay")]
    pub respect_crawl_delay: bool,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            rate_limit_delay: 1.0,
            fetch_timeout: 5.0,
            extraction_idle_timeout: 10.0,
            respect_crawl_delay: true,
        }
    }
}

impl TimingConfig {
    pub fn rate_limit_delay(&self) -> Duration {
        Duration::from_secs_f64(self.rate_limit_delay)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.fetch_timeout)
    }

    pub fn extraction_idle_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.extraction_idle_timeout)
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    /// Name of the crawler; also the token matched against robots.txt groups
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: Option<String>,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "targeted-crawler".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: None,
        }
    }
}

impl UserAgentConfig {
    /// Formats the full User-Agent header value
    ///
    /// Format: `CrawlerName/Version` or `CrawlerName/Version (+ContactURL)`
    pub fn header_value(&self) -> String {
        match &self.contact_url {
            Some(contact) => format!(
                "{}/{} (+{})",
                self.crawler_name, self.crawler_version, contact
            ),
            None => format!("{}/{}", self.crawler_name, self.crawler_version),
        }
    }
}

/// Field extraction configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// CSS selector whose first match's text is the extracted field
    pub selector: String,

    /// Value written when the field cannot be extracted
    pub sentinel: String,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            selector: "title".to_string(),
            sentinel: "No Title".to_string(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Append-only record file
    pub path: PathBuf,

    /// Optional markdown run report written after aggregation
    #[serde(rename = "report-path")]
    pub report_path: Option<PathBuf>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("targeted_data.txt"),
            report_path: None,
        }
    }
}
