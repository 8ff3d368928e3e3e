//! Crawler coordinator - pipeline orchestration
//!
//! This module wires the pipeline together and runs it to completion:
//! - Parsing and segmenting the input URL list
//! - Spawning the fetch and extraction worker pools
//! - Closing and draining the work queue once fetching is done
//! - Running aggregation hooks over the final summary

use crate::config::{validate, Config};
use crate::crawler::extract_worker::{extract_worker, ExtractContext};
use crate::crawler::fetch_worker::{fetch_worker, FetchContext};
use crate::crawler::segment::{parse_input, segment};
use crate::crawler::{Fetcher, HttpFetcher, RateLimiter, WorkQueue};
use crate::extract::{Extractor, SelectorExtractor};
use crate::output::{
    Aggregator, Counter, FileSink, LogAggregator, MarkdownReport, RunStatistics, RunStatus,
    RunSummary, Sink, SinkError,
};
use crate::robots::PolicyStore;
use crate::url::extract_domain;
use crate::{ConfigError, CrawlerError, Result};
use chrono::Utc;
use std::collections::HashSet;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Owns the pipeline's collaborators and runs crawls with them
pub struct Coordinator {
    config: Arc<Config>,
    config_hash: Option<String>,
    fetcher: Arc<dyn Fetcher>,
    extractor: Arc<dyn Extractor>,
    sink: Arc<dyn Sink>,
    aggregators: Vec<Box<dyn Aggregator>>,
}

impl Coordinator {
    /// Creates a coordinator with the production collaborators
    ///
    /// Builds the HTTP client, compiles the selector and opens the output
    /// file. Any failure here is a setup failure: nothing has been fetched.
    ///
    /// # Arguments
    ///
    /// * `config` - The crawler configuration
    pub fn new(config: Config) -> Result<Self> {
        validate(&config)?;

        let fetcher = HttpFetcher::from_config(&config.user_agent, config.timing.fetch_timeout())?;
        let extractor = SelectorExtractor::new(&config.extraction.selector)
            .map_err(|e| ConfigError::Validation(e.to_string()))?;
        let sink = FileSink::open(&config.output.path).map_err(|e| match e {
            SinkError::Io(e) => CrawlerError::Io(e),
            other => CrawlerError::SinkWrite(other),
        })?;
        let report = config.output.report_path.clone();

        let mut coordinator =
            Self::with_parts(config, Arc::new(fetcher), Arc::new(extractor), Arc::new(sink))?;
        if let Some(path) = report {
            coordinator = coordinator.with_aggregator(Box::new(MarkdownReport::new(path)));
        }
        Ok(coordinator)
    }

    /// Creates a coordinator around caller-supplied collaborators
    ///
    /// Only the [`LogAggregator`] is installed.
    pub fn with_parts(
        config: Config,
        fetcher: Arc<dyn Fetcher>,
        extractor: Arc<dyn Extractor>,
        sink: Arc<dyn Sink>,
    ) -> Result<Self> {
        validate(&config)?;

        Ok(Self {
            config: Arc::new(config),
            config_hash: None,
            fetcher,
            extractor,
            sink,
            aggregators: vec![Box::new(LogAggregator)],
        })
    }

    /// Records the configuration file hash in run summaries
    pub fn with_config_hash(mut self, hash: impl Into<String>) -> Self {
        self.config_hash = Some(hash.into());
        self
    }

    /// Adds a post-run aggregation hook
    pub fn with_aggregator(mut self, aggregator: Box<dyn Aggregator>) -> Self {
        self.aggregators.push(aggregator);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Runs the pipeline over newline-delimited `input`
    ///
    /// This method:
    /// 1. Parses, de-duplicates and segments the input
    /// 2. Starts the extraction workers, then the fetch workers
    /// 3. Waits for every fetch worker, then closes the queue
    /// 4. Waits for the queue to drain and the extraction workers to exit
    /// 5. Runs aggregation hooks
    ///
    /// # Returns
    ///
    /// * `Ok(RunSummary)` - The run completed
    /// * `Err(CrawlerError::SinkWrite)` - A record could not be written; the
    ///   run was aborted
    pub async fn run(&self, input: &str) -> Result<RunSummary> {
        let started_at = Utc::now();
        let pipeline = &self.config.pipeline;
        let timing = &self.config.timing;

        let parsed = parse_input(input);
        let stats = Arc::new(RunStatistics::new());
        stats.add(Counter::Invalid, parsed.invalid as u64);
        stats.add(Counter::Duplicate, parsed.duplicates as u64);

        let domains: HashSet<String> = parsed.urls.iter().filter_map(extract_domain).collect();
        tracing::info!(
            "Starting crawl: {} URLs across {} domains ({} fetch / {} extraction workers)",
            parsed.urls.len(),
            domains.len(),
            pipeline.fetch_workers,
            pipeline.extraction_workers
        );

        let queue = Arc::new(WorkQueue::new(pipeline.queue_capacity));
        let cancel = CancellationToken::new();

        let extract_ctx = Arc::new(ExtractContext {
            queue: queue.clone(),
            extractor: self.extractor.clone(),
            sink: self.sink.clone(),
            stats: stats.clone(),
            cancel: cancel.clone(),
            idle_timeout: timing.extraction_idle_timeout(),
            termination: pipeline.termination,
            sentinel: self.config.extraction.sentinel.clone(),
        });
        let extract_handles: Vec<_> = (0..pipeline.extraction_workers)
            .map(|id| {
                let consumer = queue.consumer();
                tokio::spawn(extract_worker(id, extract_ctx.clone(), consumer))
            })
            .collect();

        let fetch_ctx = Arc::new(FetchContext {
            policies: Arc::new(PolicyStore::new(
                self.fetcher.clone(),
                self.config.user_agent.crawler_name.clone(),
            )),
            limiter: Arc::new(RateLimiter::new(timing.rate_limit_delay())),
            fetcher: self.fetcher.clone(),
            queue: queue.clone(),
            stats: stats.clone(),
            cancel: cancel.clone(),
            respect_crawl_delay: timing.respect_crawl_delay,
        });
        let fetch_handles: Vec<_> = segment(&parsed.urls, pipeline.fetch_workers)
            .into_iter()
            .enumerate()
            .map(|(id, urls)| tokio::spawn(fetch_worker(id, urls, fetch_ctx.clone())))
            .collect();

        // First failure wins; later ones are only logged
        let mut failure: Option<CrawlerError> = None;

        for handle in fetch_handles {
            if let Err(e) = handle.await {
                tracing::error!("Fetch worker panicked: {}", e);
                failure.get_or_insert(e.into());
            }
        }
        tracing::debug!("All fetch workers finished, closing work queue");
        queue.close();

        tokio::select! {
            _ = queue.await_drain() => {
                tracing::debug!("Work queue drained");
            }
            _ = queue.await_disconnect() => {
                tracing::debug!("Extraction workers exited before the queue drained");
            }
        }

        for handle in extract_handles {
            match handle.await {
                Ok(Ok(_)) => {}
                Ok(Err(e)) => {
                    failure.get_or_insert(CrawlerError::SinkWrite(e));
                }
                Err(e) => {
                    tracing::error!("Extraction worker panicked: {}", e);
                    failure.get_or_insert(e.into());
                }
            }
        }

        let leftover = queue.outstanding();
        if leftover > 0 {
            tracing::warn!(
                "{} fetched documents were dropped before extraction",
                leftover
            );
            stats.add(Counter::Dropped, leftover as u64);
        }

        let status = if failure.is_some() || cancel.is_cancelled() {
            RunStatus::Aborted
        } else {
            RunStatus::Completed
        };

        let summary = RunSummary {
            started_at,
            finished_at: Utc::now(),
            status,
            config_hash: self.config_hash.clone(),
            input_urls: parsed.urls.len(),
            domains: domains.len(),
            fetch_workers: pipeline.fetch_workers,
            extraction_workers: pipeline.extraction_workers,
            stats: stats.snapshot(),
        };
        tracing::info!("Crawl {}: {}", summary.status, summary.stats);

        for aggregator in &self.aggregators {
            if let Err(e) = aggregator.aggregate(&summary) {
                tracing::warn!("Aggregator {} failed: {}", aggregator.name(), e);
            }
        }

        match failure {
            Some(e) => Err(e),
            None => Ok(summary),
        }
    }
}

/// Runs a complete crawl over `input` with the production collaborators
///
/// # Example
///
/// ```no_run
/// use targeted_crawler::config::load_config;
/// use targeted_crawler::crawler::crawl;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("crawler.toml"))?;
/// let summary = crawl(config, "https://example.com/\n").await?;
/// println!("{} records written", summary.stats.records_written);
/// # Ok(())
/// # }
/// ```
pub async fn crawl(config: Config, input: &str) -> Result<RunSummary> {
    Coordinator::new(config)?.run(input).await
}
