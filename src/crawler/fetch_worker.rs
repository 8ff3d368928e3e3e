//! Fetch worker: walks one segment of the input, politely
//!
//! For each URL the worker checks robots.txt, waits out the domain's rate
//! limit, fetches, and hands the document to the work queue. A failed fetch
//! is logged and skipped; nothing is retried.

use crate::crawler::{Fetcher, RateLimiter, WorkItem, WorkQueue};
use crate::output::{Counter, RunStatistics};
use crate::robots::PolicyStore;
use crate::url::extract_domain;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Shared collaborators of every fetch worker
pub struct FetchContext {
    pub policies: Arc<PolicyStore>,
    pub limiter: Arc<RateLimiter>,
    pub fetcher: Arc<dyn Fetcher>,
    pub queue: Arc<WorkQueue>,
    pub stats: Arc<RunStatistics>,
    pub cancel: CancellationToken,

    /// Use robots.txt Crawl-delay when it exceeds the configured delay
    pub respect_crawl_delay: bool,
}

/// Processes `segment` in order, returning the number of documents enqueued
///
/// Stops early when `cancel` fires.
pub async fn fetch_worker(id: usize, segment: Vec<Url>, ctx: Arc<FetchContext>) -> usize {
    tracing::debug!("Fetch worker {} starting with {} URLs", id, segment.len());
    let mut enqueued = 0;

    for url in segment {
        if ctx.cancel.is_cancelled() {
            tracing::info!("Fetch worker {} stopping: run aborted", id);
            break;
        }

        let Some(domain) = extract_domain(&url) else {
            tracing::warn!("Fetch worker {}: no domain in {}, skipping", id, url);
            ctx.stats.incr(Counter::Invalid);
            continue;
        };

        if !ctx.policies.allowed(&url).await {
            tracing::info!("URL {} disallowed by robots.txt", url);
            ctx.stats.incr(Counter::SkippedByPolicy);
            continue;
        }

        let crawl_delay = if ctx.respect_crawl_delay {
            ctx.policies.crawl_delay(&domain)
        } else {
            None
        };

        tokio::select! {
            biased;
            _ = ctx.cancel.cancelled() => {
                tracing::info!("Fetch worker {} stopping: run aborted", id);
                break;
            }
            _ = ctx.limiter.throttle_with(&domain, crawl_delay) => {}
        }

        let document = match ctx.fetcher.fetch(&url).await {
            Ok(document) => document,
            Err(e) => {
                tracing::warn!("Fetch worker {}: failed to fetch {}: {}", id, url, e);
                ctx.stats.incr(Counter::FetchFailed);
                continue;
            }
        };

        tracing::debug!("Fetch worker {}: fetched {} ({} bytes)", id, url, document.len());
        ctx.stats.incr(Counter::Fetched);

        let item = WorkItem {
            url: url.clone(),
            domain,
            document,
        };
        match ctx.queue.push(item).await {
            Ok(()) => enqueued += 1,
            Err(e) => {
                tracing::warn!("Fetch worker {}: dropping {}: {}", id, url, e);
                ctx.stats.incr(Counter::Dropped);
            }
        }
    }

    tracing::debug!("Fetch worker {} finished, {} documents enqueued", id, enqueued);
    enqueued
}
