//! Crawler module: the fetch → extract pipeline
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching behind the [`Fetcher`] trait
//! - Per-domain rate limiting
//! - The work queue between fetch and extraction workers
//! - The worker pools and the coordinator that runs them

mod coordinator;
mod extract_worker;
mod fetch_worker;
mod fetcher;
mod queue;
mod rate_limiter;
pub mod segment;


pub use coordinator::{crawl, Coordinator};
pub use extract_worker::{extract_worker, ExtractContext};
pub use fetch_worker::{fetch_worker, FetchContext};
pub use fetcher::{build_http_client, FetchError, Fetcher, HttpFetcher};
pub use queue::{Claimed, ConsumerGuard, Pop, QueueError, WorkItem, WorkQueue};
pub use rate_limiter::RateLimiter;
pub use segment::{parse_input, segment, ParsedInput};
