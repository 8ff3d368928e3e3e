//! Per-domain request spacing
//!
//! Every domain gets its own async mutex around its `DomainState`. The lock is
//! held while the caller sleeps out the remaining delay and records the new
//! access time, so two workers hitting the same domain can never both read
//! a stale timestamp and go through together. Different domains never
//! contend beyond the brief registry lookup.

use crate::state::DomainState;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tokio::sync::Mutex as AsyncMutex;

/// Enforces a minimum delay between fetch attempts to the same domain
pub struct RateLimiter {
    /// Configured minimum spacing
    delay: Duration,

    /// Domain -> access state
    domains: Mutex<HashMap<String, Arc<AsyncMutex<DomainState>>>>,
}

impl RateLimiter {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            domains: Mutex::new(HashMap::new()),
        }
    }

    /// Waits until `domain` may be requested again, then records the access
    ///
    /// Returns how long the caller was put to sleep (not counting time spent
    /// queued behind other workers on the same domain).
    pub async fn throttle(&self, domain: &str) -> Duration {
        self.throttle_with(domain, None).await
    }

    /// Like [`throttle`](Self::throttle), honouring a robots.txt Crawl-delay
    ///
    /// The effective delay is the larger of the configured delay and
    /// `crawl_delay`.
    pub async fn throttle_with(&self, domain: &str, crawl_delay: Option<Duration>) -> Duration {
        let delay = crawl_delay.map_or(self.delay, |d| d.max(self.delay));
        let slot = self.slot(domain);
        let mut state = slot.lock().await;

        let waited = match state.time_until_next_request(delay, Instant::now()) {
            Some(wait) => {
                tracing::trace!("Rate limiting {}: sleeping {:?}", domain, wait);
                tokio::time::sleep(wait).await;
                wait
            }
            None => Duration::ZERO,
        };

        state.record_request(Instant::now());
        waited
    }

    /// Number of fetch attempts recorded for a domain
    pub async fn request_count(&self, domain: &str) -> u32 {
        let slot = {
            let domains = self.domains.lock().unwrap_or_else(PoisonError::into_inner);
            domains.get(domain).cloned()
        };
        match slot {
            Some(slot) => slot.lock().await.request_count,
            None => 0,
        }
    }

    /// Number of distinct domains seen so far
    pub fn domain_count(&self) -> usize {
        self.domains
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn slot(&self, domain: &str) -> Arc<AsyncMutex<DomainState>> {
        let mut domains = self.domains.lock().unwrap_or_else(PoisonError::into_inner);
        domains
            .entry(domain.to_string())
            .or_insert_with(|| Arc::new(AsyncMutex::new(DomainState::new())))
            .clone()
    }
}
