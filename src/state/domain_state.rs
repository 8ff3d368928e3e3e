use std::time::{Duration, Instant};

/// Per-domain access bookkeeping used by the rate limiter
///
/// A fresh state has never been accessed, so the first request to a domain
/// never waits.
#[derive(Debug, Clone, Default)]
pub struct DomainState {
    /// Number of fetch attempts made to this domain in this run
    pub request_count: u32,

    /// Timestamp of the last fetch attempt to this domain
    pub last_request_time: Option<Instant>,
}

impl DomainState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Calculates how long to wait before the next request is permitted
    ///
    /// # Returns
    ///
    /// * `Some(Duration)` - Time remaining until the spacing is satisfied
    /// * `None` - A request can be made immediately
    ///
    /// A delay too large to add to the last request time waits the full
    /// `delay` from `now`.
    pub fn time_until_next_request(&self, delay: Duration, now: Instant) -> Option<Duration> {
        let last = self.last_request_time?;
        let Some(ready_at) = last.checked_add(delay) else {
            return Some(delay);
        };
        if ready_at > now {
            Some(ready_at - now)
        } else {
            None
        }
    }

    /// Records a fetch attempt at `now`
    pub fn record_request(&mut self, now: Instant) {
        self.request_count += 1;
        self.last_request_time = Some(now);
    }
}
