//! Per-domain robots.txt policy cache

use crate::crawler::{FetchError, Fetcher};
use crate::robots::ParsedRobots;
use crate::url::{extract_domain, robots_url};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use url::Url;

/// Resolved crawl policy for one domain
#[derive(Debug, Clone)]
pub enum DomainPolicy {
    /// robots.txt was retrieved (or the server forbade reading it)
    Rules(Arc<ParsedRobots>),

    /// robots.txt could not be retrieved; treated as allow-all
    Unknown,
}

/// Thread-safe cache of robots.txt policies, keyed by domain
///
/// The first query for a domain fetches `<scheme>://<domain>/robots.txt`.
/// Results live for the whole process; there is no refresh. The map lock is
/// never held across the network request, so two workers asking about the
/// same new domain at once may both fetch it. The last result stored wins.
pub struct PolicyStore {
    fetcher: Arc<dyn Fetcher>,
    user_agent: String,
    policies: Mutex<HashMap<String, DomainPolicy>>,
}

impl PolicyStore {
    /// Creates an empty store
    ///
    /// # Arguments
    ///
    /// * `fetcher` - Used to retrieve robots.txt files
    /// * `user_agent` - Product token matched against robots.txt groups
    pub fn new(fetcher: Arc<dyn Fetcher>, user_agent: impl Into<String>) -> Self {
        Self {
            fetcher,
            user_agent: user_agent.into(),
            policies: Mutex::new(HashMap::new()),
        }
    }

    /// Returns whether `url` may be fetched
    ///
    /// Fails open: any problem retrieving the policy means "allowed".
    pub async fn allowed(&self, url: &Url) -> bool {
        let Some(domain) = extract_domain(url) else {
            return true;
        };

        match self.policy_for(url, &domain).await {
            DomainPolicy::Rules(robots) => robots.is_allowed(url.as_str(), &self.user_agent),
            DomainPolicy::Unknown => true,
        }
    }

    /// Returns the cached policy for the domain of `url`, resolving it first if needed
    pub async fn policy_for(&self, url: &Url, domain: &str) -> DomainPolicy {
        if let Some(policy) = self.cached(domain) {
            return policy;
        }

        let policy = self.resolve(url, domain).await;
        self.policies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(domain.to_string(), policy.clone());
        policy
    }

    /// Returns the cached policy for a domain without fetching
    pub fn cached(&self, domain: &str) -> Option<DomainPolicy> {
        self.policies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(domain)
            .cloned()
    }

    /// Returns the Crawl-delay declared for our agent, if the policy is cached
    pub fn crawl_delay(&self, domain: &str) -> Option<Duration> {
        match self.cached(domain)? {
            DomainPolicy::Rules(robots) => robots
                .crawl_delay(&self.user_agent)
                .and_then(|secs| Duration::try_from_secs_f64(secs).ok()),
            DomainPolicy::Unknown => None,
        }
    }

    /// Number of domains with a cached policy
    pub fn len(&self) -> usize {
        self.policies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    async fn resolve(&self, url: &Url, domain: &str) -> DomainPolicy {
        let Some(robots_url) = robots_url(url) else {
            return DomainPolicy::Unknown;
        };

        tracing::debug!("Fetching robots.txt for domain: {}", domain);
        match self.fetcher.fetch(&robots_url).await {
            Ok(body) => DomainPolicy::Rules(Arc::new(ParsedRobots::from_content(&body))),
            Err(FetchError::Status(status @ (401 | 403))) => {
                tracing::info!(
                    "robots.txt at {} answered HTTP {}, disallowing domain {}",
                    robots_url,
                    status,
                    domain
                );
                DomainPolicy::Rules(Arc::new(ParsedRobots::disallow_all()))
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to read robots.txt from {}: {} (assuming allowed)",
                    robots_url,
                    e
                );
                DomainPolicy::Unknown
            }
        }
    }
}
