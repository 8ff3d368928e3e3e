//! Robots.txt rule evaluation
//!
//! Matching is delegated to the robotstxt crate; only the Crawl-delay
//! extension, which that crate does not expose, is parsed here.

use robotstxt::DefaultMatcher;

/// Longest Crawl-delay honoured, in seconds; larger values are clamped
pub const MAX_CRAWL_DELAY_SECS: f64 = 300.0;

/// Parsed robots.txt data for one domain
#[derive(Debug, Clone)]
pub struct ParsedRobots {
    /// Raw robots.txt body
    content: String,
    rule: Rule,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rule {
    DisallowAll,
    Content,
}

impl ParsedRobots {
    /// Creates a ParsedRobots from a raw robots.txt body
    pub fn from_content(content: &str) -> Self {
        Self {
            content: content.to_string(),
            rule: Rule::Content,
        }
    }

    /// A policy that blocks every path
    ///
    /// Used when the server answers the robots.txt request with 401 or 403.
    pub fn disallow_all() -> Self {
        Self {
            content: String::new(),
            rule: Rule::DisallowAll,
        }
    }

    /// Checks if a URL is allowed for the given user agent
    ///
    /// # Arguments
    ///
    /// * `url` - The absolute URL to check
    /// * `user_agent` - The crawler's product token (e.g. "targeted-crawler");
    ///   the `User-agent: *` group applies when no group names it
    pub fn is_allowed(&self, url: &str, user_agent: &str) -> bool {
        match self.rule {
            Rule::DisallowAll => false,
            Rule::Content if self.content.trim().is_empty() => true,
            Rule::Content => {
                let mut matcher = DefaultMatcher::default();
                matcher.one_agent_allowed_by_robots(&self.content, user_agent, url)
            }
        }
    }

    /// Gets the Crawl-delay in seconds for a user agent
    ///
    /// A group naming the agent wins over the `*` group. The result is
    /// clamped to [`MAX_CRAWL_DELAY_SECS`].
    pub fn crawl_delay(&self, user_agent: &str) -> Option<f64> {
        if self.rule != Rule::Content {
            return None;
        }

        let agent = user_agent.to_lowercase();
        let mut group: Vec<String> = Vec::new();
        // Consecutive User-agent lines form one group; any other directive closes it
        let mut in_agent_lines = false;
        let mut wildcard_delay: Option<f64> = None;
        let mut agent_delay: Option<f64> = None;

        for line in self.content.lines() {
            let line = line.split('#').next().unwrap_or("").trim();
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let key = key.trim().to_lowercase();
            let value = value.trim();

            if key == "user-agent" {
                if !in_agent_lines {
                    group.clear();
                }
                if !value.is_empty() {
                    group.push(value.to_lowercase());
                }
                in_agent_lines = true;
                continue;
            }
            in_agent_lines = false;

            if key != "crawl-delay" {
                continue;
            }
            let Ok(delay) = value.parse::<f64>() else {
                continue;
            };
            if !delay.is_finite() || delay < 0.0 {
                continue;
            }

            if group.iter().any(|ua| ua != "*" && agent.contains(ua.as_str())) {
                agent_delay.get_or_insert(delay);
            } else if group.iter().any(|ua| ua == "*") {
                wildcard_delay.get_or_insert(delay);
            }
        }

        agent_delay
            .or(wildcard_delay)
            .map(|delay| delay.min(MAX_CRAWL_DELAY_SECS))
    }
}
