//! Robots.txt handling module
//!
//! This module provides parsing of robots.txt files and a per-domain policy
//! store that fetches each domain's file once and answers `allowed(url)`
//! checks for the rest of the run.

mod parser;
mod store;

pub use parser::{ParsedRobots, MAX_CRAWL_DELAY_SECS};
pub use store::{DomainPolicy, PolicyStore};
