//! URL handling module
//!
//! Input URLs are parsed exactly once and never rewritten afterwards; this
//! module validates them and derives the domain key used for rate limiting
//! and robots.txt caching.

mod domain;

pub use domain::{extract_domain, robots_url};

use crate::{UrlError, UrlResult};
use url::Url;

/// Parses one line of the input URL list
///
/// Only absolute `http` and `https` URLs with a host are accepted.
///
/// # Examples
///
/// ```
/// use targeted_crawler::url::parse_input_url;
///
/// assert!(parse_input_url("https://example.com/page").is_ok());
/// assert!(parse_input_url("ftp://example.com/file").is_err());
/// assert!(parse_input_url("/relative/path").is_err());
/// ```
pub fn parse_input_url(line: &str) -> UrlResult<Url> {
    let url = Url::parse(line.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingDomain);
    }

    Ok(url)
}
