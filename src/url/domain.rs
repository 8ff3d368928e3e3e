use url::Url;

/// Extracts the domain key from a URL
///
/// The key is the lowercase host, followed by `:port` when the URL carries an
/// explicit non-default port. Two servers on the same host but different
/// ports are rate limited and policy-checked independently.
///
/// # Returns
///
/// * `Some(String)` - The domain key
/// * `None` - If the URL has no host
///
/// # Examples
///
/// ```
/// use url::Url;
/// use targeted_crawler::url::extract_domain;
///
/// let url = Url::parse("https://EXAMPLE.COM/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
///
/// let url = Url::parse("http://127.0.0.1:8080/").unwrap();
/// assert_eq!(extract_domain(&url), Some("127.0.0.1:8080".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_lowercase();
    match url.port() {
        Some(port) => Some(format!("{}:{}", host, port)),
        None => Some(host),
    }
}

/// Builds the robots.txt URL for the origin of `url`
///
/// Scheme, host and port are kept; path, query and fragment are replaced.
pub fn robots_url(url: &Url) -> Option<Url> {
    url.join("/robots.txt").ok()
}
