//! Shared helpers for the integration tests

use std::path::Path;
use targeted_crawler::config::{Config, UserAgentConfig};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const AGENT: &str = "targeted-crawler";

/// Creates a fast test configuration writing records to `output`
pub fn create_test_config(output: &Path) -> Config {
    let mut config = Config::default();
    config.pipeline.fetch_workers = 4;
    config.pipeline.extraction_workers = 2;
    config.timing.rate_limit_delay = 0.0;
    config.timing.fetch_timeout = 2.0;
    config.timing.extraction_idle_timeout = 0.5;
    config.user_agent = UserAgentConfig {
        crawler_name: AGENT.to_string(),
        crawler_version: "1.0.0".to_string(),
        contact_url: None,
    };
    config.output.path = output.to_path_buf();
    config
}

/// Serves an HTML page with the given title at `route`
pub async fn mount_page(server: &MockServer, route: &str, title: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(format!(
                    "<html><head><title>{}</title></head><body></body></html>",
                    title
                ))
                .insert_header("content-type", "text/html"),
        )
        .expect(1)
        .mount(server)
        .await;
}

/// Serves robots.txt with `body`
pub async fn mount_robots(server: &MockServer, body: &str) {
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

/// Reads the record file as `(url, field)` pairs, sorted
pub fn read_records(output: &Path) -> Vec<(String, String)> {
    let content = std::fs::read_to_string(output).unwrap_or_default();
    let mut records: Vec<(String, String)> = content
        .lines()
        .map(|line| {
            let (url, field) = line.split_once('\t').expect("record without a tab");
            (url.to_string(), field.to_string())
        })
        .collect();
    records.sort();
    records
}

/// Number of requests the server saw for `route`
pub async fn hits(server: &MockServer, route: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|request| request.url.path() == route)
        .count()
}
