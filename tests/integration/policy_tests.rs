//! robots.txt handling through the full pipeline

use crate::common::{create_test_config, hits, mount_page, mount_robots, read_records};
use std::time::{Duration, Instant};
use targeted_crawler::crawler::Coordinator;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_forbidden_page(server: &MockServer, route: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_string("<title>Secret</title>"))
        .expect(0)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_disallow_all_skips_domain() {
    let mock_server = MockServer::start().await;
    mount_robots(&mock_server, "User-agent: *\nDisallow: /").await;
    mount_forbidden_page(&mock_server, "/x").await;

    let temp_dir = TempDir::new().unwrap();
    let output = temp_dir.path().join("out.txt");

    let summary = Coordinator::new(create_test_config(&output))
        .unwrap()
        .run(&format!("{}/x\n", mock_server.uri()))
        .await
        .unwrap();

    assert_eq!(summary.stats.skipped_by_policy, 1);
    assert_eq!(summary.stats.fetched, 0);
    assert!(read_records(&output).is_empty());
}

#[tokio::test]
async fn test_unreadable_robots_fails_open() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;
    mount_page(&mock_server, "/page", "Reachable").await;

    let temp_dir = TempDir::new().unwrap();
    let output = temp_dir.path().join("out.txt");

    Coordinator::new(create_test_config(&output))
        .unwrap()
        .run(&format!("{}/page\n", mock_server.uri()))
        .await
        .unwrap();

    assert_eq!(
        read_records(&output),
        vec![(format!("{}/page", mock_server.uri()), "Reachable".to_string())]
    );
}

#[tokio::test]
async fn test_robots_timeout_fails_open() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("User-agent: *\nDisallow: /")
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&mock_server)
        .await;
    mount_page(&mock_server, "/page", "Reachable").await;

    let temp_dir = TempDir::new().unwrap();
    let output = temp_dir.path().join("out.txt");
    let mut config = create_test_config(&output);
    config.timing.fetch_timeout = 0.5;

    let summary = Coordinator::new(config)
        .unwrap()
        .run(&format!("{}/page\n", mock_server.uri()))
        .await
        .unwrap();

    assert_eq!(summary.stats.skipped_by_policy, 0);
    assert_eq!(summary.stats.records_written, 1);
}

#[tokio::test]
async fn test_forbidden_robots_disallows_all() {
    for status in [401, 403] {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/robots.txt"))
            .respond_with(ResponseTemplate::new(status))
            .mount(&mock_server)
            .await;
        mount_forbidden_page(&mock_server, "/page").await;

        let temp_dir = TempDir::new().unwrap();
        let output = temp_dir.path().join("out.txt");

        let summary = Coordinator::new(create_test_config(&output))
            .unwrap()
            .run(&format!("{}/page\n", mock_server.uri()))
            .await
            .unwrap();

        assert_eq!(summary.stats.skipped_by_policy, 1, "status {}", status);
        assert!(read_records(&output).is_empty());
    }
}

#[tokio::test]
async fn test_agent_specific_group_applies() {
    let mock_server = MockServer::start().await;
    mount_robots(
        &mock_server,
        "User-agent: targeted-crawler\nDisallow: /private\n\nUser-agent: *\nDisallow: /",
    )
    .await;
    mount_page(&mock_server, "/public", "Public").await;
    mount_forbidden_page(&mock_server, "/private").await;

    let temp_dir = TempDir::new().unwrap();
    let output = temp_dir.path().join("out.txt");
    let input = format!("{0}/public\n{0}/private\n", mock_server.uri());

    let summary = Coordinator::new(create_test_config(&output))
        .unwrap()
        .run(&input)
        .await
        .unwrap();

    assert_eq!(summary.stats.skipped_by_policy, 1);
    assert_eq!(
        read_records(&output),
        vec![(format!("{}/public", mock_server.uri()), "Public".to_string())]
    );
}

#[tokio::test]
async fn test_robots_fetched_once_per_domain() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .and(header("user-agent", "targeted-crawler/1.0.0"))
        .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: *\nAllow: /"))
        .expect(1)
        .mount(&mock_server)
        .await;
    let routes = ["/1", "/2", "/3", "/4", "/5"];
    for route in routes {
        mount_page(&mock_server, route, route).await;
    }

    let temp_dir = TempDir::new().unwrap();
    let output = temp_dir.path().join("out.txt");
    let mut config = create_test_config(&output);
    // A single worker asks about the domain first, alone
    config.pipeline.fetch_workers = 1;
    let input: String = routes
        .iter()
        .map(|route| format!("{}{}\n", mock_server.uri(), route))
        .collect();

    Coordinator::new(config).unwrap().run(&input).await.unwrap();

    assert_eq!(hits(&mock_server, "/robots.txt").await, 1);
    assert_eq!(read_records(&output).len(), 5);
}

#[tokio::test]
async fn test_crawl_delay_raises_spacing() {
    let mock_server = MockServer::start().await;
    mount_robots(&mock_server, "User-agent: *\nCrawl-delay: 1\nAllow: /").await;
    mount_page(&mock_server, "/1", "One").await;
    mount_page(&mock_server, "/2", "Two").await;

    let temp_dir = TempDir::new().unwrap();
    let output = temp_dir.path().join("out.txt");
    let mut config = create_test_config(&output);
    config.pipeline.fetch_workers = 2;
    config.timing.rate_limit_delay = 0.0;

    let start = Instant::now();
    Coordinator::new(config)
        .unwrap()
        .run(&format!("{0}/1\n{0}/2\n", mock_server.uri()))
        .await
        .unwrap();

    assert!(start.elapsed() >= Duration::from_secs(1));
    assert_eq!(read_records(&output).len(), 2);
}

#[tokio::test]
async fn test_crawl_delay_ignored_when_disabled() {
    let mock_server = MockServer::start().await;
    mount_robots(&mock_server, "User-agent: *\nCrawl-delay: 5\nAllow: /").await;
    mount_page(&mock_server, "/1", "One").await;
    mount_page(&mock_server, "/2", "Two").await;

    let temp_dir = TempDir::new().unwrap();
    let output = temp_dir.path().join("out.txt");
    let mut config = create_test_config(&output);
    config.timing.rate_limit_delay = 0.0;
    config.timing.respect_crawl_delay = false;

    let start = Instant::now();
    Coordinator::new(config)
        .unwrap()
        .run(&format!("{0}/1\n{0}/2\n", mock_server.uri()))
        .await
        .unwrap();

    assert!(start.elapsed() < Duration::from_secs(5));
    assert_eq!(read_records(&output).len(), 2);
}
