//! End-to-end pipeline behaviour: spacing, completeness, failure handling

use crate::common::{create_test_config, hits, mount_page, read_records};
use std::sync::Arc;
use std::time::{Duration, Instant};
use targeted_crawler::config::Config;
use targeted_crawler::crawler::{Coordinator, HttpFetcher};
use targeted_crawler::extract::{ExtractedRecord, SelectorExtractor};
use targeted_crawler::output::{RunStatus, Sink, SinkError};
use targeted_crawler::CrawlerError;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn input(server: &MockServer, routes: &[&str]) -> String {
    routes
        .iter()
        .map(|route| format!("{}{}\n", server.uri(), route))
        .collect()
}

#[tokio::test]
async fn test_same_domain_fetches_are_spaced() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, "/1", "One").await;
    mount_page(&mock_server, "/2", "Two").await;

    let temp_dir = TempDir::new().unwrap();
    let output = temp_dir.path().join("out.txt");
    let mut config = create_test_config(&output);
    config.pipeline.fetch_workers = 1;
    config.timing.rate_limit_delay = 1.0;

    let start = Instant::now();
    let summary = Coordinator::new(config)
        .unwrap()
        .run(&input(&mock_server, &["/1", "/2"]))
        .await
        .unwrap();

    assert!(start.elapsed() >= Duration::from_secs(1));
    assert_eq!(summary.stats.records_written, 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_spacing_holds_with_many_workers_on_one_domain() {
    let mock_server = MockServer::start().await;
    let routes = ["/a", "/b", "/c", "/d"];
    for route in routes {
        mount_page(&mock_server, route, route).await;
    }

    let temp_dir = TempDir::new().unwrap();
    let output = temp_dir.path().join("out.txt");
    let mut config = create_test_config(&output);
    config.pipeline.fetch_workers = 4;
    config.timing.rate_limit_delay = 0.3;

    let start = Instant::now();
    Coordinator::new(config)
        .unwrap()
        .run(&input(&mock_server, &routes))
        .await
        .unwrap();

    // Four attempts on one domain need three full gaps, whatever the worker count
    assert!(start.elapsed() >= Duration::from_millis(900));
    assert_eq!(read_records(&output).len(), 4);
}

#[tokio::test]
async fn test_missing_field_writes_sentinel() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/untitled"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html><body>hi</body></html>"))
        .mount(&mock_server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let output = temp_dir.path().join("out.txt");

    let summary = Coordinator::new(create_test_config(&output))
        .unwrap()
        .run(&input(&mock_server, &["/untitled"]))
        .await
        .unwrap();

    let records = read_records(&output);
    assert_eq!(
        records,
        vec![(format!("{}/untitled", mock_server.uri()), "No Title".to_string())]
    );
    assert_eq!(summary.stats.extraction_failed, 1);
}

#[tokio::test]
async fn test_empty_input_completes_immediately() {
    let temp_dir = TempDir::new().unwrap();
    let output = temp_dir.path().join("out.txt");

    let summary = tokio::time::timeout(
        Duration::from_secs(2),
        Coordinator::new(create_test_config(&output)).unwrap().run("\n\n"),
    )
    .await
    .expect("empty run should not wait on anything")
    .unwrap();

    assert_eq!(summary.status, RunStatus::Completed);
    assert_eq!(summary.stats.records_written, 0);
    assert!(read_records(&output).is_empty());
}

#[tokio::test]
async fn test_one_failed_fetch_does_not_stop_the_rest() {
    let mock_server = MockServer::start().await;
    for route in ["/1", "/2", "/4", "/5"] {
        mount_page(&mock_server, route, route).await;
    }
    Mock::given(method("GET"))
        .and(path("/3"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&mock_server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let output = temp_dir.path().join("out.txt");

    let summary = Coordinator::new(create_test_config(&output))
        .unwrap()
        .run(&input(&mock_server, &["/1", "/2", "/3", "/4", "/5"]))
        .await
        .unwrap();

    assert_eq!(summary.status, RunStatus::Completed);
    assert_eq!(summary.stats.fetch_failed, 1);
    let urls: Vec<String> = read_records(&output).into_iter().map(|(url, _)| url).collect();
    assert_eq!(urls.len(), 4);
    assert!(!urls.contains(&format!("{}/3", mock_server.uri())));
}

#[tokio::test]
async fn test_fetch_timeout_is_a_skipped_url() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, "/fast", "Fast").await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<title>Slow</title>")
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&mock_server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let output = temp_dir.path().join("out.txt");
    let mut config = create_test_config(&output);
    config.timing.fetch_timeout = 0.5;

    let summary = Coordinator::new(config)
        .unwrap()
        .run(&input(&mock_server, &["/slow", "/fast"]))
        .await
        .unwrap();

    assert_eq!(summary.stats.fetch_failed, 1);
    assert_eq!(
        read_records(&output),
        vec![(format!("{}/fast", mock_server.uri()), "Fast".to_string())]
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_every_url_fetched_once_and_recorded_once() {
    let servers = vec![
        MockServer::start().await,
        MockServer::start().await,
        MockServer::start().await,
    ];
    let mut lines = String::new();
    let mut expected = Vec::new();
    for (s, server) in servers.iter().enumerate() {
        for p in 0..6 {
            let route = format!("/page{}", p);
            let title = format!("S{}P{}", s, p);
            mount_page(server, &route, &title).await;
            let url = format!("{}{}", server.uri(), route);
            lines.push_str(&format!("{}\n", url));
            expected.push((url, title));
        }
    }
    // Repeat the whole list; the repeats must not cause refetches
    let input = format!("{}{}", lines, lines);

    let temp_dir = TempDir::new().unwrap();
    let output = temp_dir.path().join("out.txt");
    let mut config = create_test_config(&output);
    config.pipeline.fetch_workers = 5;
    config.pipeline.extraction_workers = 3;
    config.pipeline.queue_capacity = 2;

    let summary = Coordinator::new(config).unwrap().run(&input).await.unwrap();

    expected.sort();
    assert_eq!(read_records(&output), expected);
    assert_eq!(summary.stats.fetched, 18);
    assert_eq!(summary.stats.records_written, 18);
    assert_eq!(summary.stats.duplicates, 18);
    assert_eq!(summary.stats.dropped, 0);
    assert_eq!(summary.domains, 3);

    for server in &servers {
        for p in 0..6 {
            assert_eq!(hits(server, &format!("/page{}", p)).await, 1);
        }
    }
}

#[tokio::test]
async fn test_records_are_appended_to_existing_output() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, "/new", "New").await;

    let temp_dir = TempDir::new().unwrap();
    let output = temp_dir.path().join("out.txt");
    std::fs::write(&output, "http://old.test/\tOld\n").unwrap();

    Coordinator::new(create_test_config(&output))
        .unwrap()
        .run(&input(&mock_server, &["/new"]))
        .await
        .unwrap();

    let content = std::fs::read_to_string(&output).unwrap();
    assert_eq!(
        content,
        format!("http://old.test/\tOld\n{}/new\tNew\n", mock_server.uri())
    );
}

#[tokio::test]
async fn test_markdown_report_written_after_run() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, "/1", "One").await;

    let temp_dir = TempDir::new().unwrap();
    let output = temp_dir.path().join("out.txt");
    let report = temp_dir.path().join("report.md");
    let mut config = create_test_config(&output);
    config.output.report_path = Some(report.clone());

    Coordinator::new(config)
        .unwrap()
        .with_config_hash("deadbeef")
        .run(&input(&mock_server, &["/1"]))
        .await
        .unwrap();

    let markdown = std::fs::read_to_string(&report).unwrap();
    assert!(markdown.contains("- **Status**: completed"));
    assert!(markdown.contains("- **Config Hash**: deadbeef"));
    assert!(markdown.contains("| Fetched | 1 |"));
}

#[tokio::test]
async fn test_unwritable_output_is_a_setup_failure() {
    let temp_dir = TempDir::new().unwrap();
    let output = temp_dir.path().join("missing-dir").join("out.txt");

    let result = Coordinator::new(create_test_config(&output));
    assert!(matches!(result, Err(CrawlerError::Io(_))));
}

/// Accepts `limit` records, then fails every write
struct BrokenSink {
    written: std::sync::Mutex<usize>,
    limit: usize,
}

impl Sink for BrokenSink {
    fn append(&self, _record: &ExtractedRecord) -> Result<(), SinkError> {
        let mut written = self.written.lock().unwrap();
        if *written >= self.limit {
            return Err(SinkError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "no space left on device",
            )));
        }
        *written += 1;
        Ok(())
    }
}

#[tokio::test]
async fn test_sink_failure_aborts_the_run() {
    let mock_server = MockServer::start().await;
    let routes: Vec<String> = (0..10).map(|i| format!("/{}", i)).collect();
    for route in &routes {
        Mock::given(method("GET"))
            .and(path(route.as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_string("<title>T</title>"))
            .mount(&mock_server)
            .await;
    }
    let route_refs: Vec<&str> = routes.iter().map(String::as_str).collect();

    let temp_dir = TempDir::new().unwrap();
    let config: Config = create_test_config(&temp_dir.path().join("unused.txt"));
    let fetcher = HttpFetcher::from_config(&config.user_agent, Duration::from_secs(2)).unwrap();
    let sink = Arc::new(BrokenSink {
        written: std::sync::Mutex::new(0),
        limit: 1,
    });

    let coordinator = Coordinator::with_parts(
        config,
        Arc::new(fetcher),
        Arc::new(SelectorExtractor::new("title").unwrap()),
        sink.clone(),
    )
    .unwrap();

    let result = tokio::time::timeout(
        Duration::from_secs(10),
        coordinator.run(&input(&mock_server, &route_refs)),
    )
    .await
    .expect("aborted run must still terminate");

    assert!(matches!(result, Err(CrawlerError::SinkWrite(_))));
    assert_eq!(*sink.written.lock().unwrap(), 1);
}
