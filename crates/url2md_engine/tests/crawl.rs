use std::sync::Once;
use std::time::Duration;

use pretty_assertions::assert_eq;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use url::Url;
use url2md_engine::{CrawlError, CrawlOptions, CrawlOrchestrator, EngineConfig, PageConverter};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn page(title: &str, links: &[&str]) -> String {
    let anchors: String = links
        .iter()
        .map(|href| format!(r#"<li><a href="{href}">{href}</a></li>"#))
        .collect();
    format!("<html><head><title>{title}</title></head><body><h1>{title}</h1><p>Body of {title}.</p><ul>{anchors}</ul></body></html>")
}

async fn serve_page(server: &MockServer, at: &str, html: String) {
    Mock::given(method("GET"))
        .and(path(at))
        .respond_with(ResponseTemplate::new(200).set_body_raw(html, "text/html"))
        .mount(server)
        .await;
}

/// `/docs` links to two pages in scope, one outside the path and one on another host.
async fn docs_site() -> MockServer {
    let server = MockServer::start().await;
    serve_page(
        &server,
        "/docs",
        page(
            "Docs Home",
            &["/docs/a", "/docs/b", "/about", "/docs2/x", "https://elsewhere.example/docs/c"],
        ),
    )
    .await;
    serve_page(&server, "/docs/a", page("Page A", &["/docs/a/deep", "/docs/b#usage"])).await;
    serve_page(&server, "/docs/b", page("Page B", &["/docs"])).await;
    serve_page(&server, "/docs/a/deep", page("Deep Page", &[])).await;
    server
}

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(engine_logging::initialize_for_tests);
}

fn orchestrator(output: &TempDir, options: CrawlOptions) -> CrawlOrchestrator {
    init_logging();
    let config = EngineConfig::default_with_output(output.path()).with_fixed_clock("2024-05-01 10:00:00");
    CrawlOrchestrator::new(PageConverter::new(config), options)
}

fn options(max_depth: usize, max_urls: usize) -> CrawlOptions {
    CrawlOptions {
        max_depth,
        max_urls,
        delay: Duration::ZERO,
        continue_on_error: true,
    }
}

fn written_files(output: &TempDir, host_dir: &str) -> Vec<String> {
    let mut names: Vec<String> = walk(&output.path().join(host_dir))
        .into_iter()
        .map(|p| {
            p.strip_prefix(output.path().join(host_dir))
                .unwrap()
                .to_string_lossy()
                .replace('\\', "/")
        })
        .collect();
    names.sort();
    names
}

fn walk(dir: &std::path::Path) -> Vec<std::path::PathBuf> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).unwrap() {
        let path = entry.unwrap().path();
        if path.is_dir() {
            files.extend(walk(&path));
        } else {
            files.push(path);
        }
    }
    files
}

fn host_dir(server: &MockServer) -> String {
    let uri = Url::parse(&server.uri()).unwrap();
    format!("127.0.0.1_{}", uri.port().unwrap())
}

#[tokio::test]
async fn depth_one_crawl_stays_under_the_seed_path() {
    let server = docs_site().await;
    let temp = TempDir::new().unwrap();
    let seed = Url::parse(&format!("{}/docs", server.uri())).unwrap();

    let stats = orchestrator(&temp, options(1, 0))
        .crawl_by_path(&seed)
        .await
        .unwrap();

    assert_eq!(stats.total, 3);
    assert_eq!(stats.successful, 3);
    assert_eq!(stats.failed, 0);
    assert!(!stats.interrupted);
    assert_eq!(
        written_files(&temp, &host_dir(&server)),
        vec!["docs-home.md", "docs/page-a.md", "docs/page-b.md"]
    );
}

#[tokio::test]
async fn unlimited_depth_follows_every_in_scope_link_once() {
    let server = docs_site().await;
    let temp = TempDir::new().unwrap();
    let seed = Url::parse(&format!("{}/docs/", server.uri())).unwrap();

    let stats = orchestrator(&temp, options(0, 0))
        .crawl_by_path(&seed)
        .await
        .unwrap();

    assert_eq!(stats.total, 4);
    assert_eq!(stats.successful, 4);
    assert_eq!(
        written_files(&temp, &host_dir(&server)),
        vec![
            "docs-home.md",
            "docs/a/deep-page.md",
            "docs/page-a.md",
            "docs/page-b.md"
        ]
    );
}

#[tokio::test]
async fn max_urls_caps_attempted_pages() {
    let server = docs_site().await;
    let temp = TempDir::new().unwrap();
    let seed = Url::parse(&format!("{}/docs", server.uri())).unwrap();

    let stats = orchestrator(&temp, options(0, 2))
        .crawl_by_path(&seed)
        .await
        .unwrap();

    assert_eq!(stats.total, 2);
    assert_eq!(stats.successful, 2);
}

#[tokio::test]
async fn failing_pages_are_recorded_and_the_crawl_continues() {
    let server = MockServer::start().await;
    serve_page(&server, "/docs", page("Docs Home", &["/docs/missing", "/docs/ok"])).await;
    serve_page(&server, "/docs/ok", page("Fine Page", &[])).await;
    Mock::given(method("GET"))
        .and(path("/docs/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    let temp = TempDir::new().unwrap();
    let seed = Url::parse(&format!("{}/docs", server.uri())).unwrap();

    let stats = orchestrator(&temp, options(1, 0))
        .crawl_by_path(&seed)
        .await
        .unwrap();

    assert_eq!(stats.total, 3);
    assert_eq!(stats.successful, 2);
    assert_eq!(stats.failed, 1);
    assert_eq!(stats.failures[0].url, format!("{}/docs/missing", server.uri()));
    assert!(stats.failures[0].reason.contains("404"));
}

#[tokio::test]
async fn stop_on_error_aborts_with_partial_stats() {
    let server = MockServer::start().await;
    serve_page(&server, "/docs", page("Docs Home", &["/docs/missing", "/docs/ok"])).await;
    serve_page(&server, "/docs/ok", page("Fine Page", &[])).await;
    Mock::given(method("GET"))
        .and(path("/docs/missing"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    let temp = TempDir::new().unwrap();
    let seed = Url::parse(&format!("{}/docs", server.uri())).unwrap();
    let options = CrawlOptions {
        continue_on_error: false,
        ..options(1, 0)
    };

    let err = orchestrator(&temp, options)
        .crawl_by_path(&seed)
        .await
        .unwrap_err();

    let CrawlError::Aborted { url, .. } = &err;
    assert_eq!(url, &format!("{}/docs/missing", server.uri()));
    assert_eq!(err.stats().successful, 1);
    assert_eq!(err.stats().failed, 1);
    assert_eq!(
        written_files(&temp, &host_dir(&server)),
        vec!["docs-home.md"]
    );
}

#[tokio::test]
async fn batch_processes_every_url_in_order() {
    let server = docs_site().await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    let temp = TempDir::new().unwrap();
    let urls: Vec<Url> = ["/docs/a", "/broken", "/docs/b"]
        .iter()
        .map(|p| Url::parse(&format!("{}{p}", server.uri())).unwrap())
        .collect();

    let stats = orchestrator(&temp, options(1, 0))
        .process_batch(&urls)
        .await
        .unwrap();

    assert_eq!(stats.total, 3);
    assert_eq!(stats.successful, 2);
    assert_eq!(stats.failed, 1);
    assert_eq!(stats.failures[0].url, urls[1].as_str());
    assert_eq!(
        written_files(&temp, &host_dir(&server)),
        vec!["docs/page-a.md", "docs/page-b.md"]
    );
}

#[tokio::test]
async fn cancelled_token_stops_before_the_first_fetch() {
    let server = docs_site().await;
    let temp = TempDir::new().unwrap();
    let cancel = CancellationToken::new();
    cancel.cancel();
    let urls = vec![Url::parse(&format!("{}/docs/a", server.uri())).unwrap()];

    let stats = orchestrator(&temp, options(1, 0))
        .with_cancellation(cancel)
        .process_batch(&urls)
        .await
        .unwrap();

    assert!(stats.interrupted);
    assert_eq!(stats.successful, 0);
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn cancellation_interrupts_the_pause_between_requests() {
    let server = docs_site().await;
    let temp = TempDir::new().unwrap();
    let seed = Url::parse(&format!("{}/docs", server.uri())).unwrap();
    let options = CrawlOptions {
        delay: Duration::from_secs(30),
        ..options(1, 0)
    };
    let crawler = orchestrator(&temp, options);
    let cancel = crawler.cancellation_token();

    let trigger = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        cancel.cancel();
    });
    let stats = tokio::time::timeout(Duration::from_secs(10), crawler.crawl_by_path(&seed))
        .await
        .expect("crawl should stop once cancelled")
        .unwrap();
    trigger.await.unwrap();

    assert!(stats.interrupted);
    assert_eq!(stats.total, 1);
    assert_eq!(stats.successful, 1);
}
