use std::sync::Arc;

use pretty_assertions::assert_eq;
use url2md_engine::{FetchSettings, ReqwestFetcher, SitemapError, SitemapResolver};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn urlset(locations: &[String]) -> String {
    let entries: String = locations
        .iter()
        .map(|loc| format!("<url><loc>{loc}</loc></url>"))
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">{entries}</urlset>"#
    )
}

fn index(locations: &[String]) -> String {
    let entries: String = locations
        .iter()
        .map(|loc| format!("<sitemap><loc>{loc}</loc></sitemap>"))
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">{entries}</sitemapindex>"#
    )
}

async fn serve_xml(server: &MockServer, at: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(at))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "application/xml"))
        .mount(server)
        .await;
}

fn resolver() -> SitemapResolver {
    SitemapResolver::new(Arc::new(ReqwestFetcher::new(FetchSettings::default())))
}

#[tokio::test]
async fn index_expands_to_all_child_urls_in_order() {
    let server = MockServer::start().await;
    let base = server.uri();
    let posts: Vec<String> = (1..=3).map(|i| format!("{base}/blog/post-{i}")).collect();
    let pages: Vec<String> = (1..=3).map(|i| format!("{base}/docs/page-{i}")).collect();

    serve_xml(
        &server,
        "/sitemap.xml",
        index(&[format!("{base}/posts.xml"), format!("{base}/pages.xml")]),
    )
    .await;
    serve_xml(&server, "/posts.xml", urlset(&posts)).await;
    serve_xml(&server, "/pages.xml", urlset(&pages)).await;

    let urls = resolver()
        .resolve(&format!("{base}/sitemap.xml"), None)
        .await
        .unwrap();

    let expected: Vec<String> = posts.iter().chain(pages.iter()).cloned().collect();
    assert_eq!(urls, expected);
}

#[tokio::test]
async fn filter_keeps_only_matching_paths() {
    let server = MockServer::start().await;
    let base = server.uri();
    serve_xml(
        &server,
        "/sitemap.xml",
        urlset(&[
            format!("{base}/blog/a"),
            format!("{base}/about"),
            format!("{base}/blog/b"),
            format!("{base}/blogroll"),
        ]),
    )
    .await;

    let urls = resolver()
        .resolve(&format!("{base}/sitemap.xml"), Some("/blog/"))
        .await
        .unwrap();

    assert_eq!(urls, vec![format!("{base}/blog/a"), format!("{base}/blog/b")]);
}

#[tokio::test]
async fn self_referencing_index_terminates() {
    let server = MockServer::start().await;
    let base = server.uri();
    serve_xml(
        &server,
        "/sitemap.xml",
        index(&[format!("{base}/sitemap.xml"), format!("{base}/pages.xml")]),
    )
    .await;
    serve_xml(&server, "/pages.xml", urlset(&[format!("{base}/one")])).await;

    let urls = resolver()
        .resolve(&format!("{base}/sitemap.xml"), None)
        .await
        .unwrap();

    assert_eq!(urls, vec![format!("{base}/one")]);
}

#[tokio::test]
async fn failing_child_sitemap_is_skipped() {
    let server = MockServer::start().await;
    let base = server.uri();
    serve_xml(
        &server,
        "/sitemap.xml",
        index(&[format!("{base}/gone.xml"), format!("{base}/pages.xml")]),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/gone.xml"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    serve_xml(&server, "/pages.xml", urlset(&[format!("{base}/kept")])).await;

    let urls = resolver()
        .resolve(&format!("{base}/sitemap.xml"), None)
        .await
        .unwrap();

    assert_eq!(urls, vec![format!("{base}/kept")]);
}

#[tokio::test]
async fn failing_top_level_sitemap_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = resolver()
        .resolve(&format!("{}/sitemap.xml", server.uri()), None)
        .await
        .unwrap_err();

    assert!(matches!(err, SitemapError::Fetch { .. }), "got {err:?}");
}

#[tokio::test]
async fn malformed_top_level_sitemap_is_a_parse_error() {
    let server = MockServer::start().await;
    serve_xml(
        &server,
        "/sitemap.xml",
        "<urlset><url><loc>x</url></urlset>".to_string(),
    )
    .await;

    let err = resolver()
        .resolve(&format!("{}/sitemap.xml", server.uri()), None)
        .await
        .unwrap_err();

    assert!(matches!(err, SitemapError::Parse { .. }), "got {err:?}");
}
