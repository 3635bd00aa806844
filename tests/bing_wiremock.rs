use std::sync::atomic::AtomicBool;
use std::time::Duration;

use hof_harness::evidence::{self, NARRATIVE_PREAMBLE};
use hof_harness::search::{BingWebSearchAdapter, SearchError, SearchProvider, SearchQuery};
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn adapter(server: &MockServer) -> BingWebSearchAdapter {
    BingWebSearchAdapter::with_config("test-key", server.uri(), Duration::from_secs(5)).unwrap()
}

fn web_pages(pages: &[(&str, &str, &str)]) -> serde_json::Value {
    let value: Vec<_> = pages
        .iter()
        .map(|(name, snippet, url)| json!({ "name": name, "snippet": snippet, "url": url }))
        .collect();
    json!({ "_type": "SearchResponse", "webPages": { "value": value } })
}

#[tokio::test]
async fn sends_key_and_query_and_parses_hits() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(header("Ocp-Apim-Subscription-Key", "test-key"))
        .and(query_param("q", "baseball hall of fame Mike Trout"))
        .and(query_param("count", "8"))
        .respond_with(ResponseTemplate::new(200).set_body_json(web_pages(&[
            ("Mike Trout Stats", "Career totals", "https://example.com/trout"),
            ("Trout and Cooperstown", "A future inductee", "https://example.com/hof"),
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let hits = adapter(&server)
        .search(&evidence::evidence_query("Mike Trout"))
        .await
        .unwrap();
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].title, "Mike Trout Stats");
    assert_eq!(hits[1].url, "https://example.com/hof");
}

#[tokio::test]
async fn missing_web_pages_is_an_empty_result() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "_type": "SearchResponse" })))
        .mount(&server)
        .await;

    let hits = adapter(&server)
        .search(&SearchQuery::new("baseball hall of fame Nobody", 8))
        .await
        .unwrap();
    assert!(hits.is_empty());
}

#[tokio::test]
async fn hits_are_truncated_to_requested_count() {
    let server = MockServer::start().await;
    let pages: Vec<(String, String, String)> = (1..=5)
        .map(|i| (format!("T{i}"), format!("S{i}"), format!("http://x/{i}")))
        .collect();
    let borrowed: Vec<(&str, &str, &str)> = pages
        .iter()
        .map(|(a, b, c)| (a.as_str(), b.as_str(), c.as_str()))
        .collect();
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(web_pages(&borrowed)))
        .mount(&server)
        .await;

    let hits = adapter(&server)
        .search(&SearchQuery::new("q", 3))
        .await
        .unwrap();
    let titles: Vec<&str> = hits.iter().map(|h| h.title.as_str()).collect();
    assert_eq!(titles, vec!["T1", "T2", "T3"]);
}

#[tokio::test]
async fn unauthorized_maps_to_provider_error_with_context() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(
            ResponseTemplate::new(401)
                .insert_header("BingAPIs-TraceId", "trace-123")
                .set_body_json(json!({
                    "error": { "code": "401", "message": "Access denied due to invalid subscription key." }
                })),
        )
        .mount(&server)
        .await;

    let err = adapter(&server)
        .search(&SearchQuery::new("q", 8))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "provider_error");
    assert_eq!(err.request_id(), Some("trace-123"));
    let ctx = err.context().unwrap();
    assert_eq!(ctx.http_status, Some(401));
    assert_eq!(ctx.provider_code.as_deref(), Some("401"));
    assert!(err.to_string().contains("invalid subscription key"));
}

#[tokio::test]
async fn errors_array_and_bare_status_are_both_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "array"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "_type": "ErrorResponse",
            "errors": [{ "code": "InvalidRequest", "message": "Parameter has invalid value." }]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "bare"))
        .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
        .mount(&server)
        .await;

    let bing = adapter(&server);
    let err = bing.search(&SearchQuery::new("array", 8)).await.unwrap_err();
    assert_eq!(
        err.context().and_then(|c| c.provider_code.as_deref()),
        Some("InvalidRequest")
    );

    let err = bing.search(&SearchQuery::new("bare", 8)).await.unwrap_err();
    assert!(matches!(err, SearchError::Provider { .. }));
    assert_eq!(err.context().and_then(|c| c.http_status), Some(503));
    assert!(err.to_string().contains("HTTP 503"));
}

#[tokio::test]
async fn gather_evidence_numbers_bing_results() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "baseball hall of fame Mike Trout"))
        .respond_with(ResponseTemplate::new(200).set_body_json(web_pages(&[
            ("A", "snip A", "http://a"),
            ("B", "snip B", "http://b"),
        ])))
        .mount(&server)
        .await;

    let bing = adapter(&server);
    let report = evidence::gather_evidence(&bing, "Mike Trout", Duration::from_secs(5), None)
        .await
        .unwrap();
    assert_eq!(
        report.citations_text(),
        "[1]: \"A: snip A\"\nURL: http://a\n\n[2]: \"B: snip B\"\nURL: http://b\n\n"
    );
    assert_eq!(report.footnotes, "[1]: A: http://a  \n[2]: B: http://b  \n");
}

#[tokio::test]
async fn gather_evidence_with_no_results_is_not_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(web_pages(&[])))
        .mount(&server)
        .await;

    let report = evidence::gather_evidence(&adapter(&server), "Nobody", Duration::from_secs(5), None)
        .await
        .unwrap();
    assert!(report.is_empty());
    assert_eq!(report.narrative, NARRATIVE_PREAMBLE);
    assert_eq!(report.footnotes, "");
}

#[tokio::test]
async fn gather_evidence_times_out_on_slow_provider() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(web_pages(&[]))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let err = evidence::gather_evidence(
        &adapter(&server),
        "Mike Trout",
        Duration::from_millis(100),
        None,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, SearchError::Timeout(_)));
}

#[tokio::test]
async fn gather_evidence_skips_request_when_cancelled() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(web_pages(&[])))
        .expect(0)
        .mount(&server)
        .await;

    let cancel = AtomicBool::new(true);
    let err = evidence::gather_evidence(
        &adapter(&server),
        "Mike Trout",
        Duration::from_secs(5),
        Some(&cancel),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, SearchError::Cancelled));
}

#[test]
fn empty_key_is_rejected() {
    let err = BingWebSearchAdapter::with_config("  ", "http://localhost", Duration::from_secs(1))
        .unwrap_err();
    assert!(matches!(err, SearchError::Config(_)));
}
