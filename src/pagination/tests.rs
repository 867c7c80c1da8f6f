//! Tests for pagination module

use super::*;
use crate::error::Error;
use crate::http::{HttpClient, HttpClientConfig};
use crate::types::{Record, ResourceKind};
use async_trait::async_trait;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;
use test_case::test_case;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn record(id: u32) -> Record {
    json!({ "id": id }).as_object().cloned().unwrap()
}

fn ids(items: &[Record]) -> Vec<u64> {
    items.iter().map(|r| r["id"].as_u64().unwrap()).collect()
}

// ============================================================================
// Link Header Parsing
// ============================================================================

const GITHUB_LINK: &str = "<https://api.github.com/repositories/1/contributors?per_page=100&anon=1&page=2>; rel=\"next\", \
     <https://api.github.com/repositories/1/contributors?per_page=100&anon=1&page=7>; rel=\"last\"";

#[test]
fn test_parse_link_header_elements() {
    let links = parse_link_header(GITHUB_LINK);
    assert_eq!(links.len(), 2);

    assert!(links[0].has_rel("next"));
    assert_eq!(links[0].page.as_deref(), Some("2"));

    assert!(links[1].has_rel("last"));
    assert_eq!(links[1].page_number(), Some(7));
    assert!(links[1].url.starts_with("https://api.github.com/"));
}

#[test]
fn test_parse_page_count_absent_header() {
    assert_eq!(parse_page_count(None).unwrap(), PageCount::SINGLE);
}

#[test_case("<https://api.example.com/repos/o/r/contributors?page=3>; rel=\"last\"", 3 ; "single last element")]
#[test_case(GITHUB_LINK, 7 ; "github next and last")]
#[test_case("<https://x/a?page=1>; rel=\"prev\", <https://x/a?page=1>; rel=\"first\", <https://x/a?page=12>; rel=\"last\"", 12 ; "last after prev and first")]
#[test_case("<https://x/a?page=40&per_page=5>; rel=last", 40 ; "unquoted rel")]
#[test_case("<https://x/a?per_page=50&page=9>; REL=\"LAST\"", 9 ; "case insensitive rel")]
#[test_case("</a?page=5>; rel=\"next last\"", 5 ; "relative url with rel list")]
fn test_parse_page_count(header: &str, expected: u32) {
    assert_eq!(parse_page_count(Some(header)).unwrap().get(), expected);
}

#[test_case("<https://x/a?page=2>; rel=\"next\"" ; "no last element")]
#[test_case("<https://x/a?per_page=100>; rel=\"last\"" ; "per_page is not page")]
#[test_case("<https://x/a?page=abc>; rel=\"last\"" ; "non numeric page")]
#[test_case("<https://x/a?page=0>; rel=\"last\"" ; "zero page")]
#[test_case("garbage" ; "no elements")]
fn test_parse_page_count_rejects(header: &str) {
    let err = parse_page_count(Some(header)).unwrap_err();
    assert!(matches!(err, Error::LinkParse { .. }), "got {err:?}");
}

#[test]
fn test_last_page_url() {
    assert_eq!(
        last_page_url(GITHUB_LINK).unwrap(),
        "https://api.github.com/repositories/1/contributors?per_page=100&anon=1&page=7"
    );
    assert!(last_page_url("<https://x/?page=2>; rel=\"next\"").is_err());
}

#[test]
fn test_page_count_indices() {
    let count = PageCount::new(3).unwrap();
    assert_eq!(count.indices().collect::<Vec<_>>(), vec![1, 2, 3]);
    assert!(PageCount::new(0).is_none());
}

// ============================================================================
// Page Decoding
// ============================================================================

#[test]
fn test_decode_page_keeps_order() {
    let page = decode_page(2, r#"[{"id": 3}, {"id": 1}, {"id": 2}]"#).unwrap();
    assert_eq!(page.index, 2);
    assert_eq!(ids(&page.items), vec![3, 1, 2]);
}

#[test_case(r#"{"message": "Not Found"}"# ; "object body")]
#[test_case("[1, 2]" ; "array of numbers")]
#[test_case("not json" ; "invalid json")]
fn test_decode_page_malformed(body: &str) {
    let err = decode_page(4, body).unwrap_err();
    assert!(matches!(
        err,
        Error::MalformedResponse {
            page_index: Some(4),
            ..
        }
    ));
}

#[test]
fn test_decode_object() {
    assert!(decode_object(r#"{"sha": "abc"}"#).is_ok());
    assert!(decode_object("[]").is_err());
}

// ============================================================================
// Orchestrator
// ============================================================================

/// In-memory page source. Later pages answer first so completion order
/// differs from page order.
struct ScriptedSource {
    pages: HashMap<u32, Vec<Record>>,
    failing: HashSet<u32>,
    calls: Mutex<Vec<(String, u32, u32)>>,
}

impl ScriptedSource {
    fn new(page_sizes: &[u32]) -> Self {
        let mut next_id = 0;
        let pages = page_sizes
            .iter()
            .enumerate()
            .map(|(i, size)| {
                let items = (0..*size)
                    .map(|_| {
                        next_id += 1;
                        record(next_id)
                    })
                    .collect();
                (i as u32 + 1, items)
            })
            .collect();
        Self {
            pages,
            failing: HashSet::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn failing_on(mut self, page: u32) -> Self {
        self.failing.insert(page);
        self
    }

    fn fetched_pages(&self) -> Vec<u32> {
        let mut pages: Vec<u32> = self.calls.lock().unwrap().iter().map(|c| c.1).collect();
        pages.sort_unstable();
        pages
    }
}

#[async_trait]
impl PageSource for ScriptedSource {
    async fn fetch_page(&self, uri: &str, page_index: u32, page_size: u32) -> crate::Result<Page> {
        self.calls
            .lock()
            .unwrap()
            .push((uri.to_string(), page_index, page_size));

        let delay = 5 * (self.pages.len() as u64 + 1 - u64::from(page_index));
        tokio::time::sleep(Duration::from_millis(delay)).await;

        if self.failing.contains(&page_index) {
            return Err(Error::page_fetch(
                page_index,
                Error::http_status(502, "Bad Gateway"),
            ));
        }
        let items = self.pages.get(&page_index).cloned().unwrap_or_default();
        Ok(Page::new(page_index, items))
    }
}

#[tokio::test]
async fn test_retrieve_all_merges_in_page_order() {
    let orchestrator = PageOrchestrator::new(ScriptedSource::new(&[2, 3, 1]));

    let merged = orchestrator
        .retrieve_all(|_| "/repos/o/r/contributors".to_string(), PageCount::new(3).unwrap(), 100)
        .await
        .unwrap();

    assert_eq!(merged.len(), 6);
    assert_eq!(ids(merged.items()), vec![1, 2, 3, 4, 5, 6]);
    assert_eq!(merged.page_count().get(), 3);
    assert_eq!(orchestrator.source().fetched_pages(), vec![1, 2, 3]);
}

#[tokio::test]
async fn test_retrieve_all_passes_uri_and_page_size() {
    let orchestrator = PageOrchestrator::new(ScriptedSource::new(&[1, 1]));

    orchestrator
        .retrieve_all(|i| format!("/items/{i}"), PageCount::new(2).unwrap(), 25)
        .await
        .unwrap();

    let mut calls = orchestrator.source().calls.lock().unwrap().clone();
    calls.sort_by_key(|c| c.1);
    assert_eq!(
        calls,
        vec![
            ("/items/1".to_string(), 1, 25),
            ("/items/2".to_string(), 2, 25)
        ]
    );
}

#[tokio::test]
async fn test_single_page_is_fetched_once() {
    let orchestrator = PageOrchestrator::new(ScriptedSource::new(&[5]));

    let merged = orchestrator
        .retrieve_all(|_| "/c".to_string(), PageCount::SINGLE, 100)
        .await
        .unwrap();

    assert_eq!(merged.len(), 5);
    assert_eq!(orchestrator.source().fetched_pages(), vec![1]);
}

#[tokio::test]
async fn test_failed_page_fails_whole_retrieval() {
    let source = ScriptedSource::new(&[2, 2, 2]).failing_on(2);
    let orchestrator = PageOrchestrator::new(source);

    let err = orchestrator
        .retrieve_all(|_| "/c".to_string(), PageCount::new(3).unwrap(), 100)
        .await
        .unwrap_err();

    assert_eq!(err.failed_page(), Some(2));
    // Pages already in flight when page 2 failed still settle
    assert_eq!(orchestrator.source().fetched_pages(), vec![1, 2, 3]);
}

#[tokio::test]
async fn test_lowest_failed_page_is_reported() {
    let source = ScriptedSource::new(&[1, 1, 1, 1]).failing_on(4).failing_on(2);
    let orchestrator = PageOrchestrator::new(source).with_concurrency(4);

    let err = orchestrator
        .retrieve_all(|_| "/c".to_string(), PageCount::new(4).unwrap(), 10)
        .await
        .unwrap_err();

    assert_eq!(err.failed_page(), Some(2));
}

#[tokio::test]
async fn test_no_pages_started_after_failure() {
    let source = ScriptedSource::new(&[1; 50]).failing_on(2);
    let orchestrator = PageOrchestrator::new(source).with_concurrency(1);

    let err = orchestrator
        .retrieve_all(|_| "/c".to_string(), PageCount::new(50).unwrap(), 10)
        .await
        .unwrap_err();

    assert_eq!(err.failed_page(), Some(2));
    assert_eq!(orchestrator.source().fetched_pages(), vec![1, 2]);
}

#[tokio::test]
async fn test_in_flight_pages_settle_after_failure() {
    let source = ScriptedSource::new(&[1; 10]).failing_on(3);
    let orchestrator = PageOrchestrator::new(source).with_concurrency(3);

    let err = orchestrator
        .retrieve_remaining(
            Page::new(1, vec![record(0)]),
            |_| "/c".to_string(),
            PageCount::new(10).unwrap(),
            10,
        )
        .await
        .unwrap_err();

    assert_eq!(err.failed_page(), Some(3));
    let fetched = orchestrator.source().fetched_pages();
    assert!(fetched.starts_with(&[2, 3, 4]));
    assert!(fetched.len() < 9);
}

#[tokio::test]
async fn test_page_count_above_limit_is_rejected() {
    let count = parse_page_count(Some("<https://x/a?page=4294967295>; rel=\"last\"")).unwrap();
    assert_eq!(count.get(), u32::MAX);

    let orchestrator = PageOrchestrator::new(ScriptedSource::new(&[1]));
    let err = orchestrator
        .retrieve_all(|_| "/c".to_string(), count, 100)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::PageLimitExceeded {
            page_count: u32::MAX,
            max_pages: DEFAULT_MAX_PAGES
        }
    ));

    let err = orchestrator
        .retrieve_remaining(Page::new(1, vec![]), |_| "/c".to_string(), count, 100)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::PageLimitExceeded { .. }));
    assert!(orchestrator.source().fetched_pages().is_empty());
}

#[tokio::test]
async fn test_custom_page_limit() {
    let orchestrator = PageOrchestrator::new(ScriptedSource::new(&[1, 1, 1])).with_max_pages(2);

    let err = orchestrator
        .retrieve_all(|_| "/c".to_string(), PageCount::new(3).unwrap(), 10)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::PageLimitExceeded {
            page_count: 3,
            max_pages: 2
        }
    ));

    let merged = orchestrator
        .retrieve_all(|_| "/c".to_string(), PageCount::new(2).unwrap(), 10)
        .await
        .unwrap();
    assert_eq!(merged.len(), 2);
}

#[tokio::test]
async fn test_retrieve_remaining_reuses_first_page() {
    let orchestrator = PageOrchestrator::new(ScriptedSource::new(&[2, 2, 1])).with_concurrency(1);
    let probe = Page::new(1, vec![record(100), record(101)]);

    let merged = orchestrator
        .retrieve_remaining(probe, |_| "/c".to_string(), PageCount::new(3).unwrap(), 2)
        .await
        .unwrap();

    assert_eq!(ids(merged.items()), vec![100, 101, 3, 4, 5]);
    assert_eq!(orchestrator.source().fetched_pages(), vec![2, 3]);
}

#[tokio::test]
async fn test_retrieve_remaining_single_page_makes_no_requests() {
    let orchestrator = PageOrchestrator::new(ScriptedSource::new(&[]));
    let probe = Page::new(1, vec![record(1)]);

    let merged = orchestrator
        .retrieve_remaining(probe, |_| "/c".to_string(), PageCount::SINGLE, 30)
        .await
        .unwrap();

    assert_eq!(merged.len(), 1);
    assert!(orchestrator.source().fetched_pages().is_empty());
}

#[tokio::test]
async fn test_retrieve_remaining_rejects_wrong_first_page() {
    let orchestrator = PageOrchestrator::new(ScriptedSource::new(&[1, 1]));

    let result = orchestrator
        .retrieve_remaining(Page::new(2, vec![]), |_| "/c".to_string(), PageCount::new(2).unwrap(), 1)
        .await;

    assert!(result.is_err());
}

#[tokio::test]
async fn test_merged_envelope() {
    let orchestrator = PageOrchestrator::new(ScriptedSource::new(&[1, 1]));
    let merged = orchestrator
        .retrieve_all(|_| "/c".to_string(), PageCount::new(2).unwrap(), 1)
        .await
        .unwrap();

    assert_eq!(
        merged.into_envelope(ResourceKind::Contributors),
        json!({ "contributors": [{"id": 1}, {"id": 2}] })
    );
}

// ============================================================================
// Page Fetcher over HTTP
// ============================================================================

fn fetcher_for(server: &MockServer) -> PageFetcher {
    let config = HttpClientConfig::builder()
        .base_url(server.uri())
        .max_retries(0)
        .no_rate_limit()
        .build();
    PageFetcher::new(HttpClient::with_config(config).unwrap()).with_query("access_token", "tok")
}

#[tokio::test]
async fn test_fetcher_sends_page_parameters() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/o/r/commits"))
        .and(query_param("page", "3"))
        .and(query_param("per_page", "50"))
        .and(query_param("access_token", "tok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"sha": "a"}, {"sha": "b"}])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let page = fetcher_for(&mock_server)
        .fetch_page("/repos/o/r/commits", 3, 50)
        .await
        .unwrap();

    assert_eq!(page.index, 3);
    assert_eq!(page.len(), 2);
    assert_eq!(page.items[1]["sha"], "b");
}

#[tokio::test]
async fn test_fetcher_probe_captures_link_header() {
    let mock_server = MockServer::start().await;
    let link = "<https://api.example.com/repos/o/r/contributors?page=3>; rel=\"last\"";

    Mock::given(method("GET"))
        .and(path("/repos/o/r/contributors"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Link", link)
                .set_body_json(json!([{"login": "a"}])),
        )
        .mount(&mock_server)
        .await;

    let probed = fetcher_for(&mock_server)
        .fetch_probe("/repos/o/r/contributors", 1, 100)
        .await
        .unwrap();

    assert_eq!(probed.cursor.as_ref().map(PaginationCursor::as_str), Some(link));
    assert_eq!(probed.page.len(), 1);
}

#[tokio::test]
async fn test_fetcher_tags_transport_errors_with_page() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/c"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let err = fetcher_for(&mock_server)
        .fetch_page("/c", 2, 10)
        .await
        .unwrap_err();

    match err {
        Error::PageFetch { page_index, source } => {
            assert_eq!(page_index, 2);
            assert!(matches!(*source, Error::HttpStatus { status: 500, .. }));
        }
        other => panic!("expected PageFetch, got {other:?}"),
    }
}

#[tokio::test]
async fn test_fetcher_rejects_non_array_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/c"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "moved"})))
        .mount(&mock_server)
        .await;

    let err = fetcher_for(&mock_server)
        .fetch_page("/c", 1, 10)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::MalformedResponse { .. }));
}
