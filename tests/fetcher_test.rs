//! Integration tests for BiliFetcher using wiremock
//!
//! These tests validate the HTTP fetcher's retry behavior with mock servers.

use bilicomments::config::HttpConfig;
use bilicomments::crawler::fetcher::{read_json, BiliFetcher, HttpMethod, Params};
use bilicomments::utils::error::FetchError;
use serde_json::{json, Value};
use std::time::{Duration, Instant};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fast_config() -> HttpConfig {
    HttpConfig {
        request_timeout_secs: 5,
        retry_delay_ms: 10,
        ..HttpConfig::default()
    }
}

/// Test successful GET with query parameters
#[tokio::test]
async fn test_get_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api"))
        .and(query_param("page_id", "169153"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"code": 0})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let fetcher = BiliFetcher::new(&fast_config()).unwrap();
    let mut params = Params::new();
    params.insert("page_id".into(), "169153".into());

    let response = fetcher
        .send(&format!("{}/api", mock_server.uri()), HttpMethod::Get, Some(&params))
        .await
        .expect("response");

    let body: Value = read_json(response).await.unwrap();
    assert_eq!(body["code"], 0);
}

/// Test POST sends parameters as a JSON body
#[tokio::test]
async fn test_post_json_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/submit"))
        .and(body_json(json!({"a": "1", "b": "two"})))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let fetcher = BiliFetcher::new(&fast_config()).unwrap();
    let mut params = Params::new();
    params.insert("a".into(), "1".into());
    params.insert("b".into(), "two".into());

    let result = fetcher
        .request(&format!("{}/submit", mock_server.uri()), "post", Some(&params))
        .await
        .unwrap();
    assert!(result.is_some());
}

/// Test the fixed browser header set is sent
#[tokio::test]
async fn test_browser_headers() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/headers"))
        .and(header("referer", "https://www.bilibili.com/"))
        .and(header("accept", "application/json"))
        .and(wiremock::matchers::header_exists("user-agent"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let fetcher = BiliFetcher::new(&fast_config()).unwrap();
    let result = fetcher
        .send(&format!("{}/headers", mock_server.uri()), HttpMethod::Get, None)
        .await;
    assert!(result.is_some());
}

/// Test that server errors trigger retries and a later success is returned
#[tokio::test]
async fn test_success_after_two_failures() {
    let mock_server = MockServer::start().await;

    // Return 503 twice, then succeed
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(200).set_body_string("OK"))
        .mount(&mock_server)
        .await;

    let fetcher = BiliFetcher::new(&fast_config()).unwrap();
    let response = fetcher
        .send(&format!("{}/flaky", mock_server.uri()), HttpMethod::Get, None)
        .await
        .expect("should succeed on the third attempt");

    assert_eq!(response.text().await.unwrap(), "OK");
}

/// Test every non-2xx status is retried, 404 included, and exhaustion yields None
#[tokio::test]
async fn test_exhaustion_returns_none() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .expect(3)
        .mount(&mock_server)
        .await;

    let config = HttpConfig {
        retry_delay_ms: 200,
        ..fast_config()
    };
    let fetcher = BiliFetcher::new(&config).unwrap();

    let start = Instant::now();
    let result = fetcher
        .send(&format!("{}/missing", mock_server.uri()), HttpMethod::Get, None)
        .await;
    let elapsed = start.elapsed();

    assert!(result.is_none());
    // Two delays between three attempts, none after the last
    assert!(elapsed >= Duration::from_millis(400), "elapsed {elapsed:?}");
    assert!(elapsed < Duration::from_millis(600), "elapsed {elapsed:?}");
}

/// Test request timeouts are retried like other failures
#[tokio::test]
async fn test_timeout_is_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .expect(2)
        .mount(&mock_server)
        .await;

    let config = HttpConfig {
        request_timeout_secs: 1,
        max_attempts: 2,
        ..fast_config()
    };
    let fetcher = BiliFetcher::new(&config).unwrap();

    let result = fetcher
        .send(&format!("{}/slow", mock_server.uri()), HttpMethod::Get, None)
        .await;
    assert!(result.is_none());
}

/// Test connection failures exhaust without panicking
#[tokio::test]
async fn test_connection_refused() {
    let fetcher = BiliFetcher::new(&fast_config()).unwrap();
    let result = fetcher
        .send("http://127.0.0.1:9/unreachable", HttpMethod::Get, None)
        .await;
    assert!(result.is_none());
}

/// Test unsupported methods fail immediately without a request
#[tokio::test]
async fn test_unsupported_method_no_request() {
    let mock_server = MockServer::start().await;

    Mock::given(wiremock::matchers::any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let fetcher = BiliFetcher::new(&fast_config()).unwrap();
    let result = fetcher
        .request(&format!("{}/x", mock_server.uri()), "DELETE", None)
        .await;

    assert!(matches!(result, Err(FetchError::UnsupportedMethod(m)) if m == "DELETE"));
}
