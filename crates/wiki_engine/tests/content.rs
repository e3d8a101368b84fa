mod common;

use std::time::Duration;

use common::{api_settings, extract_page, missing_page, mount_extract, API_PATH};
use serde_json::json;
use wiki_engine::{ApiClient, ApiSettings, ContentFetcher, FailureKind};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fetcher_with(settings: &ApiSettings) -> ContentFetcher {
    ContentFetcher::new(ApiClient::new(settings).expect("client"))
}

fn fetcher(server: &MockServer) -> ContentFetcher {
    fetcher_with(&api_settings(server))
}

#[tokio::test]
async fn returns_plain_text_extract() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(API_PATH))
        .and(query_param("action", "query"))
        .and(query_param("format", "json"))
        .and(query_param("prop", "extracts"))
        .and(query_param("explaintext", "1"))
        .and(query_param("titles", "Москва"))
        .and(header("user-agent", "wiki-harvester-tests/1.0"))
        .respond_with(extract_page("Москва", "Столица России."))
        .expect(1)
        .mount(&server)
        .await;

    let body = fetcher(&server).fetch("Москва").await.expect("fetch ok");
    assert_eq!(body.as_deref(), Some("Столица России."));
}

#[tokio::test]
async fn missing_page_is_absent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(API_PATH))
        .respond_with(missing_page("X"))
        .mount(&server)
        .await;

    assert_eq!(fetcher(&server).fetch("X").await.expect("fetch ok"), None);
}

#[tokio::test]
async fn empty_extract_is_not_absent() {
    let server = MockServer::start().await;
    mount_extract(&server, "Blank", "").await;

    let body = fetcher(&server).fetch("Blank").await.expect("fetch ok");
    assert_eq!(body.as_deref(), Some(""));
}

#[tokio::test]
async fn response_without_pages_is_absent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(API_PATH))
        .and(query_param("titles", "NoQuery"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "batchcomplete": "" })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(API_PATH))
        .and(query_param("titles", "NoPages"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "query": { "pages": {} } })),
        )
        .mount(&server)
        .await;

    let fetcher = fetcher(&server);
    assert_eq!(fetcher.fetch("NoQuery").await.expect("fetch ok"), None);
    assert_eq!(fetcher.fetch("NoPages").await.expect("fetch ok"), None);
}

#[tokio::test]
async fn http_status_is_an_error_not_absence() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(API_PATH))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = fetcher(&server).fetch("A").await.unwrap_err();
    assert_eq!(err.kind, FailureKind::HttpStatus(500));
}

#[tokio::test]
async fn malformed_json_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(API_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = fetcher(&server).fetch("A").await.unwrap_err();
    assert_eq!(err.kind, FailureKind::MalformedResponse);
}

#[tokio::test]
async fn api_error_envelope_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(API_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": { "code": "ratelimited", "info": "You've exceeded your rate limit." }
        })))
        .mount(&server)
        .await;

    let err = fetcher(&server).fetch("A").await.unwrap_err();
    assert_eq!(
        err.kind,
        FailureKind::Api {
            code: "ratelimited".to_string()
        }
    );
    assert!(err.message.contains("rate limit"));
}

#[tokio::test]
async fn times_out_on_slow_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(API_PATH))
        .respond_with(extract_page("Slow", "late").set_delay(Duration::from_millis(250)))
        .mount(&server)
        .await;

    let settings = ApiSettings {
        request_timeout: Duration::from_millis(50),
        ..api_settings(&server)
    };
    let err = fetcher_with(&settings).fetch("Slow").await.unwrap_err();
    assert_eq!(err.kind, FailureKind::Timeout);
}

#[tokio::test]
async fn rejects_too_large_response() {
    let server = MockServer::start().await;
    mount_extract(&server, "Big", &"x".repeat(512)).await;

    let settings = ApiSettings {
        max_bytes: 64,
        ..api_settings(&server)
    };
    let err = fetcher_with(&settings).fetch("Big").await.unwrap_err();
    assert!(matches!(
        err.kind,
        FailureKind::TooLarge { max_bytes: 64, .. }
    ));
}

#[test]
fn invalid_endpoint_fails_at_construction() {
    let settings = ApiSettings {
        endpoint: "not a url".to_string(),
        ..ApiSettings::default()
    };
    let err = ApiClient::new(&settings).unwrap_err();
    assert_eq!(err.kind, FailureKind::InvalidUrl);
}
