use std::time::Duration;

use sector_etf_fetch::{Error, FetchOptions, PageClient};
use wiremock::matchers::{header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fast_client(retries: u32) -> PageClient {
    PageClient::with_options(FetchOptions {
        timeout: Duration::from_secs(5),
        retries,
        retry_delay: Duration::ZERO,
    })
    .unwrap()
}

#[tokio::test]
async fn fetch_html_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/etfs/spy"))
        .and(header_exists("user-agent"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html><body>NAV $145.42</body></html>"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = fast_client(2);
    let body = client
        .fetch_html(&format!("{}/etfs/spy", mock_server.uri()))
        .await
        .unwrap();
    assert!(body.contains("NAV $145.42"));
}

#[tokio::test]
async fn fetch_html_retries_transient_failure() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/etfs/xlk"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/etfs/xlk"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<p>ok</p>"))
        .mount(&mock_server)
        .await;

    let client = fast_client(2);
    let body = client
        .fetch_html(&format!("{}/etfs/xlk", mock_server.uri()))
        .await
        .unwrap();
    assert_eq!(body, "<p>ok</p>");
}

#[tokio::test]
async fn fetch_html_gives_up_after_retries() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/etfs/gld"))
        .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
        .expect(3)
        .mount(&mock_server)
        .await;

    let client = fast_client(2);
    let result = client
        .fetch_html(&format!("{}/etfs/gld", mock_server.uri()))
        .await;

    match result {
        Err(Error::HttpStatus { status, body }) => {
            assert_eq!(status, 503);
            assert_eq!(body, "unavailable");
        }
        other => panic!("expected HttpStatus error, got {:?}", other.map(|_| ())),
    }
}

#[tokio::test]
async fn fetch_html_without_retries_makes_one_request() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = fast_client(0);
    let err = client
        .fetch_html(&format!("{}/missing", mock_server.uri()))
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(404));
}

#[tokio::test]
async fn fetch_html_retries_client_errors_too() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/moved"))
        .respond_with(ResponseTemplate::new(404))
        .expect(2)
        .mount(&mock_server)
        .await;

    let client = fast_client(1);
    let err = client
        .fetch_html(&format!("{}/moved", mock_server.uri()))
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(404));
}

#[tokio::test]
async fn fetch_html_rejects_invalid_url() {
    let client = fast_client(2);
    let err = client.fetch_html("not a url").await.unwrap_err();
    assert!(matches!(err, Error::InvalidUrl { .. }));
    assert_eq!(err.status(), None);
}
