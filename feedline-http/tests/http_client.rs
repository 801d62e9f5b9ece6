use feedline_http::{Auth, HttpClient, HttpError, RequestOpts};
use reqwest::StatusCode;
use reqwest::header::{HeaderMap, HeaderValue};
use serde_json::{Value, json};
use std::borrow::Cow;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn get_json_sends_query_headers_and_bearer() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/graphql/abc/UserTweets"))
        .and(query_param("variables", r#"{"userId":"1"}"#))
        .and(header("authorization", "Bearer tok"))
        .and(header("x-csrf-token", "ct0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpClient::new(&format!("{}/api/", server.uri())).unwrap();
    let mut headers = HeaderMap::new();
    headers.insert("x-csrf-token", HeaderValue::from_static("ct0"));

    let got: Value = client
        .get_json(
            "graphql/abc/UserTweets",
            RequestOpts {
                auth: Some(Auth::Bearer("tok")),
                headers: Some(headers),
                query: Some(vec![("variables", Cow::Borrowed(r#"{"userId":"1"}"#))]),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(got, json!({ "ok": true }));
}

#[tokio::test]
async fn api_errors_surface_status_and_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/limited"))
        .respond_with(
            ResponseTemplate::new(429)
                .set_body_json(json!({ "errors": [{ "message": "Rate limit exceeded", "code": 88 }] })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpClient::new(&server.uri()).unwrap();
    let err = client
        .get_json::<Value>("limited", RequestOpts::default())
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(StatusCode::TOO_MANY_REQUESTS));
    match err {
        HttpError::Api { message, .. } => assert_eq!(message, "Rate limit exceeded"),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn server_errors_are_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(503).insert_header("retry-after", "0"))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpClient::new(&server.uri()).unwrap();
    let err = client
        .get_json::<Value>("flaky", RequestOpts::default())
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::SERVICE_UNAVAILABLE));
}

#[tokio::test]
async fn malformed_body_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>nope</html>"))
        .mount(&server)
        .await;

    let client = HttpClient::new(&server.uri()).unwrap();
    let err = client
        .get_json::<Value>("broken", RequestOpts::default())
        .await
        .unwrap_err();
    assert!(matches!(err, HttpError::Decode(_, ref snippet) if snippet.contains("nope")));
}
