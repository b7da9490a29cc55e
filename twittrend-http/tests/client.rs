use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::{ACCEPT_LANGUAGE, HeaderMap, HeaderValue};
use serde_json::json;
use twittrend_http::{Auth, HttpClient, HttpError, RequestOpts};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn get_text_decodes_declared_charset_and_sends_headers() {
    let server = MockServer::start().await;
    let (sjis, _, _) = encoding_rs::SHIFT_JIS.encode("<ul><li>1. 東京都</li></ul>");

    Mock::given(method("GET"))
        .and(path("/"))
        .and(header("accept-language", "ja"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html; charset=Shift_JIS")
                .set_body_bytes(sjis.into_owned()),
        )
        .expect(1)
        .mount(&server)
        .await;

    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("ja"));

    let client = HttpClient::new(&format!("{}/", server.uri())).unwrap();
    let page = client
        .get_text(
            "",
            RequestOpts {
                headers: Some(headers),
                ..Default::default()
            },
        )
        .await
        .expect("page fetched");

    assert_eq!(page.status, StatusCode::OK);
    assert_eq!(page.encoding, "Shift_JIS");
    assert_eq!(page.body, "<ul><li>1. 東京都</li></ul>");
}

#[tokio::test]
async fn get_text_rejects_non_success() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let client = HttpClient::new(&server.uri()).unwrap();
    let err = client
        .get_text("", RequestOpts::default())
        .await
        .unwrap_err();

    match err {
        HttpError::Api {
            status, message, ..
        } => {
            assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
            assert_eq!(message, "maintenance");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn get_text_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    let client = HttpClient::new(&server.uri())
        .unwrap()
        .with_timeout(Duration::from_millis(100));
    let err = client
        .get_text("", RequestOpts::default())
        .await
        .unwrap_err();
    assert!(matches!(err, HttpError::Network(_)), "{err:?}");
}

#[tokio::test]
async fn post_json_raw_returns_status_and_body_without_judging() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/bot/message/push"))
        .and(header("authorization", "Bearer tok123"))
        .and(body_json(json!({ "to": "C1", "messages": [] })))
        .respond_with(
            ResponseTemplate::new(400)
                .insert_header("x-line-request-id", "abc-123")
                .set_body_string(r#"{"message":"Invalid reply token"}"#),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpClient::new(&format!("{}/v2/bot/message/push", server.uri())).unwrap();
    let resp = client
        .post_json_raw(
            "",
            &json!({ "to": "C1", "messages": [] }),
            RequestOpts {
                auth: Some(Auth::Bearer(" tok123 ")),
                ..Default::default()
            },
        )
        .await
        .expect("request completes");

    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.request_id, "abc-123");
    assert_eq!(resp.error_message(), "Invalid reply token");
}
