//! Integration tests for the status-code route.

use reqwest::StatusCode;
use serde_json::{json, Value};

mod common;

use common::{client, TestServer};

#[tokio::test]
async fn valid_codes_become_the_response_status() {
    let server = TestServer::start().await;
    let client = client();

    for code in [200u16, 201, 400, 404, 418, 500, 503, 599] {
        let res = client
            .get(server.url(&format!("/errorcode/{code}")))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status().as_u16(), code);

        let body: Value = res.json().await.unwrap();
        assert_eq!(body["status_code"], code);
        assert_eq!(body["message"], format!("Generated error with status {code}"));
        assert_eq!(body["path"], format!("/errorcode/{code}"));
        assert_eq!(body["method"], "GET");
    }
}

#[tokio::test]
async fn status_response_carries_request_metadata() {
    let server = TestServer::start().await;

    let res = client()
        .get(server.url("/errorcode/404?reason=test"))
        .header("X-Marker", "1")
        .header("Cookie", "id=42")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let body: Value = res.json().await.unwrap();
    assert_eq!(body["status_code"], 404);
    assert_eq!(body["message"], "Generated error with status 404");
    assert_eq!(body["query_params"], json!({ "reason": "test" }));
    assert_eq!(body["headers"]["x-marker"], "1");
    assert_eq!(body["cookies"], json!({ "id": "42" }));
    assert_eq!(body["body"], Value::Null);
    assert_eq!(body["client_ip"], "127.0.0.1");
    assert_eq!(body["http_version"], "1.1");
    assert_eq!(body.as_object().unwrap().len(), 10);
}

#[tokio::test]
async fn out_of_range_codes_are_rejected() {
    let server = TestServer::start().await;
    let client = client();

    for code in ["999", "600", "99", "0", "-1", "-404"] {
        let res = client
            .get(server.url(&format!("/errorcode/{code}")))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST, "code {code}");
        assert_eq!(res.text().await.unwrap(), r#"{"error":"Invalid status code"}"#);
    }
}

#[tokio::test]
async fn informational_codes_surface_as_server_errors() {
    let server = TestServer::start().await;
    let client = client();

    for code in [100, 150, 199] {
        let res = client
            .get(server.url(&format!("/errorcode/{code}")))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR, "code {code}");
        assert!(res.bytes().await.unwrap().is_empty(), "code {code}");
    }
}

#[tokio::test]
async fn non_integer_codes_are_unprocessable() {
    let server = TestServer::start().await;
    let client = client();

    for code in ["abc", "4o4", "12.5", "99999999999999999999"] {
        let res = client
            .get(server.url(&format!("/errorcode/{code}")))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY, "code {code}");

        let body: Value = res.json().await.unwrap();
        assert!(body["error"].is_string());
    }
}

#[tokio::test]
async fn extra_segments_fall_through_to_echo() {
    let server = TestServer::start().await;

    let res = client()
        .get(server.url("/errorcode/404/extra"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let body: Value = res.json().await.unwrap();
    assert_eq!(body["path"], "/errorcode/404/extra");
    assert!(body.get("status_code").is_none());
}

#[tokio::test]
async fn head_uses_the_requested_status() {
    let server = TestServer::start().await;

    let res = client().head(server.url("/errorcode/503")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert!(res.bytes().await.unwrap().is_empty());
}

#[tokio::test]
async fn repeated_status_requests_are_identical() {
    let server = TestServer::start().await;
    let client = client();

    let first = client
        .get(server.url("/errorcode/429"))
        .send()
        .await
        .unwrap()
        .bytes()
        .await
        .unwrap();
    let second = client
        .get(server.url("/errorcode/429"))
        .send()
        .await
        .unwrap()
        .bytes()
        .await
        .unwrap();
    assert_eq!(first, second);
}
