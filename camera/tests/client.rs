#![cfg(not(target_arch = "wasm32"))]

use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use camera_capture::{HttpProxyClient, ProxyClient, SubmitError};

#[tokio::test]
async fn posts_the_image_as_json() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/vision"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({ "image": "aGVsbG8=" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "responses": [] })))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpProxyClient::new(format!("{}/api/vision", server.uri()));
    let result = client.submit("aGVsbG8=").await.unwrap();

    assert_eq!(result, json!({ "responses": [] }));
}

#[tokio::test]
async fn error_status_carries_the_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(400).set_body_string(r#"{"error":"No image provided"}"#),
        )
        .mount(&server)
        .await;

    let client = HttpProxyClient::new(format!("{}/api/vision", server.uri()));
    let result = client.submit("").await;

    assert_eq!(
        result,
        Err(SubmitError::Server {
            status: 400,
            body: String::from(r#"{"error":"No image provided"}"#),
        })
    );
}

#[tokio::test]
async fn non_json_success_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&server)
        .await;

    let client = HttpProxyClient::new(server.uri());
    let result = client.submit("aGVsbG8=").await;

    assert!(matches!(result, Err(SubmitError::Decode(_))));
}

#[tokio::test]
async fn unreachable_server_is_a_transport_error() {
    let client = HttpProxyClient::new("http://127.0.0.1:1/api/vision");
    let result = client.submit("aGVsbG8=").await;

    assert!(matches!(result, Err(SubmitError::Transport(_))));
}
