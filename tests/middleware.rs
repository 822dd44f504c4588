//! End-to-end tests: axum router → telemetry middleware → mock collector.

use std::io;
use std::time::Duration;
use axum::{
    body::{Body, Bytes},
    http::{Request, StatusCode},
    routing::{get, post},
    Router,
};
use futures_util::stream;
use serde_json::{json, Value};
use tower::ServiceExt;
use treblle_relay::{demo, http, TelemetryConfig, Transformer};

mod common;

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    let body = serde_json::to_vec(body).unwrap();
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("Host", "api.example.com")
        .header("Content-Type", "application/json")
        .header("Content-Length", body.len())
        .header("Authorization", "Bearer abc123")
        .header("X-Forwarded-For", "203.0.113.7, 10.0.0.1")
        .body(Body::from(body))
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("Host", "api.example.com")
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn test_echo_is_captured_and_masked() {
    let collector = common::start_mock_collector(200).await;
    let telemetry = common::telemetry(&common::telemetry_config(&[&collector]));
    let app = demo::router(telemetry.clone());

    let sent = json!({"user": "alice", "password": "hunter2", "cards": [{"ccv": 123}]});
    let response = app.oneshot(post_json("/echo?x=1", &sent)).await.unwrap();

    // The client sees the unmasked echo.
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, sent);

    let received = collector.wait_for(1).await;
    assert_eq!(received.len(), 1);
    let data = &received[0].body["data"];

    assert_eq!(data["server"]["software"], "axum");
    assert_eq!(data["server"]["signature"], "0.8");
    assert_eq!(data["request"]["method"], "POST");
    assert_eq!(data["request"]["url"], "http://api.example.com/echo?x=1");
    assert_eq!(data["request"]["ip"], "203.0.113.7");
    assert_eq!(data["request"]["headers"]["authorization"], "Bearer ******");

    let masked = json!({"user": "alice", "password": "*******", "cards": [{"ccv": "***"}]});
    assert_eq!(data["request"]["body"], masked);
    assert_eq!(data["response"]["code"], 200);
    assert_eq!(data["response"]["body"], masked);
    assert_eq!(
        data["response"]["size"],
        serde_json::to_vec(&sent).unwrap().len()
    );
    assert!(data["response"]["load_time"].as_f64().unwrap() >= 0.0);
    assert_eq!(data["errors"], json!([]));

    telemetry.teardown();
}

#[tokio::test]
async fn test_oversized_request_body_is_omitted() {
    let collector = common::start_mock_collector(200).await;
    let mut config = common::telemetry_config(&[&collector]);
    config.limit_request_body_size = 16;
    let telemetry = common::telemetry(&config);
    let app = demo::router(telemetry.clone());

    let sent = json!({"blob": "x".repeat(64)});
    let response = app.oneshot(post_json("/echo", &sent)).await.unwrap();
    assert_eq!(body_json(response).await, sent);

    let received = collector.wait_for(1).await;
    let request = &received[0].body["data"]["request"];
    assert!(request.get("body").is_none());

    telemetry.teardown();
}

#[tokio::test]
async fn test_streaming_response_is_not_consumed() {
    let collector = common::start_mock_collector(200).await;
    let telemetry = common::telemetry(&common::telemetry_config(&[&collector]));
    let app = demo::router(telemetry.clone());

    let response = app.oneshot(get_request("/stream")).await.unwrap();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"1\n2\n3\n");

    let received = collector.wait_for(1).await;
    let response = &received[0].body["data"]["response"];
    assert_eq!(response["size"], 0);
    assert_eq!(response["body"], json!({}));

    telemetry.teardown();
}

#[tokio::test]
async fn test_handler_error_is_recorded() {
    let collector = common::start_mock_collector(200).await;
    let telemetry = common::telemetry(&common::telemetry_config(&[&collector]));
    let app = demo::router(telemetry.clone());

    let response = app.oneshot(get_request("/items/abc")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let received = collector.wait_for(1).await;
    let data = &received[0].body["data"];
    assert_eq!(data["response"]["code"], 404);

    let errors = data["errors"].as_array().unwrap();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0]["source"], "onError");
    assert_eq!(errors[0]["type"], "ParseIntError");
    assert_eq!(errors[0]["message"], "invalid digit found in string");
    assert!(errors[0]["file"].as_str().unwrap().ends_with("demo.rs"));

    telemetry.teardown();
}

const BOOM_LINE: u32 = line!() + 3;

async fn boom() -> &'static str {
    panic!("handler exploded")
}

#[tokio::test]
async fn test_panic_is_recorded_and_resumed() {
    let collector = common::start_mock_collector(200).await;
    let telemetry = common::telemetry(&common::telemetry_config(&[&collector]));
    let routes = Router::new().route("/boom", get(boom));
    let app = http::attach(routes, telemetry.clone());

    let result = tokio::spawn(app.oneshot(get_request("/boom"))).await;
    assert!(result.unwrap_err().is_panic());

    let received = collector.wait_for(1).await;
    let data = &received[0].body["data"];
    assert!(data.get("response").is_none());
    assert_eq!(data["errors"][0]["type"], "panic");
    assert_eq!(data["errors"][0]["message"], "handler exploded");
    assert!(data["errors"][0]["file"].as_str().unwrap().ends_with("middleware.rs"));
    assert_eq!(data["errors"][0]["line"], BOOM_LINE);

    telemetry.teardown();
}

#[tokio::test]
async fn test_unreadable_request_body_reaches_host() {
    let collector = common::start_mock_collector(200).await;
    let telemetry = common::telemetry(&common::telemetry_config(&[&collector]));
    let app = demo::router(telemetry.clone());

    // No Content-Length, so the middleware tries to buffer it.
    let chunks = vec![
        Ok(Bytes::from_static(b"{\"partial\":")),
        Err(io::Error::from(io::ErrorKind::ConnectionReset)),
    ];
    let request = Request::builder()
        .uri("/health")
        .header("Host", "api.example.com")
        .body(Body::from_stream(stream::iter(chunks)))
        .unwrap();

    // The host decides how to answer; /health ignores the body.
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let received = collector.wait_for(1).await;
    let request = &received[0].body["data"]["request"];
    assert_eq!(request["method"], "GET");
    assert!(request.get("body").is_none());
    assert_eq!(received[0].body["data"]["response"]["code"], 200);

    telemetry.teardown();
}

#[tokio::test]
async fn test_transformer_failure_does_not_affect_host() {
    let collector = common::start_mock_collector(200).await;
    let telemetry = common::telemetry(&common::telemetry_config(&[&collector]))
        .with_response_transformer(Transformer::new(|bytes: &[u8]| {
            String::from_utf8_lossy(bytes).parse::<i64>()
        }));
    let routes = Router::new().route("/text", post(|body: String| async move { body }));
    let app = http::attach(routes, telemetry.clone());

    let request = Request::builder()
        .method("POST")
        .uri("/text")
        .body(Body::from("not a number"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"not a number");

    let received = collector.wait_for(1).await;
    let data = &received[0].body["data"];
    assert_eq!(data["response"]["body"], json!({}));
    assert_eq!(data["errors"].as_array().unwrap().len(), 1);
    assert_eq!(data["errors"][0]["type"], "ParseIntError");

    telemetry.teardown();
}

#[tokio::test]
async fn test_disabled_without_credentials() {
    let collector = common::start_mock_collector(200).await;
    let mut config = TelemetryConfig::default();
    config.collector_hosts = vec![collector.url.clone()];
    let telemetry = common::telemetry(&config);
    assert!(telemetry.is_disabled());
    let app = demo::router(telemetry.clone());

    let sent = json!({"password": "hunter2"});
    let response = app.oneshot(post_json("/echo", &sent)).await.unwrap();
    assert_eq!(body_json(response).await, sent);

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(collector.received().is_empty());

    telemetry.teardown();
}
