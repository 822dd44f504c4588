//! Echo API served by the demo host.

use axum::{
    body::{Body, Bytes},
    extract::Path,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Extension, Json, Router,
};
use futures_util::stream;
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;

use crate::gatherer::RaisedError;
use crate::http::attach;
use crate::telemetry::Telemetry;

/// Demo routes with telemetry attached.
pub fn router(telemetry: Telemetry) -> Router {
    let routes = Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/echo", post(echo))
        .route("/items/{id}", get(item))
        .route("/stream", get(stream_numbers));
    attach(routes, telemetry).layer(TraceLayer::new_for_http())
}

async fn echo(body: Bytes) -> Response {
    match serde_json::from_slice::<Value>(&body) {
        Ok(value) => Json(value).into_response(),
        Err(e) => (
            StatusCode::BAD_REQUEST,
            Extension(RaisedError::from_error(&e)),
            Json(json!({ "error": e.to_string() })),
        )
            .into_response(),
    }
}

async fn item(Path(id): Path<String>) -> Response {
    match id.parse::<u32>() {
        Ok(id) => Json(json!({ "id": id, "name": format!("item-{id}") })).into_response(),
        Err(e) => (
            StatusCode::NOT_FOUND,
            Extension(RaisedError::from_error(&e)),
            Json(json!({ "error": "no such item" })),
        )
            .into_response(),
    }
}

async fn stream_numbers() -> Body {
    let chunks = (1..=3).map(|n| Ok::<_, std::io::Error>(format!("{n}\n")));
    Body::from_stream(stream::iter(chunks))
}
