//! Telemetry middleware for axum routers.
//!
//! # Responsibilities
//! - Buffer the request body when it is going to be captured
//! - Run the three capture callbacks around the inner service
//! - Hand the finished payload to the publisher before returning
//!
//! # Design Decisions
//! - Responses with an exact size hint are buffered; anything else is streaming
//!   and is passed through untouched
//! - Handlers report errors by attaching a [`RaisedError`] extension
//! - A panicking handler is recorded with its panic site and the panic is resumed
//! - Body read failures are recorded and handed on as body errors; the
//!   middleware never answers on the host's behalf

use std::panic::AssertUnwindSafe;
use axum::{
    body::{Body, Bytes, HttpBody},
    extract::{Request, State},
    middleware::{from_fn_with_state, Next},
    response::Response,
    Router,
};
use futures_util::{future, stream, FutureExt};

use crate::gatherer::errors::{install_panic_hook, take_panic_site};
use crate::gatherer::{RaisedError, RequestView};
use crate::http::view::{AxumRequest, AxumResponse};
use crate::telemetry::Telemetry;

/// Install the telemetry middleware on `router`.
pub fn attach<S>(router: Router<S>, telemetry: Telemetry) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    install_panic_hook();
    router.layer(from_fn_with_state(telemetry, telemetry_middleware))
}

/// A body whose only frame is `err`.
fn failed_body(err: axum::Error) -> Body {
    Body::from_stream(stream::once(future::ready(Err::<Bytes, _>(err))))
}

pub async fn telemetry_middleware(
    State(telemetry): State<Telemetry>,
    request: Request,
    next: Next,
) -> Response {
    if telemetry.is_disabled() {
        return next.run(request).await;
    }

    let (parts, body) = request.into_parts();
    let declared = AxumRequest::new(&parts, b"").content_length();

    let (mut capture, body) = if telemetry.gatherer().captures_body(declared) {
        match axum::body::to_bytes(body, usize::MAX).await {
            Ok(bytes) => {
                let capture = telemetry.on_request_start(&AxumRequest::new(&parts, &bytes));
                (capture, Body::from(bytes))
            }
            Err(e) => {
                tracing::debug!(error = %e, "Failed to read request body, capturing without it");
                let mut capture = telemetry.on_request_start(&AxumRequest::new(&parts, b""));
                if let Some(capture) = capture.as_mut() {
                    capture.discard_request_body();
                }
                (capture, failed_body(e))
            }
        }
    } else {
        (telemetry.on_request_start(&AxumRequest::new(&parts, b"")), body)
    };

    let request = Request::from_parts(parts, body);

    let response = match AssertUnwindSafe(next.run(request)).catch_unwind().await {
        Ok(response) => response,
        Err(panic) => {
            let raised = RaisedError::from_panic(panic.as_ref(), take_panic_site());
            tracing::error!(panic = %raised.message(), "Handler panicked");
            telemetry.on_request_teardown(capture, Some(&raised));
            std::panic::resume_unwind(panic);
        }
    };

    let (parts, body) = response.into_parts();
    let response = if body.size_hint().exact().is_some() {
        match axum::body::to_bytes(body, usize::MAX).await {
            Ok(bytes) => {
                telemetry.on_request_end(capture.as_mut(), AxumResponse::buffered(&parts, &bytes));
                Response::from_parts(parts, Body::from(bytes))
            }
            Err(e) => {
                let raised = RaisedError::from_error(&e);
                tracing::error!(error = %e, "Failed to read response body");
                telemetry.on_request_end(capture.as_mut(), AxumResponse::streaming(&parts));
                telemetry.on_request_teardown(capture, Some(&raised));
                return Response::from_parts(parts, failed_body(e));
            }
        }
    } else {
        telemetry.on_request_end(capture.as_mut(), AxumResponse::streaming(&parts));
        Response::from_parts(parts, body)
    };

    let raised = response.extensions().get::<RaisedError>().cloned();
    telemetry.on_request_teardown(capture, raised.as_ref());
    response
}
