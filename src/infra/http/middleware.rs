//! Request id stamping and failure logging.

use std::time::Instant;

use axum::{
    body::Body,
    http::{HeaderValue, Method, Request, StatusCode, Uri},
    middleware::Next,
    response::Response,
};
use tracing::{error, warn};
use uuid::Uuid;

use crate::application::auth::Viewer;
use crate::application::error::ErrorReport;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

const LOG_TARGET: &str = "yatube::http::response";

/// Per-request data shared by the outer middleware layers.
#[derive(Debug, Clone, Copy)]
pub struct RequestContext {
    pub request_id: Uuid,
    pub received_at: Instant,
}

pub async fn set_request_context(mut request: Request<Body>, next: Next) -> Response {
    let context = RequestContext {
        request_id: Uuid::new_v4(),
        received_at: Instant::now(),
    };
    request.extensions_mut().insert(context);

    let mut response = next.run(request).await;
    let header = context.request_id.hyphenated().to_string();
    if let Ok(value) = HeaderValue::from_str(&header) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response.extensions_mut().insert(context);
    response
}

/// Log every response with status >= 400 together with the [`ErrorReport`]
/// the handler attached, if any.
pub async fn log_responses(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let context = request.extensions().get::<RequestContext>().copied();

    let mut response = next.run(request).await;
    let status = response.status();
    if !(status.is_client_error() || status.is_server_error()) {
        return response;
    }

    let username = response
        .extensions()
        .get::<Viewer>()
        .and_then(Viewer::user)
        .map(|user| user.username.clone());
    let report = response.extensions_mut().remove::<ErrorReport>();

    log_failure(&Failure {
        status,
        method: &method,
        uri: &uri,
        context,
        username: username.as_deref(),
        report: report.as_ref(),
    });
    response
}

struct Failure<'a> {
    status: StatusCode,
    method: &'a Method,
    uri: &'a Uri,
    context: Option<RequestContext>,
    username: Option<&'a str>,
    report: Option<&'a ErrorReport>,
}

fn log_failure(failure: &Failure<'_>) {
    let request_id = failure
        .context
        .map(|ctx| ctx.request_id.to_string())
        .unwrap_or_default();
    let elapsed_ms = failure
        .context
        .map(|ctx| ctx.received_at.elapsed().as_millis())
        .unwrap_or_default();
    let source = failure.report.map_or("unknown", |report| report.source);
    let chain: &[String] = failure.report.map_or(&[], |report| &report.messages);
    let detail = chain.first().map_or("no diagnostic available", String::as_str);
    let username = failure.username.unwrap_or("-");

    if failure.status.is_server_error() {
        error!(
            target: LOG_TARGET,
            status = failure.status.as_u16(),
            method = %failure.method,
            uri = %failure.uri,
            elapsed_ms,
            source,
            detail,
            chain = ?chain,
            request_id,
            username,
            "request failed"
        );
    } else {
        warn!(
            target: LOG_TARGET,
            status = failure.status.as_u16(),
            method = %failure.method,
            uri = %failure.uri,
            elapsed_ms,
            source,
            detail,
            request_id,
            username,
            "client error"
        );
    }
}
