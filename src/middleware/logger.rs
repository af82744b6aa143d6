use axum::{
    extract::{ConnectInfo, Request},
    http::HeaderValue,
    middleware::Next,
    response::Response,
};
use std::net::SocketAddr;
use std::time::Instant;
use tracing::{info, Instrument};
use uuid::Uuid;

use super::context::RequestContext;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Outermost stage: opens the request span, runs the rest of the chain
/// inside it, then logs the final status and elapsed time.
///
/// The client address is the socket peer. Forwarding headers are ignored
/// because the client controls them.
pub async fn log_requests(mut req: Request, next: Next) -> Response {
    let started = Instant::now();
    let request_id = Uuid::new_v4();
    let client_ip = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string());

    let span = tracing::info_span!(
        "request",
        request_id = %request_id,
        client_ip = %client_ip,
        path = %req.uri().path(),
        method = %req.method(),
        username = tracing::field::Empty,
    );

    req.extensions_mut()
        .insert(RequestContext::new(request_id, span.clone()));

    let mut response = next.run(req).instrument(span.clone()).await;

    let status = response.status().as_u16();
    let response_time_ms = started.elapsed().as_secs_f64() * 1000.0;
    span.in_scope(|| info!(event = "REQUEST-COMPLETED", status, response_time_ms));

    if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}
