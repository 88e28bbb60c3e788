use axum::{
    body::Body, extract::Request, http::HeaderValue, middleware::Next, response::Response,
};
use uuid::Uuid;

/// Header carrying the request id in and out of the service
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Request id stored in request extensions, either propagated from the
/// caller's `x-request-id` header or freshly generated.
#[derive(Clone, Copy, Debug)]
pub struct RequestId(pub Uuid);

/// Attaches a request id to the request extensions and echoes it back in
/// the response headers. A caller-supplied id is kept only if it parses as
/// a UUID.
pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|header| header.to_str().ok())
        .and_then(|value| Uuid::parse_str(value).ok())
        .unwrap_or_else(Uuid::new_v4);

    request.extensions_mut().insert(RequestId(id));
    let mut response = next.run(request).await;

    if let Ok(value) = HeaderValue::from_str(&id.to_string()) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

/// Span constructor for the HTTP trace layer, tagging every event in a
/// request with its id.
pub fn trace_span_for(request: &Request<Body>) -> tracing::Span {
    let request_id = request
        .extensions()
        .get::<RequestId>()
        .map(|id| id.0.to_string())
        .unwrap_or_else(|| "unknown".to_string());

    tracing::info_span!(
        "http_request",
        method = %request.method(),
        uri = %request.uri(),
        request_id = %request_id,
    )
}
