use axum::{
    extract::Request,
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Longest caller-supplied request id accepted verbatim.
const MAX_REQUEST_ID_LEN: usize = 128;

/// Request id stored as a request extension for handlers.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// Tags every request with an id and echoes it on the response.
///
/// A caller-supplied `x-request-id` is kept when it is short printable
/// ASCII; anything else is replaced by a fresh `UUIDv4`.
pub async fn request_id(mut req: Request, next: Next) -> Response {
    let id = req
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| is_acceptable_id(v))
        .map_or_else(|| Uuid::new_v4().to_string(), str::to_owned);

    req.extensions_mut().insert(RequestId(id.clone()));
    tracing::debug!(request_id = %id, path = %req.uri().path(), "request received");

    let mut res = next.run(req).await;
    if let Ok(val) = HeaderValue::from_str(&id) {
        res.headers_mut().insert(HeaderName::from_static(REQUEST_ID_HEADER), val);
    }
    res
}

fn is_acceptable_id(candidate: &str) -> bool {
    !candidate.is_empty()
        && candidate.len() <= MAX_REQUEST_ID_LEN
        && candidate.bytes().all(|b| b.is_ascii_graphic())
}
