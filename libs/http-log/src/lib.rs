use std::time::{Duration, Instant};

use axum::body::{Body, Bytes};
use axum::extract::Request;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use http_body_util::BodyExt;
use tracing::{error, info, trace, warn};

const SLOW_REQUEST: Duration = Duration::from_millis(500);

const SECRET_HEADERS: &[&str] = &["x-api-key", "authorization"];

/// Logs `[METHOD uri] [status] Nms` for every request, and the full
/// headers and body at trace level with secrets redacted.
pub async fn print_request_response(
    req: Request,
    next: Next,
) -> std::result::Result<impl IntoResponse, (StatusCode, String)> {
    let start = Instant::now();
    let method = req.method().clone();
    let uri = req.uri().clone();

    let (parts, body) = req.into_parts();
    let bytes = buffer_and_print("request", &parts.headers, body).await?;
    let req = Request::from_parts(parts, Body::from(bytes));

    let res = next.run(req).await;
    let (parts, body) = res.into_parts();
    let bytes = buffer_and_print("response", &parts.headers, body).await?;
    let res = Response::from_parts(parts, Body::from(bytes));

    let elapsed = start.elapsed();
    let status = res.status().as_u16();
    let millis = elapsed.as_millis();

    if !res.status().is_success() {
        error!("[{method} {uri}] [{status}] {millis}ms");
    } else if elapsed > SLOW_REQUEST {
        warn!("[{method} {uri}] [{status}] {millis}ms");
    } else {
        info!("[{method} {uri}] [{status}] {millis}ms");
    }

    Ok(res)
}

fn redact(headers: &HeaderMap) -> HeaderMap {
    let mut headers = headers.clone();
    for name in SECRET_HEADERS {
        if headers.contains_key(*name) {
            headers.insert(*name, HeaderValue::from_static("[redacted]"));
        }
    }
    headers
}

async fn buffer_and_print<B>(
    direction: &str,
    headers: &HeaderMap,
    body: B,
) -> std::result::Result<Bytes, (StatusCode, String)>
where
    B: axum::body::HttpBody<Data = Bytes>,
    B::Error: std::fmt::Display,
{
    let bytes = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(err) => {
            return Err((
                StatusCode::BAD_REQUEST,
                format!("failed to read {direction} body: {err}"),
            ));
        }
    };

    if let Ok(body) = std::str::from_utf8(&bytes) {
        trace!(
            "{direction} headers = {:?} body = {body:?}",
            redact(headers)
        );
    }

    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redact_api_key() {
        let mut headers = HeaderMap::new();
        headers.insert("x-api-key", HeaderValue::from_static("secret"));
        headers.insert("content-type", HeaderValue::from_static("application/json"));

        let redacted = redact(&headers);
        assert_eq!(redacted["x-api-key"], "[redacted]");
        assert_eq!(redacted["content-type"], "application/json");
        assert_eq!(headers["x-api-key"], "secret");
    }
}
