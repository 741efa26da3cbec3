use axum::{
    body::{Bytes, to_bytes},
    extract::Request,
    http::{HeaderMap, HeaderValue, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::{error::INVALID_CREDENTIALS_MESSAGE, response::JsonApiResponse};

const MAX_ERROR_BODY_BYTES: usize = 16 * 1024;

/// Rewrites plain-text error bodies (extractor rejections, 404/405 fallbacks)
/// into the JSON envelope.
pub async fn json_error_middleware(req: Request, next: Next) -> Response {
    let response = next.run(req).await;

    let status = response.status();
    if !status.is_client_error() && !status.is_server_error() {
        return response;
    }
    if is_json_response(&response) {
        return response;
    }

    let (parts, body) = response.into_parts();
    let message = match status {
        StatusCode::UNAUTHORIZED => INVALID_CREDENTIALS_MESSAGE.to_string(),
        _ if status.is_server_error() => default_message(status),
        _ => match to_bytes(body, MAX_ERROR_BODY_BYTES).await {
            Ok(bytes) => body_bytes_to_message(status, bytes),
            Err(_) => default_message(status),
        },
    };
    if status.is_server_error() {
        tracing::error!(status = status.as_u16(), "non-json server error rewritten");
    }

    let mut new_response = JsonApiResponse::failure(status, message).into_response();
    copy_headers(&parts.headers, &mut new_response);
    if status == StatusCode::UNAUTHORIZED {
        new_response
            .headers_mut()
            .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
    }
    new_response
}

fn is_json_response(response: &Response) -> bool {
    response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| {
            let value = value.to_ascii_lowercase();
            value.contains("application/json") || value.contains("+json")
        })
        .unwrap_or(false)
}

fn body_bytes_to_message(status: StatusCode, bytes: Bytes) -> String {
    let message = String::from_utf8_lossy(&bytes).trim().to_string();
    if message.is_empty() {
        return default_message(status);
    }
    message
}

fn default_message(status: StatusCode) -> String {
    status
        .canonical_reason()
        .unwrap_or("Request failed")
        .to_string()
}

fn copy_headers(src: &HeaderMap, dest: &mut Response) {
    for (name, value) in src {
        if name == header::CONTENT_TYPE || name == header::CONTENT_LENGTH {
            continue;
        }
        dest.headers_mut().insert(name.clone(), value.clone());
    }
}

#[cfg(test)]
mod tests {
    use axum::{
        Router,
        body::{Body, to_bytes},
        http::{Request, StatusCode},
        middleware,
        routing::get,
    };
    use tower::ServiceExt;

    use super::json_error_middleware;

    async fn call(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .layer(middleware::from_fn(json_error_middleware))
            .oneshot(
                Request::builder()
                    .uri(uri)
                    .body(Body::empty())
                    .expect("request should build"),
            )
            .await
            .expect("request should succeed");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body should read");
        (
            status,
            serde_json::from_slice(&bytes).expect("body should be json"),
        )
    }

    #[tokio::test]
    async fn plain_text_errors_become_envelopes() {
        let app = Router::new().route(
            "/teapot",
            get(|| async { (StatusCode::BAD_REQUEST, "missing field `name`") }),
        );

        let (status, json) = call(app, "/teapot").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["status"], 400);
        assert_eq!(json["message"], "missing field `name`");
        assert!(json["data"].is_null());
    }

    #[tokio::test]
    async fn unknown_routes_get_json_404() {
        let (status, json) = call(Router::new(), "/nowhere").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["message"], "Not Found");
    }
}
