//! HTTP response building module
//!
//! Builders for the preflight and JSON responses. Every builder attaches
//! `Access-Control-Allow-Origin: *`, including the fallbacks used when a
//! response cannot be built normally.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{
    HeaderValue, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
    ACCESS_CONTROL_ALLOW_ORIGIN, ALLOW, CONTENT_TYPE,
};
use hyper::{Response, StatusCode};
use serde::Serialize;

use crate::upload::UploadResponse;

pub const ALLOWED_METHODS: &str = "POST, OPTIONS";
pub const ALLOWED_HEADERS: &str = "Content-Type";

const INTERNAL_ERROR: &str = "Internal server error";

/// Build OPTIONS response (CORS preflight), empty body
pub fn build_options_response(server_name: &str) -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::OK)
        .header("Server", server_name)
        .header(ACCESS_CONTROL_ALLOW_ORIGIN, "*")
        .header(ACCESS_CONTROL_ALLOW_METHODS, ALLOWED_METHODS)
        .header(ACCESS_CONTROL_ALLOW_HEADERS, ALLOWED_HEADERS)
        .body(Full::new(Bytes::new()))
        .unwrap_or_else(|e| {
            log_build_error("OPTIONS", &e);
            let mut resp = fallback_response(StatusCode::OK, Bytes::new());
            let headers = resp.headers_mut();
            headers.insert(
                ACCESS_CONTROL_ALLOW_METHODS,
                HeaderValue::from_static(ALLOWED_METHODS),
            );
            headers.insert(
                ACCESS_CONTROL_ALLOW_HEADERS,
                HeaderValue::from_static(ALLOWED_HEADERS),
            );
            resp
        })
}

/// Build JSON response with CORS header
pub fn build_json_response<T: Serialize>(
    status: StatusCode,
    body: &T,
    server_name: &str,
) -> Response<Full<Bytes>> {
    let json = match serde_json::to_vec(body) {
        Ok(j) => Bytes::from(j),
        Err(e) => {
            crate::logger::log_error(&format!("Failed to serialize response: {e}"));
            return json_fallback(StatusCode::INTERNAL_SERVER_ERROR, internal_error_body());
        }
    };

    let mut builder = Response::builder()
        .status(status)
        .header(CONTENT_TYPE, "application/json")
        .header("Server", server_name)
        .header(ACCESS_CONTROL_ALLOW_ORIGIN, "*");

    if status == StatusCode::METHOD_NOT_ALLOWED {
        builder = builder.header(ALLOW, ALLOWED_METHODS);
    }

    builder.body(Full::new(json.clone())).unwrap_or_else(|e| {
        log_build_error(status.as_str(), &e);
        json_fallback(status, json)
    })
}

/// `rejected` body for failures that happen after the handler decided
fn internal_error_body() -> Bytes {
    serde_json::to_vec(&UploadResponse::rejected(INTERNAL_ERROR)).map_or_else(
        |_| Bytes::from_static(br#"{"success":false,"error":"Internal server error"}"#),
        Bytes::from,
    )
}

fn json_fallback(status: StatusCode, body: Bytes) -> Response<Full<Bytes>> {
    let mut resp = fallback_response(status, body);
    resp.headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    if status == StatusCode::METHOD_NOT_ALLOWED {
        resp.headers_mut()
            .insert(ALLOW, HeaderValue::from_static(ALLOWED_METHODS));
    }
    resp
}

/// Response assembled from static headers only, so it cannot fail
fn fallback_response(status: StatusCode, body: Bytes) -> Response<Full<Bytes>> {
    let mut resp = Response::new(Full::new(body));
    *resp.status_mut() = status;
    resp.headers_mut()
        .insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    resp
}

/// Log response build error
fn log_build_error(status: &str, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    const BAD_SERVER_NAME: &str = "upload\nvalidator";

    struct Unserializable;

    impl Serialize for Unserializable {
        fn serialize<S: serde::Serializer>(&self, _: S) -> Result<S::Ok, S::Error> {
            Err(serde::ser::Error::custom("not representable"))
        }
    }

    #[tokio::test]
    async fn test_options_response() {
        let resp = build_options_response("test");
        assert_eq!(resp.status(), StatusCode::OK);
        let headers = resp.headers();
        assert_eq!(headers["Access-Control-Allow-Origin"], "*");
        assert_eq!(headers["Access-Control-Allow-Methods"], "POST, OPTIONS");
        assert_eq!(headers["Access-Control-Allow-Headers"], "Content-Type");
        assert!(headers.get("Content-Type").is_none());

        let body = resp.into_body().collect().await.unwrap().to_bytes();
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn test_json_response_headers() {
        let resp = build_json_response(
            StatusCode::BAD_REQUEST,
            &serde_json::json!({"success": false}),
            "upload-validator",
        );
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(resp.headers()["Content-Type"], "application/json");
        assert_eq!(resp.headers()["Access-Control-Allow-Origin"], "*");
        assert_eq!(resp.headers()["Server"], "upload-validator");
        assert!(resp.headers().get("Allow").is_none());

        let body = resp.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], br#"{"success":false}"#);
    }

    #[test]
    fn test_405_advertises_allowed_methods() {
        let resp = build_json_response(
            StatusCode::METHOD_NOT_ALLOWED,
            &serde_json::json!({}),
            "s",
        );
        assert_eq!(resp.headers()["Allow"], "POST, OPTIONS");
    }

    #[tokio::test]
    async fn test_bad_server_name_keeps_cors_and_body() {
        let resp = build_json_response(
            StatusCode::OK,
            &serde_json::json!({"success": true}),
            BAD_SERVER_NAME,
        );
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()["Access-Control-Allow-Origin"], "*");
        assert_eq!(resp.headers()["Content-Type"], "application/json");
        assert!(resp.headers().get("Server").is_none());

        let body = resp.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], br#"{"success":true}"#);

        let resp = build_json_response(StatusCode::METHOD_NOT_ALLOWED, &(), BAD_SERVER_NAME);
        assert_eq!(resp.headers()["Allow"], "POST, OPTIONS");

        let resp = build_options_response(BAD_SERVER_NAME);
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()["Access-Control-Allow-Origin"], "*");
        assert_eq!(resp.headers()["Access-Control-Allow-Methods"], "POST, OPTIONS");
    }

    #[tokio::test]
    async fn test_serialization_failure_is_a_rejected_response() {
        let resp = build_json_response(StatusCode::OK, &Unserializable, "upload-validator");
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(resp.headers()["Access-Control-Allow-Origin"], "*");
        assert_eq!(resp.headers()["Content-Type"], "application/json");

        let body = resp.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "Internal server error");
        let timestamp = json["timestamp"].as_str().unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(timestamp).is_ok());
    }
}
