//! Request dispatch module
//!
//! Entry point for HTTP request processing: method and content-type checks,
//! multipart extraction, validation, and mapping each outcome to a JSON response.

use crate::config::AppState;
use crate::http;
use crate::logger::{self, AccessLogEntry, UploadRecord};
use crate::upload::{self, metadata, FormField, UploadError, UploadResponse};
use http_body_util::Full;
use hyper::body::{Body, Bytes};
use hyper::header::{HeaderMap, HeaderName, CONTENT_LENGTH, CONTENT_TYPE, USER_AGENT};
use hyper::{Method, Request, Response, StatusCode};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

pub const METHOD_NOT_ALLOWED: &str = "Method not allowed. Only POST requests are accepted.";
pub const WRONG_CONTENT_TYPE: &str = "Content-Type must be multipart/form-data";
pub const NO_FILE_PROVIDED: &str = "No file provided. Please include a file in the \"file\" field.";

/// Main entry point for HTTP request handling
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    peer_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible>
where
    B: Body<Data = Bytes> + Send + 'static,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let started = Instant::now();
    let access_entry = state
        .config
        .logging
        .access_log
        .then(|| build_access_entry(&req, peer_addr));

    let response = dispatch(req, &state).await;

    if let Some(mut entry) = access_entry {
        entry.status = response.status().as_u16();
        entry.body_bytes = response
            .body()
            .size_hint()
            .exact()
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or_default();
        entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(&entry, &state.config.logging.access_log_format);
    }

    Ok(response)
}

/// Run the decision sequence; the first matching branch answers
async fn dispatch<B>(req: Request<B>, state: &AppState) -> Response<Full<Bytes>>
where
    B: Body<Data = Bytes> + Send + 'static,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let server_name = state.config.http.server_name.as_str();

    match *req.method() {
        Method::OPTIONS => return http::build_options_response(server_name),
        Method::POST => {}
        _ => return reject(StatusCode::METHOD_NOT_ALLOWED, METHOD_NOT_ALLOWED, server_name),
    }

    let Some(content_type) = multipart_content_type(req.headers()) else {
        return reject(StatusCode::BAD_REQUEST, WRONG_CONTENT_TYPE, server_name);
    };

    let field = match upload::extract_file_field(
        &content_type,
        req.into_body(),
        state.config.http.max_body_size,
    )
    .await
    {
        Ok(field) => field,
        Err(e) => {
            let message = upload_failure_message(&e);
            logger::log_error(&message);
            return reject(StatusCode::INTERNAL_SERVER_ERROR, message, server_name);
        }
    };

    let FormField::File(file) = field else {
        return reject(StatusCode::BAD_REQUEST, NO_FILE_PROVIDED, server_name);
    };

    let verdict = upload::validate(&file);
    if !verdict.valid {
        let reason = verdict
            .reason
            .unwrap_or_else(|| "File validation failed".to_string());
        return reject(StatusCode::BAD_REQUEST, reason, server_name);
    }

    let response = UploadResponse::accepted(metadata::extract(&file));
    logger::log_upload(&UploadRecord {
        name: &file.name,
        size: file.size,
        declared_type: &file.declared_type,
        timestamp: response.timestamp(),
    });
    http::build_json_response(StatusCode::OK, &response, server_name)
}

fn reject(status: StatusCode, error: impl Into<String>, server_name: &str) -> Response<Full<Bytes>> {
    http::build_json_response(status, &UploadResponse::rejected(error), server_name)
}

/// Content-Type header value, if it announces multipart form data
fn multipart_content_type(headers: &HeaderMap) -> Option<String> {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .filter(|ct| ct.to_ascii_lowercase().contains("multipart/form-data"))
        .map(ToString::to_string)
}

fn upload_failure_message(err: &UploadError) -> String {
    let detail = err.to_string();
    if detail.trim().is_empty() {
        "File upload failed: Unknown error".to_string()
    } else {
        format!("File upload failed: {detail}")
    }
}

fn build_access_entry<B>(req: &Request<B>, peer_addr: SocketAddr) -> AccessLogEntry {
    let header = |name: HeaderName| {
        req.headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string)
    };

    let mut entry = AccessLogEntry::new(
        peer_addr.ip().to_string(),
        req.method().to_string(),
        req.uri().path().to_string(),
    );
    entry.query = req.uri().query().map(ToString::to_string);
    entry.http_version = format!("{:?}", req.version())
        .trim_start_matches("HTTP/")
        .to_string();
    entry.user_agent = header(USER_AGENT);
    entry.content_length = header(CONTENT_LENGTH).and_then(|v| v.parse().ok());
    entry
}
