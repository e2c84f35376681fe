// Upload data types
// Request-scoped descriptors and the JSON response shape

use chrono::{SecondsFormat, Utc};
use serde::Serialize;

/// A file part received in a multipart request
///
/// Only the descriptor is kept; the payload bytes are counted and dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub name: String,
    /// Size in bytes
    pub size: u64,
    /// MIME type as claimed by the client
    pub declared_type: String,
    /// Epoch milliseconds
    pub last_modified: Option<i64>,
}

/// Lookup result for the `file` form field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormField {
    File(UploadFile),
    Text(String),
    Absent,
}

/// Outcome of the constraint checks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    pub valid: bool,
    pub reason: Option<String>,
}

impl ValidationResult {
    pub const fn pass() -> Self {
        Self {
            valid: true,
            reason: None,
        }
    }

    pub fn fail(reason: impl Into<String>) -> Self {
        Self {
            valid: false,
            reason: Some(reason.into()),
        }
    }
}

/// Public metadata returned for an accepted file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileMetadata {
    pub name: String,
    pub size: u64,
    #[serde(rename = "type")]
    pub declared_type: String,
    #[serde(rename = "lastModified", skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<i64>,
}

/// JSON body of every non-preflight response
///
/// Built only through [`UploadResponse::accepted`] and
/// [`UploadResponse::rejected`], so `success` always agrees with which of
/// `file` and `error` is present.
#[derive(Debug, Clone, Serialize)]
pub struct UploadResponse {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    file: Option<FileMetadata>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    timestamp: String,
}

impl UploadResponse {
    pub fn accepted(file: FileMetadata) -> Self {
        Self {
            success: true,
            file: Some(file),
            error: None,
            timestamp: now_iso8601(),
        }
    }

    pub fn rejected(error: impl Into<String>) -> Self {
        Self {
            success: false,
            file: None,
            error: Some(error.into()),
            timestamp: now_iso8601(),
        }
    }

    pub const fn success(&self) -> bool {
        self.success
    }

    pub const fn file(&self) -> Option<&FileMetadata> {
        self.file.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }
}

/// Current UTC time, e.g. `2024-05-01T12:00:00.123Z`
pub fn now_iso8601() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
