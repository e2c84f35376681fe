//! Constraint validator
//!
//! Checks run in a fixed order and stop at the first failure:
//! size ceiling, non-empty, allowed MIME type.

use super::types::{UploadFile, ValidationResult};

/// Largest accepted file (100 MiB)
pub const MAX_FILE_SIZE: u64 = 104_857_600;

/// MIME types accepted as declared by the client
pub const ALLOWED_TYPES: [&str; 10] = [
    "text/plain",
    "text/csv",
    "application/json",
    "application/pdf",
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/webp",
    "application/zip",
    "application/x-zip-compressed",
];

/// Validate an uploaded file against the size and type constraints
///
/// # Examples
/// ```
/// use upload_validator::upload::{validate, UploadFile};
/// let file = UploadFile {
///     name: "a.txt".to_string(),
///     size: 0,
///     declared_type: "text/plain".to_string(),
///     last_modified: None,
/// };
/// assert_eq!(validate(&file).reason.as_deref(), Some("File is empty"));
/// ```
pub fn validate(file: &UploadFile) -> ValidationResult {
    if file.size > MAX_FILE_SIZE {
        return ValidationResult::fail(format!(
            "File size {} bytes exceeds maximum allowed size of {MAX_FILE_SIZE} bytes (100MB)",
            file.size
        ));
    }

    if file.size == 0 {
        return ValidationResult::fail("File is empty");
    }

    if !ALLOWED_TYPES.contains(&file.declared_type.as_str()) {
        return ValidationResult::fail(format!(
            "File type '{}' is not allowed. Allowed types: {}",
            file.declared_type,
            ALLOWED_TYPES.join(", ")
        ));
    }

    ValidationResult::pass()
}
