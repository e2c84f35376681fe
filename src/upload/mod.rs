//! Upload module
//!
//! Request-scoped upload handling:
//! - Multipart extraction of the `file` field
//! - Ordered size/type constraint checks
//! - Metadata projection for the response

pub mod extract;
pub mod metadata;
pub mod types;
pub mod validator;

pub use extract::{extract_file_field, UploadError, FILE_FIELD};
pub use types::{FileMetadata, FormField, UploadFile, UploadResponse, ValidationResult};
pub use validator::{validate, ALLOWED_TYPES, MAX_FILE_SIZE};
