// Metadata projection for accepted uploads

use super::types::{FileMetadata, UploadFile};

/// Project an upload into its public metadata. Never fails.
pub fn extract(file: &UploadFile) -> FileMetadata {
    FileMetadata {
        name: file.name.clone(),
        size: file.size,
        declared_type: file.declared_type.clone(),
        last_modified: file.last_modified,
    }
}
