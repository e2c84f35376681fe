//! Multipart form extraction
//!
//! Walks a `multipart/form-data` body with `multer` and reports what was
//! submitted under the `file` field. File payloads are counted chunk by chunk
//! and never buffered.

use std::fmt;

use chrono::Utc;
use http_body_util::{BodyExt, LengthLimitError, Limited};
use hyper::body::{Body, Bytes};

use super::types::{FormField, UploadFile};

/// Name of the form field carrying the upload
pub const FILE_FIELD: &str = "file";

/// Faults raised while reading the request body
#[derive(Debug)]
pub enum UploadError {
    /// Content type carries no usable boundary
    MissingBoundary(String),
    /// Body exceeded the configured ceiling
    PayloadTooLarge(u64),
    /// Malformed multipart data or a failed read
    Multipart(String),
}

impl fmt::Display for UploadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingBoundary(msg) | Self::Multipart(msg) => f.write_str(msg),
            Self::PayloadTooLarge(limit) => {
                write!(f, "Request body exceeds the {limit} byte limit")
            }
        }
    }
}

impl std::error::Error for UploadError {}

impl UploadError {
    fn from_multer(err: multer::Error, limit: u64) -> Self {
        match err {
            multer::Error::StreamReadFailed(inner) if inner.is::<LengthLimitError>() => {
                Self::PayloadTooLarge(limit)
            }
            other => Self::Multipart(other.to_string()),
        }
    }
}

/// Parse a multipart body and look up the `file` field
///
/// Every part is read so that a malformed body is reported even when the
/// `file` part comes first. Only the first part named `file` is considered.
pub async fn extract_file_field<B>(
    content_type: &str,
    body: B,
    max_body_size: u64,
) -> Result<FormField, UploadError>
where
    B: Body<Data = Bytes> + Send + 'static,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let boundary = multer::parse_boundary(content_type)
        .map_err(|e| UploadError::MissingBoundary(e.to_string()))?;

    let limit = usize::try_from(max_body_size).unwrap_or(usize::MAX);
    let stream = Limited::new(body, limit).into_data_stream();
    let mut multipart = multer::Multipart::new(stream, boundary);

    let mut found = FormField::Absent;

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| UploadError::from_multer(e, max_body_size))?
    {
        if field.name() != Some(FILE_FIELD) || found != FormField::Absent {
            continue;
        }

        found = match field.file_name().map(ToString::to_string) {
            Some(name) => {
                let declared_type = field
                    .content_type()
                    .map(|mime| mime.essence_str().to_string())
                    .unwrap_or_default();

                let mut size: u64 = 0;
                while let Some(chunk) = field
                    .chunk()
                    .await
                    .map_err(|e| UploadError::from_multer(e, max_body_size))?
                {
                    size = size.saturating_add(u64::try_from(chunk.len()).unwrap_or(u64::MAX));
                }

                FormField::File(UploadFile {
                    name,
                    size,
                    declared_type,
                    last_modified: Some(Utc::now().timestamp_millis()),
                })
            }
            None => FormField::Text(
                field
                    .text()
                    .await
                    .map_err(|e| UploadError::from_multer(e, max_body_size))?,
            ),
        };
    }

    Ok(found)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use http_body_util::Full;

    pub const BOUNDARY: &str = "X-UPLOAD-BOUNDARY";

    /// One part of a hand-built multipart body
    pub struct Part<'a> {
        pub name: &'a str,
        pub file_name: Option<&'a str>,
        pub content_type: Option<&'a str>,
        pub data: &'a [u8],
    }

    pub fn multipart_content_type() -> String {
        format!("multipart/form-data; boundary={BOUNDARY}")
    }

    pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
        let mut body = Vec::new();
        for part in parts {
            body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
            let mut disposition = format!("Content-Disposition: form-data; name=\"{}\"", part.name);
            if let Some(file_name) = part.file_name {
                disposition.push_str(&format!("; filename=\"{file_name}\""));
            }
            body.extend_from_slice(disposition.as_bytes());
            body.extend_from_slice(b"\r\n");
            if let Some(ct) = part.content_type {
                body.extend_from_slice(format!("Content-Type: {ct}\r\n").as_bytes());
            }
            body.extend_from_slice(b"\r\n");
            body.extend_from_slice(part.data);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    pub fn file_part<'a>(file_name: &'a str, content_type: &'a str, data: &'a [u8]) -> Part<'a> {
        Part {
            name: FILE_FIELD,
            file_name: Some(file_name),
            content_type: Some(content_type),
            data,
        }
    }

    async fn extract(parts: &[Part<'_>], limit: u64) -> Result<FormField, UploadError> {
        let body = Full::new(Bytes::from(multipart_body(parts)));
        extract_file_field(&multipart_content_type(), body, limit).await
    }

    #[tokio::test]
    async fn test_file_part_is_counted() {
        let field = extract(&[file_part("test.txt", "text/plain", b"hello world!")], 1 << 20)
            .await
            .unwrap();
        let FormField::File(file) = field else {
            panic!("expected file");
        };
        assert_eq!(file.name, "test.txt");
        assert_eq!(file.size, 12);
        assert_eq!(file.declared_type, "text/plain");
        assert!(file.last_modified.is_some());
    }

    #[tokio::test]
    async fn test_declared_type_parameters_are_stripped() {
        let field = extract(
            &[file_part("a.csv", "text/csv; charset=utf-8", b"a,b\n1,2\n")],
            1 << 20,
        )
        .await
        .unwrap();
        let FormField::File(file) = field else {
            panic!("expected file");
        };
        assert_eq!(file.declared_type, "text/csv");
    }

    #[tokio::test]
    async fn test_missing_content_type_is_empty() {
        let part = Part {
            name: FILE_FIELD,
            file_name: Some("raw"),
            content_type: None,
            data: b"abc",
        };
        let FormField::File(file) = extract(&[part], 1 << 20).await.unwrap() else {
            panic!("expected file");
        };
        assert_eq!(file.declared_type, "");
    }

    #[tokio::test]
    async fn test_text_field_named_file() {
        let part = Part {
            name: FILE_FIELD,
            file_name: None,
            content_type: None,
            data: b"not a file",
        };
        let field = extract(&[part], 1 << 20).await.unwrap();
        assert_eq!(field, FormField::Text("not a file".to_string()));
    }

    #[tokio::test]
    async fn test_absent_when_other_fields_only() {
        let part = Part {
            name: "description",
            file_name: None,
            content_type: None,
            data: b"hello",
        };
        assert_eq!(extract(&[part], 1 << 20).await.unwrap(), FormField::Absent);
    }

    #[tokio::test]
    async fn test_first_file_part_wins() {
        let field = extract(
            &[
                Part {
                    name: "note",
                    file_name: None,
                    content_type: None,
                    data: b"skip me",
                },
                file_part("first.png", "image/png", b"12345"),
                file_part("second.gif", "image/gif", b"1"),
            ],
            1 << 20,
        )
        .await
        .unwrap();
        let FormField::File(file) = field else {
            panic!("expected file");
        };
        assert_eq!(file.name, "first.png");
        assert_eq!(file.size, 5);
    }

    #[tokio::test]
    async fn test_missing_boundary() {
        let body = Full::new(Bytes::from_static(b"irrelevant"));
        let err = extract_file_field("multipart/form-data", body, 1024)
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::MissingBoundary(_)));
        assert!(!err.to_string().is_empty());
    }

    #[tokio::test]
    async fn test_body_over_ceiling() {
        let data = vec![b'a'; 4096];
        let err = extract(&[file_part("big.txt", "text/plain", &data)], 1024)
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::PayloadTooLarge(1024)), "{err:?}");
        assert_eq!(err.to_string(), "Request body exceeds the 1024 byte limit");
    }

    #[tokio::test]
    async fn test_truncated_body_is_an_error() {
        let mut body = multipart_body(&[file_part("t.txt", "text/plain", b"data")]);
        body.truncate(body.len() - 12);
        let err = extract_file_field(
            &multipart_content_type(),
            Full::new(Bytes::from(body)),
            1 << 20,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, UploadError::Multipart(_)), "{err:?}");
    }
}
