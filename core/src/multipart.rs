//! `multipart/form-data` encoding for file uploads.
//!
//! The upload endpoint takes a single file field, so this only supports file
//! parts. The boundary is generated per form from a random UUID, which makes
//! a collision with file content practically impossible.

use uuid::Uuid;

pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// An in-memory multipart form body.
#[derive(Debug, Clone)]
pub struct Form {
    boundary: String,
    body: Vec<u8>,
}

impl Form {
    pub fn new() -> Self {
        Self::with_boundary(format!("friendly-{}", Uuid::new_v4().simple()))
    }

    pub fn with_boundary(boundary: impl Into<String>) -> Self {
        Self {
            boundary: boundary.into(),
            body: Vec::new(),
        }
    }

    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// Value for the request's `Content-Type` header.
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    /// Append a file part. `content_type` falls back to
    /// `application/octet-stream`.
    pub fn file(mut self, field: &str, filename: &str, content_type: Option<&str>, data: &[u8]) -> Self {
        let header = format!(
            "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
            self.boundary,
            escape_quotes(field),
            escape_quotes(filename),
            content_type.unwrap_or(DEFAULT_CONTENT_TYPE),
        );
        self.body.extend_from_slice(header.as_bytes());
        self.body.extend_from_slice(data);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    /// Close the form and return the encoded body.
    pub fn finish(mut self) -> Vec<u8> {
        self.body.extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        self.body
    }
}

impl Default for Form {
    fn default() -> Self {
        Self::new()
    }
}

fn escape_quotes(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_file_part_layout() {
        let body = Form::with_boundary("XYZ")
            .file("file", "cat.png", Some("image/png"), b"\x89PNG")
            .finish();
        let expected = b"--XYZ\r\n\
Content-Disposition: form-data; name=\"file\"; filename=\"cat.png\"\r\n\
Content-Type: image/png\r\n\
\r\n\
\x89PNG\r\n\
--XYZ--\r\n";
        assert_eq!(body, expected.to_vec());
    }

    #[test]
    fn default_content_type_is_octet_stream() {
        let body = Form::with_boundary("b").file("file", "blob", None, b"").finish();
        let text = String::from_utf8(body).unwrap();
        assert!(text.contains("Content-Type: application/octet-stream\r\n"));
    }

    #[test]
    fn filename_quotes_are_escaped() {
        let body = Form::with_boundary("b").file("file", "a\"b.txt", None, b"x").finish();
        let text = String::from_utf8(body).unwrap();
        assert!(text.contains(r#"filename="a\"b.txt""#));
    }

    #[test]
    fn boundaries_differ_between_forms() {
        let a = Form::new();
        let b = Form::new();
        assert_ne!(a.boundary(), b.boundary());
        assert_eq!(a.content_type(), format!("multipart/form-data; boundary={}", a.boundary()));
    }
}
