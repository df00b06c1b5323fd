//! Binary `multipart/mixed` payload encoding.
//!
//! Builds upload bodies part by part: headers are staged with
//! [`Multipart::add_header`] and committed by the next
//! [`Multipart::add_body`]. Bodies are raw bytes and are never transcoded.

use uuid::Uuid;

const CRLF: &[u8] = b"\r\n";

/// Incremental `multipart/mixed` encoder.
#[derive(Debug, Clone)]
pub struct Multipart {
    boundary: String,
    parts: Vec<Part>,
    staged: Vec<(String, String)>,
}

#[derive(Debug, Clone)]
struct Part {
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl Multipart {
    /// Create an encoder with a caller-supplied boundary.
    ///
    /// The boundary must not occur inside any part header or body; this is
    /// not validated here, so callers should use a unique random token such
    /// as [`random_boundary`].
    pub fn new(boundary: impl Into<String>) -> Self {
        Self {
            boundary: boundary.into(),
            parts: Vec::new(),
            staged: Vec::new(),
        }
    }

    /// Stage a header for the next part.
    pub fn add_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.staged.push((name.into(), value.into()));
    }

    /// Close one part: all staged headers plus the given body.
    pub fn add_body(&mut self, body: impl Into<Vec<u8>>) {
        self.parts.push(Part {
            headers: std::mem::take(&mut self.staged),
            body: body.into(),
        });
    }

    /// Number of committed parts.
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    /// Whether any part has been committed yet.
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// The `Content-Type` header value announcing this payload.
    pub fn content_type(&self) -> String {
        format!("multipart/mixed; boundary={}", self.boundary)
    }

    /// Encode all parts into the wire byte sequence.
    ///
    /// Each part is `--boundary` CRLF, one `name: value` CRLF line per
    /// header, a blank CRLF, the body bytes, CRLF; the payload ends with
    /// `--boundary--` CRLF. The total length is computed up front so the
    /// output buffer is allocated exactly once.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.encoded_len());
        for part in &self.parts {
            out.extend_from_slice(b"--");
            out.extend_from_slice(self.boundary.as_bytes());
            out.extend_from_slice(CRLF);
            for (name, value) in &part.headers {
                out.extend_from_slice(name.as_bytes());
                out.extend_from_slice(b": ");
                out.extend_from_slice(value.as_bytes());
                out.extend_from_slice(CRLF);
            }
            out.extend_from_slice(CRLF);
            out.extend_from_slice(&part.body);
            out.extend_from_slice(CRLF);
        }
        out.extend_from_slice(b"--");
        out.extend_from_slice(self.boundary.as_bytes());
        out.extend_from_slice(b"--");
        out.extend_from_slice(CRLF);
        debug_assert_eq!(out.len(), self.encoded_len());
        out
    }

    /// Exact byte length [`encode`](Self::encode) will produce.
    pub fn encoded_len(&self) -> usize {
        let boundary = self.boundary.len();
        let parts: usize = self
            .parts
            .iter()
            .map(|part| {
                let headers: usize = part
                    .headers
                    .iter()
                    .map(|(name, value)| name.len() + 2 + value.len() + 2)
                    .sum();
                // part opener + headers + blank line + body + trailing CRLF
                2 + boundary + 2 + headers + 2 + part.body.len() + 2
            })
            .sum();
        parts + 2 + boundary + 2 + 2
    }
}

/// A unique boundary token suitable for [`Multipart::new`].
pub fn random_boundary() -> String {
    Uuid::new_v4().to_string()
}
