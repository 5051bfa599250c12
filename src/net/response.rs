//! Minimal HTTP response model.
//!
//! This struct represents a **fully buffered** HTTP response returned by the
//! transport. It contains the final URL (after redirects), status code + reason,
//! response headers, and the raw body bytes.
//!
//! ## Notes
//! - The body is stored as raw `Vec<u8>`, already decompressed when the config
//!   asked for decompression. `received_bytes` is the size of the body as it
//!   came over the wire, before any decoding.
//! - `headers` is an `http::HeaderMap`, which is **case-insensitive** for
//!   header names.
//! - `status_text` is derived from the status code's canonical reason phrase and
//!   is `"Unknown"` for non-standard codes.
//!
use http::header::CONTENT_TYPE;
use http::HeaderMap;

use crate::model::Header;

/// Simple structure for HTTP responses.
#[derive(Debug)]
pub struct Response {
    /// Final URL of the response (after redirects, if any).
    pub url: url::Url,

    /// Numeric HTTP status code (e.g., `200`, `404`).
    pub status: u16,

    /// Human-readable reason phrase (e.g., `"OK"`, `"Not Found"`).
    pub status_text: String,

    /// Response headers as a case-insensitive map.
    pub headers: HeaderMap,

    /// Response body bytes, decoded.
    pub body: Vec<u8>,

    /// Length of the body as received, before content decoding.
    pub received_bytes: u64,
}

impl Response {
    /// Value of the `Content-Type` header, if present and valid UTF-8.
    pub fn content_type(&self) -> Option<String> {
        self.headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    }

    /// Number of body bytes received over the wire.
    pub fn bytes(&self) -> u64 {
        self.received_bytes
    }

    /// Snapshot of all headers as name/value pairs. A header with several values
    /// yields one pair per value.
    pub fn header_list(&self) -> Vec<Header> {
        self.headers
            .iter()
            .map(|(k, v)| Header::new(k.as_str(), String::from_utf8_lossy(v.as_bytes())))
            .collect()
    }
}
