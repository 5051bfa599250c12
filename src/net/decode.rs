//! Content-Encoding handling.
//!
//! The transport reads the body exactly as it came over the wire so that the byte
//! count reflects what was received. [`decode_content`] then undoes the codings
//! listed in `Content-Encoding`, last applied first.
use std::io::Read;

use flate2::read::{DeflateDecoder, MultiGzDecoder, ZlibDecoder};
use http::header::CONTENT_ENCODING;
use http::HeaderMap;

/// Value sent as `Accept-Encoding` when decompression is enabled.
pub const ACCEPT_ENCODING: &str = "gzip, deflate, br";

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("unsupported content encoding: {0}")]
    Unsupported(String),

    #[error("failed to decode {coding} body: {source}")]
    Corrupt {
        coding: String,
        #[source]
        source: std::io::Error,
    },
}

/// Decodes `body` according to every `Content-Encoding` header in `headers`.
pub fn decode_content(headers: &HeaderMap, body: Vec<u8>) -> Result<Vec<u8>, DecodeError> {
    let codings: Vec<String> = headers
        .get_all(CONTENT_ENCODING)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .map(|c| c.trim().to_ascii_lowercase())
        .filter(|c| !c.is_empty() && c != "identity")
        .collect();

    codings.iter().rev().try_fold(body, |body, coding| decode_one(coding, body))
}

fn decode_one(coding: &str, body: Vec<u8>) -> Result<Vec<u8>, DecodeError> {
    if body.is_empty() {
        return Ok(body);
    }

    let corrupt = |source| DecodeError::Corrupt { coding: coding.to_string(), source };
    let mut out = Vec::with_capacity(body.len() * 2);
    match coding {
        "gzip" | "x-gzip" => {
            MultiGzDecoder::new(body.as_slice()).read_to_end(&mut out).map_err(corrupt)?;
        }
        "deflate" => {
            // Servers disagree on whether deflate means zlib-wrapped or raw
            if ZlibDecoder::new(body.as_slice()).read_to_end(&mut out).is_err() {
                out.clear();
                DeflateDecoder::new(body.as_slice()).read_to_end(&mut out).map_err(corrupt)?;
            }
        }
        "br" => {
            brotli::Decompressor::new(body.as_slice(), 4096)
                .read_to_end(&mut out)
                .map_err(corrupt)?;
        }
        other => return Err(DecodeError::Unsupported(other.to_string())),
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::{GzEncoder, ZlibEncoder};
    use flate2::Compression;
    use http::HeaderValue;
    use std::io::Write;

    fn encoded(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_ENCODING, HeaderValue::from_static(value));
        headers
    }

    fn gzip(data: &[u8]) -> Vec<u8> {
        let mut enc = GzEncoder::new(Vec::new(), Compression::default());
        enc.write_all(data).unwrap();
        enc.finish().unwrap()
    }

    #[test]
    fn no_encoding_passes_through() {
        let body = decode_content(&HeaderMap::new(), b"plain".to_vec()).unwrap();
        assert_eq!(body, b"plain");
        assert_eq!(decode_content(&encoded("identity"), b"plain".to_vec()).unwrap(), b"plain");
    }

    #[test]
    fn decodes_gzip() {
        let body = decode_content(&encoded("gzip"), gzip(b"hello hello hello")).unwrap();
        assert_eq!(body, b"hello hello hello");
    }

    #[test]
    fn decodes_zlib_deflate() {
        let mut enc = ZlibEncoder::new(Vec::new(), Compression::default());
        enc.write_all(b"deflated").unwrap();
        let body = decode_content(&encoded("deflate"), enc.finish().unwrap()).unwrap();
        assert_eq!(body, b"deflated");
    }

    #[test]
    fn decodes_brotli() {
        let mut compressed = Vec::new();
        {
            let mut w = brotli::CompressorWriter::new(&mut compressed, 4096, 5, 22);
            w.write_all(b"brotli body").unwrap();
        }
        let body = decode_content(&encoded("br"), compressed).unwrap();
        assert_eq!(body, b"brotli body");
    }

    #[test]
    fn stacked_codings_are_undone_in_reverse() {
        let twice = gzip(&gzip(b"twice"));
        let body = decode_content(&encoded("gzip, gzip"), twice).unwrap();
        assert_eq!(body, b"twice");
    }

    #[test]
    fn unknown_coding_is_an_error() {
        let err = decode_content(&encoded("zstd"), b"x".to_vec()).unwrap_err();
        assert!(matches!(err, DecodeError::Unsupported(c) if c == "zstd"));
    }

    #[test]
    fn corrupt_gzip_is_an_error() {
        let err = decode_content(&encoded("gzip"), b"not gzip".to_vec()).unwrap_err();
        assert!(matches!(err, DecodeError::Corrupt { .. }));
    }
}
