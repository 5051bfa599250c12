//! Cookie jar abstraction and a simple in-memory implementation.
//!
//! [`MemoryCookieJar`] parses a subset of RFC 6265 `Set-Cookie` semantics:
//! `Path`, `Domain` (leading dot stripped), `Expires` (stored raw), `SameSite`,
//! `Secure` and `HttpOnly`. `Max-Age`, size limits and expiry enforcement are not
//! implemented; the jar only lives for a single send.
//!
//! Cookies are bucketed by **origin** (`url.origin().ascii_serialization()`).
//! Within a bucket, host/subdomain and path prefix checks are applied.
use std::collections::HashMap;

use url::Url;

use crate::cookies::Cookie;

/// A cookie jar keeps cookies keyed by origin.
pub trait CookieJar: Send + Sync {
    /// Stores cookies from raw `Set-Cookie` header values received for `url`.
    ///
    /// Cookies with the same name replace earlier ones (last write wins).
    fn store_response_cookies<'a>(&mut self, url: &Url, set_cookie: &mut dyn Iterator<Item = &'a str>);

    /// Returns the `Cookie` request header value to send for `url`, if any.
    fn get_request_cookies(&self, url: &Url) -> Option<String>;

    /// Removes all cookies from the jar.
    fn clear(&mut self);

    /// Number of cookies in the jar across all origins.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-memory cookie jar (no persistence).
#[derive(Debug, Clone, Default)]
pub struct MemoryCookieJar {
    /// Key: origin string. Value: cookies for that origin.
    entries: HashMap<String, Vec<Cookie>>,
}

impl MemoryCookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    /// All cookies stored for the origin of `url`.
    pub fn cookies_for_origin(&self, url: &Url) -> &[Cookie] {
        self.entries
            .get(&url.origin().ascii_serialization())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

fn parse_set_cookie(header: &str, default_path: &str) -> Option<Cookie> {
    let (name, rest) = header.split_once('=')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }

    let mut parts = rest.split(';');
    let mut cookie = Cookie {
        name: name.to_string(),
        value: parts.next().unwrap_or_default().trim().to_string(),
        path: None,
        domain: None,
        secure: false,
        expires: None,
        same_site: None,
        http_only: false,
    };

    for part in parts {
        let part = part.trim();
        if let Some((k, v)) = part.split_once('=') {
            let v = v.trim();
            match k.trim().to_ascii_lowercase().as_str() {
                "path" => cookie.path = Some(v.to_string()),
                "domain" => cookie.domain = Some(v.trim_start_matches('.').to_string()),
                "expires" => cookie.expires = Some(v.to_string()),
                "samesite" => {
                    let normalized = if v.eq_ignore_ascii_case("lax") {
                        "Lax"
                    } else if v.eq_ignore_ascii_case("strict") {
                        "Strict"
                    } else if v.eq_ignore_ascii_case("none") {
                        "None"
                    } else {
                        v
                    };
                    cookie.same_site = Some(normalized.to_string());
                }
                _ => {}
            }
        } else if part.eq_ignore_ascii_case("secure") {
            cookie.secure = true;
        } else if part.eq_ignore_ascii_case("httponly") {
            cookie.http_only = true;
        }
    }

    if cookie.path.is_none() {
        cookie.path = Some(default_path.to_string());
    }

    Some(cookie)
}

impl CookieJar for MemoryCookieJar {
    fn store_response_cookies<'a>(&mut self, url: &Url, set_cookie: &mut dyn Iterator<Item = &'a str>) {
        let origin = url.origin().ascii_serialization();
        let default_path = url.path().rsplit_once('/').map_or("/", |(a, _)| if a.is_empty() { "/" } else { a });

        let bucket = self.entries.entry(origin).or_default();

        for cookie in set_cookie.filter_map(|h| parse_set_cookie(h, default_path)) {
            if let Some(existing) = bucket.iter_mut().find(|c| c.name == cookie.name) {
                *existing = cookie;
            } else {
                bucket.push(cookie);
            }
        }
    }

    fn get_request_cookies(&self, url: &Url) -> Option<String> {
        let host = url.host_str().unwrap_or_default();
        let path = url.path();
        let is_https = url.scheme() == "https";

        let header = self
            .cookies_for_origin(url)
            .iter()
            .filter(|cookie| match &cookie.domain {
                Some(domain) => host == domain || host.ends_with(&format!(".{}", domain)),
                None => true,
            })
            .filter(|cookie| match &cookie.path {
                Some(cookie_path) => path.starts_with(cookie_path.as_str()),
                None => true,
            })
            .filter(|cookie| !cookie.secure || is_https)
            .map(|c| format!("{}={}", c.name, c.value))
            .collect::<Vec<_>>()
            .join("; ");

        if header.is_empty() {
            None
        } else {
            Some(header)
        }
    }

    fn clear(&mut self) {
        self.entries.clear();
    }

    fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }
}
