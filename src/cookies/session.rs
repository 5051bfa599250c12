use std::sync::{PoisonError, RwLock};

use reqwest::header::HeaderValue;
use url::Url;

use crate::cookies::{Cookie, CookieJar, MemoryCookieJar};

/// Request-scoped cookie jar handed to the transport as its cookie provider.
///
/// A fresh jar is created for every send and discarded afterwards. Cookies received
/// on one redirect hop are sent on the following hops of the same send.
#[derive(Debug, Default)]
pub struct SessionCookieJar {
    inner: RwLock<MemoryCookieJar>,
}

impl SessionCookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the cookies currently held for the origin of `url`.
    pub fn cookies_for(&self, url: &Url) -> Vec<Cookie> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .cookies_for_origin(url)
            .to_vec()
    }

    pub fn len(&self) -> usize {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl reqwest::cookie::CookieStore for SessionCookieJar {
    fn set_cookies(&self, cookie_headers: &mut dyn Iterator<Item = &HeaderValue>, url: &Url) {
        let mut values = cookie_headers.filter_map(|v| v.to_str().ok());
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .store_response_cookies(url, &mut values);
    }

    fn cookies(&self, url: &Url) -> Option<HeaderValue> {
        let header = self
            .inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get_request_cookies(url)?;
        HeaderValue::from_str(&header).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::cookie::CookieStore;

    #[test]
    fn acts_as_reqwest_cookie_provider() {
        let jar = SessionCookieJar::new();
        let url = Url::parse("https://example.com/login").unwrap();

        let headers = [HeaderValue::from_static("sid=42; Path=/")];
        jar.set_cookies(&mut headers.iter(), &url);

        assert_eq!(jar.len(), 1);
        let value = jar.cookies(&Url::parse("https://example.com/home").unwrap()).unwrap();
        assert_eq!(value.to_str().unwrap(), "sid=42");
        assert_eq!(jar.cookies_for(&url)[0].name, "sid");
    }

    #[test]
    fn fresh_jars_are_independent() {
        let a = SessionCookieJar::new();
        let b = SessionCookieJar::new();
        let url = Url::parse("https://example.com/").unwrap();

        a.set_cookies(&mut [HeaderValue::from_static("k=v")].iter(), &url);
        assert!(!a.is_empty());
        assert!(b.is_empty());
        assert!(b.cookies(&url).is_none());
    }
}
