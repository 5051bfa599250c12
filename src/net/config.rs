//! Network-ready request configuration.
//!
//! [`build_request_config`] is a pure transformation from a resolved [`Request`]
//! into a [`RequestConfig`]:
//!
//! - a URL without `://` gets `https://` prepended,
//! - headers with an empty name are dropped, and for duplicate names the last
//!   value wins (the first occurrence keeps its position),
//! - basic auth is attached only when a username is present,
//! - the params are encoded and merged into the URL's query string,
//! - redirects are followed (10 hops max) and responses are decompressed.
//!
//! A [`ConfigPatch`] is applied last, so callers can override any field.
use std::sync::Arc;

use crate::config::SenderConfig;
use crate::cookies::SessionCookieJar;
use crate::model::Request;
use crate::net::querystring;

const SCHEME_SEPARATOR: &str = "://";
const DEFAULT_SCHEME: &str = "https://";

/// Headers keyed by name, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderMapping(Vec<(String, String)>);

impl HeaderMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `name` to `value`. An existing entry with the same name is overwritten
    /// in place.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.0.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.0.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.iter().find(|(n, _)| n == name).map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Basic authentication credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicAuth {
    pub user: String,
    pub pass: String,
}

/// Fully resolved parameters for one network call. Never persisted.
#[derive(Debug, Clone)]
pub struct RequestConfig {
    pub method: String,
    /// Absolute URL including the merged query string.
    pub url: String,
    pub headers: HeaderMapping,
    pub body: String,
    pub auth: Option<BasicAuth>,
    pub follow_redirect: bool,
    pub max_redirects: usize,
    /// Transparently decompress gzip/brotli/deflate response bodies.
    pub decompress: bool,
    /// Cookie jar for this call. `None` means cookies are not handled.
    pub cookie_jar: Option<Arc<SessionCookieJar>>,
}

impl PartialEq for RequestConfig {
    fn eq(&self, other: &Self) -> bool {
        let same_jar = match (&self.cookie_jar, &other.cookie_jar) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        };

        same_jar
            && self.method == other.method
            && self.url == other.url
            && self.headers == other.headers
            && self.body == other.body
            && self.auth == other.auth
            && self.follow_redirect == other.follow_redirect
            && self.max_redirects == other.max_redirects
            && self.decompress == other.decompress
    }
}

/// Field overrides applied over a computed [`RequestConfig`]. `None` keeps the
/// computed value.
#[derive(Debug, Clone, Default)]
pub struct ConfigPatch {
    pub method: Option<String>,
    pub url: Option<String>,
    pub headers: Option<HeaderMapping>,
    pub body: Option<String>,
    pub auth: Option<Option<BasicAuth>>,
    pub follow_redirect: Option<bool>,
    pub max_redirects: Option<usize>,
    pub decompress: Option<bool>,
    pub cookie_jar: Option<Arc<SessionCookieJar>>,
}

impl ConfigPatch {
    /// Patch used for every send: a fresh cookie jar and redirect following.
    pub fn for_send() -> Self {
        Self {
            cookie_jar: Some(Arc::new(SessionCookieJar::new())),
            follow_redirect: Some(true),
            ..Self::default()
        }
    }

    pub fn apply(self, mut config: RequestConfig) -> RequestConfig {
        if let Some(method) = self.method {
            config.method = method;
        }
        if let Some(url) = self.url {
            config.url = url;
        }
        if let Some(headers) = self.headers {
            config.headers = headers;
        }
        if let Some(body) = self.body {
            config.body = body;
        }
        if let Some(auth) = self.auth {
            config.auth = auth;
        }
        if let Some(follow) = self.follow_redirect {
            config.follow_redirect = follow;
        }
        if let Some(max) = self.max_redirects {
            config.max_redirects = max;
        }
        if let Some(decompress) = self.decompress {
            config.decompress = decompress;
        }
        if let Some(jar) = self.cookie_jar {
            config.cookie_jar = Some(jar);
        }
        config
    }
}

/// Builds a config with the default redirect/decompression policy.
pub fn build_request_config(request: &Request, patch: ConfigPatch) -> RequestConfig {
    build_request_config_with(request, &SenderConfig::default(), patch)
}

/// Builds a config taking the redirect/decompression policy from `sender`.
pub fn build_request_config_with(request: &Request, sender: &SenderConfig, patch: ConfigPatch) -> RequestConfig {
    let url = if request.url.contains(SCHEME_SEPARATOR) {
        request.url.clone()
    } else {
        format!("{DEFAULT_SCHEME}{}", request.url)
    };

    let mut headers = HeaderMapping::new();
    for header in request.headers.iter().filter(|h| !h.name.is_empty()) {
        headers.insert(header.name.as_str(), header.value.as_str());
    }

    let auth = (!request.authentication.username.is_empty()).then(|| BasicAuth {
        user: request.authentication.username.clone(),
        pass: request.authentication.password.clone(),
    });

    let qs = querystring::build_from_params(&request.params);

    let config = RequestConfig {
        method: request.method.clone(),
        url: querystring::join_url(&url, &qs),
        headers,
        body: request.body.text.clone(),
        auth,
        follow_redirect: sender.follow_redirects,
        max_redirects: sender.max_redirects,
        decompress: sender.decompress,
        cookie_jar: None,
    };

    patch.apply(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Authentication, Header, Param, RequestGroupId};

    fn request(url: &str) -> Request {
        Request::new(RequestGroupId::new(), "GET", url)
    }

    #[test]
    fn scheme_defaults_to_https() {
        let cfg = build_request_config(&request("example.com/api"), ConfigPatch::default());
        assert_eq!(cfg.url, "https://example.com/api");
    }

    #[test]
    fn existing_scheme_is_preserved() {
        for url in ["http://example.com/", "https://example.com/", "ftp://files.example.com/x"] {
            let cfg = build_request_config(&request(url), ConfigPatch::default());
            assert_eq!(cfg.url, url);
        }
    }

    #[test]
    fn params_are_merged_into_defaulted_url() {
        let mut req = request("example.com/api");
        req.params.push(Param::new("q", "1"));

        let cfg = build_request_config(&req, ConfigPatch::default());
        assert_eq!(cfg.url, "https://example.com/api?q=1");
        assert!(cfg.auth.is_none());
    }

    #[test]
    fn params_combine_with_existing_query() {
        let mut req = request("https://example.com/api?x=0");
        req.params.push(Param::new("q", "1"));
        req.params.push(Param::new("r", "2"));

        let cfg = build_request_config(&req, ConfigPatch::default());
        assert_eq!(cfg.url, "https://example.com/api?x=0&q=1&r=2");
    }

    #[test]
    fn repeated_params_are_all_sent() {
        let mut req = request("example.com/api");
        req.params.push(Param::new("tag", "a"));
        req.params.push(Param::new("tag", "a"));

        let cfg = build_request_config(&req, ConfigPatch::default());
        assert_eq!(cfg.url, "https://example.com/api?tag=a&tag=a");
    }

    #[test]
    fn empty_header_names_are_dropped() {
        let mut req = request("example.com");
        req.headers = vec![Header::new("", "disabled"), Header::new("Accept", "*/*")];

        let cfg = build_request_config(&req, ConfigPatch::default());
        assert_eq!(cfg.headers.len(), 1);
        assert!(!cfg.headers.contains(""));
        assert_eq!(cfg.headers.get("Accept"), Some("*/*"));
    }

    #[test]
    fn duplicate_headers_last_write_wins() {
        let mut req = request("example.com");
        req.headers = vec![
            Header::new("X-A", "1"),
            Header::new("X-B", "b"),
            Header::new("X-A", "2"),
        ];

        let cfg = build_request_config(&req, ConfigPatch::default());
        let all: Vec<_> = cfg.headers.iter().collect();
        assert_eq!(all, vec![("X-A", "2"), ("X-B", "b")]);
    }

    #[test]
    fn basic_auth_only_with_username() {
        let mut req = request("example.com");
        req.authentication = Authentication { username: "bob".into(), password: "pw".into() };
        let cfg = build_request_config(&req, ConfigPatch::default());
        assert_eq!(cfg.auth, Some(BasicAuth { user: "bob".into(), pass: "pw".into() }));

        req.authentication = Authentication { username: "alice".into(), password: String::new() };
        let cfg = build_request_config(&req, ConfigPatch::default());
        assert_eq!(cfg.auth, Some(BasicAuth { user: "alice".into(), pass: String::new() }));

        req.authentication = Authentication { username: String::new(), password: "pw".into() };
        let cfg = build_request_config(&req, ConfigPatch::default());
        assert!(cfg.auth.is_none());
    }

    #[test]
    fn fixed_policy_fields() {
        let cfg = build_request_config(&request("example.com"), ConfigPatch::default());
        assert!(cfg.follow_redirect);
        assert_eq!(cfg.max_redirects, 10);
        assert!(cfg.decompress);
        assert!(cfg.cookie_jar.is_none());
    }

    #[test]
    fn building_twice_is_identical() {
        let mut req = request("example.com/api");
        req.headers.push(Header::new("Accept", "application/json"));
        req.params.push(Param::new("q", "1"));
        req.authentication.username = "bob".into();

        let a = build_request_config(&req, ConfigPatch::default());
        let b = build_request_config(&req, ConfigPatch::default());
        assert_eq!(a, b);
    }

    #[test]
    fn patch_overrides_computed_fields() {
        let req = request("example.com");
        let patch = ConfigPatch {
            url: Some("http://override.test/".into()),
            max_redirects: Some(3),
            auth: Some(Some(BasicAuth { user: "u".into(), pass: "p".into() })),
            ..ConfigPatch::default()
        };

        let cfg = build_request_config(&req, patch);
        assert_eq!(cfg.url, "http://override.test/");
        assert_eq!(cfg.max_redirects, 3);
        assert_eq!(cfg.auth.unwrap().user, "u");
        assert_eq!(cfg.method, "GET");
    }

    #[test]
    fn send_patch_attaches_fresh_jar() {
        let req = request("example.com");
        let a = build_request_config(&req, ConfigPatch::for_send());
        let b = build_request_config(&req, ConfigPatch::for_send());

        assert!(a.follow_redirect);
        let (ja, jb) = (a.cookie_jar.clone().unwrap(), b.cookie_jar.clone().unwrap());
        assert!(!Arc::ptr_eq(&ja, &jb));
        assert_ne!(a, b);
    }

    #[test]
    fn sender_config_policy_is_used() {
        let sender = SenderConfig::builder()
            .max_redirects(2)
            .decompress(false)
            .build()
            .unwrap();
        let cfg = build_request_config_with(&request("example.com"), &sender, ConfigPatch::default());
        assert_eq!(cfg.max_redirects, 2);
        assert!(!cfg.decompress);
    }
}
