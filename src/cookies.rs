//! Cookies: [`Cookie`], the [`CookieJar`] trait and the request-scoped
//! [`SessionCookieJar`].
//!
//! Every send gets a brand-new [`SessionCookieJar`]. It is handed to the transport
//! as its cookie provider, so cookies set by one redirect hop are replayed on the
//! next hop of the same send. The jar is dropped when the send finishes; nothing is
//! persisted across sends.

mod cookie_jar;
mod session;

pub use cookie_jar::{CookieJar, MemoryCookieJar};
pub use session::SessionCookieJar;

use serde::{Deserialize, Serialize};

/// A cookie as parsed from a `Set-Cookie` header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cookie {
    /// Cookie name (case-sensitive).
    pub name: String,

    /// Raw cookie value (not URL-decoded).
    pub value: String,

    /// Path scoping (e.g., `"/"`).
    pub path: Option<String>,

    /// Domain scoping (host-only if `None`), leading dot stripped.
    pub domain: Option<String>,

    /// If `true`, cookie is sent only over HTTPS.
    pub secure: bool,

    /// Raw `Expires` attribute, not enforced.
    pub expires: Option<String>,

    /// SameSite policy (`"Strict"`, `"Lax"`, or `"None"`).
    pub same_site: Option<String>,

    pub http_only: bool,
}
