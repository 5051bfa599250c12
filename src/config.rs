//! Sender configuration.
//!
//! `SenderConfig` controls the debounce delay before a send starts and the
//! transport policy used for every request: redirects, decompression, the user
//! agent, and an optional timeout.
//!
//! # Examples
//!
//! ## Use defaults
//! ```rust
//! use request_sender::config::SenderConfig;
//! let cfg = SenderConfig::default();
//! assert_eq!(cfg.max_redirects, 10);
//! ```
//!
//! ## Customize with the builder
//! ```rust
//! use std::time::Duration;
//! use request_sender::config::SenderConfig;
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let cfg = SenderConfig::builder()
//!     .debounce(Duration::from_millis(250))
//!     .max_redirects(5)
//!     .user_agent("MyClient/2.0")
//!     .build()?; // returns Result<SenderConfig, SenderConfigError>
//! # Ok(()) }
//! ```
//!
//! # Fields (summary)
//! - `debounce`: Delay between `send()` and the start of the work (default: 100ms).
//! - `follow_redirects`: Follow redirects automatically (default: true).
//! - `max_redirects`: Maximum number of redirect hops (default: 10).
//! - `decompress`: Decompress gzip/brotli/deflate bodies (default: true).
//! - `user_agent`: User agent sent when the request does not set one.
//! - `timeout`: Overall request timeout. `None` leaves it to the transport.

use std::fmt;
use std::time::Duration;

const DEFAULT_USER_AGENT: &str = "RequestSender/0.1";
const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(100);
const DEFAULT_MAX_REDIRECTS: usize = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct SenderConfig {
    pub debounce: Duration,
    pub follow_redirects: bool,
    pub max_redirects: usize,
    pub decompress: bool,
    pub user_agent: Option<String>,
    pub timeout: Option<Duration>,
}

impl Default for SenderConfig {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            follow_redirects: true,
            max_redirects: DEFAULT_MAX_REDIRECTS,
            decompress: true,
            user_agent: Some(DEFAULT_USER_AGENT.to_string()),
            timeout: None,
        }
    }
}

impl SenderConfig {
    pub fn builder() -> SenderConfigBuilder {
        SenderConfigBuilder::default()
    }
}

/// Builder for [`SenderConfig`].
#[derive(Debug, Clone, Default)]
pub struct SenderConfigBuilder {
    inner: SenderConfig,
}

impl SenderConfigBuilder {
    #[inline]
    fn map(mut self, f: impl FnOnce(&mut SenderConfig)) -> Self {
        f(&mut self.inner);
        self
    }

    pub fn debounce(self, d: Duration) -> Self { self.map(|c| c.debounce = d) }
    pub fn follow_redirects(self, on: bool) -> Self { self.map(|c| c.follow_redirects = on) }
    pub fn max_redirects(self, n: usize) -> Self { self.map(|c| c.max_redirects = n) }
    pub fn decompress(self, on: bool) -> Self { self.map(|c| c.decompress = on) }
    pub fn user_agent<S: Into<String>>(self, ua: S) -> Self { self.map(|c| c.user_agent = Some(ua.into())) }
    pub fn no_user_agent(self) -> Self { self.map(|c| c.user_agent = None) }
    pub fn timeout(self, t: Duration) -> Self { self.map(|c| c.timeout = Some(t)) }

    /// Apply multiple changes in one go.
    pub fn with(self, f: impl FnOnce(&mut SenderConfig)) -> Self { self.map(f) }

    /// Validate and build the final config.
    pub fn build(self) -> Result<SenderConfig, SenderConfigError> {
        validate(&self.inner)?;
        Ok(self.inner)
    }
}

// ---------- Validation ----------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SenderConfigError {
    ZeroRedirects,
    ZeroTimeout,
    EmptyUserAgent,
}

impl fmt::Display for SenderConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SenderConfigError::ZeroRedirects =>
                write!(f, "max_redirects must be at least 1 when following redirects"),
            SenderConfigError::ZeroTimeout =>
                write!(f, "timeout must be greater than zero"),
            SenderConfigError::EmptyUserAgent =>
                write!(f, "user_agent must not be empty"),
        }
    }
}
impl std::error::Error for SenderConfigError {}

fn validate(c: &SenderConfig) -> Result<(), SenderConfigError> {
    if c.follow_redirects && c.max_redirects == 0 {
        return Err(SenderConfigError::ZeroRedirects);
    }
    if c.timeout.is_some_and(|t| t.is_zero()) {
        return Err(SenderConfigError::ZeroTimeout);
    }
    if c.user_agent.as_deref().is_some_and(str::is_empty) {
        return Err(SenderConfigError::EmptyUserAgent);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = SenderConfig::default();
        assert_eq!(cfg.debounce, Duration::from_millis(100));
        assert!(cfg.follow_redirects);
        assert_eq!(cfg.max_redirects, 10);
        assert!(cfg.decompress);
        assert!(cfg.timeout.is_none());
        assert_eq!(SenderConfig::builder().build().unwrap(), cfg);
    }

    #[test]
    fn builder_sets_fields() {
        let cfg = SenderConfig::builder()
            .debounce(Duration::ZERO)
            .follow_redirects(false)
            .max_redirects(0)
            .timeout(Duration::from_secs(3))
            .no_user_agent()
            .build()
            .unwrap();

        assert_eq!(cfg.debounce, Duration::ZERO);
        assert!(!cfg.follow_redirects);
        assert_eq!(cfg.timeout, Some(Duration::from_secs(3)));
        assert!(cfg.user_agent.is_none());
    }

    #[test]
    fn validation_errors() {
        assert_eq!(
            SenderConfig::builder().max_redirects(0).build().unwrap_err(),
            SenderConfigError::ZeroRedirects
        );
        assert_eq!(
            SenderConfig::builder().timeout(Duration::ZERO).build().unwrap_err(),
            SenderConfigError::ZeroTimeout
        );
        assert_eq!(
            SenderConfig::builder().with(|c| c.user_agent = Some(String::new())).build().unwrap_err(),
            SenderConfigError::EmptyUserAgent
        );
    }
}
