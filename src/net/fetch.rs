use std::error::Error as StdError;
use std::time::Duration;

use futures::future::BoxFuture;
use reqwest::redirect::Policy;
use reqwest::Method;
use url::Url;

use crate::config::SenderConfig;
use crate::net::decode::{decode_content, DecodeError, ACCEPT_ENCODING};
use crate::net::{RequestConfig, Response};

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("invalid request: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Net(#[from] reqwest::Error),

    #[error(transparent)]
    Decode(#[from] DecodeError),
}

impl TransportError {
    /// Error message including every underlying cause, e.g.
    /// `error sending request for url (...): ... Connection refused`.
    pub fn to_chain_string(&self) -> String {
        let mut message = self.to_string();
        let mut source = self.source();
        while let Some(cause) = source {
            let text = cause.to_string();
            if !message.contains(&text) {
                message.push_str(": ");
                message.push_str(&text);
            }
            source = cause.source();
        }
        message
    }
}

/// Performs one network call for a [`RequestConfig`].
///
/// Any response received from the server is `Ok`, whatever its status code; only
/// transport-level problems are errors.
pub trait Transport: Send + Sync {
    fn execute(&self, config: RequestConfig) -> BoxFuture<'static, Result<Response, TransportError>>;
}

/// Transport on top of `reqwest`. A client is built per call so that each send
/// gets its own cookie jar and redirect policy.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    user_agent: Option<String>,
    timeout: Option<Duration>,
}

impl ReqwestTransport {
    pub fn new(config: &SenderConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            timeout: config.timeout,
        }
    }
}

impl Transport for ReqwestTransport {
    fn execute(&self, config: RequestConfig) -> BoxFuture<'static, Result<Response, TransportError>> {
        let user_agent = self.user_agent.clone();
        let timeout = self.timeout;
        Box::pin(fetch(config, user_agent, timeout))
    }
}

fn redirect_policy(config: &RequestConfig) -> Policy {
    if config.follow_redirect {
        Policy::limited(config.max_redirects)
    } else {
        Policy::none()
    }
}

// Loads the configured request and returns the buffered response if any
async fn fetch(
    config: RequestConfig,
    user_agent: Option<String>,
    timeout: Option<Duration>,
) -> Result<Response, TransportError> {
    let method = Method::from_bytes(config.method.to_ascii_uppercase().as_bytes())
        .map_err(|_| TransportError::InvalidConfig(format!("invalid method: {}", config.method)))?;
    let url = Url::parse(&config.url)
        .map_err(|e| TransportError::InvalidConfig(format!("invalid url {}: {e}", config.url)))?;

    let mut builder = reqwest::Client::builder().redirect(redirect_policy(&config));
    if let Some(jar) = config.cookie_jar.clone() {
        builder = builder.cookie_provider(jar);
    }
    if let Some(ua) = user_agent {
        builder = builder.user_agent(ua);
    }
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    let client = builder.build()?;

    let mut req = client.request(method, url);
    for (name, value) in config.headers.iter() {
        req = req.header(name, value);
    }
    // Advertise the codings decode_content understands
    let has_accept_encoding = config
        .headers
        .iter()
        .any(|(name, _)| name.eq_ignore_ascii_case("accept-encoding"));
    if config.decompress && !has_accept_encoding {
        req = req.header(http::header::ACCEPT_ENCODING, ACCEPT_ENCODING);
    }
    if let Some(auth) = &config.auth {
        req = req.basic_auth(&auth.user, Some(&auth.pass));
    }
    if !config.body.is_empty() {
        req = req.body(config.body);
    }

    let res = req.send().await?;

    // Fetch results
    let final_url = res.url().clone();
    let status = res.status().as_u16();
    let status_text = res.status().canonical_reason().unwrap_or("Unknown").to_string();
    let headers = res.headers().clone();

    // Fetch body. We don't do streaming yet
    let raw = res.bytes().await?.to_vec();
    let received_bytes = raw.len() as u64;
    let body = if config.decompress { decode_content(&headers, raw)? } else { raw };

    Ok(Response {
        url: final_url,
        status,
        status_text,
        headers,
        body,
        received_bytes,
    })
}
