//! Data model: requests, request groups and recorded responses.
//!
//! A [`Request`] is the user-authored description of one HTTP call. It lives in a
//! [`RequestGroup`], which carries the [`Environment`] used to resolve template
//! expressions. Every send attempt produces exactly one [`Response`] record, holding
//! either the received response ([`Outcome::Success`]) or the transport error
//! ([`Outcome::Failure`]).
//!
//! All types serialize with camelCase field names (`parentId`, `statusCode`, ...).
use std::fmt::Display;

use encoding_rs::{Encoding, UTF_8};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Variable bindings used for template resolution. Values may be flat or nested.
pub type Environment = serde_json::Map<String, serde_json::Value>;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

uuid_id!(
    /// Identifier of a [`Request`].
    RequestId
);
uuid_id!(
    /// Identifier of a [`RequestGroup`].
    RequestGroupId
);
uuid_id!(
    /// Identifier of a recorded [`Response`].
    ResponseId
);

/// A single request header. Headers with an empty name are treated as disabled.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub value: String,
}

impl Header {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self { name: name.into(), value: value.into() }
    }
}

/// A single query parameter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Param {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub value: String,
}

impl Param {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self { name: name.into(), value: value.into() }
    }
}

/// Basic authentication credentials. An empty username means "no auth".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Authentication {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Raw request body plus optional encoding metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestBody {
    #[serde(default)]
    pub text: String,
    /// Mime type of `text` (e.g. `application/json`), informational only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

impl RequestBody {
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

impl From<&str> for RequestBody {
    fn from(text: &str) -> Self {
        Self { text: text.to_string(), mime_type: None }
    }
}

/// A user-authored description of one HTTP call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    pub id: RequestId,
    /// The group this request belongs to.
    pub parent_id: RequestGroupId,
    #[serde(default)]
    pub name: String,
    pub method: String,
    pub url: String,
    #[serde(default)]
    pub body: RequestBody,
    #[serde(default)]
    pub headers: Vec<Header>,
    #[serde(default)]
    pub authentication: Authentication,
    #[serde(default)]
    pub params: Vec<Param>,
}

impl Request {
    /// Creates a request with a fresh id, no headers, params, body or auth.
    pub fn new(parent_id: RequestGroupId, method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: RequestId::new(),
            parent_id,
            name: String::new(),
            method: method.into(),
            url: url.into(),
            body: RequestBody::default(),
            headers: vec![],
            authentication: Authentication::default(),
            params: vec![],
        }
    }
}

/// A collection of requests sharing one environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestGroup {
    pub id: RequestGroupId,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<Environment>,
}

impl RequestGroup {
    pub fn new(name: impl Into<String>) -> Self {
        Self { id: RequestGroupId::new(), name: name.into(), environment: None }
    }

    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = Some(environment);
        self
    }
}

/// Result of one send attempt as seen by the recorder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Outcome {
    /// A transport-level response was received, whatever its status code.
    #[serde(rename_all = "camelCase")]
    Success {
        status_code: u16,
        status_message: String,
        content_type: Option<String>,
        /// Resolved request URL.
        url: String,
        /// Number of body bytes received.
        bytes: u64,
        /// Raw response body.
        body: Vec<u8>,
        /// Snapshot of all response headers in received order.
        headers: Vec<Header>,
    },
    /// The transport failed (DNS, connect, TLS, protocol, timeout).
    Failure { error: String },
}

/// Fields needed to create a new [`Response`] record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseFields {
    pub parent_id: RequestId,
    /// Elapsed wall time of the network call in milliseconds.
    pub millis: u64,
    #[serde(flatten)]
    pub outcome: Outcome,
}

/// An immutable, persisted record of one send attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub id: ResponseId,
    #[serde(flatten)]
    pub fields: ResponseFields,
}

impl Response {
    pub fn new(fields: ResponseFields) -> Self {
        Self { id: ResponseId::new(), fields }
    }

    pub fn parent_id(&self) -> RequestId {
        self.fields.parent_id
    }

    pub fn millis(&self) -> u64 {
        self.fields.millis
    }

    pub fn status_code(&self) -> Option<u16> {
        match &self.fields.outcome {
            Outcome::Success { status_code, .. } => Some(*status_code),
            Outcome::Failure { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.fields.outcome {
            Outcome::Failure { error } => Some(error),
            Outcome::Success { .. } => None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.fields.outcome, Outcome::Success { .. })
    }

    /// Returns the response body decoded as text using the charset of the content
    /// type, or UTF-8 when none is given or it is unknown. Malformed sequences are
    /// replaced. Failures have no body.
    pub fn body_text(&self) -> Option<String> {
        match &self.fields.outcome {
            Outcome::Success { body, content_type, .. } => Some(decode_body(content_type.as_deref(), body)),
            Outcome::Failure { .. } => None,
        }
    }

    /// Looks up a recorded response header by name (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        match &self.fields.outcome {
            Outcome::Success { headers, .. } => headers
                .iter()
                .find(|h| h.name.eq_ignore_ascii_case(name))
                .map(|h| h.value.as_str()),
            Outcome::Failure { .. } => None,
        }
    }
}

fn decode_body(content_type: Option<&str>, body: &[u8]) -> String {
    let encoding = content_type
        .and_then(charset_label)
        .and_then(|label| Encoding::for_label(label.as_bytes()))
        .unwrap_or(UTF_8);

    let (text, _) = encoding.decode_with_bom_removal(body);
    text.into_owned()
}

fn charset_label(content_type: &str) -> Option<&str> {
    content_type.split(';').skip(1).find_map(|param| {
        let (name, value) = param.split_once('=')?;
        name.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim().trim_matches('"'))
    })
}
