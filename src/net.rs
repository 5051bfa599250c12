//! Network layer: request configuration, query strings and the transport.

pub mod config;
pub mod decode;
pub mod fetch;
pub mod querystring;
pub mod response;

pub use config::{build_request_config, build_request_config_with, BasicAuth, ConfigPatch, HeaderMapping, RequestConfig};
pub use fetch::{ReqwestTransport, Transport, TransportError};
pub use response::Response;
