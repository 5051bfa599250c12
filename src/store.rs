//! Persistence for requests, request groups and recorded responses.
//!
//! The sender only needs three operations from its store: look up a request, look
//! up its group, and append a response. [`Store`] exposes those plus a few
//! operations applications use to seed and inspect data.
//!
//! Responses are **append-only**: a store never updates or replaces an existing
//! response, so concurrent sends never race on the same record.
//!
//! # Available backends
//!
//! - [`InMemoryStore`]: everything in memory, used for tests and ephemeral setups.
//! - [`SqliteStore`]: SQLite-backed persistent store (feature `sqlite_store`).
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use request_sender::model::{Request, RequestGroup};
//! use request_sender::store::{InMemoryStore, Store};
//!
//! let store = Arc::new(InMemoryStore::new());
//! let group = RequestGroup::new("Default");
//! let request = Request::new(group.id, "GET", "example.com");
//! store.request_group_put(&group).unwrap();
//! store.request_put(&request).unwrap();
//! ```

use std::sync::Arc;

use anyhow::Result;

use crate::model::{Request, RequestGroup, RequestGroupId, RequestId, Response, ResponseFields};

/// In-memory store implementation.
pub mod in_memory;
/// SQLite-backed store implementation.
#[cfg(feature = "sqlite_store")]
pub mod sqlite;

pub use in_memory::InMemoryStore;
#[cfg(feature = "sqlite_store")]
pub use sqlite::SqliteStore;

/// Object-safe store of requests, groups and responses.
///
/// Implementations must be internally synchronized; all methods take `&self`.
pub trait Store: Send + Sync {
    /// Retrieves a request, or `None` if no such request exists.
    fn request_by_id(&self, id: RequestId) -> Result<Option<Request>>;

    /// Retrieves a request group, or `None` if no such group exists.
    fn request_group_by_id(&self, id: RequestGroupId) -> Result<Option<RequestGroup>>;

    /// Appends a new response and returns the persisted record.
    fn response_create(&self, fields: ResponseFields) -> Result<Response>;

    /// Returns all responses recorded for a request, oldest first.
    fn responses_for_request(&self, id: RequestId) -> Result<Vec<Response>>;

    /// Inserts or replaces a request.
    fn request_put(&self, request: &Request) -> Result<()>;

    /// Inserts or replaces a request group.
    fn request_group_put(&self, group: &RequestGroup) -> Result<()>;
}

/// Shared handle to a type-erased store.
pub type StoreHandle = Arc<dyn Store>;
