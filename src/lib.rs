//! Executes user-defined HTTP requests and records their outcome.
//!
//! A send resolves the request's template variables against its group's
//! environment, builds a network-ready [`RequestConfig`](net::RequestConfig),
//! dispatches it after a debounce delay, and stores exactly one
//! [`Response`](model::Response) for the attempt.
//!
//! ```no_run
//! use std::sync::Arc;
//! use request_sender::{Dispatcher, model::{Request, RequestGroup}, store::{InMemoryStore, Store}};
//!
//! # #[tokio::main] async fn main() {
//! let store = Arc::new(InMemoryStore::new());
//! let group = RequestGroup::new("Default");
//! let request = Request::new(group.id, "GET", "example.com");
//! store.request_group_put(&group).unwrap();
//! store.request_put(&request).unwrap();
//!
//! let dispatcher = Dispatcher::with_store(store, None);
//! let handle = dispatcher.send(request.id, |res| println!("done: {res:?}"));
//! let response = handle.join().await;
//! # }
//! ```

pub mod config;
pub mod cookies;
pub mod dispatcher;
pub mod errors;
pub mod model;
pub mod net;
pub mod resolver;
pub mod scheduler;
pub mod store;
pub mod template;

pub use config::SenderConfig;
pub use dispatcher::{Dispatcher, SendHandle, SendState};
pub use errors::SendError;
