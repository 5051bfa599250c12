//! Dispatching and recording of sends.
//!
//! A send goes through these states:
//!
//! ```text
//! Pending ──(debounce elapsed)──> Sending ──┬──> RecordedSuccess
//!    │                                      ├──> RecordedFailure
//!    └──(cancel)──> Cancelled               └──> Failed
//! ```
//!
//! - `Pending`: scheduled; no store or network activity happens yet.
//! - `Sending`: the request is resolved, its config is built with a fresh cookie
//!   jar, and the network call is issued and timed.
//! - `RecordedSuccess`: a response was received (any status code, 4xx/5xx
//!   included) and recorded.
//! - `RecordedFailure`: the transport failed; the error was recorded.
//! - `Failed`: the request could not be found or resolved, or the recording
//!   itself failed. Nothing was recorded for the send.
//!
//! Every send that reaches `Sending` writes at most one response, and exactly one
//! when the network call was issued. The completion callback fires exactly once,
//! after the outcome is recorded.
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use tokio::sync::watch;

use crate::config::SenderConfig;
use crate::errors::SendError;
use crate::model::{Outcome, RequestId, Response, ResponseFields};
use crate::net::{build_request_config_with, ConfigPatch, ReqwestTransport, Transport};
use crate::resolver::resolve_request;
use crate::scheduler::DelayedTask;
use crate::store::StoreHandle;
use crate::template::{Renderer, TemplateRenderer};

/// Lifecycle state of one send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendState {
    Pending,
    Sending,
    RecordedSuccess,
    RecordedFailure,
    Failed,
    Cancelled,
}

impl SendState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, SendState::Pending | SendState::Sending)
    }
}

type Callback = Box<dyn FnOnce(Result<(), SendError>) + Send>;

/// Sends requests and records their outcome.
///
/// Cloning is cheap; clones share the store, renderer, transport and config.
#[derive(Clone)]
pub struct Dispatcher {
    store: StoreHandle,
    renderer: Arc<dyn Renderer>,
    transport: Arc<dyn Transport>,
    config: Arc<SenderConfig>,
}

impl Dispatcher {
    pub fn new(
        store: StoreHandle,
        renderer: Arc<dyn Renderer>,
        transport: Arc<dyn Transport>,
        config: SenderConfig,
    ) -> Self {
        Self {
            store,
            renderer,
            transport,
            config: Arc::new(config),
        }
    }

    /// Dispatcher with the built-in template renderer and the reqwest transport.
    ///
    /// If `config` is `None`, [`SenderConfig::default`] is used.
    pub fn with_store(store: StoreHandle, config: Option<SenderConfig>) -> Self {
        let config = config.unwrap_or_default();
        let transport = Arc::new(ReqwestTransport::new(&config));
        Self::new(store, Arc::new(TemplateRenderer::new()), transport, config)
    }

    pub fn config(&self) -> &SenderConfig {
        &self.config
    }

    pub fn store(&self) -> &StoreHandle {
        &self.store
    }

    /// Schedules a send of `request_id` after the debounce delay and returns
    /// immediately. Must be called from within a tokio runtime.
    ///
    /// `on_complete` is called exactly once: with `Ok(())` after a response was
    /// recorded, with `Err(SendError::Transport)` after a transport failure was
    /// recorded, or with another error when nothing could be recorded.
    pub fn send<F>(&self, request_id: RequestId, on_complete: F) -> SendHandle
    where
        F: FnOnce(Result<(), SendError>) + Send + 'static,
    {
        let (state_tx, state_rx) = watch::channel(SendState::Pending);
        let on_complete: Callback = Box::new(on_complete);
        let callback = Arc::new(Mutex::new(Some(on_complete)));

        log::debug!("Request {request_id}: send scheduled in {:?}", self.config.debounce);

        let dispatcher = self.clone();
        let task_callback = callback.clone();
        let task = DelayedTask::schedule(self.config.debounce, move || async move {
            let result = dispatcher.run(request_id, &state_tx).await;

            let completion = match &result {
                Ok(response) => match response.error() {
                    Some(error) => Err(SendError::Transport(error.to_string())),
                    None => Ok(()),
                },
                Err(e) => Err(e.clone()),
            };
            if let Some(cb) = take_callback(&task_callback) {
                cb(completion);
            }

            result
        });

        SendHandle {
            request_id,
            task,
            state: state_rx,
            callback,
        }
    }

    /// Resolves, dispatches and records `request_id` right away, without debounce.
    ///
    /// Returns the recorded response for both success and transport failure. An
    /// `Err` means nothing was recorded.
    pub async fn execute(&self, request_id: RequestId) -> Result<Response, SendError> {
        let (state_tx, _state_rx) = watch::channel(SendState::Sending);
        self.run(request_id, &state_tx).await
    }

    async fn run(&self, request_id: RequestId, state: &watch::Sender<SendState>) -> Result<Response, SendError> {
        state.send_replace(SendState::Sending);

        let result = self.dispatch(request_id).await;
        let final_state = match &result {
            Ok(r) if r.is_success() => SendState::RecordedSuccess,
            Ok(_) => SendState::RecordedFailure,
            Err(e) => {
                log::error!("Request {request_id}: send failed: {e}");
                SendState::Failed
            }
        };
        state.send_replace(final_state);

        result
    }

    async fn dispatch(&self, request_id: RequestId) -> Result<Response, SendError> {
        let store = self.store.clone();
        let renderer = self.renderer.clone();
        let request = blocking(move || resolve_request(store.as_ref(), renderer.as_ref(), request_id)).await?;
        let config = build_request_config_with(&request, &self.config, ConfigPatch::for_send());
        let url = config.url.clone();

        log::debug!("Request {request_id}: {} {}", config.method, url);

        let start = Instant::now();
        let result = self.transport.execute(config).await;
        let millis = start.elapsed().as_millis() as u64;

        let outcome = match result {
            Ok(res) => {
                log::info!("Request {request_id}: {} {} ({} bytes)", res.status, res.url, res.bytes());
                Outcome::Success {
                    status_code: res.status,
                    status_message: res.status_text.clone(),
                    content_type: res.content_type(),
                    url: request.url,
                    bytes: res.bytes(),
                    headers: res.header_list(),
                    body: res.body,
                }
            }
            Err(e) => {
                log::warn!("Request to {url} failed: {e}");
                Outcome::Failure { error: e.to_chain_string() }
            }
        };

        let store = self.store.clone();
        let fields = ResponseFields { parent_id: request_id, millis, outcome };
        blocking(move || store.response_create(fields).map_err(|e| SendError::Store(e.to_string()))).await
    }
}

// Store calls may block on locks or I/O; keep them off the async workers
async fn blocking<T, F>(f: F) -> Result<T, SendError>
where
    F: FnOnce() -> Result<T, SendError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| SendError::Store(format!("store task failed: {e}")))?
}

fn take_callback(slot: &Mutex<Option<Callback>>) -> Option<Callback> {
    slot.lock().unwrap_or_else(PoisonError::into_inner).take()
}

/// Handle to a scheduled send.
///
/// Dropping the handle does not stop the send.
pub struct SendHandle {
    request_id: RequestId,
    task: DelayedTask<Result<Response, SendError>>,
    state: watch::Receiver<SendState>,
    callback: Arc<Mutex<Option<Callback>>>,
}

impl SendHandle {
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    pub fn state(&self) -> SendState {
        if self.task.is_cancelled() {
            return SendState::Cancelled;
        }
        *self.state.borrow()
    }

    /// Cancels the send while it is still pending. The callback then fires with
    /// [`SendError::Cancelled`]. Once sending has started this does nothing and
    /// returns `false`.
    pub fn cancel(&self) -> bool {
        if !self.task.cancel() {
            return false;
        }

        log::debug!("Request {}: send cancelled before dispatch", self.request_id);
        if let Some(cb) = take_callback(&self.callback) {
            cb(Err(SendError::Cancelled));
        }
        true
    }

    /// Waits until the send reaches a terminal state and returns its result.
    pub async fn join(self) -> Result<Response, SendError> {
        self.task.join().await.unwrap_or(Err(SendError::Cancelled))
    }
}
