use std::collections::HashMap;
use std::sync::RwLock;

use anyhow::{anyhow, Result};

use crate::model::{Request, RequestGroup, RequestGroupId, RequestId, Response, ResponseFields};
use crate::store::Store;

/// In-memory store (no persistence).
#[derive(Default)]
pub struct InMemoryStore {
    requests: RwLock<HashMap<RequestId, Request>>,
    groups: RwLock<HashMap<RequestGroupId, RequestGroup>>,
    /// Append-only, in creation order.
    responses: RwLock<Vec<Response>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of recorded responses across all requests.
    pub fn response_count(&self) -> usize {
        self.responses.read().map(|r| r.len()).unwrap_or(0)
    }
}

impl Store for InMemoryStore {
    fn request_by_id(&self, id: RequestId) -> Result<Option<Request>> {
        let guard = self.requests.read().map_err(|_| anyhow!("request map poisoned"))?;
        Ok(guard.get(&id).cloned())
    }

    fn request_group_by_id(&self, id: RequestGroupId) -> Result<Option<RequestGroup>> {
        let guard = self.groups.read().map_err(|_| anyhow!("group map poisoned"))?;
        Ok(guard.get(&id).cloned())
    }

    fn response_create(&self, fields: ResponseFields) -> Result<Response> {
        let response = Response::new(fields);
        self.responses
            .write()
            .map_err(|_| anyhow!("response list poisoned"))?
            .push(response.clone());
        Ok(response)
    }

    fn responses_for_request(&self, id: RequestId) -> Result<Vec<Response>> {
        let guard = self.responses.read().map_err(|_| anyhow!("response list poisoned"))?;
        Ok(guard.iter().filter(|r| r.parent_id() == id).cloned().collect())
    }

    fn request_put(&self, request: &Request) -> Result<()> {
        self.requests
            .write()
            .map_err(|_| anyhow!("request map poisoned"))?
            .insert(request.id, request.clone());
        Ok(())
    }

    fn request_group_put(&self, group: &RequestGroup) -> Result<()> {
        self.groups
            .write()
            .map_err(|_| anyhow!("group map poisoned"))?
            .insert(group.id, group.clone());
        Ok(())
    }
}
