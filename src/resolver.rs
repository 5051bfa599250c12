//! Variable resolution for requests.
//!
//! [`resolve_request`] looks up a request and the environment of its group, then
//! substitutes template expressions in **every** string field of the request (URL,
//! header names and values, body, credentials, params) without per-field
//! knowledge: the request is converted to a [`serde_json::Value`], each string leaf
//! is rendered, and the result is converted back.
//!
//! The stored request is never modified; resolution works on a copy.
use serde_json::Value;

use crate::errors::SendError;
use crate::model::{Environment, Request, RequestId};
use crate::store::Store;
use crate::template::{Renderer, TemplateError};

/// Fetches request `id` and resolves it against its group's environment.
///
/// A missing group or a group without environment resolves against an empty
/// environment.
pub fn resolve_request(store: &dyn Store, renderer: &dyn Renderer, id: RequestId) -> Result<Request, SendError> {
    let request = store
        .request_by_id(id)
        .map_err(|e| SendError::Store(e.to_string()))?
        .ok_or(SendError::NotFound(id))?;

    let environment = match store
        .request_group_by_id(request.parent_id)
        .map_err(|e| SendError::Store(e.to_string()))?
    {
        Some(group) => group.environment.unwrap_or_default(),
        None => {
            log::debug!("Request {id}: group {} not found, using empty environment", request.parent_id);
            Environment::new()
        }
    };

    render_request(&request, renderer, &environment)
}

/// Renders every string leaf of `request` against `environment`.
pub fn render_request(request: &Request, renderer: &dyn Renderer, environment: &Environment) -> Result<Request, SendError> {
    let mut tree = serde_json::to_value(request).map_err(|e| SendError::ResolutionFailure(e.to_string()))?;

    render_value(&mut tree, renderer, environment).map_err(|e| SendError::ResolutionFailure(e.to_string()))?;

    serde_json::from_value(tree).map_err(|e| SendError::ResolutionFailure(format!("malformed after resolution: {e}")))
}

fn render_value(value: &mut Value, renderer: &dyn Renderer, environment: &Environment) -> Result<(), TemplateError> {
    match value {
        Value::String(s) => {
            *s = renderer.render(s, environment)?;
        }
        Value::Array(items) => {
            for item in items {
                render_value(item, renderer, environment)?;
            }
        }
        Value::Object(map) => {
            for item in map.values_mut() {
                render_value(item, renderer, environment)?;
            }
        }
        Value::Null | Value::Bool(_) | Value::Number(_) => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Header, Param, RequestGroup};
    use crate::store::InMemoryStore;
    use crate::template::TemplateRenderer;
    use serde_json::json;

    fn env(value: Value) -> Environment {
        value.as_object().cloned().unwrap()
    }

    fn seed(store: &InMemoryStore, group: &RequestGroup, request: &Request) {
        store.request_group_put(group).unwrap();
        store.request_put(request).unwrap();
    }

    #[test]
    fn resolves_url_and_body() {
        let store = InMemoryStore::new();
        let group = RequestGroup::new("g").with_environment(env(json!({ "host": "api.example.com" })));
        let mut request = Request::new(group.id, "POST", "{{ host }}/v1");
        request.body = r#"{"target": "{{ host }}"}"#.into();
        seed(&store, &group, &request);

        let resolved = resolve_request(&store, &TemplateRenderer::new(), request.id).unwrap();
        assert_eq!(resolved.url, "api.example.com/v1");
        assert_eq!(resolved.body.text, r#"{"target": "api.example.com"}"#);
        assert_eq!(resolved.id, request.id);
    }

    #[test]
    fn resolves_nested_fields() {
        let store = InMemoryStore::new();
        let group = RequestGroup::new("g").with_environment(env(json!({
            "auth": { "user": "bob", "pass": "pw" },
            "token": "t0k",
            "page": 3,
        })));
        let mut request = Request::new(group.id, "GET", "example.com");
        request.headers.push(Header::new("Authorization", "Bearer {{ token }}"));
        request.params.push(Param::new("page", "{{ page }}"));
        request.authentication.username = "{{ auth.user }}".into();
        request.authentication.password = "{{ auth.pass }}".into();
        seed(&store, &group, &request);

        let resolved = resolve_request(&store, &TemplateRenderer::new(), request.id).unwrap();
        assert_eq!(resolved.headers[0].value, "Bearer t0k");
        assert_eq!(resolved.params[0].value, "3");
        assert_eq!(resolved.authentication.username, "bob");
        assert_eq!(resolved.authentication.password, "pw");
    }

    #[test]
    fn stored_request_is_not_mutated() {
        let store = InMemoryStore::new();
        let group = RequestGroup::new("g").with_environment(env(json!({ "host": "h" })));
        let request = Request::new(group.id, "GET", "{{ host }}");
        seed(&store, &group, &request);

        resolve_request(&store, &TemplateRenderer::new(), request.id).unwrap();
        assert_eq!(store.request_by_id(request.id).unwrap().unwrap().url, "{{ host }}");
    }

    #[test]
    fn missing_request_is_not_found() {
        let store = InMemoryStore::new();
        let id = RequestId::new();
        let err = resolve_request(&store, &TemplateRenderer::new(), id).unwrap_err();
        assert_eq!(err, SendError::NotFound(id));
    }

    #[test]
    fn missing_group_uses_empty_environment() {
        let store = InMemoryStore::new();
        let request = Request::new(crate::model::RequestGroupId::new(), "GET", "{{ host }}/x");
        store.request_put(&request).unwrap();

        let resolved = resolve_request(&store, &TemplateRenderer::new(), request.id).unwrap();
        assert_eq!(resolved.url, "{{ host }}/x");
    }

    #[test]
    fn strict_renderer_failure_is_resolution_failure() {
        let store = InMemoryStore::new();
        let group = RequestGroup::new("g");
        let request = Request::new(group.id, "GET", "{{ undefined }}");
        seed(&store, &group, &request);

        let err = resolve_request(&store, &TemplateRenderer::strict(), request.id).unwrap_err();
        assert!(matches!(err, SendError::ResolutionFailure(_)));
    }

    struct BreakIds;

    impl Renderer for BreakIds {
        fn render(&self, text: &str, _environment: &Environment) -> Result<String, TemplateError> {
            // Garbles every value, including the ids, which then no longer parse.
            Ok(format!("x{text}"))
        }
    }

    #[test]
    fn malformed_result_is_resolution_failure() {
        let group = RequestGroup::new("g");
        let request = Request::new(group.id, "GET", "example.com");
        let err = render_request(&request, &BreakIds, &Environment::new()).unwrap_err();
        match err {
            SendError::ResolutionFailure(msg) => assert!(msg.contains("malformed")),
            other => panic!("expected ResolutionFailure, got {:?}", other),
        }
    }
}
