//! Authenticated client for the n8n REST API.
//!
//! # Design
//! `N8nClient` holds the normalized base URL, the API key and one
//! `Transport`. It carries no mutable state between calls. Every operation
//! is split into a pure `build_*` step that describes the HTTP exchange and
//! an executing method that runs it through the transport.
//!
//! `get` resolves a path with a fixed two-entry plan from `build_get`. It
//! tries the versioned prefix (`/api/v1{path}`) first and the bare path
//! second. Any failure of the first attempt moves to the second. Whatever
//! the second attempt produces is returned, so there is never a third
//! request.

use serde_json::Value;

use crate::config::N8nConfig;
use crate::error::{ApiError, ConfigError};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::transport::{Transport, UreqTransport};
use crate::types::Workflow;

pub const API_PREFIX: &str = "/api/v1";
pub const API_KEY_HEADER: &str = "X-N8N-API-KEY";

#[derive(Debug, Clone)]
pub struct N8nClient<T = UreqTransport> {
    base_url: String,
    api_key: String,
    transport: T,
}

impl N8nClient<UreqTransport> {
    /// Validate `config` and build a client with the default transport.
    pub fn from_config(config: &N8nConfig) -> Result<Self, ConfigError> {
        Self::from_config_with_transport(config, UreqTransport::new())
    }
}

impl<T: Transport> N8nClient<T> {
    pub fn from_config_with_transport(config: &N8nConfig, transport: T) -> Result<Self, ConfigError> {
        config.validate()?;
        match (&config.base_url, &config.api_key) {
            (Some(base_url), Some(api_key)) => Ok(Self::with_transport(base_url, api_key, transport)),
            _ => Err(ConfigError::MissingCredentials),
        }
    }

    pub fn with_transport(base_url: &str, api_key: &str, transport: T) -> Self {
        Self {
            base_url: base_url.strip_suffix('/').unwrap_or(base_url).to_string(),
            api_key: api_key.to_string(),
            transport,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    // -----------------------------------------------------------------------
    // Request builders
    // -----------------------------------------------------------------------

    /// Ordered attempt plan for `get(path)`: versioned prefix, then bare path.
    pub fn build_get(&self, path: &str) -> [HttpRequest; 2] {
        [
            self.request(HttpMethod::Get, &format!("{API_PREFIX}{path}"), None),
            self.request(HttpMethod::Get, path, None),
        ]
    }

    pub fn build_list_workflows(&self) -> [HttpRequest; 2] {
        self.build_get("/workflows")
    }

    pub fn build_get_workflow(&self, id: &str) -> [HttpRequest; 2] {
        self.build_get(&format!("/workflows/{id}"))
    }

    /// A missing payload is sent as an empty JSON object.
    pub fn build_trigger_workflow(
        &self,
        workflow_id: &str,
        payload: Option<&Value>,
    ) -> Result<HttpRequest, ApiError> {
        let body = match payload {
            Some(payload) => serde_json::to_string(payload).map_err(|e| ApiError::Serialization(e.to_string()))?,
            None => "{}".to_string(),
        };
        Ok(self.request(
            HttpMethod::Post,
            &format!("{API_PREFIX}/workflows/{workflow_id}/run"),
            Some(body),
        ))
    }

    fn request(&self, method: HttpMethod, path: &str, body: Option<String>) -> HttpRequest {
        HttpRequest {
            method,
            url: format!("{}{path}", self.base_url),
            headers: vec![
                (API_KEY_HEADER.to_string(), self.api_key.clone()),
                ("Content-Type".to_string(), "application/json".to_string()),
            ],
            body,
        }
    }

    // -----------------------------------------------------------------------
    // Operations
    // -----------------------------------------------------------------------

    /// Fetch `path`, first under `/api/v1` and then without the prefix.
    ///
    /// The fallback request is issued only when the first one fails, and its
    /// outcome is returned as-is.
    pub fn get(&self, path: &str) -> Result<Value, ApiError> {
        let [versioned, bare] = self.build_get(path);
        let response = match self.send(&versioned) {
            Ok(response) => response,
            Err(err) => {
                tracing::debug!(
                    url = %versioned.url,
                    error = %err,
                    "versioned request failed, retrying without prefix"
                );
                self.send(&bare)?
            }
        };
        parse_json(&response)
    }

    pub fn list_workflows(&self) -> Result<Vec<Workflow>, ApiError> {
        let body = self.get("/workflows")?;
        parse_list_workflows(body)
    }

    pub fn get_workflow(&self, id: &str) -> Result<Workflow, ApiError> {
        self.get(&format!("/workflows/{id}")).map(Workflow)
    }

    /// Start a run of `workflow_id` and return the whole response.
    ///
    /// Always targets the versioned endpoint. There is no fallback.
    pub fn trigger_workflow(
        &self,
        workflow_id: &str,
        payload: Option<&Value>,
    ) -> Result<HttpResponse, ApiError> {
        let request = self.build_trigger_workflow(workflow_id, payload)?;
        self.send(&request)
    }

    /// One round-trip. Non-2xx responses are turned into errors here.
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        tracing::debug!(method = request.method.as_str(), url = %request.url, "sending request");
        let response = self.transport.execute(request)?;
        check_status(request, response)
    }
}

/// Decode the body of a successful response. An empty body decodes to `null`.
pub fn parse_json(response: &HttpResponse) -> Result<Value, ApiError> {
    if response.body.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(&response.body).map_err(|e| ApiError::Deserialization(e.to_string()))
}

/// Unwrap a `{"data": [...]}` envelope if present, then read the workflow list.
pub fn parse_list_workflows(body: Value) -> Result<Vec<Workflow>, ApiError> {
    let list = match body {
        Value::Object(mut map) => match map.remove("data") {
            Some(data) if !data.is_null() => data,
            Some(data) => {
                map.insert("data".to_string(), data);
                Value::Object(map)
            }
            None => Value::Object(map),
        },
        other => other,
    };
    serde_json::from_value(list).map_err(|e| ApiError::Deserialization(e.to_string()))
}

/// Pass 2xx responses through. 404 and other statuses become errors.
pub fn check_status(request: &HttpRequest, response: HttpResponse) -> Result<HttpResponse, ApiError> {
    if response.is_success() {
        return Ok(response);
    }
    if response.status == 404 {
        return Err(ApiError::NotFound {
            url: request.url.clone(),
        });
    }
    Err(ApiError::Http {
        status: response.status,
        body: response.body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;
    use serde_json::json;

    #[derive(Debug)]
    struct Unreachable;

    impl Transport for Unreachable {
        fn execute(&self, _request: &HttpRequest) -> Result<HttpResponse, TransportError> {
            Err(TransportError::Network("unreachable".to_string()))
        }
    }

    fn client() -> N8nClient<Unreachable> {
        N8nClient::with_transport("http://localhost:5678", "secret", Unreachable)
    }

    fn ok(body: &str) -> HttpResponse {
        HttpResponse {
            status: 200,
            headers: Vec::new(),
            body: body.to_string(),
        }
    }

    #[test]
    fn build_get_plans_versioned_then_bare() {
        let [first, second] = client().build_get("/workflows");
        assert_eq!(first.method, HttpMethod::Get);
        assert_eq!(first.url, "http://localhost:5678/api/v1/workflows");
        assert_eq!(second.method, HttpMethod::Get);
        assert_eq!(second.url, "http://localhost:5678/workflows");
        assert!(first.body.is_none());
        assert!(second.body.is_none());
    }

    #[test]
    fn every_request_carries_auth_and_content_type() {
        let c = client();
        let [get, _] = c.build_get_workflow("7");
        let post = c.build_trigger_workflow("7", None).unwrap();
        for req in [get, post] {
            assert_eq!(
                req.headers,
                vec![
                    ("X-N8N-API-KEY".to_string(), "secret".to_string()),
                    ("Content-Type".to_string(), "application/json".to_string()),
                ]
            );
        }
    }

    #[test]
    fn build_get_workflow_embeds_id() {
        let [first, second] = client().build_get_workflow("abc123");
        assert_eq!(first.url, "http://localhost:5678/api/v1/workflows/abc123");
        assert_eq!(second.url, "http://localhost:5678/workflows/abc123");
    }

    #[test]
    fn build_trigger_workflow_posts_payload_to_versioned_run() {
        let payload = json!({"customer": "acme", "amount": 12});
        let req = client().build_trigger_workflow("42", Some(&payload)).unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url, "http://localhost:5678/api/v1/workflows/42/run");
        let body: Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body, payload);
    }

    #[test]
    fn build_trigger_workflow_defaults_to_empty_object() {
        let req = client().build_trigger_workflow("42", None).unwrap();
        assert_eq!(req.body.as_deref(), Some("{}"));
    }

    #[test]
    fn exactly_one_trailing_slash_is_stripped() {
        let c = N8nClient::with_transport("https://host/", "k", Unreachable);
        assert_eq!(c.base_url(), "https://host");
        let c = N8nClient::with_transport("https://host", "k", Unreachable);
        assert_eq!(c.base_url(), "https://host");
        let c = N8nClient::with_transport("https://host//", "k", Unreachable);
        assert_eq!(c.base_url(), "https://host/");
    }

    #[test]
    fn from_config_rejects_incomplete_config() {
        let config = N8nConfig::new("http://localhost:5678", "");
        let err = N8nClient::from_config_with_transport(&config, Unreachable).unwrap_err();
        assert_eq!(err, ConfigError::MissingCredentials);
    }

    #[test]
    fn from_config_normalizes_base_url() {
        let config = N8nConfig::new("http://localhost:5678/", "secret");
        let c = N8nClient::from_config_with_transport(&config, Unreachable).unwrap();
        assert_eq!(c.base_url(), "http://localhost:5678");
    }

    #[test]
    fn parse_json_treats_empty_body_as_null() {
        assert_eq!(parse_json(&ok("")).unwrap(), Value::Null);
        assert_eq!(parse_json(&ok(r#"{"id":"1"}"#)).unwrap(), json!({"id": "1"}));
    }

    #[test]
    fn parse_json_rejects_malformed_body() {
        let err = parse_json(&ok("not json")).unwrap_err();
        assert!(matches!(err, ApiError::Deserialization(_)));
    }

    #[test]
    fn parse_list_unwraps_data_envelope() {
        let body = json!({"data": [{"id": "1"}, {"id": "2"}], "nextCursor": null});
        let workflows = parse_list_workflows(body).unwrap();
        assert_eq!(workflows, vec![Workflow(json!({"id": "1"})), Workflow(json!({"id": "2"}))]);
    }

    #[test]
    fn parse_list_accepts_bare_array() {
        let workflows = parse_list_workflows(json!([{"id": "1"}, {"id": "2"}])).unwrap();
        assert_eq!(workflows.len(), 2);
        assert_eq!(workflows[1].id().as_deref(), Some("2"));
    }

    #[test]
    fn parse_list_with_null_data_falls_back_to_whole_body() {
        let err = parse_list_workflows(json!({"data": null})).unwrap_err();
        assert!(matches!(err, ApiError::Deserialization(_)));
    }

    #[test]
    fn parse_list_rejects_non_array() {
        let err = parse_list_workflows(json!({"message": "nope"})).unwrap_err();
        assert!(matches!(err, ApiError::Deserialization(_)));
    }

    #[test]
    fn check_status_maps_404_and_other_failures() {
        let [req, _] = client().build_get("/workflows/9");
        let not_found = HttpResponse {
            status: 404,
            headers: Vec::new(),
            body: String::new(),
        };
        let err = check_status(&req, not_found).unwrap_err();
        assert!(matches!(err, ApiError::NotFound { ref url } if url == "http://localhost:5678/api/v1/workflows/9"));

        let server_error = HttpResponse {
            status: 500,
            headers: Vec::new(),
            body: "boom".to_string(),
        };
        let err = check_status(&req, server_error).unwrap_err();
        assert!(matches!(err, ApiError::Http { status: 500, ref body } if body == "boom"));
    }

    #[test]
    fn get_surfaces_fallback_transport_error() {
        let err = client().get("/workflows").unwrap_err();
        assert!(matches!(err, ApiError::Transport(TransportError::Network(_))));
    }
}
