use std::sync::{Arc, Mutex, PoisonError};

use axum::{
    body::{to_bytes, Body},
    extract::{Path, Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use uuid::Uuid;

pub const API_KEY_HEADER: &str = "x-n8n-api-key";
pub const DEFAULT_API_KEY: &str = "test-key";

const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Where the workflow routes are mounted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mount {
    /// Only under `/api/v1`.
    Versioned,
    /// Only at the root.
    Bare,
    Both,
}

/// How `GET /workflows` wraps its result.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ListShape {
    /// `{"data": [...], "nextCursor": null}`
    Envelope,
    /// `[...]`
    BareArray,
}

#[derive(Clone, Debug)]
pub struct MockOptions {
    pub api_key: String,
    pub mount: Mount,
    pub list_shape: ListShape,
    pub workflows: Vec<Value>,
}

impl Default for MockOptions {
    fn default() -> Self {
        Self {
            api_key: DEFAULT_API_KEY.to_string(),
            mount: Mount::Both,
            list_shape: ListShape::Envelope,
            workflows: seed_workflows(),
        }
    }
}

/// Two workflows every fresh server starts with.
pub fn seed_workflows() -> Vec<Value> {
    vec![
        json!({"id": "1", "name": "Send invoices", "active": true, "nodes": []}),
        json!({"id": "2", "name": "Sync Stripe payouts", "active": false, "nodes": []}),
    ]
}

/// One request as seen by the server, before authorization.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub api_key: Option<String>,
    pub content_type: Option<String>,
    pub body: String,
}

/// Shared, append-only record of every request the server received.
#[derive(Clone, Debug, Default)]
pub struct RequestLog(Arc<Mutex<Vec<RecordedRequest>>>);

impl RequestLog {
    pub fn snapshot(&self) -> Vec<RecordedRequest> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// `"METHOD /path"` for each request, in arrival order.
    pub fn lines(&self) -> Vec<String> {
        self.snapshot()
            .iter()
            .map(|r| format!("{} {}", r.method, r.path))
            .collect()
    }

    fn push(&self, request: RecordedRequest) {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).push(request);
    }
}

#[derive(Clone)]
struct AppState {
    api_key: Arc<str>,
    list_shape: ListShape,
    workflows: Arc<Vec<Value>>,
    log: RequestLog,
}

pub fn app(options: MockOptions) -> (Router, RequestLog) {
    let log = RequestLog::default();
    let state = AppState {
        api_key: options.api_key.into(),
        list_shape: options.list_shape,
        workflows: Arc::new(options.workflows),
        log: log.clone(),
    };

    let routes = match options.mount {
        Mount::Versioned => Router::new().nest("/api/v1", workflow_routes()),
        Mount::Bare => workflow_routes(),
        Mount::Both => workflow_routes().nest("/api/v1", workflow_routes()),
    };

    let router = routes
        .fallback(unknown_route)
        .layer(middleware::from_fn_with_state(state.clone(), record_and_authorize))
        .with_state(state);
    (router, log)
}

pub async fn run(listener: TcpListener, options: MockOptions) -> Result<(), std::io::Error> {
    let (router, _log) = app(options);
    serve(listener, router).await
}

/// Serve a router obtained from `app`, keeping its `RequestLog` with the caller.
pub async fn serve(listener: TcpListener, router: Router) -> Result<(), std::io::Error> {
    axum::serve(listener, router).await
}

fn workflow_routes() -> Router<AppState> {
    Router::new()
        .route("/workflows", get(list_workflows))
        .route("/workflows/{id}", get(get_workflow))
        .route("/workflows/{id}/run", post(run_workflow))
}

async fn record_and_authorize(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();
    let bytes = match to_bytes(body, MAX_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(_) => return StatusCode::PAYLOAD_TOO_LARGE.into_response(),
    };

    let header_value = |name: &str| {
        parts
            .headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    let recorded = RecordedRequest {
        method: parts.method.to_string(),
        path: parts.uri.path().to_string(),
        api_key: header_value(API_KEY_HEADER),
        content_type: header_value(header::CONTENT_TYPE.as_str()),
        body: String::from_utf8_lossy(&bytes).into_owned(),
    };
    tracing::info!(method = %recorded.method, path = %recorded.path, "request");

    let authorized = recorded.api_key.as_deref() == Some(&*state.api_key);
    state.log.push(recorded);
    if !authorized {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"message": "'X-N8N-API-KEY' header required"})),
        )
            .into_response();
    }

    next.run(Request::from_parts(parts, Body::from(bytes))).await
}

async fn list_workflows(State(state): State<AppState>) -> Json<Value> {
    let workflows = Value::Array(state.workflows.to_vec());
    match state.list_shape {
        ListShape::Envelope => Json(json!({"data": workflows, "nextCursor": null})),
        ListShape::BareArray => Json(workflows),
    }
}

async fn get_workflow(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    find_workflow(&state, &id).cloned().map(Json).ok_or_else(|| not_found(&id))
}

async fn run_workflow(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<Value>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    find_workflow(&state, &id).ok_or_else(|| not_found(&id))?;
    Ok(Json(json!({
        "executionId": Uuid::new_v4(),
        "workflowId": id,
        "data": payload,
    })))
}

async fn unknown_route() -> (StatusCode, Json<Value>) {
    (StatusCode::NOT_FOUND, Json(json!({"message": "not found"})))
}

fn find_workflow<'a>(state: &'a AppState, id: &str) -> Option<&'a Value> {
    state
        .workflows
        .iter()
        .find(|w| w.get("id").and_then(Value::as_str) == Some(id))
}

fn not_found(id: &str) -> (StatusCode, Json<Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({"message": format!("Workflow with ID \"{id}\" not found")})),
    )
}
