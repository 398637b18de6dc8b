//! Blocking client core for the n8n public REST API.
//!
//! # Overview
//! `N8nConfig` carries the two credentials (base URL, API key) and validates
//! them on demand. `N8nClient` turns them into authenticated requests and
//! executes those requests through a `Transport`. By default this is
//! `UreqTransport`, a `ureq` agent with a fixed timeout.
//!
//! # Design
//! - Requests and responses are plain data (`HttpRequest` / `HttpResponse`).
//!   Every operation has a pure `build_*` step, so tests can run without a
//!   network.
//! - `get` resolves a path with an ordered two-step plan. It tries
//!   `/api/v1{path}` first and `{path}` second, and the second outcome is
//!   final.
//! - Workflows stay opaque JSON. The client only unwraps a top-level `data`
//!   envelope on list responses.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod transport;
pub mod types;

pub use client::N8nClient;
pub use config::N8nConfig;
pub use error::{ApiError, ConfigError, TransportError};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use transport::{Transport, UreqTransport, DEFAULT_TIMEOUT};
pub use types::Workflow;
