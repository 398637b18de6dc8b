//! Error types for the n8n client.
//!
//! # Design
//! Configuration problems and transport problems are separate enums, so
//! `N8nConfig::validate` and `Transport::execute` can be used on their own.
//! `ApiError` wraps transport failures and adds the status-level failures
//! that the client detects itself. A 404 gets a dedicated variant because callers often
//! distinguish a missing workflow from a misbehaving server.

use thiserror::Error;

/// Returned when the configuration cannot produce a usable client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Missing N8N_BASE_URL or N8N_API_KEY in environment variables.")]
    MissingCredentials,

    #[error("could not read env file: {0}")]
    EnvFile(String),
}

/// A request that never produced an HTTP response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out")]
    Timeout,
}

/// Errors returned by `N8nClient` operations.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The server returned 404 for the requested URL.
    #[error("resource not found: {url}")]
    NotFound { url: String },

    /// The server returned a non-2xx status other than 404.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("deserialization failed: {0}")]
    Deserialization(String),

    #[error("serialization failed: {0}")]
    Serialization(String),
}
