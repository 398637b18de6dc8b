//! Credentials for reaching an n8n instance.
//!
//! # Design
//! `N8nConfig` is a plain value object. Callers either inject both values
//! directly or load them from the environment. Construction never fails, and
//! `validate` is the single place that decides whether the pair is usable.

use std::collections::HashMap;
use std::path::Path;

use crate::error::ConfigError;

pub const BASE_URL_VAR: &str = "N8N_BASE_URL";
pub const API_KEY_VAR: &str = "N8N_API_KEY";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct N8nConfig {
    pub base_url: Option<String>,
    pub api_key: Option<String>,
}

impl N8nConfig {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: Some(base_url.into()),
            api_key: Some(api_key.into()),
        }
    }

    /// Read `N8N_BASE_URL` and `N8N_API_KEY` from the process environment.
    ///
    /// A `.env` file in the working directory (or a parent) is loaded first
    /// when one exists. Variables already set in the environment win over
    /// the file.
    pub fn from_env() -> Self {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "loaded .env file");
        }
        Self::from_lookup(env_var)
    }

    /// Read both variables from the env file at `path`.
    ///
    /// The process environment is left untouched. A variable that is already
    /// set in the environment wins over the file.
    pub fn from_env_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_env_file_with(path.as_ref(), env_var)
    }

    fn from_env_file_with<F>(path: &Path, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let iter = dotenvy::from_path_iter(path).map_err(|e| ConfigError::EnvFile(e.to_string()))?;
        let mut file_vars = HashMap::new();
        for item in iter {
            let (key, value) = item.map_err(|e| ConfigError::EnvFile(e.to_string()))?;
            file_vars.insert(key, value);
        }
        tracing::debug!(path = %path.display(), vars = file_vars.len(), "read env file");
        Ok(Self::from_lookup(|key| env(key).or_else(|| file_vars.get(key).cloned())))
    }

    /// Build a config from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            base_url: lookup(BASE_URL_VAR),
            api_key: lookup(API_KEY_VAR),
        }
    }

    /// Both values must be present and non-empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if is_blank(&self.base_url) || is_blank(&self.api_key) {
            return Err(ConfigError::MissingCredentials);
        }
        Ok(())
    }
}

/// Unset and non-unicode values both read as absent.
fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, str::is_empty)
}
