//! Hosted backend adapter.
//!
//! Talks to a Supabase-style service: a PostgREST data API for progress and
//! profile rows, and a GoTrue auth API for sessions. Both share one
//! [`RemoteStore`] holding the HTTP client, project config, and the access
//! token of the current session.

use std::env;
use std::sync::{Arc, Mutex};

use reqwest::Client;

use crate::repository::{DeviceCache, ProfileRepository, ProgressRepository, Storage, StorageError};

mod auth_api;
mod progress_api;

pub use auth_api::RemoteAuth;

#[derive(Clone, Debug)]
pub struct RemoteConfig {
    pub base_url: String,
    pub api_key: String,
}

impl RemoteConfig {
    /// Read the project URL and anon key from the environment, or `None`
    /// when the app should run without a hosted backend.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let base_url = env::var("TRAINING_API_URL").ok()?;
        let api_key = env::var("TRAINING_API_KEY").ok()?;
        if base_url.trim().is_empty() || api_key.trim().is_empty() {
            return None;
        }
        Some(Self { base_url, api_key })
    }

    fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{table}", self.base_url.trim_end_matches('/'))
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{path}", self.base_url.trim_end_matches('/'))
    }
}

/// Access token state shared between the auth API and the data API.
#[derive(Debug, Clone, Default)]
pub(crate) struct TokenState {
    pub access_token: Option<String>,
}

#[derive(Clone)]
pub struct RemoteStore {
    client: Client,
    config: RemoteConfig,
    token: Arc<Mutex<TokenState>>,
}

impl RemoteStore {
    #[must_use]
    pub fn new(config: RemoteConfig) -> Self {
        Self {
            client: Client::new(),
            config,
            token: Arc::new(Mutex::new(TokenState::default())),
        }
    }

    /// The bearer token for data requests: the session token when signed
    /// in, else the anon key.
    fn bearer(&self) -> Result<String, StorageError> {
        let guard = self
            .token
            .lock()
            .map_err(|e| StorageError::Transport(e.to_string()))?;
        Ok(guard
            .access_token
            .clone()
            .unwrap_or_else(|| self.config.api_key.clone()))
    }

    fn set_token(&self, token: Option<String>) -> Result<(), StorageError> {
        let mut guard = self
            .token
            .lock()
            .map_err(|e| StorageError::Transport(e.to_string()))?;
        guard.access_token = token;
        Ok(())
    }
}

impl Storage {
    /// Build a `Storage` backed by the hosted data API, with the device
    /// cache kept locally.
    #[must_use]
    pub fn remote(store: RemoteStore, device_cache: Arc<dyn DeviceCache>) -> Self {
        let progress: Arc<dyn ProgressRepository> = Arc::new(store.clone());
        let profiles: Arc<dyn ProfileRepository> = Arc::new(store);
        Self {
            progress,
            profiles,
            device_cache,
        }
    }
}
