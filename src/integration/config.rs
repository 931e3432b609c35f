//! Configuration for the integration layer
//!
//! Holds the app-level options that live next to the TTS settings in the
//! settings store.

use crate::history::DEFAULT_HISTORY_LIMIT;
use crate::settings::SettingsStore;
use crate::speech::voices::DEFAULT_VOICE_LOAD_TIMEOUT;
use crate::{ContextualError, Result};
use serde_json::{json, Map, Value};
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_BACKEND_URL: &str = "https://contextual-ai-sidebar-backend.onrender.com";
pub const DEFAULT_LANGUAGE: &str = "en-US";

pub const KEY_API_KEY: &str = "apiKey";
pub const KEY_BACKEND_URL: &str = "backendUrl";
pub const KEY_HISTORY_ENABLED: &str = "historyEnabled";

/// Configuration for the sidebar session
#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    /// Question-answering backend
    pub backend_url: String,

    /// Key forwarded to the backend, if the user supplied one
    pub api_key: Option<String>,

    /// Whether answered questions are recorded
    pub history_enabled: bool,

    /// Maximum number of history entries kept
    pub history_limit: usize,

    /// Language tag used to pick a default voice
    pub preferred_language: String,

    /// How long to wait for a lazily populated voice list
    pub voice_load_timeout: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            api_key: None,
            history_enabled: true,
            history_limit: DEFAULT_HISTORY_LIMIT,
            preferred_language: DEFAULT_LANGUAGE.to_string(),
            voice_load_timeout: DEFAULT_VOICE_LOAD_TIMEOUT,
        }
    }
}

impl AppConfig {
    /// Set the preferred voice language
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.preferred_language = language.into();
        self
    }

    /// Set the voice list wait
    pub fn with_voice_load_timeout(mut self, timeout: Duration) -> Self {
        self.voice_load_timeout = timeout;
        self
    }

    /// Set the history size limit
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    /// Turn off history recording
    pub fn without_history(mut self) -> Self {
        self.history_enabled = false;
        self
    }

    /// Read the stored options over the current values. A missing
    /// `historyEnabled` means enabled; a blank backend URL means the default.
    pub fn load(mut self, store: &dyn SettingsStore) -> Result<Self> {
        let stored = store.get(&[KEY_API_KEY, KEY_BACKEND_URL, KEY_HISTORY_ENABLED])?;

        self.api_key = stored
            .get(KEY_API_KEY)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string);

        self.backend_url = stored
            .get(KEY_BACKEND_URL)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .unwrap_or(DEFAULT_BACKEND_URL)
            .to_string();
        if !is_http_url(&self.backend_url) {
            warn!(
                "Ignoring stored backend URL {:?}, using {}",
                self.backend_url, DEFAULT_BACKEND_URL
            );
            self.backend_url = DEFAULT_BACKEND_URL.to_string();
        }

        self.history_enabled = stored.get(KEY_HISTORY_ENABLED) != Some(&Value::Bool(false));

        Ok(self)
    }

    /// Persist the user-editable options
    pub fn save(&self, store: &dyn SettingsStore) -> Result<()> {
        let mut entries = Map::new();
        entries.insert(
            KEY_API_KEY.to_string(),
            json!(self.api_key.clone().unwrap_or_default()),
        );
        entries.insert(KEY_BACKEND_URL.to_string(), json!(self.backend_url));
        entries.insert(KEY_HISTORY_ENABLED.to_string(), json!(self.history_enabled));
        store.set(entries)
    }

    /// Whether the backend URL is usable for requests
    pub fn has_valid_backend_url(&self) -> bool {
        is_http_url(&self.backend_url)
    }

    /// Validate the settings speech depends on. The backend URL is not
    /// checked here, see [`AppConfig::has_valid_backend_url`].
    pub fn validate(&self) -> Result<()> {
        if self.preferred_language.trim().is_empty() {
            return Err(ContextualError::ConfigError(
                "Preferred language is required".to_string(),
            ));
        }

        if self.history_limit == 0 {
            return Err(ContextualError::ConfigError(
                "History limit must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

fn is_http_url(url: &str) -> bool {
    let url = url.trim();
    url.starts_with("http://") || url.starts_with("https://")
}

/// Turn a POSIX locale ("en_US.UTF-8") into a language tag ("en-US")
pub fn language_tag_from_locale(locale: &str) -> Option<String> {
    let base = locale.split(['.', '@']).next().unwrap_or_default().trim();
    if base.is_empty() || base == "C" || base == "POSIX" {
        return None;
    }
    Some(base.replace('_', "-"))
}
