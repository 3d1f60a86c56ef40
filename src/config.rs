//! Client credentials and their resolution from explicit values or the host environment.

use crate::error::ConfigError;
use serde::Deserialize;
use std::fmt;

/// Environment variable consulted for the base URL when none is passed explicitly.
pub const API_URL_ENV: &str = "WHATSAPP_API_URL";

/// Environment variable consulted for the API key when none is passed explicitly.
pub const API_KEY_ENV: &str = "WHATSAPP_API_KEY";

/// Base URL and static API key shared by every request.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawCredentials")]
pub struct ClientCredentials {
    base_url: String,
    api_key: String,
}

#[derive(Deserialize)]
struct RawCredentials {
    base_url: String,
    api_key: String,
}

impl TryFrom<RawCredentials> for ClientCredentials {
    type Error = ConfigError;

    fn try_from(raw: RawCredentials) -> Result<Self, Self::Error> {
        Self::new(raw.base_url, raw.api_key)
    }
}

impl ClientCredentials {
    /// Validate explicit credentials. Both values must be non-empty.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let (base_url, api_key): (String, String) = (base_url.into(), api_key.into());
        let base_url = normalize_base_url(&base_url).ok_or(ConfigError::MissingBaseUrl)?;
        let api_key = non_empty(&api_key).ok_or(ConfigError::MissingApiKey)?;
        Ok(Self { base_url, api_key })
    }

    /// Resolve credentials: a non-empty explicit value wins, otherwise `lookup` is asked for
    /// [`API_URL_ENV`] / [`API_KEY_ENV`]. The host supplies `lookup`, so the library never
    /// assumes where defaults come from.
    pub fn resolve<F>(
        base_url: Option<&str>,
        api_key: Option<&str>,
        lookup: F,
    ) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = base_url
            .and_then(normalize_base_url)
            .or_else(|| lookup(API_URL_ENV).as_deref().and_then(normalize_base_url))
            .ok_or(ConfigError::MissingBaseUrl)?;
        let api_key = api_key
            .and_then(non_empty)
            .or_else(|| lookup(API_KEY_ENV).as_deref().and_then(non_empty))
            .ok_or(ConfigError::MissingApiKey)?;
        Ok(Self { base_url, api_key })
    }

    /// [`resolve`](Self::resolve) against the process environment.
    pub fn from_env(base_url: Option<&str>, api_key: Option<&str>) -> Result<Self, ConfigError> {
        Self::resolve(base_url, api_key, |name| std::env::var(name).ok())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub(crate) fn set_base_url(&mut self, base_url: &str) -> Result<(), ConfigError> {
        self.base_url = normalize_base_url(base_url).ok_or(ConfigError::MissingBaseUrl)?;
        Ok(())
    }

    pub(crate) fn set_api_key(&mut self, api_key: &str) -> Result<(), ConfigError> {
        self.api_key = non_empty(api_key).ok_or(ConfigError::MissingApiKey)?;
        Ok(())
    }
}

impl fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

/// Only trailing slashes are removed; endpoint paths are appended with their own `/`.
fn normalize_base_url(s: &str) -> Option<String> {
    non_empty(s.trim_end_matches('/'))
}
