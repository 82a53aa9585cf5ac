//! Client-facing configuration: the backend URL, optional bearer token, and
//! HTTP timeout, loaded from `MYCELIAN_*` environment variables.

use std::time::Duration;

/// Error returned by [`Config::from_env`].
///
/// Mirrors `mycelian-executor::ConfigError`'s policy: a variable that is
/// *absent* falls back to its documented default (or, for
/// `MYCELIAN_BACKEND_URL`, is a hard error since there is no sensible
/// default backend); a variable that is *present but malformed* is always
/// an error, never silently ignored.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// `MYCELIAN_BACKEND_URL` was not set.
    #[error("MYCELIAN_BACKEND_URL is not set")]
    MissingBackendUrl,

    /// `MYCELIAN_BACKEND_URL` was set but is not a valid URL.
    #[error("MYCELIAN_BACKEND_URL is not a valid URL: {0}")]
    InvalidBackendUrl(String),

    /// A present environment variable could not be parsed.
    #[error("invalid value for {var}: {source}")]
    InvalidValue {
        /// Environment variable name.
        var: &'static str,
        /// Underlying parse error, as text.
        source: String,
    },
}

/// Configuration for [`crate::MemoryClient`].
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL every request is resolved against, e.g.
    /// `https://api.mycelian.example`.
    pub backend_url: reqwest::Url,
    /// Bearer token attached to every request, if set.
    pub api_key: Option<String>,
    /// Timeout passed to `reqwest::ClientBuilder::timeout`.
    pub http_timeout: Duration,
}

impl Config {
    /// Default HTTP request timeout.
    pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

    /// Build a config directly from a backend URL, with no API key and the
    /// default timeout.
    pub fn new(backend_url: reqwest::Url) -> Self {
        Config {
            backend_url,
            api_key: None,
            http_timeout: Self::DEFAULT_HTTP_TIMEOUT,
        }
    }

    /// Load `MYCELIAN_BACKEND_URL` (required), `MYCELIAN_API_KEY`
    /// (optional), and `MYCELIAN_HTTP_TIMEOUT` (humantime, default 30s).
    pub fn from_env() -> Result<Self, ConfigError> {
        let raw_url = env_var("MYCELIAN_BACKEND_URL").ok_or(ConfigError::MissingBackendUrl)?;
        let backend_url =
            reqwest::Url::parse(&raw_url).map_err(|e| ConfigError::InvalidBackendUrl(e.to_string()))?;

        let api_key = env_var("MYCELIAN_API_KEY");

        let http_timeout = match env_var("MYCELIAN_HTTP_TIMEOUT") {
            Some(raw) => humantime::parse_duration(&raw).map_err(|e| ConfigError::InvalidValue {
                var: "MYCELIAN_HTTP_TIMEOUT",
                source: e.to_string(),
            })?,
            None => Self::DEFAULT_HTTP_TIMEOUT,
        };

        Ok(Config {
            backend_url,
            api_key,
            http_timeout,
        })
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}
