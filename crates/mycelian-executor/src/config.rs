//! Executor configuration, including `SQ_`-prefixed environment loading.

use std::sync::Arc;
use std::time::Duration;

use mycelian_core::{ErrorHandler, IsIrrecoverable, LoggingErrorHandler, MetricsSink, NoopMetricsSink};

/// Error returned by [`Config::from_env`] when a *present* environment
/// variable cannot be parsed. Absent variables silently fall back to their
/// documented default — this is only for malformed values.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// `{var}` was set but could not be parsed as the expected type.
    #[error("invalid value for {var}: {source}")]
    InvalidValue {
        /// Environment variable name.
        var: &'static str,
        /// Underlying parse error, as text (the parsers involved don't
        /// share a common error trait).
        source: String,
    },
}

/// Immutable configuration for an [`crate::Executor`].
///
/// Classifiers, the error handler, and the metrics sink are all injected —
/// the executor never hardcodes a retry taxonomy or a metrics backend.
#[derive(Clone)]
pub struct Config {
    /// Number of parallel shard lanes. Must be nonzero; [`Config::new`]
    /// and [`Config::from_env`] both clamp a zero value up to 1.
    pub shards: u16,
    /// Per-shard bounded buffer capacity.
    pub queue_size: usize,
    /// Maximum time `submit`/`barrier` block waiting for buffer space.
    pub enqueue_timeout: Duration,
    /// Total attempts per job (including the first), before giving up on a
    /// recoverable failure.
    pub max_attempts: u32,
    /// Initial backoff delay.
    pub base_backoff: Duration,
    /// Backoff cap.
    pub max_interval: Duration,
    /// Predicate classifying a job error as irrecoverable (no retry) vs
    /// recoverable (retry with backoff). Defaults to "always recoverable"
    /// when unset, so the worker still exhausts `max_attempts` rather than
    /// silently never retrying.
    pub is_irrecoverable: Arc<dyn IsIrrecoverable>,
    /// Called once per job when its error surfaces without a synchronous
    /// caller to report to.
    pub error_handler: Arc<dyn ErrorHandler>,
    /// Metrics destination. Defaults to a no-op sink.
    pub metrics: Arc<dyn MetricsSink>,
}

struct AlwaysRecoverable;
impl IsIrrecoverable for AlwaysRecoverable {
    fn is_irrecoverable(&self, _err: &mycelian_core::JobError) -> bool {
        false
    }
}

impl Config {
    /// Default number of shard lanes.
    pub const DEFAULT_SHARDS: u16 = 4;
    /// Default per-shard buffer capacity.
    pub const DEFAULT_QUEUE_SIZE: usize = 128;
    /// Default enqueue timeout.
    pub const DEFAULT_ENQUEUE_TIMEOUT: Duration = Duration::from_millis(100);
    /// Default total attempts per job.
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 8;
    /// Default initial backoff.
    pub const DEFAULT_BASE_BACKOFF: Duration = Duration::from_millis(100);
    /// Default backoff cap.
    pub const DEFAULT_MAX_INTERVAL: Duration = Duration::from_secs(20);

    /// Construct a config with every field at its documented default.
    pub fn new() -> Self {
        Config {
            shards: Self::DEFAULT_SHARDS,
            queue_size: Self::DEFAULT_QUEUE_SIZE,
            enqueue_timeout: Self::DEFAULT_ENQUEUE_TIMEOUT,
            max_attempts: Self::DEFAULT_MAX_ATTEMPTS,
            base_backoff: Self::DEFAULT_BASE_BACKOFF,
            max_interval: Self::DEFAULT_MAX_INTERVAL,
            is_irrecoverable: Arc::new(AlwaysRecoverable),
            error_handler: Arc::new(LoggingErrorHandler),
            metrics: Arc::new(NoopMetricsSink),
        }
    }

    /// Apply zero-value defaults the way `NewExecutor` does in spec: a
    /// `shards` or `queue_size` of 0 is clamped up rather than rejected,
    /// since an executor with zero lanes or zero capacity can never run
    /// anything.
    pub(crate) fn normalized(mut self) -> Self {
        if self.shards == 0 {
            self.shards = Self::DEFAULT_SHARDS;
        }
        if self.queue_size == 0 {
            self.queue_size = Self::DEFAULT_QUEUE_SIZE;
        }
        if self.enqueue_timeout.is_zero() {
            self.enqueue_timeout = Self::DEFAULT_ENQUEUE_TIMEOUT;
        }
        if self.max_attempts == 0 {
            self.max_attempts = 1;
        }
        if self.base_backoff.is_zero() {
            self.base_backoff = Self::DEFAULT_BASE_BACKOFF;
        }
        if self.max_interval < self.base_backoff {
            self.max_interval = self.base_backoff;
        }
        self
    }

    /// Load the `SQ_*` environment variables documented in the executor's
    /// external-interface spec, falling back to defaults for anything
    /// unset. Returns [`ConfigError::InvalidValue`] for a variable that is
    /// set but unparsable.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut cfg = Config::new();

        if let Some(v) = env_var("SQ_SHARDS") {
            cfg.shards = parse_env("SQ_SHARDS", &v)?;
        }
        if let Some(v) = env_var("SQ_QUEUE_SIZE") {
            cfg.queue_size = parse_env("SQ_QUEUE_SIZE", &v)?;
        }
        if let Some(v) = env_var("SQ_ENQUEUE_TIMEOUT") {
            cfg.enqueue_timeout = parse_duration_env("SQ_ENQUEUE_TIMEOUT", &v)?;
        }
        if let Some(v) = env_var("SQ_MAX_ATTEMPTS") {
            cfg.max_attempts = parse_env("SQ_MAX_ATTEMPTS", &v)?;
        }
        if let Some(v) = env_var("SQ_BASE_BACKOFF") {
            cfg.base_backoff = parse_duration_env("SQ_BASE_BACKOFF", &v)?;
        }
        if let Some(v) = env_var("SQ_MAX_INTERVAL") {
            cfg.max_interval = parse_duration_env("SQ_MAX_INTERVAL", &v)?;
        }

        Ok(cfg.normalized())
    }
}

impl Default for Config {
    fn default() -> Self {
        Config::new()
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn parse_env<T>(var: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        var,
        source: e.to_string(),
    })
}

fn parse_duration_env(var: &'static str, raw: &str) -> Result<Duration, ConfigError> {
    humantime::parse_duration(raw).map_err(|e| ConfigError::InvalidValue {
        var,
        source: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let cfg = Config::new();
        assert_eq!(cfg.shards, 4);
        assert_eq!(cfg.queue_size, 128);
        assert_eq!(cfg.enqueue_timeout, Duration::from_millis(100));
        assert_eq!(cfg.max_attempts, 8);
        assert_eq!(cfg.base_backoff, Duration::from_millis(100));
        assert_eq!(cfg.max_interval, Duration::from_secs(20));
    }

    #[test]
    fn zero_values_normalize_to_defaults() {
        let mut cfg = Config::new();
        cfg.shards = 0;
        cfg.queue_size = 0;
        let cfg = cfg.normalized();
        assert_eq!(cfg.shards, Config::DEFAULT_SHARDS);
        assert_eq!(cfg.queue_size, Config::DEFAULT_QUEUE_SIZE);
    }

    #[test]
    fn max_interval_floors_to_base_backoff() {
        let mut cfg = Config::new();
        cfg.base_backoff = Duration::from_secs(5);
        cfg.max_interval = Duration::from_secs(1);
        let cfg = cfg.normalized();
        assert_eq!(cfg.max_interval, Duration::from_secs(5));
    }
}
