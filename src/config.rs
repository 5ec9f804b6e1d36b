//! Runtime configuration.
//!
//! Thresholds are deliberately configurable rather than baked in: the
//! restart count that counts as a crash loop and the utilization
//! watermarks vary between clusters. Defaults match the conventional
//! values (restart count 5, 90%/95% watermarks).

use std::time::Duration;

/// Environment variable prefix for all overrides
const ENV_PREFIX: &str = "KUBE_SENTRY_";

/// Tunable thresholds and timeouts
#[derive(Debug, Clone)]
pub struct SentryConfig {
    /// Container restart count above which a Running pod is flagged
    pub restart_threshold: i32,

    /// Node CPU/memory utilization ratio that produces a warning
    pub usage_warn_ratio: f64,

    /// Node CPU/memory utilization ratio that produces a critical finding
    pub usage_critical_ratio: f64,

    /// Per-query timeout for every cluster API call
    pub query_timeout: Duration,
}

impl Default for SentryConfig {
    fn default() -> Self {
        Self {
            restart_threshold: 5,
            usage_warn_ratio: 0.90,
            usage_critical_ratio: 0.95,
            query_timeout: Duration::from_secs(10),
        }
    }
}

impl SentryConfig {
    /// Build config from environment, falling back to defaults.
    ///
    /// Recognized variables: `KUBE_SENTRY_RESTART_THRESHOLD`,
    /// `KUBE_SENTRY_USAGE_WARN_RATIO`, `KUBE_SENTRY_USAGE_CRITICAL_RATIO`,
    /// `KUBE_SENTRY_QUERY_TIMEOUT_SECS`.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(v) = env_parse::<i32>("RESTART_THRESHOLD") {
            config.restart_threshold = v;
        }
        if let Some(v) = env_parse::<f64>("USAGE_WARN_RATIO") {
            config.usage_warn_ratio = v;
        }
        if let Some(v) = env_parse::<f64>("USAGE_CRITICAL_RATIO") {
            config.usage_critical_ratio = v;
        }
        if let Some(v) = env_parse::<u64>("QUERY_TIMEOUT_SECS") {
            config.query_timeout = Duration::from_secs(v);
        }

        config
    }
}

fn env_parse<T: std::str::FromStr>(suffix: &str) -> Option<T> {
    std::env::var(format!("{}{}", ENV_PREFIX, suffix))
        .ok()
        .and_then(|v| v.parse().ok())
}
