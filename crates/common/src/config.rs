use std::env;
use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";
pub const DEFAULT_REGISTRY_INTERVAL_SECS: u64 = 3;
pub const DEFAULT_ANALYTICS_INTERVAL_SECS: u64 = 5;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key} must be a whole number of seconds, got {value:?}")]
    NotANumber { key: &'static str, value: String },
    #[error("{key} must be greater than zero")]
    Zero { key: &'static str },
    #[error("{key} must not be empty")]
    Empty { key: &'static str },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardConfig {
    pub api_url: String,
    pub registry_interval: Duration,
    pub analytics_interval: Duration,
    pub request_timeout: Duration,
    pub log_filter: String,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            registry_interval: Duration::from_secs(DEFAULT_REGISTRY_INTERVAL_SECS),
            analytics_interval: Duration::from_secs(DEFAULT_ANALYTICS_INTERVAL_SECS),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl DashboardConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup; missing keys fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_url = match lookup("DASHBOARD_API_URL") {
            Some(url) if url.trim().is_empty() => {
                return Err(ConfigError::Empty {
                    key: "DASHBOARD_API_URL",
                });
            }
            Some(url) => url.trim().trim_end_matches('/').to_string(),
            None => DEFAULT_API_URL.to_string(),
        };

        Ok(Self {
            api_url,
            registry_interval: seconds(
                &lookup,
                "DASHBOARD_REGISTRY_INTERVAL_SECS",
                DEFAULT_REGISTRY_INTERVAL_SECS,
            )?,
            analytics_interval: seconds(
                &lookup,
                "DASHBOARD_ANALYTICS_INTERVAL_SECS",
                DEFAULT_ANALYTICS_INTERVAL_SECS,
            )?,
            request_timeout: seconds(
                &lookup,
                "DASHBOARD_REQUEST_TIMEOUT_SECS",
                DEFAULT_REQUEST_TIMEOUT_SECS,
            )?,
            log_filter: lookup("DASHBOARD_LOG").unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
        })
    }
}

fn seconds<F>(lookup: &F, key: &'static str, default: u64) -> Result<Duration, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let secs = match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map_err(|_| ConfigError::NotANumber { key, value: raw })?,
        None => default,
    };

    if secs == 0 {
        return Err(ConfigError::Zero { key });
    }
    Ok(Duration::from_secs(secs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_nothing_is_set() {
        let config = DashboardConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, DashboardConfig::default());
        assert_eq!(config.registry_interval, Duration::from_secs(3));
        assert_eq!(config.analytics_interval, Duration::from_secs(5));
    }

    #[test]
    fn test_overrides_and_trailing_slash() {
        let config = DashboardConfig::from_lookup(lookup_from(&[
            ("DASHBOARD_API_URL", "http://bots.local:8080/api/"),
            ("DASHBOARD_REGISTRY_INTERVAL_SECS", "7"),
            ("DASHBOARD_LOG", "debug"),
        ]))
        .unwrap();

        assert_eq!(config.api_url, "http://bots.local:8080/api");
        assert_eq!(config.registry_interval, Duration::from_secs(7));
        assert_eq!(config.log_filter, "debug");
    }

    #[test]
    fn test_rejects_zero_and_garbage_intervals() {
        let zero =
            DashboardConfig::from_lookup(lookup_from(&[("DASHBOARD_ANALYTICS_INTERVAL_SECS", "0")]));
        assert_eq!(
            zero,
            Err(ConfigError::Zero {
                key: "DASHBOARD_ANALYTICS_INTERVAL_SECS"
            })
        );

        let garbage =
            DashboardConfig::from_lookup(lookup_from(&[("DASHBOARD_REQUEST_TIMEOUT_SECS", "soon")]));
        assert!(matches!(garbage, Err(ConfigError::NotANumber { .. })));
    }
}
