//! Store feature flags and environment-driven settings.

use std::str::FromStr;

use thiserror::Error;

/// Where the reference todo service listens by default.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";

pub const ENV_API_URL: &str = "TODO_API_URL";
pub const ENV_SUMMARIZE: &str = "TODO_SUMMARIZE";
pub const ENV_UPDATE_POLICY: &str = "TODO_UPDATE_POLICY";

/// When local state changes relative to the server's confirmation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UpdatePolicy {
    /// Apply every mutation only after the server confirms it.
    #[default]
    Confirmed,
    /// Apply `remove` and `toggle_status` immediately and roll back on
    /// failure. `create` still waits for the server-assigned id.
    Optimistic,
}

impl FromStr for UpdatePolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "confirmed" | "none" => Ok(UpdatePolicy::Confirmed),
            "optimistic" => Ok(UpdatePolicy::Optimistic),
            _ => Err(ConfigError::InvalidValue {
                var: ENV_UPDATE_POLICY,
                value: s.to_string(),
            }),
        }
    }
}

/// Feature flags for one `TodoStore`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreConfig {
    pub summarize: bool,
    pub policy: UpdatePolicy,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            summarize: true,
            policy: UpdatePolicy::Confirmed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{var} must be an http:// or https:// URL, got {value:?}")]
    InvalidBaseUrl { var: &'static str, value: String },

    #[error("invalid value for {var}: {value:?}")]
    InvalidValue { var: &'static str, value: String },
}

/// Everything a session needs to open a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub base_url: String,
    pub store: StoreConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            store: StoreConfig::default(),
        }
    }
}

impl Settings {
    /// Read settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through `lookup`; unset keys fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Settings::default();

        if let Some(url) = lookup(ENV_API_URL) {
            let url = url.trim();
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::InvalidBaseUrl {
                    var: ENV_API_URL,
                    value: url.to_string(),
                });
            }
            settings.base_url = url.to_string();
        }
        if let Some(flag) = lookup(ENV_SUMMARIZE) {
            settings.store.summarize = parse_flag(ENV_SUMMARIZE, &flag)?;
        }
        if let Some(policy) = lookup(ENV_UPDATE_POLICY) {
            settings.store.policy = policy.parse()?;
        }

        Ok(settings)
    }
}

fn parse_flag(var: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            var,
            value: value.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn settings(pairs: &[(&str, &str)]) -> Result<Settings, ConfigError> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let s = settings(&[]).unwrap();
        assert_eq!(s.base_url, DEFAULT_BASE_URL);
        assert!(s.store.summarize);
        assert_eq!(s.store.policy, UpdatePolicy::Confirmed);
    }

    #[test]
    fn reads_all_variables() {
        let s = settings(&[
            (ENV_API_URL, "https://todos.example.com/"),
            (ENV_SUMMARIZE, "off"),
            (ENV_UPDATE_POLICY, "Optimistic"),
        ])
        .unwrap();
        assert_eq!(s.base_url, "https://todos.example.com/");
        assert!(!s.store.summarize);
        assert_eq!(s.store.policy, UpdatePolicy::Optimistic);
    }

    #[test]
    fn rejects_non_http_url() {
        let err = settings(&[(ENV_API_URL, "localhost:8080")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBaseUrl { .. }));
    }

    #[test]
    fn rejects_unknown_flag_value() {
        let err = settings(&[(ENV_SUMMARIZE, "maybe")]).unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidValue {
                var: ENV_SUMMARIZE,
                value: "maybe".to_string()
            }
        );
    }

    #[test]
    fn rejects_unknown_policy() {
        assert!("eventual".parse::<UpdatePolicy>().is_err());
        assert_eq!("none".parse::<UpdatePolicy>().unwrap(), UpdatePolicy::Confirmed);
    }
}
