use crate::client::{CallPolicies, CallPolicy};
use crate::session::AbandonPolicy;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://api.pronouncepal.com";
pub const DEFAULT_API_VERSION: &str = "v1";
pub const DEFAULT_SPEECH_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_SPEECH_RETRIES: u8 = 2;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 8;

const ENV_BACKEND: &str = "PRONOUNCEPAL_BACKEND";
const ENV_API_URL: &str = "PRONOUNCEPAL_API_URL";
const ENV_API_VERSION: &str = "PRONOUNCEPAL_API_VERSION";
const ENV_API_TOKEN: &str = "PRONOUNCEPAL_API_TOKEN";
const ENV_SPEECH_TIMEOUT: &str = "PRONOUNCEPAL_SPEECH_TIMEOUT_SECS";
const ENV_SPEECH_RETRIES: &str = "PRONOUNCEPAL_SPEECH_RETRIES";
const ENV_REQUEST_TIMEOUT: &str = "PRONOUNCEPAL_REQUEST_TIMEOUT_SECS";
const ENV_MOCK_LATENCY: &str = "PRONOUNCEPAL_MOCK_LATENCY";
const ENV_ABANDON_POLICY: &str = "PRONOUNCEPAL_ABANDON_POLICY";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Mock,
    Http,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub backend: BackendKind,
    pub api_url: String,
    pub api_version: String,
    pub api_token: Option<String>,
    pub speech_timeout_secs: u64,
    pub speech_retries: u8,
    pub request_timeout_secs: u64,
    pub mock_latency: bool,
    pub abandon_policy: AbandonPolicy,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Mock,
            api_url: DEFAULT_API_URL.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            api_token: None,
            speech_timeout_secs: DEFAULT_SPEECH_TIMEOUT_SECS,
            speech_retries: DEFAULT_SPEECH_RETRIES,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            mock_latency: true,
            abandon_policy: AbandonPolicy::Discard,
        }
    }
}

impl AppConfig {
    /// Read from the process environment (call `dotenvy::dotenv()` first to pick up `.env`)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let value = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let config = Self {
            backend: value(ENV_BACKEND)
                .map(|v| normalize_backend(&v))
                .unwrap_or(defaults.backend),
            api_url: value(ENV_API_URL)
                .map(|v| normalize_api_url(&v))
                .unwrap_or(defaults.api_url),
            api_version: value(ENV_API_VERSION)
                .map(|v| v.trim_matches('/').to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.api_version),
            api_token: value(ENV_API_TOKEN),
            speech_timeout_secs: value(ENV_SPEECH_TIMEOUT)
                .map(|v| parse_or_default(ENV_SPEECH_TIMEOUT, &v, DEFAULT_SPEECH_TIMEOUT_SECS))
                .filter(|secs| *secs > 0)
                .unwrap_or(DEFAULT_SPEECH_TIMEOUT_SECS),
            speech_retries: value(ENV_SPEECH_RETRIES)
                .map(|v| parse_or_default(ENV_SPEECH_RETRIES, &v, DEFAULT_SPEECH_RETRIES))
                .unwrap_or(DEFAULT_SPEECH_RETRIES),
            request_timeout_secs: value(ENV_REQUEST_TIMEOUT)
                .map(|v| parse_or_default(ENV_REQUEST_TIMEOUT, &v, DEFAULT_REQUEST_TIMEOUT_SECS))
                .filter(|secs| *secs > 0)
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
            mock_latency: value(ENV_MOCK_LATENCY)
                .map(|v| normalize_switch(&v))
                .unwrap_or(defaults.mock_latency),
            abandon_policy: value(ENV_ABANDON_POLICY)
                .map(|v| normalize_abandon_policy(&v))
                .unwrap_or(defaults.abandon_policy),
        };

        tracing::info!(
            "Config loaded: backend={:?}, api={}/{}, token={}, speech_timeout={}s, speech_retries={}, abandon_policy={:?}",
            config.backend,
            config.api_url,
            config.api_version,
            config.api_token.is_some(),
            config.speech_timeout_secs,
            config.speech_retries,
            config.abandon_policy
        );

        config
    }

    pub fn call_policies(&self) -> CallPolicies {
        CallPolicies {
            speech: CallPolicy::new(
                Duration::from_secs(self.speech_timeout_secs),
                self.speech_retries,
            ),
            default: CallPolicy::new(Duration::from_secs(self.request_timeout_secs), 0),
        }
    }
}

pub fn normalize_backend(input: &str) -> BackendKind {
    match input.trim().to_ascii_lowercase().as_str() {
        "mock" => BackendKind::Mock,
        "http" | "remote" => BackendKind::Http,
        other => {
            tracing::warn!("Unknown backend '{}', using mock", other);
            BackendKind::Mock
        }
    }
}

pub fn normalize_api_url(input: &str) -> String {
    let trimmed = input.trim().trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        tracing::warn!("API URL '{}' has no http(s) scheme, using default", input);
        DEFAULT_API_URL.to_string()
    }
}

pub fn normalize_abandon_policy(input: &str) -> AbandonPolicy {
    match input.trim().to_ascii_lowercase().as_str() {
        "discard" => AbandonPolicy::Discard,
        "archive" => AbandonPolicy::Archive,
        other => {
            tracing::warn!("Unknown abandon policy '{}', using discard", other);
            AbandonPolicy::Discard
        }
    }
}

fn normalize_switch(input: &str) -> bool {
    !matches!(
        input.trim().to_ascii_lowercase().as_str(),
        "off" | "false" | "0" | "no"
    )
}

fn parse_or_default<T: std::str::FromStr + Copy>(key: &str, raw: &str, default: T) -> T {
    match raw.parse::<T>() {
        Ok(value) => value,
        Err(_) => {
            tracing::warn!("Invalid value '{}' for {}, using default", raw, key);
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> AppConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_when_unset() {
        assert_eq!(config_from(&[]), AppConfig::default());
    }

    #[test]
    fn test_reads_all_values() {
        let config = config_from(&[
            ("PRONOUNCEPAL_BACKEND", "HTTP"),
            ("PRONOUNCEPAL_API_URL", "https://staging.pronouncepal.com/"),
            ("PRONOUNCEPAL_API_VERSION", "/v2/"),
            ("PRONOUNCEPAL_API_TOKEN", " tok_abc "),
            ("PRONOUNCEPAL_SPEECH_TIMEOUT_SECS", "15"),
            ("PRONOUNCEPAL_SPEECH_RETRIES", "4"),
            ("PRONOUNCEPAL_REQUEST_TIMEOUT_SECS", "5"),
            ("PRONOUNCEPAL_MOCK_LATENCY", "off"),
            ("PRONOUNCEPAL_ABANDON_POLICY", "archive"),
        ]);

        assert_eq!(config.backend, BackendKind::Http);
        assert_eq!(config.api_url, "https://staging.pronouncepal.com");
        assert_eq!(config.api_version, "v2");
        assert_eq!(config.api_token.as_deref(), Some("tok_abc"));
        assert_eq!(config.speech_timeout_secs, 15);
        assert_eq!(config.speech_retries, 4);
        assert_eq!(config.request_timeout_secs, 5);
        assert!(!config.mock_latency);
        assert_eq!(config.abandon_policy, AbandonPolicy::Archive);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = config_from(&[
            ("PRONOUNCEPAL_BACKEND", "carrier-pigeon"),
            ("PRONOUNCEPAL_API_URL", "ftp://nope"),
            ("PRONOUNCEPAL_API_TOKEN", "   "),
            ("PRONOUNCEPAL_SPEECH_TIMEOUT_SECS", "0"),
            ("PRONOUNCEPAL_SPEECH_RETRIES", "many"),
            ("PRONOUNCEPAL_ABANDON_POLICY", "keep"),
        ]);

        assert_eq!(config.backend, BackendKind::Mock);
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.api_token, None);
        assert_eq!(config.speech_timeout_secs, DEFAULT_SPEECH_TIMEOUT_SECS);
        assert_eq!(config.speech_retries, DEFAULT_SPEECH_RETRIES);
        assert_eq!(config.abandon_policy, AbandonPolicy::Discard);
    }

    #[test]
    fn test_call_policies_follow_config() {
        let config = config_from(&[
            ("PRONOUNCEPAL_SPEECH_TIMEOUT_SECS", "12"),
            ("PRONOUNCEPAL_SPEECH_RETRIES", "1"),
        ]);
        let policies = config.call_policies();
        assert_eq!(policies.speech.timeout, Duration::from_secs(12));
        assert_eq!(policies.speech.max_retries, 1);
        assert_eq!(policies.default.max_retries, 0);
        assert_eq!(policies.default.timeout, Duration::from_secs(8));
    }
}
