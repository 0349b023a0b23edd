
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:5000";
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 2000;
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 5000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub api_url: String,
    pub token: Option<String>,
    pub poll_interval: Duration,
    pub request_timeout: Duration
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            token: None,
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            request_timeout: Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS)
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup. Unset or blank keys keep their defaults,
    /// unreadable durations are reported and fall back to their defaults as well.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| lookup(key).map(|value| value.trim().to_string()).filter(|value| !value.is_empty());

        Self {
            api_url: value("FRAUD_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            token: value("FRAUD_API_TOKEN"),
            poll_interval: millis(value("FRAUD_POLL_INTERVAL_MS"), "FRAUD_POLL_INTERVAL_MS", DEFAULT_POLL_INTERVAL_MS),
            request_timeout: millis(value("FRAUD_REQUEST_TIMEOUT_MS"), "FRAUD_REQUEST_TIMEOUT_MS", DEFAULT_REQUEST_TIMEOUT_MS)
        }
    }
}

fn millis(value: Option<String>, key: &str, default: u64) -> Duration {
    let millis = match value.map(|text| text.parse::<u64>()) {
        Some(Ok(millis)) if millis > 0 => millis,
        Some(_) => {
            warn!("Invalid {key}, defaulting to {default}ms");
            default
        },
        None => default
    };

    Duration::from_millis(millis)
}
