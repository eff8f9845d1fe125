//! Train location ingestion configuration.

use serde::{Deserialize, Serialize};

/// Configuration for live train position polling and daily processing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainLocationsConfig {
    /// Enable/disable the scheduled fetch and process jobs.
    #[serde(default)]
    pub enabled: bool,

    /// CTA Train Tracker API key. Required when enabled.
    #[serde(default)]
    pub api_key: String,

    /// Train positions endpoint.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Route codes polled on every fetch.
    #[serde(default = "default_lines")]
    pub lines: Vec<String>,

    /// Additional attempts per line after the first failure.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Backoff before retry `n` is `retry_base_ms * 2^n`.
    #[serde(default = "default_retry_base_ms")]
    pub retry_base_ms: u64,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Cron expression for the fetch job (default: every minute).
    #[serde(default = "default_fetch_schedule")]
    pub fetch_schedule: String,

    /// Cron expression for the daily processing job (default: 07:00 UTC).
    /// Each run processes the previous UTC day.
    #[serde(default = "default_process_schedule")]
    pub process_schedule: String,

    /// Prefix raw position samples are written under.
    #[serde(default = "default_raw_prefix")]
    pub raw_prefix: String,
}

fn default_api_url() -> String {
    "http://lapi.transitchicago.com/api/1.0/ttpositions.aspx".to_string()
}

fn default_lines() -> Vec<String> {
    ["blue", "brn", "g", "org", "p", "pink", "red", "y"]
        .iter()
        .map(|l| l.to_string())
        .collect()
}

fn default_max_retries() -> u32 {
    2
}

fn default_retry_base_ms() -> u64 {
    1000
}

fn default_timeout_secs() -> u64 {
    5
}

fn default_fetch_schedule() -> String {
    "0 * * * * *".to_string()
}

fn default_process_schedule() -> String {
    "0 0 7 * * *".to_string()
}

fn default_raw_prefix() -> String {
    "raw-api-data/".to_string()
}

impl Default for TrainLocationsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: String::new(),
            api_url: default_api_url(),
            lines: default_lines(),
            max_retries: default_max_retries(),
            retry_base_ms: default_retry_base_ms(),
            timeout_secs: default_timeout_secs(),
            fetch_schedule: default_fetch_schedule(),
            process_schedule: default_process_schedule(),
            raw_prefix: default_raw_prefix(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TrainLocationsConfig::default();
        assert!(!config.enabled);
        assert_eq!(config.lines.len(), 8);
        assert_eq!(config.max_retries, 2);
        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.raw_prefix, "raw-api-data/");
    }

    #[test]
    fn test_deserialize_overrides_lines() {
        let toml = r#"
            enabled = true
            api_key = "abc"
            lines = ["red", "blue"]
        "#;
        let config: TrainLocationsConfig = toml::from_str(toml).unwrap();
        assert!(config.enabled);
        assert_eq!(config.lines, vec!["red", "blue"]);
        assert_eq!(config.fetch_schedule, "0 * * * * *");
    }
}
