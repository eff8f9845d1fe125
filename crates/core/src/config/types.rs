use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

use crate::orchestrator::OrchestratorConfig;
use crate::train_locations::TrainLocationsConfig;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub checkpoint: CheckpointConfig,
    #[serde(default)]
    pub gtfs: GtfsConfig,
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,
    #[serde(default)]
    pub notifier: NotifierConfig,
    #[serde(default)]
    pub train_locations: TrainLocationsConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    8080
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Logging configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub format: LogFormat,
}

/// Object storage configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Root directory of the filesystem object store
    #[serde(default = "default_storage_root")]
    pub root: PathBuf,
    /// Prefix for raw GTFS artifacts
    #[serde(default = "default_raw_prefix")]
    pub raw_prefix: String,
    /// Prefix for derived artifacts
    #[serde(default = "default_derived_prefix")]
    pub derived_prefix: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: default_storage_root(),
            raw_prefix: default_raw_prefix(),
            derived_prefix: default_derived_prefix(),
        }
    }
}

fn default_storage_root() -> PathBuf {
    PathBuf::from("data/objects")
}

fn default_raw_prefix() -> String {
    "gtfs_data/".to_string()
}

fn default_derived_prefix() -> String {
    "derived/".to_string()
}

/// Checkpoint (parameter store) configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CheckpointConfig {
    /// SQLite database holding named parameters
    #[serde(default = "default_checkpoint_path")]
    pub path: PathBuf,
    /// Name of the parameter holding the GTFS last-modified time
    #[serde(default = "default_parameter_name")]
    pub parameter_name: String,
}

impl Default for CheckpointConfig {
    fn default() -> Self {
        Self {
            path: default_checkpoint_path(),
            parameter_name: default_parameter_name(),
        }
    }
}

fn default_checkpoint_path() -> PathBuf {
    PathBuf::from("cta-pipeline.db")
}

fn default_parameter_name() -> String {
    "gtfs_last_modified_time".to_string()
}

/// GTFS feed configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GtfsConfig {
    /// URL of the zipped GTFS feed
    #[serde(default = "default_feed_url")]
    pub feed_url: String,
    /// Download timeout in seconds (default: 60)
    #[serde(default = "default_feed_timeout")]
    pub timeout_secs: u32,
}

impl Default for GtfsConfig {
    fn default() -> Self {
        Self {
            feed_url: default_feed_url(),
            timeout_secs: default_feed_timeout(),
        }
    }
}

fn default_feed_url() -> String {
    "https://www.transitchicago.com/downloads/sch_data/google_transit.zip".to_string()
}

fn default_feed_timeout() -> u32 {
    60
}

/// Failure notification configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NotifierConfig {
    /// Webhook URLs that receive failure notifications.
    /// When empty, notifications are only logged.
    #[serde(default)]
    pub subscribers: Vec<String>,
    /// Per-delivery timeout in seconds (default: 10)
    #[serde(default = "default_notifier_timeout")]
    pub timeout_secs: u32,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            subscribers: Vec::new(),
            timeout_secs: default_notifier_timeout(),
        }
    }
}

fn default_notifier_timeout() -> u32 {
    10
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub checkpoint: CheckpointConfig,
    pub gtfs: GtfsConfig,
    pub orchestrator: OrchestratorConfig,
    pub notifier: SanitizedNotifierConfig,
    pub train_locations: SanitizedTrainLocationsConfig,
}

/// Sanitized notifier config (subscriber URLs may embed tokens)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedNotifierConfig {
    pub subscriber_count: usize,
    pub timeout_secs: u32,
}

/// Sanitized train locations config (API key hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedTrainLocationsConfig {
    pub enabled: bool,
    pub api_url: String,
    pub api_key_configured: bool,
    pub lines: Vec<String>,
    pub max_retries: u32,
    pub fetch_schedule: String,
    pub process_schedule: String,
    pub raw_prefix: String,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        let tl = &config.train_locations;
        Self {
            server: config.server.clone(),
            storage: config.storage.clone(),
            checkpoint: config.checkpoint.clone(),
            gtfs: config.gtfs.clone(),
            orchestrator: config.orchestrator.clone(),
            notifier: SanitizedNotifierConfig {
                subscriber_count: config.notifier.subscribers.len(),
                timeout_secs: config.notifier.timeout_secs,
            },
            train_locations: SanitizedTrainLocationsConfig {
                enabled: tl.enabled,
                api_url: tl.api_url.clone(),
                api_key_configured: !tl.api_key.is_empty(),
                lines: tl.lines.clone(),
                max_retries: tl.max_retries,
                fetch_schedule: tl.fetch_schedule.clone(),
                process_schedule: tl.process_schedule.clone(),
                raw_prefix: tl.raw_prefix.clone(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host.to_string(), "0.0.0.0");
        assert_eq!(config.storage.raw_prefix, "gtfs_data/");
        assert_eq!(config.storage.derived_prefix, "derived/");
        assert_eq!(config.checkpoint.parameter_name, "gtfs_last_modified_time");
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert!(config.notifier.subscribers.is_empty());
        assert!(!config.train_locations.enabled);
    }

    #[test]
    fn test_deserialize_sections() {
        let toml = r#"
[server]
host = "127.0.0.1"
port = 9000

[logging]
format = "json"

[storage]
root = "/var/lib/cta"
raw_prefix = "raw/"

[gtfs]
feed_url = "http://localhost/feed.zip"

[notifier]
subscribers = ["http://hooks.local/a", "http://hooks.local/b"]
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.storage.root, PathBuf::from("/var/lib/cta"));
        assert_eq!(config.storage.raw_prefix, "raw/");
        assert_eq!(config.storage.derived_prefix, "derived/");
        assert_eq!(config.gtfs.feed_url, "http://localhost/feed.zip");
        assert_eq!(config.gtfs.timeout_secs, 60);
        assert_eq!(config.notifier.subscribers.len(), 2);
    }

    #[test]
    fn test_sanitized_config_hides_secrets() {
        let toml = r#"
[notifier]
subscribers = ["http://hooks.local/secret-token"]

[train_locations]
enabled = true
api_key = "super-secret"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        let sanitized = SanitizedConfig::from(&config);

        assert_eq!(sanitized.notifier.subscriber_count, 1);
        assert!(sanitized.train_locations.api_key_configured);

        let json = serde_json::to_string(&sanitized).unwrap();
        assert!(!json.contains("super-secret"));
        assert!(!json.contains("secret-token"));
    }
}
