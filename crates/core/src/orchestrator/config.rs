//! Orchestrator configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the GTFS pipeline orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Enable/disable the scheduled trigger.
    /// When disabled, runs must be started manually via API.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Cron expression for the scheduled trigger (UTC, seconds resolution).
    /// Default is daily at 06:00 UTC (midnight Chicago standard time).
    #[serde(default = "default_schedule")]
    pub schedule: String,

    /// Subject of the failure notification.
    #[serde(default = "default_failure_subject")]
    pub failure_subject: String,

    /// Body of the failure notification. Fixed per deployment.
    #[serde(default = "default_failure_message")]
    pub failure_message: String,
}

fn default_enabled() -> bool {
    true
}

fn default_schedule() -> String {
    "0 0 6 * * *".to_string()
}

fn default_failure_subject() -> String {
    "CTA GTFS pipeline failed".to_string()
}

fn default_failure_message() -> String {
    "The CTA GTFS pipeline failed. Check the pipeline logs for details.".to_string()
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            schedule: default_schedule(),
            failure_subject: default_failure_subject(),
            failure_message: default_failure_message(),
        }
    }
}
