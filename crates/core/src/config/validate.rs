use super::{types::Config, ConfigError};
use crate::scheduler::CronSchedule;

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Object key prefixes are non-empty, end with '/', and do not overlap
/// - Every enabled schedule is a valid cron expression
/// - Train location polling has an API key and at least one line when enabled
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    validate_prefix("storage.raw_prefix", &config.storage.raw_prefix)?;
    validate_prefix("storage.derived_prefix", &config.storage.derived_prefix)?;
    check_disjoint(
        ("storage.raw_prefix", config.storage.raw_prefix.as_str()),
        ("storage.derived_prefix", config.storage.derived_prefix.as_str()),
    )?;

    if config.checkpoint.parameter_name.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "checkpoint.parameter_name cannot be empty".to_string(),
        ));
    }

    if config.orchestrator.enabled {
        validate_schedule("orchestrator.schedule", &config.orchestrator.schedule)?;
    }

    let tl = &config.train_locations;
    if tl.enabled {
        if tl.api_key.is_empty() {
            return Err(ConfigError::ValidationError(
                "train_locations.api_key is required when train_locations.enabled = true"
                    .to_string(),
            ));
        }
        if tl.lines.is_empty() {
            return Err(ConfigError::ValidationError(
                "train_locations.lines cannot be empty".to_string(),
            ));
        }
        validate_prefix("train_locations.raw_prefix", &tl.raw_prefix)?;
        let train_prefix = ("train_locations.raw_prefix", tl.raw_prefix.as_str());
        check_disjoint(train_prefix, ("storage.raw_prefix", config.storage.raw_prefix.as_str()))?;
        check_disjoint(
            train_prefix,
            ("storage.derived_prefix", config.storage.derived_prefix.as_str()),
        )?;
        validate_schedule("train_locations.fetch_schedule", &tl.fetch_schedule)?;
        validate_schedule("train_locations.process_schedule", &tl.process_schedule)?;
    }

    Ok(())
}

fn validate_prefix(field: &str, prefix: &str) -> Result<(), ConfigError> {
    if prefix.is_empty() || !prefix.ends_with('/') || prefix.starts_with('/') {
        return Err(ConfigError::ValidationError(format!(
            "{} must be a relative prefix ending with '/', got {:?}",
            field, prefix
        )));
    }
    Ok(())
}

/// Neither prefix may contain the other.
fn check_disjoint(a: (&str, &str), b: (&str, &str)) -> Result<(), ConfigError> {
    if a.1.starts_with(b.1) || b.1.starts_with(a.1) {
        return Err(ConfigError::ValidationError(format!(
            "{} and {} must not overlap",
            a.0, b.0
        )));
    }
    Ok(())
}

fn validate_schedule(field: &str, expression: &str) -> Result<(), ConfigError> {
    CronSchedule::parse(expression)
        .map(|_| ())
        .map_err(|e| ConfigError::ValidationError(format!("{}: {}", field, e)))
}
