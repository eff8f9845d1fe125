use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Prefix of environment overrides. Nested keys are separated by `__`, so
/// `CTA_TRAIN_LOCATIONS__API_KEY` sets `train_locations.api_key`.
pub const ENV_PREFIX: &str = "CTA_";

/// Load configuration from a TOML file, then apply environment overrides.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.is_file() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    Figment::from(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Load configuration from a TOML string, without environment overrides.
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}
