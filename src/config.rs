//! Application-level configuration loading: match parameters, scoring rules and the roster.

use std::{env, fs, io::ErrorKind, path::PathBuf};

use serde::Deserialize;
use tracing::{info, warn};

use crate::state::{
    match_state::{MatchRules, Player},
    session::MatchParameters,
};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "COURTSIDE_CONFIG_PATH";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
/// Immutable startup configuration shared across the application.
pub struct AppConfig {
    /// Parameters of the first session; later updates arrive over HTTP.
    #[serde(rename = "match")]
    pub parameters: MatchParameters,
    /// Extension and skunk settings. The target score comes from `match`.
    pub rules: MatchRules,
    /// Selectable players, in display order.
    pub roster: Vec<Player>,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match Self::parse(&contents) {
                Ok(config) => {
                    info!(
                        path = %path.display(),
                        players = config.roster.len(),
                        win_threshold = config.parameters.win_threshold,
                        "loaded configuration"
                    );
                    config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Parse a JSON document; absent sections keep their defaults.
    pub fn parse(contents: &str) -> serde_json::Result<Self> {
        serde_json::from_str(contents)
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feedback::SoundScheme;

    #[test]
    fn empty_document_yields_defaults() {
        let config = AppConfig::parse("{}").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.parameters.win_threshold, 15);
        assert_eq!(config.parameters.attack_seconds, 24);
        assert_eq!(config.rules.extension_increment, 2);
    }

    #[test]
    fn partial_sections_merge_with_defaults() {
        let config = AppConfig::parse(
            r#"{
                "match": { "attack_seconds": 30, "feedback": { "scheme": "intenso" } },
                "rules": { "skunk_bound": 3 },
                "roster": [{ "id": "p1", "name": "Lia" }]
            }"#,
        )
        .unwrap();

        assert_eq!(config.parameters.attack_seconds, 30);
        assert_eq!(config.parameters.win_threshold, 15);
        assert_eq!(config.parameters.feedback.scheme, SoundScheme::Intense);
        assert!(config.parameters.feedback.audio_enabled);
        assert_eq!(config.rules.skunk_bound, 3);
        assert!(config.rules.extension_enabled);
        assert_eq!(config.roster.len(), 1);
    }

    #[test]
    fn malformed_document_is_an_error() {
        assert!(AppConfig::parse(r#"{"match": 12}"#).is_err());
    }
}
