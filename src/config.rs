//! Application-level configuration loading: score rules per game kind and SSE sizing.

use std::{collections::HashMap, env, fs, io::ErrorKind, path::PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::state::scoring::ScoreRule;

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "FEST_BRACKET_BACK_CONFIG_PATH";
const DEFAULT_SSE_CAPACITY: usize = 64;
const CORNHOLE: &str = "cornhole";

#[derive(Debug, Clone, PartialEq)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    score_rules: HashMap<String, ScoreRule>,
    sse_capacity: usize,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match Self::from_json(&contents) {
                Ok(app_config) => {
                    info!(
                        path = %path.display(),
                        rules = app_config.score_rules.len(),
                        "loaded score rules from config"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "rejected config; falling back to defaults"
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

    /// Parse the JSON configuration format, rejecting score rules that cannot be played.
    pub fn from_json(contents: &str) -> Result<Self, ConfigError> {
        serde_json::from_str::<RawConfig>(contents)?.try_into()
    }

    /// Score rule for `game_kind`. Unknown kinds play by the cornhole rule.
    pub fn score_rule(&self, game_kind: &str) -> ScoreRule {
        self.score_rules
            .get(&game_kind.to_ascii_lowercase())
            .copied()
            .unwrap_or_default()
    }

    /// Capacity of the public SSE broadcast channel.
    pub fn sse_capacity(&self) -> usize {
        self.sse_capacity
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            score_rules: HashMap::from([(CORNHOLE.to_owned(), ScoreRule::CORNHOLE)]),
            sse_capacity: DEFAULT_SSE_CAPACITY,
        }
    }
}

/// Reasons a configuration file is refused.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file is not valid JSON for the expected shape.
    #[error("malformed config: {0}")]
    Parse(#[from] serde_json::Error),
    /// A score rule could never produce a legal winner or stored score.
    #[error("score rule `{kind}`: {reason}")]
    InvalidRule {
        /// Game kind the rule was declared for.
        kind: String,
        /// Which bound was broken.
        reason: &'static str,
    },
}

#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    #[serde(default)]
    score_rules: HashMap<String, RawScoreRule>,
    #[serde(default)]
    sse_capacity: Option<usize>,
}

impl TryFrom<RawConfig> for AppConfig {
    type Error = ConfigError;

    fn try_from(value: RawConfig) -> Result<Self, Self::Error> {
        let mut score_rules = AppConfig::default().score_rules;
        for (kind, raw) in value.score_rules {
            let rule = ScoreRule::try_from(raw)
                .map_err(|reason| ConfigError::InvalidRule { kind: kind.clone(), reason })?;
            score_rules.insert(kind.to_ascii_lowercase(), rule);
        }
        Ok(Self {
            score_rules,
            sse_capacity: value.sse_capacity.unwrap_or(DEFAULT_SSE_CAPACITY),
        })
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of a single score rule. `max_valid` defaults to the target.
struct RawScoreRule {
    target: u32,
    #[serde(default)]
    max_valid: Option<u32>,
    fallback: u32,
}

impl TryFrom<RawScoreRule> for ScoreRule {
    type Error = &'static str;

    fn try_from(value: RawScoreRule) -> Result<Self, Self::Error> {
        let max_valid = value.max_valid.unwrap_or(value.target);
        if value.target > max_valid {
            return Err("target is above max_valid, so no score can win");
        }
        if value.fallback > max_valid {
            return Err("fallback is above max_valid, so corrections would be out of range");
        }
        Ok(Self {
            target: value.target,
            max_valid,
            fallback: value.fallback,
        })
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

    #[test]
    fn defaults_know_cornhole() {
        let config = AppConfig::default();
        assert_eq!(config.score_rule("cornhole"), ScoreRule::CORNHOLE);
        assert_eq!(config.score_rule("Cornhole"), ScoreRule::CORNHOLE);
        assert_eq!(config.sse_capacity(), DEFAULT_SSE_CAPACITY);
    }

    #[test]
    fn file_rules_extend_the_defaults() {
        let config = AppConfig::from_json(
            r#"{
                "score_rules": { "Bocce": { "target": 12, "fallback": 0 } },
                "sse_capacity": 8
            }"#,
        )
        .unwrap();

        assert_eq!(
            config.score_rule("bocce"),
            ScoreRule {
                target: 12,
                max_valid: 12,
                fallback: 0
            }
        );
        assert_eq!(config.score_rule("cornhole"), ScoreRule::CORNHOLE);
        assert_eq!(config.sse_capacity(), 8);
    }

    #[test]
    fn unknown_game_kind_uses_cornhole_rule() {
        assert_eq!(
            AppConfig::default().score_rule("ladder toss"),
            ScoreRule::CORNHOLE
        );
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(matches!(
            AppConfig::from_json("{\"score_rules\": 3}"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn target_above_max_valid_is_rejected() {
        let err = AppConfig::from_json(
            r#"{ "score_rules": { "bocce": { "target": 12, "max_valid": 10, "fallback": 7 } } }"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidRule { ref kind, .. } if kind == "bocce"));
    }

    #[test]
    fn fallback_above_max_valid_is_rejected() {
        let err = AppConfig::from_json(
            r#"{ "score_rules": { "Horseshoes": { "target": 21, "fallback": 30 } } }"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidRule { ref kind, .. } if kind == "Horseshoes"));
    }

    #[test]
    fn max_valid_may_exceed_target() {
        let config = AppConfig::from_json(
            r#"{ "score_rules": { "darts": { "target": 21, "max_valid": 30, "fallback": 21 } } }"#,
        )
        .unwrap();
        assert_eq!(
            config.score_rule("darts"),
            ScoreRule {
                target: 21,
                max_valid: 30,
                fallback: 21
            }
        );
    }

    #[test]
    fn shipped_config_file_is_valid() {
        let contents = include_str!("../config/app.json");
        assert!(AppConfig::from_json(contents).is_ok());
    }
}
