//! Bridge configuration.
//!
//! The bridge has two knobs: how verbose the stderr log is, and how the
//! certificate trust codec encodes an absent expiry deadline. Both have
//! defaults and can be overridden through the environment the host passes
//! to the guest.
//!
//! | Variable | Values | Default |
//! |----------|--------|---------|
//! | `KUBEBRIDGE_LOG` | `trace`, `debug`, `info`, `warn`, `error` | `info` |
//! | `KUBEBRIDGE_NOT_AFTER` | `omit`, `empty` | `omit` |

use crate::constants::{ENV_LOG_LEVEL, ENV_NOT_AFTER};
use std::str::FromStr;
use tracing::{Level, warn};

/// Wire encoding of an absent `not_after` field in certificate requests.
///
/// Hosts differ on what they accept. Newer hosts treat a missing field as
/// "never expires"; older ones expect the key with an empty string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExpiryEncoding {
    /// Leave the key out of the payload.
    #[default]
    Omit,
    /// Send `"not_after": ""`.
    EmptyString,
}

impl FromStr for ExpiryEncoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "omit" => Ok(Self::Omit),
            "empty" | "empty-string" => Ok(Self::EmptyString),
            other => Err(format!("unknown expiry encoding: {other}")),
        }
    }
}

/// Runtime configuration for the bridge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    /// Maximum level written to stderr.
    pub log_level: Level,
    /// Encoding of an absent certificate expiry.
    pub expiry_encoding: ExpiryEncoding,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            log_level: Level::INFO,
            expiry_encoding: ExpiryEncoding::Omit,
        }
    }
}

impl BridgeConfig {
    /// Builds a configuration from the process environment.
    ///
    /// Unknown values keep the default and emit a warning through the
    /// current subscriber. Before logging is installed, use
    /// [`from_env_reporting`](Self::from_env_reporting) instead.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a configuration from an arbitrary key lookup, warning about
    /// unknown values.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let (config, ignored) = Self::from_lookup_reporting(lookup);
        for message in &ignored {
            warn!("{}", message);
        }
        config
    }

    /// Like [`from_env`](Self::from_env), but returns the warnings instead
    /// of logging them, so they can be emitted once logging is set up.
    pub fn from_env_reporting() -> (Self, Vec<String>) {
        Self::from_lookup_reporting(|key| std::env::var(key).ok())
    }

    /// Builds a configuration from a key lookup.
    ///
    /// Returns one message per ignored value; the default is kept for each.
    pub fn from_lookup_reporting<F>(lookup: F) -> (Self, Vec<String>)
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let mut ignored = Vec::new();

        if let Some(raw) = lookup(ENV_LOG_LEVEL) {
            match raw.trim().parse::<Level>() {
                Ok(level) => config.log_level = level,
                Err(_) => {
                    ignored.push(format!("ignoring {ENV_LOG_LEVEL}={raw}: unknown log level"))
                }
            }
        }

        if let Some(raw) = lookup(ENV_NOT_AFTER) {
            match raw.parse::<ExpiryEncoding>() {
                Ok(encoding) => config.expiry_encoding = encoding,
                Err(e) => ignored.push(format!("ignoring {ENV_NOT_AFTER}={raw}: {e}")),
            }
        }

        (config, ignored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_uses_defaults() {
        let config = BridgeConfig::from_lookup(|_| None);
        assert_eq!(config, BridgeConfig::default());
    }

    #[test]
    fn log_level_is_case_insensitive() {
        let config = BridgeConfig::from_lookup(lookup_from(&[(ENV_LOG_LEVEL, "DEBUG")]));
        assert_eq!(config.log_level, Level::DEBUG);
    }

    #[test]
    fn unknown_values_fall_back() {
        let config = BridgeConfig::from_lookup(lookup_from(&[
            (ENV_LOG_LEVEL, "chatty"),
            (ENV_NOT_AFTER, "null"),
        ]));
        assert_eq!(config, BridgeConfig::default());
    }

    #[test]
    fn ignored_values_are_reported() {
        let (config, ignored) = BridgeConfig::from_lookup_reporting(lookup_from(&[
            (ENV_LOG_LEVEL, "chatty"),
            (ENV_NOT_AFTER, "null"),
        ]));
        assert_eq!(config, BridgeConfig::default());
        assert_eq!(ignored.len(), 2);
        assert!(ignored[0].contains("KUBEBRIDGE_LOG=chatty"), "{}", ignored[0]);
        assert!(ignored[1].contains("KUBEBRIDGE_NOT_AFTER=null"), "{}", ignored[1]);
    }

    #[test]
    fn valid_values_report_nothing() {
        let (config, ignored) = BridgeConfig::from_lookup_reporting(lookup_from(&[
            (ENV_LOG_LEVEL, "warn"),
            (ENV_NOT_AFTER, "omit"),
        ]));
        assert_eq!(config.log_level, Level::WARN);
        assert!(ignored.is_empty());
    }

    #[test]
    fn expiry_encoding_parses_empty() {
        let config = BridgeConfig::from_lookup(lookup_from(&[(ENV_NOT_AFTER, "empty")]));
        assert_eq!(config.expiry_encoding, ExpiryEncoding::EmptyString);
    }
}
