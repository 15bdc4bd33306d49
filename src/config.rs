// Service configuration, read from the environment.

use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://./data/draft_room.db";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_PICK_TIME_LIMIT_SECS: u64 = 90;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{key} is required")]
    Missing { key: &'static str },

    #[error("invalid value for {key}: {message}")]
    Invalid { key: &'static str, message: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: String,
    pub jwt_secret: String,
    pub draft: DraftSettings,
}

/// Knobs the draft coordinator reads.
#[derive(Debug, Clone)]
pub struct DraftSettings {
    /// Pick clock for leagues created without their own limit.
    pub default_pick_time_limit: Duration,
    /// Shuffle team order when a draft starts instead of using join order.
    pub randomize_order: bool,
}

impl Default for DraftSettings {
    fn default() -> Self {
        Self {
            default_pick_time_limit: Duration::from_secs(DEFAULT_PICK_TIME_LIMIT_SECS),
            randomize_order: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup so tests don't have to touch the process env.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let jwt_secret = lookup("JWT_SECRET")
            .filter(|s| !s.trim().is_empty())
            .ok_or(ConfigError::Missing { key: "JWT_SECRET" })?;

        let pick_secs = match lookup("PICK_TIME_LIMIT_SECS") {
            Some(raw) => {
                let secs: u64 = raw.trim().parse().map_err(|_| ConfigError::Invalid {
                    key: "PICK_TIME_LIMIT_SECS",
                    message: format!("'{raw}' is not a whole number of seconds"),
                })?;
                if secs == 0 {
                    return Err(ConfigError::Invalid {
                        key: "PICK_TIME_LIMIT_SECS",
                        message: "must be at least 1".into(),
                    });
                }
                secs
            }
            None => DEFAULT_PICK_TIME_LIMIT_SECS,
        };

        let randomize_order = lookup("RANDOMIZE_DRAFT_ORDER")
            .map(|v| v == "1" || v.to_lowercase() == "true")
            .unwrap_or(false);

        Ok(Config {
            database_url: lookup("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.into()),
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.into()),
            jwt_secret,
            draft: DraftSettings {
                default_pick_time_limit: Duration::from_secs(pick_secs),
                randomize_order,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply() {
        let config = Config::from_lookup(lookup(&[("JWT_SECRET", "s3cret")])).unwrap();
        assert_eq!(config.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(config.bind_addr, DEFAULT_BIND_ADDR);
        assert_eq!(config.draft.default_pick_time_limit, Duration::from_secs(90));
        assert!(!config.draft.randomize_order);
    }

    #[test]
    fn secret_is_required() {
        let err = Config::from_lookup(lookup(&[])).unwrap_err();
        assert_eq!(err, ConfigError::Missing { key: "JWT_SECRET" });
    }

    #[test]
    fn rejects_bad_pick_limit() {
        let err = Config::from_lookup(lookup(&[
            ("JWT_SECRET", "x"),
            ("PICK_TIME_LIMIT_SECS", "soon"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "PICK_TIME_LIMIT_SECS", .. }));

        let err = Config::from_lookup(lookup(&[("JWT_SECRET", "x"), ("PICK_TIME_LIMIT_SECS", "0")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn reads_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("JWT_SECRET", "x"),
            ("PICK_TIME_LIMIT_SECS", "45"),
            ("RANDOMIZE_DRAFT_ORDER", "true"),
            ("BIND_ADDR", "127.0.0.1:8080"),
        ]))
        .unwrap();
        assert_eq!(config.draft.default_pick_time_limit, Duration::from_secs(45));
        assert!(config.draft.randomize_order);
        assert_eq!(config.bind_addr, "127.0.0.1:8080");
    }
}
