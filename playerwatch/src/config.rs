use std::env::var;
use std::time::Duration;

use dotenvy::dotenv;
use thiserror::Error;

const MIN_THRESHOLD: u64 = 1;
const MAX_THRESHOLD: u64 = 128;
const MIN_COOLDOWN_MINUTES: u64 = 1;
const MAX_COOLDOWN_MINUTES: u64 = 1440; // one day

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid mode {0:?} (expected \"all\" or \"threshold\")")]
    InvalidMode(String),

    #[error("invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },

    #[error("{name} must be between {min} and {max}, got {value}")]
    OutOfRange {
        name: &'static str,
        min: u64,
        max: u64,
        value: u64,
    },
}

/// The active notification policy, immutable for the lifetime of the
/// process. Each variant carries the locator of the durable state it needs.
#[derive(Debug, Clone)]
pub enum Policy {
    /// Notify once for every player name not yet recorded in the dedup
    /// store.
    All { dedup_db_path: String },

    /// Notify when the roster reaches `count` players, then stay quiet for
    /// `cooldown`.
    Threshold {
        count: usize,
        cooldown: Duration,
        cooldown_file: String,
    },
}

impl Policy {
    pub fn name(&self) -> &'static str {
        match self {
            Policy::All { .. } => "all",
            Policy::Threshold { .. } => "threshold",
        }
    }
}

/// Application configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Env: MODE ("all" or "threshold"), plus the mode's own variables
    pub policy: Policy,

    /// Game server to query, host:port
    /// Env: SERVER_ADDRESS
    pub server_address: String,

    /// Discord webhook that receives the notifications
    /// Env: WEBHOOK_URL
    pub webhook_url: String,

    /// Period of the service loop
    /// Env: POLL_INTERVAL_SECS (default: 60)
    pub poll_interval: Duration,

    /// Upper bound on one server query, both protocol exchanges included
    /// Env: QUERY_TIMEOUT_SECS (default: 5)
    pub query_timeout: Duration,
}

impl Config {
    /// Load configuration from environment variables. Only the variables the
    /// selected mode actually uses are required.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenv(); // for local runs mostly

        let policy = match required("MODE")?.as_str() {
            "all" => Policy::All {
                dedup_db_path: env_or_default_string("DEDUP_DB_PATH", "playerwatch.db"),
            },
            "threshold" => Policy::Threshold {
                count: validate_threshold(required_parsed("PLAYER_COUNT_THRESHOLD")?)?,
                cooldown: validate_cooldown_minutes(required_parsed("COOLDOWN_MINUTES")?)?,
                cooldown_file: env_or_default_string("COOLDOWN_FILE", "cooldown.txt"),
            },
            other => return Err(ConfigError::InvalidMode(other.to_string())),
        };

        Ok(Self {
            policy,
            server_address: required("SERVER_ADDRESS")?,
            webhook_url: required("WEBHOOK_URL")?,
            poll_interval: Duration::from_secs(env_or_default("POLL_INTERVAL_SECS", 60)),
            query_timeout: Duration::from_secs(env_or_default("QUERY_TIMEOUT_SECS", 5)),
        })
    }
}

/// Check the threshold trigger level against its allowed range.
pub fn validate_threshold(count: u64) -> Result<usize, ConfigError> {
    if !(MIN_THRESHOLD..=MAX_THRESHOLD).contains(&count) {
        return Err(ConfigError::OutOfRange {
            name: "PLAYER_COUNT_THRESHOLD",
            min: MIN_THRESHOLD,
            max: MAX_THRESHOLD,
            value: count,
        });
    }
    Ok(count as usize)
}

/// Check the cooldown window against its allowed range and convert it to a
/// duration.
pub fn validate_cooldown_minutes(minutes: u64) -> Result<Duration, ConfigError> {
    if !(MIN_COOLDOWN_MINUTES..=MAX_COOLDOWN_MINUTES).contains(&minutes) {
        return Err(ConfigError::OutOfRange {
            name: "COOLDOWN_MINUTES",
            min: MIN_COOLDOWN_MINUTES,
            max: MAX_COOLDOWN_MINUTES,
            value: minutes,
        });
    }
    Ok(Duration::from_secs(minutes * 60))
}

fn required(key: &'static str) -> Result<String, ConfigError> {
    var(key).map_err(|_| ConfigError::Missing(key))
}

fn required_parsed<T: std::str::FromStr>(key: &'static str) -> Result<T, ConfigError> {
    let value = required(key)?;
    value
        .parse()
        .map_err(|_| ConfigError::Invalid { name: key, value })
}

/// Parse environment variable or return default value
fn env_or_default<T: std::str::FromStr>(key: &str, default: T) -> T {
    var(key)
        .ok()
        .and_then(|val| val.parse().ok())
        .unwrap_or(default)
}

/// Parse environment variable string or return default value
fn env_or_default_string(key: &str, default: &str) -> String {
    var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_range() {
        assert_eq!(validate_threshold(1).unwrap(), 1);
        assert_eq!(validate_threshold(128).unwrap(), 128);
        assert!(matches!(
            validate_threshold(0),
            Err(ConfigError::OutOfRange { .. })
        ));
        assert!(matches!(
            validate_threshold(129),
            Err(ConfigError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_cooldown_range() {
        assert_eq!(
            validate_cooldown_minutes(30).unwrap(),
            Duration::from_secs(1800)
        );
        assert_eq!(
            validate_cooldown_minutes(1440).unwrap(),
            Duration::from_secs(86400)
        );
        assert!(matches!(
            validate_cooldown_minutes(0),
            Err(ConfigError::OutOfRange { .. })
        ));
        assert!(matches!(
            validate_cooldown_minutes(1441),
            Err(ConfigError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_policy_names() {
        let all = Policy::All {
            dedup_db_path: "playerwatch.db".to_string(),
        };
        let threshold = Policy::Threshold {
            count: 10,
            cooldown: Duration::from_secs(1800),
            cooldown_file: "cooldown.txt".to_string(),
        };
        assert_eq!(all.name(), "all");
        assert_eq!(threshold.name(), "threshold");
    }
}
