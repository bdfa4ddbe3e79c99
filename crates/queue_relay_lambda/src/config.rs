use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;

pub const DEFAULT_MAX_CONCURRENT_WRITES: usize = 10;
pub const DEFAULT_CALL_TIMEOUT_MS: u64 = 5_000;

/// Runtime configuration injected by the deployment.
///
/// Loaded once at cold start and handed to the relay handler; the handler
/// never reads the environment itself. Variables:
///   - `BUCKET_NAME`                  (required)
///   - `INSTANCE_IDS`                 (comma separated, may be empty)
///   - `INSTANCE_ID`                  (single id, merged with `INSTANCE_IDS`)
///   - `RELAY_MAX_CONCURRENT_WRITES`  (default 10)
///   - `RELAY_CALL_TIMEOUT_MS`        (default 5000)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    pub bucket: String,
    pub instance_ids: Vec<String>,
    pub max_concurrent_writes: usize,
    pub call_timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct RelayEnv {
    bucket_name: Option<String>,
    #[serde(default)]
    instance_ids: Vec<String>,
    instance_id: Option<String>,
    #[serde(default = "default_max_concurrent_writes")]
    relay_max_concurrent_writes: usize,
    #[serde(default = "default_call_timeout_ms")]
    relay_call_timeout_ms: u64,
}

fn default_max_concurrent_writes() -> usize {
    DEFAULT_MAX_CONCURRENT_WRITES
}

fn default_call_timeout_ms() -> u64 {
    DEFAULT_CALL_TIMEOUT_MS
}

impl RelayConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        envy::from_env::<RelayEnv>()?.try_into()
    }

    pub fn from_vars<I, K, V>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let vars = vars
            .into_iter()
            .map(|(key, value)| (key.into(), value.into()));
        envy::from_iter::<_, RelayEnv>(vars)?.try_into()
    }
}

impl TryFrom<RelayEnv> for RelayConfig {
    type Error = ConfigError;

    fn try_from(env: RelayEnv) -> Result<Self, Self::Error> {
        let bucket = match env.bucket_name.as_deref().map(str::trim) {
            Some(bucket) if !bucket.is_empty() => bucket.to_string(),
            _ => return Err(ConfigError::MissingBucket),
        };

        let mut instance_ids: Vec<String> = Vec::new();
        for id in env.instance_ids.iter().chain(env.instance_id.iter()) {
            let id = id.trim();
            if !id.is_empty() && !instance_ids.iter().any(|known| known == id) {
                instance_ids.push(id.to_string());
            }
        }

        if env.relay_max_concurrent_writes == 0 {
            return Err(ConfigError::InvalidConcurrency);
        }
        if env.relay_call_timeout_ms == 0 {
            return Err(ConfigError::InvalidTimeout);
        }

        Ok(Self {
            bucket,
            instance_ids,
            max_concurrent_writes: env.relay_max_concurrent_writes,
            call_timeout: Duration::from_millis(env.relay_call_timeout_ms),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_minimal_config_with_defaults() {
        let config =
            RelayConfig::from_vars([("BUCKET_NAME", "relay-bucket"), ("INSTANCE_ID", "i-1")])
                .expect("config should load");

        assert_eq!(config.bucket, "relay-bucket");
        assert_eq!(config.instance_ids, vec!["i-1"]);
        assert_eq!(config.max_concurrent_writes, DEFAULT_MAX_CONCURRENT_WRITES);
        assert_eq!(
            config.call_timeout,
            Duration::from_millis(DEFAULT_CALL_TIMEOUT_MS)
        );
    }

    #[test]
    fn merges_instance_list_and_single_id() {
        let config = RelayConfig::from_vars([
            ("BUCKET_NAME", "b"),
            ("INSTANCE_IDS", "i-1, i-2,,i-1"),
            ("INSTANCE_ID", "i-3"),
        ])
        .expect("config should load");

        assert_eq!(config.instance_ids, vec!["i-1", "i-2", "i-3"]);
    }

    #[test]
    fn rejects_missing_bucket() {
        let error =
            RelayConfig::from_vars([("INSTANCE_ID", "i-1")]).expect_err("config should fail");
        assert!(matches!(error, ConfigError::MissingBucket));
    }

    #[test]
    fn accepts_blank_instance_list() {
        let config = RelayConfig::from_vars([("BUCKET_NAME", "b"), ("INSTANCE_IDS", "")])
            .expect("config should load");
        assert!(config.instance_ids.is_empty());
    }

    #[test]
    fn rejects_blank_bucket() {
        let error = RelayConfig::from_vars([("BUCKET_NAME", " "), ("INSTANCE_IDS", "")])
            .expect_err("config should fail");
        assert!(matches!(error, ConfigError::MissingBucket));
    }

    #[test]
    fn rejects_zero_concurrency() {
        let error = RelayConfig::from_vars([
            ("BUCKET_NAME", "b"),
            ("INSTANCE_ID", "i-1"),
            ("RELAY_MAX_CONCURRENT_WRITES", "0"),
        ])
        .expect_err("config should fail");
        assert!(matches!(error, ConfigError::InvalidConcurrency));
    }

    #[test]
    fn rejects_non_numeric_timeout() {
        let error = RelayConfig::from_vars([
            ("BUCKET_NAME", "b"),
            ("INSTANCE_ID", "i-1"),
            ("RELAY_CALL_TIMEOUT_MS", "soon"),
        ])
        .expect_err("config should fail");
        assert!(matches!(error, ConfigError::Env(_)));
    }
}
